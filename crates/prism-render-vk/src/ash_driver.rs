// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_char, c_void, CStr, CString};

use ash::ext::debug_utils;
use ash::khr::{surface, swapchain};
use ash::prelude::VkResult;
use ash::{vk, Entry};
use prism_render::{DebugLevel, DebugRecord, Diagnostics};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::driver::{
    Created, DrawRecording, Driver, FramePresent, FrameSubmit, InstanceDesc, PipelineDesc,
    SwapchainDesc,
};

const MISSING: vk::Result = vk::Result::ERROR_INITIALIZATION_FAILED;

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    user: *mut c_void,
) -> vk::Bool32 {
    if data.is_null() || user.is_null() {
        return vk::FALSE;
    }
    // SAFETY: `user` is the boxed Diagnostics owned by the AshDriver, which
    // outlives the messenger; `data` is valid for the duration of the call.
    let (diagnostics, message) = unsafe {
        let p_message = (*data).p_message;
        if p_message.is_null() {
            return vk::FALSE;
        }
        (
            &*(user as *const Diagnostics),
            CStr::from_ptr(p_message).to_string_lossy(),
        )
    };
    let level = if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        DebugLevel::Error
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        DebugLevel::Warn
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        DebugLevel::Info
    } else {
        DebugLevel::Trace
    };
    diagnostics.debug_output(&DebugRecord {
        file: file!(),
        line: line!(),
        function: "vkDebugUtilsMessengerCallbackEXT",
        level,
        message: &message,
    });
    vk::FALSE
}

/// [`Driver`] over a linked Vulkan loader. Loaders for the instance, surface,
/// device and swapchain functions appear as the matching objects are created
/// and disappear when they are destroyed.
pub struct AshDriver {
    entry: Entry,
    diagnostics: Box<Diagnostics>,
    instance: Option<ash::Instance>,
    surface_fn: Option<surface::Instance>,
    debug_fn: Option<debug_utils::Instance>,
    device: Option<ash::Device>,
    swapchain_fn: Option<swapchain::Device>,
}

impl AshDriver {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            entry: Entry::linked(),
            diagnostics: Box::new(diagnostics),
            instance: None,
            surface_fn: None,
            debug_fn: None,
            device: None,
            swapchain_fn: None,
        }
    }

    fn instance(&self) -> VkResult<&ash::Instance> {
        self.instance.as_ref().ok_or(MISSING)
    }

    fn surface_fn(&self) -> VkResult<&surface::Instance> {
        self.surface_fn.as_ref().ok_or(MISSING)
    }

    fn device(&self) -> VkResult<&ash::Device> {
        self.device.as_ref().ok_or(MISSING)
    }

    fn swapchain_fn(&self) -> VkResult<&swapchain::Device> {
        self.swapchain_fn.as_ref().ok_or(MISSING)
    }

    fn find_memory_type(
        &self,
        phys: vk::PhysicalDevice,
        type_bits: u32,
        req: vk::MemoryPropertyFlags,
    ) -> VkResult<u32> {
        let mem = unsafe { self.instance()?.get_physical_device_memory_properties(phys) };
        (0..mem.memory_type_count)
            .find(|&i| {
                (type_bits & (1 << i)) != 0
                    && mem.memory_types[i as usize].property_flags.contains(req)
            })
            .ok_or(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
    }

    fn create_shader_module(&self, code: &[u32]) -> VkResult<vk::ShaderModule> {
        let info = vk::ShaderModuleCreateInfo {
            s_type: vk::StructureType::SHADER_MODULE_CREATE_INFO,
            p_code: code.as_ptr(),
            code_size: std::mem::size_of_val(code),
            ..Default::default()
        };
        unsafe { self.device()?.create_shader_module(&info, None) }
    }
}

impl Driver for AshDriver {
    fn is_api_supported(&self) -> bool {
        unsafe { self.entry.try_enumerate_instance_version() }.is_ok()
    }

    fn required_instance_extensions(&self, display: RawDisplayHandle) -> VkResult<Vec<CString>> {
        let names = ash_window::enumerate_required_extensions(display)?;
        Ok(names
            .iter()
            .map(|&p| unsafe { CStr::from_ptr(p) }.to_owned())
            .collect())
    }

    fn create_surface(
        &mut self,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR> {
        let instance = self.instance.as_ref().ok_or(MISSING)?;
        let surface =
            unsafe { ash_window::create_surface(&self.entry, instance, display, window, None)? };
        if self.surface_fn.is_none() {
            self.surface_fn = Some(surface::Instance::new(&self.entry, instance));
        }
        Ok(surface)
    }

    fn has_instance_layer(&self, name: &CStr) -> bool {
        match unsafe { self.entry.enumerate_instance_layer_properties() } {
            Ok(layers) => layers
                .iter()
                .any(|l| unsafe { CStr::from_ptr(l.layer_name.as_ptr()) } == name),
            Err(_) => false,
        }
    }

    fn create_instance(&mut self, desc: &InstanceDesc<'_>) -> VkResult<vk::Instance> {
        let app_info = vk::ApplicationInfo {
            s_type: vk::StructureType::APPLICATION_INFO,
            p_application_name: desc.application_name.as_ptr(),
            application_version: desc.application_version,
            p_engine_name: desc.engine_name.as_ptr(),
            engine_version: desc.engine_version,
            api_version: desc.api_version,
            ..Default::default()
        };
        let extensions: Vec<*const c_char> = desc.extensions.iter().map(|e| e.as_ptr()).collect();
        let layers: Vec<*const c_char> = desc.layers.iter().map(|l| l.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo {
            s_type: vk::StructureType::INSTANCE_CREATE_INFO,
            p_application_info: &app_info,
            enabled_extension_count: extensions.len() as u32,
            pp_enabled_extension_names: extensions.as_ptr(),
            enabled_layer_count: layers.len() as u32,
            pp_enabled_layer_names: layers.as_ptr(),
            ..Default::default()
        };
        let instance = unsafe { self.entry.create_instance(&create_info, None)? };
        let handle = instance.handle();
        self.instance = Some(instance);
        Ok(handle)
    }

    fn create_debug_messenger(&mut self) -> VkResult<vk::DebugUtilsMessengerEXT> {
        let loader = debug_utils::Instance::new(&self.entry, self.instance()?);
        let user: *const Diagnostics = &*self.diagnostics;
        let info = vk::DebugUtilsMessengerCreateInfoEXT {
            s_type: vk::StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT,
            message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            pfn_user_callback: Some(debug_callback),
            p_user_data: user as *mut c_void,
            ..Default::default()
        };
        let messenger = unsafe { loader.create_debug_utils_messenger(&info, None)? };
        self.debug_fn = Some(loader);
        Ok(messenger)
    }

    fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        unsafe { self.instance()?.enumerate_physical_devices() }
    }

    fn queue_families(&self, phys: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        match &self.instance {
            Some(instance) => unsafe {
                instance.get_physical_device_queue_family_properties(phys)
            },
            None => Vec::new(),
        }
    }

    fn surface_support(
        &self,
        phys: vk::PhysicalDevice,
        queue_family: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        unsafe {
            self.surface_fn()?
                .get_physical_device_surface_support(phys, queue_family, surface)
        }
    }

    fn create_device(
        &mut self,
        phys: vk::PhysicalDevice,
        queue_family: u32,
    ) -> VkResult<vk::Device> {
        let priorities = [1.0_f32];
        let queue_info = vk::DeviceQueueCreateInfo {
            s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
            queue_family_index: queue_family,
            queue_count: 1,
            p_queue_priorities: priorities.as_ptr(),
            ..Default::default()
        };
        let device_exts = [swapchain::NAME.as_ptr()];
        let info = vk::DeviceCreateInfo {
            s_type: vk::StructureType::DEVICE_CREATE_INFO,
            queue_create_info_count: 1,
            p_queue_create_infos: &queue_info,
            enabled_extension_count: device_exts.len() as u32,
            pp_enabled_extension_names: device_exts.as_ptr(),
            ..Default::default()
        };
        let instance = self.instance.as_ref().ok_or(MISSING)?;
        let device = unsafe { instance.create_device(phys, &info, None)? };
        let handle = device.handle();
        self.swapchain_fn = Some(swapchain::Device::new(instance, &device));
        self.device = Some(device);
        Ok(handle)
    }

    fn device_queue(&self, queue_family: u32) -> vk::Queue {
        match &self.device {
            Some(device) => unsafe { device.get_device_queue(queue_family, 0) },
            None => vk::Queue::null(),
        }
    }

    fn surface_capabilities(
        &self,
        phys: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface_fn()?
                .get_physical_device_surface_capabilities(phys, surface)
        }
    }

    fn surface_formats(
        &self,
        phys: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe { self.surface_fn()?.get_physical_device_surface_formats(phys, surface) }
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> VkResult<vk::SwapchainKHR> {
        let info = vk::SwapchainCreateInfoKHR {
            s_type: vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR,
            surface: desc.surface,
            min_image_count: desc.min_image_count,
            image_format: desc.format.format,
            image_color_space: desc.format.color_space,
            image_extent: desc.extent,
            image_array_layers: 1,
            image_usage: desc.usage,
            image_sharing_mode: vk::SharingMode::EXCLUSIVE,
            pre_transform: desc.pre_transform,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode: desc.present_mode,
            clipped: vk::TRUE,
            ..Default::default()
        };
        unsafe { self.swapchain_fn()?.create_swapchain(&info, None) }
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        unsafe { self.swapchain_fn()?.get_swapchain_images(swapchain) }
    }

    fn create_image_view(
        &mut self,
        image: vk::Image,
        format: vk::Format,
    ) -> VkResult<vk::ImageView> {
        let info = vk::ImageViewCreateInfo {
            s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
            image,
            view_type: vk::ImageViewType::TYPE_2D,
            format,
            components: vk::ComponentMapping::default(),
            subresource_range: vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            },
            ..Default::default()
        };
        unsafe { self.device()?.create_image_view(&info, None) }
    }

    fn create_render_pass(&mut self, format: vk::Format) -> VkResult<vk::RenderPass> {
        let color_att = vk::AttachmentDescription {
            format,
            samples: vk::SampleCountFlags::TYPE_1,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
            stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
            ..Default::default()
        };
        let att_ref = vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        };
        let subpass = vk::SubpassDescription {
            pipeline_bind_point: vk::PipelineBindPoint::GRAPHICS,
            color_attachment_count: 1,
            p_color_attachments: &att_ref,
            ..Default::default()
        };
        // The layout transition must wait for the acquire semaphore, which
        // is waited on at COLOR_ATTACHMENT_OUTPUT.
        let dependency = vk::SubpassDependency {
            src_subpass: vk::SUBPASS_EXTERNAL,
            dst_subpass: 0,
            src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            dst_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            src_access_mask: vk::AccessFlags::empty(),
            dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            ..Default::default()
        };
        let info = vk::RenderPassCreateInfo {
            s_type: vk::StructureType::RENDER_PASS_CREATE_INFO,
            attachment_count: 1,
            p_attachments: &color_att,
            subpass_count: 1,
            p_subpasses: &subpass,
            dependency_count: 1,
            p_dependencies: &dependency,
            ..Default::default()
        };
        unsafe { self.device()?.create_render_pass(&info, None) }
    }

    fn create_pipeline_layout(&mut self) -> VkResult<vk::PipelineLayout> {
        let info = vk::PipelineLayoutCreateInfo {
            s_type: vk::StructureType::PIPELINE_LAYOUT_CREATE_INFO,
            ..Default::default()
        };
        unsafe { self.device()?.create_pipeline_layout(&info, None) }
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> VkResult<vk::Pipeline> {
        let vs = self.create_shader_module(desc.vertex_spv)?;
        let fs = match self.create_shader_module(desc.fragment_spv) {
            Ok(fs) => fs,
            Err(e) => {
                unsafe { self.device()?.destroy_shader_module(vs, None) };
                return Err(e);
            }
        };
        let device = self.device()?;
        let entry = c"main";

        let stages = [
            vk::PipelineShaderStageCreateInfo {
                s_type: vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
                stage: vk::ShaderStageFlags::VERTEX,
                module: vs,
                p_name: entry.as_ptr(),
                ..Default::default()
            },
            vk::PipelineShaderStageCreateInfo {
                s_type: vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
                stage: vk::ShaderStageFlags::FRAGMENT,
                module: fs,
                p_name: entry.as_ptr(),
                ..Default::default()
            },
        ];

        // binding 0, location 0: vec2 position
        let binding = vk::VertexInputBindingDescription {
            binding: 0,
            stride: desc.vertex_stride,
            input_rate: vk::VertexInputRate::VERTEX,
        };
        let attribute = vk::VertexInputAttributeDescription {
            location: 0,
            binding: 0,
            format: vk::Format::R32G32_SFLOAT,
            offset: 0,
        };
        let vertex_input = vk::PipelineVertexInputStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_VERTEX_INPUT_STATE_CREATE_INFO,
            vertex_binding_description_count: 1,
            p_vertex_binding_descriptions: &binding,
            vertex_attribute_description_count: 1,
            p_vertex_attribute_descriptions: &attribute,
            ..Default::default()
        };
        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_INPUT_ASSEMBLY_STATE_CREATE_INFO,
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            ..Default::default()
        };

        // Baked into the pipeline; a new extent means a new pipeline.
        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: desc.extent.width as f32,
            height: desc.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: desc.extent,
        };
        let viewport_state = vk::PipelineViewportStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_VIEWPORT_STATE_CREATE_INFO,
            viewport_count: 1,
            p_viewports: &viewport,
            scissor_count: 1,
            p_scissors: &scissor,
            ..Default::default()
        };
        let raster = vk::PipelineRasterizationStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_RASTERIZATION_STATE_CREATE_INFO,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::CLOCKWISE,
            line_width: 1.0,
            ..Default::default()
        };
        let multisample = vk::PipelineMultisampleStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_MULTISAMPLE_STATE_CREATE_INFO,
            rasterization_samples: vk::SampleCountFlags::TYPE_1,
            ..Default::default()
        };
        let color_blend_att = vk::PipelineColorBlendAttachmentState {
            color_write_mask: vk::ColorComponentFlags::R
                | vk::ColorComponentFlags::G
                | vk::ColorComponentFlags::B
                | vk::ColorComponentFlags::A,
            blend_enable: vk::FALSE,
            ..Default::default()
        };
        let color_blend = vk::PipelineColorBlendStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_COLOR_BLEND_STATE_CREATE_INFO,
            attachment_count: 1,
            p_attachments: &color_blend_att,
            ..Default::default()
        };

        let pipeline_info = vk::GraphicsPipelineCreateInfo {
            s_type: vk::StructureType::GRAPHICS_PIPELINE_CREATE_INFO,
            stage_count: stages.len() as u32,
            p_stages: stages.as_ptr(),
            p_vertex_input_state: &vertex_input,
            p_input_assembly_state: &input_assembly,
            p_viewport_state: &viewport_state,
            p_rasterization_state: &raster,
            p_multisample_state: &multisample,
            p_color_blend_state: &color_blend,
            layout: desc.layout,
            render_pass: desc.render_pass,
            subpass: 0,
            ..Default::default()
        };

        let result = unsafe {
            device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                std::slice::from_ref(&pipeline_info),
                None,
            )
        };
        unsafe {
            device.destroy_shader_module(vs, None);
            device.destroy_shader_module(fs, None);
        }
        match result {
            Ok(pipelines) => pipelines.first().copied().ok_or(vk::Result::ERROR_UNKNOWN),
            Err((_, err)) => Err(err),
        }
    }

    fn create_framebuffer(
        &mut self,
        render_pass: vk::RenderPass,
        view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> VkResult<vk::Framebuffer> {
        let info = vk::FramebufferCreateInfo {
            s_type: vk::StructureType::FRAMEBUFFER_CREATE_INFO,
            render_pass,
            attachment_count: 1,
            p_attachments: &view,
            width: extent.width,
            height: extent.height,
            layers: 1,
            ..Default::default()
        };
        unsafe { self.device()?.create_framebuffer(&info, None) }
    }

    fn create_vertex_buffer(
        &mut self,
        phys: vk::PhysicalDevice,
        bytes: &[u8],
    ) -> VkResult<(vk::Buffer, vk::DeviceMemory)> {
        let device = self.device()?;
        let info = vk::BufferCreateInfo {
            s_type: vk::StructureType::BUFFER_CREATE_INFO,
            size: bytes.len() as vk::DeviceSize,
            usage: vk::BufferUsageFlags::VERTEX_BUFFER,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        };
        let buffer = unsafe { device.create_buffer(&info, None)? };
        let req = unsafe { device.get_buffer_memory_requirements(buffer) };

        let upload = || -> VkResult<vk::DeviceMemory> {
            let mem_type = self.find_memory_type(
                phys,
                req.memory_type_bits,
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            )?;
            let alloc = vk::MemoryAllocateInfo {
                s_type: vk::StructureType::MEMORY_ALLOCATE_INFO,
                allocation_size: req.size,
                memory_type_index: mem_type,
                ..Default::default()
            };
            let memory = unsafe { device.allocate_memory(&alloc, None)? };
            let filled = unsafe {
                device.bind_buffer_memory(buffer, memory, 0).and_then(|()| {
                    let ptr = device.map_memory(
                        memory,
                        0,
                        req.size,
                        vk::MemoryMapFlags::empty(),
                    )?;
                    std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.cast::<u8>(), bytes.len());
                    device.unmap_memory(memory);
                    Ok(())
                })
            };
            match filled {
                Ok(()) => Ok(memory),
                Err(e) => {
                    unsafe { device.free_memory(memory, None) };
                    Err(e)
                }
            }
        };

        match upload() {
            Ok(memory) => Ok((buffer, memory)),
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                Err(e)
            }
        }
    }

    fn create_command_pool(&mut self, queue_family: u32) -> VkResult<vk::CommandPool> {
        let info = vk::CommandPoolCreateInfo {
            s_type: vk::StructureType::COMMAND_POOL_CREATE_INFO,
            queue_family_index: queue_family,
            flags: vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            ..Default::default()
        };
        unsafe { self.device()?.create_command_pool(&info, None) }
    }

    fn allocate_command_buffers(
        &mut self,
        pool: vk::CommandPool,
        count: u32,
    ) -> VkResult<Vec<vk::CommandBuffer>> {
        let info = vk::CommandBufferAllocateInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_ALLOCATE_INFO,
            command_pool: pool,
            level: vk::CommandBufferLevel::PRIMARY,
            command_buffer_count: count,
            ..Default::default()
        };
        unsafe { self.device()?.allocate_command_buffers(&info) }
    }

    fn record_draw(&mut self, cmd: vk::CommandBuffer, rec: &DrawRecording) -> VkResult<()> {
        let device = self.device()?;
        let begin = vk::CommandBufferBeginInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
            ..Default::default()
        };
        let clears = [vk::ClearValue {
            color: vk::ClearColorValue {
                float32: rec.clear_color,
            },
        }];
        let rp_begin = vk::RenderPassBeginInfo {
            s_type: vk::StructureType::RENDER_PASS_BEGIN_INFO,
            render_pass: rec.render_pass,
            framebuffer: rec.framebuffer,
            render_area: vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: rec.extent,
            },
            clear_value_count: clears.len() as u32,
            p_clear_values: clears.as_ptr(),
            ..Default::default()
        };
        unsafe {
            device.begin_command_buffer(cmd, &begin)?;
            device.cmd_begin_render_pass(cmd, &rp_begin, vk::SubpassContents::INLINE);
            device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, rec.pipeline);
            device.cmd_bind_vertex_buffers(cmd, 0, &[rec.vertex_buffer], &[0]);
            device.cmd_draw(cmd, rec.vertex_count, 1, 0, 0);
            device.cmd_end_render_pass(cmd);
            device.end_command_buffer(cmd)
        }
    }

    fn create_semaphore(&mut self) -> VkResult<vk::Semaphore> {
        let info = vk::SemaphoreCreateInfo::default();
        unsafe { self.device()?.create_semaphore(&info, None) }
    }

    fn create_fence(&mut self, signaled: bool) -> VkResult<vk::Fence> {
        let info = vk::FenceCreateInfo {
            s_type: vk::StructureType::FENCE_CREATE_INFO,
            flags: if signaled {
                vk::FenceCreateFlags::SIGNALED
            } else {
                vk::FenceCreateFlags::empty()
            },
            ..Default::default()
        };
        unsafe { self.device()?.create_fence(&info, None) }
    }

    fn wait_for_fence(&mut self, fence: vk::Fence, timeout_ns: u64) -> VkResult<()> {
        unsafe { self.device()?.wait_for_fences(&[fence], true, timeout_ns) }
    }

    fn reset_fence(&mut self, fence: vk::Fence) -> VkResult<()> {
        unsafe { self.device()?.reset_fences(&[fence]) }
    }

    fn acquire_next_image(
        &mut self,
        swapchain: vk::SwapchainKHR,
        timeout_ns: u64,
        signal: vk::Semaphore,
    ) -> VkResult<(u32, bool)> {
        unsafe {
            self.swapchain_fn()?
                .acquire_next_image(swapchain, timeout_ns, signal, vk::Fence::null())
        }
    }

    fn queue_submit(&mut self, queue: vk::Queue, submit: &FrameSubmit) -> VkResult<()> {
        let info = vk::SubmitInfo {
            s_type: vk::StructureType::SUBMIT_INFO,
            wait_semaphore_count: 1,
            p_wait_semaphores: &submit.wait_semaphore,
            p_wait_dst_stage_mask: &submit.wait_stage,
            command_buffer_count: 1,
            p_command_buffers: &submit.command_buffer,
            signal_semaphore_count: 1,
            p_signal_semaphores: &submit.signal_semaphore,
            ..Default::default()
        };
        unsafe {
            self.device()?
                .queue_submit(queue, std::slice::from_ref(&info), submit.fence)
        }
    }

    fn queue_present(&mut self, queue: vk::Queue, present: &FramePresent) -> VkResult<bool> {
        let info = vk::PresentInfoKHR {
            s_type: vk::StructureType::PRESENT_INFO_KHR,
            wait_semaphore_count: 1,
            p_wait_semaphores: &present.wait_semaphore,
            swapchain_count: 1,
            p_swapchains: &present.swapchain,
            p_image_indices: &present.image_index,
            ..Default::default()
        };
        unsafe { self.swapchain_fn()?.queue_present(queue, &info) }
    }

    fn device_wait_idle(&mut self) -> VkResult<()> {
        unsafe { self.device()?.device_wait_idle() }
    }

    fn destroy(&mut self, object: Created) {
        // SAFETY: the ledger destroys children before parents and only after
        // the device went idle.
        unsafe {
            match object {
                Created::Instance(_) => {
                    if let Some(instance) = self.instance.take() {
                        instance.destroy_instance(None);
                    }
                    self.surface_fn = None;
                    self.debug_fn = None;
                }
                Created::DebugMessenger(m) => {
                    if let Some(loader) = &self.debug_fn {
                        loader.destroy_debug_utils_messenger(m, None);
                    }
                }
                Created::Surface(s) => {
                    if let Some(loader) = &self.surface_fn {
                        loader.destroy_surface(s, None);
                    }
                }
                Created::Device(_) => {
                    self.swapchain_fn = None;
                    if let Some(device) = self.device.take() {
                        device.destroy_device(None);
                    }
                }
                Created::Swapchain(s) => {
                    if let Some(loader) = &self.swapchain_fn {
                        loader.destroy_swapchain(s, None);
                    }
                }
                other => {
                    let Some(device) = &self.device else { return };
                    match other {
                        Created::ImageView(v) => device.destroy_image_view(v, None),
                        Created::RenderPass(rp) => device.destroy_render_pass(rp, None),
                        Created::PipelineLayout(l) => device.destroy_pipeline_layout(l, None),
                        Created::Pipeline(p) => device.destroy_pipeline(p, None),
                        Created::Framebuffer(fb) => device.destroy_framebuffer(fb, None),
                        Created::Buffer(buf, mem) => {
                            device.destroy_buffer(buf, None);
                            device.free_memory(mem, None);
                        }
                        Created::CommandPool(pool) => device.destroy_command_pool(pool, None),
                        Created::CommandBuffer(pool, cmd) => {
                            device.free_command_buffers(pool, &[cmd])
                        }
                        Created::Semaphore(s) => device.destroy_semaphore(s, None),
                        Created::Fence(f) => device.destroy_fence(f, None),
                        _ => {}
                    }
                }
            }
        }
    }
}
