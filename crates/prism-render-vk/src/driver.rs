// SPDX-License-Identifier: CEPL-1.0
//! The native-call seam. Everything the state machine and the frame loop
//! need from Vulkan and the window system goes through [`Driver`], so the
//! whole backend can run against a fake GPU.
use std::ffi::{CStr, CString};

use ash::{prelude::VkResult, vk};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// A native object that must be destroyed explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Created {
    Instance(vk::Instance),
    DebugMessenger(vk::DebugUtilsMessengerEXT),
    Surface(vk::SurfaceKHR),
    Device(vk::Device),
    Swapchain(vk::SwapchainKHR),
    ImageView(vk::ImageView),
    RenderPass(vk::RenderPass),
    PipelineLayout(vk::PipelineLayout),
    Pipeline(vk::Pipeline),
    Framebuffer(vk::Framebuffer),
    Buffer(vk::Buffer, vk::DeviceMemory),
    CommandPool(vk::CommandPool),
    CommandBuffer(vk::CommandPool, vk::CommandBuffer),
    Semaphore(vk::Semaphore),
    Fence(vk::Fence),
}

impl Created {
    /// Objects that depend on the swapchain's images, format or extent and
    /// are rebuilt with it.
    pub fn is_swapchain_scoped(&self) -> bool {
        matches!(
            self,
            Created::Swapchain(_)
                | Created::ImageView(_)
                | Created::RenderPass(_)
                | Created::Pipeline(_)
                | Created::Framebuffer(_)
                | Created::CommandBuffer(..)
        )
    }
}

pub struct InstanceDesc<'a> {
    pub application_name: &'a CStr,
    pub application_version: u32,
    pub engine_name: &'a CStr,
    pub engine_version: u32,
    pub api_version: u32,
    pub extensions: &'a [CString],
    pub layers: &'a [&'a CStr],
}

#[derive(Clone, Copy, Debug)]
pub struct SwapchainDesc {
    pub surface: vk::SurfaceKHR,
    pub min_image_count: u32,
    pub format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub present_mode: vk::PresentModeKHR,
    pub usage: vk::ImageUsageFlags,
}

pub struct PipelineDesc<'a> {
    pub render_pass: vk::RenderPass,
    pub layout: vk::PipelineLayout,
    pub extent: vk::Extent2D,
    pub vertex_spv: &'a [u32],
    pub fragment_spv: &'a [u32],
    pub vertex_stride: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct DrawRecording {
    pub render_pass: vk::RenderPass,
    pub framebuffer: vk::Framebuffer,
    pub pipeline: vk::Pipeline,
    pub extent: vk::Extent2D,
    pub vertex_buffer: vk::Buffer,
    pub vertex_count: u32,
    pub clear_color: [f32; 4],
}

#[derive(Clone, Copy, Debug)]
pub struct FrameSubmit {
    pub command_buffer: vk::CommandBuffer,
    pub wait_semaphore: vk::Semaphore,
    pub wait_stage: vk::PipelineStageFlags,
    pub signal_semaphore: vk::Semaphore,
    pub fence: vk::Fence,
}

#[derive(Clone, Copy, Debug)]
pub struct FramePresent {
    pub swapchain: vk::SwapchainKHR,
    pub image_index: u32,
    pub wait_semaphore: vk::Semaphore,
}

/// Loader/dispatch table for one context. The instance and device are
/// implicit: a driver serves exactly one of each.
pub trait Driver {
    // Window-system collaborator.
    fn is_api_supported(&self) -> bool;
    fn required_instance_extensions(&self, display: RawDisplayHandle) -> VkResult<Vec<CString>>;
    fn create_surface(
        &mut self,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR>;

    fn has_instance_layer(&self, name: &CStr) -> bool;
    fn create_instance(&mut self, desc: &InstanceDesc<'_>) -> VkResult<vk::Instance>;
    fn create_debug_messenger(&mut self) -> VkResult<vk::DebugUtilsMessengerEXT>;

    fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>>;
    fn queue_families(&self, phys: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties>;
    fn surface_support(
        &self,
        phys: vk::PhysicalDevice,
        queue_family: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;

    fn create_device(&mut self, phys: vk::PhysicalDevice, queue_family: u32)
        -> VkResult<vk::Device>;
    fn device_queue(&self, queue_family: u32) -> vk::Queue;

    fn surface_capabilities(
        &self,
        phys: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;
    fn surface_formats(
        &self,
        phys: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>>;

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> VkResult<vk::SwapchainKHR>;
    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>>;
    fn create_image_view(&mut self, image: vk::Image, format: vk::Format)
        -> VkResult<vk::ImageView>;

    fn create_render_pass(&mut self, format: vk::Format) -> VkResult<vk::RenderPass>;
    fn create_pipeline_layout(&mut self) -> VkResult<vk::PipelineLayout>;
    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> VkResult<vk::Pipeline>;
    fn create_framebuffer(
        &mut self,
        render_pass: vk::RenderPass,
        view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> VkResult<vk::Framebuffer>;
    /// Host-visible buffer filled with `bytes`. All-or-nothing.
    fn create_vertex_buffer(
        &mut self,
        phys: vk::PhysicalDevice,
        bytes: &[u8],
    ) -> VkResult<(vk::Buffer, vk::DeviceMemory)>;

    fn create_command_pool(&mut self, queue_family: u32) -> VkResult<vk::CommandPool>;
    fn allocate_command_buffers(
        &mut self,
        pool: vk::CommandPool,
        count: u32,
    ) -> VkResult<Vec<vk::CommandBuffer>>;
    fn record_draw(&mut self, cmd: vk::CommandBuffer, rec: &DrawRecording) -> VkResult<()>;

    fn create_semaphore(&mut self) -> VkResult<vk::Semaphore>;
    fn create_fence(&mut self, signaled: bool) -> VkResult<vk::Fence>;
    /// Blocks until `fence` signals or `timeout_ns` elapses
    /// (`vk::Result::TIMEOUT`).
    fn wait_for_fence(&mut self, fence: vk::Fence, timeout_ns: u64) -> VkResult<()>;
    fn reset_fence(&mut self, fence: vk::Fence) -> VkResult<()>;

    fn acquire_next_image(
        &mut self,
        swapchain: vk::SwapchainKHR,
        timeout_ns: u64,
        signal: vk::Semaphore,
    ) -> VkResult<(u32, bool)>;
    fn queue_submit(&mut self, queue: vk::Queue, submit: &FrameSubmit) -> VkResult<()>;
    /// Returns `true` when the swapchain is suboptimal.
    fn queue_present(&mut self, queue: vk::Queue, present: &FramePresent) -> VkResult<bool>;
    fn device_wait_idle(&mut self) -> VkResult<()>;

    fn destroy(&mut self, object: Created);
}
