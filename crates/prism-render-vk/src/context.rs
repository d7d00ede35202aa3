// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CStr;

use ash::vk;
use prism_render::{RenderSize, WindowTarget};
use tracing::{debug, info, warn};

use crate::driver::{
    Created, DrawRecording, Driver, InstanceDesc, PipelineDesc, SwapchainDesc, VALIDATION_LAYER,
};
use crate::ledger::Ledger;
use crate::ring::FrameRing;
use crate::shaders::{ShaderCode, Vertex, TRIANGLE};
use crate::{Stage, VkConfig, VkError};

mod frame;

const TARGET_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_SRGB,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Synchronisation for one in-flight frame.
#[derive(Clone, Copy, Debug)]
struct FrameSlot {
    image_available: vk::Semaphore,
    render_finished: vk::Semaphore,
    in_flight: vk::Fence,
}

/// An image acquired by a frame that has not been submitted yet. The
/// current slot's `image_available` still carries its signal.
#[derive(Clone, Copy, Debug)]
struct Acquired {
    image_index: u32,
    suboptimal: bool,
}

#[derive(Debug)]
struct SwapImage {
    framebuffer: vk::Framebuffer,
    command_buffer: vk::CommandBuffer,
    /// Fence of the ring slot that last submitted work for this image.
    owner: Option<vk::Fence>,
    /// Clear colour baked into `command_buffer`.
    clear_color: [f32; 4],
}

/// Everything that has to be rebuilt with the swapchain.
#[derive(Debug)]
struct SwapchainResources {
    swapchain: vk::SwapchainKHR,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
    render_pass: vk::RenderPass,
    pipeline: vk::Pipeline,
    vertex_buffer: vk::Buffer,
    images: Vec<SwapImage>,
}

impl SwapchainResources {
    fn draw_recording(&self, image: usize) -> DrawRecording {
        let img = &self.images[image];
        DrawRecording {
            render_pass: self.render_pass,
            framebuffer: img.framebuffer,
            pipeline: self.pipeline,
            extent: self.extent,
            vertex_buffer: self.vertex_buffer,
            vertex_count: TRIANGLE.len() as u32,
            clear_color: img.clear_color,
        }
    }
}

/// Objects that survive swapchain rebuilds. Null until first created.
#[derive(Debug, Default)]
struct Shared {
    layout: vk::PipelineLayout,
    vertex_buffer: vk::Buffer,
    pool: vk::CommandPool,
}

struct ChainInputs<'a> {
    surface: vk::SurfaceKHR,
    phys: vk::PhysicalDevice,
    queue_family: u32,
    shaders: &'a ShaderCode,
    size: RenderSize,
    format_fallback: bool,
    clear_color: [f32; 4],
}

/// A live Vulkan context bound to one window.
///
/// All native objects are owned by the ledger; dropping the context idles the
/// device and destroys them newest first.
pub struct VkContext<D: Driver> {
    ledger: Ledger<D>,
    stage: Stage,
    shaders: ShaderCode,
    surface: vk::SurfaceKHR,
    phys: vk::PhysicalDevice,
    queue_family: u32,
    queue: vk::Queue,
    shared: Shared,
    chain: Option<SwapchainResources>,
    ring: FrameRing<FrameSlot>,
    acquired: Option<Acquired>,
    size: RenderSize,
    paused: bool,
    timeout_ns: u64,
    clear_color: [f32; 4],
    format_fallback: bool,
}

fn reach(stage: &mut Stage, next: Stage) {
    if *stage < next {
        debug!(stage = %next, "vk: stage reached");
        *stage = next;
    }
}

impl<D: Driver> VkContext<D> {
    /// Walks the creation chain from `Uninitialized` to `Ready`. Any failure
    /// unwinds every object created so far before the error is returned.
    pub fn create(driver: D, config: &VkConfig, window: &dyn WindowTarget) -> Result<Self, VkError> {
        let mut stage = Stage::Uninitialized;
        let result = Self::build(driver, config, window, &mut stage);
        if let Err(e) = &result {
            warn!(%stage, "vk: context creation failed after last good stage: {e}");
        }
        result
    }

    fn build(
        driver: D,
        config: &VkConfig,
        window: &dyn WindowTarget,
        stage: &mut Stage,
    ) -> Result<Self, VkError> {
        let shaders = ShaderCode::load()?;
        let display = window.display_handle()?.as_raw();
        let raw_window = window.window_handle()?.as_raw();
        let mut ledger = Ledger::new(driver);

        if !ledger.driver().is_api_supported() {
            return Err(VkError::ApiUnsupported);
        }
        let mut extensions = ledger
            .driver()
            .required_instance_extensions(display)
            .map_err(VkError::MissingExtensions)?;
        reach(stage, Stage::ApiSupportChecked);

        let validation = config.validation && ledger.driver().has_instance_layer(VALIDATION_LAYER);
        if config.validation && !validation {
            warn!(
                "vk: {} not installed; continuing without validation",
                VALIDATION_LAYER.to_string_lossy()
            );
        }
        let layers: Vec<&CStr> = if validation {
            extensions.push(ash::ext::debug_utils::NAME.to_owned());
            vec![VALIDATION_LAYER]
        } else {
            Vec::new()
        };
        let instance_desc = InstanceDesc {
            application_name: &config.application_name,
            application_version: config.application_version,
            engine_name: &config.engine_name,
            engine_version: config.engine_version,
            api_version: config.api_version,
            extensions: &extensions,
            layers: &layers,
        };
        ledger
            .create(|d| d.create_instance(&instance_desc), Created::Instance)
            .map_err(VkError::Instance)?;
        if validation {
            ledger
                .create(|d| d.create_debug_messenger(), Created::DebugMessenger)
                .map_err(VkError::DebugMessenger)?;
        }
        reach(stage, Stage::InstanceCreated);

        let surface = ledger
            .create(|d| d.create_surface(display, raw_window), Created::Surface)
            .map_err(VkError::Surface)?;
        reach(stage, Stage::SurfaceCreated);

        let (phys, queue_family) = pick_device_and_queue(ledger.driver(), surface)?;
        reach(stage, Stage::PhysicalDeviceChosen);

        ledger
            .create(|d| d.create_device(phys, queue_family), Created::Device)
            .map_err(VkError::Device)?;
        let queue = ledger.driver().device_queue(queue_family);
        reach(stage, Stage::LogicalDeviceCreated);

        let mut shared = Shared::default();
        let size = window.framebuffer_size();
        let inputs = ChainInputs {
            surface,
            phys,
            queue_family,
            shaders: &shaders,
            size,
            format_fallback: config.surface_format_fallback,
            clear_color: config.clear_color,
        };
        let chain = build_chain(&mut ledger, &inputs, &mut shared, stage)?;

        let ring = create_sync_objects(&mut ledger, config.frames_in_flight)?;
        reach(stage, Stage::Ready);

        match &chain {
            Some(c) => info!(
                "Vulkan swapchain ready ({}x{}, {:?}, {} images, {} frames in flight)",
                c.extent.width,
                c.extent.height,
                c.format.format,
                c.images.len(),
                ring.capacity()
            ),
            None => info!("Vulkan context ready; surface is zero-sized, rendering paused"),
        }

        Ok(Self {
            ledger,
            stage: *stage,
            shaders,
            surface,
            phys,
            queue_family,
            queue,
            shared,
            paused: chain.is_none(),
            chain,
            ring,
            acquired: None,
            size,
            timeout_ns: config.timeout_ns(),
            clear_color: config.clear_color,
            format_fallback: config.surface_format_fallback,
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// `None` while paused or after a failed rebuild.
    pub fn extent(&self) -> Option<vk::Extent2D> {
        self.chain.as_ref().map(|c| c.extent)
    }

    pub fn image_count(&self) -> usize {
        self.chain.as_ref().map_or(0, |c| c.images.len())
    }

    pub fn frames_in_flight(&self) -> usize {
        self.ring.capacity()
    }

    /// Ring slot the next frame will use.
    pub fn frame_slot(&self) -> usize {
        self.ring.index()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// A zero-area size pauses rendering; any other size rebuilds the
    /// swapchain for it.
    pub fn resize(&mut self, size: RenderSize) -> Result<(), VkError> {
        self.size = size;
        if size.is_empty() {
            if !self.paused {
                info!("vk: surface is zero-sized, rendering paused");
            }
            self.paused = true;
            return Ok(());
        }
        self.rebuild_swapchain()
    }

    /// Idles the device, drops every swapchain-dependent object and builds
    /// them again for the current size. On failure the context stays without
    /// a swapchain and the next frame retries.
    fn rebuild_swapchain(&mut self) -> Result<(), VkError> {
        self.ledger
            .driver_mut()
            .device_wait_idle()
            .map_err(VkError::WaitIdle)?;
        self.chain = None;
        self.ledger.release_swapchain_scoped();
        if self.acquired.take().is_some() {
            self.renew_image_available()?;
        }

        let inputs = ChainInputs {
            surface: self.surface,
            phys: self.phys,
            queue_family: self.queue_family,
            shaders: &self.shaders,
            size: self.size,
            format_fallback: self.format_fallback,
            clear_color: self.clear_color,
        };
        let chain = build_chain(&mut self.ledger, &inputs, &mut self.shared, &mut self.stage)?;
        match &chain {
            Some(c) => info!(
                "vk: swapchain rebuilt ({}x{}, {} images)",
                c.extent.width,
                c.extent.height,
                c.images.len()
            ),
            None => info!("vk: surface is zero-sized, rendering paused"),
        }
        self.paused = chain.is_none();
        self.chain = chain;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn ledger(&self) -> &Ledger<D> {
        &self.ledger
    }
}

fn pick_device_and_queue<D: Driver>(
    driver: &D,
    surface: vk::SurfaceKHR,
) -> Result<(vk::PhysicalDevice, u32), VkError> {
    // First match wins; no ranking of discrete vs integrated.
    for phys in driver
        .enumerate_physical_devices()
        .map_err(VkError::EnumerateDevices)?
    {
        for (i, family) in driver.queue_families(phys).iter().enumerate() {
            let index = i as u32;
            if family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                && driver
                    .surface_support(phys, index, surface)
                    .unwrap_or(false)
            {
                return Ok((phys, index));
            }
        }
    }
    Err(VkError::NoSuitableDevice)
}

fn same_format(a: &vk::SurfaceFormatKHR, b: &vk::SurfaceFormatKHR) -> bool {
    a.format == b.format && a.color_space == b.color_space
}

/// BGRA8/sRGB or nothing, unless `fallback` allows the SDR chain.
fn choose_surface_format(
    formats: &[vk::SurfaceFormatKHR],
    fallback: bool,
) -> Option<vk::SurfaceFormatKHR> {
    if let Some(f) = formats.iter().find(|f| same_format(f, &TARGET_FORMAT)) {
        return Some(*f);
    }
    if !fallback {
        return None;
    }
    let chain = [
        vk::SurfaceFormatKHR {
            format: vk::Format::R8G8B8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        },
        vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        },
    ];
    chain
        .iter()
        .find_map(|want| formats.iter().find(|f| same_format(f, want)))
        .or_else(|| formats.first())
        .copied()
}

fn extent_from_caps(caps: &vk::SurfaceCapabilitiesKHR, want: RenderSize) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        caps.current_extent
    } else {
        vk::Extent2D {
            width: want
                .width
                .max(caps.min_image_extent.width)
                .min(caps.max_image_extent.width),
            height: want
                .height
                .max(caps.min_image_extent.height)
                .min(caps.max_image_extent.height),
        }
    }
}

fn image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let want = caps.min_image_count + 1;
    if caps.max_image_count == 0 {
        want
    } else {
        want.min(caps.max_image_count)
    }
}

/// Swapchain, one view per image, render pass, pipeline, framebuffers and
/// pre-recorded command buffers. Shared objects are created on first use.
/// Returns `None` when the surface has no area.
fn build_chain<D: Driver>(
    ledger: &mut Ledger<D>,
    inputs: &ChainInputs<'_>,
    shared: &mut Shared,
    stage: &mut Stage,
) -> Result<Option<SwapchainResources>, VkError> {
    let driver = ledger.driver();
    let caps = driver
        .surface_capabilities(inputs.phys, inputs.surface)
        .map_err(VkError::SurfaceQuery)?;
    let formats = driver
        .surface_formats(inputs.phys, inputs.surface)
        .map_err(VkError::SurfaceQuery)?;
    let format = choose_surface_format(&formats, inputs.format_fallback)
        .ok_or(VkError::FormatUnavailable)?;
    if !same_format(&format, &TARGET_FORMAT) {
        warn!(
            "vk: BGRA8/sRGB unavailable, using {:?}/{:?}",
            format.format, format.color_space
        );
    }
    let extent = extent_from_caps(&caps, inputs.size);
    if extent.width == 0 || extent.height == 0 {
        return Ok(None);
    }

    let swapchain_desc = SwapchainDesc {
        surface: inputs.surface,
        min_image_count: image_count(&caps),
        format,
        extent,
        pre_transform: caps.current_transform,
        present_mode: vk::PresentModeKHR::FIFO,
        usage: vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC,
    };
    let swapchain = ledger
        .create(|d| d.create_swapchain(&swapchain_desc), Created::Swapchain)
        .map_err(VkError::Swapchain)?;
    let images = ledger
        .driver()
        .swapchain_images(swapchain)
        .map_err(VkError::SwapchainImages)?;
    reach(stage, Stage::SwapchainCreated);

    let mut views = Vec::with_capacity(images.len());
    for &image in &images {
        let view = ledger
            .create(|d| d.create_image_view(image, format.format), Created::ImageView)
            .map_err(VkError::ImageView)?;
        views.push(view);
    }
    reach(stage, Stage::ImageViewsCreated);

    let render_pass = ledger
        .create(|d| d.create_render_pass(format.format), Created::RenderPass)
        .map_err(VkError::RenderPass)?;
    if shared.layout == vk::PipelineLayout::null() {
        shared.layout = ledger
            .create(|d| d.create_pipeline_layout(), Created::PipelineLayout)
            .map_err(VkError::PipelineLayout)?;
    }
    let pipeline_desc = PipelineDesc {
        render_pass,
        layout: shared.layout,
        extent,
        vertex_spv: &inputs.shaders.vertex,
        fragment_spv: &inputs.shaders.fragment,
        vertex_stride: std::mem::size_of::<Vertex>() as u32,
    };
    let pipeline = ledger
        .create(|d| d.create_pipeline(&pipeline_desc), Created::Pipeline)
        .map_err(VkError::Pipeline)?;

    let mut framebuffers = Vec::with_capacity(views.len());
    for &view in &views {
        let framebuffer = ledger
            .create(
                |d| d.create_framebuffer(render_pass, view, extent),
                Created::Framebuffer,
            )
            .map_err(VkError::Framebuffer)?;
        framebuffers.push(framebuffer);
    }

    if shared.vertex_buffer == vk::Buffer::null() {
        let (buffer, _) = ledger
            .create(
                |d| d.create_vertex_buffer(inputs.phys, bytemuck::cast_slice(&TRIANGLE)),
                |(buffer, memory)| Created::Buffer(buffer, memory),
            )
            .map_err(VkError::VertexBuffer)?;
        shared.vertex_buffer = buffer;
    }
    if shared.pool == vk::CommandPool::null() {
        shared.pool = ledger
            .create(
                |d| d.create_command_pool(inputs.queue_family),
                Created::CommandPool,
            )
            .map_err(VkError::CommandPool)?;
    }
    let pool = shared.pool;
    let command_buffers = ledger
        .driver_mut()
        .allocate_command_buffers(pool, framebuffers.len() as u32)
        .map_err(VkError::CommandBuffers)?;
    for &cmd in &command_buffers {
        ledger.track(Created::CommandBuffer(pool, cmd));
    }

    let resources = SwapchainResources {
        swapchain,
        format,
        extent,
        render_pass,
        pipeline,
        vertex_buffer: shared.vertex_buffer,
        images: framebuffers
            .into_iter()
            .zip(command_buffers)
            .map(|(framebuffer, command_buffer)| SwapImage {
                framebuffer,
                command_buffer,
                owner: None,
                clear_color: inputs.clear_color,
            })
            .collect(),
    };
    for image in 0..resources.images.len() {
        let recording = resources.draw_recording(image);
        ledger
            .driver_mut()
            .record_draw(resources.images[image].command_buffer, &recording)
            .map_err(VkError::Recording)?;
    }
    reach(stage, Stage::RenderObjectsCreated);
    Ok(Some(resources))
}

fn create_sync_objects<D: Driver>(
    ledger: &mut Ledger<D>,
    count: usize,
) -> Result<FrameRing<FrameSlot>, VkError> {
    let mut slots = Vec::with_capacity(count);
    for _ in 0..count {
        let image_available = ledger
            .create(|d| d.create_semaphore(), Created::Semaphore)
            .map_err(VkError::SyncObjects)?;
        let render_finished = ledger
            .create(|d| d.create_semaphore(), Created::Semaphore)
            .map_err(VkError::SyncObjects)?;
        // Signaled so the first wait on each slot returns at once.
        let in_flight = ledger
            .create(|d| d.create_fence(true), Created::Fence)
            .map_err(VkError::SyncObjects)?;
        slots.push(FrameSlot {
            image_available,
            render_finished,
            in_flight,
        });
    }
    Ok(FrameRing::new(slots))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(min: u32, max: u32, current: vk::Extent2D) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min,
            max_image_count: max,
            current_extent: current,
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            ..Default::default()
        }
    }

    const FLEXIBLE: vk::Extent2D = vk::Extent2D {
        width: u32::MAX,
        height: u32::MAX,
    };

    #[test]
    fn image_count_is_min_plus_one_within_max() {
        assert_eq!(image_count(&caps(2, 0, FLEXIBLE)), 3);
        assert_eq!(image_count(&caps(2, 8, FLEXIBLE)), 3);
        assert_eq!(image_count(&caps(2, 2, FLEXIBLE)), 2);
    }

    #[test]
    fn fixed_surface_extent_wins_over_window_size() {
        let fixed = vk::Extent2D {
            width: 800,
            height: 600,
        };
        let e = extent_from_caps(&caps(1, 0, fixed), RenderSize::new(1024, 768));
        assert_eq!((e.width, e.height), (800, 600));

        let e = extent_from_caps(&caps(1, 0, FLEXIBLE), RenderSize::new(9000, 0));
        assert_eq!((e.width, e.height), (4096, 1));
    }

    #[test]
    fn strict_format_selection_has_no_fallback() {
        let unorm = vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };
        assert!(choose_surface_format(&[unorm], false).is_none());
        let picked = choose_surface_format(&[unorm, TARGET_FORMAT], false).unwrap();
        assert!(same_format(&picked, &TARGET_FORMAT));
    }

    #[test]
    fn fallback_walks_the_sdr_chain() {
        let rgba = vk::SurfaceFormatKHR {
            format: vk::Format::R8G8B8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };
        let odd = vk::SurfaceFormatKHR {
            format: vk::Format::A2B10G10R10_UNORM_PACK32,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };
        let picked = choose_surface_format(&[odd, rgba], true).unwrap();
        assert_eq!(picked.format, vk::Format::R8G8B8A8_SRGB);
        let picked = choose_surface_format(&[odd], true).unwrap();
        assert_eq!(picked.format, odd.format);
        assert!(choose_surface_format(&[], true).is_none());
    }
}
