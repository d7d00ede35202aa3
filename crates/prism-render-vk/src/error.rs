// SPDX-License-Identifier: CEPL-1.0
use std::fmt;

use ash::vk;
use prism_render::GfxError;
use raw_window_handle::HandleError;
use thiserror::Error;

/// Context-creation progress. Each step is one creation call; a failure at
/// any step unwinds every earlier one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Uninitialized,
    ApiSupportChecked,
    InstanceCreated,
    SurfaceCreated,
    PhysicalDeviceChosen,
    LogicalDeviceCreated,
    SwapchainCreated,
    ImageViewsCreated,
    RenderObjectsCreated,
    Ready,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One variant per failure site.
#[derive(Debug, Error)]
pub enum VkError {
    #[error("vulkan is not supported on this machine")]
    ApiUnsupported,
    #[error("window system cannot list the required instance extensions: {0}")]
    MissingExtensions(vk::Result),
    #[error("window handle unavailable: {0}")]
    Window(#[from] HandleError),
    #[error("application or engine name contains a NUL byte")]
    InvalidName(#[from] std::ffi::NulError),
    #[error("failed to load SPIR-V: {0}")]
    Shader(#[from] std::io::Error),

    #[error("create_instance failed: {0}")]
    Instance(vk::Result),
    #[error("create_debug_utils_messenger failed: {0}")]
    DebugMessenger(vk::Result),
    #[error("create_surface failed: {0}")]
    Surface(vk::Result),
    #[error("enumerate_physical_devices failed: {0}")]
    EnumerateDevices(vk::Result),
    #[error("no physical device has a queue family with graphics and present support")]
    NoSuitableDevice,
    #[error("create_device failed: {0}")]
    Device(vk::Result),
    #[error("surface query failed: {0}")]
    SurfaceQuery(vk::Result),
    #[error("surface does not offer B8G8R8A8_SRGB with SRGB_NONLINEAR")]
    FormatUnavailable,
    #[error("create_swapchain failed: {0}")]
    Swapchain(vk::Result),
    #[error("get_swapchain_images failed: {0}")]
    SwapchainImages(vk::Result),
    #[error("create_image_view failed: {0}")]
    ImageView(vk::Result),
    #[error("create_render_pass failed: {0}")]
    RenderPass(vk::Result),
    #[error("create_pipeline_layout failed: {0}")]
    PipelineLayout(vk::Result),
    #[error("create_graphics_pipelines failed: {0}")]
    Pipeline(vk::Result),
    #[error("create_framebuffer failed: {0}")]
    Framebuffer(vk::Result),
    #[error("vertex buffer upload failed: {0}")]
    VertexBuffer(vk::Result),
    #[error("create_command_pool failed: {0}")]
    CommandPool(vk::Result),
    #[error("allocate_command_buffers failed: {0}")]
    CommandBuffers(vk::Result),
    #[error("command buffer recording failed: {0}")]
    Recording(vk::Result),
    #[error("sync object creation failed: {0}")]
    SyncObjects(vk::Result),

    #[error("wait_for_fences failed: {0}")]
    FenceWait(vk::Result),
    #[error("reset_fences failed: {0}")]
    FenceReset(vk::Result),
    #[error("timed out waiting for the GPU")]
    TimedOut,
    #[error("acquire_next_image failed: {0}")]
    Acquire(vk::Result),
    #[error("queue_submit failed: {0}")]
    Submit(vk::Result),
    #[error("queue_present failed: {0}")]
    Present(vk::Result),
    #[error("device_wait_idle failed: {0}")]
    WaitIdle(vk::Result),
}

impl From<VkError> for GfxError {
    fn from(err: VkError) -> Self {
        match err {
            VkError::TimedOut => GfxError::TimedOut,
            VkError::Window(e) => GfxError::Window(e),
            other => GfxError::backend(other),
        }
    }
}
