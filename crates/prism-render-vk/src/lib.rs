// SPDX-License-Identifier: CEPL-1.0
//! Vulkan backend.
//!
//! Context creation is a linear state machine (see [`Stage`]); every native
//! object goes through one ledger that destroys in reverse creation order,
//! so a failure at any step leaves nothing behind. Frames run on a fence and
//! semaphore ring of `frames_in_flight` slots.
#![deny(unsafe_op_in_unsafe_fn)]
use std::ffi::CString;
use std::time::Duration;

use ash::vk;
use prism_render::{
    Backend, BackendId, ClearValues, ClientApi, Diagnostics, FrameStatus, GfxResult, Options,
    RenderSize, WindowHints, WindowTarget,
};
use tracing::{info, warn};

mod ash_driver;
mod context;
mod driver;
mod error;
mod ledger;
mod ring;
mod shaders;

#[cfg(test)]
mod mock;

pub use ash_driver::AshDriver;
pub use context::VkContext;
pub use driver::{
    Created, DrawRecording, Driver, FramePresent, FrameSubmit, InstanceDesc, PipelineDesc,
    SwapchainDesc, VALIDATION_LAYER,
};
pub use error::{Stage, VkError};
pub use ring::FrameRing;

/// Creation parameters resolved from [`Options`].
#[derive(Clone, Debug)]
pub struct VkConfig {
    pub application_name: CString,
    pub application_version: u32,
    pub engine_name: CString,
    pub engine_version: u32,
    pub api_version: u32,
    pub validation: bool,
    pub frames_in_flight: usize,
    pub frame_timeout: Option<Duration>,
    pub surface_format_fallback: bool,
    /// Colour baked into the command buffers until a frame asks for another.
    pub clear_color: [f32; 4],
}

impl VkConfig {
    pub fn from_options(options: &Options) -> Result<Self, VkError> {
        let vk_opts = &options.vulkan;
        Ok(Self {
            application_name: CString::new(vk_opts.application_name.as_str())?,
            application_version: vk_opts.application_version,
            engine_name: CString::new(vk_opts.engine_name.as_str())?,
            engine_version: vk_opts.engine_version,
            api_version: vk::make_api_version(
                0,
                vk_opts.api_version_major,
                vk_opts.api_version_minor,
                0,
            ),
            validation: vk_opts.debug_context,
            frames_in_flight: vk_opts.frames_in_flight.max(1),
            frame_timeout: vk_opts.frame_timeout_ms.map(Duration::from_millis),
            surface_format_fallback: vk_opts.surface_format_fallback,
            clear_color: [0.02, 0.02, 0.04, 1.0],
        })
    }

    fn timeout_ns(&self) -> u64 {
        self.frame_timeout.map_or(u64::MAX, |t| {
            u64::try_from(t.as_nanos()).unwrap_or(u64::MAX)
        })
    }
}

/// Where a context gets its [`Driver`] from.
pub trait DriverSource {
    type Driver: Driver;

    fn open(&self, diagnostics: &Diagnostics) -> Result<Self::Driver, VkError>;
}

/// The system Vulkan loader.
#[derive(Clone, Copy, Debug, Default)]
pub struct AshSource;

impl DriverSource for AshSource {
    type Driver = AshDriver;

    fn open(&self, diagnostics: &Diagnostics) -> Result<AshDriver, VkError> {
        Ok(AshDriver::new(diagnostics.clone()))
    }
}

pub struct VkBackend<S: DriverSource = AshSource> {
    source: S,
    diagnostics: Diagnostics,
    context: Option<VkContext<S::Driver>>,
}

impl VkBackend {
    pub fn new() -> Self {
        Self::with_source(AshSource)
    }
}

impl Default for VkBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DriverSource> VkBackend<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            diagnostics: Diagnostics::default(),
            context: None,
        }
    }

    pub fn context(&self) -> Option<&VkContext<S::Driver>> {
        self.context.as_ref()
    }

    fn context_mut(&mut self) -> &mut VkContext<S::Driver> {
        match self.context.as_mut() {
            Some(context) => context,
            None => panic!("vulkan backend used without a context"),
        }
    }
}

impl<S: DriverSource> Backend for VkBackend<S> {
    fn id(&self) -> BackendId {
        BackendId::Vulkan
    }

    fn init(&mut self, diagnostics: &Diagnostics) -> GfxResult<()> {
        self.diagnostics = diagnostics.clone();
        Ok(())
    }

    fn window_hints(&self, options: &Options) -> WindowHints {
        WindowHints::from_options(options, ClientApi::None)
    }

    fn create_context(&mut self, options: &Options, window: &dyn WindowTarget) -> GfxResult<()> {
        assert!(
            self.context.is_none(),
            "vulkan context already created; destroy it first"
        );
        if options.antialiasing_samples > 1 {
            warn!(
                "vk: {}x antialiasing requested; rendering single-sampled",
                options.antialiasing_samples
            );
        }
        let config = VkConfig::from_options(options)?;
        let driver = self.source.open(&self.diagnostics)?;
        let context = VkContext::create(driver, &config, window)?;
        match context.extent() {
            Some(extent) => self.diagnostics.debug_print(format_args!(
                "vulkan context {}x{}, {} images, {} frames in flight",
                extent.width,
                extent.height,
                context.image_count(),
                context.frames_in_flight()
            )),
            None => self.diagnostics.debug_print(format_args!(
                "vulkan context paused, {} frames in flight",
                context.frames_in_flight()
            )),
        }
        self.context = Some(context);
        Ok(())
    }

    fn destroy_context(&mut self) {
        if self.context.take().is_some() {
            info!("Vulkan context destroyed");
        }
    }

    fn begin_frame(&mut self, clear: &ClearValues) -> GfxResult<FrameStatus> {
        Ok(self.context_mut().begin_frame(clear)?)
    }

    fn resize(&mut self, size: RenderSize) -> GfxResult<()> {
        Ok(self.context_mut().resize(size)?)
    }
}
