// SPDX-License-Identifier: CEPL-1.0
//! Backend-agnostic graphics facade.
//!
//! An application picks one [`BackendId`], configures [`Options`], binds a
//! window and then drives frames through [`Graphics`]. The concrete backends
//! live in their own crates and plug in through the [`Backend`] trait.
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};

mod backend;
mod clear;
mod diagnostics;
mod error;
mod graphics;
mod hints;
mod options;

pub use backend::{Backend, BackendCtor, BackendId, BackendRegistry};
pub use clear::{ClearFlags, ClearValues};
pub use diagnostics::{DebugLevel, DebugRecord, Diagnostics};
pub use error::{GfxError, GfxResult};
pub use graphics::{Configured, Graphics, Initialized, Ready, Uninitialized};
pub use hints::{ChannelBits, ClientApi, WindowHints};
pub use options::{BitDepth, GlOptions, Options, VulkanOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

impl RenderSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// What a backend needs from the window system: native handles plus the
/// current framebuffer size in pixels.
pub trait WindowTarget: HasWindowHandle + HasDisplayHandle {
    fn framebuffer_size(&self) -> RenderSize;
}

/// Pairs any handle provider (a winit window, a test double) with the size
/// the caller last observed for it.
pub struct SizedWindow<'w, W: ?Sized> {
    window: &'w W,
    size: RenderSize,
}

impl<'w, W: HasWindowHandle + HasDisplayHandle + ?Sized> SizedWindow<'w, W> {
    pub fn new(window: &'w W, size: RenderSize) -> Self {
        Self { window, size }
    }
}

impl<W: HasWindowHandle + ?Sized> HasWindowHandle for SizedWindow<'_, W> {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl<W: HasDisplayHandle + ?Sized> HasDisplayHandle for SizedWindow<'_, W> {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

impl<W: HasWindowHandle + HasDisplayHandle + ?Sized> WindowTarget for SizedWindow<'_, W> {
    fn framebuffer_size(&self) -> RenderSize {
        self.size
    }
}

/// Result of one `begin_frame` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// The frame was submitted and queued for presentation.
    Presented { image_index: u32, suboptimal: bool },
    /// Nothing was submitted (zero-sized window, or the swapchain was rebuilt).
    Skipped,
}
