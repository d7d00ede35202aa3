// SPDX-License-Identifier: CEPL-1.0
//! Entry point that knows which backends this build carries.
//!
//! Backends are selected at compile time through the `vulkan` and `opengl`
//! cargo features; everything here is a pure function of that selection.
#![deny(unsafe_op_in_unsafe_fn)]
pub use prism_render::*;

use tracing::debug;

/// Backends compiled into this build, in [`BackendId`] order.
const COMPILED: &[BackendId] = &[
    #[cfg(feature = "vulkan")]
    BackendId::Vulkan,
    #[cfg(feature = "opengl")]
    BackendId::OpenGl,
];

/// Count-only when `out` is `None`; otherwise appends every compiled backend
/// to `out`. Returns the count either way.
pub fn query_available_backends(out: Option<&mut Vec<BackendId>>) -> usize {
    if let Some(out) = out {
        out.extend_from_slice(COMPILED);
    }
    COMPILED.len()
}

pub fn available_backends() -> Vec<BackendId> {
    COMPILED.to_vec()
}

/// A registry holding a constructor for every compiled backend.
pub fn registry() -> BackendRegistry {
    #[allow(unused_mut)]
    let mut registry = BackendRegistry::new();
    #[cfg(feature = "vulkan")]
    registry.register(BackendId::Vulkan, || {
        Box::new(prism_render_vk::VkBackend::new())
    });
    #[cfg(feature = "opengl")]
    registry.register(BackendId::OpenGl, || {
        Box::new(prism_render_gl::GlBackend::new())
    });
    debug!(backends = ?registry.available(), "backend registry built");
    registry
}

/// Uninitialised facade over [`registry`].
pub fn graphics(diagnostics: Diagnostics) -> Graphics<Uninitialized> {
    Graphics::new(registry(), diagnostics)
}
