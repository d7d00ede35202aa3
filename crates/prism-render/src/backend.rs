// SPDX-License-Identifier: CEPL-1.0
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    ClearValues, Diagnostics, FrameStatus, GfxError, GfxResult, Options, RenderSize,
    WindowHints, WindowTarget,
};

/// Every graphics API the facade knows about. Only some are ever compiled in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    Vulkan,
    OpenGl,
    // Reserved slots; no implementation ships for these yet.
    Direct3D12,
    Metal,
}

impl BackendId {
    pub const ALL: [BackendId; 4] = [
        BackendId::Vulkan,
        BackendId::OpenGl,
        BackendId::Direct3D12,
        BackendId::Metal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BackendId::Vulkan => "vulkan",
            BackendId::OpenGl => "opengl",
            BackendId::Direct3D12 => "d3d12",
            BackendId::Metal => "metal",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendId {
    type Err = GfxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vk" | "vulkan" => Ok(BackendId::Vulkan),
            "gl" | "opengl" => Ok(BackendId::OpenGl),
            "d3d12" | "dx12" => Ok(BackendId::Direct3D12),
            "metal" | "mtl" => Ok(BackendId::Metal),
            other => Err(GfxError::UnknownBackend(other.to_owned())),
        }
    }
}

/// The capability set every concrete backend provides. The facade selects
/// one implementation at `initialize` and only ever talks to it through this
/// trait.
pub trait Backend {
    fn id(&self) -> BackendId;

    fn init(&mut self, diagnostics: &Diagnostics) -> GfxResult<()>;

    /// Hints the window system must honour when it creates the window.
    fn window_hints(&self, options: &Options) -> WindowHints;

    /// Binds a context to `window`. On error nothing created by this call is
    /// left alive. Calling it again before `destroy_context` is a bug and
    /// panics.
    fn create_context(&mut self, options: &Options, window: &dyn WindowTarget) -> GfxResult<()>;

    fn destroy_context(&mut self);

    fn begin_frame(&mut self, clear: &ClearValues) -> GfxResult<FrameStatus>;

    fn resize(&mut self, size: RenderSize) -> GfxResult<()>;
}

pub type BackendCtor = Box<dyn Fn() -> Box<dyn Backend>>;

/// Maps backend ids to constructors. Only backends that were compiled in get
/// registered.
#[derive(Default)]
pub struct BackendRegistry {
    entries: Vec<(BackendId, BackendCtor)>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the constructor for `id`.
    pub fn register<F>(&mut self, id: BackendId, ctor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Backend> + 'static,
    {
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.push((id, Box::new(ctor)));
        self.entries.sort_by_key(|(id, _)| *id);
        self
    }

    pub fn with<F>(mut self, id: BackendId, ctor: F) -> Self
    where
        F: Fn() -> Box<dyn Backend> + 'static,
    {
        self.register(id, ctor);
        self
    }

    pub fn contains(&self, id: BackendId) -> bool {
        self.entries.iter().any(|(existing, _)| *existing == id)
    }

    /// Count-only when `out` is `None`, otherwise appends every registered id
    /// to `out`. Returns the count either way.
    pub fn query(&self, out: Option<&mut Vec<BackendId>>) -> usize {
        if let Some(out) = out {
            out.extend(self.entries.iter().map(|(id, _)| *id));
        }
        self.entries.len()
    }

    pub fn available(&self) -> Vec<BackendId> {
        let mut ids = Vec::with_capacity(self.entries.len());
        self.query(Some(&mut ids));
        ids
    }

    pub fn instantiate(&self, id: BackendId) -> Option<Box<dyn Backend>> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, ctor)| ctor())
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, _)| id))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Null(BackendId);

    impl Backend for Null {
        fn id(&self) -> BackendId {
            self.0
        }
        fn init(&mut self, _: &Diagnostics) -> GfxResult<()> {
            Ok(())
        }
        fn window_hints(&self, options: &Options) -> WindowHints {
            WindowHints::from_options(options, crate::ClientApi::None)
        }
        fn create_context(&mut self, _: &Options, _: &dyn WindowTarget) -> GfxResult<()> {
            Ok(())
        }
        fn destroy_context(&mut self) {}
        fn begin_frame(&mut self, _: &ClearValues) -> GfxResult<FrameStatus> {
            Ok(FrameStatus::Skipped)
        }
        fn resize(&mut self, _: RenderSize) -> GfxResult<()> {
            Ok(())
        }
    }

    #[test]
    fn parses_short_and_long_names() {
        assert_eq!("vk".parse::<BackendId>().unwrap(), BackendId::Vulkan);
        assert_eq!("OpenGL".parse::<BackendId>().unwrap(), BackendId::OpenGl);
        assert!(matches!(
            "glide".parse::<BackendId>(),
            Err(GfxError::UnknownBackend(name)) if name == "glide"
        ));
    }

    #[test]
    fn empty_registry_reports_zero() {
        let registry = BackendRegistry::new();
        assert_eq!(registry.query(None), 0);
        let mut out = Vec::new();
        assert_eq!(registry.query(Some(&mut out)), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn query_is_sorted_and_stable() {
        let registry = BackendRegistry::new()
            .with(BackendId::OpenGl, || Box::new(Null(BackendId::OpenGl)))
            .with(BackendId::Vulkan, || Box::new(Null(BackendId::Vulkan)));

        assert_eq!(registry.query(None), 2);
        let first = registry.available();
        let second = registry.available();
        assert_eq!(first, vec![BackendId::Vulkan, BackendId::OpenGl]);
        assert_eq!(first, second);
    }

    #[test]
    fn register_replaces_existing_entry() {
        let mut registry = BackendRegistry::new();
        registry.register(BackendId::Vulkan, || Box::new(Null(BackendId::Vulkan)));
        registry.register(BackendId::Vulkan, || Box::new(Null(BackendId::Vulkan)));
        assert_eq!(registry.query(None), 1);
        assert!(registry.instantiate(BackendId::Metal).is_none());
        assert_eq!(
            registry.instantiate(BackendId::Vulkan).map(|b| b.id()),
            Some(BackendId::Vulkan)
        );
    }
}
