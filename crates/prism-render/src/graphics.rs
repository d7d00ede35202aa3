// SPDX-License-Identifier: CEPL-1.0
//! Type-state graphics facade.
//!
//! The lifecycle is `new -> initialize -> configure -> create_context ->
//! (begin_frame)* -> destroy_context`. Each step consumes the previous state,
//! so out-of-order calls do not compile:
//!
//! ```compile_fail
//! # use prism_render::{BackendRegistry, Diagnostics, Graphics, Options};
//! let gfx = Graphics::new(BackendRegistry::new(), Diagnostics::new());
//! // No backend selected yet: there is nothing to configure.
//! let _ = gfx.configure(Options::default());
//! ```
//!
//! ```compile_fail
//! # use prism_render::{ClearValues, Configured, Graphics};
//! fn frame(mut gfx: Graphics<Configured>) {
//!     // No context yet.
//!     let _ = gfx.begin_frame(&ClearValues::none());
//! }
//! ```
//!
//! ```compile_fail
//! # use prism_render::{Graphics, Ready, WindowTarget};
//! fn again(gfx: Graphics<Ready>, window: &dyn WindowTarget) {
//!     // A live context must be destroyed before another can be created.
//!     let _ = gfx.create_context(window);
//! }
//! ```
use tracing::{debug, info};

use crate::{
    debug_output, Backend, BackendId, BackendRegistry, ClearValues, DebugLevel, Diagnostics,
    FrameStatus, GfxError, GfxResult, Options, RenderSize, WindowHints, WindowTarget,
};

pub struct Uninitialized {
    registry: BackendRegistry,
}

pub struct Initialized {
    backend: Box<dyn Backend>,
}

pub struct Configured {
    backend: Box<dyn Backend>,
    options: Options,
}

pub struct Ready {
    backend: Box<dyn Backend>,
    options: Options,
}

/// Explicit graphics state owned by the caller.
pub struct Graphics<S> {
    diagnostics: Diagnostics,
    state: S,
}

impl Graphics<Uninitialized> {
    pub fn new(registry: BackendRegistry, diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            state: Uninitialized { registry },
        }
    }

    pub fn available_backends(&self) -> Vec<BackendId> {
        self.state.registry.available()
    }

    /// See [`BackendRegistry::query`].
    pub fn query_backends(&self, out: Option<&mut Vec<BackendId>>) -> usize {
        self.state.registry.query(out)
    }

    /// Selects `id` and runs its init entry point. An id that was not
    /// compiled in is reported through the init-failure hook.
    pub fn initialize(self, id: BackendId) -> GfxResult<Graphics<Initialized>> {
        let Graphics { diagnostics, state } = self;

        let Some(mut backend) = state.registry.instantiate(id) else {
            let err = GfxError::BackendUnavailable(id);
            diagnostics.init_failure(&err.to_string());
            return Err(err);
        };

        if let Err(err) = backend.init(&diagnostics) {
            diagnostics.init_failure(&err.to_string());
            return Err(err);
        }

        debug_output!(diagnostics, DebugLevel::Info, "backend `{id}` initialised");
        Ok(Graphics {
            diagnostics,
            state: Initialized { backend },
        })
    }
}

impl Graphics<Initialized> {
    pub fn backend_id(&self) -> BackendId {
        self.state.backend.id()
    }

    pub fn default_options(&self) -> Options {
        Options::defaults_for(self.backend_id())
    }

    /// Stores `options` for the coming context. They are validated here and
    /// immutable afterwards.
    pub fn configure(self, options: Options) -> GfxResult<Graphics<Configured>> {
        options.validate()?;
        debug!(backend = %self.backend_id(), "options configured");
        Ok(Graphics {
            diagnostics: self.diagnostics,
            state: Configured {
                backend: self.state.backend,
                options,
            },
        })
    }
}

impl Graphics<Configured> {
    pub fn backend_id(&self) -> BackendId {
        self.state.backend.id()
    }

    pub fn options(&self) -> &Options {
        &self.state.options
    }

    pub fn window_hints(&self) -> WindowHints {
        self.state.backend.window_hints(&self.state.options)
    }

    /// Binds a context to `window`. On failure the backend has already
    /// released everything it created and one message went to the
    /// init-failure hook.
    pub fn create_context(self, window: &dyn WindowTarget) -> GfxResult<Graphics<Ready>> {
        let Graphics {
            diagnostics,
            state: Configured {
                mut backend,
                options,
            },
        } = self;

        if let Err(err) = backend.create_context(&options, window) {
            diagnostics.init_failure(&err.to_string());
            return Err(err);
        }

        info!(backend = %backend.id(), "graphics context ready");
        Ok(Graphics {
            diagnostics,
            state: Ready { backend, options },
        })
    }
}

impl Graphics<Ready> {
    pub fn backend_id(&self) -> BackendId {
        self.state.backend.id()
    }

    pub fn options(&self) -> &Options {
        &self.state.options
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn begin_frame(&mut self, clear: &ClearValues) -> GfxResult<FrameStatus> {
        self.state.backend.begin_frame(clear)
    }

    pub fn resize(&mut self, size: RenderSize) -> GfxResult<()> {
        self.state.backend.resize(size)
    }

    /// Tears the context down; the options stay configured so a new context
    /// can be created for another window.
    pub fn destroy_context(self) -> Graphics<Configured> {
        let Graphics {
            diagnostics,
            state: Ready {
                mut backend,
                options,
            },
        } = self;
        backend.destroy_context();
        debug!(backend = %backend.id(), "graphics context destroyed");
        Graphics {
            diagnostics,
            state: Configured { backend, options },
        }
    }
}
