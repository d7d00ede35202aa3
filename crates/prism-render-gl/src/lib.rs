// SPDX-License-Identifier: CEPL-1.0
//! OpenGL backend over glutin (EGL) and glow.
#![deny(unsafe_op_in_unsafe_fn)]
use prism_render::{
    Backend, BackendId, ClearValues, ClientApi, Diagnostics, FrameStatus, GfxError, GfxResult,
    Options, RenderSize, WindowHints, WindowTarget,
};
use tracing::info;

mod context;

use context::{GlContext, GlRequest};

#[derive(Default)]
pub struct GlBackend {
    diagnostics: Diagnostics,
    context: Option<GlContext>,
}

impl GlBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    fn context_mut(&mut self) -> &mut GlContext {
        match self.context.as_mut() {
            Some(context) => context,
            None => panic!("gl backend used without a context"),
        }
    }
}

impl Backend for GlBackend {
    fn id(&self) -> BackendId {
        BackendId::OpenGl
    }

    fn init(&mut self, diagnostics: &Diagnostics) -> GfxResult<()> {
        self.diagnostics = diagnostics.clone();
        Ok(())
    }

    fn window_hints(&self, options: &Options) -> WindowHints {
        WindowHints::from_options(
            options,
            ClientApi::OpenGl {
                major: options.gl.version_major,
                minor: options.gl.version_minor,
                debug: options.gl.debug_context,
            },
        )
    }

    fn create_context(&mut self, options: &Options, window: &dyn WindowTarget) -> GfxResult<()> {
        assert!(
            self.context.is_none(),
            "gl context already created; destroy it first"
        );
        let display = window.display_handle()?.as_raw();
        let handle = window.window_handle()?.as_raw();
        let request = GlRequest {
            major: options.gl.version_major,
            minor: options.gl.version_minor,
            debug: options.gl.debug_context,
            hints: self.window_hints(options),
        };
        let context = GlContext::create(
            display,
            handle,
            window.framebuffer_size(),
            &request,
            &self.diagnostics,
        )
        .map_err(GfxError::backend)?;
        self.context = Some(context);
        Ok(())
    }

    fn destroy_context(&mut self) {
        if self.context.take().is_some() {
            info!("OpenGL context destroyed");
        }
    }

    fn begin_frame(&mut self, clear: &ClearValues) -> GfxResult<FrameStatus> {
        let drawn = self
            .context_mut()
            .draw(clear)
            .map_err(GfxError::backend)?;
        Ok(if drawn {
            FrameStatus::Presented {
                image_index: 0,
                suboptimal: false,
            }
        } else {
            FrameStatus::Skipped
        })
    }

    fn resize(&mut self, size: RenderSize) -> GfxResult<()> {
        self.context_mut().resize(size);
        Ok(())
    }
}
