// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use prism_core::init_tracing;
use prism_gfx::{
    BackendId, ClearValues, Diagnostics, FrameStatus, GfxError, GfxResult, Graphics, Ready,
    RenderSize, SizedWindow,
};
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

mod config;

use config::AppCfg;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Graphics backend: vk | gl
    #[arg(long, default_value = "vk")]
    backend: BackendId,

    /// Configuration file
    #[arg(long, default_value = "prism.toml")]
    config: PathBuf,
}

/// Backends to try, in order: the requested one, then every other compiled
/// backend.
fn attempt_order(requested: BackendId, available: &[BackendId]) -> Vec<BackendId> {
    let mut order = vec![requested];
    order.extend(available.iter().copied().filter(|id| *id != requested));
    order
}

fn start(id: BackendId, cfg: &AppCfg, window: &Window) -> GfxResult<Graphics<Ready>> {
    let gfx = prism_gfx::graphics(Diagnostics::new()).initialize(id)?;
    let options = cfg
        .options_for(id)
        .map_err(|e| GfxError::InvalidOptions(format!("{e:#}")))?;
    info!(
        backend = %id,
        vulkan_validation = options.vulkan.debug_context,
        gl_debug = options.gl.debug_context,
        samples = options.antialiasing_samples,
        "creating context"
    );
    let gfx = gfx.configure(options)?;

    let size = window.inner_size();
    let target = SizedWindow::new(window, RenderSize::new(size.width, size.height));
    gfx.create_context(&target)
}

// Field order matters: the graphics context drops before the window.
struct App {
    gfx: Option<Graphics<Ready>>,
    window: Option<Window>,

    requested: BackendId,
    cfg: AppCfg,
    exiting: bool,
    frames: u32,
    last_fps_instant: Instant,
}

impl App {
    fn new(requested: BackendId, cfg: AppCfg) -> Self {
        Self {
            gfx: None,
            window: None,
            requested,
            cfg,
            exiting: false,
            frames: 0,
            last_fps_instant: Instant::now(),
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.exiting = true;
        self.gfx = None;
        self.window = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(Window::default_attributes().with_title("prism"))
        {
            Ok(window) => window,
            Err(e) => {
                error!("create_window failed: {e}");
                self.shutdown(event_loop);
                return;
            }
        };

        let order = attempt_order(self.requested, &prism_gfx::available_backends());
        let mut gfx = None;
        for id in order {
            match start(id, &self.cfg, &window) {
                Ok(ready) => {
                    gfx = Some(ready);
                    break;
                }
                Err(GfxError::BackendUnavailable(_)) => {}
                Err(e) => warn!("{id} init failed: {e}"),
            }
        }
        let Some(gfx) = gfx else {
            error!("no graphics backend could be started");
            self.shutdown(event_loop);
            return;
        };

        info!("backend = {}", gfx.backend_id());
        event_loop.set_control_flow(ControlFlow::Poll);
        window.request_redraw();
        self.gfx = Some(gfx);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(window) = &self.window {
            if window_id != window.id() {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("CloseRequested");
                self.shutdown(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                let size = RenderSize::new(new_size.width, new_size.height);
                info!("Resized → {}x{}", size.width, size.height);
                if let Some(gfx) = &mut self.gfx {
                    if let Err(e) = gfx.resize(size) {
                        error!("resize error: {e}");
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if self.exiting {
                    return;
                }
                let Some(gfx) = &mut self.gfx else {
                    return;
                };
                match gfx.begin_frame(&ClearValues::color(self.cfg.clear_color)) {
                    Ok(FrameStatus::Presented { .. }) => {
                        self.frames = self.frames.saturating_add(1);
                    }
                    Ok(FrameStatus::Skipped) => {}
                    Err(GfxError::TimedOut) => warn!("frame timed out waiting for the GPU"),
                    Err(e) => error!("render error: {e}"),
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.exiting {
            return;
        }
        if let Some(w) = &self.window {
            w.request_redraw();
        }

        let now = Instant::now();
        if now.duration_since(self.last_fps_instant).as_secs_f32() >= 1.0 {
            info!("fps ~ {}", self.frames);
            self.frames = 0;
            self.last_fps_instant = now;
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let cfg = AppCfg::load(&args.config)?;
    info!(
        "prism starting (requested {}, compiled {:?})",
        args.backend,
        prism_gfx::available_backends()
    );

    let event_loop: EventLoop<()> = EventLoop::new()?;
    let mut app = App::new(args.backend, cfg);
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_backend_goes_first() {
        let available = [BackendId::Vulkan, BackendId::OpenGl];
        assert_eq!(
            attempt_order(BackendId::Vulkan, &available),
            vec![BackendId::Vulkan, BackendId::OpenGl]
        );
        assert_eq!(
            attempt_order(BackendId::OpenGl, &available),
            vec![BackendId::OpenGl, BackendId::Vulkan]
        );
    }

    #[test]
    fn uncompiled_request_still_falls_back() {
        assert_eq!(
            attempt_order(BackendId::Metal, &[BackendId::OpenGl]),
            vec![BackendId::Metal, BackendId::OpenGl]
        );
    }

    #[test]
    fn cli_parses_backend_aliases() {
        let args = Args::try_parse_from(["prism", "--backend", "gl"]).unwrap();
        assert_eq!(args.backend, BackendId::OpenGl);
        assert_eq!(args.config, PathBuf::from("prism.toml"));

        let args = Args::try_parse_from(["prism", "--backend", "vulkan", "--config", "x.toml"])
            .unwrap();
        assert_eq!(args.backend, BackendId::Vulkan);
        assert_eq!(args.config, PathBuf::from("x.toml"));

        assert!(Args::try_parse_from(["prism", "--backend", "glide"]).is_err());
    }
}
