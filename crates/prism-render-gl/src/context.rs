// SPDX-License-Identifier: CEPL-1.0
use std::num::NonZeroU32;

use anyhow::{anyhow, Context as _, Result};
use glow::HasContext as _;
use glutin::{
    config::{ColorBufferType, Config, ConfigTemplateBuilder},
    context::{
        ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentContext,
        PossiblyCurrentContext, Version,
    },
    display::{Display, DisplayApiPreference},
    prelude::*,
    surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface},
};
use prism_render::{
    ClearFlags, ClearValues, DebugLevel, DebugRecord, Diagnostics, RenderSize, WindowHints,
};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use tracing::{debug, info, warn};

pub(crate) fn non_zero(v: u32) -> NonZeroU32 {
    NonZeroU32::new(v).unwrap_or(NonZeroU32::MIN)
}

/// GLSL header for the triangle program, or `None` when the context is too
/// old for `gl_VertexID` and vertex arrays.
pub(crate) fn glsl_header(major: u8, minor: u8) -> Option<&'static str> {
    match (major, minor) {
        (0..=2, _) => None,
        (3, 0..=2) => Some("#version 130\n"),
        _ => Some("#version 330 core\n"),
    }
}

/// Bitmask for `glClear` from the requested flags.
pub(crate) fn clear_mask(clear: &ClearValues) -> u32 {
    let mut mask = 0;
    if clear.flags.contains(ClearFlags::COLOR) {
        mask |= glow::COLOR_BUFFER_BIT;
    }
    if clear.flags.contains(ClearFlags::DEPTH) {
        mask |= glow::DEPTH_BUFFER_BIT;
    }
    if clear.flags.contains(ClearFlags::STENCIL) {
        mask |= glow::STENCIL_BUFFER_BIT;
    }
    mask
}

pub(crate) fn debug_level(severity: u32) -> DebugLevel {
    match severity {
        glow::DEBUG_SEVERITY_HIGH => DebugLevel::Error,
        glow::DEBUG_SEVERITY_MEDIUM => DebugLevel::Warn,
        glow::DEBUG_SEVERITY_LOW => DebugLevel::Info,
        _ => DebugLevel::Trace,
    }
}

const VERT_BODY: &str = r#"
out vec3 vColor;
void main() {
  vec2 pos[3] = vec2[3](
    vec2( 0.0,  0.5),
    vec2(-0.5, -0.5),
    vec2( 0.5, -0.5)
  );
  vec3 col[3] = vec3[3](
    vec3(1,0,0),
    vec3(0,1,0),
    vec3(0,0,1)
  );
  gl_Position = vec4(pos[gl_VertexID], 0.0, 1.0);
  vColor = col[gl_VertexID];
}"#;

const FRAG_BODY: &str = r#"
in vec3 vColor;
out vec4 outColor;
void main(){ outColor = vec4(vColor, 1.0); }"#;

fn compile_program(gl: &glow::Context, header: &str) -> Result<glow::Program> {
    unsafe {
        let vs = gl
            .create_shader(glow::VERTEX_SHADER)
            .map_err(anyhow::Error::msg)?;
        let fs = gl
            .create_shader(glow::FRAGMENT_SHADER)
            .map_err(anyhow::Error::msg)?;
        let delete_shaders = || {
            gl.delete_shader(vs);
            gl.delete_shader(fs);
        };

        gl.shader_source(vs, &format!("{header}{VERT_BODY}"));
        gl.compile_shader(vs);
        if !gl.get_shader_compile_status(vs) {
            let log = gl.get_shader_info_log(vs);
            delete_shaders();
            return Err(anyhow!("GL vert compile: {log}"));
        }

        gl.shader_source(fs, &format!("{header}{FRAG_BODY}"));
        gl.compile_shader(fs);
        if !gl.get_shader_compile_status(fs) {
            let log = gl.get_shader_info_log(fs);
            delete_shaders();
            return Err(anyhow!("GL frag compile: {log}"));
        }

        let program = match gl.create_program() {
            Ok(program) => program,
            Err(e) => {
                delete_shaders();
                return Err(anyhow::Error::msg(e));
            }
        };
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.link_program(program);
        gl.detach_shader(program, vs);
        gl.detach_shader(program, fs);
        delete_shaders();

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(anyhow!("GL link: {log}"));
        }
        Ok(program)
    }
}

/// What `GlContext::create` needs besides the native handles.
pub(crate) struct GlRequest {
    pub major: u8,
    pub minor: u8,
    pub debug: bool,
    pub hints: WindowHints,
}

fn choose_config(
    display: &Display,
    window: RawWindowHandle,
    hints: &WindowHints,
) -> Result<Config> {
    let mut template = ConfigTemplateBuilder::new()
        .compatible_with_native_window(window)
        .with_buffer_type(ColorBufferType::Rgb {
            r_size: hints.color.red,
            g_size: hints.color.green,
            b_size: hints.color.blue,
        })
        .with_alpha_size(hints.color.alpha)
        .with_depth_size(hints.depth_bits)
        .with_stencil_size(hints.stencil_bits)
        .with_single_buffering(!hints.double_buffered);
    if hints.samples > 1 {
        template = template.with_multisampling(hints.samples);
    }

    let configs = unsafe { display.find_configs(template.build()) }.context("find_configs")?;
    // Most samples wins; ties keep the driver's preferred order.
    configs
        .reduce(|best, c| {
            if c.num_samples() > best.num_samples() {
                c
            } else {
                best
            }
        })
        .ok_or_else(|| anyhow!("no GL config matches the requested window hints"))
}

fn install_debug_output(gl: &mut glow::Context, diagnostics: &Diagnostics) {
    if !gl.supports_debug() {
        warn!("gl: debug context requested but KHR_debug is unavailable");
        return;
    }
    let diagnostics = diagnostics.clone();
    unsafe {
        gl.enable(glow::DEBUG_OUTPUT);
        gl.enable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
        gl.debug_message_callback(move |_source, _kind, _id, severity, message: &str| {
            diagnostics.debug_output(&DebugRecord {
                file: file!(),
                line: line!(),
                function: "glDebugMessageCallback",
                level: debug_level(severity),
                message,
            });
        });
    }
    debug!("gl: debug output routed to diagnostics");
}

/// A current GL context bound to one window surface, plus the triangle
/// program.
pub(crate) struct GlContext {
    gl: glow::Context,
    program: glow::Program,
    vao: glow::VertexArray,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    size: RenderSize,
}

impl GlContext {
    pub fn create(
        display_handle: RawDisplayHandle,
        window_handle: RawWindowHandle,
        size: RenderSize,
        request: &GlRequest,
        diagnostics: &Diagnostics,
    ) -> Result<Self> {
        let header = glsl_header(request.major, request.minor).ok_or_else(|| {
            anyhow!(
                "GL {}.{} cannot run the triangle program; 3.0 or newer is required",
                request.major,
                request.minor
            )
        })?;

        let display = unsafe { Display::new(display_handle, DisplayApiPreference::Egl) }
            .context("Display::new")?;
        let config = choose_config(&display, window_handle, &request.hints)?;

        let sattrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            window_handle,
            non_zero(size.width),
            non_zero(size.height),
        );
        let surface = unsafe { display.create_window_surface(&config, &sattrs) }
            .context("create_window_surface")?;

        let profile = if (request.major, request.minor) >= (3, 2) {
            GlProfile::Core
        } else {
            GlProfile::Compatibility
        };
        let ctx_attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(
                request.major,
                request.minor,
            ))))
            .with_profile(profile)
            .with_debug(request.debug)
            .build(Some(window_handle));
        let not_current: NotCurrentContext =
            unsafe { display.create_context(&config, &ctx_attrs) }.context("create_context")?;
        let context = not_current.make_current(&surface).context("make_current")?;

        let mut gl =
            unsafe { glow::Context::from_loader_function_cstr(|s| display.get_proc_address(s)) };
        if request.debug {
            install_debug_output(&mut gl, diagnostics);
        }

        let interval = if request.hints.double_buffered {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = surface.set_swap_interval(&context, interval) {
            warn!("gl: set_swap_interval failed: {e}");
        }

        let program = compile_program(&gl, header)?;
        let vao = match unsafe { gl.create_vertex_array() } {
            Ok(vao) => vao,
            Err(e) => {
                unsafe { gl.delete_program(program) };
                return Err(anyhow::Error::msg(e));
            }
        };

        unsafe {
            gl.enable(glow::FRAMEBUFFER_SRGB);
            gl.enable(glow::CULL_FACE);
            gl.front_face(glow::CCW);
            gl.cull_face(glow::BACK);
            gl.disable(glow::DEPTH_TEST);
            if request.hints.samples > 1 {
                gl.enable(glow::MULTISAMPLE);
            }
        }

        let version = gl.version();
        info!(
            "OpenGL context ready (GL {}.{}, {} samples, {}x{})",
            version.major,
            version.minor,
            config.num_samples(),
            size.width,
            size.height
        );
        let (renderer, vendor) = unsafe {
            (
                gl.get_parameter_string(glow::RENDERER),
                gl.get_parameter_string(glow::VENDOR),
            )
        };
        diagnostics.debug_print(format_args!("gl renderer {renderer} ({vendor})"));

        Ok(Self {
            gl,
            program,
            vao,
            surface,
            context,
            size,
        })
    }

    pub fn resize(&mut self, size: RenderSize) {
        self.size = size;
        if size.is_empty() {
            debug!("gl: surface is zero-sized, rendering paused");
            return;
        }
        self.surface
            .resize(&self.context, non_zero(size.width), non_zero(size.height));
    }

    /// Clears what `clear` asks for, draws the triangle and swaps. Returns
    /// `false` when the surface is zero-sized and nothing was drawn.
    pub fn draw(&mut self, clear: &ClearValues) -> Result<bool> {
        if self.size.is_empty() {
            return Ok(false);
        }

        let gl = &self.gl;
        let mask = clear_mask(clear);
        unsafe {
            gl.viewport(0, 0, self.size.width as i32, self.size.height as i32);
            if clear.flags.contains(ClearFlags::COLOR) {
                let [r, g, b, a] = clear.color;
                gl.clear_color(r, g, b, a);
            }
            if clear.flags.contains(ClearFlags::DEPTH) {
                gl.clear_depth_f32(clear.depth);
            }
            if clear.flags.contains(ClearFlags::STENCIL) {
                gl.clear_stencil(clear.stencil as i32);
            }
            if mask != 0 {
                gl.clear(mask);
            }

            gl.use_program(Some(self.program));
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_arrays(glow::TRIANGLES, 0, 3);
            gl.bind_vertex_array(None);
            gl.use_program(None);
        }

        self.surface
            .swap_buffers(&self.context)
            .context("swap_buffers")?;
        Ok(true)
    }
}

impl Drop for GlContext {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_vertex_array(self.vao);
            self.gl.delete_program(self.program);
        }
    }
}
