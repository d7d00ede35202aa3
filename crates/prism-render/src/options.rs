// SPDX-License-Identifier: CEPL-1.0
use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{BackendId, ChannelBits, GfxError, GfxResult};

/// Colour buffer depth. Only the two layouts the backends know how to
/// request are representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BitDepth {
    /// RGB 8:8:8, no alpha.
    Bits24,
    /// RGBA 8:8:8:8.
    #[default]
    Bits32,
}

impl BitDepth {
    pub fn channels(self) -> ChannelBits {
        match self {
            BitDepth::Bits24 => ChannelBits { red: 8, green: 8, blue: 8, alpha: 0 },
            BitDepth::Bits32 => ChannelBits { red: 8, green: 8, blue: 8, alpha: 8 },
        }
    }
}

impl TryFrom<u8> for BitDepth {
    type Error = String;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            24 => Ok(BitDepth::Bits24),
            32 => Ok(BitDepth::Bits32),
            other => Err(format!("bit_depth must be 24 or 32, got {other}")),
        }
    }
}

impl From<BitDepth> for u8 {
    fn from(depth: BitDepth) -> u8 {
        match depth {
            BitDepth::Bits24 => 24,
            BitDepth::Bits32 => 32,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulkanOptions {
    pub api_version_major: u32,
    pub api_version_minor: u32,
    /// Enables the Khronos validation layer and a debug messenger.
    pub debug_context: bool,
    pub application_name: String,
    pub application_version: u32,
    pub engine_name: String,
    pub engine_version: u32,
    /// Size of the semaphore/fence ring.
    pub frames_in_flight: usize,
    /// Upper bound for every CPU wait on the GPU. `None` waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_timeout_ms: Option<u64>,
    /// Accept a non-BGRA8/sRGB surface format instead of failing.
    pub surface_format_fallback: bool,
}

impl Default for VulkanOptions {
    fn default() -> Self {
        Self {
            api_version_major: 1,
            api_version_minor: 0,
            debug_context: false,
            application_name: "prism".to_owned(),
            application_version: 1,
            engine_name: "prism".to_owned(),
            engine_version: 1,
            frames_in_flight: 2,
            frame_timeout_ms: None,
            surface_format_fallback: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlOptions {
    pub version_major: u8,
    pub version_minor: u8,
    pub debug_context: bool,
}

impl Default for GlOptions {
    fn default() -> Self {
        Self {
            version_major: 3,
            version_minor: 3,
            debug_context: false,
        }
    }
}

/// Context configuration. Copied into the facade by `configure` and never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub double_buffered: bool,
    pub bit_depth: BitDepth,
    pub depth_bits: u8,
    pub stencil_bits: u8,
    pub antialiasing_samples: u8,
    pub vulkan: VulkanOptions,
    pub gl: GlOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            double_buffered: true,
            bit_depth: BitDepth::Bits32,
            depth_bits: 24,
            stencil_bits: 8,
            antialiasing_samples: 4,
            vulkan: VulkanOptions::default(),
            gl: GlOptions::default(),
        }
    }
}

impl Options {
    /// Defaults tuned for `backend`: debug builds ask the selected backend
    /// for a debug/validation context.
    pub fn defaults_for(backend: BackendId) -> Self {
        let mut options = Self::default();
        match backend {
            BackendId::Vulkan => options.vulkan.debug_context = cfg!(debug_assertions),
            BackendId::OpenGl => options.gl.debug_context = cfg!(debug_assertions),
            BackendId::Direct3D12 | BackendId::Metal => {}
        }
        options
    }

    pub fn from_toml_str(src: &str) -> GfxResult<Self> {
        Ok(toml::from_str(src)?)
    }

    pub fn load(path: impl AsRef<Path>) -> GfxResult<Self> {
        let src = fs::read_to_string(path)?;
        Self::from_toml_str(&src)
    }

    pub fn validate(&self) -> GfxResult<()> {
        let invalid = |msg: String| Err(GfxError::InvalidOptions(msg));

        if !matches!(self.antialiasing_samples, 0 | 1 | 2 | 4 | 8 | 16 | 32 | 64) {
            return invalid(format!(
                "antialiasing_samples must be 0 or a power of two up to 64, got {}",
                self.antialiasing_samples
            ));
        }
        if self.depth_bits > 32 {
            return invalid(format!("depth_bits must be <= 32, got {}", self.depth_bits));
        }
        if self.stencil_bits > 8 {
            return invalid(format!("stencil_bits must be <= 8, got {}", self.stencil_bits));
        }
        if self.vulkan.api_version_major != 1 {
            return invalid(format!(
                "vulkan.api_version_major must be 1, got {}",
                self.vulkan.api_version_major
            ));
        }
        if self.vulkan.frames_in_flight == 0 {
            return invalid("vulkan.frames_in_flight must be at least 1".to_owned());
        }
        if self.gl.version_major < 2 {
            return invalid(format!(
                "gl.version_major must be >= 2, got {}",
                self.gl.version_major
            ));
        }
        Ok(())
    }
}
