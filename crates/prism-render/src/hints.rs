// SPDX-License-Identifier: CEPL-1.0
use crate::Options;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelBits {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

/// Which client API the window system should attach to the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientApi {
    /// Explicit APIs bring their own surface; no GL context on the window.
    None,
    OpenGl { major: u8, minor: u8, debug: bool },
}

/// Window-creation hints derived from [`Options`] for one backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowHints {
    pub client_api: ClientApi,
    pub color: ChannelBits,
    pub depth_bits: u8,
    pub stencil_bits: u8,
    pub samples: u8,
    pub double_buffered: bool,
}

impl WindowHints {
    pub fn from_options(options: &Options, client_api: ClientApi) -> Self {
        Self {
            client_api,
            color: options.bit_depth.channels(),
            depth_bits: options.depth_bits,
            stencil_bits: options.stencil_bits,
            samples: options.antialiasing_samples,
            double_buffered: options.double_buffered,
        }
    }
}
