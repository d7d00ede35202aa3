// SPDX-License-Identifier: CEPL-1.0
use bitflags::bitflags;

bitflags! {
    /// Which buffers `begin_frame` should clear.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct ClearFlags: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearValues {
    pub flags: ClearFlags,
    pub color: [f32; 4],
    pub depth: f32,
    pub stencil: u32,
}

impl Default for ClearValues {
    fn default() -> Self {
        Self::none()
    }
}

impl ClearValues {
    pub const fn none() -> Self {
        Self {
            flags: ClearFlags::empty(),
            color: [0.0, 0.0, 0.0, 1.0],
            depth: 1.0,
            stencil: 0,
        }
    }

    pub fn color(rgba: [f32; 4]) -> Self {
        Self {
            flags: ClearFlags::COLOR,
            color: rgba,
            ..Self::none()
        }
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.flags |= ClearFlags::DEPTH;
        self.depth = depth;
        self
    }

    pub fn with_stencil(mut self, stencil: u32) -> Self {
        self.flags |= ClearFlags::STENCIL;
        self.stencil = stencil;
        self
    }

    /// The clear colour, if colour clearing was requested.
    pub fn requested_color(&self) -> Option<[f32; 4]> {
        self.flags.contains(ClearFlags::COLOR).then_some(self.color)
    }
}
