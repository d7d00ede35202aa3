// SPDX-License-Identifier: CEPL-1.0
use std::io::Cursor;

use ash::util::read_spv;
use bytemuck::{Pod, Zeroable};

use crate::VkError;

const VERT_SPV: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/tri.vert.spv"));
const FRAG_SPV: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/tri.frag.spv"));

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub pos: [f32; 2],
}

// Clockwise in framebuffer space (y points down), matching the pipeline's
// front face.
pub(crate) const TRIANGLE: [Vertex; 3] = [
    Vertex { pos: [0.0, -0.5] },
    Vertex { pos: [0.5, 0.5] },
    Vertex { pos: [-0.5, 0.5] },
];

pub(crate) struct ShaderCode {
    pub vertex: Vec<u32>,
    pub fragment: Vec<u32>,
}

impl ShaderCode {
    pub fn load() -> Result<Self, VkError> {
        Ok(Self {
            vertex: read_spv(&mut Cursor::new(VERT_SPV))?,
            fragment: read_spv(&mut Cursor::new(FRAG_SPV))?,
        })
    }
}
