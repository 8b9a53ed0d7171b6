// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shared index data for quad batches.

use tessera_core::renderer::api::{BufferDescriptor, BufferId, BufferUsage, IndexFormat};
use tessera_core::renderer::{GraphicsDevice, ResourceError};

/// Vertices per quad.
pub const QUAD_VERTEX_COUNT: u32 = 4;
/// Indices per triangulated quad.
pub const QUAD_INDEX_COUNT: u32 = 6;

const QUAD_PATTERN: [u32; QUAD_INDEX_COUNT as usize] = [0, 1, 2, 2, 3, 0];

/// Index data of a prepared buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexByteBuffer {
    /// Indices owned by this buffer alone.
    Owned {
        /// The element type of `bytes`.
        format: IndexFormat,
        /// The packed indices.
        bytes: Vec<u8>,
    },
    /// The first `quad_count` quads of the context's shared quad indices.
    SharedQuads {
        /// The number of quads drawn.
        quad_count: u32,
    },
}

impl IndexByteBuffer {
    /// The element type of the indices.
    pub fn format(&self) -> IndexFormat {
        match self {
            IndexByteBuffer::Owned { format, .. } => *format,
            IndexByteBuffer::SharedQuads { .. } => IndexFormat::Uint32,
        }
    }

    /// Returns `true` if the indices alias the shared quad cache.
    pub fn is_shared(&self) -> bool {
        matches!(self, IndexByteBuffer::SharedQuads { .. })
    }
}

/// A grow-only cache of triangulated quad indices shared by every
/// non-optimized quad batch of a context.
///
/// The CPU copy grows during preparation; the GPU buffer is created or
/// refreshed lazily the next time an upload needs it.
#[derive(Debug, Default)]
pub struct QuadIndexCache {
    shared: Vec<u8>,
    quad_capacity: u32,
    gpu_buffer: Option<BufferId>,
    gpu_quad_capacity: u32,
}

impl QuadIndexCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns freshly generated indices for `quad_count` quads.
    pub fn create_index_data(quad_count: u32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((quad_count * QUAD_INDEX_COUNT) as usize * 4);
        append_quads(&mut bytes, 0, quad_count);
        bytes
    }

    /// Grows the shared indices to cover at least `quad_count` quads.
    pub fn ensure_size(&mut self, quad_count: u32) {
        if quad_count <= self.quad_capacity {
            return;
        }
        append_quads(&mut self.shared, self.quad_capacity, quad_count);
        log::debug!(
            "QuadIndexCache: grew shared indices from {} to {} quads",
            self.quad_capacity,
            quad_count
        );
        self.quad_capacity = quad_count;
    }

    /// The number of quads the shared indices cover.
    pub fn quad_capacity(&self) -> u32 {
        self.quad_capacity
    }

    /// The shared indices as packed `u32`s.
    pub fn shared_data(&self) -> &[u8] {
        &self.shared
    }

    /// The shared GPU buffer, if it has been created.
    pub fn current_gpu_buffer(&self) -> Option<BufferId> {
        self.gpu_buffer
    }

    /// Returns the shared GPU buffer, creating it or refreshing its
    /// contents if the CPU copy has grown since the last upload.
    ///
    /// The buffer keeps its id across refreshes, so bindings made earlier
    /// stay valid.
    pub fn gpu_buffer(&mut self, device: &dyn GraphicsDevice) -> Result<BufferId, ResourceError> {
        match self.gpu_buffer {
            Some(id) if self.gpu_quad_capacity == self.quad_capacity => Ok(id),
            Some(id) => {
                device.resize_buffer(id, self.shared.len() as u64)?;
                device.write_buffer(id, 0, &self.shared)?;
                self.gpu_quad_capacity = self.quad_capacity;
                log::debug!(
                    "QuadIndexCache: refreshed {:?} to {} quads",
                    id,
                    self.quad_capacity
                );
                Ok(id)
            }
            None => {
                let descriptor = BufferDescriptor::dynamic(
                    "Shared Quad Indices",
                    self.shared.len() as u64,
                    BufferUsage::INDEX,
                );
                let id = device.create_buffer_with_data(&descriptor, &self.shared)?;
                self.gpu_buffer = Some(id);
                self.gpu_quad_capacity = self.quad_capacity;
                Ok(id)
            }
        }
    }

    /// Destroys the shared GPU buffer. The CPU copy is kept, so the next
    /// upload recreates it.
    pub fn destroy(&mut self, device: &dyn GraphicsDevice) {
        if let Some(id) = self.gpu_buffer.take() {
            if let Err(e) = device.destroy_buffer(id) {
                log::warn!("QuadIndexCache: failed to destroy {id:?}: {e}");
            }
        }
        self.gpu_quad_capacity = 0;
    }
}

fn append_quads(bytes: &mut Vec<u8>, from: u32, to: u32) {
    for quad in from..to {
        let base = quad * QUAD_VERTEX_COUNT;
        for offset in QUAD_PATTERN {
            bytes.extend_from_slice(&(base + offset).to_ne_bytes());
        }
    }
}
