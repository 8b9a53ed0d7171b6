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

use super::pool::PooledBuffer;
use std::collections::BTreeMap;
use std::rc::Rc;
use tessera_core::batch::DrawBatch;
use tessera_core::renderer::api::{BufferId, DrawCommand, IndexFormat, VertexArrayId};

/// How the GPU resources of a [`BuiltBuffer`] are owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    /// Borrowed from the context for one frame; give back with `release`.
    Transient,
    /// Owned by the buffer until `destroy_persistent`.
    Persistent,
}

/// A GPU buffer referenced by a [`BuiltBuffer`].
#[derive(Debug)]
pub enum GpuBuffer {
    /// Checked out of the context's buffer pool.
    Pooled(PooledBuffer),
    /// Created for, and destroyed with, this buffer.
    Owned(BufferId),
    /// Owned by the context and shared with other buffers.
    Shared(BufferId),
}

impl GpuBuffer {
    /// The underlying buffer handle.
    pub fn id(&self) -> BufferId {
        match self {
            GpuBuffer::Pooled(buffer) => buffer.id(),
            GpuBuffer::Owned(id) | GpuBuffer::Shared(id) => *id,
        }
    }

    /// Returns `true` for buffers this [`BuiltBuffer`] alone owns.
    pub fn is_owned(&self) -> bool {
        matches!(self, GpuBuffer::Owned(_))
    }
}

/// The index buffer bound to a built vertex array.
#[derive(Debug)]
pub struct IndexBinding {
    /// The buffer holding the indices.
    pub buffer: GpuBuffer,
    /// The width of each index.
    pub format: IndexFormat,
}

/// Uploaded, render-ready data for one batch.
#[derive(Debug)]
pub struct BuiltBuffer {
    pub(crate) batch: Rc<DrawBatch>,
    pub(crate) residency: Residency,
    pub(crate) vertex_array: VertexArrayId,
    pub(crate) vertex_buffer: GpuBuffer,
    pub(crate) index: Option<IndexBinding>,
    pub(crate) instance_buffer: Option<GpuBuffer>,
    pub(crate) shader_data: BTreeMap<String, GpuBuffer>,
    pub(crate) command_buffer: Option<GpuBuffer>,
    pub(crate) draw_commands: Vec<DrawCommand>,
}

impl BuiltBuffer {
    /// The batch this buffer draws.
    pub fn batch(&self) -> &Rc<DrawBatch> {
        &self.batch
    }

    /// Whether the buffer is transient or persistent.
    pub fn residency(&self) -> Residency {
        self.residency
    }

    /// The vertex array holding every binding.
    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    /// The buffer bound at vertex slot 0.
    pub fn vertex_buffer(&self) -> &GpuBuffer {
        &self.vertex_buffer
    }

    /// The index binding, for indexed draws.
    pub fn index(&self) -> Option<&IndexBinding> {
        self.index.as_ref()
    }

    /// The buffer bound at vertex slot 1, for instanced batches.
    pub fn instance_buffer(&self) -> Option<&GpuBuffer> {
        self.instance_buffer.as_ref()
    }

    /// The shader storage buffers by block name.
    pub fn shader_data(&self) -> &BTreeMap<String, GpuBuffer> {
        &self.shader_data
    }

    /// The indirect command buffer. Present only when there is more than
    /// one draw command.
    pub fn command_buffer(&self) -> Option<&GpuBuffer> {
        self.command_buffer.as_ref()
    }

    /// The draw commands, in submission order.
    pub fn draw_commands(&self) -> &[DrawCommand] {
        &self.draw_commands
    }

    /// Returns `true` if there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.draw_commands.is_empty()
    }
}
