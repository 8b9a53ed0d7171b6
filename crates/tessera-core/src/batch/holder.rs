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

//! Per-stream staging holders.

use super::builder::BufferBuilder;
use crate::renderer::api::IndexFormat;
use std::collections::BTreeMap;

/// Stages packed vertices (or instances) and counts them.
#[derive(Debug, Clone, Default)]
pub struct VertexDataHolder {
    builder: BufferBuilder,
    vertex_count: u32,
    connected_primitives: Option<Vec<u32>>,
}

/// The finished contents of a [`VertexDataHolder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedVertices {
    /// The packed vertex bytes.
    pub bytes: Vec<u8>,
    /// The number of completed vertices.
    pub vertex_count: u32,
    /// Run boundaries, closed by the final vertex count, if connected
    /// primitives were recorded.
    pub connected_primitives: Option<Vec<u32>>,
}

impl VertexDataHolder {
    /// Creates an empty holder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The builder receiving attribute bytes for the current vertex.
    pub fn builder(&mut self) -> &mut BufferBuilder {
        &mut self.builder
    }

    /// Marks the current vertex as complete.
    pub fn end_vertex(&mut self) {
        self.vertex_count += 1;
    }

    /// Appends one complete vertex in a single call.
    pub fn put_vertex(&mut self, bytes: &[u8]) {
        self.builder.put_bytes(bytes);
        self.end_vertex();
    }

    /// The number of completed vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Starts a new connected run (strip, loop or fan) at the current vertex.
    pub fn begin_connected_primitive(&mut self) {
        let current = self.vertex_count;
        let starts = self.connected_primitives.get_or_insert_with(Vec::new);
        if starts.last() != Some(&current) {
            starts.push(current);
        }
    }

    /// Replaces the recorded run boundaries. The list must already include
    /// the closing boundary.
    pub fn set_connected_primitive_boundaries(&mut self, boundaries: Option<Vec<u32>>) {
        self.connected_primitives = boundaries;
    }

    /// Returns `true` if any connected run was recorded.
    pub fn has_connected_primitives(&self) -> bool {
        self.connected_primitives.is_some()
    }

    /// Consumes the holder. When runs were recorded through
    /// [`begin_connected_primitive`](Self::begin_connected_primitive), the
    /// current vertex count is appended as the closing boundary.
    pub fn finish(self) -> StagedVertices {
        let vertex_count = self.vertex_count;
        let connected_primitives = self.connected_primitives.map(|mut boundaries| {
            if boundaries.last().is_some_and(|&last| last < vertex_count) {
                boundaries.push(vertex_count);
            }
            boundaries
        });
        StagedVertices {
            bytes: self.builder.finish(),
            vertex_count,
            connected_primitives,
        }
    }
}

/// Stages indices of a given element type.
#[derive(Debug, Clone, Default)]
pub struct IndexDataHolder {
    builder: BufferBuilder,
    index_count: u32,
    format: IndexFormat,
}

/// The finished contents of an [`IndexDataHolder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedIndices {
    /// The packed index bytes.
    pub bytes: Vec<u8>,
    /// The number of indices.
    pub index_count: u32,
    /// The element type of `bytes`.
    pub format: IndexFormat,
}

impl IndexDataHolder {
    /// Creates an empty holder of 32-bit indices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty holder of the given element type.
    pub fn with_format(format: IndexFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// The element type of the staged indices.
    pub fn format(&self) -> IndexFormat {
        self.format
    }

    /// Appends one index, truncated to the holder's element type.
    pub fn put_index(&mut self, index: u32) {
        match self.format {
            IndexFormat::Uint16 => self.builder.put_u16(index as u16),
            IndexFormat::Uint32 => self.builder.put_u32(index),
        };
        self.index_count += 1;
    }

    /// Appends the three indices of a triangle.
    pub fn put_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.put_index(a);
        self.put_index(b);
        self.put_index(c);
    }

    /// Raw access for callers packing indices themselves; pair with
    /// [`add_index_count`](Self::add_index_count).
    pub fn builder(&mut self) -> &mut BufferBuilder {
        &mut self.builder
    }

    /// Accounts for `count` indices written through [`builder`](Self::builder).
    pub fn add_index_count(&mut self, count: u32) {
        self.index_count += count;
    }

    /// The number of staged indices.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Consumes the holder.
    pub fn finish(self) -> StagedIndices {
        StagedIndices {
            bytes: self.builder.finish(),
            index_count: self.index_count,
            format: self.format,
        }
    }
}

/// Stages the contents of one named shader storage block.
#[derive(Debug, Clone, Default)]
pub struct ShaderDataHolder {
    builder: BufferBuilder,
}

impl ShaderDataHolder {
    /// The builder receiving the block's bytes.
    pub fn builder(&mut self) -> &mut BufferBuilder {
        &mut self.builder
    }

    /// Consumes the holder.
    pub fn finish(self) -> Vec<u8> {
        self.builder.finish()
    }
}

/// Everything staged for one draw batch.
///
/// Passed to assembly by value, so a holder cannot be reused once its bytes
/// have been consumed.
#[derive(Debug, Clone, Default)]
pub struct DrawBatchDataHolder {
    /// Per-vertex data.
    pub vertices: VertexDataHolder,
    /// Explicit indices, if any.
    pub indices: Option<IndexDataHolder>,
    /// Per-instance data, if any.
    pub instances: Option<VertexDataHolder>,
    /// Shader storage blocks by name.
    pub shader_data: BTreeMap<String, ShaderDataHolder>,
}

impl DrawBatchDataHolder {
    /// Creates an empty holder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The per-vertex holder.
    pub fn vertices(&mut self) -> &mut VertexDataHolder {
        &mut self.vertices
    }

    /// The index holder, created with 32-bit indices on first use.
    pub fn indices(&mut self) -> &mut IndexDataHolder {
        self.indices.get_or_insert_with(IndexDataHolder::new)
    }

    /// The per-instance holder, created on first use.
    pub fn instances(&mut self) -> &mut VertexDataHolder {
        self.instances.get_or_insert_with(VertexDataHolder::new)
    }

    /// The holder of a named shader storage block, created on first use.
    pub fn shader_data(&mut self, name: &str) -> &mut ShaderDataHolder {
        self.shader_data.entry(name.to_string()).or_default()
    }
}
