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

//! Draw commands and their indirect-draw record layouts.

use bytemuck::{Pod, Zeroable};

/// A single unit of draw submission.
///
/// The order of a command list is the order in which an indirect multi-draw
/// executes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCommand {
    /// A non-indexed draw over a contiguous vertex range.
    Arrays {
        /// Number of vertices to draw.
        vertex_count: u32,
        /// Number of instances to draw.
        instance_count: u32,
        /// First vertex of the range.
        first_vertex: u32,
        /// Instance id of the first instance.
        base_instance: u32,
    },
    /// An indexed draw over a contiguous index range.
    Elements {
        /// Number of indices to draw.
        index_count: u32,
        /// Number of instances to draw.
        instance_count: u32,
        /// First index of the range.
        first_index: u32,
        /// Value added to every index before fetching a vertex.
        base_vertex: i32,
        /// Instance id of the first instance.
        base_instance: u32,
    },
}

impl DrawCommand {
    /// Creates a non-indexed command.
    pub const fn arrays(vertex_count: u32, instance_count: u32, first_vertex: u32) -> Self {
        DrawCommand::Arrays {
            vertex_count,
            instance_count,
            first_vertex,
            base_instance: 0,
        }
    }

    /// Creates an indexed command.
    pub const fn elements(index_count: u32, instance_count: u32, first_index: u32) -> Self {
        DrawCommand::Elements {
            index_count,
            instance_count,
            first_index,
            base_vertex: 0,
            base_instance: 0,
        }
    }

    /// Returns `true` for [`DrawCommand::Elements`].
    pub fn is_indexed(&self) -> bool {
        matches!(self, DrawCommand::Elements { .. })
    }

    /// The number of vertices (or indices) this command draws.
    pub fn count(&self) -> u32 {
        match self {
            DrawCommand::Arrays { vertex_count, .. } => *vertex_count,
            DrawCommand::Elements { index_count, .. } => *index_count,
        }
    }

    /// The number of instances this command draws.
    pub fn instance_count(&self) -> u32 {
        match self {
            DrawCommand::Arrays { instance_count, .. }
            | DrawCommand::Elements { instance_count, .. } => *instance_count,
        }
    }

    /// The size of this command's indirect record in bytes.
    pub const fn record_size(&self) -> usize {
        match self {
            DrawCommand::Arrays { .. } => std::mem::size_of::<DrawArraysIndirectArgs>(),
            DrawCommand::Elements { .. } => std::mem::size_of::<DrawElementsIndirectArgs>(),
        }
    }

    /// Appends this command's indirect record to `out`.
    pub fn write_record(&self, out: &mut Vec<u8>) {
        match *self {
            DrawCommand::Arrays {
                vertex_count,
                instance_count,
                first_vertex,
                base_instance,
            } => out.extend_from_slice(bytemuck::bytes_of(&DrawArraysIndirectArgs {
                count: vertex_count,
                instance_count,
                first: first_vertex,
                base_instance,
            })),
            DrawCommand::Elements {
                index_count,
                instance_count,
                first_index,
                base_vertex,
                base_instance,
            } => out.extend_from_slice(bytemuck::bytes_of(&DrawElementsIndirectArgs {
                count: index_count,
                instance_count,
                first_index,
                base_vertex,
                base_instance,
            })),
        }
    }
}

/// Indirect record for a non-indexed draw. 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawArraysIndirectArgs {
    /// Number of vertices.
    pub count: u32,
    /// Number of instances.
    pub instance_count: u32,
    /// First vertex.
    pub first: u32,
    /// First instance id.
    pub base_instance: u32,
}

/// Indirect record for an indexed draw. 20 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawElementsIndirectArgs {
    /// Number of indices.
    pub count: u32,
    /// Number of instances.
    pub instance_count: u32,
    /// First index.
    pub first_index: u32,
    /// Signed offset added to each index.
    pub base_vertex: i32,
    /// First instance id.
    pub base_instance: u32,
}

const _: [(); 16] = [(); std::mem::size_of::<DrawArraysIndirectArgs>()];
const _: [(); 20] = [(); std::mem::size_of::<DrawElementsIndirectArgs>()];
