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

//! Core enums shared by the device contract and the batch pipeline.

/// The data type of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// Four 8-bit unsigned integer components, typically a packed color.
    Uint8x4,
    /// Two 16-bit signed integer components.
    Sint16x2,
    /// Four 16-bit signed integer components.
    Sint16x4,
    /// One 32-bit float component.
    Float32,
    /// Two 32-bit float components.
    Float32x2,
    /// Three 32-bit float components.
    Float32x3,
    /// Four 32-bit float components.
    Float32x4,
    /// One 32-bit unsigned integer component.
    Uint32,
    /// Four 32-bit unsigned integer components.
    Uint32x4,
}

impl VertexFormat {
    /// Returns the size of the format in bytes.
    pub const fn size(&self) -> usize {
        match self {
            VertexFormat::Uint8x4 => 4,
            VertexFormat::Sint16x2 => 4,
            VertexFormat::Sint16x4 => 8,
            VertexFormat::Float32 => 4,
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
            VertexFormat::Uint32 => 4,
            VertexFormat::Uint32x4 => 16,
        }
    }
}

/// The element type of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// Indices are 16-bit unsigned integers.
    Uint16,
    /// Indices are 32-bit unsigned integers.
    #[default]
    Uint32,
}

impl IndexFormat {
    /// Returns the size of one index in bytes.
    pub const fn size(&self) -> usize {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Each vertex is a point.
    Points,
    /// Every two vertices form a line.
    Lines,
    /// Consecutive vertices form a polyline.
    LineStrip,
    /// A polyline closed back to its first vertex.
    LineLoop,
    /// Every three vertices form a triangle.
    Triangles,
    /// Each new vertex forms a triangle with the previous two.
    TriangleStrip,
    /// Each new vertex forms a triangle with the first and the previous one.
    TriangleFan,
}

impl PrimitiveTopology {
    /// Returns `true` for independent triangle lists.
    pub const fn is_triangle_list(&self) -> bool {
        matches!(self, PrimitiveTopology::Triangles)
    }
}
