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

use tessera_core::math::{LinearRgba, Mat4};
use tessera_core::renderer::api::{
    BufferId, DrawArraysIndirectArgs, DrawElementsIndirectArgs, IndexFormat, PrimitiveTopology,
    ProgramId, VertexArrayId,
};

/// A program, uniform or draw call observed by a [`HeadlessDevice`](super::HeadlessDevice).
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    /// A program was bound.
    BindProgram(ProgramId),
    /// The current program was unbound.
    UnbindProgram,
    /// A `mat4` uniform was set on the current program.
    SetUniformMat4 {
        /// The program the uniform was set on.
        program: ProgramId,
        /// The uniform name.
        name: String,
        /// The uploaded value.
        value: Mat4,
    },
    /// A color uniform was set on the current program.
    SetUniformColor {
        /// The program the uniform was set on.
        program: ProgramId,
        /// The uniform name.
        name: String,
        /// The uploaded value.
        value: LinearRgba,
    },
    /// A storage buffer was bound to a named block.
    BindShaderStorage {
        /// The program the block belongs to.
        program: ProgramId,
        /// The block name.
        name: String,
        /// The bound buffer.
        buffer: BufferId,
    },
    /// A direct non-indexed draw.
    DrawArrays {
        /// The vertex array drawn from.
        vertex_array: VertexArrayId,
        /// The primitive topology.
        topology: PrimitiveTopology,
        /// The draw parameters.
        args: DrawArraysIndirectArgs,
    },
    /// A direct indexed draw.
    DrawElements {
        /// The vertex array drawn from.
        vertex_array: VertexArrayId,
        /// The primitive topology.
        topology: PrimitiveTopology,
        /// The index element type.
        format: IndexFormat,
        /// The draw parameters.
        args: DrawElementsIndirectArgs,
    },
    /// An indirect multi-draw of non-indexed records.
    DrawArraysIndirect {
        /// The vertex array drawn from.
        vertex_array: VertexArrayId,
        /// The primitive topology.
        topology: PrimitiveTopology,
        /// The buffer the records were read from.
        commands: BufferId,
        /// The records, decoded at submission time.
        records: Vec<DrawArraysIndirectArgs>,
    },
    /// An indirect multi-draw of indexed records.
    DrawElementsIndirect {
        /// The vertex array drawn from.
        vertex_array: VertexArrayId,
        /// The primitive topology.
        topology: PrimitiveTopology,
        /// The index element type.
        format: IndexFormat,
        /// The buffer the records were read from.
        commands: BufferId,
        /// The records, decoded at submission time.
        records: Vec<DrawElementsIndirectArgs>,
    },
}

impl DeviceCall {
    /// Returns `true` for any of the four draw variants.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            DeviceCall::DrawArrays { .. }
                | DeviceCall::DrawElements { .. }
                | DeviceCall::DrawArraysIndirect { .. }
                | DeviceCall::DrawElementsIndirect { .. }
        )
    }

    /// Returns `true` for the two indirect draw variants.
    pub fn is_indirect_draw(&self) -> bool {
        matches!(
            self,
            DeviceCall::DrawArraysIndirect { .. } | DeviceCall::DrawElementsIndirect { .. }
        )
    }
}
