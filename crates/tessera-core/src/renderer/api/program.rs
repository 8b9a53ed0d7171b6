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

/// An opaque handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub usize);

/// How the dispatcher treats a bound program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProgramKind {
    /// An engine program: receives the model matrix, the color modifier and
    /// the batch's shader storage blocks.
    #[default]
    Regular,
    /// A caller-managed program. Only bound and unbound.
    Custom,
}

/// A program reference carried by a draw batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Program {
    /// The program handle.
    pub id: ProgramId,
    /// Whether engine uniforms are applied.
    pub kind: ProgramKind,
}

impl Program {
    /// A program that receives engine uniforms.
    pub fn regular(id: ProgramId) -> Self {
        Self {
            id,
            kind: ProgramKind::Regular,
        }
    }

    /// A program that is only bound around the draw.
    pub fn custom(id: ProgramId) -> Self {
        Self {
            id,
            kind: ProgramKind::Custom,
        }
    }
}
