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

//! Backend-agnostic data types of the batch pipeline.

pub mod buffer;
pub mod command;
pub mod draw_mode;
pub mod enums;
pub mod program;
pub mod settings;
pub mod vertex_layout;

pub use self::buffer::{BufferDescriptor, BufferId, BufferUsage, VertexArrayId};
pub use self::command::{DrawArraysIndirectArgs, DrawCommand, DrawElementsIndirectArgs};
pub use self::draw_mode::{DrawMode, DrawModeFlags};
pub use self::enums::{IndexFormat, PrimitiveTopology, VertexFormat};
pub use self::program::{Program, ProgramId, ProgramKind};
pub use self::settings::{BatchSettings, BufferGrowthPolicy};
pub use self::vertex_layout::{VertexAttribute, VertexLayout};
