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

//! An in-memory [`GraphicsDevice`](tessera_core::renderer::GraphicsDevice).
//!
//! The headless device keeps every buffer's bytes on the CPU, tracks vertex
//! array bindings and attribute state, and records program, uniform and
//! draw calls so callers can inspect exactly what a frame submitted.

mod calls;
mod device;

pub use self::calls::DeviceCall;
pub use self::device::{HeadlessDevice, VertexBufferBinding};
