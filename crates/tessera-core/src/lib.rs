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

//! # Tessera Core
//!
//! Contracts, opaque handles and staged-data types shared by every layer of
//! the draw-batch pipeline. Nothing in this crate talks to a GPU; the
//! [`GraphicsDevice`](renderer::GraphicsDevice) trait is the seam behind
//! which a concrete backend lives.

#![warn(missing_docs)]

pub mod batch;
pub mod math;
pub mod renderer;
pub mod utils;

pub use batch::{DrawBatch, DrawBatchDataHolder};
pub use renderer::{BatchSettings, GraphicsDevice, ResourceError};
