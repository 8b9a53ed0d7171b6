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

//! Draw batch descriptions and the CPU-side staging they consume.
//!
//! A [`DrawBatch`] says how geometry is interpreted; a
//! [`DrawBatchDataHolder`] carries the bytes accumulated for one frame or one
//! persistent object. The pipeline in `tessera-lanes` turns the pair into
//! GPU-resident buffers.

mod builder;
mod draw_batch;
mod holder;

pub use self::builder::BufferBuilder;
pub use self::draw_batch::{BatchAction, DrawBatch};
pub use self::holder::{
    DrawBatchDataHolder, IndexDataHolder, ShaderDataHolder, StagedIndices, StagedVertices,
    VertexDataHolder,
};
