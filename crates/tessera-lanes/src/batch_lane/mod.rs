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

//! Batch lane - assembly, upload and submission of draw batches
//!
//! The [`BatchContext`] owns every piece of state shared between batches:
//! the quad index cache, the buffer pools, the per-layout vertex arrays, the
//! optional mesh optimizer and the color-modifier override. It lives on the
//! thread that owns the graphics context; its pools share state through
//! `Rc`, so the compiler rejects any attempt to move it elsewhere.
//!
//! Typical frame:
//!
//! 1. [`BatchContext::prepare`] validates staged data and builds draw commands.
//! 2. [`BatchContext::build_transient`] or [`BatchContext::build_persistent`] uploads it.
//! 3. [`BatchContext::render`] draws it.
//! 4. [`BatchContext::release`] gives transient buffers back to the pool.

mod builder_pool;
mod built;
mod context;
mod dispatch;
mod error;
pub mod optimizer;
mod pool;
mod prepare;
mod quad_index;
mod upload;
mod vertex_arrays;

pub use builder_pool::{BufferBuilderPool, PooledBuilder};
pub use built::{BuiltBuffer, GpuBuffer, IndexBinding, Residency};
pub use context::{BatchContext, BatchStats};
pub use error::BatchError;
pub use optimizer::{MeshOptimizer, MeshView, OptimizedMesh};
#[cfg(feature = "mesh-optimizer")]
pub use optimizer::NativeMeshOptimizer;
pub use pool::{BufferPool, BufferRole, PoolStats, PooledBuffer};
pub use prepare::PreparedBuffer;
pub use quad_index::{IndexByteBuffer, QuadIndexCache};
pub use vertex_arrays::{SharedVertexArray, VertexArrayCache};
