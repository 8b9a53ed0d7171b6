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

use super::builder_pool::BufferBuilderPool;
use super::error::BatchError;
use super::optimizer::MeshOptimizer;
#[cfg(feature = "mesh-optimizer")]
use super::optimizer::NativeMeshOptimizer;
use super::pool::{BufferPool, PoolStats};
use super::prepare::{assemble, AssemblyContext, PreparedBuffer};
use super::quad_index::QuadIndexCache;
use super::vertex_arrays::VertexArrayCache;
use std::rc::Rc;
use tessera_core::batch::{DrawBatch, DrawBatchDataHolder};
use tessera_core::math::LinearRgba;
use tessera_core::renderer::api::BatchSettings;
use tessera_core::renderer::GraphicsDevice;

/// A snapshot of the resources a [`BatchContext`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    /// Lifetime counters of the buffer pool.
    pub pool: PoolStats,
    /// Pooled buffers currently held by transient built buffers.
    pub outstanding_buffers: usize,
    /// Vertex layouts with a shared vertex array.
    pub cached_vertex_arrays: usize,
    /// Quads covered by the shared quad indices.
    pub quad_capacity: u32,
    /// Scratch builders waiting in the builder pool.
    pub available_builders: usize,
}

/// Owner of all state shared between the batches of one graphics context.
///
/// See the [module documentation](super) for the frame sequence.
#[derive(Debug)]
pub struct BatchContext {
    pub(super) settings: BatchSettings,
    pub(super) quad_cache: QuadIndexCache,
    pub(super) buffer_pool: BufferPool,
    pub(super) builder_pool: BufferBuilderPool,
    pub(super) vertex_arrays: VertexArrayCache,
    optimizer: Option<Box<dyn MeshOptimizer>>,
    color_modifier: Option<LinearRgba>,
}

impl BatchContext {
    /// Creates a context, installing the built-in mesh optimizer when the
    /// `mesh-optimizer` feature is enabled.
    pub fn new(settings: BatchSettings) -> Self {
        #[cfg_attr(not(feature = "mesh-optimizer"), allow(unused_mut))]
        let mut context = Self::without_optimizer(settings);
        #[cfg(feature = "mesh-optimizer")]
        {
            context.optimizer = Some(Box::new(NativeMeshOptimizer));
            log::info!("BatchLane: mesh optimizer available");
        }
        context
    }

    /// Creates a context that cannot optimize meshes until an optimizer is
    /// installed with [`set_mesh_optimizer`](Self::set_mesh_optimizer).
    pub fn without_optimizer(settings: BatchSettings) -> Self {
        let growth_policy = settings.growth_policy;
        Self {
            settings,
            quad_cache: QuadIndexCache::new(),
            buffer_pool: BufferPool::new(growth_policy),
            builder_pool: BufferBuilderPool::new(),
            vertex_arrays: VertexArrayCache::new(growth_policy),
            optimizer: None,
            color_modifier: None,
        }
    }

    /// Replaces the mesh optimizer. `None` disables optimization.
    pub fn set_mesh_optimizer(&mut self, optimizer: Option<Box<dyn MeshOptimizer>>) {
        self.optimizer = optimizer;
    }

    /// Returns `true` if `prepare` may be asked to optimize.
    pub fn has_mesh_optimizer(&self) -> bool {
        self.optimizer.is_some()
    }

    /// The settings the context was created with.
    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// The shared quad indices.
    pub fn quad_index_cache(&self) -> &QuadIndexCache {
        &self.quad_cache
    }

    /// The pool transient buffers are borrowed from.
    pub fn buffer_pool(&self) -> &BufferPool {
        &self.buffer_pool
    }

    /// The pool of scratch builders for indirect records.
    pub fn builder_pool(&self) -> &BufferBuilderPool {
        &self.builder_pool
    }

    /// The shared vertex arrays of transient buffers.
    pub fn vertex_arrays(&self) -> &VertexArrayCache {
        &self.vertex_arrays
    }

    /// Sets the color every regular program is tinted with. `None` clears it.
    pub fn set_color_modifier(&mut self, color: Option<LinearRgba>) {
        self.color_modifier = color;
    }

    /// The current color modifier.
    pub fn color_modifier(&self) -> Option<LinearRgba> {
        self.color_modifier
    }

    /// Validates the staged `data` of `batch` and turns it into draw
    /// commands, optionally running the mesh optimizer over it.
    ///
    /// Nothing is uploaded. Non-optimized quad batches grow the shared quad
    /// indices to cover their quads.
    pub fn prepare(
        &mut self,
        batch: &Rc<DrawBatch>,
        data: DrawBatchDataHolder,
        optimize: bool,
    ) -> Result<PreparedBuffer, BatchError> {
        assemble(
            AssemblyContext {
                quad_cache: &mut self.quad_cache,
                optimizer: self.optimizer.as_deref(),
                settings: &self.settings,
            },
            batch,
            data,
            optimize,
        )
    }

    /// A snapshot of the resources the context holds.
    pub fn stats(&self) -> BatchStats {
        BatchStats {
            pool: self.buffer_pool.stats(),
            outstanding_buffers: self.buffer_pool.outstanding(),
            cached_vertex_arrays: self.vertex_arrays.len(),
            quad_capacity: self.quad_cache.quad_capacity(),
            available_builders: self.builder_pool.available(),
        }
    }

    /// Destroys every GPU resource the context owns and clears the color
    /// modifier.
    ///
    /// Refuses while transient buffers are outstanding. Persistent buffers
    /// that reference the shared quad indices must be destroyed first; the
    /// indices are recreated on the next upload that needs them.
    pub fn reset(&mut self, device: &dyn GraphicsDevice) -> Result<(), BatchError> {
        let outstanding = self.buffer_pool.outstanding();
        if outstanding > 0 {
            return Err(BatchError::unsupported(format!(
                "cannot reset while {outstanding} pooled buffers are in use"
            )));
        }
        self.buffer_pool.destroy_all(device);
        self.vertex_arrays.destroy_all(device);
        self.quad_cache.destroy(device);
        self.color_modifier = None;
        log::info!("BatchLane: context reset");
        Ok(())
    }
}
