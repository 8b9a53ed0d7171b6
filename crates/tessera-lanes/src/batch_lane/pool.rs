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

//! A reuse pool of GPU buffers for the transient upload path.

use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use tessera_core::renderer::api::{BufferDescriptor, BufferGrowthPolicy, BufferId, BufferUsage};
use tessera_core::renderer::{GraphicsDevice, ResourceError};

/// What a pooled buffer is used for. Buffers are only reused within a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BufferRole {
    /// Per-batch index data.
    Index,
    /// Per-instance vertex data.
    Instance,
    /// Shader storage blocks.
    ShaderStorage,
    /// Indirect draw records.
    Command,
}

impl BufferRole {
    /// The buffer usage requested from the device for this role.
    pub fn usage(&self) -> BufferUsage {
        match self {
            BufferRole::Index => BufferUsage::INDEX,
            BufferRole::Instance => BufferUsage::VERTEX,
            BufferRole::ShaderStorage => BufferUsage::STORAGE,
            BufferRole::Command => BufferUsage::INDIRECT,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            BufferRole::Index => "Pooled Index Buffer",
            BufferRole::Instance => "Pooled Instance Buffer",
            BufferRole::ShaderStorage => "Pooled Storage Buffer",
            BufferRole::Command => "Pooled Command Buffer",
        }
    }
}

/// Lifetime counters of a [`BufferPool`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers created because no free buffer of the role existed.
    pub created: usize,
    /// Successful borrows.
    pub borrowed: usize,
    /// Buffers handed back.
    pub returned: usize,
    /// Reallocations caused by a buffer being too small.
    pub grown: usize,
}

#[derive(Debug, Clone, Copy)]
struct PoolEntry {
    id: BufferId,
    capacity: u64,
}

#[derive(Debug, Default)]
struct PoolState {
    free: AHashMap<BufferRole, Vec<PoolEntry>>,
    outstanding: usize,
    stats: PoolStats,
}

/// Free lists of GPU buffers keyed by [`BufferRole`].
///
/// [`borrow`](Self::borrow) hands out a [`PooledBuffer`] guard that returns
/// the buffer when dropped, so a buffer goes back exactly once on every
/// path, errors included. Buffers only ever grow.
#[derive(Debug, Clone)]
pub struct BufferPool {
    state: Rc<RefCell<PoolState>>,
    growth_policy: BufferGrowthPolicy,
}

impl BufferPool {
    /// Creates an empty pool.
    pub fn new(growth_policy: BufferGrowthPolicy) -> Self {
        Self {
            state: Rc::new(RefCell::new(PoolState::default())),
            growth_policy,
        }
    }

    /// Checks out a buffer of `role`, creating an empty one if none is free.
    pub fn borrow(
        &self,
        device: &dyn GraphicsDevice,
        role: BufferRole,
    ) -> Result<PooledBuffer, ResourceError> {
        let reused = self
            .state
            .borrow_mut()
            .free
            .get_mut(&role)
            .and_then(Vec::pop);

        let entry = match reused {
            Some(entry) => entry,
            None => {
                let descriptor = BufferDescriptor::dynamic(role.label(), 0, role.usage());
                let id = device.create_buffer(&descriptor)?;
                self.state.borrow_mut().stats.created += 1;
                log::debug!("BufferPool: created {role:?} buffer {id:?}");
                PoolEntry { id, capacity: 0 }
            }
        };

        let mut state = self.state.borrow_mut();
        state.outstanding += 1;
        state.stats.borrowed += 1;
        Ok(PooledBuffer {
            pool: Rc::clone(&self.state),
            role,
            id: entry.id,
            capacity: entry.capacity,
            growth_policy: self.growth_policy,
        })
    }

    /// A snapshot of the pool counters.
    pub fn stats(&self) -> PoolStats {
        self.state.borrow().stats
    }

    /// The number of buffers currently checked out.
    pub fn outstanding(&self) -> usize {
        self.state.borrow().outstanding
    }

    /// The number of free buffers of `role`.
    pub fn free_count(&self, role: BufferRole) -> usize {
        self.state.borrow().free.get(&role).map_or(0, Vec::len)
    }

    /// Returns `true` if `id` is sitting in a free list.
    pub fn is_free(&self, id: BufferId) -> bool {
        self.state
            .borrow()
            .free
            .values()
            .flatten()
            .any(|entry| entry.id == id)
    }

    /// Destroys every free buffer. Checked-out buffers are untouched.
    pub fn destroy_all(&self, device: &dyn GraphicsDevice) {
        let free = std::mem::take(&mut self.state.borrow_mut().free);
        let mut destroyed = 0;
        for entry in free.into_iter().flat_map(|(_, entries)| entries) {
            match device.destroy_buffer(entry.id) {
                Ok(()) => destroyed += 1,
                Err(e) => log::warn!("BufferPool: failed to destroy {:?}: {e}", entry.id),
            }
        }
        log::debug!("BufferPool: destroyed {destroyed} pooled buffers");
    }
}

/// A buffer checked out of a [`BufferPool`]. Dropping it returns the buffer.
#[derive(Debug)]
pub struct PooledBuffer {
    pool: Rc<RefCell<PoolState>>,
    role: BufferRole,
    id: BufferId,
    capacity: u64,
    growth_policy: BufferGrowthPolicy,
}

impl PooledBuffer {
    /// The buffer handle.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// The role the buffer was borrowed for.
    pub fn role(&self) -> BufferRole {
        self.role
    }

    /// The allocated size in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Reallocates the buffer if it holds fewer than `required` bytes.
    /// Returns `true` if it grew.
    pub fn ensure_capacity(
        &mut self,
        device: &dyn GraphicsDevice,
        required: u64,
    ) -> Result<bool, ResourceError> {
        if self.capacity >= required {
            return Ok(false);
        }
        let size = self.growth_policy.grown_size(required);
        device.resize_buffer(self.id, size)?;
        log::debug!(
            "BufferPool: grew {:?} buffer {:?} to {} bytes",
            self.role,
            self.id,
            size
        );
        self.capacity = size;
        self.pool.borrow_mut().stats.grown += 1;
        Ok(true)
    }

    /// Grows the buffer as needed and writes `data` at offset 0.
    pub fn upload(&mut self, device: &dyn GraphicsDevice, data: &[u8]) -> Result<(), ResourceError> {
        self.ensure_capacity(device, data.len() as u64)?;
        device.write_buffer(self.id, 0, data)?;
        log::trace!("BufferPool: uploaded {} bytes to {:?}", data.len(), self.id);
        Ok(())
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let mut state = self.pool.borrow_mut();
        state.outstanding = state.outstanding.saturating_sub(1);
        state.stats.returned += 1;
        state.free.entry(self.role).or_default().push(PoolEntry {
            id: self.id,
            capacity: self.capacity,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tessera_core::math::{LinearRgba, Mat4};
    use tessera_core::renderer::api::*;

    #[derive(Debug, Default)]
    struct CountingDevice {
        next_id: AtomicUsize,
        resizes: AtomicUsize,
        destroyed: AtomicUsize,
    }

    impl GraphicsDevice for CountingDevice {
        fn create_buffer(&self, _: &BufferDescriptor) -> Result<BufferId, ResourceError> {
            Ok(BufferId(self.next_id.fetch_add(1, Ordering::Relaxed)))
        }
        fn create_buffer_with_data(&self, d: &BufferDescriptor, _: &[u8]) -> Result<BufferId, ResourceError> {
            self.create_buffer(d)
        }
        fn resize_buffer(&self, _: BufferId, _: u64) -> Result<(), ResourceError> {
            self.resizes.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
        fn write_buffer(&self, _: BufferId, _: u64, _: &[u8]) -> Result<(), ResourceError> {
            Ok(())
        }
        fn destroy_buffer(&self, _: BufferId) -> Result<(), ResourceError> {
            self.destroyed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
        fn create_vertex_array(&self) -> Result<VertexArrayId, ResourceError> {
            unimplemented!()
        }
        fn destroy_vertex_array(&self, _: VertexArrayId) -> Result<(), ResourceError> {
            unimplemented!()
        }
        fn set_vertex_buffer(&self, _: VertexArrayId, _: u32, _: Option<BufferId>, _: u64, _: u32) -> Result<(), ResourceError> {
            unimplemented!()
        }
        fn configure_vertex_layout(&self, _: VertexArrayId, _: u32, _: u32, _: &VertexLayout, _: u32) -> Result<(), ResourceError> {
            unimplemented!()
        }
        fn set_index_buffer(&self, _: VertexArrayId, _: Option<(BufferId, IndexFormat)>) -> Result<(), ResourceError> {
            unimplemented!()
        }
        fn is_vertex_attribute_enabled(&self, _: VertexArrayId, _: u32) -> Result<bool, ResourceError> {
            unimplemented!()
        }
        fn disable_vertex_attribute(&self, _: VertexArrayId, _: u32) -> Result<(), ResourceError> {
            unimplemented!()
        }
        fn draw_arrays(&self, _: VertexArrayId, _: PrimitiveTopology, _: DrawArraysIndirectArgs) -> Result<(), ResourceError> {
            unimplemented!()
        }
        fn draw_elements(&self, _: VertexArrayId, _: PrimitiveTopology, _: IndexFormat, _: DrawElementsIndirectArgs) -> Result<(), ResourceError> {
            unimplemented!()
        }
        fn draw_arrays_indirect(&self, _: VertexArrayId, _: PrimitiveTopology, _: BufferId, _: u64, _: u32, _: u32) -> Result<(), ResourceError> {
            unimplemented!()
        }
        fn draw_elements_indirect(&self, _: VertexArrayId, _: PrimitiveTopology, _: IndexFormat, _: BufferId, _: u64, _: u32, _: u32) -> Result<(), ResourceError> {
            unimplemented!()
        }
        fn bind_program(&self, _: ProgramId) -> Result<(), ResourceError> {
            unimplemented!()
        }
        fn unbind_program(&self) -> Result<(), ResourceError> {
            unimplemented!()
        }
        fn set_uniform_mat4(&self, _: &str, _: &Mat4) -> Result<(), ResourceError> {
            unimplemented!()
        }
        fn set_uniform_color(&self, _: &str, _: LinearRgba) -> Result<(), ResourceError> {
            unimplemented!()
        }
        fn bind_shader_storage_buffer(&self, _: &str, _: BufferId) -> Result<(), ResourceError> {
            unimplemented!()
        }
    }

    #[test]
    fn test_dropped_guard_returns_buffer_for_reuse() {
        // --- 1. ARRANGE ---
        let device = CountingDevice::default();
        let pool = BufferPool::new(BufferGrowthPolicy::Exact);

        // --- 2. ACT ---
        let first_id = {
            let guard = pool.borrow(&device, BufferRole::Index).unwrap();
            assert_eq!(pool.outstanding(), 1);
            guard.id()
        };
        let second = pool.borrow(&device, BufferRole::Index).unwrap();

        // --- 3. ASSERT ---
        assert_eq!(second.id(), first_id);
        assert_eq!(pool.stats().created, 1);
        assert_eq!(pool.stats().borrowed, 2);
        assert_eq!(pool.stats().returned, 1);
    }

    #[test]
    fn test_roles_do_not_share_buffers() {
        let device = CountingDevice::default();
        let pool = BufferPool::new(BufferGrowthPolicy::Exact);
        drop(pool.borrow(&device, BufferRole::Index).unwrap());

        let storage = pool.borrow(&device, BufferRole::ShaderStorage).unwrap();

        assert_eq!(pool.stats().created, 2);
        assert_eq!(pool.free_count(BufferRole::Index), 1);
        assert_eq!(storage.role(), BufferRole::ShaderStorage);
    }

    #[test]
    fn test_buffers_grow_but_never_shrink() {
        let device = CountingDevice::default();
        let pool = BufferPool::new(BufferGrowthPolicy::PowerOfTwo);
        let mut guard = pool.borrow(&device, BufferRole::Instance).unwrap();

        assert!(guard.ensure_capacity(&device, 100).unwrap());
        assert_eq!(guard.capacity(), 128);
        assert!(!guard.ensure_capacity(&device, 64).unwrap());
        assert!(!guard.ensure_capacity(&device, 128).unwrap());
        drop(guard);

        let guard = pool.borrow(&device, BufferRole::Instance).unwrap();
        assert_eq!(guard.capacity(), 128);
        assert_eq!(device.resizes.load(Ordering::Relaxed), 1);
        assert_eq!(pool.stats().grown, 1);
    }

    #[test]
    fn test_destroy_all_only_touches_free_buffers() {
        let device = CountingDevice::default();
        let pool = BufferPool::new(BufferGrowthPolicy::Exact);
        let held = pool.borrow(&device, BufferRole::Command).unwrap();
        drop(pool.borrow(&device, BufferRole::Index).unwrap());

        pool.destroy_all(&device);

        assert_eq!(device.destroyed.load(Ordering::Relaxed), 1);
        assert_eq!(pool.free_count(BufferRole::Index), 0);
        assert_eq!(pool.outstanding(), 1);
        drop(held);
        assert!(pool.is_free(BufferId(0)));
    }
}
