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

//! Shared vertex arrays for the transient upload path.

use ahash::AHashMap;
use tessera_core::renderer::api::{
    BufferDescriptor, BufferGrowthPolicy, BufferId, BufferUsage, VertexArrayId, VertexLayout,
};
use tessera_core::renderer::{GraphicsDevice, ResourceError};

/// The vertex array and slot-0 vertex buffer shared by every transient batch
/// with the same vertex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedVertexArray {
    /// The vertex array, configured with the layout at attribute base 0.
    pub vertex_array: VertexArrayId,
    /// The resident vertex buffer bound to slot 0.
    pub vertex_buffer: BufferId,
}

#[derive(Debug)]
struct CachedVertexArray {
    shared: SharedVertexArray,
    capacity: u64,
}

/// One [`SharedVertexArray`] per distinct [`VertexLayout`].
#[derive(Debug)]
pub struct VertexArrayCache {
    entries: AHashMap<VertexLayout, CachedVertexArray>,
    growth_policy: BufferGrowthPolicy,
}

impl VertexArrayCache {
    /// Creates an empty cache.
    pub fn new(growth_policy: BufferGrowthPolicy) -> Self {
        Self {
            entries: AHashMap::new(),
            growth_policy,
        }
    }

    /// Uploads `vertices` into the shared vertex buffer of `layout`, creating
    /// the vertex array on first use and growing the buffer if needed.
    pub fn upload(
        &mut self,
        device: &dyn GraphicsDevice,
        layout: &VertexLayout,
        vertices: &[u8],
    ) -> Result<SharedVertexArray, ResourceError> {
        if !self.entries.contains_key(layout) {
            let entry = Self::create(device, layout)?;
            self.entries.insert(layout.clone(), entry);
        }
        let Some(entry) = self.entries.get_mut(layout) else {
            return Err(ResourceError::NotFound);
        };

        let required = vertices.len() as u64;
        if entry.capacity < required {
            let size = self.growth_policy.grown_size(required);
            device.resize_buffer(entry.shared.vertex_buffer, size)?;
            log::debug!(
                "VertexArrayCache: grew vertex buffer {:?} to {} bytes",
                entry.shared.vertex_buffer,
                size
            );
            entry.capacity = size;
        }
        device.write_buffer(entry.shared.vertex_buffer, 0, vertices)?;
        Ok(entry.shared)
    }

    fn create(
        device: &dyn GraphicsDevice,
        layout: &VertexLayout,
    ) -> Result<CachedVertexArray, ResourceError> {
        let vertex_array = device.create_vertex_array()?;
        let descriptor = BufferDescriptor::dynamic("Shared Vertex Buffer", 0, BufferUsage::VERTEX);
        let vertex_buffer = match device.create_buffer(&descriptor) {
            Ok(id) => id,
            Err(e) => {
                discard_vertex_array(device, vertex_array);
                return Err(e);
            }
        };
        let configured = device
            .set_vertex_buffer(vertex_array, 0, Some(vertex_buffer), 0, layout.stride() as u32)
            .and_then(|()| device.configure_vertex_layout(vertex_array, 0, 0, layout, 0));
        if let Err(e) = configured {
            if let Err(destroy) = device.destroy_buffer(vertex_buffer) {
                log::warn!("VertexArrayCache: failed to destroy {vertex_buffer:?}: {destroy}");
            }
            discard_vertex_array(device, vertex_array);
            return Err(e);
        }
        log::debug!(
            "VertexArrayCache: created {:?} for a {}-attribute layout",
            vertex_array,
            layout.attribute_count()
        );
        Ok(CachedVertexArray {
            shared: SharedVertexArray {
                vertex_array,
                vertex_buffer,
            },
            capacity: 0,
        })
    }

    /// The shared vertex array of `layout`, if one was created.
    pub fn get(&self, layout: &VertexLayout) -> Option<SharedVertexArray> {
        self.entries.get(layout).map(|entry| entry.shared)
    }

    /// The number of cached layouts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no layout has been cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destroys every cached vertex array and its vertex buffer.
    pub fn destroy_all(&mut self, device: &dyn GraphicsDevice) {
        for (_, entry) in self.entries.drain() {
            if let Err(e) = device.destroy_vertex_array(entry.shared.vertex_array) {
                log::warn!(
                    "VertexArrayCache: failed to destroy {:?}: {e}",
                    entry.shared.vertex_array
                );
            }
            if let Err(e) = device.destroy_buffer(entry.shared.vertex_buffer) {
                log::warn!(
                    "VertexArrayCache: failed to destroy {:?}: {e}",
                    entry.shared.vertex_buffer
                );
            }
        }
    }
}

fn discard_vertex_array(device: &dyn GraphicsDevice, vertex_array: VertexArrayId) {
    if let Err(e) = device.destroy_vertex_array(vertex_array) {
        log::warn!("VertexArrayCache: failed to destroy {vertex_array:?}: {e}");
    }
}
