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

//! Upload of prepared data into transient or persistent GPU buffers.

use super::built::{BuiltBuffer, GpuBuffer, IndexBinding, Residency};
use super::context::BatchContext;
use super::error::BatchError;
use super::pool::BufferRole;
use super::prepare::PreparedBuffer;
use super::quad_index::IndexByteBuffer;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tessera_core::batch::DrawBatch;
use tessera_core::renderer::api::{
    BufferDescriptor, BufferId, BufferUsage, DrawCommand, IndexFormat, VertexArrayId,
};
use tessera_core::renderer::{GraphicsDevice, ResourceError};

const VERTEX_SLOT: u32 = 0;
const INSTANCE_SLOT: u32 = 1;
const INSTANCE_DIVISOR: u32 = 1;

impl BatchContext {
    /// Uploads `prepared` into pooled buffers and the shared vertex array of
    /// its vertex layout.
    ///
    /// The result must be handed back with [`release`](Self::release) once
    /// drawn. Two transient buffers with the same vertex layout share one
    /// vertex buffer, so each must be rendered before the next is built.
    ///
    /// Dropping the result without releasing it still returns its pooled
    /// buffers, but the shared vertex array keeps its index binding and
    /// instance slot pointing at them until the next transient build or
    /// release for that layout.
    pub fn build_transient(
        &mut self,
        device: &dyn GraphicsDevice,
        prepared: PreparedBuffer,
    ) -> Result<BuiltBuffer, BatchError> {
        let PreparedBuffer {
            batch,
            vertex_data,
            instance_data,
            index_data,
            shader_data,
            draw_commands,
            ..
        } = prepared;

        let shared = self
            .vertex_arrays
            .upload(device, &batch.vertex_layout, &vertex_data)?;
        let vertex_array = shared.vertex_array;

        let attached = self.attach_transient(
            device,
            &batch,
            vertex_array,
            instance_data,
            index_data,
            shader_data,
            &draw_commands,
        );
        let (index, instance_buffer, shader_data, command_buffer) = match attached {
            Ok(parts) => parts,
            Err(e) => {
                let instanced = batch.instance_layout.is_some();
                if let Err(clear) = clear_bindings(device, vertex_array, &batch, instanced) {
                    log::warn!("BatchLane: failed to reset {vertex_array:?} after a failed upload: {clear}");
                }
                return Err(e);
            }
        };

        Ok(BuiltBuffer {
            batch,
            residency: Residency::Transient,
            vertex_array,
            vertex_buffer: GpuBuffer::Shared(shared.vertex_buffer),
            index,
            instance_buffer,
            shader_data,
            command_buffer,
            draw_commands,
        })
    }

    #[allow(clippy::type_complexity, clippy::too_many_arguments)]
    fn attach_transient(
        &mut self,
        device: &dyn GraphicsDevice,
        batch: &DrawBatch,
        vertex_array: VertexArrayId,
        instance_data: Option<Vec<u8>>,
        index_data: Option<IndexByteBuffer>,
        shader_data: BTreeMap<String, Vec<u8>>,
        draw_commands: &[DrawCommand],
    ) -> Result<
        (
            Option<IndexBinding>,
            Option<GpuBuffer>,
            BTreeMap<String, GpuBuffer>,
            Option<GpuBuffer>,
        ),
        BatchError,
    > {
        let index = match index_data {
            Some(IndexByteBuffer::SharedQuads { .. }) => {
                let id = self.quad_cache.gpu_buffer(device)?;
                Some(IndexBinding {
                    buffer: GpuBuffer::Shared(id),
                    format: IndexFormat::Uint32,
                })
            }
            Some(IndexByteBuffer::Owned { format, bytes }) => {
                let mut buffer = self.buffer_pool.borrow(device, BufferRole::Index)?;
                buffer.upload(device, &bytes)?;
                Some(IndexBinding {
                    buffer: GpuBuffer::Pooled(buffer),
                    format,
                })
            }
            None => None,
        };
        device.set_index_buffer(
            vertex_array,
            index.as_ref().map(|binding| (binding.buffer.id(), binding.format)),
        )?;

        let instance_buffer = match (&batch.instance_layout, instance_data) {
            (Some(layout), Some(bytes)) => {
                let mut buffer = self.buffer_pool.borrow(device, BufferRole::Instance)?;
                buffer.upload(device, &bytes)?;
                device.set_vertex_buffer(
                    vertex_array,
                    INSTANCE_SLOT,
                    Some(buffer.id()),
                    0,
                    layout.stride() as u32,
                )?;
                device.configure_vertex_layout(
                    vertex_array,
                    INSTANCE_SLOT,
                    batch.vertex_layout.attribute_count(),
                    layout,
                    INSTANCE_DIVISOR,
                )?;
                Some(GpuBuffer::Pooled(buffer))
            }
            _ => None,
        };

        let mut storage = BTreeMap::new();
        for (name, bytes) in shader_data {
            let mut buffer = self.buffer_pool.borrow(device, BufferRole::ShaderStorage)?;
            buffer.upload(device, &bytes)?;
            storage.insert(name, GpuBuffer::Pooled(buffer));
        }

        let command_buffer = if draw_commands.len() > 1 {
            let mut records = self.builder_pool.borrow();
            for command in draw_commands {
                command.write_record(&mut records);
            }
            let mut buffer = self.buffer_pool.borrow(device, BufferRole::Command)?;
            buffer.upload(device, &records)?;
            Some(GpuBuffer::Pooled(buffer))
        } else {
            None
        };

        Ok((index, instance_buffer, storage, command_buffer))
    }

    /// Uploads `prepared` into a dedicated vertex array and immutable buffers
    /// that live until [`destroy_persistent`](Self::destroy_persistent).
    ///
    /// Non-optimized quad batches reference the context's shared quad
    /// indices instead of owning a copy.
    pub fn build_persistent(
        &mut self,
        device: &dyn GraphicsDevice,
        prepared: PreparedBuffer,
    ) -> Result<BuiltBuffer, BatchError> {
        let vertex_array = device.create_vertex_array()?;
        let mut created = Vec::new();

        match self.attach_persistent(device, vertex_array, prepared, &mut created) {
            Ok(built) => {
                log::debug!(
                    "BatchLane: built persistent {:?} with {} owned buffers",
                    vertex_array,
                    created.len()
                );
                Ok(built)
            }
            Err(e) => {
                for id in created {
                    if let Err(destroy) = device.destroy_buffer(id) {
                        log::warn!("BatchLane: failed to destroy {id:?} after a failed upload: {destroy}");
                    }
                }
                if let Err(destroy) = device.destroy_vertex_array(vertex_array) {
                    log::warn!(
                        "BatchLane: failed to destroy {vertex_array:?} after a failed upload: {destroy}"
                    );
                }
                Err(e)
            }
        }
    }

    fn attach_persistent(
        &mut self,
        device: &dyn GraphicsDevice,
        vertex_array: VertexArrayId,
        prepared: PreparedBuffer,
        created: &mut Vec<BufferId>,
    ) -> Result<BuiltBuffer, BatchError> {
        let PreparedBuffer {
            batch,
            vertex_data,
            instance_data,
            index_data,
            shader_data,
            draw_commands,
            ..
        } = prepared;

        let index = match index_data {
            Some(IndexByteBuffer::SharedQuads { .. }) => Some(IndexBinding {
                buffer: GpuBuffer::Shared(self.quad_cache.gpu_buffer(device)?),
                format: IndexFormat::Uint32,
            }),
            Some(IndexByteBuffer::Owned { format, bytes }) => {
                let id = create_immutable(device, "Batch Indices", BufferUsage::INDEX, &bytes, created)?;
                Some(IndexBinding {
                    buffer: GpuBuffer::Owned(id),
                    format,
                })
            }
            None => None,
        };
        if let Some(binding) = &index {
            device.set_index_buffer(vertex_array, Some((binding.buffer.id(), binding.format)))?;
        }

        let vertex_buffer = create_immutable(
            device,
            "Batch Vertices",
            BufferUsage::VERTEX,
            &vertex_data,
            created,
        )?;
        device.set_vertex_buffer(
            vertex_array,
            VERTEX_SLOT,
            Some(vertex_buffer),
            0,
            batch.vertex_layout.stride() as u32,
        )?;
        device.configure_vertex_layout(vertex_array, VERTEX_SLOT, 0, &batch.vertex_layout, 0)?;

        let instance_buffer = match (&batch.instance_layout, instance_data) {
            (Some(layout), Some(bytes)) => {
                let id = create_immutable(device, "Batch Instances", BufferUsage::VERTEX, &bytes, created)?;
                device.set_vertex_buffer(
                    vertex_array,
                    INSTANCE_SLOT,
                    Some(id),
                    0,
                    layout.stride() as u32,
                )?;
                device.configure_vertex_layout(
                    vertex_array,
                    INSTANCE_SLOT,
                    batch.vertex_layout.attribute_count(),
                    layout,
                    INSTANCE_DIVISOR,
                )?;
                Some(GpuBuffer::Owned(id))
            }
            _ => None,
        };

        let mut storage = BTreeMap::new();
        for (name, bytes) in shader_data {
            let id = create_immutable(device, "Batch Shader Data", BufferUsage::STORAGE, &bytes, created)?;
            storage.insert(name, GpuBuffer::Owned(id));
        }

        let command_buffer = if draw_commands.len() > 1 {
            let mut records = self.builder_pool.borrow();
            for command in &draw_commands {
                command.write_record(&mut records);
            }
            let id = create_immutable(device, "Batch Commands", BufferUsage::INDIRECT, &records, created)?;
            Some(GpuBuffer::Owned(id))
        } else {
            None
        };

        Ok(BuiltBuffer {
            batch,
            residency: Residency::Persistent,
            vertex_array,
            vertex_buffer: GpuBuffer::Owned(vertex_buffer),
            index,
            instance_buffer,
            shader_data: storage,
            command_buffer,
            draw_commands,
        })
    }

    /// Gives the pooled buffers of a transient `built` back to the context
    /// and clears the bindings it left on the shared vertex array.
    pub fn release(
        &self,
        device: &dyn GraphicsDevice,
        built: BuiltBuffer,
    ) -> Result<(), BatchError> {
        if built.residency != Residency::Transient {
            return Err(BatchError::unsupported(
                "only transient buffers can be released; use destroy_persistent",
            ));
        }
        let instanced = built.instance_buffer.is_some();
        let cleared = clear_bindings(device, built.vertex_array, &built.batch, instanced);
        drop(built);
        cleared.map_err(BatchError::from)
    }

    /// Destroys the vertex array and every owned buffer of a persistent
    /// `built`. Shared buffers are left alone.
    ///
    /// Every destruction is attempted; the first failure is returned.
    pub fn destroy_persistent(
        &self,
        device: &dyn GraphicsDevice,
        built: BuiltBuffer,
    ) -> Result<(), BatchError> {
        if built.residency != Residency::Persistent {
            return Err(BatchError::unsupported(
                "only persistent buffers can be destroyed; use release",
            ));
        }

        let mut first_error = None;
        if let Err(e) = device.destroy_vertex_array(built.vertex_array) {
            log::warn!("BatchLane: failed to destroy {:?}: {e}", built.vertex_array);
            first_error.get_or_insert(e);
        }

        let owned = std::iter::once(&built.vertex_buffer)
            .chain(built.index.as_ref().map(|binding| &binding.buffer))
            .chain(built.instance_buffer.as_ref())
            .chain(built.shader_data.values())
            .chain(built.command_buffer.as_ref())
            .filter(|buffer| buffer.is_owned())
            .map(GpuBuffer::id);
        for id in owned {
            if let Err(e) = device.destroy_buffer(id) {
                log::warn!("BatchLane: failed to destroy {id:?}: {e}");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

fn create_immutable(
    device: &dyn GraphicsDevice,
    label: &'static str,
    usage: BufferUsage,
    data: &[u8],
    created: &mut Vec<BufferId>,
) -> Result<BufferId, ResourceError> {
    let descriptor = BufferDescriptor {
        label: Some(Cow::Borrowed(label)),
        size: data.len() as u64,
        usage,
    };
    let id = device.create_buffer_with_data(&descriptor, data)?;
    created.push(id);
    Ok(id)
}

/// Unbinds what a transient upload attached to a shared vertex array.
fn clear_bindings(
    device: &dyn GraphicsDevice,
    vertex_array: VertexArrayId,
    batch: &DrawBatch,
    instanced: bool,
) -> Result<(), ResourceError> {
    device.set_index_buffer(vertex_array, None)?;
    if instanced {
        device.set_vertex_buffer(vertex_array, INSTANCE_SLOT, None, 0, 0)?;
        let mut location = batch.vertex_layout.attribute_count();
        while device.is_vertex_attribute_enabled(vertex_array, location)? {
            device.disable_vertex_attribute(vertex_array, location)?;
            location += 1;
        }
    }
    Ok(())
}
