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

use super::calls::DeviceCall;
use bytemuck::Pod;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tessera_core::math::{LinearRgba, Mat4};
use tessera_core::renderer::api::*;
use tessera_core::renderer::{GraphicsDevice, ResourceError};

/// A vertex buffer bound to one slot of a vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferBinding {
    /// The bound buffer.
    pub buffer: BufferId,
    /// Byte offset of the first element.
    pub offset: u64,
    /// Byte distance between elements.
    pub stride: u32,
}

#[derive(Debug)]
struct HeadlessBuffer {
    label: Option<String>,
    usage: BufferUsage,
    bytes: Vec<u8>,
    immutable: bool,
}

#[derive(Debug, Clone, Copy)]
struct AttributeState {
    slot: u32,
    divisor: u32,
    enabled: bool,
}

#[derive(Debug, Default)]
struct HeadlessVertexArray {
    vertex_buffers: BTreeMap<u32, VertexBufferBinding>,
    index: Option<(BufferId, IndexFormat)>,
    attributes: BTreeMap<u32, AttributeState>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    buffers: HashMap<BufferId, HeadlessBuffer>,
    vertex_arrays: HashMap<VertexArrayId, HeadlessVertexArray>,
    current_program: Option<ProgramId>,
    calls: Vec<DeviceCall>,
    buffer_budget: Option<usize>,
}

impl HeadlessState {
    fn buffer(&self, id: BufferId) -> Result<&HeadlessBuffer, ResourceError> {
        self.buffers.get(&id).ok_or(ResourceError::NotFound)
    }

    fn writable_buffer(&mut self, id: BufferId) -> Result<&mut HeadlessBuffer, ResourceError> {
        let buffer = self.buffers.get_mut(&id).ok_or(ResourceError::NotFound)?;
        if buffer.immutable {
            return Err(ResourceError::ImmutableBuffer);
        }
        Ok(buffer)
    }

    fn vertex_array(&self, id: VertexArrayId) -> Result<&HeadlessVertexArray, ResourceError> {
        self.vertex_arrays.get(&id).ok_or(ResourceError::InvalidHandle)
    }

    fn vertex_array_mut(
        &mut self,
        id: VertexArrayId,
    ) -> Result<&mut HeadlessVertexArray, ResourceError> {
        self.vertex_arrays
            .get_mut(&id)
            .ok_or(ResourceError::InvalidHandle)
    }

    fn program(&self) -> Result<ProgramId, ResourceError> {
        self.current_program
            .ok_or_else(|| ResourceError::BackendError("no program is bound".to_string()))
    }

    fn check_budget(&self) -> Result<(), ResourceError> {
        match self.buffer_budget {
            Some(limit) if self.buffers.len() >= limit => Err(ResourceError::BackendError(
                format!("buffer budget of {limit} exhausted"),
            )),
            _ => Ok(()),
        }
    }

    fn bound_index(&self, vertex_array: VertexArrayId) -> Result<(BufferId, IndexFormat), ResourceError> {
        self.vertex_array(vertex_array)?
            .index
            .ok_or_else(|| ResourceError::BackendError("no index buffer bound".to_string()))
    }

    fn read_records<T: Pod>(
        &self,
        commands: BufferId,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<Vec<T>, ResourceError> {
        let bytes = &self.buffer(commands)?.bytes;
        let size = std::mem::size_of::<T>();
        let stride = if stride == 0 { size } else { stride as usize };
        (0..draw_count as usize)
            .map(|i| {
                let start = offset as usize + i * stride;
                bytes
                    .get(start..start + size)
                    .map(bytemuck::pod_read_unaligned::<T>)
                    .ok_or(ResourceError::OutOfBounds)
            })
            .collect()
    }
}

/// A [`GraphicsDevice`] that keeps every object in memory.
///
/// Buffers created through [`create_buffer_with_data`](GraphicsDevice::create_buffer_with_data)
/// without [`BufferUsage::COPY_DST`] reject later writes, mirroring immutable
/// GPU storage. Draws are validated against the bound state and recorded as
/// [`DeviceCall`]s.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    state: RefCell<HeadlessState>,
    next_buffer_id: AtomicUsize,
    next_vertex_array_id: AtomicUsize,
    buffers_created: AtomicUsize,
}

impl HeadlessDevice {
    /// Creates an empty device.
    pub fn new() -> Self {
        Self::default()
    }

    fn generate_buffer_id(&self) -> BufferId {
        self.buffers_created.fetch_add(1, Ordering::Relaxed);
        BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed))
    }

    fn generate_vertex_array_id(&self) -> VertexArrayId {
        VertexArrayId(self.next_vertex_array_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Limits the number of live buffers. Creation beyond the limit fails
    /// with a backend error; `None` removes the limit.
    pub fn set_buffer_budget(&self, budget: Option<usize>) {
        self.state.borrow_mut().buffer_budget = budget;
    }

    /// Every recorded call, oldest first.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state.borrow().calls.clone()
    }

    /// Only the recorded draw calls, oldest first.
    pub fn draw_calls(&self) -> Vec<DeviceCall> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.is_draw())
            .cloned()
            .collect()
    }

    /// Forgets every recorded call.
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// The currently bound program.
    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.borrow().current_program
    }

    /// A copy of a live buffer's contents.
    pub fn buffer_contents(&self, id: BufferId) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&id).map(|b| b.bytes.clone())
    }

    /// The size of a live buffer in bytes.
    pub fn buffer_size(&self, id: BufferId) -> Option<u64> {
        self.state
            .borrow()
            .buffers
            .get(&id)
            .map(|b| b.bytes.len() as u64)
    }

    /// The debug label a live buffer was created with.
    pub fn buffer_label(&self, id: BufferId) -> Option<String> {
        self.state
            .borrow()
            .buffers
            .get(&id)
            .and_then(|b| b.label.clone())
    }

    /// The usage flags a live buffer was created with.
    pub fn buffer_usage(&self, id: BufferId) -> Option<BufferUsage> {
        self.state.borrow().buffers.get(&id).map(|b| b.usage)
    }

    /// Whether a live buffer rejects writes.
    pub fn is_buffer_immutable(&self, id: BufferId) -> Option<bool> {
        self.state.borrow().buffers.get(&id).map(|b| b.immutable)
    }

    /// Returns `true` if `id` names a live buffer.
    pub fn is_buffer_alive(&self, id: BufferId) -> bool {
        self.state.borrow().buffers.contains_key(&id)
    }

    /// The number of live buffers.
    pub fn live_buffer_count(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    /// The number of buffers ever created, destroyed ones included.
    pub fn buffers_created(&self) -> usize {
        self.buffers_created.load(Ordering::Relaxed)
    }

    /// The number of live vertex arrays.
    pub fn live_vertex_array_count(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    /// The vertex buffer bound to `slot` of a vertex array.
    pub fn vertex_buffer_binding(
        &self,
        vertex_array: VertexArrayId,
        slot: u32,
    ) -> Option<VertexBufferBinding> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .and_then(|vao| vao.vertex_buffers.get(&slot).copied())
    }

    /// The index buffer bound to a vertex array.
    pub fn index_binding(&self, vertex_array: VertexArrayId) -> Option<(BufferId, IndexFormat)> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .and_then(|vao| vao.index)
    }

    /// The enabled attribute locations of a vertex array, ascending.
    pub fn enabled_attributes(&self, vertex_array: VertexArrayId) -> Vec<u32> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .map(|vao| {
                vao.attributes
                    .iter()
                    .filter(|(_, state)| state.enabled)
                    .map(|(location, _)| *location)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The binding slot and divisor configured for an attribute location.
    pub fn attribute_source(&self, vertex_array: VertexArrayId, location: u32) -> Option<(u32, u32)> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .and_then(|vao| vao.attributes.get(&location))
            .map(|state| (state.slot, state.divisor))
    }

    fn insert_buffer(&self, buffer: HeadlessBuffer) -> Result<BufferId, ResourceError> {
        let mut state = self.state.borrow_mut();
        state.check_budget()?;
        let id = self.generate_buffer_id();
        log::trace!(
            "HeadlessDevice: Created buffer {:?} '{}' ({} bytes, immutable: {})",
            id,
            buffer.label.as_deref().unwrap_or("unlabelled"),
            buffer.bytes.len(),
            buffer.immutable
        );
        state.buffers.insert(id, buffer);
        Ok(id)
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        self.insert_buffer(HeadlessBuffer {
            label: descriptor.label.as_ref().map(|l| l.to_string()),
            usage: descriptor.usage,
            bytes: vec![0; descriptor.size as usize],
            immutable: false,
        })
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        if descriptor.size != data.len() as u64 {
            return Err(ResourceError::BackendError(format!(
                "descriptor size {} does not match {} bytes of data",
                descriptor.size,
                data.len()
            )));
        }
        self.insert_buffer(HeadlessBuffer {
            label: descriptor.label.as_ref().map(|l| l.to_string()),
            usage: descriptor.usage,
            bytes: data.to_vec(),
            immutable: !descriptor.is_dynamic(),
        })
    }

    fn resize_buffer(&self, id: BufferId, size: u64) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        let buffer = state.writable_buffer(id)?;
        buffer.bytes = vec![0; size as usize];
        log::trace!("HeadlessDevice: Resized buffer {id:?} to {size} bytes");
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        let buffer = state.writable_buffer(id)?;
        let start = offset as usize;
        let end = start + data.len();
        let target = buffer
            .bytes
            .get_mut(start..end)
            .ok_or(ResourceError::OutOfBounds)?;
        target.copy_from_slice(data);
        Ok(())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        match self.state.borrow_mut().buffers.remove(&id) {
            Some(_) => {
                log::trace!("HeadlessDevice: Destroyed buffer {id:?}");
                Ok(())
            }
            None => Err(ResourceError::NotFound),
        }
    }

    fn create_vertex_array(&self) -> Result<VertexArrayId, ResourceError> {
        let id = self.generate_vertex_array_id();
        self.state
            .borrow_mut()
            .vertex_arrays
            .insert(id, HeadlessVertexArray::default());
        Ok(id)
    }

    fn destroy_vertex_array(&self, id: VertexArrayId) -> Result<(), ResourceError> {
        self.state
            .borrow_mut()
            .vertex_arrays
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn set_vertex_buffer(
        &self,
        vertex_array: VertexArrayId,
        slot: u32,
        buffer: Option<BufferId>,
        offset: u64,
        stride: u32,
    ) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        if let Some(buffer) = buffer {
            state.buffer(buffer)?;
        }
        let vao = state.vertex_array_mut(vertex_array)?;
        match buffer {
            Some(buffer) => {
                vao.vertex_buffers.insert(
                    slot,
                    VertexBufferBinding {
                        buffer,
                        offset,
                        stride,
                    },
                );
            }
            None => {
                vao.vertex_buffers.remove(&slot);
            }
        }
        Ok(())
    }

    fn configure_vertex_layout(
        &self,
        vertex_array: VertexArrayId,
        slot: u32,
        attribute_base: u32,
        layout: &VertexLayout,
        divisor: u32,
    ) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        let vao = state.vertex_array_mut(vertex_array)?;
        for location in attribute_base..attribute_base + layout.attribute_count() {
            vao.attributes.insert(
                location,
                AttributeState {
                    slot,
                    divisor,
                    enabled: true,
                },
            );
        }
        Ok(())
    }

    fn set_index_buffer(
        &self,
        vertex_array: VertexArrayId,
        index: Option<(BufferId, IndexFormat)>,
    ) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        if let Some((buffer, _)) = index {
            state.buffer(buffer)?;
        }
        state.vertex_array_mut(vertex_array)?.index = index;
        Ok(())
    }

    fn is_vertex_attribute_enabled(
        &self,
        vertex_array: VertexArrayId,
        location: u32,
    ) -> Result<bool, ResourceError> {
        let state = self.state.borrow();
        Ok(state
            .vertex_array(vertex_array)?
            .attributes
            .get(&location)
            .is_some_and(|attribute| attribute.enabled))
    }

    fn disable_vertex_attribute(
        &self,
        vertex_array: VertexArrayId,
        location: u32,
    ) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        if let Some(attribute) = state
            .vertex_array_mut(vertex_array)?
            .attributes
            .get_mut(&location)
        {
            attribute.enabled = false;
        }
        Ok(())
    }

    fn draw_arrays(
        &self,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        args: DrawArraysIndirectArgs,
    ) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        if !state
            .vertex_array(vertex_array)?
            .vertex_buffers
            .contains_key(&0)
        {
            return Err(ResourceError::BackendError(
                "no vertex buffer bound to slot 0".to_string(),
            ));
        }
        log::trace!("HeadlessDevice: draw_arrays {topology:?} {args:?}");
        state.calls.push(DeviceCall::DrawArrays {
            vertex_array,
            topology,
            args,
        });
        Ok(())
    }

    fn draw_elements(
        &self,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        format: IndexFormat,
        args: DrawElementsIndirectArgs,
    ) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        let (index_buffer, _) = state.bound_index(vertex_array)?;
        let required = (args.first_index as u64 + args.count as u64) * format.size() as u64;
        if (state.buffer(index_buffer)?.bytes.len() as u64) < required {
            return Err(ResourceError::OutOfBounds);
        }
        log::trace!("HeadlessDevice: draw_elements {topology:?} {args:?}");
        state.calls.push(DeviceCall::DrawElements {
            vertex_array,
            topology,
            format,
            args,
        });
        Ok(())
    }

    fn draw_arrays_indirect(
        &self,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        commands: BufferId,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        state.vertex_array(vertex_array)?;
        let records = state.read_records(commands, offset, draw_count, stride)?;
        log::trace!("HeadlessDevice: draw_arrays_indirect {topology:?} x{draw_count}");
        state.calls.push(DeviceCall::DrawArraysIndirect {
            vertex_array,
            topology,
            commands,
            records,
        });
        Ok(())
    }

    fn draw_elements_indirect(
        &self,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        format: IndexFormat,
        commands: BufferId,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        state.bound_index(vertex_array)?;
        let records = state.read_records(commands, offset, draw_count, stride)?;
        log::trace!("HeadlessDevice: draw_elements_indirect {topology:?} x{draw_count}");
        state.calls.push(DeviceCall::DrawElementsIndirect {
            vertex_array,
            topology,
            format,
            commands,
            records,
        });
        Ok(())
    }

    fn bind_program(&self, program: ProgramId) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        state.current_program = Some(program);
        state.calls.push(DeviceCall::BindProgram(program));
        Ok(())
    }

    fn unbind_program(&self) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        state.current_program = None;
        state.calls.push(DeviceCall::UnbindProgram);
        Ok(())
    }

    fn set_uniform_mat4(&self, name: &str, value: &Mat4) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        let program = state.program()?;
        state.calls.push(DeviceCall::SetUniformMat4 {
            program,
            name: name.to_string(),
            value: *value,
        });
        Ok(())
    }

    fn set_uniform_color(&self, name: &str, value: LinearRgba) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        let program = state.program()?;
        state.calls.push(DeviceCall::SetUniformColor {
            program,
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn bind_shader_storage_buffer(&self, name: &str, buffer: BufferId) -> Result<(), ResourceError> {
        let mut state = self.state.borrow_mut();
        let program = state.program()?;
        state.buffer(buffer)?;
        state.calls.push(DeviceCall::BindShaderStorage {
            program,
            name: name.to_string(),
            buffer,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immutable_buffers_reject_writes() {
        // --- 1. ARRANGE ---
        let device = HeadlessDevice::new();
        let descriptor = BufferDescriptor {
            label: None,
            size: 4,
            usage: BufferUsage::VERTEX,
        };
        let id = device
            .create_buffer_with_data(&descriptor, &[1, 2, 3, 4])
            .unwrap();

        // --- 2. ACT ---
        let write = device.write_buffer(id, 0, &[9]);
        let resize = device.resize_buffer(id, 8);

        // --- 3. ASSERT ---
        assert_eq!(write, Err(ResourceError::ImmutableBuffer));
        assert_eq!(resize, Err(ResourceError::ImmutableBuffer));
        assert_eq!(device.buffer_contents(id), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn test_out_of_bounds_write_is_rejected() {
        let device = HeadlessDevice::new();
        let id = device
            .create_buffer(&BufferDescriptor::dynamic("scratch", 4, BufferUsage::STORAGE))
            .unwrap();
        assert_eq!(device.write_buffer(id, 2, &[0; 4]), Err(ResourceError::OutOfBounds));
        assert!(device.write_buffer(id, 0, &[7; 4]).is_ok());
        assert_eq!(device.buffer_label(id).as_deref(), Some("scratch"));
    }

    #[test]
    fn test_budget_limits_live_buffers() {
        let device = HeadlessDevice::new();
        device.set_buffer_budget(Some(1));
        let descriptor = BufferDescriptor::dynamic("b", 1, BufferUsage::VERTEX);
        let first = device.create_buffer(&descriptor).unwrap();
        assert!(matches!(
            device.create_buffer(&descriptor),
            Err(ResourceError::BackendError(_))
        ));
        device.destroy_buffer(first).unwrap();
        assert!(device.create_buffer(&descriptor).is_ok());
        assert_eq!(device.buffers_created(), 2);
    }

    #[test]
    fn test_uniforms_require_a_bound_program() {
        let device = HeadlessDevice::new();
        assert!(device.set_uniform_mat4("u_ModelMatrix", &Mat4::IDENTITY).is_err());
        device.bind_program(ProgramId(3)).unwrap();
        assert!(device.set_uniform_mat4("u_ModelMatrix", &Mat4::IDENTITY).is_ok());
        assert_eq!(device.current_program(), Some(ProgramId(3)));
    }
}
