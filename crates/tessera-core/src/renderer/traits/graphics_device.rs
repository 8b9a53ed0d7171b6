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

use crate::math::{LinearRgba, Mat4};
use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// The contract between the batch pipeline and a graphics backend.
///
/// Every call happens on the thread that owns the graphics context, so the
/// trait requires neither `Send` nor `Sync`. Methods take `&self`; backends
/// keep their bookkeeping behind interior mutability.
pub trait GraphicsDevice: Debug {
    /// Creates a rewritable, zero-initialized GPU buffer.
    /// ## Arguments
    /// * `descriptor` - The buffer configuration.
    /// ## Returns
    /// A `Result` containing the ID of the created buffer or an error if the creation fails.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Creates a new GPU buffer and initializes it with the provided data.
    ///
    /// Unless `descriptor.usage` contains [`BufferUsage::COPY_DST`], the
    /// buffer is immutable: later writes and resizes fail with
    /// [`ResourceError::ImmutableBuffer`].
    /// ## Arguments
    /// * `descriptor` - The buffer configuration. Its size must equal `data.len()`.
    /// * `data` - The initial contents.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Reallocates a rewritable buffer to `size` bytes. Previous contents are discarded.
    fn resize_buffer(&self, id: BufferId, size: u64) -> Result<(), ResourceError>;

    /// Writes `data` into a buffer at `offset`.
    /// ## Errors
    /// * `ResourceError::OutOfBounds` - If the write does not fit in the buffer.
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// Destroys a buffer and releases its memory.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Creates an empty vertex-array binding descriptor.
    fn create_vertex_array(&self) -> Result<VertexArrayId, ResourceError>;

    /// Destroys a vertex-array binding descriptor. Buffers bound to it are not destroyed.
    fn destroy_vertex_array(&self, id: VertexArrayId) -> Result<(), ResourceError>;

    /// Binds (or, with `None`, unbinds) a vertex buffer to a numbered binding slot.
    /// ## Arguments
    /// * `vertex_array` - The descriptor to modify.
    /// * `slot` - The binding slot index.
    /// * `buffer` - The buffer to bind, or `None` to clear the slot.
    /// * `offset` - Byte offset of the first element.
    /// * `stride` - Byte distance between consecutive elements.
    fn set_vertex_buffer(
        &self,
        vertex_array: VertexArrayId,
        slot: u32,
        buffer: Option<BufferId>,
        offset: u64,
        stride: u32,
    ) -> Result<(), ResourceError>;

    /// Describes the attributes fed by a binding slot and enables them.
    ///
    /// Attribute `i` of `layout` lands at location `attribute_base + i`.
    /// A `divisor` of 0 advances per vertex, 1 advances per instance.
    fn configure_vertex_layout(
        &self,
        vertex_array: VertexArrayId,
        slot: u32,
        attribute_base: u32,
        layout: &VertexLayout,
        divisor: u32,
    ) -> Result<(), ResourceError>;

    /// Binds (or, with `None`, unbinds) the index buffer of a vertex array.
    fn set_index_buffer(
        &self,
        vertex_array: VertexArrayId,
        index: Option<(BufferId, IndexFormat)>,
    ) -> Result<(), ResourceError>;

    /// Returns whether the attribute at `location` is enabled.
    fn is_vertex_attribute_enabled(
        &self,
        vertex_array: VertexArrayId,
        location: u32,
    ) -> Result<bool, ResourceError>;

    /// Disables the attribute at `location`.
    fn disable_vertex_attribute(
        &self,
        vertex_array: VertexArrayId,
        location: u32,
    ) -> Result<(), ResourceError>;

    /// Issues a direct, non-indexed draw.
    fn draw_arrays(
        &self,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        args: DrawArraysIndirectArgs,
    ) -> Result<(), ResourceError>;

    /// Issues a direct, indexed draw using the vertex array's index buffer.
    fn draw_elements(
        &self,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        format: IndexFormat,
        args: DrawElementsIndirectArgs,
    ) -> Result<(), ResourceError>;

    /// Executes `draw_count` non-indexed draws read from `commands`.
    /// ## Arguments
    /// * `commands` - A buffer of tightly packed [`DrawArraysIndirectArgs`] records.
    /// * `offset` - Byte offset of the first record.
    /// * `draw_count` - The number of records to execute.
    /// * `stride` - Byte distance between records, 0 for tightly packed.
    fn draw_arrays_indirect(
        &self,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        commands: BufferId,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<(), ResourceError>;

    /// Executes `draw_count` indexed draws read from `commands`.
    fn draw_elements_indirect(
        &self,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        format: IndexFormat,
        commands: BufferId,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<(), ResourceError>;

    /// Makes `program` the current program.
    fn bind_program(&self, program: ProgramId) -> Result<(), ResourceError>;

    /// Clears the current program.
    fn unbind_program(&self) -> Result<(), ResourceError>;

    /// Sets a `mat4` uniform of the current program by name.
    fn set_uniform_mat4(&self, name: &str, value: &Mat4) -> Result<(), ResourceError>;

    /// Sets a `vec4` color uniform of the current program by name.
    fn set_uniform_color(&self, name: &str, value: LinearRgba) -> Result<(), ResourceError>;

    /// Binds a buffer to the named shader storage block of the current program.
    fn bind_shader_storage_buffer(&self, name: &str, buffer: BufferId) -> Result<(), ResourceError>;
}
