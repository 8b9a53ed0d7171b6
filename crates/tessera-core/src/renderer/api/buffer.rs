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

use crate::tessera_bitflags;
use std::borrow::Cow;

/// An opaque handle to a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// An opaque handle to a vertex-array binding descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayId(pub usize);

tessera_bitflags! {
    /// A set of flags describing the allowed usages of a [`BufferId`].
    pub struct BufferUsage: u32 {
        /// The buffer can be used as a vertex buffer.
        const VERTEX = 1 << 0;
        /// The buffer can be used as an index buffer.
        const INDEX = 1 << 1;
        /// The buffer can be bound as a shader storage block.
        const STORAGE = 1 << 2;
        /// The buffer holds indirect draw records.
        const INDIRECT = 1 << 3;
        /// The buffer can be rewritten after creation.
        const COPY_DST = 1 << 4;
    }
}

/// A descriptor used to create a buffer.
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// A bitmask of flags describing the allowed usages of the buffer.
    pub usage: BufferUsage,
}

impl<'a> BufferDescriptor<'a> {
    /// Creates a descriptor for a rewritable buffer of `size` bytes.
    pub fn dynamic(label: &'a str, size: u64, usage: BufferUsage) -> Self {
        Self {
            label: Some(Cow::Borrowed(label)),
            size,
            usage: usage | BufferUsage::COPY_DST,
        }
    }

    /// Returns `true` if the buffer contents may change after creation.
    pub fn is_dynamic(&self) -> bool {
        self.usage.contains(BufferUsage::COPY_DST)
    }
}
