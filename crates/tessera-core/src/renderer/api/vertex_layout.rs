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

use super::enums::VertexFormat;

/// One attribute of a packed vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// The data type of the attribute.
    pub format: VertexFormat,
    /// Whether integer data is normalized to `[0, 1]` or `[-1, 1]` on fetch.
    pub normalized: bool,
}

/// An ordered list of tightly packed vertex attributes.
///
/// Layouts are compared by value, so two batches that describe the same
/// attributes share one vertex-array binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Creates a layout from its attributes.
    pub fn new(attributes: Vec<VertexAttribute>) -> Self {
        Self { attributes }
    }

    /// Appends a non-normalized attribute.
    pub fn with(mut self, format: VertexFormat) -> Self {
        self.attributes.push(VertexAttribute {
            format,
            normalized: false,
        });
        self
    }

    /// Appends a normalized attribute.
    pub fn with_normalized(mut self, format: VertexFormat) -> Self {
        self.attributes.push(VertexAttribute {
            format,
            normalized: true,
        });
        self
    }

    /// The attributes, in shader location order.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// The number of attributes, which is also the number of attribute slots used.
    pub fn attribute_count(&self) -> u32 {
        self.attributes.len() as u32
    }

    /// The packed byte size of one vertex.
    pub fn stride(&self) -> usize {
        self.attributes.iter().map(|a| a.format.size()).sum()
    }

    /// Returns the byte offset of each attribute within a vertex.
    pub fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.attributes.iter().scan(0usize, |offset, attribute| {
            let current = *offset;
            *offset += attribute.format.size();
            Some(current)
        })
    }
}
