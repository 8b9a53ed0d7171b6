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

use bytemuck::Pod;

/// A growable byte sink that packs vertex, index and storage data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferBuilder {
    bytes: Vec<u8>,
}

impl BufferBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty builder able to hold `capacity` bytes without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Appends a native-endian `f32`.
    pub fn put_f32(&mut self, value: f32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_ne_bytes());
        self
    }

    /// Appends a native-endian `u32`.
    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_ne_bytes());
        self
    }

    /// Appends a native-endian `u16`.
    pub fn put_u16(&mut self, value: u16) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_ne_bytes());
        self
    }

    /// Appends the raw bytes of any plain-old-data value.
    pub fn put_pod<T: Pod>(&mut self, value: &T) -> &mut Self {
        self.bytes.extend_from_slice(bytemuck::bytes_of(value));
        self
    }

    /// Appends raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// The number of bytes written so far.
    pub fn position(&self) -> usize {
        self.bytes.len()
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the builder and returns its bytes.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_packs_in_order() {
        let mut builder = BufferBuilder::new();
        builder.put_f32(1.0).put_u32(7).put_u16(2);

        assert_eq!(builder.position(), 10);
        let bytes = builder.finish();
        assert_eq!(&bytes[0..4], &1.0f32.to_ne_bytes());
        assert_eq!(&bytes[4..8], &7u32.to_ne_bytes());
        assert_eq!(&bytes[8..10], &2u16.to_ne_bytes());
    }

    #[test]
    fn test_put_pod_matches_manual_packing() {
        let mut a = BufferBuilder::new();
        a.put_pod(&[1.0f32, 2.0, 3.0]);
        let mut b = BufferBuilder::new();
        b.put_f32(1.0).put_f32(2.0).put_f32(3.0);
        assert_eq!(a, b);
    }
}
