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

//! A reuse pool of CPU scratch byte buffers.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// Free list of scratch byte vectors used to pack indirect draw records.
#[derive(Debug, Clone, Default)]
pub struct BufferBuilderPool {
    free: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl BufferBuilderPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks out an empty scratch buffer, keeping the capacity of a
    /// previously returned one.
    pub fn borrow(&self) -> PooledBuilder {
        let bytes = self.free.borrow_mut().pop().unwrap_or_default();
        PooledBuilder {
            bytes,
            pool: Rc::clone(&self.free),
        }
    }

    /// The number of scratch buffers waiting for reuse.
    pub fn available(&self) -> usize {
        self.free.borrow().len()
    }
}

/// A scratch buffer checked out of a [`BufferBuilderPool`].
#[derive(Debug)]
pub struct PooledBuilder {
    bytes: Vec<u8>,
    pool: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl Deref for PooledBuilder {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.bytes
    }
}

impl DerefMut for PooledBuilder {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }
}

impl Drop for PooledBuilder {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.bytes);
        bytes.clear();
        self.pool.borrow_mut().push(bytes);
    }
}
