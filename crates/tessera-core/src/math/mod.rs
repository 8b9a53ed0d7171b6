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

//! Minimal math types consumed by draw batches.
//!
//! Only what the batch pipeline uploads as uniforms lives here: a
//! column-major [`Mat4`] for the per-batch model matrix and a
//! [`LinearRgba`] for the global color modifier.

pub mod color;
pub mod matrix;

pub use color::LinearRgba;
pub use matrix::Mat4;

/// A small value used for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;
