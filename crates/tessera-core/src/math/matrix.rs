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

use std::ops::Mul;

/// A 4x4 column-major matrix, used for the per-batch model transform.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[3]` holds the translation.
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a translation matrix.
    #[inline]
    pub fn from_translation(t: [f32; 3]) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = [t[0], t[1], t[2], 1.0];
        m
    }

    /// Creates a non-uniform scaling matrix.
    #[inline]
    pub fn from_scale(s: [f32; 3]) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = s[0];
        m.cols[1][1] = s[1];
        m.cols[2][2] = s[2];
        m
    }

    /// Returns `true` if every element equals the identity exactly.
    ///
    /// Exact comparison: a transform that only approximates the identity
    /// still gets uploaded.
    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Returns the matrix as a flat column-major array, ready for upload.
    #[inline]
    pub fn to_cols_array(&self) -> [f32; 16] {
        bytemuck::cast(self.cols)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut out = [[0.0f32; 4]; 4];
        for (c, out_col) in out.iter_mut().enumerate() {
            for (r, value) in out_col.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.cols[k][r] * rhs.cols[c][k]).sum();
            }
        }
        Self { cols: out }
    }
}
