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

//! Tunables of the batch pipeline.

use serde::{Deserialize, Serialize};

/// How a reusable buffer is resized when it is too small.
///
/// Buffers are never shrunk under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BufferGrowthPolicy {
    /// Reallocate to exactly the requested size.
    #[default]
    Exact,
    /// Reallocate to the next power of two at or above the requested size.
    PowerOfTwo,
}

impl BufferGrowthPolicy {
    /// Returns the allocation size for a request of `required` bytes.
    pub fn grown_size(&self, required: u64) -> u64 {
        match self {
            BufferGrowthPolicy::Exact => required,
            BufferGrowthPolicy::PowerOfTwo => required.max(1).next_power_of_two(),
        }
    }
}

/// Settings of a batch context, fixed for its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Cache-efficiency loss tolerated by the overdraw pass in exchange for
    /// better draw order. `1.05` allows a 5% worse ACMR.
    pub overdraw_threshold: f32,
    /// Size of the simulated post-transform cache used by the overdraw pass.
    pub vertex_cache_size: u32,
    /// Resize policy of pooled and cached buffers.
    pub growth_policy: BufferGrowthPolicy,
    /// Name of the model-matrix uniform of regular programs.
    pub model_matrix_uniform: String,
    /// Name of the color-modifier uniform of regular programs.
    pub color_modifier_uniform: String,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            overdraw_threshold: 1.05,
            vertex_cache_size: 16,
            growth_policy: BufferGrowthPolicy::Exact,
            model_matrix_uniform: "u_ModelMatrix".to_string(),
            color_modifier_uniform: "u_ColorModifier".to_string(),
        }
    }
}

impl BatchSettings {
    /// Parses settings from RON text. Missing fields take their default value.
    pub fn from_ron_str(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let settings = BatchSettings::from_ron_str("(overdraw_threshold: 1.2, growth_policy: PowerOfTwo)")
            .expect("valid settings");

        assert_eq!(settings.overdraw_threshold, 1.2);
        assert_eq!(settings.growth_policy, BufferGrowthPolicy::PowerOfTwo);
        assert_eq!(settings.vertex_cache_size, 16);
        assert_eq!(settings.model_matrix_uniform, "u_ModelMatrix");
    }

    #[test]
    fn test_malformed_ron_is_rejected() {
        assert!(BatchSettings::from_ron_str("(overdraw_threshold: \"high\")").is_err());
    }

    #[test]
    fn test_growth_policies() {
        assert_eq!(BufferGrowthPolicy::Exact.grown_size(100), 100);
        assert_eq!(BufferGrowthPolicy::PowerOfTwo.grown_size(100), 128);
        assert_eq!(BufferGrowthPolicy::PowerOfTwo.grown_size(128), 128);
        assert_eq!(BufferGrowthPolicy::PowerOfTwo.grown_size(0), 1);
    }
}
