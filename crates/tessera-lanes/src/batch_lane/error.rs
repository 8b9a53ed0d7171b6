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

use tessera_core::renderer::ResourceError;
use thiserror::Error;

/// Errors raised by the batch pipeline.
///
/// Every variant is a precondition violation detected synchronously by the
/// call that returns it; nothing is retried internally.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Staged vertex, index, instance or connected-primitive data disagrees
    /// with the batch configuration.
    #[error("data mismatch: {0}")]
    DataMismatch(String),

    /// A combination of features that cannot be drawn together.
    #[error("unsupported combination: {0}")]
    UnsupportedCombination(String),

    /// Mesh optimization was requested for data it cannot process.
    #[error("optimization precondition failed: {0}")]
    OptimizationPrecondition(String),

    /// A requested capability is not available in this context.
    #[error("capability missing: {0}")]
    CapabilityMissing(String),

    /// A device call failed.
    #[error("device error: {0}")]
    Device(#[from] ResourceError),
}

impl BatchError {
    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        BatchError::DataMismatch(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        BatchError::UnsupportedCombination(message.into())
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        BatchError::OptimizationPrecondition(message.into())
    }
}
