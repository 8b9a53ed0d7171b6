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

//! Defines the error type of the device contract.

use std::fmt;

/// An error related to the management of a GPU resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// A resource could not be found.
    NotFound,
    /// The handle used to reference a resource is invalid.
    InvalidHandle,
    /// A write or resize was attempted on a buffer created immutable.
    ImmutableBuffer,
    /// An access fell outside the bounds of a resource.
    OutOfBounds,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::ImmutableBuffer => {
                write!(f, "Attempted to modify an immutable buffer.")
            }
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}
