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

//! Mesh optimization: vertex deduplication plus index and vertex reordering.
//!
//! The pipeline talks to an optimizer through the [`MeshOptimizer`] trait so
//! the capability can be absent, replaced or injected. With the
//! `mesh-optimizer` feature the crate ships [`NativeMeshOptimizer`], built
//! from the passes in this module, run in this order:
//!
//! 1. [`generate_vertex_remap`] maps duplicate vertices to one canonical slot.
//! 2. [`remap_index_buffer`] and [`remap_vertex_buffer`] apply the map.
//! 3. [`optimize_vertex_cache`] reorders triangles for post-transform cache hits.
//! 4. [`optimize_overdraw`] reorders clusters of triangles front-to-back.
//! 5. [`optimize_vertex_fetch`] reorders vertices into first-use order.

use super::error::BatchError;
use std::fmt;
use tessera_core::renderer::api::BatchSettings;

#[cfg(feature = "mesh-optimizer")]
mod overdraw;
#[cfg(feature = "mesh-optimizer")]
mod remap;
#[cfg(feature = "mesh-optimizer")]
mod vertex_cache;
#[cfg(feature = "mesh-optimizer")]
mod vertex_fetch;

#[cfg(feature = "mesh-optimizer")]
pub use self::overdraw::optimize_overdraw;
#[cfg(feature = "mesh-optimizer")]
pub use self::remap::{generate_vertex_remap, remap_index_buffer, remap_vertex_buffer};
#[cfg(feature = "mesh-optimizer")]
pub use self::vertex_cache::optimize_vertex_cache;
#[cfg(feature = "mesh-optimizer")]
pub use self::vertex_fetch::optimize_vertex_fetch;

/// A triangle list to optimize.
#[derive(Debug, Clone, Copy)]
pub struct MeshView<'a> {
    /// Packed vertices, `vertex_count * stride` bytes.
    pub vertices: &'a [u8],
    /// The number of vertices.
    pub vertex_count: usize,
    /// The byte size of one vertex.
    pub stride: usize,
    /// The triangle list, or `None` to draw vertices in order.
    pub indices: Option<&'a [u32]>,
}

impl MeshView<'_> {
    /// The number of indices the mesh draws.
    pub fn index_count(&self) -> usize {
        self.indices.map_or(self.vertex_count, <[u32]>::len)
    }
}

/// The result of an optimization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedMesh {
    /// Deduplicated vertices in fetch order.
    pub vertices: Vec<u8>,
    /// The number of vertices in `vertices`.
    pub vertex_count: usize,
    /// Reordered 32-bit indices, as many as the input drew.
    pub indices: Vec<u32>,
}

/// A CPU mesh optimizer.
pub trait MeshOptimizer: fmt::Debug {
    /// Returns a deduplicated, reordered copy of `mesh`.
    ///
    /// ## Errors
    /// * `BatchError::OptimizationPrecondition` - If the mesh is not a valid
    ///   triangle list or the passes leave a vertex unreferenced.
    fn optimize(&self, mesh: MeshView<'_>, settings: &BatchSettings) -> Result<OptimizedMesh, BatchError>;
}

/// The built-in optimizer.
#[cfg(feature = "mesh-optimizer")]
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeMeshOptimizer;

#[cfg(feature = "mesh-optimizer")]
impl NativeMeshOptimizer {
    fn validate(mesh: &MeshView<'_>) -> Result<(), BatchError> {
        if mesh.stride == 0 {
            return Err(BatchError::precondition("vertex layout has a stride of 0"));
        }
        if mesh.vertices.len() != mesh.vertex_count * mesh.stride {
            return Err(BatchError::precondition(format!(
                "{} bytes of vertex data do not hold {} vertices of {} bytes",
                mesh.vertices.len(),
                mesh.vertex_count,
                mesh.stride
            )));
        }
        if mesh.index_count() % 3 != 0 {
            return Err(BatchError::precondition(format!(
                "{} indices do not form a triangle list",
                mesh.index_count()
            )));
        }
        if let Some(indices) = mesh.indices {
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= mesh.vertex_count) {
                return Err(BatchError::precondition(format!(
                    "index {bad} is out of range for {} vertices",
                    mesh.vertex_count
                )));
            }
        }
        Ok(())
    }
}

#[cfg(feature = "mesh-optimizer")]
impl MeshOptimizer for NativeMeshOptimizer {
    fn optimize(&self, mesh: MeshView<'_>, settings: &BatchSettings) -> Result<OptimizedMesh, BatchError> {
        Self::validate(&mesh)?;
        let stride = mesh.stride;

        let (remap, unique_count) =
            generate_vertex_remap(mesh.vertices, mesh.vertex_count, stride, mesh.indices);
        let indices = remap_index_buffer(mesh.indices, mesh.index_count(), &remap);
        let vertices = remap_vertex_buffer(mesh.vertices, stride, &remap, unique_count);

        let indices = optimize_vertex_cache(&indices, unique_count);
        let mut indices = if stride >= 12 {
            let positions: Vec<[f32; 3]> = vertices
                .chunks_exact(stride)
                .map(|vertex| bytemuck::pod_read_unaligned(&vertex[..12]))
                .collect();
            optimize_overdraw(
                &indices,
                &positions,
                settings.vertex_cache_size,
                settings.overdraw_threshold,
            )
        } else {
            log::warn!(
                "MeshOptimizer: skipping overdraw pass, a {stride}-byte vertex cannot hold a position"
            );
            indices
        };

        let (vertices, used_count) = optimize_vertex_fetch(&mut indices, &vertices, stride);
        if used_count != unique_count {
            return Err(BatchError::precondition("mesh contains unused vertices"));
        }

        log::debug!(
            "MeshOptimizer: {} -> {} vertices, {} indices",
            mesh.vertex_count,
            used_count,
            indices.len()
        );
        Ok(OptimizedMesh {
            vertices,
            vertex_count: used_count,
            indices,
        })
    }
}

#[cfg(all(test, feature = "mesh-optimizer"))]
mod tests {
    use super::*;

    fn pack(positions: &[[f32; 3]]) -> Vec<u8> {
        bytemuck::cast_slice(positions).to_vec()
    }

    fn triangles_of(mesh: &OptimizedMesh) -> Vec<[[u32; 3]; 3]> {
        let positions: Vec<[f32; 3]> = bytemuck::pod_collect_to_vec(&mesh.vertices);
        let mut triangles: Vec<[[u32; 3]; 3]> = mesh
            .indices
            .chunks_exact(3)
            .map(|t| {
                let mut corners = [0, 1, 2].map(|k| positions[t[k] as usize].map(f32::to_bits));
                corners.sort();
                corners
            })
            .collect();
        triangles.sort();
        triangles
    }

    #[test]
    fn test_duplicate_vertices_are_merged() {
        // --- 1. ARRANGE ---
        let quad = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0],
        ];
        let vertices = pack(&quad);
        let mesh = MeshView {
            vertices: &vertices,
            vertex_count: 6,
            stride: 12,
            indices: None,
        };

        // --- 2. ACT ---
        let optimized = NativeMeshOptimizer
            .optimize(mesh, &BatchSettings::default())
            .unwrap();

        // --- 3. ASSERT ---
        assert_eq!(optimized.vertex_count, 4);
        assert_eq!(optimized.vertices.len(), 48);
        assert_eq!(optimized.indices.len(), 6);
        assert_eq!(optimized.indices[0], 0, "fetch order starts at the first used vertex");
    }

    #[test]
    fn test_triangles_survive_reordering() {
        let positions: Vec<[f32; 3]> = (0..12).map(|i| [i as f32, (i * i) as f32, 1.0]).collect();
        let vertices = pack(&positions);
        let indices: Vec<u32> = vec![0, 1, 2, 2, 1, 3, 4, 5, 6, 7, 8, 9, 9, 10, 11, 3, 4, 0];
        let mesh = MeshView {
            vertices: &vertices,
            vertex_count: 12,
            stride: 12,
            indices: Some(&indices),
        };
        let reference = OptimizedMesh {
            vertices: vertices.clone(),
            vertex_count: 12,
            indices: indices.clone(),
        };

        let optimized = NativeMeshOptimizer
            .optimize(mesh, &BatchSettings::default())
            .unwrap();

        assert_eq!(optimized.vertex_count, 12);
        assert_eq!(triangles_of(&optimized), triangles_of(&reference));
    }

    #[test]
    fn test_rejects_partial_triangles() {
        let vertices = pack(&[[0.0; 3]; 4]);
        let mesh = MeshView {
            vertices: &vertices,
            vertex_count: 4,
            stride: 12,
            indices: None,
        };
        let err = NativeMeshOptimizer
            .optimize(mesh, &BatchSettings::default())
            .unwrap_err();
        assert!(matches!(err, BatchError::OptimizationPrecondition(_)));
    }

    #[test]
    fn test_rejects_out_of_range_indices() {
        let vertices = pack(&[[0.0; 3]; 3]);
        let indices = [0, 1, 3];
        let mesh = MeshView {
            vertices: &vertices,
            vertex_count: 3,
            stride: 12,
            indices: Some(&indices),
        };
        assert!(NativeMeshOptimizer
            .optimize(mesh, &BatchSettings::default())
            .is_err());
    }

    #[test]
    fn test_short_vertices_skip_overdraw() {
        let vertices: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 1, 2];
        let mesh = MeshView {
            vertices: &vertices,
            vertex_count: 4,
            stride: 2,
            indices: Some(&[0, 1, 2, 2, 1, 3]),
        };
        let optimized = NativeMeshOptimizer
            .optimize(mesh, &BatchSettings::default())
            .unwrap();
        assert_eq!(optimized.vertex_count, 3);
        assert_eq!(optimized.indices.len(), 6);
    }
}
