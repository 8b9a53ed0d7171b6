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

use ahash::AHashMap;

/// Marks a vertex no index references.
pub const UNUSED_VERTEX: u32 = u32::MAX;

/// Builds a table mapping every vertex to a canonical slot shared by all
/// vertices with byte-identical contents.
///
/// Slots are assigned in first-reference order. Vertices never referenced by
/// `indices` map to [`UNUSED_VERTEX`]. Returns the table and the number of
/// unique vertices.
pub fn generate_vertex_remap(
    vertices: &[u8],
    vertex_count: usize,
    stride: usize,
    indices: Option<&[u32]>,
) -> (Vec<u32>, usize) {
    let mut remap = vec![UNUSED_VERTEX; vertex_count];
    let mut canonical: AHashMap<&[u8], u32> = AHashMap::with_capacity(vertex_count);
    let mut next_slot = 0u32;

    let mut visit = |index: usize| {
        if remap[index] != UNUSED_VERTEX {
            return;
        }
        let bytes = &vertices[index * stride..(index + 1) * stride];
        remap[index] = *canonical.entry(bytes).or_insert_with(|| {
            let slot = next_slot;
            next_slot += 1;
            slot
        });
    };

    match indices {
        Some(indices) => indices.iter().for_each(|&i| visit(i as usize)),
        None => (0..vertex_count).for_each(&mut visit),
    }

    (remap, next_slot as usize)
}

/// Rewrites `indices` through `remap`. Without indices, the identity list of
/// `index_count` vertices is remapped instead.
pub fn remap_index_buffer(indices: Option<&[u32]>, index_count: usize, remap: &[u32]) -> Vec<u32> {
    match indices {
        Some(indices) => indices.iter().map(|&i| remap[i as usize]).collect(),
        None => remap[..index_count].to_vec(),
    }
}

/// Compacts `vertices` into `unique_count` slots according to `remap`.
pub fn remap_vertex_buffer(vertices: &[u8], stride: usize, remap: &[u32], unique_count: usize) -> Vec<u8> {
    let mut out = vec![0u8; unique_count * stride];
    for (vertex, &slot) in vertices.chunks_exact(stride).zip(remap) {
        if slot != UNUSED_VERTEX {
            let start = slot as usize * stride;
            out[start..start + stride].copy_from_slice(vertex);
        }
    }
    out
}
