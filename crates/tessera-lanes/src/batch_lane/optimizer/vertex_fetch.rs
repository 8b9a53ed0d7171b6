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

use super::remap::UNUSED_VERTEX;

/// Reorders vertices into the order the indices first use them and rewrites
/// `indices` to match.
///
/// Vertices no index references are dropped. Returns the reordered vertices
/// and how many there are.
pub fn optimize_vertex_fetch(indices: &mut [u32], vertices: &[u8], stride: usize) -> (Vec<u8>, usize) {
    let vertex_count = vertices.len() / stride;
    let mut remap = vec![UNUSED_VERTEX; vertex_count];
    let mut output = Vec::with_capacity(vertices.len());
    let mut next_vertex = 0u32;

    for index in indices.iter_mut() {
        let v = *index as usize;
        if remap[v] == UNUSED_VERTEX {
            remap[v] = next_vertex;
            output.extend_from_slice(&vertices[v * stride..(v + 1) * stride]);
            next_vertex += 1;
        }
        *index = remap[v];
    }

    (output, next_vertex as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertices_follow_first_use() {
        let vertices = [10u8, 11, 12, 13];
        let mut indices = [2, 0, 2, 3];

        let (reordered, used) = optimize_vertex_fetch(&mut indices, &vertices, 1);

        assert_eq!(used, 3);
        assert_eq!(reordered, vec![12, 10, 13]);
        assert_eq!(indices, [0, 1, 0, 2]);
    }
}
