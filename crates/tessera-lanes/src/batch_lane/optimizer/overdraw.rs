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

//! Cluster reordering to reduce pixel overdraw.
//!
//! Triangles are split into clusters that each keep the vertex cache
//! efficiency of the input within `threshold`, then clusters are sorted so
//! those facing away from the mesh centre are drawn first.

type Vec3 = [f32; 3];

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// A FIFO post-transform cache simulated with per-vertex timestamps.
struct CacheSimulator {
    timestamps: Vec<u32>,
    timestamp: u32,
    size: u32,
}

impl CacheSimulator {
    fn new(vertex_count: usize, size: u32) -> Self {
        Self {
            timestamps: vec![0; vertex_count],
            timestamp: size + 1,
            size,
        }
    }

    /// Forgets everything cached.
    fn flush(&mut self) {
        self.timestamp += self.size + 1;
    }

    /// Feeds one triangle and returns how many of its vertices missed.
    fn triangle(&mut self, triangle: &[u32]) -> u32 {
        let mut misses = 0;
        for &v in triangle {
            let v = v as usize;
            if self.timestamp - self.timestamps[v] > self.size {
                self.timestamps[v] = self.timestamp;
                self.timestamp += 1;
                misses += 1;
            }
        }
        misses
    }
}

/// Splits at every triangle whose three vertices all miss, which usually
/// marks the start of a new patch of the mesh.
fn hard_boundaries(indices: &[u32], vertex_count: usize, cache_size: u32) -> Vec<usize> {
    let mut cache = CacheSimulator::new(vertex_count, cache_size);
    indices
        .chunks_exact(3)
        .enumerate()
        .filter_map(|(face, triangle)| {
            let misses = cache.triangle(triangle);
            (face == 0 || misses == 3).then_some(face)
        })
        .collect()
}

/// Subdivides each hard cluster wherever the running miss ratio drops to
/// `threshold` times the ratio of the whole cluster.
fn soft_boundaries(
    indices: &[u32],
    vertex_count: usize,
    clusters: &[usize],
    cache_size: u32,
    threshold: f32,
) -> Vec<usize> {
    let face_count = indices.len() / 3;
    let mut cache = CacheSimulator::new(vertex_count, cache_size);
    let mut result = Vec::with_capacity(clusters.len());

    for (i, &start) in clusters.iter().enumerate() {
        let end = clusters.get(i + 1).copied().unwrap_or(face_count);

        cache.flush();
        let cluster_misses: u32 = (start..end)
            .map(|face| cache.triangle(&indices[face * 3..face * 3 + 3]))
            .sum();
        let cluster_threshold = threshold * (cluster_misses as f32 / (end - start) as f32);

        let first = result.len();
        result.push(start);
        cache.flush();

        let mut running_misses = 0u32;
        let mut running_faces = 0u32;
        for face in start..end {
            running_misses += cache.triangle(&indices[face * 3..face * 3 + 3]);
            running_faces += 1;
            if running_misses as f32 / running_faces as f32 <= cluster_threshold {
                result.push(face + 1);
                cache.flush();
                running_misses = 0;
                running_faces = 0;
            }
        }

        // The tail of a cluster is usually a poor fit on its own; fold it
        // into the previous split.
        if result.len() - 1 > first {
            result.pop();
        }
    }

    result
}

/// Returns `indices` with its triangles grouped and reordered to reduce
/// overdraw, keeping cache efficiency within `threshold` (`1.05` = 5% worse).
///
/// `positions` holds one position per vertex.
pub fn optimize_overdraw(
    indices: &[u32],
    positions: &[[f32; 3]],
    cache_size: u32,
    threshold: f32,
) -> Vec<u32> {
    let face_count = indices.len() / 3;
    if face_count == 0 {
        return indices.to_vec();
    }
    let vertex_count = positions.len();

    let hard = hard_boundaries(indices, vertex_count, cache_size);
    let clusters = soft_boundaries(indices, vertex_count, &hard, cache_size, threshold);

    let mesh_centroid = {
        let mut sum = [0.0f32; 3];
        for &v in indices {
            let p = positions[v as usize];
            sum = [sum[0] + p[0], sum[1] + p[1], sum[2] + p[2]];
        }
        let inv = 1.0 / indices.len() as f32;
        [sum[0] * inv, sum[1] * inv, sum[2] * inv]
    };

    let ranges: Vec<(usize, usize)> = clusters
        .iter()
        .enumerate()
        .map(|(i, &start)| (start, clusters.get(i + 1).copied().unwrap_or(face_count)))
        .collect();

    let sort_keys: Vec<f32> = ranges
        .iter()
        .map(|&(start, end)| {
            let mut area = 0.0f32;
            let mut centroid = [0.0f32; 3];
            let mut normal = [0.0f32; 3];
            for face in start..end {
                let p0 = positions[indices[face * 3] as usize];
                let p1 = positions[indices[face * 3 + 1] as usize];
                let p2 = positions[indices[face * 3 + 2] as usize];
                let n = cross(sub(p1, p0), sub(p2, p0));
                let face_area = dot(n, n).sqrt();
                for k in 0..3 {
                    centroid[k] += (p0[k] + p1[k] + p2[k]) * (face_area / 3.0);
                    normal[k] += n[k];
                }
                area += face_area;
            }
            let inv_area = if area > 0.0 { 1.0 / area } else { 0.0 };
            let centroid = centroid.map(|c| c * inv_area);
            let length = dot(normal, normal).sqrt();
            let inv_length = if length > 0.0 { 1.0 / length } else { 0.0 };
            let normal = normal.map(|n| n * inv_length);
            dot(sub(centroid, mesh_centroid), normal)
        })
        .collect();

    let mut order: Vec<usize> = (0..ranges.len()).collect();
    order.sort_by(|&a, &b| sort_keys[b].total_cmp(&sort_keys[a]));

    let mut output = Vec::with_capacity(indices.len());
    for cluster in order {
        let (start, end) = ranges[cluster];
        output.extend_from_slice(&indices[start * 3..end * 3]);
    }
    output
}
