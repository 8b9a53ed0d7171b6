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

//! Assembly of staged data into a [`PreparedBuffer`].

use super::error::BatchError;
use super::optimizer::{MeshOptimizer, MeshView};
use super::quad_index::{IndexByteBuffer, QuadIndexCache, QUAD_INDEX_COUNT, QUAD_VERTEX_COUNT};
use std::collections::BTreeMap;
use std::rc::Rc;
use tessera_core::batch::{DrawBatch, DrawBatchDataHolder, StagedVertices};
use tessera_core::renderer::api::{BatchSettings, DrawCommand, IndexFormat};

/// Staged, CPU-resident data ready for upload.
///
/// Produced by [`BatchContext::prepare`](super::BatchContext::prepare) and
/// consumed by exactly one upload.
#[derive(Debug)]
pub struct PreparedBuffer {
    pub(crate) batch: Rc<DrawBatch>,
    pub(crate) vertex_data: Vec<u8>,
    pub(crate) vertex_count: u32,
    pub(crate) instance_data: Option<Vec<u8>>,
    pub(crate) index_data: Option<IndexByteBuffer>,
    pub(crate) shader_data: BTreeMap<String, Vec<u8>>,
    pub(crate) draw_commands: Vec<DrawCommand>,
}

impl PreparedBuffer {
    /// The batch the data belongs to.
    pub fn batch(&self) -> &Rc<DrawBatch> {
        &self.batch
    }

    /// The packed vertices.
    pub fn vertex_data(&self) -> &[u8] {
        &self.vertex_data
    }

    /// The number of vertices in [`vertex_data`](Self::vertex_data).
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// The packed instances, for instanced batches.
    pub fn instance_data(&self) -> Option<&[u8]> {
        self.instance_data.as_deref()
    }

    /// The index data, for indexed draws.
    pub fn index_data(&self) -> Option<&IndexByteBuffer> {
        self.index_data.as_ref()
    }

    /// The shader storage blocks by name.
    pub fn shader_data(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.shader_data
    }

    /// The draw commands, in submission order.
    pub fn draw_commands(&self) -> &[DrawCommand] {
        &self.draw_commands
    }
}

/// What assembly may touch besides its inputs.
pub(crate) struct AssemblyContext<'a> {
    pub quad_cache: &'a mut QuadIndexCache,
    pub optimizer: Option<&'a dyn MeshOptimizer>,
    pub settings: &'a BatchSettings,
}

pub(crate) fn assemble(
    cx: AssemblyContext<'_>,
    batch: &Rc<DrawBatch>,
    data: DrawBatchDataHolder,
    optimize: bool,
) -> Result<PreparedBuffer, BatchError> {
    let mode = batch.draw_mode;
    let DrawBatchDataHolder {
        vertices,
        indices,
        instances,
        shader_data,
    } = data;

    let StagedVertices {
        bytes: mut vertex_data,
        mut vertex_count,
        connected_primitives,
    } = vertices.finish();
    if vertex_count == 0 && !vertex_data.is_empty() {
        return Err(BatchError::mismatch(
            "vertex bytes were written but no vertex was completed; missing end_vertex()?",
        ));
    }
    if let Some(boundaries) = &connected_primitives {
        validate_boundaries(boundaries, vertex_count)?;
    }

    let (instance_data, instance_count) = match (&batch.instance_layout, instances) {
        (Some(_), Some(holder)) => {
            let staged = holder.finish();
            if staged.vertex_count == 0 && !staged.bytes.is_empty() {
                return Err(BatchError::mismatch(
                    "instance bytes were written but no instance was completed; missing end_vertex()?",
                ));
            }
            (Some(staged.bytes), staged.vertex_count)
        }
        (Some(_), None) => {
            return Err(BatchError::mismatch(
                "batch declares an instance layout but no instance data was provided",
            ))
        }
        (None, Some(_)) => {
            return Err(BatchError::mismatch(
                "batch has no instance layout but instance data was provided",
            ))
        }
        (None, None) => (None, 1),
    };

    let mut total_count = vertex_count;
    let mut index_data = if mode.is_indexed() {
        match indices {
            Some(holder) => {
                let staged = holder.finish();
                if staged.index_count == 0 && !staged.bytes.is_empty() {
                    return Err(BatchError::mismatch(
                        "index bytes were written but the index count is 0",
                    ));
                }
                total_count = staged.index_count;
                Some(IndexByteBuffer::Owned {
                    format: staged.format,
                    bytes: staged.bytes,
                })
            }
            None if mode.is_quads() => {
                let quad_count = vertex_count / QUAD_VERTEX_COUNT;
                total_count = quad_count * QUAD_INDEX_COUNT;
                if optimize {
                    Some(IndexByteBuffer::Owned {
                        format: IndexFormat::Uint32,
                        bytes: QuadIndexCache::create_index_data(quad_count),
                    })
                } else {
                    Some(IndexByteBuffer::SharedQuads { quad_count })
                }
            }
            None => {
                return Err(BatchError::mismatch(format!(
                    "draw mode {} uses indexed drawing but no index data was provided",
                    mode.name
                )))
            }
        }
    } else if indices.is_some() {
        return Err(BatchError::mismatch(format!(
            "draw mode {} does not use indexed drawing but index data was provided",
            mode.name
        )));
    } else {
        None
    };

    if optimize && connected_primitives.is_none() && mode.topology.is_triangle_list() {
        let optimizer = cx.optimizer.ok_or_else(|| {
            BatchError::CapabilityMissing("mesh optimization requested but no optimizer is installed".into())
        })?;

        let source_indices = match &index_data {
            Some(index) if index.format() != IndexFormat::Uint32 => {
                return Err(BatchError::precondition(
                    "optimizing a mesh requires 32-bit indices",
                ))
            }
            Some(IndexByteBuffer::Owned { bytes, .. }) => {
                if bytes.len() != total_count as usize * 4 {
                    return Err(BatchError::mismatch(format!(
                        "{} index bytes do not hold {} 32-bit indices",
                        bytes.len(),
                        total_count
                    )));
                }
                Some(bytemuck::pod_collect_to_vec::<u8, u32>(bytes))
            }
            Some(IndexByteBuffer::SharedQuads { quad_count }) => Some(bytemuck::pod_collect_to_vec::<u8, u32>(
                &QuadIndexCache::create_index_data(*quad_count),
            )),
            None => None,
        };

        let optimized = optimizer.optimize(
            MeshView {
                vertices: &vertex_data,
                vertex_count: vertex_count as usize,
                stride: batch.vertex_layout.stride(),
                indices: source_indices.as_deref(),
            },
            cx.settings,
        )?;

        vertex_data = optimized.vertices;
        vertex_count = optimized.vertex_count as u32;
        total_count = optimized.indices.len() as u32;
        index_data = Some(IndexByteBuffer::Owned {
            format: IndexFormat::Uint32,
            bytes: bytemuck::cast_slice(&optimized.indices).to_vec(),
        });
    }

    let shader_data = shader_data
        .into_iter()
        .map(|(name, holder)| (name, holder.finish()))
        .collect();

    let draw_commands = build_commands(
        batch,
        index_data.is_some(),
        connected_primitives,
        total_count,
        instance_count,
    )?;

    // Grown last so that a rejected batch leaves the shared indices alone.
    if let Some(IndexByteBuffer::SharedQuads { quad_count }) = &index_data {
        cx.quad_cache.ensure_size(*quad_count);
    }

    log::trace!(
        "BatchLane: prepared {} ({} vertices, {} commands)",
        mode.name,
        vertex_count,
        draw_commands.len()
    );

    Ok(PreparedBuffer {
        batch: Rc::clone(batch),
        vertex_data,
        vertex_count,
        instance_data,
        index_data,
        shader_data,
        draw_commands,
    })
}

fn validate_boundaries(boundaries: &[u32], vertex_count: u32) -> Result<(), BatchError> {
    if vertex_count > 0 && boundaries.first() != Some(&0) {
        return Err(BatchError::mismatch(
            "the first connected primitive must start at vertex 0",
        ));
    }
    if boundaries.windows(2).any(|w| w[0] > w[1]) {
        return Err(BatchError::mismatch(
            "connected primitive boundaries must be non-decreasing",
        ));
    }
    if boundaries.last().is_some_and(|&last| last > vertex_count) {
        return Err(BatchError::mismatch(format!(
            "connected primitive boundaries exceed the vertex count of {vertex_count}"
        )));
    }
    Ok(())
}

fn build_commands(
    batch: &DrawBatch,
    indexed: bool,
    connected_primitives: Option<Vec<u32>>,
    total_count: u32,
    instance_count: u32,
) -> Result<Vec<DrawCommand>, BatchError> {
    let mode = batch.draw_mode;
    if indexed && mode.uses_connected_primitives() {
        return Err(BatchError::unsupported(format!(
            "draw mode {} uses connected primitives, which cannot be drawn indexed",
            mode.name
        )));
    }

    match (mode.uses_connected_primitives(), connected_primitives) {
        (true, Some(boundaries)) => Ok(boundaries
            .windows(2)
            .map(|run| DrawCommand::Arrays {
                vertex_count: run[1] - run[0],
                instance_count,
                first_vertex: run[0],
                base_instance: 0,
            })
            .collect()),
        (true, None) => Err(BatchError::mismatch(format!(
            "draw mode {} uses connected primitives but no boundaries were provided",
            mode.name
        ))),
        (false, Some(_)) => Err(BatchError::mismatch(format!(
            "draw mode {} does not use connected primitives but boundaries were provided",
            mode.name
        ))),
        (false, None) if indexed => Ok(vec![DrawCommand::elements(total_count, instance_count, 0)]),
        (false, None) => Ok(vec![DrawCommand::arrays(total_count, instance_count, 0)]),
    }
}
