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

use std::rc::Rc;
use tessera_core::batch::{DrawBatch, DrawBatchDataHolder};
use tessera_core::renderer::api::*;
use tessera_lanes::batch_lane::IndexByteBuffer;
use tessera_lanes::{BatchContext, BatchError};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn position_layout() -> VertexLayout {
    VertexLayout::default().with(VertexFormat::Float32x3)
}

fn push_position(data: &mut DrawBatchDataHolder, [x, y, z]: [f32; 3]) {
    data.vertices().builder().put_f32(x).put_f32(y).put_f32(z);
    data.vertices().end_vertex();
}

fn quad_data(quads: u32) -> DrawBatchDataHolder {
    let mut data = DrawBatchDataHolder::new();
    for quad in 0..quads {
        let x = quad as f32;
        for corner in [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]] {
            push_position(&mut data, [x + corner[0], corner[1], 0.0]);
        }
    }
    data
}

fn context() -> BatchContext {
    BatchContext::without_optimizer(BatchSettings::default())
}

#[test]
fn test_explicit_indices_span_the_index_count() {
    // --- 1. ARRANGE ---
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::INDEXED_TRIANGLES, position_layout()));
    let mut data = DrawBatchDataHolder::new();
    for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]] {
        push_position(&mut data, p);
    }
    data.indices().put_triangle(0, 1, 2);
    data.indices().put_triangle(2, 3, 0);
    data.indices().put_triangle(0, 2, 3);

    // --- 2. ACT ---
    let prepared = context.prepare(&batch, data, false).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(prepared.vertex_count(), 4);
    assert_eq!(prepared.draw_commands(), &[DrawCommand::elements(9, 1, 0)]);
    match prepared.index_data() {
        Some(IndexByteBuffer::Owned { format, bytes }) => {
            assert_eq!(*format, IndexFormat::Uint32);
            assert_eq!(bytes.len(), 9 * 4);
        }
        other => panic!("expected owned indices, got {other:?}"),
    }
}

#[test]
fn test_quads_alias_the_shared_cache_and_grow_it() {
    // --- 1. ARRANGE ---
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::QUADS, position_layout()));

    // --- 2. ACT ---
    let first = context.prepare(&batch, quad_data(10), false).unwrap();
    let size_after_first = context.quad_index_cache().shared_data().len();
    let second = context.prepare(&batch, quad_data(20), false).unwrap();
    let size_after_second = context.quad_index_cache().shared_data().len();

    // --- 3. ASSERT ---
    assert_eq!(
        first.index_data(),
        Some(&IndexByteBuffer::SharedQuads { quad_count: 10 })
    );
    assert_eq!(
        second.index_data(),
        Some(&IndexByteBuffer::SharedQuads { quad_count: 20 })
    );
    assert!(size_after_second >= size_after_first);
    assert_eq!(size_after_second, 20 * 6 * 4);
    assert_eq!(second.draw_commands(), &[DrawCommand::elements(120, 1, 0)]);
}

#[test]
fn test_smaller_quad_batches_do_not_shrink_the_cache() {
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::QUADS, position_layout()));

    context.prepare(&batch, quad_data(8), false).unwrap();
    let small = context.prepare(&batch, quad_data(2), false).unwrap();

    assert_eq!(context.quad_index_cache().quad_capacity(), 8);
    assert_eq!(small.draw_commands(), &[DrawCommand::elements(12, 1, 0)]);
}

#[test]
fn test_connected_runs_become_one_arrays_command_each() {
    // --- 1. ARRANGE ---
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::CONNECTED_LINE_STRIP, position_layout()));
    let mut data = DrawBatchDataHolder::new();
    for run_length in [3, 2, 4] {
        data.vertices().begin_connected_primitive();
        for i in 0..run_length {
            push_position(&mut data, [i as f32, 0.0, 0.0]);
        }
    }

    // --- 2. ACT ---
    let prepared = context.prepare(&batch, data, false).unwrap();

    // --- 3. ASSERT ---
    let commands = prepared.draw_commands();
    assert_eq!(commands.len(), 3);
    assert!(commands.iter().all(|c| !c.is_indexed()));
    assert_eq!(commands.iter().map(DrawCommand::count).sum::<u32>(), 9);

    let mut expected_first = 0;
    for command in commands {
        let DrawCommand::Arrays { first_vertex, vertex_count, .. } = *command else {
            panic!("expected an arrays command, got {command:?}");
        };
        assert_eq!(first_vertex, expected_first);
        expected_first = first_vertex + vertex_count;
    }
}

#[test]
fn test_rejected_quad_batch_leaves_the_shared_cache_alone() {
    // --- 1. ARRANGE ---
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::QUADS, position_layout()));
    let mut data = DrawBatchDataHolder::new();
    data.vertices().begin_connected_primitive();
    for i in 0..400 {
        push_position(&mut data, [i as f32, 0.0, 0.0]);
    }

    // --- 2. ACT ---
    let result = context.prepare(&batch, data, false);

    // --- 3. ASSERT ---
    assert!(matches!(result, Err(BatchError::DataMismatch(_))));
    assert_eq!(context.stats().quad_capacity, 0);
    assert!(context.quad_index_cache().shared_data().is_empty());
}

#[test]
fn test_vertices_before_the_first_run_are_a_mismatch() {
    // --- 1. ARRANGE ---
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::CONNECTED_LINE_STRIP, position_layout()));
    let mut data = DrawBatchDataHolder::new();
    push_position(&mut data, [0.0, 0.0, 0.0]);
    push_position(&mut data, [1.0, 0.0, 0.0]);
    data.vertices().begin_connected_primitive();
    for i in 0..3 {
        push_position(&mut data, [i as f32, 1.0, 0.0]);
    }

    // --- 2. ACT ---
    let result = context.prepare(&batch, data, false);

    // --- 3. ASSERT ---
    assert!(matches!(result, Err(BatchError::DataMismatch(_))));
}

#[test]
fn test_indexed_mode_without_indices_is_a_mismatch() {
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::INDEXED_TRIANGLES, position_layout()));
    let mut data = DrawBatchDataHolder::new();
    push_position(&mut data, [0.0, 0.0, 0.0]);

    let result = context.prepare(&batch, data, false);

    assert!(matches!(result, Err(BatchError::DataMismatch(_))));
}

#[test]
fn test_indices_for_a_non_indexed_mode_are_a_mismatch() {
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::TRIANGLES, position_layout()));
    let mut data = DrawBatchDataHolder::new();
    for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        push_position(&mut data, p);
    }
    data.indices().put_triangle(0, 1, 2);

    let result = context.prepare(&batch, data, false);

    assert!(matches!(result, Err(BatchError::DataMismatch(_))));
}

#[test]
fn test_vertex_bytes_without_a_completed_vertex_are_a_mismatch() {
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::TRIANGLES, position_layout()));
    let mut data = DrawBatchDataHolder::new();
    data.vertices().builder().put_f32(1.0);

    let result = context.prepare(&batch, data, false);

    assert!(matches!(result, Err(BatchError::DataMismatch(_))));
}

#[test]
fn test_instance_layout_and_data_must_agree() {
    // --- 1. ARRANGE ---
    init_logger();
    let mut context = context();
    let instanced = Rc::new(
        DrawBatch::new(DrawMode::TRIANGLES, position_layout())
            .with_instance_layout(VertexLayout::default().with(VertexFormat::Float32x4)),
    );
    let plain = Rc::new(DrawBatch::new(DrawMode::TRIANGLES, position_layout()));

    let mut with_instances = DrawBatchDataHolder::new();
    push_position(&mut with_instances, [0.0, 0.0, 0.0]);
    with_instances.instances().put_vertex(&[0; 16]);

    let mut without_instances = DrawBatchDataHolder::new();
    push_position(&mut without_instances, [0.0, 0.0, 0.0]);

    // --- 2. ACT ---
    let missing = context.prepare(&instanced, without_instances, false);
    let unexpected = context.prepare(&plain, with_instances, false);

    // --- 3. ASSERT ---
    assert!(matches!(missing, Err(BatchError::DataMismatch(_))));
    assert!(matches!(unexpected, Err(BatchError::DataMismatch(_))));
}

#[test]
fn test_instance_count_is_carried_into_every_command() {
    init_logger();
    let mut context = context();
    let batch = Rc::new(
        DrawBatch::new(DrawMode::TRIANGLES, position_layout())
            .with_instance_layout(VertexLayout::default().with(VertexFormat::Float32x2)),
    );
    let mut data = DrawBatchDataHolder::new();
    for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        push_position(&mut data, p);
    }
    for offset in 0..5 {
        data.instances().builder().put_f32(offset as f32).put_f32(0.0);
        data.instances().end_vertex();
    }

    let prepared = context.prepare(&batch, data, false).unwrap();

    assert_eq!(prepared.draw_commands(), &[DrawCommand::arrays(3, 5, 0)]);
    assert_eq!(prepared.instance_data().map(<[u8]>::len), Some(5 * 8));
}

#[test]
fn test_connected_runs_cannot_be_indexed() {
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::CONNECTED_TRIANGLE_STRIP, position_layout()));
    let mut data = DrawBatchDataHolder::new();
    data.vertices().begin_connected_primitive();
    for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        push_position(&mut data, p);
    }
    data.indices().put_triangle(0, 1, 2);

    let result = context.prepare(&batch, data, false);

    assert!(result.is_err());
}

#[test]
fn test_connected_mode_without_runs_is_a_mismatch() {
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::CONNECTED_LINE_LOOP, position_layout()));
    let mut data = DrawBatchDataHolder::new();
    push_position(&mut data, [0.0, 0.0, 0.0]);
    push_position(&mut data, [1.0, 0.0, 0.0]);

    let result = context.prepare(&batch, data, false);

    assert!(matches!(result, Err(BatchError::DataMismatch(_))));
}

#[test]
fn test_runs_past_the_vertex_count_are_a_mismatch() {
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::CONNECTED_LINE_STRIP, position_layout()));
    let mut data = DrawBatchDataHolder::new();
    push_position(&mut data, [0.0, 0.0, 0.0]);
    push_position(&mut data, [1.0, 0.0, 0.0]);
    data.vertices()
        .set_connected_primitive_boundaries(Some(vec![0, 2, 5]));

    let result = context.prepare(&batch, data, false);

    assert!(matches!(result, Err(BatchError::DataMismatch(_))));
}

#[test]
fn test_optimizing_without_an_optimizer_reports_the_missing_capability() {
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::TRIANGLES, position_layout()));
    let mut data = DrawBatchDataHolder::new();
    for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        push_position(&mut data, p);
    }

    let result = context.prepare(&batch, data, true);

    assert!(matches!(result, Err(BatchError::CapabilityMissing(_))));
}

#[test]
fn test_optimizing_a_line_batch_is_skipped() {
    init_logger();
    let mut context = context();
    let batch = Rc::new(DrawBatch::new(DrawMode::LINES, position_layout()));
    let mut data = DrawBatchDataHolder::new();
    push_position(&mut data, [0.0, 0.0, 0.0]);
    push_position(&mut data, [1.0, 0.0, 0.0]);

    let prepared = context.prepare(&batch, data, true).unwrap();

    assert!(prepared.index_data().is_none());
    assert_eq!(prepared.draw_commands(), &[DrawCommand::arrays(2, 1, 0)]);
}

#[cfg(feature = "mesh-optimizer")]
mod optimized {
    use super::*;
    use tessera_core::batch::IndexDataHolder;

    fn optimizing_context() -> BatchContext {
        BatchContext::new(BatchSettings::default())
    }

    fn sorted_vertices(bytes: &[u8], stride: usize) -> Vec<&[u8]> {
        let mut vertices: Vec<&[u8]> = bytes.chunks(stride).collect();
        vertices.sort();
        vertices
    }

    #[test]
    fn test_canonical_mesh_keeps_its_vertices() {
        // --- 1. ARRANGE ---
        init_logger();
        let mut context = optimizing_context();
        let batch = Rc::new(DrawBatch::new(DrawMode::INDEXED_TRIANGLES, position_layout()));
        let mut data = DrawBatchDataHolder::new();
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]] {
            push_position(&mut data, p);
        }
        data.indices().put_triangle(0, 1, 2);
        data.indices().put_triangle(2, 3, 0);
        let input = {
            let mut copy = DrawBatchDataHolder::new();
            for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]] {
                push_position(&mut copy, p);
            }
            copy.vertices.finish().bytes
        };

        // --- 2. ACT ---
        let prepared = context.prepare(&batch, data, true).unwrap();

        // --- 3. ASSERT ---
        assert_eq!(prepared.vertex_count(), 4);
        assert_eq!(
            sorted_vertices(prepared.vertex_data(), 12),
            sorted_vertices(&input, 12)
        );
        assert_eq!(prepared.draw_commands(), &[DrawCommand::elements(6, 1, 0)]);
    }

    #[test]
    fn test_duplicate_vertices_are_merged_into_an_indexed_draw() {
        // --- 1. ARRANGE ---
        init_logger();
        let mut context = optimizing_context();
        let batch = Rc::new(DrawBatch::new(DrawMode::TRIANGLES, position_layout()));
        let mut data = DrawBatchDataHolder::new();
        for p in [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0],
        ] {
            push_position(&mut data, p);
        }

        // --- 2. ACT ---
        let prepared = context.prepare(&batch, data, true).unwrap();

        // --- 3. ASSERT ---
        assert_eq!(prepared.vertex_count(), 4);
        assert_eq!(prepared.vertex_data().len(), 4 * 12);
        assert_eq!(prepared.draw_commands(), &[DrawCommand::elements(6, 1, 0)]);
        assert!(matches!(
            prepared.index_data(),
            Some(IndexByteBuffer::Owned { format: IndexFormat::Uint32, bytes }) if bytes.len() == 24
        ));
    }

    #[test]
    fn test_optimized_quads_get_private_indices() {
        init_logger();
        let mut context = optimizing_context();
        let batch = Rc::new(DrawBatch::new(DrawMode::QUADS, position_layout()));

        let prepared = context.prepare(&batch, quad_data(3), true).unwrap();

        assert_eq!(context.quad_index_cache().quad_capacity(), 0);
        assert!(matches!(prepared.index_data(), Some(IndexByteBuffer::Owned { .. })));
        assert_eq!(prepared.draw_commands(), &[DrawCommand::elements(18, 1, 0)]);
    }

    #[test]
    fn test_sixteen_bit_indices_cannot_be_optimized() {
        init_logger();
        let mut context = optimizing_context();
        let batch = Rc::new(DrawBatch::new(DrawMode::INDEXED_TRIANGLES, position_layout()));
        let mut data = DrawBatchDataHolder::new();
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            push_position(&mut data, p);
        }
        data.indices = Some(IndexDataHolder::with_format(IndexFormat::Uint16));
        data.indices().put_triangle(0, 1, 2);

        let result = context.prepare(&batch, data, true);

        assert!(matches!(result, Err(BatchError::OptimizationPrecondition(_))));
    }

    #[test]
    fn test_unreferenced_vertices_are_dropped() {
        init_logger();
        let mut context = optimizing_context();
        let batch = Rc::new(DrawBatch::new(DrawMode::INDEXED_TRIANGLES, position_layout()));
        let mut data = DrawBatchDataHolder::new();
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0, 5.0, 5.0]] {
            push_position(&mut data, p);
        }
        data.indices().put_triangle(0, 1, 2);

        let prepared = context.prepare(&batch, data, true).unwrap();

        assert_eq!(prepared.vertex_count(), 3);
        assert_eq!(prepared.draw_commands(), &[DrawCommand::elements(3, 1, 0)]);
    }
}
