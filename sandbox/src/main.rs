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

// Tessera Sandbox
// Drives one headless frame through the batch pipeline

use std::rc::Rc;

use anyhow::Result;
use tessera_core::batch::{DrawBatch, DrawBatchDataHolder};
use tessera_core::math::{LinearRgba, Mat4};
use tessera_core::renderer::api::{
    BatchSettings, DrawMode, Program, ProgramId, VertexFormat, VertexLayout,
};
use tessera_infra::HeadlessDevice;
use tessera_lanes::BatchContext;

const SETTINGS: &str = r#"(
    overdraw_threshold: 1.05,
    growth_policy: PowerOfTwo,
)"#;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    color: [f32; 4],
}

impl Vertex {
    fn layout() -> VertexLayout {
        VertexLayout::default()
            .with(VertexFormat::Float32x3)
            .with(VertexFormat::Float32x4)
    }
}

fn sprite_quads(count: u32) -> DrawBatchDataHolder {
    let mut data = DrawBatchDataHolder::new();
    for i in 0..count {
        let x = i as f32 * 1.5;
        for [dx, dy] in [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]] {
            data.vertices().put_vertex(bytemuck::bytes_of(&Vertex {
                position: [x + dx, dy, 0.0],
                color: [1.0, 1.0, 1.0, 1.0],
            }));
        }
    }
    data
}

/// A flat grid staged as an unindexed triangle soup, so the optimizer has
/// duplicates to merge.
fn terrain_grid(size: u32) -> DrawBatchDataHolder {
    let mut data = DrawBatchDataHolder::new();
    let corner = |x: u32, z: u32| Vertex {
        position: [x as f32, 0.0, z as f32],
        color: [0.2, 0.6, 0.2, 1.0],
    };
    for z in 0..size {
        for x in 0..size {
            for (cx, cz) in [(x, z), (x + 1, z), (x + 1, z + 1), (x + 1, z + 1), (x, z + 1), (x, z)] {
                data.vertices().put_vertex(bytemuck::bytes_of(&corner(cx, cz)));
            }
        }
    }
    data
}

fn polylines(runs: &[u32]) -> DrawBatchDataHolder {
    let mut data = DrawBatchDataHolder::new();
    for (line, &length) in runs.iter().enumerate() {
        data.vertices().begin_connected_primitive();
        for i in 0..length {
            data.vertices().put_vertex(bytemuck::bytes_of(&Vertex {
                position: [i as f32, line as f32, 0.0],
                color: [1.0, 0.0, 0.0, 1.0],
            }));
        }
    }
    data
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = BatchSettings::from_ron_str(SETTINGS)?;
    let device = HeadlessDevice::new();
    let mut context = BatchContext::new(settings);
    let program = Program::regular(ProgramId(0));

    let sprites = Rc::new(DrawBatch::new(DrawMode::QUADS, Vertex::layout()).with_program(program));
    let lines = Rc::new(
        DrawBatch::new(DrawMode::CONNECTED_LINE_STRIP, Vertex::layout()).with_program(program),
    );
    let terrain = Rc::new(
        DrawBatch::new(DrawMode::TRIANGLES, Vertex::layout()).with_program(program),
    );

    // Long-lived geometry is optimized once and kept across frames.
    let optimize = context.has_mesh_optimizer();
    let prepared = context.prepare(&terrain, terrain_grid(8), optimize)?;
    log::info!(
        "Sandbox: terrain prepared with {} vertices",
        prepared.vertex_count()
    );
    let terrain_buffer = context.build_persistent(&device, prepared)?;

    for frame in 0..3u32 {
        context.set_color_modifier((frame == 1).then_some(LinearRgba::rgb(1.0, 0.8, 0.8)));

        context.render(&device, &terrain_buffer, &Mat4::IDENTITY)?;

        let prepared = context.prepare(&sprites, sprite_quads(16 * (frame + 1)), false)?;
        let built = context.build_transient(&device, prepared)?;
        context.render(&device, &built, &Mat4::from_translation([0.0, 2.0, 0.0]))?;
        context.release(&device, built)?;

        let prepared = context.prepare(&lines, polylines(&[4, 2, 7]), false)?;
        let built = context.build_transient(&device, prepared)?;
        context.render(&device, &built, &Mat4::IDENTITY)?;
        context.release(&device, built)?;

        log::info!(
            "Sandbox: frame {} issued {} draw calls",
            frame,
            device.draw_calls().len()
        );
        device.clear_calls();
    }

    log::info!("Sandbox: {:?}", context.stats());
    context.destroy_persistent(&device, terrain_buffer)?;
    context.reset(&device)?;
    log::info!(
        "Sandbox: {} buffers still alive after reset",
        device.live_buffer_count()
    );
    Ok(())
}
