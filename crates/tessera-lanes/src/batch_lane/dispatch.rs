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

use super::built::BuiltBuffer;
use super::context::BatchContext;
use super::error::BatchError;
use tessera_core::math::Mat4;
use tessera_core::renderer::api::{
    DrawArraysIndirectArgs, DrawCommand, DrawElementsIndirectArgs, Program, ProgramKind,
};
use tessera_core::renderer::{GraphicsDevice, ResourceError};

impl BatchContext {
    /// Draws `built` with `transform` as its model matrix.
    ///
    /// The batch's setup action runs first and its cleanup action last; the
    /// program is unbound before cleanup even if a draw failed. Regular
    /// programs receive the model matrix (skipped for the identity), the
    /// context's color modifier if one is set, and every shader storage
    /// buffer. Custom programs receive none of these.
    pub fn render(
        &self,
        device: &dyn GraphicsDevice,
        built: &BuiltBuffer,
        transform: &Mat4,
    ) -> Result<(), BatchError> {
        let commands = built.draw_commands();
        if commands.is_empty() {
            return Ok(());
        }
        if commands.len() > 1 && built.command_buffer().is_none() {
            return Err(BatchError::unsupported(format!(
                "{} draw commands require an indirect command buffer",
                commands.len()
            )));
        }

        let batch = built.batch();
        batch.run_setup(device);

        let program = batch.program;
        let mut result = match program {
            Some(program) => device
                .bind_program(program.id)
                .map_err(BatchError::from)
                .and_then(|()| self.apply_program_inputs(device, built, program, transform))
                .and_then(|()| self.submit(device, built)),
            None => self.submit(device, built),
        };

        if program.is_some() {
            if let Err(e) = device.unbind_program() {
                log::warn!("BatchLane: failed to unbind program: {e}");
                if result.is_ok() {
                    result = Err(e.into());
                }
            }
        }
        batch.run_cleanup(device);
        result
    }

    fn apply_program_inputs(
        &self,
        device: &dyn GraphicsDevice,
        built: &BuiltBuffer,
        program: Program,
        transform: &Mat4,
    ) -> Result<(), BatchError> {
        if program.kind != ProgramKind::Regular {
            return Ok(());
        }
        let settings = self.settings();
        if !transform.is_identity() {
            device.set_uniform_mat4(&settings.model_matrix_uniform, transform)?;
        }
        if let Some(color) = self.color_modifier() {
            device.set_uniform_color(&settings.color_modifier_uniform, color)?;
        }
        for (name, buffer) in built.shader_data() {
            device.bind_shader_storage_buffer(name, buffer.id())?;
        }
        Ok(())
    }

    fn submit(&self, device: &dyn GraphicsDevice, built: &BuiltBuffer) -> Result<(), BatchError> {
        let topology = built.batch().draw_mode.topology;
        let vertex_array = built.vertex_array();
        let commands = built.draw_commands();

        let submitted: Result<(), ResourceError> = match (commands, built.command_buffer()) {
            ([DrawCommand::Arrays {
                vertex_count,
                instance_count,
                first_vertex,
                base_instance,
            }], _) => device.draw_arrays(
                vertex_array,
                topology,
                DrawArraysIndirectArgs {
                    count: *vertex_count,
                    instance_count: *instance_count,
                    first: *first_vertex,
                    base_instance: *base_instance,
                },
            ),
            ([DrawCommand::Elements {
                index_count,
                instance_count,
                first_index,
                base_vertex,
                base_instance,
            }], _) => {
                let Some(index) = built.index() else {
                    return Err(BatchError::mismatch("indexed draw without an index buffer"));
                };
                device.draw_elements(
                    vertex_array,
                    topology,
                    index.format,
                    DrawElementsIndirectArgs {
                        count: *index_count,
                        instance_count: *instance_count,
                        first_index: *first_index,
                        base_vertex: *base_vertex,
                        base_instance: *base_instance,
                    },
                )
            }
            (_, Some(command_buffer)) => {
                let draw_count = commands.len() as u32;
                match built.index() {
                    Some(index) => device.draw_elements_indirect(
                        vertex_array,
                        topology,
                        index.format,
                        command_buffer.id(),
                        0,
                        draw_count,
                        0,
                    ),
                    None => device.draw_arrays_indirect(
                        vertex_array,
                        topology,
                        command_buffer.id(),
                        0,
                        draw_count,
                        0,
                    ),
                }
            }
            (_, None) => return Err(BatchError::unsupported("no command buffer to draw from")),
        };

        log::trace!(
            "BatchLane: submitted {} commands from {:?}",
            commands.len(),
            vertex_array
        );
        submitted.map_err(BatchError::from)
    }
}
