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

use crate::renderer::api::{DrawMode, Program, VertexLayout};
use crate::renderer::GraphicsDevice;
use std::fmt;

/// A side effect run immediately before or after a batch is drawn.
pub type BatchAction = Box<dyn Fn(&dyn GraphicsDevice)>;

/// An immutable description of how staged geometry is drawn.
///
/// The pipeline only ever reads a batch; it is shared by reference between
/// the prepared and built forms of the same geometry.
pub struct DrawBatch {
    /// The primitive topology and assembly flags.
    pub draw_mode: DrawMode,
    /// The per-vertex attribute layout.
    pub vertex_layout: VertexLayout,
    /// The per-instance attribute layout, for instanced batches.
    pub instance_layout: Option<VertexLayout>,
    /// The program bound around the draw.
    pub program: Option<Program>,
    setup_action: Option<BatchAction>,
    cleanup_action: Option<BatchAction>,
}

impl DrawBatch {
    /// Creates a batch without a program, instancing or actions.
    pub fn new(draw_mode: DrawMode, vertex_layout: VertexLayout) -> Self {
        Self {
            draw_mode,
            vertex_layout,
            instance_layout: None,
            program: None,
            setup_action: None,
            cleanup_action: None,
        }
    }

    /// Declares per-instance data with the given layout.
    pub fn with_instance_layout(mut self, layout: VertexLayout) -> Self {
        self.instance_layout = Some(layout);
        self
    }

    /// Binds `program` around the draw.
    pub fn with_program(mut self, program: Program) -> Self {
        self.program = Some(program);
        self
    }

    /// Runs `action` before the program is bound.
    pub fn with_setup_action(mut self, action: impl Fn(&dyn GraphicsDevice) + 'static) -> Self {
        self.setup_action = Some(Box::new(action));
        self
    }

    /// Runs `action` after the program is unbound.
    pub fn with_cleanup_action(mut self, action: impl Fn(&dyn GraphicsDevice) + 'static) -> Self {
        self.cleanup_action = Some(Box::new(action));
        self
    }

    /// Runs the setup action, if any.
    pub fn run_setup(&self, device: &dyn GraphicsDevice) {
        if let Some(action) = &self.setup_action {
            action(device);
        }
    }

    /// Runs the cleanup action, if any.
    pub fn run_cleanup(&self, device: &dyn GraphicsDevice) {
        if let Some(action) = &self.cleanup_action {
            action(device);
        }
    }
}

impl fmt::Debug for DrawBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawBatch")
            .field("draw_mode", &self.draw_mode.name)
            .field("vertex_layout", &self.vertex_layout)
            .field("instance_layout", &self.instance_layout)
            .field("program", &self.program)
            .field("setup_action", &self.setup_action.is_some())
            .field("cleanup_action", &self.cleanup_action.is_some())
            .finish()
    }
}
