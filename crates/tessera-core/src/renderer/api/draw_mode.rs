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

//! Draw topology modes understood by the batch pipeline.

use super::enums::PrimitiveTopology;
use crate::tessera_bitflags;

tessera_bitflags! {
    /// Capabilities of a [`DrawMode`] that change how staged data is assembled.
    pub struct DrawModeFlags: u8 {
        /// Draws require an index buffer.
        const INDEXED = 1 << 0;
        /// The vertex stream holds several disjoint strips, loops or fans.
        const CONNECTED_PRIMITIVES = 1 << 1;
        /// Vertices come in groups of four that are triangulated with a shared index pattern.
        const QUADS = 1 << 2;
    }
}

/// A named pairing of a GPU primitive topology with assembly flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawMode {
    /// A human-readable name, used in diagnostics.
    pub name: &'static str,
    /// The topology the device draws with.
    pub topology: PrimitiveTopology,
    /// Assembly flags.
    pub flags: DrawModeFlags,
}

impl DrawMode {
    const fn plain(name: &'static str, topology: PrimitiveTopology) -> Self {
        Self {
            name,
            topology,
            flags: DrawModeFlags::EMPTY,
        }
    }

    const fn with_flags(name: &'static str, topology: PrimitiveTopology, flags: DrawModeFlags) -> Self {
        Self {
            name,
            topology,
            flags,
        }
    }

    /// Individual points.
    pub const POINTS: Self = Self::plain("POINTS", PrimitiveTopology::Points);
    /// Independent lines.
    pub const LINES: Self = Self::plain("LINES", PrimitiveTopology::Lines);
    /// A single line strip.
    pub const LINE_STRIP: Self = Self::plain("LINE_STRIP", PrimitiveTopology::LineStrip);
    /// A single closed line loop.
    pub const LINE_LOOP: Self = Self::plain("LINE_LOOP", PrimitiveTopology::LineLoop);
    /// Independent triangles.
    pub const TRIANGLES: Self = Self::plain("TRIANGLES", PrimitiveTopology::Triangles);
    /// A single triangle strip.
    pub const TRIANGLE_STRIP: Self = Self::plain("TRIANGLE_STRIP", PrimitiveTopology::TriangleStrip);
    /// A single triangle fan.
    pub const TRIANGLE_FAN: Self = Self::plain("TRIANGLE_FAN", PrimitiveTopology::TriangleFan);

    /// Indexed independent lines.
    pub const INDEXED_LINES: Self =
        Self::with_flags("INDEXED_LINES", PrimitiveTopology::Lines, DrawModeFlags::INDEXED);
    /// Indexed independent triangles.
    pub const INDEXED_TRIANGLES: Self = Self::with_flags(
        "INDEXED_TRIANGLES",
        PrimitiveTopology::Triangles,
        DrawModeFlags::INDEXED,
    );
    /// Quads, drawn as indexed triangles.
    pub const QUADS: Self = Self::with_flags(
        "QUADS",
        PrimitiveTopology::Triangles,
        DrawModeFlags::INDEXED.union(DrawModeFlags::QUADS),
    );

    /// Several line strips in one vertex stream.
    pub const CONNECTED_LINE_STRIP: Self = Self::with_flags(
        "CONNECTED_LINE_STRIP",
        PrimitiveTopology::LineStrip,
        DrawModeFlags::CONNECTED_PRIMITIVES,
    );
    /// Several line loops in one vertex stream.
    pub const CONNECTED_LINE_LOOP: Self = Self::with_flags(
        "CONNECTED_LINE_LOOP",
        PrimitiveTopology::LineLoop,
        DrawModeFlags::CONNECTED_PRIMITIVES,
    );
    /// Several triangle strips in one vertex stream.
    pub const CONNECTED_TRIANGLE_STRIP: Self = Self::with_flags(
        "CONNECTED_TRIANGLE_STRIP",
        PrimitiveTopology::TriangleStrip,
        DrawModeFlags::CONNECTED_PRIMITIVES,
    );
    /// Several triangle fans in one vertex stream.
    pub const CONNECTED_TRIANGLE_FAN: Self = Self::with_flags(
        "CONNECTED_TRIANGLE_FAN",
        PrimitiveTopology::TriangleFan,
        DrawModeFlags::CONNECTED_PRIMITIVES,
    );

    /// Returns `true` if draws in this mode need an index buffer.
    pub fn is_indexed(&self) -> bool {
        self.flags.contains(DrawModeFlags::INDEXED)
    }

    /// Returns `true` if the vertex stream is split into connected runs.
    pub fn uses_connected_primitives(&self) -> bool {
        self.flags.contains(DrawModeFlags::CONNECTED_PRIMITIVES)
    }

    /// Returns `true` if indices can be derived from the quad pattern.
    pub fn is_quads(&self) -> bool {
        self.flags.contains(DrawModeFlags::QUADS)
    }
}
