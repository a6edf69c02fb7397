// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
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

//! Layer compositor
//!
//! Produces the visible frame from the layer pixmaps once per video frame.
//!
//! # Composition Order
//!
//! ```text
//! background  →  bank 0 (layers 0-3, priority_index)  →  bank 1 (layers 4-7, priority_index2)
//! ```
//!
//! Within a bank the four layers are drawn in the order given by
//! [`PRIORITY_ORDER`], so the last entry of a permutation ends up on top.

use super::rasterizer::LayerPixmap;
use super::registers::{LayerControl, RegisterFile};
use super::types::{Frame, MAX_LAYERS};

/// Draw order of the four layers of a bank, bottom first, indexed by priority
pub const PRIORITY_ORDER: [[usize; 4]; 24] = [
    [3, 2, 1, 0],
    [2, 3, 1, 0],
    [3, 1, 2, 0],
    [1, 3, 2, 0],
    [2, 1, 3, 0],
    [1, 2, 3, 0],
    [3, 2, 0, 1],
    [2, 3, 0, 1],
    [3, 0, 2, 1],
    [0, 3, 2, 1],
    [2, 0, 3, 1],
    [0, 2, 3, 1],
    [3, 1, 0, 2],
    [1, 3, 0, 2],
    [3, 0, 1, 2],
    [0, 3, 1, 2],
    [1, 0, 3, 2],
    [0, 1, 3, 2],
    [2, 1, 0, 3],
    [1, 2, 0, 3],
    [2, 0, 1, 3],
    [0, 2, 1, 3],
    [1, 0, 2, 3],
    [0, 1, 2, 3],
];

/// Frame compositor
///
/// Holds only the output geometry; all compositing state lives in the
/// register file so it can be saved with the rest of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerCompositor {
    width: usize,
    height: usize,
    layer_count: usize,
}

impl LayerCompositor {
    /// Create a compositor
    ///
    /// # Arguments
    ///
    /// * `width`, `height` - Visible frame size
    /// * `layer_count` - 4 or 8; eight-layer boards composite a second bank
    pub fn new(width: usize, height: usize, layer_count: usize) -> Self {
        Self {
            width,
            height,
            layer_count,
        }
    }

    /// Visible frame width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Visible frame height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the second bank (layers 4-7) is composited
    pub fn has_second_bank(&self) -> bool {
        self.layer_count > 4
    }

    /// Permutation for a priority register value
    ///
    /// Values past the table (24-31) are not valid permutations; they are
    /// reported and treated as 0.
    pub fn priority_order(priority: u8) -> &'static [usize; 4] {
        match PRIORITY_ORDER.get(usize::from(priority)) {
            Some(order) => order,
            None => {
                log::warn!("Blitter: invalid layer priority {:02X}, using 0", priority);
                &PRIORITY_ORDER[0]
            }
        }
    }

    /// Palette index used where no layer is opaque
    pub fn background(&self, regs: &RegisterFile) -> u16 {
        if self.has_second_bank() {
            u16::from(regs.bg_color) | (u16::from(regs.bg_color2) << 8)
        } else {
            u16::from(regs.bg_color)
        }
    }

    /// Composite all enabled layers into a new frame
    ///
    /// # Arguments
    ///
    /// * `layers` - Layer pixmaps
    /// * `regs` - Scroll, palette, transparency, priority and enable state
    /// * `suppress` - Layers to hide for this frame only (bit n hides layer n)
    ///
    /// # Returns
    ///
    /// Frame of palette indices
    pub fn composite(
        &self,
        layers: &[LayerPixmap; MAX_LAYERS],
        regs: &RegisterFile,
        suppress: u8,
    ) -> Frame {
        let mut frame = Frame::new(self.width, self.height, self.background(regs));

        let enable = regs.layer_enable_mask & !suppress & 0x0F;
        let order = Self::priority_order(regs.priority_index);
        self.draw_bank(&mut frame, layers, regs, 0, order, enable);

        if self.has_second_bank() {
            let enable2 = regs.layer_enable_mask2 & !(suppress >> 4) & 0x0F;
            let order2 = Self::priority_order(regs.priority_index2);
            self.draw_bank(&mut frame, layers, regs, 4, order2, enable2);
        }

        frame
    }

    fn draw_bank(
        &self,
        frame: &mut Frame,
        layers: &[LayerPixmap; MAX_LAYERS],
        regs: &RegisterFile,
        base: usize,
        order: &[usize; 4],
        enable: u8,
    ) {
        for &slot in order {
            if enable & (1 << slot) != 0 {
                let id = base + slot;
                self.draw_layer(frame, &layers[id], &regs.layers[id]);
            }
        }
    }

    fn draw_layer(&self, frame: &mut Frame, layer: &LayerPixmap, ctrl: &LayerControl) {
        let tmask = ctrl.transparency_mask;
        // The pen is compared unmasked: a pen with bits outside the mask never matches
        let tpen = ctrl.transparency_pen;
        let pmask = ctrl.palette_mask;
        let base = ctrl.palette_base & !u16::from(pmask);

        for y in 0..self.height {
            let row = &mut frame.pixels[y * self.width..(y + 1) * self.width];
            let sy = y as i32 + ctrl.scroll_y;
            for (x, out) in row.iter_mut().enumerate() {
                let src = layer.get(x as i32 + ctrl.scroll_x, sy);
                if src & tmask == tpen {
                    continue;
                }
                *out = u16::from(src & pmask) | base;
            }
        }
    }
}
