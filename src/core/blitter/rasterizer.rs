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

//! Layer pixmaps and the pixel rasterizer
//!
//! Every pixel the blitter draws goes through [`Rasterizer::plot`]:
//!
//! 1. Exchange x and y when the swap flag is set
//! 2. Wrap both coordinates to the 512×512 layer
//! 3. Apply the clip window (each side of each axis is enabled separately)
//! 4. Store the pen into every layer selected by the destination mask
//!
//! The only operation that bypasses this path is the fill-to-end family
//! (`FillFromOrigin`, `FillBand`), which writes layer memory linearly with no
//! clipping, as the hardware does.

use super::decoder::{BitstreamDecoder, RunOp};
use super::registers::{ClipWindow, RegisterFile};
use super::types::{ClipControl, ClipMode, FlipFlags, LAYER_MASK, LAYER_SIZE, MAX_LAYERS};

/// Byte count of one layer pixmap
pub const LAYER_BYTES: usize = LAYER_SIZE * LAYER_SIZE;

/// One 512×512 indexed pixel layer
///
/// Coordinates wrap in both directions, so any `i32` pair addresses a pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPixmap {
    pixels: Vec<u8>,
}

impl LayerPixmap {
    /// Create a cleared layer
    pub fn new() -> Self {
        Self {
            pixels: vec![0; LAYER_BYTES],
        }
    }

    /// Rebuild a layer from a saved blob
    ///
    /// # Returns
    ///
    /// `None` if the blob is not exactly one layer in size
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        (bytes.len() == LAYER_BYTES).then_some(Self { pixels: bytes })
    }

    /// Zero every pixel
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    #[inline(always)]
    fn index(x: i32, y: i32) -> usize {
        ((y & LAYER_MASK) as usize) * LAYER_SIZE + (x & LAYER_MASK) as usize
    }

    /// Pen at (x, y), wrapped
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> u8 {
        self.pixels[Self::index(x, y)]
    }

    /// Store a pen at (x, y), wrapped
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, pen: u8) {
        self.pixels[Self::index(x, y)] = pen;
    }

    /// Row-major layer contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Fill from (x, y) to the last byte of the layer
    fn fill_to_end(&mut self, x: i32, y: i32, pen: u8) {
        let start = Self::index(x, y);
        self.pixels[start..].fill(pen);
    }

    /// Fill whole rows `first..end` (`end` at most 512)
    fn fill_rows(&mut self, first: usize, end: usize, pen: u8) {
        let end = end.min(LAYER_SIZE);
        if first < end {
            self.pixels[first * LAYER_SIZE..end * LAYER_SIZE].fill(pen);
        }
    }
}

impl Default for LayerPixmap {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-operation statistics, used for logging and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlitSummary {
    /// Pixels that passed the clip test
    pub plotted: u32,
    /// Pixels rejected by the clip test
    pub clipped: u32,
}

impl BlitSummary {
    #[inline]
    fn record(&mut self, accepted: bool) {
        if accepted {
            self.plotted += 1;
        } else {
            self.clipped += 1;
        }
    }
}

/// Pixel writer configured from a register snapshot
///
/// A rasterizer is built at the start of each blit and captures the clip
/// window, destination mask and swap flag, so registers written by the blit
/// itself (the cursor) do not change how later pixels of the same blit are
/// clipped or routed.
///
/// # Examples
///
/// ```
/// use dynablit::core::blitter::{ClipMode, LayerPixmap, Rasterizer, RegisterFile};
///
/// let mut layers: [LayerPixmap; 8] = Default::default();
/// let mut regs = RegisterFile::new();
/// regs.dest_layer_mask = 0b0101;
///
/// let raster = Rasterizer::new(&regs, ClipMode::Rectangle);
/// assert!(raster.plot(&mut layers, 515, -1, 0x42));
///
/// assert_eq!(layers[0].get(3, 511), 0x42);
/// assert_eq!(layers[2].get(3, 511), 0x42);
/// assert_eq!(layers[1].get(3, 511), 0x00);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Rasterizer {
    clip: ClipWindow,
    clip_mode: ClipMode,
    dest_mask: u16,
    swap_xy: bool,
}

impl Rasterizer {
    /// Snapshot the registers that control plotting
    pub fn new(regs: &RegisterFile, clip_mode: ClipMode) -> Self {
        Self {
            clip: regs.clip,
            clip_mode,
            dest_mask: regs.dest_layer_mask,
            swap_xy: regs.flip.contains(FlipFlags::SWAP_XY),
        }
    }

    #[inline]
    fn in_range(&self, v: i32, origin: i32, extent: i32) -> bool {
        let upper = match self.clip_mode {
            ClipMode::Rectangle => origin + extent,
            ClipMode::Extent => extent,
        };
        v >= origin && v <= upper
    }

    /// Clip test for an already wrapped coordinate
    #[inline]
    pub fn accepts(&self, x: i32, y: i32) -> bool {
        let ctrl = self.clip.ctrl;
        let inside_x = self.in_range(x, self.clip.x, self.clip.width);
        let inside_y = self.in_range(y, self.clip.y, self.clip.height);

        let reject = (!ctrl.contains(ClipControl::INSIDE_X) && inside_x)
            || (!ctrl.contains(ClipControl::OUTSIDE_X) && !inside_x)
            || (!ctrl.contains(ClipControl::INSIDE_Y) && inside_y)
            || (!ctrl.contains(ClipControl::OUTSIDE_Y) && !inside_y);

        !reject
    }

    /// Plot one pixel
    ///
    /// # Arguments
    ///
    /// * `layers` - All eight layer pixmaps
    /// * `x`, `y` - Unwrapped coordinates
    /// * `pen` - Final pen value
    ///
    /// # Returns
    ///
    /// `true` if the pixel passed the clip test
    pub fn plot(&self, layers: &mut [LayerPixmap; MAX_LAYERS], x: i32, y: i32, pen: u8) -> bool {
        let (x, y) = if self.swap_xy { (y, x) } else { (x, y) };
        let (x, y) = (x & LAYER_MASK, y & LAYER_MASK);

        if !self.accepts(x, y) {
            return false;
        }

        for (id, layer) in layers.iter_mut().enumerate() {
            if self.dest_mask & (1 << id) != 0 {
                layer.set(x, y, pen);
            }
        }
        true
    }

    /// Execute a decoded ROM program at the register cursor
    ///
    /// Runs advance along x by the flip direction; `NextLine` steps y and
    /// returns x to the starting column. Only `blit_y` is written back.
    pub fn run_bitstream(
        &self,
        layers: &mut [LayerPixmap; MAX_LAYERS],
        regs: &mut RegisterFile,
        decoder: &mut BitstreamDecoder<'_>,
    ) -> BlitSummary {
        let mut summary = BlitSummary::default();
        let start_x = regs.blit_x;
        let (dx, dy) = (regs.x_step(), regs.y_step());
        let (mut x, mut y) = (start_x, regs.blit_y);

        for op in decoder {
            match op {
                RunOp::NextLine => {
                    y = y.wrapping_add(dy);
                    x = start_x;
                }
                RunOp::Fill { count, pen } => {
                    let pen = regs.stream_pen(pen);
                    for _ in 0..count {
                        summary.record(self.plot(layers, x, y, pen));
                        x = x.wrapping_add(dx);
                    }
                }
                RunOp::Pixel { pen } => {
                    summary.record(self.plot(layers, x, y, regs.stream_pen(pen)));
                    x = x.wrapping_add(dx);
                }
                RunOp::Skip { count } => {
                    x = x.wrapping_add(dx.wrapping_mul(count as i32));
                }
            }
        }

        regs.blit_y = y & 0x3FF;
        summary
    }

    /// Fill every selected layer from (x, y) to its last byte, unclipped
    pub fn fill_from(
        &self,
        layers: &mut [LayerPixmap; MAX_LAYERS],
        x: i32,
        y: i32,
        pen: u8,
    ) -> BlitSummary {
        let start = LayerPixmap::index(x, y);
        for (id, layer) in layers.iter_mut().enumerate() {
            if self.dest_mask & (1 << id) != 0 {
                layer.fill_to_end(x, y, pen);
            }
        }
        BlitSummary {
            plotted: (LAYER_BYTES - start) as u32,
            clipped: 0,
        }
    }

    /// Fill the inclusive rectangle `rect_width + 1` by `rect_height + 1` at the cursor
    pub fn fill_rect(&self, layers: &mut [LayerPixmap; MAX_LAYERS], regs: &RegisterFile) -> BlitSummary {
        let mut summary = BlitSummary::default();
        for row in 0..=regs.rect_height {
            for col in 0..=regs.rect_width {
                summary.record(self.plot(layers, regs.blit_x + col, regs.blit_y + row, regs.pen));
            }
        }
        summary
    }

    /// Fill whole scanlines from `blit_y` up to (not including) `rect_height`, unclipped
    ///
    /// `blit_y` wraps like any other row. `rect_height` is a bound, not a row:
    /// values of 512 and above mean "to the bottom of the layer".
    pub fn fill_band(&self, layers: &mut [LayerPixmap; MAX_LAYERS], regs: &RegisterFile) -> BlitSummary {
        let first = (regs.blit_y & LAYER_MASK) as usize;
        let end = (regs.rect_height.max(0) as usize).min(LAYER_SIZE);
        if first >= end {
            log::debug!(
                "Blitter: empty band, rows {:03X}..{:03X}",
                regs.blit_y,
                regs.rect_height
            );
            return BlitSummary::default();
        }

        for (id, layer) in layers.iter_mut().enumerate() {
            if self.dest_mask & (1 << id) != 0 {
                layer.fill_rows(first, end, regs.pen);
            }
        }
        BlitSummary {
            plotted: ((end - first) * LAYER_SIZE) as u32,
            clipped: 0,
        }
    }

    /// Draw `line_length + 1` pixels rightwards, leaving `blit_x` past the end
    pub fn horizontal_line(
        &self,
        layers: &mut [LayerPixmap; MAX_LAYERS],
        regs: &mut RegisterFile,
    ) -> BlitSummary {
        let mut summary = BlitSummary::default();
        for _ in 0..=regs.line_length {
            summary.record(self.plot(layers, regs.blit_x, regs.blit_y, regs.pen));
            regs.blit_x = (regs.blit_x + 1) & 0x3FF;
        }
        summary
    }

    /// Draw `line_length + 1` pixels downwards, leaving `blit_y` past the end
    pub fn vertical_line(
        &self,
        layers: &mut [LayerPixmap; MAX_LAYERS],
        regs: &mut RegisterFile,
    ) -> BlitSummary {
        let mut summary = BlitSummary::default();
        for _ in 0..=regs.line_length {
            summary.record(self.plot(layers, regs.blit_x, regs.blit_y, regs.pen));
            regs.blit_y = (regs.blit_y + 1) & 0x3FF;
        }
        summary
    }
}
