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

//! Blitter register file
//!
//! This module holds every programmable field of the blitter and the decoding
//! of register indices written through the select/data bus.
//!
//! # Register Bus
//!
//! The host writes a register index to the select port, then a value to the
//! data port:
//!
//! ```text
//! select:  CC IIIIII     I = register index, C = carry bits
//! data:    DDDDDDDD      stored value = D | C << 8
//! ```
//!
//! The carry lets 9/10-bit coordinates travel over the 8-bit bus.

use serde::{Deserialize, Serialize};

use super::types::{BlitterPort, ClipControl, FlipFlags, MAX_LAYERS};

/// Phase of the two-step select/data protocol on one port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusPhase {
    /// Next write is expected on the select port
    #[default]
    AwaitingSelect,
    /// A select byte was latched; the next data write uses it
    AwaitingData(u8),
}

impl BusPhase {
    /// Register index carried by a select byte (low 6 bits)
    #[inline]
    pub fn index(select: u8) -> u8 {
        select & 0x3F
    }

    /// Carry bits of a select byte, already moved to bits 8-9
    #[inline]
    pub fn carry(select: u8) -> u16 {
        u16::from(select & 0xC0) << 2
    }
}

/// Combine a carry (0-3) and a data byte into a stored register value
///
/// # Examples
///
/// ```
/// use dynablit::core::blitter::wide_value;
///
/// assert_eq!(wide_value(2, 0x20), 0x220);
/// ```
#[inline]
pub fn wide_value(carry: u8, low: u8) -> u16 {
    (u16::from(carry & 3) << 8) | u16::from(low)
}

/// Register file field addressed by a bus index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterField {
    DestLayer,
    FlipScreen,
    BlitY,
    Flip,
    Pen,
    PenMask,
    PenMode,
    ClipWidth,
    ClipHeight,
    RectWidth,
    RectHeight,
    LineLength,
    /// Blit address byte 0 (bits 0-7), 1 or 2
    Address(u8),
    BlitX,
    ClipX,
    ClipY,
    /// Scroll x of layer n (relative to the port's layer base)
    ScrollX(u8),
    /// Scroll y of layer n (relative to the port's layer base)
    ScrollY(u8),
    ClipCtrl,
    Start,
}

/// Register index assignment
///
/// Variants that move registers around supply their own layout; everything
/// else uses [`RegisterLayout::STANDARD`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterLayout {
    pub dest_layer: u8,
    pub flip_screen: u8,
    pub blit_y: u8,
    pub flip: u8,
    pub pen: u8,
    pub pen_mask: u8,
    pub pen_mode: u8,
    pub clip_width: u8,
    pub clip_height: u8,
    pub rect_width: u8,
    pub rect_height: u8,
    pub line_length: u8,
    /// First of three consecutive address byte registers (low byte first)
    pub address: u8,
    pub blit_x: u8,
    pub clip_x: u8,
    pub clip_y: u8,
    /// First of eight scroll registers: four x, then four y
    pub scroll: u8,
    pub clip_ctrl: u8,
    pub start: u8,
}

impl RegisterLayout {
    /// Layout shared by the third-generation boards
    pub const STANDARD: Self = Self {
        dest_layer: 0x00,
        flip_screen: 0x01,
        blit_y: 0x02,
        flip: 0x03,
        pen: 0x04,
        pen_mask: 0x05,
        pen_mode: 0x06,
        clip_width: 0x08,
        clip_height: 0x09,
        rect_width: 0x0a,
        rect_height: 0x0b,
        line_length: 0x0c,
        address: 0x0d,
        blit_x: 0x14,
        clip_x: 0x16,
        clip_y: 0x17,
        scroll: 0x18,
        clip_ctrl: 0x20,
        start: 0x24,
    };

    /// Resolve a 6-bit register index
    ///
    /// # Returns
    ///
    /// `None` for indices with no assigned field
    pub fn field(&self, index: u8) -> Option<RegisterField> {
        let field = match index {
            i if i == self.dest_layer => RegisterField::DestLayer,
            i if i == self.flip_screen => RegisterField::FlipScreen,
            i if i == self.blit_y => RegisterField::BlitY,
            i if i == self.flip => RegisterField::Flip,
            i if i == self.pen => RegisterField::Pen,
            i if i == self.pen_mask => RegisterField::PenMask,
            i if i == self.pen_mode => RegisterField::PenMode,
            i if i == self.clip_width => RegisterField::ClipWidth,
            i if i == self.clip_height => RegisterField::ClipHeight,
            i if i == self.rect_width => RegisterField::RectWidth,
            i if i == self.rect_height => RegisterField::RectHeight,
            i if i == self.line_length => RegisterField::LineLength,
            i if i.wrapping_sub(self.address) < 3 => RegisterField::Address(i - self.address),
            i if i == self.blit_x => RegisterField::BlitX,
            i if i == self.clip_x => RegisterField::ClipX,
            i if i == self.clip_y => RegisterField::ClipY,
            i if i.wrapping_sub(self.scroll) < 4 => RegisterField::ScrollX(i - self.scroll),
            i if i.wrapping_sub(self.scroll) < 8 => RegisterField::ScrollY(i - self.scroll - 4),
            i if i == self.clip_ctrl => RegisterField::ClipCtrl,
            i if i == self.start => RegisterField::Start,
            _ => return None,
        };
        Some(field)
    }
}

impl Default for RegisterLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Clip window
///
/// Controls which plotted pixels are kept, per axis and per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipWindow {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Horizontal extent
    pub width: i32,
    /// Vertical extent
    pub height: i32,
    /// Inside/outside enable bits
    pub ctrl: ClipControl,
}

impl Default for ClipWindow {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0x3FF,
            height: 0x3FF,
            ctrl: ClipControl::all(),
        }
    }
}

/// Per-layer compositing and scroll state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerControl {
    /// Horizontal scroll (wraps at 512)
    pub scroll_x: i32,
    /// Vertical scroll (wraps at 512)
    pub scroll_y: i32,
    /// Palette bits used where `palette_mask` is clear
    pub palette_base: u16,
    /// Pixel bits passed through to the frame
    pub palette_mask: u8,
    /// Pen value treated as transparent (compared under `transparency_mask`)
    pub transparency_pen: u8,
    /// Pixel bits that take part in the transparency test
    pub transparency_mask: u8,
}

impl LayerControl {
    /// Default for a freshly reset layer: all pixel bits pass, pen 0 is clear
    pub fn reset_value() -> Self {
        Self {
            palette_mask: 0xFF,
            transparency_mask: 0xFF,
            ..Self::default()
        }
    }
}

/// Blitter register file
///
/// Holds all state the host can program. Fields are public because the
/// rasterizer and compositor read them directly; writes from the host go
/// through [`RegisterFile::write_field`] or the video control setters on the
/// device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    /// Bit n routes plots to layer n (bits 8-15 are unused)
    pub dest_layer_mask: u16,
    /// Flip screen latch (no functional effect)
    pub flip_screen: u8,
    /// Cursor x
    pub blit_x: i32,
    /// Cursor y
    pub blit_y: i32,
    /// 24-bit ROM address in fetch units
    pub blit_address: u32,
    /// Pen for direct primitives, high nibble merged into bitstream pens
    pub pen: u8,
    /// When true, bitstream runs use the low nibble of `pen` instead of stream pens
    pub pen_mode: bool,
    /// Advisory write mask (not enforced)
    pub pen_mask: u8,
    /// Rectangle width minus one
    pub rect_width: i32,
    /// Rectangle height minus one
    pub rect_height: i32,
    /// Line length minus one
    pub line_length: i32,
    /// Flip flags as last written (unknown bits retained)
    pub flip: FlipFlags,
    /// Clip window
    pub clip: ClipWindow,
    /// Per-layer scroll and compositing state
    pub layers: [LayerControl; MAX_LAYERS],
    /// Permutation index for layers 0-3
    pub priority_index: u8,
    /// Permutation index for layers 4-7
    pub priority_index2: u8,
    /// Enable bits for layers 0-3
    pub layer_enable_mask: u8,
    /// Enable bits for layers 4-7
    pub layer_enable_mask2: u8,
    /// Background palette index
    pub bg_color: u8,
    /// Background palette index high byte (eight-layer boards)
    pub bg_color2: u8,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self {
            dest_layer_mask: 0,
            flip_screen: 0,
            blit_x: 0,
            blit_y: 0,
            blit_address: 0,
            pen: 0,
            pen_mode: false,
            pen_mask: 0xFF,
            rect_width: 0,
            rect_height: 0,
            line_length: 0,
            flip: FlipFlags::empty(),
            clip: ClipWindow::default(),
            layers: [LayerControl::reset_value(); MAX_LAYERS],
            priority_index: 0,
            priority_index2: 0,
            layer_enable_mask: 0x0F,
            layer_enable_mask2: 0x0F,
            bg_color: 0,
            bg_color2: 0,
        }
    }
}

impl RegisterFile {
    /// Create a register file in its reset state
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a combined (carry | data) value into a field
    ///
    /// `Start` is not handled here; the device intercepts it before the
    /// register file sees it.
    ///
    /// # Arguments
    ///
    /// * `port` - Port the write arrived on (selects layer bank / mask byte)
    /// * `field` - Destination field
    /// * `value` - Data byte with carry bits in 8-9
    pub fn write_field(&mut self, port: BlitterPort, field: RegisterField, value: u16) {
        let low = (value & 0xFF) as u8;
        let wide = i32::from(value & 0x3FF);

        match field {
            RegisterField::DestLayer => {
                // Each port addresses its own bank: secondary bit n is layer 4 + n
                self.dest_layer_mask = match port {
                    BlitterPort::Primary => (self.dest_layer_mask & 0xFF00) | u16::from(low),
                    BlitterPort::Secondary => {
                        (self.dest_layer_mask & 0xFF0F) | (u16::from(low & 0x0F) << 4)
                    }
                };
            }
            RegisterField::FlipScreen => {
                log::debug!("Blitter: flip screen = {:02X}", low);
                self.flip_screen = low;
            }
            RegisterField::BlitY => self.blit_y = wide,
            RegisterField::Flip => self.write_flip(low),
            RegisterField::Pen => self.pen = low,
            RegisterField::PenMask => self.pen_mask = low,
            RegisterField::PenMode => self.pen_mode = low & 1 != 0,
            RegisterField::ClipWidth => self.clip.width = wide,
            RegisterField::ClipHeight => self.clip.height = wide,
            RegisterField::RectWidth => self.rect_width = wide,
            RegisterField::RectHeight => self.rect_height = wide,
            RegisterField::LineLength => {
                if wide > 0x1FF {
                    log::debug!("Blitter: line length {:03X} exceeds a layer", wide);
                }
                self.line_length = wide;
            }
            RegisterField::Address(byte) => {
                let shift = u32::from(byte) * 8;
                self.blit_address =
                    (self.blit_address & !(0xFF << shift)) | (u32::from(low) << shift);
            }
            RegisterField::BlitX => self.blit_x = wide,
            RegisterField::ClipX => self.clip.x = wide,
            RegisterField::ClipY => self.clip.y = wide,
            RegisterField::ScrollX(n) => {
                self.layers[port.layer_base() + usize::from(n & 3)].scroll_x = wide;
            }
            RegisterField::ScrollY(n) => {
                self.layers[port.layer_base() + usize::from(n & 3)].scroll_y = wide;
            }
            RegisterField::ClipCtrl => self.clip.ctrl = ClipControl::from_bits_truncate(low),
            RegisterField::Start => {
                log::warn!("Blitter: start value {:02X} reached the register file", low);
            }
        }
    }

    /// Store the flip register, reporting bits with no known function
    fn write_flip(&mut self, value: u8) {
        if value & FlipFlags::UNKNOWN_MASK != 0 {
            log::warn!("Blitter: flip register written with unknown bits {:02X}", value);
        }
        self.flip = FlipFlags::from_bits_retain(value);
    }

    /// Direction runs advance along x
    #[inline]
    pub fn x_step(&self) -> i32 {
        if self.flip.contains(FlipFlags::X) {
            -1
        } else {
            1
        }
    }

    /// Direction NextLine moves along y
    #[inline]
    pub fn y_step(&self) -> i32 {
        if self.flip.contains(FlipFlags::Y) {
            -1
        } else {
            1
        }
    }

    /// Merge a pen decoded from ROM with the pen registers
    ///
    /// The stream pen (or the low nibble of `pen` when `pen_mode` is set) is
    /// ORed with the high nibble of `pen`. Stream pens wider than 4 bits keep
    /// their upper bits, so they combine with the register nibble.
    #[inline]
    pub fn stream_pen(&self, stream: u8) -> u8 {
        let low = if self.pen_mode { self.pen & 0x0F } else { stream };
        low | (self.pen & 0xF0)
    }

    /// Combined enable bits for all eight layers
    #[inline]
    pub fn layer_enable_bits(&self) -> u8 {
        (self.layer_enable_mask & 0x0F) | (self.layer_enable_mask2 << 4)
    }
}
