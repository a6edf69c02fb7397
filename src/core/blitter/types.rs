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

//! Blitter type definitions
//!
//! This module contains the small value types shared by the decoder, rasterizer
//! and compositor: command tables, start codes, flip and clip flags, and the
//! output frame.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Width and height of every layer pixmap in pixels
pub const LAYER_SIZE: usize = 512;

/// Coordinate mask for toroidal layer addressing
pub const LAYER_MASK: i32 = (LAYER_SIZE as i32) - 1;

/// Number of layer pixmaps a device owns
pub const MAX_LAYERS: usize = 8;

/// Semantic operation a 3-bit bitstream opcode maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlitCommand {
    /// Move to the next line and return x to the run's starting column
    NextLine,
    /// Plot N+1 pixels with a single pen
    DrawRun,
    /// Plot N+1 pixels, each with its own pen
    CopyRun,
    /// Advance x by N+1 without plotting
    Skip,
    /// Replace the length field width (4-bit field + 1)
    ChangeArgSize,
    /// Replace the pen field width (3-bit field + 1)
    ChangePenSize,
    /// Opcode with no known meaning, treated as Stop after logging
    Unknown,
    /// End of the drawing program
    Stop,
}

/// Mapping from 3-bit opcode to blitter command
///
/// Game variants share one decoding algorithm and differ only in this table,
/// so it is fixed when the device is constructed.
///
/// # Examples
///
/// ```
/// use dynablit::core::blitter::{BlitCommand, CommandTable};
///
/// assert_eq!(CommandTable::DDENLOVR.decode(7), BlitCommand::Stop);
/// assert_eq!(CommandTable::HANAKANZ.decode(6), BlitCommand::DrawRun);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTable(pub [BlitCommand; 8]);

impl CommandTable {
    /// Table used by Don Den Lover and most early boards
    pub const DDENLOVR: Self = Self([
        BlitCommand::NextLine,
        BlitCommand::DrawRun,
        BlitCommand::CopyRun,
        BlitCommand::Skip,
        BlitCommand::ChangeArgSize,
        BlitCommand::ChangePenSize,
        BlitCommand::Unknown,
        BlitCommand::Stop,
    ]);

    /// Table used by Hana Kanzashi and related boards
    pub const HANAKANZ: Self = Self([
        BlitCommand::NextLine,
        BlitCommand::ChangePenSize,
        BlitCommand::ChangeArgSize,
        BlitCommand::Unknown,
        BlitCommand::Skip,
        BlitCommand::CopyRun,
        BlitCommand::DrawRun,
        BlitCommand::Stop,
    ]);

    /// Table used by Mahjong Fantasic Love
    pub const MJFLOVE: Self = Self([
        BlitCommand::Stop,
        BlitCommand::ChangePenSize,
        BlitCommand::ChangeArgSize,
        BlitCommand::Unknown,
        BlitCommand::Skip,
        BlitCommand::CopyRun,
        BlitCommand::DrawRun,
        BlitCommand::NextLine,
    ]);

    /// Map a 3-bit opcode to its command (upper bits are ignored)
    #[inline]
    pub fn decode(&self, opcode: u32) -> BlitCommand {
        self.0[(opcode & 7) as usize]
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::DDENLOVR
    }
}

/// Values accepted by the start register
///
/// Anything not listed here is logged and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartCode {
    /// 0x04: fill every layer row from (0, 0) to the end of the buffer
    FillAll,
    /// 0x14 and 0x43: fill from (blit_x, blit_y) to the end of the buffer
    FillFromCursor,
    /// 0x10: run the ROM bitstream at the blit address
    DrawFromRom,
    /// 0x13: horizontal line of line_length + 1 pixels
    HorizontalLine,
    /// 0x1b: vertical line of line_length + 1 pixels
    VerticalLine,
    /// 0x1c: solid rectangle at (blit_x, blit_y)
    FillRect,
    /// 0x8c: whole scanlines from blit_y up to rect_height
    FillBand,
}

impl StartCode {
    /// Decode a start register value
    ///
    /// # Returns
    ///
    /// `None` for values the chip is not known to accept
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x04 => Some(Self::FillAll),
            0x14 | 0x43 => Some(Self::FillFromCursor),
            0x10 => Some(Self::DrawFromRom),
            0x13 => Some(Self::HorizontalLine),
            0x1b => Some(Self::VerticalLine),
            0x1c => Some(Self::FillRect),
            0x8c => Some(Self::FillBand),
            _ => None,
        }
    }

    /// Completion family this start code belongs to
    pub fn family(self) -> CommandFamily {
        match self {
            Self::DrawFromRom => CommandFamily::RomDraw,
            _ => CommandFamily::Primitive,
        }
    }
}

/// Command families with independent completion delays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandFamily {
    /// Bitstream programs decoded from ROM
    RomDraw,
    /// Fills, rectangles and lines executed directly from registers
    Primitive,
}

bitflags! {
    /// Blit flip register (0x03)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FlipFlags: u8 {
        /// Runs advance towards decreasing x
        const X = 0x01;
        /// NextLine moves towards decreasing y
        const Y = 0x02;
        /// Reserved, logged when set
        const RESERVED_2 = 0x04;
        /// Reserved, logged when set
        const RESERVED_3 = 0x08;
        /// Exchange x and y before plotting
        const SWAP_XY = 0x10;
    }
}

impl FlipFlags {
    /// Bits with no known function; writes setting them are logged
    pub const UNKNOWN_MASK: u8 = 0xEC;
}

bitflags! {
    /// Clip control nibble (register 0x20)
    ///
    /// Each bit independently allows plotting on one side of one axis, so all
    /// sixteen combinations are legal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClipControl: u8 {
        /// Plot pixels whose x lies inside the clip range
        const INSIDE_X = 0x01;
        /// Plot pixels whose x lies outside the clip range
        const OUTSIDE_X = 0x02;
        /// Plot pixels whose y lies inside the clip range
        const INSIDE_Y = 0x04;
        /// Plot pixels whose y lies outside the clip range
        const OUTSIDE_Y = 0x08;
    }
}

/// Formula for the clip range upper bound
///
/// Content disagrees about whether the extent is relative to the origin, so
/// the choice is per-variant configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipMode {
    /// `origin <= v <= origin + extent`
    #[default]
    Rectangle,
    /// `origin <= v <= extent`
    Extent,
}

/// Which select/data port pair a bus write arrives on
///
/// Eight-layer boards have a second port addressing layers 4–7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitterPort {
    Primary,
    Secondary,
}

impl BlitterPort {
    /// Index of the first layer this port addresses
    #[inline]
    pub fn layer_base(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 4,
        }
    }
}

/// Composited indexed-color frame
///
/// Pixels are palette indices in row-major order. Palette bases are 16-bit, so
/// indices can exceed 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame width in pixels
    pub width: usize,
    /// Frame height in pixels
    pub height: usize,
    /// Palette indices, `width * height` entries
    pub pixels: Vec<u16>,
}

impl Frame {
    /// Create a frame filled with one palette index
    pub fn new(width: usize, height: usize, fill: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    /// Palette index at (x, y)
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the frame.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u16 {
        self.pixels[y * self.width + x]
    }
}
