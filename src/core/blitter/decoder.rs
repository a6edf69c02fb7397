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

//! ROM bitstream decoder
//!
//! A blitter drawing program is a run-length encoded paint stream. The decoder
//! walks it once and yields [`RunOp`]s for the rasterizer to execute.
//!
//! # Stream Format
//!
//! ```text
//! header byte:   PPPP AAAA     pen size = P + 1, length size = A + 1
//! command:       3-bit opcode, mapped through the variant's CommandTable
//!   NextLine       -
//!   DrawRun        length, pen          plot length + 1 pixels with pen
//!   CopyRun        length, pen × (length + 1)
//!   Skip           length               advance length + 1 pixels
//!   ChangeArgSize  4-bit size - 1
//!   ChangePenSize  3-bit size - 1
//!   Stop           -
//! ```
//!
//! On Stop the bit cursor is rounded up to the next fetch unit and becomes the
//! new blit address.

use super::bitsource::BitSource;
use super::types::{BlitCommand, CommandTable};

/// Widest pen field the decoder will read
pub const MAX_PEN_BITS: u32 = 8;

/// Widest pen field seen in real content
const NOMINAL_PEN_BITS: u32 = 4;

/// Widest length field seen in real content
const NOMINAL_ARG_BITS: u32 = 8;

/// Header some content uses for empty programs
const EMPTY_PROGRAM_HEADER: u8 = 0xFF;

/// Drawing operation decoded from the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOp {
    /// Step y and return x to the run's starting column
    NextLine,
    /// Plot `count` pixels with one stream pen
    Fill { count: u32, pen: u8 },
    /// Plot a single pixel (one element of a CopyRun)
    Pixel { pen: u8 },
    /// Advance x by `count` pixels
    Skip { count: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Running,
    Finished { end_address: u32 },
}

/// Single-pass decoder over one drawing program
///
/// The decoder is an iterator; it borrows the ROM for one invocation and is
/// not restartable. After it is exhausted, [`BitstreamDecoder::end_address`]
/// gives the address the blit register should be updated to.
///
/// # Examples
///
/// ```
/// use dynablit::core::BitSource;
/// use dynablit::core::blitter::{BitstreamDecoder, CommandTable, RunOp};
///
/// // Header 0x00, DrawRun(length 0, pen 0), then Stop
/// let rom = BitSource::new(vec![0x00, 0b1110_0100]).unwrap();
/// let mut decoder = BitstreamDecoder::new(&rom, CommandTable::DDENLOVR, 8, 0);
///
/// assert_eq!(decoder.next(), Some(RunOp::Fill { count: 1, pen: 0 }));
/// assert_eq!(decoder.next(), None);
/// assert_eq!(decoder.end_address(), 2);
/// ```
#[derive(Debug)]
pub struct BitstreamDecoder<'a> {
    source: &'a BitSource,
    table: CommandTable,
    unit_bits: u64,
    bit_addr: u64,
    pen_size: u32,
    arg_size: u32,
    /// Pens still to be read for the current CopyRun
    copy_remaining: u32,
    overrun_reported: bool,
    state: DecoderState,
}

impl<'a> BitstreamDecoder<'a> {
    /// Start decoding the program at `blit_address`
    ///
    /// # Arguments
    ///
    /// * `source` - Blitter ROM
    /// * `table` - Opcode mapping for this variant
    /// * `fetch_unit_bits` - Width of one address unit (8 or 16)
    /// * `blit_address` - Program address in fetch units (wrapped to the ROM length)
    pub fn new(
        source: &'a BitSource,
        table: CommandTable,
        fetch_unit_bits: u32,
        blit_address: u32,
    ) -> Self {
        let unit_bits = u64::from(fetch_unit_bits.max(8));
        let byte_offset = (u64::from(blit_address) * (unit_bits / 8)) % source.len() as u64;
        let header = source.byte_wrapped(byte_offset);

        let mut decoder = Self {
            source,
            table,
            unit_bits,
            bit_addr: byte_offset * 8 + 8,
            pen_size: u32::from(header >> 4) + 1,
            arg_size: u32::from(header & 0x0F) + 1,
            copy_remaining: 0,
            overrun_reported: false,
            state: DecoderState::Running,
        };

        if header == EMPTY_PROGRAM_HEADER {
            log::warn!(
                "Blitter: empty program header at {:06X}, nothing drawn",
                blit_address
            );
            decoder.state = DecoderState::Finished {
                end_address: blit_address & 0xFF_FFFF,
            };
            return decoder;
        }

        if decoder.pen_size > NOMINAL_PEN_BITS || decoder.arg_size > NOMINAL_ARG_BITS {
            log::warn!(
                "Blitter: program at {:06X} has pen size {} and length size {}",
                blit_address,
                decoder.pen_size,
                decoder.arg_size
            );
            decoder.pen_size = decoder.pen_size.min(MAX_PEN_BITS);
        }

        decoder
    }

    /// Current pen field width
    pub fn pen_size(&self) -> u32 {
        self.pen_size
    }

    /// Current length field width
    pub fn arg_size(&self) -> u32 {
        self.arg_size
    }

    /// Current bit cursor (absolute bit address in the ROM)
    pub fn bit_address(&self) -> u64 {
        self.bit_addr
    }

    /// Blit address after the program, in fetch units
    ///
    /// For an unfinished decoder this is the current cursor rounded up.
    pub fn end_address(&self) -> u32 {
        match self.state {
            DecoderState::Finished { end_address } => end_address,
            DecoderState::Running => self.rounded_address(),
        }
    }

    fn rounded_address(&self) -> u32 {
        (self.bit_addr.div_ceil(self.unit_bits) & 0xFF_FFFF) as u32
    }

    fn finish(&mut self) {
        self.copy_remaining = 0;
        self.state = DecoderState::Finished {
            end_address: self.rounded_address(),
        };
    }

    fn report_overrun(&mut self) {
        if !self.overrun_reported {
            self.overrun_reported = true;
            log::warn!(
                "Blitter: program read past end of ROM at bit {:X} (ROM is {} bytes)",
                self.bit_addr,
                self.source.len()
            );
        }
    }

    /// Read an operand field, substituting 1 bits past the end of the ROM
    fn fetch(&mut self, width: u32) -> u32 {
        let fetch = self.source.fetch_bits(self.bit_addr, width);
        if fetch.overrun {
            self.report_overrun();
        }
        self.bit_addr += u64::from(width);
        fetch.value
    }

    fn fetch_pen(&mut self) -> u8 {
        // pen_size never exceeds MAX_PEN_BITS
        self.fetch(self.pen_size) as u8
    }
}

impl Iterator for BitstreamDecoder<'_> {
    type Item = RunOp;

    fn next(&mut self) -> Option<RunOp> {
        loop {
            if self.copy_remaining > 0 {
                self.copy_remaining -= 1;
                let pen = self.fetch_pen();
                return Some(RunOp::Pixel { pen });
            }

            if self.state != DecoderState::Running {
                return None;
            }

            let opcode_addr = self.bit_addr;
            let opcode = self.source.fetch_bits(opcode_addr, 3);
            self.bit_addr += 3;

            if opcode.overrun {
                // Nothing past the ROM end is a real command
                self.report_overrun();
                self.finish();
                return None;
            }

            match self.table.decode(opcode.value) {
                BlitCommand::NextLine => return Some(RunOp::NextLine),
                BlitCommand::DrawRun => {
                    let length = self.fetch(self.arg_size);
                    let pen = self.fetch_pen();
                    return Some(RunOp::Fill {
                        count: length + 1,
                        pen,
                    });
                }
                BlitCommand::CopyRun => {
                    let length = self.fetch(self.arg_size);
                    self.copy_remaining = length + 1;
                }
                BlitCommand::Skip => {
                    let length = self.fetch(self.arg_size);
                    return Some(RunOp::Skip { count: length + 1 });
                }
                BlitCommand::ChangeArgSize => {
                    self.arg_size = self.fetch(4) + 1;
                }
                BlitCommand::ChangePenSize => {
                    self.pen_size = self.fetch(3) + 1;
                }
                BlitCommand::Unknown => {
                    log::warn!(
                        "Blitter: unknown command {} at bit {:X}",
                        opcode.value,
                        opcode_addr
                    );
                    self.finish();
                    return None;
                }
                BlitCommand::Stop => {
                    self.finish();
                    return None;
                }
            }
        }
    }
}
