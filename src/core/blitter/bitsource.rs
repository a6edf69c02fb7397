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

//! Blitter ROM bit access
//!
//! The blitter reads its drawing programs from a dedicated graphics ROM as a
//! stream of variable-width bit fields.
//!
//! # Bit Order
//!
//! ```text
//! byte n:   b7 b6 b5 b4 b3 b2 b1 b0     bit address = n * 8 + i
//!                                ^ read first
//! ```
//!
//! Bits are consumed LSB-first within a byte. A multi-bit field is assembled
//! MSB-first: the first bit read ends up as the most significant bit.
//!
//! Reads past the end of the ROM return 1 bits, matching how boards behave
//! when a program overruns its data.

use std::sync::Arc;

use crate::core::error::{BlitterError, Result};

/// Result of a bit field fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitFetch {
    /// Field value, MSB-first
    pub value: u32,
    /// True if any bit of the field lay past the end of the ROM
    pub overrun: bool,
}

/// Read-only blitter ROM
///
/// Cloning shares the underlying bytes.
///
/// # Examples
///
/// ```
/// use dynablit::core::BitSource;
///
/// let rom = BitSource::new(vec![0b0000_0100]).unwrap();
/// // Bits 0, 0, 1 read in that order assemble to 0b001
/// assert_eq!(rom.fetch_bits(0, 3).value, 0b001);
/// ```
#[derive(Debug, Clone)]
pub struct BitSource {
    data: Arc<[u8]>,
}

impl BitSource {
    /// Wrap ROM contents
    ///
    /// # Errors
    ///
    /// Returns `BlitterError::EmptyBitSource` for a zero-length ROM, which is a
    /// board configuration error rather than a content problem.
    pub fn new(data: impl Into<Arc<[u8]>>) -> Result<Self> {
        let data = data.into();
        if data.is_empty() {
            return Err(BlitterError::EmptyBitSource);
        }
        Ok(Self { data })
    }

    /// ROM length in bytes (never zero)
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; kept for API symmetry with slices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// ROM length in bits
    #[inline]
    pub fn bit_len(&self) -> u64 {
        self.data.len() as u64 * 8
    }

    /// Raw ROM bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Read one bit, or `None` past the end
    #[inline]
    pub fn bit(&self, bit_addr: u64) -> Option<u32> {
        let byte = self.data.get((bit_addr >> 3) as usize)?;
        Some(((byte >> (bit_addr & 7)) & 1) as u32)
    }

    /// Fetch a `width`-bit field starting at `bit_addr`
    ///
    /// Missing bits read as 1. `width` may be up to 32.
    pub fn fetch_bits(&self, bit_addr: u64, width: u32) -> BitFetch {
        let mut value = 0u32;
        let mut overrun = false;

        for i in 0..u64::from(width) {
            let bit = match self.bit(bit_addr + i) {
                Some(bit) => bit,
                None => {
                    overrun = true;
                    1
                }
            };
            value = (value << 1) | bit;
        }

        BitFetch { value, overrun }
    }

    /// Byte at `index`, wrapped to the ROM length
    #[inline]
    pub fn byte_wrapped(&self, index: u64) -> u8 {
        self.data[(index % self.data.len() as u64) as usize]
    }
}
