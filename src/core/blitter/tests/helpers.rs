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

//! Shared test helpers

use super::super::*;
use crate::core::config::BlitterConfig;

/// Device with the default configuration over `rom`
pub fn device(rom: Vec<u8>) -> BlitterDevice {
    device_with(BlitterConfig::default(), rom)
}

/// Device with a custom configuration over `rom`
pub fn device_with(config: BlitterConfig, rom: Vec<u8>) -> BlitterDevice {
    BlitterDevice::new(config, BitSource::new(rom).unwrap())
}

/// Write a register through the select/data bus, splitting the carry bits
pub fn write(blitter: &mut BlitterDevice, index: u8, value: u16) -> Option<CompletionToken> {
    blitter.select((index & 0x3F) | (((value >> 8) as u8 & 3) << 6));
    blitter.apply((value & 0xFF) as u8)
}

/// Start a blit and redeem its token immediately
pub fn blit(blitter: &mut BlitterDevice, code: u8) {
    let token = write(blitter, 0x24, u16::from(code)).expect("blit should start");
    assert!(blitter.complete(token));
}

/// Pack (value, width) fields into bytes in stream bit order
pub fn pack(fields: &[(u32, u32)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut bit = 0usize;
    for &(value, width) in fields {
        for i in (0..width).rev() {
            if bit / 8 == bytes.len() {
                bytes.push(0);
            }
            if (value >> i) & 1 != 0 {
                bytes[bit / 8] |= 1 << (bit % 8);
            }
            bit += 1;
        }
    }
    bytes
}

/// Header byte followed by packed command fields
pub fn program(header: u8, fields: &[(u32, u32)]) -> Vec<u8> {
    let mut bytes = vec![header];
    bytes.extend(pack(fields));
    bytes
}

/// DDENLOVR opcodes
pub const NEXT_LINE: (u32, u32) = (0, 3);
pub const DRAW_RUN: (u32, u32) = (1, 3);
pub const COPY_RUN: (u32, u32) = (2, 3);
pub const SKIP: (u32, u32) = (3, 3);
pub const STOP: (u32, u32) = (7, 3);

/// Coordinates of every nonzero pixel in a layer
pub fn lit_pixels(layer: &LayerPixmap) -> Vec<(i32, i32, u8)> {
    layer
        .as_bytes()
        .iter()
        .enumerate()
        .filter(|(_, &pen)| pen != 0)
        .map(|(i, &pen)| ((i % LAYER_SIZE) as i32, (i / LAYER_SIZE) as i32, pen))
        .collect()
}
