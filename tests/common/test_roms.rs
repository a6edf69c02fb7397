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

//! Test ROM utilities and small blitter programs

/// Opcodes of the default command table
#[allow(dead_code)]
pub const NEXT_LINE: (u32, u32) = (0, 3);
#[allow(dead_code)]
pub const DRAW_RUN: (u32, u32) = (1, 3);
#[allow(dead_code)]
pub const COPY_RUN: (u32, u32) = (2, 3);
#[allow(dead_code)]
pub const STOP: (u32, u32) = (7, 3);

/// Pack (value, width) fields into bytes, LSB of each byte first
#[allow(dead_code)]
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
#[allow(dead_code)]
pub fn program(header: u8, fields: &[(u32, u32)]) -> Vec<u8> {
    let mut bytes = vec![header];
    bytes.extend(pack(fields));
    bytes
}

/// Two programs back to back, 4-bit pens and lengths
///
/// Address 0: four pixels of stream pen 5. Address 3: pens 1 and 2.
#[allow(dead_code)]
pub fn chained_programs() -> Vec<u8> {
    let mut rom = program(0x33, &[DRAW_RUN, (3, 4), (5, 4), STOP]);
    rom.extend(program(
        0x33,
        &[COPY_RUN, (1, 4), (1, 4), (2, 4), STOP],
    ));
    rom
}
