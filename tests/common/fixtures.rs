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

//! Device fixtures and bus helpers

use dynablit::core::{BitSource, BlitScheduler, BlitterConfig, BlitterDevice, CompletionToken};

/// Device over a ROM that only holds an empty-ish program
#[allow(dead_code)]
pub fn create_device(config: BlitterConfig) -> BlitterDevice {
    create_device_with_rom(config, vec![0x00, 0x07])
}

/// Device over the given ROM bytes
#[allow(dead_code)]
pub fn create_device_with_rom(config: BlitterConfig, rom: Vec<u8>) -> BlitterDevice {
    BlitterDevice::new(config, BitSource::new(rom).expect("ROM must not be empty"))
}

/// Write a register through the combined port: even offset selects, odd writes data
#[allow(dead_code)]
pub fn poke(blitter: &mut BlitterDevice, index: u8, value: u16) -> Option<CompletionToken> {
    let carry = ((value >> 8) & 3) as u8;
    assert!(blitter.write_port(0, index | (carry << 6)).is_none());
    blitter.write_port(1, (value & 0xFF) as u8)
}

/// Start a blit through the bus and run it to completion on a scheduler
#[allow(dead_code)]
pub fn run_blit(blitter: &mut BlitterDevice, code: u8) {
    let mut scheduler = BlitScheduler::new();
    let token = poke(blitter, 0x24, u16::from(code)).expect("blit should start");
    scheduler.schedule(token);
    drain(blitter, &mut scheduler);
    assert!(!blitter.is_busy());
}

/// Redeem every scheduled completion
#[allow(dead_code)]
pub fn drain(blitter: &mut BlitterDevice, scheduler: &mut BlitScheduler) {
    while let Some(wait) = scheduler.downcount() {
        for token in scheduler.advance(wait) {
            assert!(blitter.complete(token));
        }
    }
}

/// Paint an inclusive `(w + 1) x (h + 1)` rectangle through the bus
#[allow(dead_code)]
pub fn paint_rect(blitter: &mut BlitterDevice, dest: u8, x: u16, y: u16, w: u16, h: u16, pen: u8) {
    assert!(poke(blitter, 0x00, u16::from(dest)).is_none());
    poke(blitter, 0x14, x);
    poke(blitter, 0x02, y);
    poke(blitter, 0x0a, w);
    poke(blitter, 0x0b, h);
    poke(blitter, 0x04, u16::from(pen));
    run_blit(blitter, 0x1c);
}
