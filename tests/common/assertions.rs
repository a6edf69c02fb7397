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

//! Custom assertions for blitter output

use dynablit::core::{Frame, LayerPixmap};

/// Assert frame pixel has expected palette index
#[allow(dead_code)]
pub fn assert_frame_pixel(frame: &Frame, x: usize, y: usize, expected: u16) {
    let actual = frame.pixel(x, y);
    assert_eq!(
        actual, expected,
        "Frame at ({}, {}) mismatch: expected 0x{:03X}, got 0x{:03X}",
        x, y, expected, actual
    );
}

/// Assert every pixel of an inclusive frame rectangle has expected index
#[allow(dead_code)]
pub fn assert_frame_rect(frame: &Frame, x0: usize, y0: usize, x1: usize, y1: usize, expected: u16) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            assert_frame_pixel(frame, x, y, expected);
        }
    }
}

/// Assert layer pixel has expected pen
#[allow(dead_code)]
pub fn assert_layer_pixel(layer: &LayerPixmap, x: i32, y: i32, expected: u8) {
    let actual = layer.get(x, y);
    assert_eq!(
        actual, expected,
        "Layer at ({}, {}) mismatch: expected 0x{:02X}, got 0x{:02X}",
        x, y, expected, actual
    );
}
