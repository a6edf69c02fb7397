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

//! Drawing tests
//! Tests for ROM programs and direct primitives started through the register bus

use super::super::*;
use super::helpers::*;
use crate::core::config::{BlitterConfig, GameVariant};

/// Point the blitter at layer 0 with the cursor at (x, y)
fn setup(blitter: &mut BlitterDevice, x: u16, y: u16, pen: u8) {
    write(blitter, 0x00, 0x01);
    write(blitter, 0x14, x);
    write(blitter, 0x02, y);
    write(blitter, 0x04, u16::from(pen));
}

// ========== ROM programs ==========

#[test]
fn test_draw_run_at_cursor() {
    // pen 2 bits, length 4 bits
    let rom = program(0x13, &[DRAW_RUN, (3, 4), (2, 2), STOP]);
    let mut blitter = device(rom);
    setup(&mut blitter, 100, 50, 0xA0);

    blit(&mut blitter, 0x10);

    let lit = lit_pixels(blitter.layer(0).unwrap());
    assert_eq!(
        lit,
        vec![(100, 50, 0xA2), (101, 50, 0xA2), (102, 50, 0xA2), (103, 50, 0xA2)]
    );

    // 8 + 3 + 4 + 2 + 3 = 20 bits, rounded up to 3 bytes
    let regs = blitter.registers();
    assert_eq!(regs.blit_address, 3);
    assert_eq!(regs.blit_x, 100);
    assert_eq!(regs.blit_y, 50);
}

#[test]
fn test_pen_mode_uses_register_pen() {
    let rom = program(0x13, &[DRAW_RUN, (0, 4), (2, 2), STOP]);
    let mut blitter = device(rom);
    setup(&mut blitter, 0, 0, 0xA7);
    write(&mut blitter, 0x06, 1);

    blit(&mut blitter, 0x10);
    assert_eq!(blitter.layer(0).unwrap().get(0, 0), 0xA7);
}

#[test]
fn test_flip_x_runs_leftwards() {
    let rom = program(0x13, &[DRAW_RUN, (3, 4), (1, 2), STOP]);
    let mut blitter = device(rom);
    setup(&mut blitter, 100, 50, 0x00);
    write(&mut blitter, 0x03, 0x01);

    blit(&mut blitter, 0x10);

    let layer = blitter.layer(0).unwrap();
    for x in 97..=100 {
        assert_eq!(layer.get(x, 50), 0x01);
    }
    assert_eq!(layer.get(101, 50), 0x00);
    assert_eq!(lit_pixels(layer).len(), 4);
}

#[test]
fn test_skip_and_next_line() {
    // pen 1 bit, length 4 bits
    let rom = program(
        0x03,
        &[
            SKIP,
            (1, 4),
            DRAW_RUN,
            (0, 4),
            (1, 1),
            NEXT_LINE,
            DRAW_RUN,
            (1, 4),
            (1, 1),
            STOP,
        ],
    );
    let mut blitter = device(rom);
    setup(&mut blitter, 10, 20, 0x40);

    blit(&mut blitter, 0x10);

    let lit = lit_pixels(blitter.layer(0).unwrap());
    assert_eq!(lit, vec![(12, 20, 0x41), (10, 21, 0x41), (11, 21, 0x41)]);

    // y is written back, x is not
    assert_eq!(blitter.registers().blit_y, 21);
    assert_eq!(blitter.registers().blit_x, 10);
}

#[test]
fn test_flip_y_moves_up() {
    let rom = program(0x03, &[NEXT_LINE, DRAW_RUN, (0, 4), (1, 1), STOP]);
    let mut blitter = device(rom);
    setup(&mut blitter, 10, 0, 0x00);
    write(&mut blitter, 0x03, 0x02);

    blit(&mut blitter, 0x10);

    assert_eq!(blitter.layer(0).unwrap().get(10, 511), 0x01);
    assert_eq!(blitter.registers().blit_y, 0x3FF);
}

#[test]
fn test_copy_run_pens() {
    // pen 2 bits, length 2 bits
    let rom = program(0x11, &[COPY_RUN, (2, 2), (1, 2), (2, 2), (3, 2), STOP]);
    let mut blitter = device(rom);
    setup(&mut blitter, 0, 0, 0x50);

    blit(&mut blitter, 0x10);

    let lit = lit_pixels(blitter.layer(0).unwrap());
    assert_eq!(lit, vec![(0, 0, 0x51), (1, 0, 0x52), (2, 0, 0x53)]);
}

#[test]
fn test_stream_pen_zero_still_plots() {
    let rom = program(0x13, &[DRAW_RUN, (1, 4), (0, 2), STOP]);
    let mut blitter = device(rom);
    setup(&mut blitter, 5, 5, 0x00);

    // Pre-fill so writes of pen 0 are visible
    write(&mut blitter, 0x04, 0xEE);
    blit(&mut blitter, 0x04);
    write(&mut blitter, 0x04, 0x00);

    blit(&mut blitter, 0x10);
    let layer = blitter.layer(0).unwrap();
    assert_eq!(layer.get(5, 5), 0x00);
    assert_eq!(layer.get(6, 5), 0x00);
    assert_eq!(layer.get(7, 5), 0xEE);
}

#[test]
fn test_programs_chain_through_blit_address() {
    let mut rom = vec![0x00, 0x07];
    rom.extend(program(0x00, &[DRAW_RUN, (0, 1), (1, 1), STOP]));
    let mut blitter = device(rom);
    setup(&mut blitter, 7, 7, 0x10);

    blit(&mut blitter, 0x10);
    assert_eq!(blitter.registers().blit_address, 2);
    assert!(lit_pixels(blitter.layer(0).unwrap()).is_empty());

    blit(&mut blitter, 0x10);
    assert_eq!(blitter.registers().blit_address, 4);
    assert_eq!(lit_pixels(blitter.layer(0).unwrap()), vec![(7, 7, 0x11)]);
}

#[test]
fn test_empty_program_header_keeps_address() {
    let mut blitter = device(vec![0x00, 0x00, 0xFF, 0x00]);
    setup(&mut blitter, 0, 0, 0x00);
    write(&mut blitter, 0x0d, 2);

    blit(&mut blitter, 0x10);

    assert_eq!(blitter.registers().blit_address, 2);
    assert!(lit_pixels(blitter.layer(0).unwrap()).is_empty());
}

#[test]
fn test_stop_advance_depends_on_fetch_unit() {
    let rom = vec![0x00, 0x07, 0x00, 0x07];

    let mut blitter = device(rom.clone());
    blit(&mut blitter, 0x10);
    assert_eq!(blitter.registers().blit_address, 2);

    let config = BlitterConfig {
        fetch_unit_bits: Some(16),
        ..BlitterConfig::default()
    };
    let mut blitter = device_with(config, rom);
    blit(&mut blitter, 0x10);
    assert_eq!(blitter.registers().blit_address, 1);
    blit(&mut blitter, 0x10);
    assert_eq!(blitter.registers().blit_address, 2);
}

#[test]
fn test_run_wraps_around_layer() {
    let rom = program(0x13, &[DRAW_RUN, (3, 4), (1, 2), STOP]);
    let mut blitter = device(rom);
    setup(&mut blitter, 510, 511, 0x00);

    blit(&mut blitter, 0x10);

    let layer = blitter.layer(0).unwrap();
    for x in [510, 511, 0, 1] {
        assert_eq!(layer.get(x, 511), 0x01);
    }
}

#[test]
fn test_multiple_destination_layers() {
    let rom = program(0x13, &[DRAW_RUN, (0, 4), (3, 2), STOP]);
    let mut blitter = device(rom);
    setup(&mut blitter, 1, 2, 0x00);
    write(&mut blitter, 0x00, 0b1010);

    blit(&mut blitter, 0x10);

    for id in 0..MAX_LAYERS {
        let expected = if id == 1 || id == 3 { 0x03 } else { 0x00 };
        assert_eq!(blitter.layer(id).unwrap().get(1, 2), expected, "layer {}", id);
    }
}

#[test]
fn test_run_is_clipped() {
    let rom = program(0x13, &[DRAW_RUN, (3, 4), (1, 2), STOP]);
    let mut blitter = device(rom);
    setup(&mut blitter, 100, 50, 0x00);
    write(&mut blitter, 0x16, 0);
    write(&mut blitter, 0x08, 101);
    write(&mut blitter, 0x20, 0x0D); // inside x, both y

    blit(&mut blitter, 0x10);

    let lit = lit_pixels(blitter.layer(0).unwrap());
    assert_eq!(lit, vec![(100, 50, 0x01), (101, 50, 0x01)]);
}

#[test]
fn test_swap_xy_transposes_runs() {
    let rom = program(0x13, &[DRAW_RUN, (2, 4), (1, 2), STOP]);
    let mut blitter = device(rom);
    setup(&mut blitter, 5, 40, 0x00);
    write(&mut blitter, 0x03, 0x10);

    blit(&mut blitter, 0x10);

    let lit = lit_pixels(blitter.layer(0).unwrap());
    assert_eq!(lit, vec![(40, 5, 0x01), (40, 6, 0x01), (40, 7, 0x01)]);
}

#[test]
fn test_hanakanz_variant() {
    let rom = program(0x00, &[(6, 3), (0, 1), (1, 1), (7, 3)]);
    let mut blitter = device_with(BlitterConfig::for_variant(GameVariant::Hanakanz), rom);
    setup(&mut blitter, 3, 3, 0x20);

    blit(&mut blitter, 0x10);

    assert_eq!(lit_pixels(blitter.layer(0).unwrap()), vec![(3, 3, 0x21)]);
    // 16 bits in 16-bit units
    assert_eq!(blitter.registers().blit_address, 1);
}

// ========== Direct primitives ==========

#[test]
fn test_fill_all() {
    let mut blitter = device(vec![0x00]);
    setup(&mut blitter, 200, 200, 0x22);
    blit(&mut blitter, 0x04);

    let layer = blitter.layer(0).unwrap();
    assert!(layer.as_bytes().iter().all(|&pen| pen == 0x22));
    assert!(lit_pixels(blitter.layer(1).unwrap()).is_empty());
}

#[test]
fn test_fill_from_cursor() {
    for code in [0x14u8, 0x43] {
        let mut blitter = device(vec![0x00]);
        setup(&mut blitter, 10, 511, 0x09);
        blit(&mut blitter, code);

        let layer = blitter.layer(0).unwrap();
        assert_eq!(layer.get(9, 511), 0x00);
        assert_eq!(layer.get(10, 511), 0x09);
        assert_eq!(layer.get(511, 511), 0x09);
        assert_eq!(layer.get(511, 510), 0x00);
        assert_eq!(lit_pixels(layer).len(), 502);
    }
}

#[test]
fn test_fill_ignores_clip() {
    let mut blitter = device(vec![0x00]);
    setup(&mut blitter, 0, 0, 0x09);
    write(&mut blitter, 0x20, 0x00);
    blit(&mut blitter, 0x04);

    assert_eq!(blitter.layer(0).unwrap().get(300, 300), 0x09);
}

#[test]
fn test_fill_band() {
    let mut blitter = device(vec![0x00]);
    setup(&mut blitter, 0, 100, 0x0C);
    write(&mut blitter, 0x0b, 102);
    blit(&mut blitter, 0x8c);

    let layer = blitter.layer(0).unwrap();
    assert_eq!(layer.get(0, 99), 0x00);
    assert_eq!(layer.get(0, 100), 0x0C);
    assert_eq!(layer.get(511, 101), 0x0C);
    assert_eq!(layer.get(0, 102), 0x00);
    assert_eq!(lit_pixels(layer).len(), 2 * 512);
}

#[test]
fn test_fill_band_wraps_start_row() {
    let mut blitter = device(vec![0x00]);
    setup(&mut blitter, 0, 600, 0x07);
    write(&mut blitter, 0x0b, 0x3FF);
    blit(&mut blitter, 0x8c);

    // Row 600 is row 88; the band runs to the bottom of the layer
    let layer = blitter.layer(0).unwrap();
    assert_eq!(layer.get(0, 87), 0x00);
    assert_eq!(layer.get(0, 88), 0x07);
    assert_eq!(layer.get(511, 511), 0x07);
    assert_eq!(lit_pixels(layer).len(), (512 - 88) * 512);
}

#[test]
fn test_fill_rect_inclusive() {
    let mut blitter = device(vec![0x00]);
    setup(&mut blitter, 20, 30, 0x44);
    write(&mut blitter, 0x0a, 2);
    write(&mut blitter, 0x0b, 1);
    blit(&mut blitter, 0x1c);

    let layer = blitter.layer(0).unwrap();
    assert_eq!(lit_pixels(layer).len(), 6);
    assert_eq!(layer.get(20, 30), 0x44);
    assert_eq!(layer.get(22, 31), 0x44);
    assert_eq!(layer.get(23, 31), 0x00);
}

#[test]
fn test_fill_rect_fully_clipped_still_completes() {
    let mut blitter = device(vec![0x00]);
    setup(&mut blitter, 20, 30, 0x44);
    write(&mut blitter, 0x20, 0x00);

    let token = blitter.execute_blit(0x1c);
    assert!(token.is_some());
    assert!(lit_pixels(blitter.layer(0).unwrap()).is_empty());
}

#[test]
fn test_horizontal_line_advances_x() {
    let mut blitter = device(vec![0x00]);
    setup(&mut blitter, 509, 3, 0x07);
    write(&mut blitter, 0x0c, 4);
    blit(&mut blitter, 0x13);

    let layer = blitter.layer(0).unwrap();
    for x in [509, 510, 511, 0, 1] {
        assert_eq!(layer.get(x, 3), 0x07);
    }
    assert_eq!(lit_pixels(layer).len(), 5);
    assert_eq!(blitter.registers().blit_x, 514);
    assert_eq!(blitter.registers().blit_y, 3);
}

#[test]
fn test_vertical_line_advances_y() {
    let mut blitter = device(vec![0x00]);
    setup(&mut blitter, 8, 510, 0x07);
    write(&mut blitter, 0x0c, 2);
    blit(&mut blitter, 0x1b);

    let layer = blitter.layer(0).unwrap();
    for y in [510, 511, 0] {
        assert_eq!(layer.get(8, y), 0x07);
    }
    assert_eq!(blitter.registers().blit_y, 513);
    assert_eq!(blitter.registers().blit_x, 8);
}
