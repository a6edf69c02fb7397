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

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use log::{info, warn};

use dynablit::core::config::GameVariant;
use dynablit::core::save_state::{RegisterState, SaveState};
use dynablit::core::{BitSource, BlitScheduler, BlitterConfig, BlitterDevice, Frame};

/// Dynax blitter command line runner
#[derive(Parser)]
#[command(name = "dynablit")]
#[command(about = "Run one blit from a blitter ROM and write the composited frame", long_about = None)]
struct Args {
    /// Path to the blitter graphics ROM
    rom_file: PathBuf,

    /// Board configuration (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Board family preset, overriding the config file
    #[arg(long, value_enum)]
    variant: Option<GameVariant>,

    /// Blit address in fetch units
    #[arg(short = 'a', long, default_value = "0", value_parser = parse_number::<u32>)]
    address: u32,

    /// Cursor x (0-0x3FF)
    #[arg(short = 'x', long, default_value = "0", value_parser = parse_number::<u16>)]
    x: u16,

    /// Cursor y (0-0x3FF)
    #[arg(short = 'y', long, default_value = "0", value_parser = parse_number::<u16>)]
    y: u16,

    /// Pen register
    #[arg(short = 'p', long, default_value = "0", value_parser = parse_number::<u8>)]
    pen: u8,

    /// Destination layer mask (primary port)
    #[arg(short = 'd', long, default_value = "1", value_parser = parse_number::<u8>)]
    dest: u8,

    /// Start register value
    #[arg(short = 's', long, default_value = "0x10", value_parser = parse_number::<u8>)]
    start: u8,

    /// Output frame (binary PGM)
    #[arg(short = 'o', long, default_value = "frame.pgm")]
    output: PathBuf,

    /// Write the register file as JSON
    #[arg(long)]
    dump_regs: Option<PathBuf>,

    /// Restore a save state before programming the blit
    #[arg(long)]
    load_state: Option<PathBuf>,

    /// Write a save state after the blit completes
    #[arg(long)]
    save_state: Option<PathBuf>,
}

/// Parse a decimal or `0x`-prefixed hexadecimal number
fn parse_number<T>(text: &str) -> Result<T, String>
where
    T: TryFrom<u64>,
{
    let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    }
    .map_err(|e| e.to_string())?;
    T::try_from(value).map_err(|_| format!("{} is out of range", text))
}

/// Select a register and write a value with its carry bits
fn write_register(device: &mut BlitterDevice, index: u8, value: u16) {
    let carry = ((value >> 8) & 3) as u8;
    device.select(index | (carry << 6));
    if let Some(token) = device.apply((value & 0xFF) as u8) {
        warn!(
            "Register {:02X} started blit {}; its completion is dropped",
            index,
            token.id()
        );
    }
}

/// Write a frame as a binary PGM, 16-bit when any index exceeds 255
fn write_pgm(path: &Path, frame: &Frame) -> std::io::Result<()> {
    let max = frame.pixels.iter().copied().max().unwrap_or(0);
    let maxval: u16 = if max > 0xFF { 0xFFFF } else { 0xFF };

    let mut out = BufWriter::new(File::create(path)?);
    write!(out, "P5\n{} {}\n{}\n", frame.width, frame.height, maxval)?;
    for &pixel in &frame.pixels {
        if maxval > 0xFF {
            out.write_all(&pixel.to_be_bytes())?;
        } else {
            out.write_all(&[pixel as u8])?;
        }
    }
    out.flush()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional .env with RUST_LOG and friends
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("dynablit v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => BlitterConfig::load_from_file(path)?,
        None => BlitterConfig::default(),
    };
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    config.validate()?;

    info!("Loading ROM from: {}", args.rom_file.display());
    let rom = BitSource::new(fs::read(&args.rom_file)?)?;
    info!("ROM loaded ({} bytes)", rom.len());

    let mut blitter = BlitterDevice::new(config, rom);

    if let Some(path) = &args.load_state {
        SaveState::load_from_file(path)?.apply_to(&mut blitter)?;
        info!("Save state loaded from: {}", path.display());
    }

    // Program the blit through the bus
    let layout = blitter.config().register_layout;
    write_register(&mut blitter, layout.dest_layer, u16::from(args.dest));
    write_register(&mut blitter, layout.pen, u16::from(args.pen));
    write_register(&mut blitter, layout.blit_x, args.x & 0x3FF);
    write_register(&mut blitter, layout.blit_y, args.y & 0x3FF);
    for (byte, shift) in [0u8, 8, 16].into_iter().enumerate() {
        let value = (args.address >> shift) & 0xFF;
        write_register(&mut blitter, layout.address + byte as u8, value as u16);
    }

    blitter.select(layout.start);
    let mut scheduler = BlitScheduler::new();
    match blitter.apply(args.start) {
        Some(token) => {
            let due = scheduler.schedule(token);
            info!("Blit started, completion due at cycle {}", due);
        }
        None => warn!("Start value {:02X} did not start a blit", args.start),
    }

    while let Some(wait) = scheduler.downcount() {
        for token in scheduler.advance(wait) {
            blitter.complete(token);
        }
    }
    info!(
        "Blitter idle after {} cycles (address now {:06X})",
        scheduler.now(),
        blitter.registers().blit_address
    );

    let frame = blitter.composite_frame();
    write_pgm(&args.output, &frame)?;
    info!(
        "Frame {}x{} written to: {}",
        frame.width,
        frame.height,
        args.output.display()
    );

    if let Some(path) = &args.dump_regs {
        let json = serde_json::to_string_pretty(&RegisterState::from(blitter.registers()))?;
        fs::write(path, json)?;
        info!("Registers written to: {}", path.display());
    }

    if let Some(path) = &args.save_state {
        SaveState::from_device(&blitter, 1).save_to_file(path)?;
        info!("Save state written to: {}", path.display());
    }

    Ok(())
}
