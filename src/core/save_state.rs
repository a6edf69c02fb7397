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

//! Save state serialization for the blitter
//!
//! This module captures everything the host can program into a blitter so a
//! session can be resumed later.
//!
//! # Save State Format
//!
//! Save states are serialized using bincode for efficient binary encoding.
//! The state includes:
//! - Metadata (timestamp, variant, blit and frame counters)
//! - Register file, flattened into plain integers and per-layer arrays
//! - Bus state (latched selects per port, interrupt enable and pending)
//! - Layer pixmaps as eight flat 512×512 byte blobs
//!
//! The ROM is not saved; it is supplied again when the device is rebuilt.
//! Pending completions are not saved either: a restored device is idle.
//!
//! # Version Compatibility
//!
//! Save states include a version number to ensure compatibility.
//! Loading a save state with a different version will fail with an error.
//!
//! # Example
//!
//! ```no_run
//! use dynablit::core::save_state::SaveState;
//! use dynablit::core::{BitSource, BlitterConfig, BlitterDevice};
//!
//! let rom = BitSource::new(std::fs::read("blitter.rom").unwrap()).unwrap();
//! let mut blitter = BlitterDevice::new(BlitterConfig::default(), rom);
//! // ... run emulation ...
//!
//! SaveState::from_device(&blitter, 0).save_to_file("blitter.state").unwrap();
//!
//! // Later
//! let state = SaveState::load_from_file("blitter.state").unwrap();
//! state.apply_to(&mut blitter).unwrap();
//! ```

use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use super::blitter::{
    BlitterDevice, BlitterPort, BusPhase, ClipControl, ClipWindow, FlipFlags, LayerControl,
    LayerPixmap, RegisterFile, LAYER_BYTES, MAX_LAYERS,
};
use super::error::{Result, SaveStateError};

/// Current save state format version
///
/// Increment this when making breaking changes to the save state format.
pub const SAVE_STATE_VERSION: u32 = 1;

/// Complete blitter state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct SaveState {
    /// Save state format version
    pub version: u32,

    /// Descriptive information
    pub metadata: SaveStateMetadata,

    /// Register file
    pub registers: RegisterState,

    /// Bus and interrupt state
    pub bus: BusState,

    /// Layer pixmaps, row-major, one blob per layer
    pub layers: Vec<Vec<u8>>,
}

/// Save state metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct SaveStateMetadata {
    /// When the state was captured
    #[bincode(with_serde)]
    pub timestamp: DateTime<Utc>,

    /// Board family the device was configured as
    pub variant: String,

    /// Blits started since the device was built
    pub blit_count: u64,

    /// Frames composited, as counted by the host
    pub frame_count: u64,
}

/// Register file, flattened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct RegisterState {
    pub dest_layer_mask: u16,
    pub flip_screen: u8,
    pub blit_x: i32,
    pub blit_y: i32,
    pub blit_address: u32,
    pub pen: u8,
    pub pen_mode: bool,
    pub pen_mask: u8,
    pub rect_width: i32,
    pub rect_height: i32,
    pub line_length: i32,
    pub flip: u8,

    pub clip_x: i32,
    pub clip_y: i32,
    pub clip_width: i32,
    pub clip_height: i32,
    pub clip_ctrl: u8,

    pub scroll_x: [i32; MAX_LAYERS],
    pub scroll_y: [i32; MAX_LAYERS],
    pub palette_base: [u16; MAX_LAYERS],
    pub palette_mask: [u8; MAX_LAYERS],
    pub transparency_pen: [u8; MAX_LAYERS],
    pub transparency_mask: [u8; MAX_LAYERS],

    pub priority_index: u8,
    pub priority_index2: u8,
    pub layer_enable_mask: u8,
    pub layer_enable_mask2: u8,
    pub bg_color: u8,
    pub bg_color2: u8,
}

impl From<&RegisterFile> for RegisterState {
    fn from(regs: &RegisterFile) -> Self {
        Self {
            dest_layer_mask: regs.dest_layer_mask,
            flip_screen: regs.flip_screen,
            blit_x: regs.blit_x,
            blit_y: regs.blit_y,
            blit_address: regs.blit_address,
            pen: regs.pen,
            pen_mode: regs.pen_mode,
            pen_mask: regs.pen_mask,
            rect_width: regs.rect_width,
            rect_height: regs.rect_height,
            line_length: regs.line_length,
            flip: regs.flip.bits(),
            clip_x: regs.clip.x,
            clip_y: regs.clip.y,
            clip_width: regs.clip.width,
            clip_height: regs.clip.height,
            clip_ctrl: regs.clip.ctrl.bits(),
            scroll_x: regs.layers.map(|l| l.scroll_x),
            scroll_y: regs.layers.map(|l| l.scroll_y),
            palette_base: regs.layers.map(|l| l.palette_base),
            palette_mask: regs.layers.map(|l| l.palette_mask),
            transparency_pen: regs.layers.map(|l| l.transparency_pen),
            transparency_mask: regs.layers.map(|l| l.transparency_mask),
            priority_index: regs.priority_index,
            priority_index2: regs.priority_index2,
            layer_enable_mask: regs.layer_enable_mask,
            layer_enable_mask2: regs.layer_enable_mask2,
            bg_color: regs.bg_color,
            bg_color2: regs.bg_color2,
        }
    }
}

impl From<&RegisterState> for RegisterFile {
    fn from(state: &RegisterState) -> Self {
        let layers = std::array::from_fn(|i| LayerControl {
            scroll_x: state.scroll_x[i],
            scroll_y: state.scroll_y[i],
            palette_base: state.palette_base[i],
            palette_mask: state.palette_mask[i],
            transparency_pen: state.transparency_pen[i],
            transparency_mask: state.transparency_mask[i],
        });

        Self {
            dest_layer_mask: state.dest_layer_mask,
            flip_screen: state.flip_screen,
            blit_x: state.blit_x,
            blit_y: state.blit_y,
            blit_address: state.blit_address,
            pen: state.pen,
            pen_mode: state.pen_mode,
            pen_mask: state.pen_mask,
            rect_width: state.rect_width,
            rect_height: state.rect_height,
            line_length: state.line_length,
            flip: FlipFlags::from_bits_retain(state.flip),
            clip: ClipWindow {
                x: state.clip_x,
                y: state.clip_y,
                width: state.clip_width,
                height: state.clip_height,
                ctrl: ClipControl::from_bits_truncate(state.clip_ctrl),
            },
            layers,
            priority_index: state.priority_index,
            priority_index2: state.priority_index2,
            layer_enable_mask: state.layer_enable_mask,
            layer_enable_mask2: state.layer_enable_mask2,
            bg_color: state.bg_color,
            bg_color2: state.bg_color2,
        }
    }
}

/// Bus phases and interrupt lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct BusState {
    /// Select byte latched on the primary port, if any
    pub primary_select: Option<u8>,
    /// Select byte latched on the secondary port, if any
    pub secondary_select: Option<u8>,
    pub irq_enable: bool,
    pub irq_pending: bool,
}

fn latched(phase: BusPhase) -> Option<u8> {
    match phase {
        BusPhase::AwaitingSelect => None,
        BusPhase::AwaitingData(select) => Some(select),
    }
}

fn phase(latched: Option<u8>) -> BusPhase {
    latched.map_or(BusPhase::AwaitingSelect, BusPhase::AwaitingData)
}

impl SaveState {
    /// Capture the current device state
    ///
    /// # Arguments
    ///
    /// * `device` - Blitter to capture
    /// * `frame_count` - Host frame counter, stored as metadata
    pub fn from_device(device: &BlitterDevice, frame_count: u64) -> Self {
        Self {
            version: SAVE_STATE_VERSION,
            metadata: SaveStateMetadata {
                timestamp: Utc::now(),
                variant: format!("{:?}", device.config().variant),
                blit_count: device.blit_count(),
                frame_count,
            },
            registers: RegisterState::from(device.registers()),
            bus: BusState {
                primary_select: latched(device.bus_phase(BlitterPort::Primary)),
                secondary_select: latched(device.bus_phase(BlitterPort::Secondary)),
                irq_enable: device.irq_enabled(),
                irq_pending: device.irq_pending(),
            },
            layers: device
                .layers()
                .iter()
                .map(|layer| layer.as_bytes().to_vec())
                .collect(),
        }
    }

    /// Restore this state into a device
    ///
    /// The device keeps its ROM and configuration. Tokens issued before the
    /// restore become stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the version, layer count or a layer size does not
    /// match; the device is left untouched in that case.
    pub fn apply_to(&self, device: &mut BlitterDevice) -> Result<()> {
        self.check_version()?;

        if self.layers.len() != MAX_LAYERS {
            return Err(SaveStateError::LayerCount {
                expected: MAX_LAYERS,
                got: self.layers.len(),
            }
            .into());
        }

        let mut layers: [LayerPixmap; MAX_LAYERS] = Default::default();
        for (id, (slot, blob)) in layers.iter_mut().zip(&self.layers).enumerate() {
            *slot = LayerPixmap::from_bytes(blob.clone()).ok_or(SaveStateError::LayerSize {
                layer: id,
                expected: LAYER_BYTES,
                got: blob.len(),
            })?;
        }

        device.restore(
            RegisterFile::from(&self.registers),
            layers,
            [phase(self.bus.primary_select), phase(self.bus.secondary_select)],
            self.bus.irq_enable,
            self.bus.irq_pending,
        );

        log::info!(
            "Save state restored ({}, saved {})",
            self.metadata.variant,
            self.metadata.timestamp
        );
        Ok(())
    }

    fn check_version(&self) -> Result<()> {
        if self.version != SAVE_STATE_VERSION {
            return Err(SaveStateError::IncompatibleVersion {
                expected: SAVE_STATE_VERSION,
                got: self.version,
            }
            .into());
        }
        Ok(())
    }

    /// Encode to a byte blob
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let config = config::standard();
        let encoded = bincode::encode_to_vec(self, config).map_err(SaveStateError::from)?;
        Ok(encoded)
    }

    /// Decode from a byte blob and verify version compatibility
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let config = config::standard();
        let (state, _): (Self, usize) =
            bincode::decode_from_slice(bytes, config).map_err(SaveStateError::from)?;
        state.check_version()?;
        Ok(state)
    }

    /// Save state to file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be created
    /// - Serialization fails
    /// - Write operation fails
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load state from file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be opened or read
    /// - Deserialization fails
    /// - Version is incompatible
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Self::from_bytes(&buffer)
    }
}
