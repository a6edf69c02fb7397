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

//! Blitter configuration
//!
//! Everything that differs between boards but is fixed for the life of a
//! device: command table, fetch unit, layer count, clip formula, completion
//! delays and register layout.
//!
//! # TOML Format
//!
//! ```toml
//! variant = "hanakanz"
//! clip_mode = "extent"
//!
//! [timing]
//! rom_draw_cycles = 8192
//!
//! [frame]
//! width = 336
//! height = 256
//! ```
//!
//! Every field is optional. Explicit `command_table`, `fetch_unit_bits` and
//! `layer_count` values override the variant preset.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::blitter::{ClipMode, CommandFamily, CommandTable, RegisterLayout};
use super::error::{BlitterError, Result};

/// Board family presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GameVariant {
    /// Don Den Lover and most early boards
    #[default]
    Ddenlovr,
    /// Hana Kanzashi and related boards
    Hanakanz,
    /// Mahjong Fantasic Love (eight layers)
    Mjflove,
}

impl GameVariant {
    /// Opcode table for this family
    pub fn command_table(self) -> CommandTable {
        match self {
            Self::Ddenlovr => CommandTable::DDENLOVR,
            Self::Hanakanz => CommandTable::HANAKANZ,
            Self::Mjflove => CommandTable::MJFLOVE,
        }
    }

    /// Width of one blit address unit
    pub fn fetch_unit_bits(self) -> u32 {
        match self {
            Self::Ddenlovr => 8,
            Self::Hanakanz | Self::Mjflove => 16,
        }
    }

    /// Number of composited layers
    pub fn layer_count(self) -> usize {
        match self {
            Self::Ddenlovr | Self::Hanakanz => 4,
            Self::Mjflove => 8,
        }
    }
}

/// Completion delays in device clock cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlitTiming {
    /// Delay before a ROM draw completes
    pub rom_draw_cycles: u64,
    /// Delay before a direct primitive completes
    pub primitive_cycles: u64,
}

impl BlitTiming {
    /// Delay for a command family
    pub fn delay_for(&self, family: CommandFamily) -> u64 {
        match family {
            CommandFamily::RomDraw => self.rom_draw_cycles,
            CommandFamily::Primitive => self.primitive_cycles,
        }
    }
}

impl Default for BlitTiming {
    fn default() -> Self {
        Self {
            rom_draw_cycles: 4096,
            primitive_cycles: 256,
        }
    }
}

/// Visible frame size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSize {
    pub width: usize,
    pub height: usize,
}

impl Default for FrameSize {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
        }
    }
}

/// Device configuration
///
/// # Examples
///
/// ```
/// use dynablit::core::BlitterConfig;
///
/// let config = BlitterConfig::from_toml_str("variant = \"mjflove\"").unwrap();
/// assert_eq!(config.layer_count(), 8);
/// assert_eq!(config.fetch_unit_bits(), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlitterConfig {
    #[serde(default)]
    pub variant: GameVariant,
    #[serde(default)]
    pub command_table: Option<CommandTable>,
    #[serde(default)]
    pub fetch_unit_bits: Option<u32>,
    #[serde(default)]
    pub layer_count: Option<usize>,
    #[serde(default)]
    pub clip_mode: ClipMode,
    #[serde(default)]
    pub timing: BlitTiming,
    #[serde(default)]
    pub frame: FrameSize,
    #[serde(default)]
    pub register_layout: RegisterLayout,
}

impl BlitterConfig {
    /// Preset configuration for a board family
    pub fn for_variant(variant: GameVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns an error for malformed TOML, a fetch unit other than 8 or 16,
    /// or a layer count other than 4 or 8.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Blitter config loaded from {}", path.as_ref().display());
        Ok(config)
    }

    /// Check the overrides against what the hardware supports
    pub fn validate(&self) -> Result<()> {
        let unit = self.fetch_unit_bits();
        if unit != 8 && unit != 16 {
            return Err(BlitterError::InvalidFetchUnit(unit));
        }
        let layers = self.layer_count();
        if layers != 4 && layers != 8 {
            return Err(BlitterError::InvalidLayerCount(layers));
        }
        Ok(())
    }

    /// Effective command table
    pub fn command_table(&self) -> CommandTable {
        self.command_table.unwrap_or_else(|| self.variant.command_table())
    }

    /// Effective fetch unit in bits
    pub fn fetch_unit_bits(&self) -> u32 {
        self.fetch_unit_bits.unwrap_or_else(|| self.variant.fetch_unit_bits())
    }

    /// Effective number of composited layers
    pub fn layer_count(&self) -> usize {
        self.layer_count.unwrap_or_else(|| self.variant.layer_count())
    }
}
