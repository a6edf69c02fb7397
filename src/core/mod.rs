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

//! Core emulation components
//!
//! This module contains the blitter and its supporting pieces:
//! - Blitter device (register bus, decoder, rasterizer, compositor)
//! - Configuration (variant presets, timing, clip formula)
//! - Completion scheduling
//! - Save states

pub mod blitter;
pub mod config;
pub mod error;
pub mod save_state;
pub mod timing;

// Re-export commonly used types
pub use blitter::{BitSource, BlitterDevice, CompletionToken, Frame, LayerPixmap};
pub use config::BlitterConfig;
pub use error::{BlitterError, Result};
pub use timing::BlitScheduler;
