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

//! Dynax/Nakanihon third-generation blitter emulation core
//!
//! This library emulates the bitstream blitter found on a long line of Dynax and
//! Nakanihon arcade boards: the register file and its two-phase write protocol,
//! the compressed ROM command decoder, the rasterizer for up to eight 512×512
//! indexed layers, and the layer compositor that produces the visible frame.
//!
//! # Example
//!
//! ```
//! use dynablit::core::{BitSource, BlitterConfig, BlitterDevice};
//!
//! let rom = BitSource::new(vec![0x00, 0x07]).unwrap();
//! let mut blitter = BlitterDevice::new(BlitterConfig::default(), rom);
//!
//! // Start a ROM draw from address 0
//! blitter.select(0x24);
//! let token = blitter.apply(0x10);
//! assert!(token.is_some());
//! ```

pub mod core;
