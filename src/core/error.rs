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

//! Blitter error types
//!
//! Only configuration and persistence problems are errors. Anomalies in ROM
//! content or register traffic are reported through `log` and never surface here.

use thiserror::Error;

/// Result type for blitter operations
pub type Result<T> = std::result::Result<T, BlitterError>;

/// Main error type for the blitter core
#[derive(Error, Debug)]
pub enum BlitterError {
    #[error("Blitter ROM is empty")]
    EmptyBitSource,

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Unsupported fetch unit: {0} bits (expected 8 or 16)")]
    InvalidFetchUnit(u32),

    #[error("Unsupported layer count: {0} (expected 4 or 8)")]
    InvalidLayerCount(usize),

    #[error("Save state error: {0}")]
    SaveState(#[from] SaveStateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Save-state specific error types
#[derive(Error, Debug)]
pub enum SaveStateError {
    #[error("Incompatible save state version: expected {expected}, got {got}")]
    IncompatibleVersion { expected: u32, got: u32 },

    #[error("Layer {layer} blob has {got} bytes (expected {expected})")]
    LayerSize {
        layer: usize,
        expected: usize,
        got: usize,
    },

    #[error("Save state has {got} layers (expected {expected})")]
    LayerCount { expected: usize, got: usize },

    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}
