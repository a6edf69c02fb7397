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

//! Blit completion scheduling
//!
//! The blitter draws synchronously but reports completion after a delay. Each
//! started blit hands back a [`CompletionToken`]; an embedding emulator either
//! keeps it in its own scheduler or hands it to [`BlitScheduler`], a small
//! cycle-counting queue.
//!
//! # Example
//!
//! ```
//! use dynablit::core::{BitSource, BlitScheduler, BlitterConfig, BlitterDevice};
//!
//! let rom = BitSource::new(vec![0x00, 0x07]).unwrap();
//! let mut blitter = BlitterDevice::new(BlitterConfig::default(), rom);
//! let mut scheduler = BlitScheduler::new();
//!
//! blitter.select(0x24);
//! if let Some(token) = blitter.apply(0x10) {
//!     scheduler.schedule(token);
//! }
//! assert!(blitter.is_busy());
//!
//! // Default ROM draw delay is 4096 cycles
//! for token in scheduler.advance(4096) {
//!     blitter.complete(token);
//! }
//! assert!(!blitter.is_busy());
//! ```

use crate::core::blitter::CompletionToken;

/// Global tick counter type (absolute time in device cycles since reset)
pub type GlobalTicks = u64;

#[derive(Debug)]
struct PendingCompletion {
    due: GlobalTicks,
    token: CompletionToken,
}

/// Cycle-counting completion queue
///
/// Tokens are kept sorted by due time; tokens due on the same cycle come out
/// in the order they were scheduled.
#[derive(Debug, Default)]
pub struct BlitScheduler {
    global_tick_counter: GlobalTicks,
    pending: Vec<PendingCompletion>,
}

impl BlitScheduler {
    /// Create an empty scheduler at time 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in cycles
    #[inline]
    pub fn now(&self) -> GlobalTicks {
        self.global_tick_counter
    }

    /// Number of tokens not yet due
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queue a token for its configured delay
    ///
    /// # Returns
    ///
    /// Absolute cycle at which the token becomes due
    pub fn schedule(&mut self, token: CompletionToken) -> GlobalTicks {
        let due = self.global_tick_counter + token.delay_cycles();
        let slot = self.pending.partition_point(|p| p.due <= due);

        log::trace!(
            "Timing: blit {} ({:?}) due at {} (+{})",
            token.id(),
            token.family(),
            due,
            token.delay_cycles()
        );

        self.pending.insert(slot, PendingCompletion { due, token });
        due
    }

    /// Cycles until the next token is due
    ///
    /// `None` when nothing is pending.
    pub fn downcount(&self) -> Option<GlobalTicks> {
        self.pending
            .first()
            .map(|p| p.due.saturating_sub(self.global_tick_counter))
    }

    /// Advance time and collect every token that has become due
    ///
    /// # Arguments
    ///
    /// * `cycles` - Elapsed device cycles
    ///
    /// # Returns
    ///
    /// Due tokens in due order; the caller redeems them on the device
    pub fn advance(&mut self, cycles: GlobalTicks) -> Vec<CompletionToken> {
        self.global_tick_counter += cycles;
        let now = self.global_tick_counter;
        let ready = self.pending.partition_point(|p| p.due <= now);

        self.pending
            .drain(..ready)
            .map(|p| {
                log::trace!(
                    "Timing: blit {} completed (late: {} cycles)",
                    p.token.id(),
                    now - p.due
                );
                p.token
            })
            .collect()
    }

    /// Drop all pending tokens and return to time 0
    pub fn reset(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Timing: dropping {} pending blits", self.pending.len());
        }
        self.pending.clear();
        self.global_tick_counter = 0;
    }
}
