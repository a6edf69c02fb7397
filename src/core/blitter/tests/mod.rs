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

//! Blitter module tests
//!
//! Tests are organized into the following modules:
//! - `basic`: Construction, reset, completion tokens, status and video control ports
//! - `bus`: Select/data protocol, secondary port and direct writes
//! - `drawing`: ROM programs and direct primitives driven through the device
//! - `compositor`: Priority, transparency, palette, scroll and layer banks
//! - `properties`: Randomized wraparound, clipping and bus equivalence checks
//! - `end_to_end`: Full path from register writes to a composited frame

mod drawing;
mod helpers;
