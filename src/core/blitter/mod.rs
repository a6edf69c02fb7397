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

//! Blitter device
//!
//! This module implements the third-generation Dynax/Nakanihon blitter: a
//! register file programmed over an 8-bit select/data bus, a decoder for
//! run-length encoded drawing programs stored in a graphics ROM, a rasterizer
//! writing into up to eight 512×512 indexed layers, and the compositor that
//! turns those layers into the visible frame.
//!
//! # Pipeline
//!
//! ```text
//! host ─ select/apply ─▶ RegisterFile ─ start ─┬─▶ BitstreamDecoder ─▶ Rasterizer ─▶ layers
//!                                              └─▶ primitive ─────────▶ Rasterizer ─▶ layers
//!
//! once per frame:   layers + RegisterFile ─▶ LayerCompositor ─▶ Frame
//! ```
//!
//! Blits draw synchronously. Completion is reported later by redeeming the
//! [`CompletionToken`] each started blit returns.
//!
//! # References
//!
//! - MAME `ddenlovr.cpp` blitter notes

mod bitsource;
mod compositor;
mod decoder;
mod rasterizer;
mod registers;
mod types;

#[cfg(test)]
mod tests;

use bitflags::bitflags;

pub use bitsource::{BitFetch, BitSource};
pub use compositor::{LayerCompositor, PRIORITY_ORDER};
pub use decoder::{BitstreamDecoder, RunOp, MAX_PEN_BITS};
pub use rasterizer::{BlitSummary, LayerPixmap, Rasterizer, LAYER_BYTES};
pub use registers::{
    wide_value, BusPhase, ClipWindow, LayerControl, RegisterField, RegisterFile, RegisterLayout,
};
pub use types::{
    BlitCommand, BlitterPort, ClipControl, ClipMode, CommandFamily, CommandTable, FlipFlags,
    Frame, StartCode, LAYER_MASK, LAYER_SIZE, MAX_LAYERS,
};

use crate::core::config::BlitterConfig;

/// Proof that a blit was started
///
/// Redeem it with [`BlitterDevice::complete`] once `delay_cycles` have
/// elapsed. Tokens cannot be copied, so each blit completes at most once.
/// Tokens issued before a reset or save-state load are stale and redeeming
/// them has no effect.
#[must_use = "the blitter stays busy until the token is redeemed"]
#[derive(Debug, PartialEq, Eq)]
pub struct CompletionToken {
    id: u64,
    generation: u32,
    family: CommandFamily,
    delay_cycles: u64,
}

impl CompletionToken {
    /// Sequence number of the blit
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Command family that determined the delay
    pub fn family(&self) -> CommandFamily {
        self.family
    }

    /// Cycles between the start of the blit and its completion
    pub fn delay_cycles(&self) -> u64 {
        self.delay_cycles
    }
}

bitflags! {
    /// Status lines visible to the host
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BlitterStatus: u8 {
        /// A blit has started and not yet completed
        const BUSY = 0x01;
        /// Completion interrupt raised and not acknowledged
        const IRQ = 0x02;
    }
}

/// Blitter chip
///
/// Owns the register file, the layer pixmaps and the ROM handle. All access
/// goes through `&mut self`; a device is not shared between threads.
///
/// # Examples
///
/// ```
/// use dynablit::core::{BitSource, BlitterConfig, BlitterDevice};
///
/// let rom = BitSource::new(vec![0xFF]).unwrap();
/// let mut blitter = BlitterDevice::new(BlitterConfig::default(), rom);
///
/// // Fill a 4x2 rectangle on layer 0 with pen 0x21
/// blitter.write_wide(0x00, 0, 0x01); // destination layers
/// blitter.write_wide(0x04, 0, 0x21); // pen
/// blitter.write_wide(0x0a, 0, 3); // width - 1
/// blitter.write_wide(0x0b, 0, 1); // height - 1
/// let token = blitter.write_wide(0x24, 0, 0x1c).unwrap();
///
/// assert_eq!(blitter.layer(0).unwrap().get(3, 1), 0x21);
/// assert!(blitter.is_busy());
/// assert!(blitter.complete(token));
/// assert!(!blitter.is_busy());
/// ```
#[derive(Debug)]
pub struct BlitterDevice {
    config: BlitterConfig,
    command_table: CommandTable,
    fetch_unit_bits: u32,
    layout: RegisterLayout,

    /// Programmable state
    regs: RegisterFile,

    /// Layer pixmaps, always eight; four-layer boards only composite 0-3
    layers: [LayerPixmap; MAX_LAYERS],

    rom: BitSource,
    compositor: LayerCompositor,

    /// Select/data phase of the primary and secondary ports
    bus: [BusPhase; 2],

    /// Tokens of the current generation not yet redeemed
    outstanding: u32,
    next_token_id: u64,
    generation: u32,

    irq_enable: bool,
    irq_pending: bool,
}

impl BlitterDevice {
    /// Create a device in its reset state
    ///
    /// An invalid configuration is reported and the variant preset is used
    /// for the offending values.
    ///
    /// # Arguments
    ///
    /// * `config` - Board configuration
    /// * `rom` - Blitter graphics ROM
    pub fn new(config: BlitterConfig, rom: BitSource) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                log::warn!("Blitter: {}; using {:?} preset", err, config.variant);
                BlitterConfig {
                    fetch_unit_bits: None,
                    layer_count: None,
                    ..config
                }
            }
        };

        let compositor = LayerCompositor::new(
            config.frame.width,
            config.frame.height,
            config.layer_count(),
        );

        log::debug!(
            "Blitter: {:?}, {}-bit fetch unit, {} layers, {} byte ROM",
            config.variant,
            config.fetch_unit_bits(),
            config.layer_count(),
            rom.len()
        );

        Self {
            command_table: config.command_table(),
            fetch_unit_bits: config.fetch_unit_bits(),
            layout: config.register_layout,
            regs: RegisterFile::new(),
            layers: Default::default(),
            rom,
            compositor,
            bus: [BusPhase::AwaitingSelect; 2],
            outstanding: 0,
            next_token_id: 0,
            generation: 0,
            irq_enable: false,
            irq_pending: false,
            config,
        }
    }

    /// Return to the power-on state
    ///
    /// Clears registers and layers. Tokens issued before the reset become stale.
    pub fn reset(&mut self) {
        self.regs = RegisterFile::new();
        for layer in self.layers.iter_mut() {
            layer.clear();
        }
        self.bus = [BusPhase::AwaitingSelect; 2];
        self.invalidate_tokens();
        self.irq_enable = false;
        self.irq_pending = false;
        log::debug!("Blitter: reset");
    }

    fn invalidate_tokens(&mut self) {
        self.outstanding = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    #[inline]
    fn port_slot(port: BlitterPort) -> usize {
        match port {
            BlitterPort::Primary => 0,
            BlitterPort::Secondary => 1,
        }
    }

    // ========== Register bus ==========

    /// Latch a register select byte on the primary port
    pub fn select(&mut self, value: u8) {
        self.select_on(BlitterPort::Primary, value);
    }

    /// Write a data byte to the register selected on the primary port
    ///
    /// # Returns
    ///
    /// A completion token if the write started a blit
    pub fn apply(&mut self, data: u8) -> Option<CompletionToken> {
        self.apply_on(BlitterPort::Primary, data)
    }

    /// Latch a register select byte on a port
    ///
    /// A second select before a data write replaces the first.
    pub fn select_on(&mut self, port: BlitterPort, value: u8) {
        let phase = &mut self.bus[Self::port_slot(port)];
        if let BusPhase::AwaitingData(previous) = *phase {
            log::debug!(
                "Blitter: {:?} select {:02X} replaced by {:02X}",
                port,
                previous,
                value
            );
        }
        *phase = BusPhase::AwaitingData(value);
    }

    /// Write a data byte on a port
    ///
    /// Stores `data | carry << 8` into the latched register and returns the
    /// port to its select phase. A data write with nothing selected is
    /// reported and ignored.
    pub fn apply_on(&mut self, port: BlitterPort, data: u8) -> Option<CompletionToken> {
        let slot = Self::port_slot(port);
        match self.bus[slot] {
            BusPhase::AwaitingSelect => {
                log::warn!(
                    "Blitter: {:?} data {:02X} written with no register selected",
                    port,
                    data
                );
                None
            }
            BusPhase::AwaitingData(select) => {
                self.bus[slot] = BusPhase::AwaitingSelect;
                let value = u16::from(data) | BusPhase::carry(select);
                self.write_register(port, BusPhase::index(select), value)
            }
        }
    }

    /// Combined single-port access: even offsets select, odd offsets write data
    pub fn write_port(&mut self, offset: u32, data: u8) -> Option<CompletionToken> {
        if offset & 1 == 0 {
            self.select(data);
            None
        } else {
            self.apply(data)
        }
    }

    /// Write a register directly, bypassing the select/data phases
    ///
    /// Equivalent to `select(index | carry << 6)` followed by `apply(low)`,
    /// without disturbing a select latched on the port.
    pub fn write_wide(&mut self, index: u8, carry: u8, low: u8) -> Option<CompletionToken> {
        self.write_register(BlitterPort::Primary, index & 0x3F, wide_value(carry, low))
    }

    fn write_register(
        &mut self,
        port: BlitterPort,
        index: u8,
        value: u16,
    ) -> Option<CompletionToken> {
        match self.layout.field(index) {
            Some(RegisterField::Start) => self.execute_blit((value & 0xFF) as u8),
            Some(field) => {
                self.regs.write_field(port, field, value);
                None
            }
            None => {
                log::warn!(
                    "Blitter: {:?} write to unknown register {:02X} = {:03X}",
                    port,
                    index,
                    value
                );
                None
            }
        }
    }

    /// Phase of a port's select/data protocol
    pub fn bus_phase(&self, port: BlitterPort) -> BusPhase {
        self.bus[Self::port_slot(port)]
    }

    // ========== Blit execution ==========

    /// Run the operation for a start register value
    ///
    /// All pixels are written before this returns.
    ///
    /// # Returns
    ///
    /// A token carrying the configured completion delay, or `None` for an
    /// unrecognized start code (which does nothing else)
    pub fn execute_blit(&mut self, code: u8) -> Option<CompletionToken> {
        let Some(start) = StartCode::from_u8(code) else {
            log::warn!("Blitter: unknown start code {:02X}", code);
            return None;
        };

        let raster = Rasterizer::new(&self.regs, self.config.clip_mode);
        let pen = self.regs.pen;

        let summary = match start {
            StartCode::FillAll => raster.fill_from(&mut self.layers, 0, 0, pen),
            StartCode::FillFromCursor => {
                raster.fill_from(&mut self.layers, self.regs.blit_x, self.regs.blit_y, pen)
            }
            StartCode::DrawFromRom => {
                let mut decoder = BitstreamDecoder::new(
                    &self.rom,
                    self.command_table,
                    self.fetch_unit_bits,
                    self.regs.blit_address,
                );
                let summary = raster.run_bitstream(&mut self.layers, &mut self.regs, &mut decoder);
                self.regs.blit_address = decoder.end_address();
                summary
            }
            StartCode::HorizontalLine => raster.horizontal_line(&mut self.layers, &mut self.regs),
            StartCode::VerticalLine => raster.vertical_line(&mut self.layers, &mut self.regs),
            StartCode::FillRect => raster.fill_rect(&mut self.layers, &self.regs),
            StartCode::FillBand => raster.fill_band(&mut self.layers, &self.regs),
        };

        log::debug!(
            "Blitter: {:?} ({:02X}) dest={:03X} at ({:03X},{:03X}) addr={:06X}: {} plotted, {} clipped",
            start,
            code,
            self.regs.dest_layer_mask,
            self.regs.blit_x,
            self.regs.blit_y,
            self.regs.blit_address,
            summary.plotted,
            summary.clipped
        );

        Some(self.issue_token(start.family()))
    }

    fn issue_token(&mut self, family: CommandFamily) -> CompletionToken {
        let token = CompletionToken {
            id: self.next_token_id,
            generation: self.generation,
            family,
            delay_cycles: self.config.timing.delay_for(family),
        };
        self.next_token_id += 1;
        self.outstanding += 1;
        token
    }

    /// Redeem a completion token
    ///
    /// Busy clears once every outstanding blit has completed. Each completion
    /// raises the interrupt when it is enabled.
    ///
    /// # Returns
    ///
    /// `false` for a stale token, which is ignored
    pub fn complete(&mut self, token: CompletionToken) -> bool {
        if token.generation != self.generation {
            log::debug!("Blitter: ignoring stale completion of blit {}", token.id);
            return false;
        }

        self.outstanding = self.outstanding.saturating_sub(1);
        if self.irq_enable {
            self.irq_pending = true;
        }
        true
    }

    /// Busy line level
    pub fn is_busy(&self) -> bool {
        self.outstanding > 0
    }

    /// Busy and interrupt status
    pub fn status(&self) -> BlitterStatus {
        let mut status = BlitterStatus::empty();
        status.set(BlitterStatus::BUSY, self.is_busy());
        status.set(BlitterStatus::IRQ, self.irq_pending);
        status
    }

    /// Completion interrupt line level
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    /// Acknowledge the completion interrupt
    pub fn acknowledge_irq(&mut self) {
        self.irq_pending = false;
    }

    /// Enable or disable the completion interrupt
    pub fn set_irq_enable(&mut self, enable: bool) {
        self.irq_enable = enable;
    }

    /// Whether completions raise the interrupt
    pub fn irq_enabled(&self) -> bool {
        self.irq_enable
    }

    // ========== Video control ports ==========

    fn layer_control(&mut self, layer: usize) -> Option<&mut LayerControl> {
        let control = self.regs.layers.get_mut(layer);
        if control.is_none() {
            log::warn!("Blitter: video control write to layer {}", layer);
        }
        control
    }

    /// Palette bits a layer contributes where its palette mask is clear
    pub fn set_palette_base(&mut self, layer: usize, base: u16) {
        if let Some(control) = self.layer_control(layer) {
            control.palette_base = base;
        }
    }

    /// Pixel bits a layer passes through to the frame
    pub fn set_palette_mask(&mut self, layer: usize, mask: u8) {
        if let Some(control) = self.layer_control(layer) {
            control.palette_mask = mask;
        }
    }

    /// Pen a layer treats as transparent
    pub fn set_transparency_pen(&mut self, layer: usize, pen: u8) {
        if let Some(control) = self.layer_control(layer) {
            control.transparency_pen = pen;
        }
    }

    /// Pixel bits compared against the transparency pen
    pub fn set_transparency_mask(&mut self, layer: usize, mask: u8) {
        if let Some(control) = self.layer_control(layer) {
            control.transparency_mask = mask;
        }
    }

    /// Priority permutation for layers 0-3 (5-bit register)
    pub fn set_priority(&mut self, value: u8) {
        self.regs.priority_index = Self::priority_value(value);
    }

    /// Priority permutation for layers 4-7 (5-bit register)
    pub fn set_priority2(&mut self, value: u8) {
        self.regs.priority_index2 = Self::priority_value(value);
    }

    fn priority_value(value: u8) -> u8 {
        let value = value & 0x1F;
        if usize::from(value) >= PRIORITY_ORDER.len() {
            log::warn!("Blitter: layer priority {:02X} has no permutation", value);
        }
        value
    }

    /// Enable bits for layers 0-3
    pub fn set_layer_enable(&mut self, mask: u8) {
        self.regs.layer_enable_mask = mask & 0x0F;
    }

    /// Enable bits for layers 4-7
    pub fn set_layer_enable2(&mut self, mask: u8) {
        self.regs.layer_enable_mask2 = mask & 0x0F;
    }

    /// Background palette index
    pub fn set_bg_color(&mut self, color: u8) {
        self.regs.bg_color = color;
    }

    /// Background palette index high byte (eight-layer boards)
    pub fn set_bg_color2(&mut self, color: u8) {
        self.regs.bg_color2 = color;
    }

    // ========== Output ==========

    /// Composite the visible frame
    pub fn composite_frame(&self) -> Frame {
        self.composite_frame_with(0)
    }

    /// Composite the visible frame with some layers hidden
    ///
    /// # Arguments
    ///
    /// * `suppress` - Bit n hides layer n for this frame only
    pub fn composite_frame_with(&self, suppress: u8) -> Frame {
        self.compositor.composite(&self.layers, &self.regs, suppress)
    }

    // ========== Inspection ==========

    /// Register file
    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// One layer pixmap, or `None` for an id past 7
    pub fn layer(&self, id: usize) -> Option<&LayerPixmap> {
        self.layers.get(id)
    }

    /// All layer pixmaps
    pub fn layers(&self) -> &[LayerPixmap; MAX_LAYERS] {
        &self.layers
    }

    /// Configuration the device was built with
    pub fn config(&self) -> &BlitterConfig {
        &self.config
    }

    /// Graphics ROM
    pub fn bit_source(&self) -> &BitSource {
        &self.rom
    }

    /// Number of blits started since construction
    pub fn blit_count(&self) -> u64 {
        self.next_token_id
    }

    /// Replace all programmable state from a save state
    ///
    /// Pending completions are not part of a save state: tokens issued before
    /// the load become stale and the device comes back idle.
    pub(crate) fn restore(
        &mut self,
        regs: RegisterFile,
        layers: [LayerPixmap; MAX_LAYERS],
        bus: [BusPhase; 2],
        irq_enable: bool,
        irq_pending: bool,
    ) {
        self.regs = regs;
        self.layers = layers;
        self.bus = bus;
        self.irq_enable = irq_enable;
        self.irq_pending = irq_pending;
        self.invalidate_tokens();
    }
}
