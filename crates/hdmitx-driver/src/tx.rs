// SPDX-License-Identifier: AGPL-3.0-only

//! TX core register helpers
//!
//! [`TxCore`] owns a register backend and wraps the raw register map in the
//! operations the DDC engine and the training state machine need: FRL
//! reset/mode/lanes/patterns, the countdown timer, interrupt enables and the
//! DDC/AUX peripheral switches.

use crate::error::TrainingError;
use crate::registers::RegisterAccess;
use hdmitx_chip::ltp::{LinkTrainingPattern, LANE_COUNT};
use hdmitx_chip::rate::MAX_FRL_RATE;
use hdmitx_chip::regs::{
    self, aux_ctrl, ddc_ctrl, frl_ctrl, pio_ctrl, pio_in, pio_out,
};

/// Static configuration of a TX core instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxConfig {
    /// AXI-lite clock feeding the FRL countdown timer and the DDC divider.
    pub axi_lite_clk_hz: u32,
    /// Highest FRL rate the IP was built for.
    pub max_frl_rate: u8,
    /// The IP includes the dynamic HDR data mover.
    pub dynamic_hdr: bool,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            axi_lite_clk_hz: 100_000_000,
            max_frl_rate: MAX_FRL_RATE,
            dynamic_hdr: false,
        }
    }
}

impl TxConfig {
    /// Create a configuration for the given AXI-lite clock.
    pub fn new(axi_lite_clk_hz: u32) -> Self {
        Self {
            axi_lite_clk_hz,
            ..Self::default()
        }
    }

    /// Set the IP's maximum FRL rate. Values above the rate table are clamped.
    pub fn with_max_frl_rate(mut self, rate: u8) -> Self {
        self.max_frl_rate = rate.min(MAX_FRL_RATE);
        self
    }

    /// Declare the dynamic HDR data mover present.
    pub fn with_dynamic_hdr(mut self, enabled: bool) -> Self {
        self.dynamic_hdr = enabled;
        self
    }

    /// Countdown timer cycles for `ms` milliseconds.
    #[allow(clippy::cast_possible_truncation)]
    pub fn timer_cycles_ms(&self, ms: u32) -> u32 {
        let cycles = u64::from(self.axi_lite_clk_hz) * u64::from(ms) / 1000;
        cycles.min(u64::from(u32::MAX)) as u32
    }

    /// Countdown timer cycles for the short (~10 µs) re-arm interval.
    pub fn timer_cycles_10us(&self) -> u32 {
        self.axi_lite_clk_hz / 100_000
    }
}

/// FRL active mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrlActiveMode {
    /// Transmit GAP characters only (training).
    GapOnly,
    /// Transmit the full video/audio stream.
    FullStream,
}

/// TX core: register backend plus configuration.
#[derive(Debug)]
pub struct TxCore<R> {
    regs: R,
    config: TxConfig,
}

impl<R: RegisterAccess> TxCore<R> {
    /// Wrap a register backend.
    pub fn new(regs: R, config: TxConfig) -> Self {
        tracing::debug!(
            "TX core on {} backend, AXI-lite {} Hz, max FRL rate {}",
            regs.backend_type(),
            config.axi_lite_clk_hz,
            config.max_frl_rate
        );
        Self { regs, config }
    }

    /// Configuration this core was created with.
    pub fn config(&self) -> &TxConfig {
        &self.config
    }

    /// Register backend.
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Register backend, mutable.
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Release the register backend.
    pub fn into_registers(self) -> R {
        self.regs
    }

    /// Raw register read.
    pub fn read(&mut self, offset: usize) -> u32 {
        self.regs.read32(offset)
    }

    /// Raw register write.
    pub fn write(&mut self, offset: usize, value: u32) {
        self.regs.write32(offset, value);
    }

    // ── FRL block ────────────────────────────────────────────────────────────

    /// Hold the FRL block in reset (`true`) or release it (`false`).
    pub fn frl_reset(&mut self, assert: bool) {
        if assert {
            self.write(regs::FRL_CTRL_CLR, frl_ctrl::RSTN);
        } else {
            self.write(regs::FRL_CTRL_SET, frl_ctrl::RSTN);
        }
    }

    /// Select FRL (`true`) or TMDS (`false`) operation.
    pub fn frl_mode_enable(&mut self, frl: bool) {
        if frl {
            self.write(regs::FRL_CTRL_SET, frl_ctrl::OP_MODE);
        } else {
            self.write(regs::FRL_CTRL_CLR, frl_ctrl::OP_MODE);
        }
    }

    /// Select 4-lane operation for `lanes == 4`, 3-lane otherwise.
    pub fn set_frl_lanes(&mut self, lanes: u8) {
        if lanes == 4 {
            self.write(regs::FRL_CTRL_SET, frl_ctrl::LN_OP);
        } else {
            self.write(regs::FRL_CTRL_CLR, frl_ctrl::LN_OP);
        }
    }

    /// Select GAP-only or full-stream transmission.
    pub fn set_frl_active(&mut self, mode: FrlActiveMode) {
        match mode {
            FrlActiveMode::FullStream => self.write(regs::FRL_CTRL_SET, frl_ctrl::ACT),
            FrlActiveMode::GapOnly => self.write(regs::FRL_CTRL_CLR, frl_ctrl::ACT),
        }
    }

    /// Program one lane's training pattern.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidLaneIndex`] for `lane >= 4`.
    pub fn set_frl_ltp(&mut self, lane: u8, ltp: LinkTrainingPattern) -> Result<(), TrainingError> {
        if usize::from(lane) >= LANE_COUNT {
            return Err(TrainingError::invalid_lane(lane));
        }
        let shift = regs::ltp_shift(lane);
        let mut ctrl = self.read(regs::FRL_CTRL);
        ctrl &= !(frl_ctrl::LTP_MASK << shift);
        ctrl |= (u32::from(ltp.code()) & frl_ctrl::LTP_MASK) << shift;
        self.write(regs::FRL_CTRL, ctrl);
        Ok(())
    }

    /// Pattern currently programmed on `lane`.
    pub fn frl_ltp(&mut self, lane: u8) -> Option<LinkTrainingPattern> {
        if usize::from(lane) >= LANE_COUNT {
            return None;
        }
        let ctrl = self.read(regs::FRL_CTRL);
        let code = (ctrl >> regs::ltp_shift(lane)) & frl_ctrl::LTP_MASK;
        u8::try_from(code).ok().and_then(LinkTrainingPattern::from_code)
    }

    /// Clear the training pattern on every lane.
    pub fn clear_frl_ltp(&mut self) {
        let mut ctrl = self.read(regs::FRL_CTRL);
        for lane in 0..4 {
            ctrl &= !(frl_ctrl::LTP_MASK << regs::ltp_shift(lane));
        }
        self.write(regs::FRL_CTRL, ctrl);
    }

    /// Commit pending FRL control changes.
    pub fn frl_execute(&mut self) {
        self.write(regs::FRL_CTRL_SET, frl_ctrl::EXEC);
    }

    /// Enable the FRL (timer) interrupt.
    pub fn frl_intr_enable(&mut self) {
        self.write(regs::FRL_CTRL_SET, frl_ctrl::IE);
    }

    /// Disable the FRL (timer) interrupt.
    pub fn frl_intr_disable(&mut self) {
        self.write(regs::FRL_CTRL_CLR, frl_ctrl::IE);
    }

    /// Whether the FRL interrupt is enabled.
    pub fn frl_intr_enabled(&mut self) -> bool {
        self.read(regs::FRL_CTRL) & frl_ctrl::IE != 0
    }

    // ── Countdown timer ──────────────────────────────────────────────────────

    /// Arm the countdown timer for `ms` milliseconds. Zero stops it.
    pub fn set_frl_timer_ms(&mut self, ms: u32) {
        let cycles = self.config.timer_cycles_ms(ms);
        self.set_frl_timer_cycles(cycles);
    }

    /// Arm the countdown timer for the short re-arm interval.
    pub fn set_frl_timer_10us(&mut self) {
        let cycles = self.config.timer_cycles_10us();
        self.set_frl_timer_cycles(cycles);
    }

    /// Load the countdown timer with a raw cycle count.
    pub fn set_frl_timer_cycles(&mut self, cycles: u32) {
        self.write(regs::FRL_TMR, cycles);
    }

    /// Remaining countdown timer cycles.
    pub fn frl_timer(&mut self) -> u32 {
        self.read(regs::FRL_TMR)
    }

    // ── PIO ──────────────────────────────────────────────────────────────────

    /// Enable the PIO interrupt.
    pub fn pio_intr_enable(&mut self) {
        self.write(regs::PIO_CTRL_SET, pio_ctrl::IE);
    }

    /// Disable the PIO interrupt.
    pub fn pio_intr_disable(&mut self) {
        self.write(regs::PIO_CTRL_CLR, pio_ctrl::IE);
    }

    /// Whether the PIO interrupt is enabled.
    pub fn pio_intr_enabled(&mut self) -> bool {
        self.read(regs::PIO_CTRL) & pio_ctrl::IE != 0
    }

    /// Transceiver link ready input.
    pub fn link_ready(&mut self) -> bool {
        self.read(regs::PIO_IN) & pio_in::LNK_RDY != 0
    }

    /// Enable the dynamic HDR data mover, if the IP has one.
    pub fn dynhdr_dm_enable(&mut self) {
        if self.config.dynamic_hdr {
            self.write(regs::PIO_OUT_SET, pio_out::DYN_HDR_DM_EN);
        }
    }

    /// Disable the dynamic HDR data mover, if the IP has one.
    pub fn dynhdr_dm_disable(&mut self) {
        if self.config.dynamic_hdr {
            self.write(regs::PIO_OUT_CLR, pio_out::DYN_HDR_DM_EN);
        }
    }

    // ── AUX ──────────────────────────────────────────────────────────────────

    /// Start auxiliary packet transmission.
    pub fn aux_enable(&mut self) {
        self.write(regs::AUX_CTRL_SET, aux_ctrl::RUN);
    }

    /// Stop auxiliary packet transmission.
    pub fn aux_disable(&mut self) {
        self.write(regs::AUX_CTRL_CLR, aux_ctrl::RUN);
    }

    /// Enable the AUX interrupt.
    pub fn aux_intr_enable(&mut self) {
        self.write(regs::AUX_CTRL_SET, aux_ctrl::IE);
    }

    /// Disable the AUX interrupt.
    pub fn aux_intr_disable(&mut self) {
        self.write(regs::AUX_CTRL_CLR, aux_ctrl::IE);
    }

    // ── DDC ──────────────────────────────────────────────────────────────────

    /// Program the DDC clock divider for a ~100 kHz bus from `clk_hz`.
    pub fn ddc_init(&mut self, clk_hz: u32) {
        let div = (clk_hz / 100_000) / 2;
        let value = (div & ddc_ctrl::CLK_DIV_MASK) << ddc_ctrl::CLK_DIV_SHIFT;
        self.write(regs::DDC_CTRL, value);
    }

    /// Start the DDC engine.
    pub fn ddc_enable(&mut self) {
        self.write(regs::DDC_CTRL_SET, ddc_ctrl::RUN);
    }

    /// Stop the DDC engine.
    pub fn ddc_disable(&mut self) {
        self.write(regs::DDC_CTRL_CLR, ddc_ctrl::RUN);
    }

    /// Disable the DDC interrupt (the engine is polled).
    pub fn ddc_intr_disable(&mut self) {
        self.write(regs::DDC_CTRL_CLR, ddc_ctrl::IE);
    }
}
