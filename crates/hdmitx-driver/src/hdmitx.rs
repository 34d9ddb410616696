// SPDX-License-Identifier: AGPL-3.0-only

//! TX stream context
//!
//! [`HdmiTx`] owns the TX core, the FRL link state and the observer, and is
//! the entry point for everything the surrounding system does with the link:
//! select TMDS or start FRL training, run the state machine when the FRL
//! timer fires or the link comes up, start and stop the stream, and react to
//! hot plug.

use crate::ddc::{Ddc, DdcConfig};
use crate::error::TrainingError;
use crate::frl::training::Trainer;
use crate::frl::{stream, FrlLinkState, StepOutcome, StreamStatus, TrainingObserver, TrainingState};
use crate::registers::RegisterAccess;
use crate::tx::{TxConfig, TxCore};
use hdmitx_chip::ltp::LANE_COUNT;
use tracing::{debug, info, warn};

/// HDMI TX instance: core, link state and observer.
#[derive(Debug)]
pub struct HdmiTx<R, O = ()> {
    core: TxCore<R>,
    ddc: DdcConfig,
    link: FrlLinkState,
    stream: StreamStatus,
    observer: O,
}

impl<R: RegisterAccess> HdmiTx<R> {
    /// Initialize a TX instance with no observer.
    pub fn new(regs: R, config: TxConfig) -> Self {
        Self::with_observer(regs, config, ())
    }
}

impl<R: RegisterAccess, O: TrainingObserver> HdmiTx<R, O> {
    /// Initialize a TX instance that reports to `observer`.
    ///
    /// Programs the DDC clock divider, enables the FRL and PIO interrupts and
    /// leaves the link in Legacy (TMDS) with 3 lanes and rate lock off.
    pub fn with_observer(regs: R, config: TxConfig, observer: O) -> Self {
        let max_frl_rate = config.max_frl_rate;
        let axi_clk = config.axi_lite_clk_hz;
        let mut core = TxCore::new(regs, config);
        core.ddc_init(axi_clk);
        core.frl_intr_enable();
        core.pio_intr_enable();
        Self {
            core,
            ddc: DdcConfig::default(),
            link: FrlLinkState::new(max_frl_rate),
            stream: StreamStatus::default(),
            observer,
        }
    }

    /// Replace the DDC engine configuration.
    pub fn with_ddc_config(mut self, ddc: DdcConfig) -> Self {
        self.ddc = ddc;
        self
    }

    /// Swap the observer, keeping all state.
    pub fn set_observer<P: TrainingObserver>(self, observer: P) -> HdmiTx<R, P> {
        HdmiTx {
            core: self.core,
            ddc: self.ddc,
            link: self.link,
            stream: self.stream,
            observer,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    /// FRL link state.
    pub fn link(&self) -> &FrlLinkState {
        &self.link
    }

    /// Current training state.
    pub fn training_state(&self) -> TrainingState {
        self.link.training_state
    }

    /// Stream status.
    pub fn stream(&self) -> &StreamStatus {
        &self.stream
    }

    /// TX core.
    pub fn core(&self) -> &TxCore<R> {
        &self.core
    }

    /// TX core, mutable.
    pub fn core_mut(&mut self) -> &mut TxCore<R> {
        &mut self.core
    }

    /// Register backend.
    pub fn registers(&self) -> &R {
        self.core.registers()
    }

    /// Register backend, mutable.
    pub fn registers_mut(&mut self) -> &mut R {
        self.core.registers_mut()
    }

    /// Observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Observer, mutable.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// DDC transaction engine of this instance.
    pub fn ddc(&mut self) -> Ddc<'_, R> {
        self.core.ddc(self.ddc)
    }

    /// Mark the sink as HDMI (`true`) or DVI. DVI sinks get no auxiliary
    /// packets when the stream starts.
    pub fn set_sink_is_hdmi(&mut self, is_hdmi: bool) {
        self.stream.is_hdmi = is_hdmi;
    }

    pub(crate) fn set_scdc_support(&mut self, supported: bool) {
        self.stream.scdc_support = supported;
    }

    fn trainer(&mut self) -> Trainer<'_, R, O> {
        Trainer {
            core: &mut self.core,
            ddc: self.ddc,
            link: &mut self.link,
            stream: &mut self.stream,
            observer: &mut self.observer,
        }
    }

    // ── Training control ─────────────────────────────────────────────────────

    /// Select TMDS operation. The next state execution tears FRL down.
    pub fn start_tmds_mode(&mut self) {
        debug!("TMDS mode requested");
        self.link.training_requested = false;
        self.link.training_state = TrainingState::Legacy;
        self.link.timer_event_pending = false;
        self.core.set_frl_timer_10us();
    }

    /// Start FRL training at `rate` (clamped to the configured maximum) and
    /// run LTS:1 immediately.
    ///
    /// # Errors
    ///
    /// See [`HdmiTx::exec_frl_state`].
    pub fn start_frl_training(&mut self, rate: u8) -> Result<StepOutcome, TrainingError> {
        let applied = self.link.request_training(rate);
        if applied != rate {
            warn!("FRL rate {rate} above maximum, training at {applied}");
        }
        info!(
            "starting FRL training at rate {applied} ({} lanes x {} Gbps)",
            self.link.lanes(),
            self.link.line_rate_gbps()
        );
        self.stream.is_frl = true;
        self.link.training_state = TrainingState::Lts1;
        self.link.timer_event_pending = false;
        self.exec_frl_state()
    }

    /// Run the current training state once.
    ///
    /// The FRL and PIO interrupts are masked for the duration and restored
    /// to their previous enable state afterwards.
    ///
    /// # Errors
    ///
    /// [`TrainingError::RegisterIoFailed`] when an SCDC access the state
    /// depends on fails. The link state stays consistent; LTS:1 and LTS:2
    /// failures are handled as "sink not ready" and never reported here.
    pub fn exec_frl_state(&mut self) -> Result<StepOutcome, TrainingError> {
        let frl_ie = self.core.frl_intr_enabled();
        let pio_ie = self.core.pio_intr_enabled();
        self.core.frl_intr_disable();
        self.core.pio_intr_disable();

        let result = self.trainer().exec();

        if frl_ie {
            self.core.frl_intr_enable();
        }
        if pio_ie {
            self.core.pio_intr_enable();
        }
        if let Err(e) = &result {
            debug!("{}: {e}", self.link.training_state);
        }
        result
    }

    /// Tear the link down to Legacy now, from any state, and abandon any
    /// training request.
    pub fn reset_to_legacy(&mut self) {
        self.link.training_requested = false;
        self.link.training_state = TrainingState::Legacy;
        self.link.timer_event_pending = false;
        self.trainer().lts_legacy();
    }

    /// Limit the FRL rate, clamped to the IP maximum. Returns the applied limit.
    pub fn set_max_frl_rate(&mut self, rate: u8) -> u8 {
        let ip_max = self.core.config().max_frl_rate;
        let applied = rate.min(ip_max);
        if applied != rate {
            warn!("max FRL rate {rate} exceeds IP maximum {ip_max}");
        }
        self.link.set_max_frl_rate(applied);
        applied
    }

    /// FFE levels advertised to the sink at the next rate programming.
    pub fn set_ffe_levels(&mut self, levels: u8) {
        self.link.ffe_levels = levels;
    }

    /// Override one lane's pending FFE level and notify the observer.
    /// Levels at or above the advertised FFE levels wrap to 0.
    ///
    /// # Errors
    ///
    /// [`TrainingError::InvalidLaneIndex`] for `lane >= 4`.
    pub fn set_frl_lane_ffe(&mut self, lane: u8, level: u8) -> Result<(), TrainingError> {
        let idx = usize::from(lane);
        if idx >= LANE_COUNT {
            return Err(TrainingError::invalid_lane(lane));
        }
        self.link.lane_ffe_adjust_request[idx] = if level < self.link.ffe_levels { level } else { 0 };
        self.observer.frl_ffe(&self.link);
        Ok(())
    }

    /// Keep the current rate when the sink asks for a lower one.
    pub fn enable_rate_lock(&mut self) {
        self.link.rate_locked = true;
    }

    /// Allow rate fallback.
    pub fn disable_rate_lock(&mut self) {
        self.link.rate_locked = false;
    }

    /// Force Nyquist clock on lane 2 whatever the sink requests.
    pub fn set_frl_wrong_ltp(&mut self) {
        self.link.debug_send_wrong_ltp = true;
    }

    /// Stop forcing lane 2's pattern.
    pub fn clear_frl_wrong_ltp(&mut self) {
        self.link.debug_send_wrong_ltp = false;
    }

    // ── Stream ───────────────────────────────────────────────────────────────

    /// Switch the link from GAP characters to the full stream.
    pub fn frl_stream_start(&mut self) {
        stream::start(&mut self.core, &mut self.stream, &mut self.observer);
    }

    /// Stop auxiliary traffic and mark the stream down.
    pub fn frl_stream_stop(&mut self) {
        stream::stop(&mut self.core, &mut self.stream, &mut self.observer);
    }

    // ── Events ───────────────────────────────────────────────────────────────

    /// Record an FRL timer expiry. Returns `false` if one was already queued.
    pub fn on_frl_timer_event(&mut self) -> bool {
        if self.link.timer_event_pending {
            return false;
        }
        self.link.timer_event_pending = true;
        true
    }

    /// Execute the current state if a timer event is queued.
    pub fn run_pending(&mut self) -> Option<Result<StepOutcome, TrainingError>> {
        if self.link.timer_event_pending {
            Some(self.exec_frl_state())
        } else {
            None
        }
    }

    /// Handle the transceiver link-ready input: while training, run the
    /// current state as soon as the link is up.
    pub fn on_link_ready(&mut self) -> Option<Result<StepOutcome, TrainingError>> {
        if !self.core.link_ready() {
            debug!("link ready event, link down");
            return None;
        }
        if self.link.training_state.is_frl() {
            Some(self.exec_frl_state())
        } else {
            None
        }
    }

    /// Handle a hot plug change.
    pub fn on_connect(&mut self, connected: bool) {
        self.stream.is_connected = connected;
        if connected {
            let hdmi20 = self.detect_hdmi20();
            info!("sink connected, SCDC {}", if hdmi20 { "present" } else { "absent" });
        } else {
            info!("sink disconnected");
            self.stream.scdc_support = false;
            self.reset_to_legacy();
        }
        self.observer.connect(connected);
    }

    /// Handle a hot plug toggle (sink re-asserted HPD).
    pub fn on_toggle(&mut self) {
        self.observer.toggle();
    }
}
