// SPDX-License-Identifier: AGPL-3.0-only

//! Per-state handlers of the FRL training state machine.

use super::observer::{Lts3Event, LtsPEvent, TrainingObserver};
use super::state::{FrlLinkState, StepOutcome, StreamState, StreamStatus, TrainingState};
use super::stream;
use crate::ddc::{Ddc, DdcConfig};
use crate::error::{TrainingError, TransactionError};
use crate::registers::RegisterAccess;
use crate::tx::{FrlActiveMode, TxCore};
use hdmitx_chip::ltp::{self, request, LinkTrainingPattern};
use hdmitx_chip::rate::FRL_RATE_NONE;
use hdmitx_chip::scdc::{self, config_1, source_test_config, status_flags, update_flags, ScdcField};
use tracing::{debug, info, trace, warn};

/// LTS:2 gives up after this long without FLT ready.
pub const LTS2_TIMEOUT_MS: u32 = 100;
/// LTS:3 gives up after this long without a pass.
pub const LTS3_TIMEOUT_MS: u32 = 200;
/// LTS:2 poll interval.
pub const LTS2_POLL_MS: u32 = 5;
/// LTS:3 and LTS:P poll interval.
pub const LTS3_POLL_MS: u32 = 2;
/// Poll interval once the sink has started FRL.
pub const FRL_READY_POLL_MS: u32 = 250;

type StepResult = Result<StepOutcome, TrainingError>;

/// Everything one state execution touches, borrowed from the TX instance.
pub(crate) struct Trainer<'a, R, O: ?Sized> {
    pub core: &'a mut TxCore<R>,
    pub ddc: DdcConfig,
    pub link: &'a mut FrlLinkState,
    pub stream: &'a mut StreamStatus,
    pub observer: &'a mut O,
}

impl<R, O> Trainer<'_, R, O>
where
    R: RegisterAccess,
    O: TrainingObserver + ?Sized,
{
    /// Run the current state's handler.
    pub fn exec(&mut self) -> StepResult {
        self.link.timer_event_pending = false;
        trace!("exec {}", self.link.training_state);
        match self.link.training_state {
            TrainingState::Legacy => {
                self.lts_legacy();
                Ok(StepOutcome::Executed)
            }
            TrainingState::Lts1 => self.lts1(),
            TrainingState::Lts2 => self.lts2(),
            TrainingState::Lts3Arm => self.lts3_arm(),
            TrainingState::Lts3 => self.lts3(),
            TrainingState::Lts4 => self.lts4(),
            TrainingState::LtsPArm => {
                self.lts_p_arm()?;
                self.lts_p()
            }
            TrainingState::LtsP | TrainingState::LtsPFrlReady => self.lts_p(),
        }
    }

    fn ddc(&mut self) -> Ddc<'_, R> {
        self.core.ddc(self.ddc)
    }

    fn goto(&mut self, next: TrainingState) {
        debug!("{} -> {}", self.link.training_state, next);
        self.link.training_state = next;
    }

    /// Select the rate's lane count and advertise rate and FFE levels to the sink.
    fn program_rate(&mut self) -> Result<(), TransactionError> {
        self.core.set_frl_lanes(self.link.lanes());
        if self.stream.scdc_support {
            let cfg = config_1::encode(self.link.frl_rate(), self.link.ffe_levels);
            self.ddc().write_field(ScdcField::SinkConfig1, cfg)?;
        }
        Ok(())
    }

    fn notify_ffe(&mut self) {
        self.observer.frl_ffe(self.link);
    }

    // ── LTS:L ────────────────────────────────────────────────────────────────

    /// Tear the link down to TMDS. Restarts training if a request is active.
    pub fn lts_legacy(&mut self) {
        self.core.set_frl_timer_ms(0);
        self.core.frl_reset(true);
        self.core.frl_reset(false);
        self.core.frl_mode_enable(false);

        let was_frl = self.stream.is_frl;
        self.link.set_frl_rate(FRL_RATE_NONE);
        self.stream.is_frl = false;
        if let Err(e) = self.program_rate() {
            debug!("LTS:L: advertising TMDS to sink failed: {e}");
        }

        if self.stream.scdc_support {
            match self.ddc().read_scdc(scdc::UPDATE_FLAGS) {
                Ok(flags) if flags & update_flags::FLT_UPDATE != 0 => {
                    if let Err(e) = self.ddc().write_field(ScdcField::FltUpdate, 1) {
                        debug!("LTS:L: clearing FLT update failed: {e}");
                    }
                }
                Ok(_) => {}
                Err(e) => debug!("LTS:L: reading update flags failed: {e}"),
            }
        }

        if self.stream.state == StreamState::Up {
            stream::stop(self.core, self.stream, self.observer);
        }
        if was_frl {
            self.observer.tmds_config();
        }
        self.core.frl_execute();
        self.observer.lts_legacy(self.link);

        if self.link.training_requested {
            let rate = self.link.request_training(self.link.requested_frl_rate());
            debug!("LTS:L: restarting training at rate {rate}");
            self.stream.is_frl = true;
            self.goto(TrainingState::Lts1);
            self.core.set_frl_timer_10us();
        }
    }

    // ── LTS:1 ────────────────────────────────────────────────────────────────

    fn lts1(&mut self) -> StepResult {
        let entered = match self.ddc().read_scdc(scdc::SINK_VERSION) {
            Ok(0) => {
                info!("LTS:1: sink has no SCDC, staying in TMDS");
                self.link.training_requested = false;
                false
            }
            Ok(version) => match self.ddc().write_field(ScdcField::SourceVersion, 1) {
                Ok(()) => {
                    debug!("LTS:1: sink SCDC version {version}");
                    true
                }
                Err(e) => {
                    debug!("LTS:1: writing source version failed: {e}");
                    false
                }
            },
            Err(e) => {
                debug!("LTS:1: sink not ready: {e}");
                false
            }
        };

        if entered {
            self.stream.scdc_support = true;
            self.link.timer_count_ms = 0;
            self.goto(TrainingState::Lts2);
        } else {
            self.goto(TrainingState::Legacy);
        }
        self.core.set_frl_timer_10us();
        self.observer.lts1(self.link);
        Ok(StepOutcome::Executed)
    }

    // ── LTS:2 ────────────────────────────────────────────────────────────────

    fn lts2(&mut self) -> StepResult {
        self.core.set_frl_timer_ms(LTS2_POLL_MS);
        self.link.timer_count_ms += LTS2_POLL_MS;

        self.refresh_flt_no_timeout();

        if !self.link.flt_no_timeout && self.link.timer_count_ms >= LTS2_TIMEOUT_MS {
            info!("LTS:2: sink not ready after {} ms", self.link.timer_count_ms);
            self.goto(TrainingState::Legacy);
            self.core.set_frl_timer_10us();
            return Ok(StepOutcome::Executed);
        }

        match self.ddc().read_scdc(scdc::STATUS_FLAGS) {
            Ok(flags) if flags & status_flags::FLT_READY != 0 => {
                self.core.set_frl_timer_ms(0);
                self.link.reset_ffe_requests();
                self.notify_ffe();
                self.link.timer_count_ms = 0;
                self.goto(TrainingState::Lts3Arm);
                self.observer.frl_config(self.link);
                for lane in 0..4 {
                    self.core.set_frl_ltp(lane, LinkTrainingPattern::NyquistClock)?;
                }
                self.core.frl_execute();
                self.observer.lts2(self.link);
            }
            Ok(_) => trace!("LTS:2: waiting for FLT ready"),
            Err(e) => debug!("LTS:2: reading status flags failed: {e}"),
        }
        Ok(StepOutcome::Executed)
    }

    /// Latch the sink's no-timeout request and acknowledge the test config.
    fn refresh_flt_no_timeout(&mut self) {
        match self.ddc().read_scdc(scdc::SOURCE_TEST_CONFIG) {
            Ok(cfg) => {
                self.link.flt_no_timeout = cfg & source_test_config::FLT_NO_TIMEOUT != 0;
            }
            Err(e) => {
                debug!("reading source test config failed: {e}");
                return;
            }
        }
        if let Err(e) = self.ddc().write_field(ScdcField::SourceTestUpdate, 1) {
            debug!("writing source test update failed: {e}");
        }
    }

    // ── LTS:3 ────────────────────────────────────────────────────────────────

    fn lts3_arm(&mut self) -> StepResult {
        let init = self.training_init();
        self.core.frl_execute();
        self.goto(TrainingState::Lts3);
        self.core.set_frl_timer_10us();
        info!(
            "training at FRL rate {} ({} lanes x {} Gbps)",
            self.link.frl_rate(),
            self.link.lanes(),
            self.link.line_rate_gbps()
        );
        init?;
        Ok(StepOutcome::Executed)
    }

    /// Stop patterns, send GAP characters in FRL mode, program the rate.
    fn training_init(&mut self) -> Result<(), TransactionError> {
        self.core.clear_frl_ltp();
        self.core.set_frl_active(FrlActiveMode::GapOnly);
        self.core.frl_mode_enable(true);
        self.program_rate()?;
        self.ddc().write_field(ScdcField::SinkConfig0, 0)
    }

    fn lts3(&mut self) -> StepResult {
        if self.link.timer_count_ms > LTS3_TIMEOUT_MS && !self.link.flt_no_timeout {
            warn!("LTS:3: no pass after {} ms", self.link.timer_count_ms);
            self.observer.lts3(Lts3Event::Timeout, self.link);
            self.link.timer_count_ms = 0;
            self.goto(TrainingState::Legacy);
            self.core.set_frl_timer_10us();
            return Ok(StepOutcome::Executed);
        }

        self.core.set_frl_timer_ms(LTS3_POLL_MS);
        self.link.timer_count_ms += LTS3_POLL_MS;

        let flags = match self.ddc().read_scdc(scdc::UPDATE_FLAGS) {
            Ok(flags) => flags,
            Err(e) => {
                debug!("LTS:3: reading update flags failed: {e}");
                return Ok(StepOutcome::NoData);
            }
        };
        if flags & update_flags::FLT_UPDATE == 0 {
            return Ok(StepOutcome::NoData);
        }
        if flags & update_flags::SOURCE_TEST_UPDATE != 0 {
            self.refresh_flt_no_timeout();
        }

        let bytes = self
            .ddc()
            .read_register(scdc::SLAVE_ADDRESS, 2, scdc::LANE01_REQUEST)?;
        let &[ln01, ln23] = bytes.as_slice() else {
            return Err(TransactionError::Timeout.into());
        };
        let codes = ltp::decode_lane_requests(ln01, ln23);
        debug!("LTS:3: lane requests {codes:x?}");

        let compared = &codes[..self.link.compared_lanes()];
        if compared.iter().all(|&c| c == request::PASS) {
            self.link.timer_count_ms = 0;
            self.goto(TrainingState::LtsPArm);
            self.core.set_frl_timer_10us();
            self.observer.lts3(Lts3Event::Pass, self.link);
            return Ok(StepOutcome::Executed);
        }
        if compared.iter().all(|&c| c == request::RATE_DROP) {
            self.link.timer_count_ms = 0;
            self.goto(TrainingState::Lts4);
            self.core.set_frl_timer_10us();
            self.observer.lts3(Lts3Event::RateDrop, self.link);
            return Ok(StepOutcome::Executed);
        }

        let mut ffe_changed = false;
        for (lane, &code) in (0u8..).zip(codes.iter()) {
            match code {
                1..=8 => self.apply_pattern_request(lane, code)?,
                request::FFE_CHANGE => {
                    ffe_changed = true;
                    let level = self.link.bump_ffe_request(usize::from(lane));
                    trace!("LTS:3: lane {lane} FFE level {level}");
                }
                _ => {}
            }
            self.observer.lts3(Lts3Event::LaneRequest { lane, code }, self.link);
        }

        self.core.frl_execute();
        if ffe_changed {
            self.notify_ffe();
        }
        self.ddc().write_field(ScdcField::FltUpdate, 1)?;
        Ok(StepOutcome::Executed)
    }

    fn apply_pattern_request(&mut self, lane: u8, code: u8) -> Result<(), TrainingError> {
        if lane == 2 && self.link.debug_send_wrong_ltp {
            return self.core.set_frl_ltp(lane, LinkTrainingPattern::NyquistClock);
        }
        // Nyquist requests are only honoured once the sink disabled timeouts.
        if code == LinkTrainingPattern::NyquistClock.code() && !self.link.flt_no_timeout {
            return Ok(());
        }
        match LinkTrainingPattern::from_code(code) {
            Some(ltp) => self.core.set_frl_ltp(lane, ltp),
            None => Ok(()),
        }
    }

    // ── LTS:4 ────────────────────────────────────────────────────────────────

    fn lts4(&mut self) -> StepResult {
        self.core.set_frl_timer_ms(0);
        self.core.clear_frl_ltp();

        let accepted = if self.link.rate_locked {
            debug!("LTS:4: rate locked at {}", self.link.frl_rate());
            true
        } else if self.link.frl_rate() > 1 {
            let rate = self.link.set_frl_rate(self.link.frl_rate() - 1);
            info!(
                "LTS:4: dropping to FRL rate {rate} ({} lanes x {} Gbps)",
                self.link.lanes(),
                self.link.line_rate_gbps()
            );
            true
        } else {
            false
        };

        let result = if accepted {
            self.observer.lts4(self.link);
            self.link.reset_ffe_requests();
            self.notify_ffe();
            match self.ddc().write_field(ScdcField::FltUpdate, 1) {
                Ok(()) => {
                    self.link.timer_count_ms = 0;
                    self.goto(TrainingState::Lts3Arm);
                    self.observer.frl_config(self.link);
                    Ok(StepOutcome::Executed)
                }
                Err(e) => {
                    debug!("LTS:4: clearing FLT update failed: {e}");
                    self.goto(TrainingState::Legacy);
                    self.core.set_frl_timer_10us();
                    Err(e.into())
                }
            }
        } else {
            warn!("LTS:4: no lower rate, giving up on FRL");
            self.link.timer_count_ms = 0;
            self.link.training_requested = false;
            self.goto(TrainingState::Legacy);
            self.core.set_frl_timer_10us();
            Ok(StepOutcome::Executed)
        };

        self.core.frl_execute();
        result
    }

    // ── LTS:P ────────────────────────────────────────────────────────────────

    fn lts_p_arm(&mut self) -> Result<(), TrainingError> {
        self.core.clear_frl_ltp();
        self.core.set_frl_active(FrlActiveMode::GapOnly);
        self.core.frl_execute();
        let cleared = self.ddc().write_field(ScdcField::FltUpdate, 1);
        self.goto(TrainingState::LtsP);
        if let Err(e) = cleared {
            debug!("LTS:P-Arm: clearing FLT update failed: {e}");
            // LTS:P runs on the next timer event instead.
            self.core.set_frl_timer_10us();
            return Err(e.into());
        }
        Ok(())
    }

    fn lts_p(&mut self) -> StepResult {
        let ready = self.link.training_state == TrainingState::LtsPFrlReady;
        self.core.set_frl_timer_ms(if ready { FRL_READY_POLL_MS } else { LTS3_POLL_MS });

        let flags = match self.ddc().read_scdc(scdc::UPDATE_FLAGS) {
            Ok(flags) => flags,
            Err(e) => {
                debug!("LTS:P: reading update flags failed: {e}");
                self.observer.lts_p(LtsPEvent::ReadFailed, self.link);
                return Err(e.into());
            }
        };

        if flags & update_flags::FLT_UPDATE != 0 {
            info!("LTS:P: sink requested retraining");
            self.observer.lts_p(LtsPEvent::FltUpdate, self.link);
            self.core.clear_frl_ltp();
            self.core.set_frl_active(FrlActiveMode::GapOnly);
            self.core.frl_execute();
            self.observer.frl_stop(self.link);
            self.link.timer_count_ms = 0;
            self.goto(TrainingState::Lts3);
            self.core.set_frl_timer_10us();
        } else if flags & update_flags::CED_UPDATE != 0 {
            self.observer.ced_update();
        } else if !ready && flags & update_flags::FRL_START != 0 {
            self.core.set_frl_timer_ms(FRL_READY_POLL_MS);
            info!("LTS:P: sink started FRL");
            self.observer.frl_start(self.link);
            if let Err(e) = self.ddc().write_field(ScdcField::FrlStart, 1) {
                debug!("LTS:P: clearing FRL start failed: {e}");
            }
            self.goto(TrainingState::LtsPFrlReady);
            self.observer.lts_p(LtsPEvent::FrlStart, self.link);
        }
        Ok(StepOutcome::Executed)
    }
}
