// SPDX-License-Identifier: AGPL-3.0-only

//! Training and stream state

use hdmitx_chip::ltp::LANE_COUNT;
use hdmitx_chip::rate::{self, FRL_RATE_NONE, MAX_FRL_RATE};

/// Link training state (LTS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrainingState {
    /// LTS:L, TMDS operation.
    #[default]
    Legacy,
    /// LTS:1, probe the sink's SCDC version.
    Lts1,
    /// LTS:2, wait for the sink to report FLT ready.
    Lts2,
    /// LTS:3 preparation, program rate and lanes.
    Lts3Arm,
    /// LTS:3, follow the sink's per-lane pattern requests.
    Lts3,
    /// LTS:4, drop to a lower rate.
    Lts4,
    /// LTS:P preparation, stop patterns.
    LtsPArm,
    /// LTS:P, training passed, waiting for FRL start.
    LtsP,
    /// LTS:P with FRL start received, ready to stream.
    LtsPFrlReady,
}

impl TrainingState {
    /// Whether FRL training is in progress or complete.
    pub const fn is_frl(self) -> bool {
        !matches!(self, Self::Legacy)
    }

    /// Whether training has passed (LTS:P or later).
    pub const fn is_passed(self) -> bool {
        matches!(self, Self::LtsP | Self::LtsPFrlReady)
    }
}

impl std::fmt::Display for TrainingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Legacy => "LTS:L",
            Self::Lts1 => "LTS:1",
            Self::Lts2 => "LTS:2",
            Self::Lts3Arm => "LTS:3-Arm",
            Self::Lts3 => "LTS:3",
            Self::Lts4 => "LTS:4",
            Self::LtsPArm => "LTS:P-Arm",
            Self::LtsP => "LTS:P",
            Self::LtsPFrlReady => "LTS:P-FRL-Ready",
        };
        f.write_str(name)
    }
}

/// What one state execution produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The state handler ran.
    Executed,
    /// LTS:3 found no new lane requests; state unchanged.
    NoData,
}

/// FRL negotiation state of one TX stream.
///
/// The rate, lane count and line rate are kept consistent: they are only
/// changed together through [`FrlLinkState::set_frl_rate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrlLinkState {
    /// Current training state.
    pub training_state: TrainingState,
    frl_rate: u8,
    lanes: u8,
    line_rate_gbps: u8,
    max_frl_rate: u8,
    requested_frl_rate: u8,
    /// Time spent in the current timed state, in milliseconds.
    pub timer_count_ms: u32,
    /// FFE levels advertised to the sink.
    pub ffe_levels: u8,
    /// Pending FFE level per lane.
    pub lane_ffe_adjust_request: [u8; LANE_COUNT],
    /// Sink disabled training timeouts.
    pub flt_no_timeout: bool,
    /// Rate fallback disabled.
    pub rate_locked: bool,
    /// Force Nyquist clock on lane 2 regardless of requests.
    pub debug_send_wrong_ltp: bool,
    /// A timer event is queued and not yet executed.
    pub timer_event_pending: bool,
    /// FRL training was requested and has not been abandoned.
    pub training_requested: bool,
}

impl Default for FrlLinkState {
    fn default() -> Self {
        Self::new(MAX_FRL_RATE)
    }
}

impl FrlLinkState {
    /// Fresh state in Legacy with FRL not selected.
    pub fn new(max_frl_rate: u8) -> Self {
        let none = rate::RATE_TABLE[usize::from(FRL_RATE_NONE)];
        Self {
            training_state: TrainingState::Legacy,
            frl_rate: FRL_RATE_NONE,
            lanes: none.lanes,
            line_rate_gbps: none.line_rate_gbps,
            max_frl_rate: max_frl_rate.min(MAX_FRL_RATE),
            requested_frl_rate: FRL_RATE_NONE,
            timer_count_ms: 0,
            ffe_levels: 0,
            lane_ffe_adjust_request: [0; LANE_COUNT],
            flt_no_timeout: false,
            rate_locked: false,
            debug_send_wrong_ltp: false,
            timer_event_pending: false,
            training_requested: false,
        }
    }

    /// Current rate index.
    pub const fn frl_rate(&self) -> u8 {
        self.frl_rate
    }

    /// Active lanes for the current rate.
    pub const fn lanes(&self) -> u8 {
        self.lanes
    }

    /// Per-lane line rate for the current rate, in Gbps.
    pub const fn line_rate_gbps(&self) -> u8 {
        self.line_rate_gbps
    }

    /// Configured maximum rate.
    pub const fn max_frl_rate(&self) -> u8 {
        self.max_frl_rate
    }

    /// Rate the last training request asked for (after clamping).
    pub const fn requested_frl_rate(&self) -> u8 {
        self.requested_frl_rate
    }

    /// Select a rate, clamped to the configured maximum. Lanes and line rate
    /// follow from the rate table. Returns the applied rate.
    pub fn set_frl_rate(&mut self, rate: u8) -> u8 {
        let applied = rate.min(self.max_frl_rate);
        let entry = rate::RATE_TABLE[usize::from(applied)];
        self.frl_rate = applied;
        self.lanes = entry.lanes;
        self.line_rate_gbps = entry.line_rate_gbps;
        applied
    }

    /// Change the maximum rate, re-clamping the current rate.
    pub fn set_max_frl_rate(&mut self, max: u8) {
        self.max_frl_rate = max.min(MAX_FRL_RATE);
        self.set_frl_rate(self.frl_rate);
        self.requested_frl_rate = self.requested_frl_rate.min(self.max_frl_rate);
    }

    /// Record a training request for `rate` and select it.
    pub(crate) fn request_training(&mut self, rate: u8) -> u8 {
        let applied = self.set_frl_rate(rate);
        self.requested_frl_rate = applied;
        self.training_requested = true;
        applied
    }

    /// Clear every lane's pending FFE level.
    pub fn reset_ffe_requests(&mut self) {
        self.lane_ffe_adjust_request = [0; LANE_COUNT];
    }

    /// Step one lane's FFE level, wrapping to 0 at [`Self::ffe_levels`].
    pub fn bump_ffe_request(&mut self, lane: usize) -> u8 {
        let next = self.lane_ffe_adjust_request[lane].saturating_add(1);
        let next = if next >= self.ffe_levels { 0 } else { next };
        self.lane_ffe_adjust_request[lane] = next;
        next
    }

    /// Number of lanes compared for pass/drop decisions.
    pub(crate) fn compared_lanes(&self) -> usize {
        if self.lanes == 4 {
            4
        } else {
            3
        }
    }
}

/// Whether video is flowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// No stream.
    #[default]
    Down,
    /// Streaming.
    Up,
}

/// Stream-level status shared by the training state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamStatus {
    /// Stream state.
    pub state: StreamState,
    /// Link runs in FRL mode.
    pub is_frl: bool,
    /// Sink is HDMI (not DVI); gates auxiliary packets.
    pub is_hdmi: bool,
    /// Sink answered on the SCDC address.
    pub scdc_support: bool,
    /// Hot plug detected.
    pub is_connected: bool,
}

impl Default for StreamStatus {
    fn default() -> Self {
        Self {
            state: StreamState::Down,
            is_frl: false,
            is_hdmi: true,
            scdc_support: false,
            is_connected: false,
        }
    }
}
