// SPDX-License-Identifier: AGPL-3.0-only

//! Training notifications
//!
//! The state machine reports what it did through [`TrainingObserver`]. All
//! methods default to no-ops, so an observer only implements the events it
//! cares about; `()` observes nothing. [`EventLog`] queues every event as a
//! [`TxEvent`] for callers that prefer to poll.

use super::state::FrlLinkState;

/// LTS:3 debug events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lts3Event {
    /// No FLT update within the training window; falling back to Legacy.
    Timeout,
    /// Every compared lane passed.
    Pass,
    /// Every compared lane asked for a lower rate.
    RateDrop,
    /// Per-lane request code.
    LaneRequest {
        /// Lane index
        lane: u8,
        /// 4-bit request code
        code: u8,
    },
}

/// LTS:P debug events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LtsPEvent {
    /// Sink set FRL start; ready to stream.
    FrlStart,
    /// Sink asked for retraining.
    FltUpdate,
    /// Reading the update flags failed.
    ReadFailed,
}

/// Receiver of training and stream notifications.
#[allow(unused_variables)]
pub trait TrainingObserver {
    /// Hot plug state changed.
    fn connect(&mut self, connected: bool) {}

    /// Hot plug toggled.
    fn toggle(&mut self) {}

    /// Rate or lane configuration changed; reprogram the transceivers.
    fn frl_config(&mut self, link: &FrlLinkState) {}

    /// Per-lane FFE levels changed.
    fn frl_ffe(&mut self, link: &FrlLinkState) {}

    /// Sink is ready for the FRL stream.
    fn frl_start(&mut self, link: &FrlLinkState) {}

    /// Sink asked for retraining; stop streaming.
    fn frl_stop(&mut self, link: &FrlLinkState) {}

    /// Link fell back to TMDS; reprogram for TMDS.
    fn tmds_config(&mut self) {}

    /// Stream started.
    fn stream_up(&mut self) {}

    /// Stream stopped.
    fn stream_down(&mut self) {}

    /// Character error counters updated.
    fn ced_update(&mut self) {}

    /// LTS:L executed.
    fn lts_legacy(&mut self, link: &FrlLinkState) {}

    /// LTS:1 executed.
    fn lts1(&mut self, link: &FrlLinkState) {}

    /// LTS:2 saw the sink ready.
    fn lts2(&mut self, link: &FrlLinkState) {}

    /// LTS:3 debug event.
    fn lts3(&mut self, event: Lts3Event, link: &FrlLinkState) {}

    /// LTS:4 accepted a rate change.
    fn lts4(&mut self, link: &FrlLinkState) {}

    /// LTS:P debug event.
    fn lts_p(&mut self, event: LtsPEvent, link: &FrlLinkState) {}
}

impl TrainingObserver for () {}

impl<O: TrainingObserver + ?Sized> TrainingObserver for Box<O> {
    fn connect(&mut self, connected: bool) {
        (**self).connect(connected);
    }
    fn toggle(&mut self) {
        (**self).toggle();
    }
    fn frl_config(&mut self, link: &FrlLinkState) {
        (**self).frl_config(link);
    }
    fn frl_ffe(&mut self, link: &FrlLinkState) {
        (**self).frl_ffe(link);
    }
    fn frl_start(&mut self, link: &FrlLinkState) {
        (**self).frl_start(link);
    }
    fn frl_stop(&mut self, link: &FrlLinkState) {
        (**self).frl_stop(link);
    }
    fn tmds_config(&mut self) {
        (**self).tmds_config();
    }
    fn stream_up(&mut self) {
        (**self).stream_up();
    }
    fn stream_down(&mut self) {
        (**self).stream_down();
    }
    fn ced_update(&mut self) {
        (**self).ced_update();
    }
    fn lts_legacy(&mut self, link: &FrlLinkState) {
        (**self).lts_legacy(link);
    }
    fn lts1(&mut self, link: &FrlLinkState) {
        (**self).lts1(link);
    }
    fn lts2(&mut self, link: &FrlLinkState) {
        (**self).lts2(link);
    }
    fn lts3(&mut self, event: Lts3Event, link: &FrlLinkState) {
        (**self).lts3(event, link);
    }
    fn lts4(&mut self, link: &FrlLinkState) {
        (**self).lts4(link);
    }
    fn lts_p(&mut self, event: LtsPEvent, link: &FrlLinkState) {
        (**self).lts_p(event, link);
    }
}

/// One notification, as queued by [`EventLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxEvent {
    /// Hot plug state changed.
    Connect(bool),
    /// Hot plug toggled.
    Toggle,
    /// New rate/lane configuration.
    FrlConfig {
        /// Rate index
        frl_rate: u8,
        /// Active lanes
        lanes: u8,
    },
    /// New per-lane FFE levels.
    FrlFfe([u8; 4]),
    /// Sink ready for the FRL stream.
    FrlStart,
    /// Sink asked for retraining.
    FrlStop,
    /// Fell back to TMDS.
    TmdsConfig,
    /// Stream started.
    StreamUp,
    /// Stream stopped.
    StreamDown,
    /// Character error counters updated.
    CedUpdate,
    /// LTS:L executed.
    LtsLegacy,
    /// LTS:1 executed.
    Lts1,
    /// LTS:2 saw the sink ready.
    Lts2,
    /// LTS:3 debug event.
    Lts3(Lts3Event),
    /// LTS:4 accepted a rate change.
    Lts4 {
        /// Rate index after the change
        frl_rate: u8,
    },
    /// LTS:P debug event.
    LtsP(LtsPEvent),
}

/// Observer that queues every notification.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<TxEvent>,
}

impl EventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queued events, oldest first.
    pub fn events(&self) -> &[TxEvent] {
        &self.events
    }

    /// Take all queued events.
    pub fn drain(&mut self) -> Vec<TxEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of queued events equal to `event`.
    pub fn count(&self, event: TxEvent) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }

    /// Whether `event` was queued.
    pub fn contains(&self, event: TxEvent) -> bool {
        self.events.contains(&event)
    }
}

impl TrainingObserver for EventLog {
    fn connect(&mut self, connected: bool) {
        self.events.push(TxEvent::Connect(connected));
    }
    fn toggle(&mut self) {
        self.events.push(TxEvent::Toggle);
    }
    fn frl_config(&mut self, link: &FrlLinkState) {
        self.events.push(TxEvent::FrlConfig {
            frl_rate: link.frl_rate(),
            lanes: link.lanes(),
        });
    }
    fn frl_ffe(&mut self, link: &FrlLinkState) {
        self.events.push(TxEvent::FrlFfe(link.lane_ffe_adjust_request));
    }
    fn frl_start(&mut self, _link: &FrlLinkState) {
        self.events.push(TxEvent::FrlStart);
    }
    fn frl_stop(&mut self, _link: &FrlLinkState) {
        self.events.push(TxEvent::FrlStop);
    }
    fn tmds_config(&mut self) {
        self.events.push(TxEvent::TmdsConfig);
    }
    fn stream_up(&mut self) {
        self.events.push(TxEvent::StreamUp);
    }
    fn stream_down(&mut self) {
        self.events.push(TxEvent::StreamDown);
    }
    fn ced_update(&mut self) {
        self.events.push(TxEvent::CedUpdate);
    }
    fn lts_legacy(&mut self, _link: &FrlLinkState) {
        self.events.push(TxEvent::LtsLegacy);
    }
    fn lts1(&mut self, _link: &FrlLinkState) {
        self.events.push(TxEvent::Lts1);
    }
    fn lts2(&mut self, _link: &FrlLinkState) {
        self.events.push(TxEvent::Lts2);
    }
    fn lts3(&mut self, event: Lts3Event, _link: &FrlLinkState) {
        self.events.push(TxEvent::Lts3(event));
    }
    fn lts4(&mut self, link: &FrlLinkState) {
        self.events.push(TxEvent::Lts4 {
            frl_rate: link.frl_rate(),
        });
    }
    fn lts_p(&mut self, event: LtsPEvent, _link: &FrlLinkState) {
        self.events.push(TxEvent::LtsP(event));
    }
}
