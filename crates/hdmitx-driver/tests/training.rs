// SPDX-License-Identifier: AGPL-3.0-only

//! FRL link training against the simulated core and sink

use hdmitx_chip::ltp::LinkTrainingPattern;
use hdmitx_chip::regs::{aux_ctrl, frl_ctrl, pio_out};
use hdmitx_chip::scdc::{self, source_test_config, status_flags, update_flags};
use hdmitx_driver::backends::{SimulatedSink, SimulatedTx};
use hdmitx_driver::{
    EventLog, HdmiTx, Lts3Event, LtsPEvent, StepOutcome, StreamState, TrainingError,
    TrainingState, TransactionError, TxConfig, TxEvent,
};

type Tx = HdmiTx<SimulatedTx, EventLog>;

/// HDMI 2.1 sink that is ready for link training.
fn hdmi21_sink() -> SimulatedSink {
    let mut sink = SimulatedSink::new();
    sink.set_register(scdc::SINK_VERSION, 1);
    sink.set_register(scdc::STATUS_FLAGS, status_flags::FLT_READY);
    sink
}

fn tx_with(sink: SimulatedSink, config: TxConfig) -> Tx {
    HdmiTx::with_observer(SimulatedTx::with_sink(sink), config, EventLog::new())
}

fn tx() -> Tx {
    tx_with(hdmi21_sink(), TxConfig::default())
}

/// Publish lane requests and raise FLT update, as the sink does.
fn sink_requests(tx: &mut Tx, codes: [u8; 4]) {
    let sink = tx.registers_mut().sink_mut();
    sink.set_lane_requests(codes);
    sink.set_bits(scdc::UPDATE_FLAGS, update_flags::FLT_UPDATE);
}

fn train_to_lts3(tx: &mut Tx, rate: u8) {
    tx.start_frl_training(rate).expect("LTS:1 failed");
    assert_eq!(tx.training_state(), TrainingState::Lts2);
    tx.exec_frl_state().expect("LTS:2 failed");
    assert_eq!(tx.training_state(), TrainingState::Lts3Arm);
    tx.exec_frl_state().expect("LTS:3-Arm failed");
    assert_eq!(tx.training_state(), TrainingState::Lts3);
}

fn train_to_lts_p(tx: &mut Tx, rate: u8) {
    train_to_lts3(tx, rate);
    sink_requests(tx, [0; 4]);
    tx.exec_frl_state().expect("LTS:3 failed");
    assert_eq!(tx.training_state(), TrainingState::LtsPArm);
    tx.exec_frl_state().expect("LTS:P-Arm failed");
    assert_eq!(tx.training_state(), TrainingState::LtsP);
}

// ── Bring-up ─────────────────────────────────────────────────────────────────

#[test]
fn test_reaches_lts_p_arm_in_four_executions() {
    let mut tx = tx();
    let config = TxConfig::default();

    tx.start_frl_training(6).expect("LTS:1 failed");
    assert_eq!(tx.training_state(), TrainingState::Lts2);
    assert_eq!(tx.registers().frl_timer(), config.timer_cycles_10us());
    assert_eq!(tx.registers().sink().register(scdc::SOURCE_VERSION), 1);
    assert!(tx.stream().scdc_support);

    tx.exec_frl_state().expect("LTS:2 failed");
    tx.exec_frl_state().expect("LTS:3-Arm failed");
    sink_requests(&mut tx, [0; 4]);
    let step = tx.exec_frl_state().expect("LTS:3 failed");

    assert_eq!(step, StepOutcome::Executed);
    assert_eq!(tx.training_state(), TrainingState::LtsPArm);
    assert_eq!(tx.link().frl_rate(), 6);
    assert_eq!(tx.link().lanes(), 4);
    assert_eq!(tx.link().line_rate_gbps(), 12);
    assert!(tx.observer().contains(TxEvent::Lts3(Lts3Event::Pass)));
    assert!(tx.observer().contains(TxEvent::FrlConfig { frl_rate: 6, lanes: 4 }));

    let ctrl = tx.registers().frl_ctrl();
    assert_ne!(ctrl & frl_ctrl::OP_MODE, 0, "FRL mode not selected");
    assert_ne!(ctrl & frl_ctrl::LN_OP, 0, "4-lane mode not selected");
}

#[test]
fn test_lts2_sends_nyquist_and_arm_clears_it() {
    let mut tx = tx();
    tx.start_frl_training(3).expect("LTS:1 failed");
    tx.exec_frl_state().expect("LTS:2 failed");
    for lane in 0..4 {
        assert_eq!(tx.core_mut().frl_ltp(lane), Some(LinkTrainingPattern::NyquistClock));
    }
    tx.exec_frl_state().expect("LTS:3-Arm failed");
    for lane in 0..4 {
        assert_eq!(tx.core_mut().frl_ltp(lane), Some(LinkTrainingPattern::None));
    }
    assert_eq!(tx.registers().frl_ctrl() & frl_ctrl::ACT, 0, "expected GAP-only");
}

#[test]
fn test_rate_and_ffe_levels_advertised() {
    let mut tx = tx();
    tx.set_ffe_levels(3);
    train_to_lts3(&mut tx, 6);
    let sink = tx.registers().sink();
    assert_eq!(sink.register(scdc::CONFIG_1), scdc::config_1::encode(6, 3));
    assert_eq!(sink.writes_to(scdc::CONFIG_0), vec![0]);
}

#[test]
fn test_requested_rate_clamped_to_maximum() {
    let mut tx = tx_with(hdmi21_sink(), TxConfig::default().with_max_frl_rate(4));
    tx.start_frl_training(6).expect("LTS:1 failed");
    assert_eq!(tx.link().frl_rate(), 4);
    assert_eq!(tx.set_max_frl_rate(6), 4);
    assert_eq!(tx.set_max_frl_rate(2), 2);
    assert_eq!(tx.link().frl_rate(), 2);
}

#[test]
fn test_sink_without_scdc_stays_in_tmds() {
    let mut sink = SimulatedSink::new();
    sink.set_register(scdc::SINK_VERSION, 0);
    let mut tx = tx_with(sink, TxConfig::default());

    tx.start_frl_training(6).expect("LTS:1 failed");
    assert_eq!(tx.training_state(), TrainingState::Legacy);
    assert!(!tx.link().training_requested);

    tx.exec_frl_state().expect("LTS:L failed");
    assert_eq!(tx.training_state(), TrainingState::Legacy);
    assert!(!tx.stream().is_frl);
    assert!(tx.observer().contains(TxEvent::TmdsConfig));
}

#[test]
fn test_unacknowledged_lts1_retries_through_legacy() {
    let mut sink = hdmi21_sink();
    sink.set_connected(false);
    let mut tx = tx_with(sink, TxConfig::default());

    tx.start_frl_training(6).expect("LTS:1 reports no error");
    assert_eq!(tx.training_state(), TrainingState::Legacy);
    assert!(tx.link().training_requested);

    tx.registers_mut().sink_mut().set_connected(true);
    tx.exec_frl_state().expect("LTS:L failed");
    assert_eq!(tx.training_state(), TrainingState::Lts1);
    tx.exec_frl_state().expect("LTS:1 failed");
    assert_eq!(tx.training_state(), TrainingState::Lts2);
}

#[test]
fn test_lts2_times_out_without_flt_ready() {
    let mut sink = hdmi21_sink();
    sink.set_register(scdc::STATUS_FLAGS, 0);
    let mut tx = tx_with(sink, TxConfig::default());
    tx.start_frl_training(6).expect("LTS:1 failed");

    let mut polls = 0;
    while tx.training_state() == TrainingState::Lts2 {
        tx.exec_frl_state().expect("LTS:2 failed");
        polls += 1;
        assert!(polls <= 20, "LTS:2 never timed out");
    }
    assert_eq!(polls, 20);
    assert_eq!(tx.training_state(), TrainingState::Legacy);
}

#[test]
fn test_unreadable_test_config_is_not_acknowledged() {
    let mut tx = tx();
    tx.start_frl_training(6).expect("LTS:1 failed");
    assert_eq!(tx.training_state(), TrainingState::Lts2);

    let sink = tx.registers_mut().sink_mut();
    sink.hide_register(scdc::SOURCE_TEST_CONFIG);
    sink.clear_writes();
    tx.exec_frl_state().expect("LTS:2 failed");

    assert_eq!(tx.training_state(), TrainingState::Lts3Arm);
    assert!(tx.registers().sink().writes_to(scdc::UPDATE_FLAGS).is_empty());
}

#[test]
fn test_flt_no_timeout_keeps_lts2_waiting() {
    let mut sink = hdmi21_sink();
    sink.set_register(scdc::STATUS_FLAGS, 0);
    sink.set_register(scdc::SOURCE_TEST_CONFIG, source_test_config::FLT_NO_TIMEOUT);
    let mut tx = tx_with(sink, TxConfig::default());
    tx.start_frl_training(6).expect("LTS:1 failed");

    for _ in 0..40 {
        tx.exec_frl_state().expect("LTS:2 failed");
    }
    assert_eq!(tx.training_state(), TrainingState::Lts2);
    assert!(tx.link().flt_no_timeout);
}

// ── LTS:3 ────────────────────────────────────────────────────────────────────

#[test]
fn test_lts3_without_flt_update_has_no_data() {
    let mut tx = tx();
    train_to_lts3(&mut tx, 6);
    let step = tx.exec_frl_state().expect("LTS:3 failed");
    assert_eq!(step, StepOutcome::NoData);
    assert_eq!(tx.training_state(), TrainingState::Lts3);
    assert_eq!(tx.link().timer_count_ms, 2);
    assert_eq!(tx.registers().frl_timer(), TxConfig::default().timer_cycles_ms(2));
}

#[test]
fn test_lts3_timeout_fires_once() {
    let mut tx = tx();
    train_to_lts3(&mut tx, 6);

    let mut polls = 0;
    while tx.training_state() == TrainingState::Lts3 {
        tx.exec_frl_state().expect("LTS:3 failed");
        polls += 1;
        assert!(polls <= 200, "LTS:3 never timed out");
    }
    assert_eq!(tx.training_state(), TrainingState::Legacy);
    assert_eq!(tx.observer().count(TxEvent::Lts3(Lts3Event::Timeout)), 1);
    assert_eq!(tx.link().timer_count_ms, 0);

    // The request survives, so training restarts from LTS:1.
    for _ in 0..3 {
        tx.exec_frl_state().expect("restart failed");
    }
    assert_eq!(tx.training_state(), TrainingState::Lts3Arm);
    assert_eq!(tx.observer().count(TxEvent::Lts3(Lts3Event::Timeout)), 1);
}

#[test]
fn test_rate_drop_steps_down_one_rate() {
    let mut tx = tx();
    train_to_lts3(&mut tx, 6);
    sink_requests(&mut tx, [0xF; 4]);
    tx.exec_frl_state().expect("LTS:3 failed");
    assert_eq!(tx.training_state(), TrainingState::Lts4);

    tx.exec_frl_state().expect("LTS:4 failed");
    assert_eq!(tx.training_state(), TrainingState::Lts3Arm);
    assert_eq!(tx.link().frl_rate(), 5);
    assert_eq!(tx.link().line_rate_gbps(), 10);
    assert!(tx.observer().contains(TxEvent::Lts4 { frl_rate: 5 }));
    assert!(tx.observer().contains(TxEvent::FrlConfig { frl_rate: 5, lanes: 4 }));

    tx.exec_frl_state().expect("LTS:3-Arm failed");
    assert_eq!(tx.registers().sink().register(scdc::CONFIG_1) & 0x0F, 5);
}

#[test]
fn test_rate_drop_runs_lts4_on_short_timer() {
    let mut tx = tx();
    train_to_lts3(&mut tx, 6);
    sink_requests(&mut tx, [0xF; 4]);
    tx.exec_frl_state().expect("LTS:3 failed");
    assert_eq!(tx.training_state(), TrainingState::Lts4);
    assert_eq!(tx.registers().frl_timer(), TxConfig::default().timer_cycles_10us());
}

#[test]
fn test_rate_drop_below_rate_one_gives_up() {
    let mut tx = tx();
    train_to_lts3(&mut tx, 1);
    sink_requests(&mut tx, [0xF, 0xF, 0xF, 0]);
    tx.exec_frl_state().expect("LTS:3 failed");
    assert_eq!(tx.training_state(), TrainingState::Lts4);

    tx.exec_frl_state().expect("LTS:4 failed");
    assert_eq!(tx.training_state(), TrainingState::Legacy);
    assert!(!tx.link().training_requested);

    tx.exec_frl_state().expect("LTS:L failed");
    assert_eq!(tx.training_state(), TrainingState::Legacy);
    assert_eq!(tx.link().frl_rate(), 0);
    assert!(tx.observer().contains(TxEvent::TmdsConfig));
    assert_eq!(tx.registers().frl_ctrl() & frl_ctrl::OP_MODE, 0);
}

#[test]
fn test_rate_lock_keeps_rate() {
    let mut tx = tx();
    tx.enable_rate_lock();
    train_to_lts3(&mut tx, 6);
    sink_requests(&mut tx, [0xF; 4]);
    tx.exec_frl_state().expect("LTS:3 failed");
    tx.exec_frl_state().expect("LTS:4 failed");
    assert_eq!(tx.training_state(), TrainingState::Lts3Arm);
    assert_eq!(tx.link().frl_rate(), 6);
    assert!(tx.observer().contains(TxEvent::Lts4 { frl_rate: 6 }));
}

#[test]
fn test_three_lane_rates_ignore_lane_three() {
    let mut tx = tx();
    train_to_lts3(&mut tx, 2);
    assert_eq!(tx.registers().frl_ctrl() & frl_ctrl::LN_OP, 0, "expected 3-lane mode");
    sink_requests(&mut tx, [0, 0, 0, 0xF]);
    tx.exec_frl_state().expect("LTS:3 failed");
    assert_eq!(tx.training_state(), TrainingState::LtsPArm);
}

#[test]
fn test_four_lane_rates_compare_lane_three() {
    let mut tx = tx();
    train_to_lts3(&mut tx, 6);
    sink_requests(&mut tx, [0, 0, 0, 0xF]);
    tx.exec_frl_state().expect("LTS:3 failed");
    assert_eq!(tx.training_state(), TrainingState::Lts3);
    assert_eq!(
        tx.registers().sink().register(scdc::UPDATE_FLAGS) & update_flags::FLT_UPDATE,
        0,
        "FLT update not acknowledged"
    );
    assert!(tx
        .observer()
        .contains(TxEvent::Lts3(Lts3Event::LaneRequest { lane: 3, code: 0xF })));
}

#[test]
fn test_pattern_requests_program_lanes() {
    let mut tx = tx();
    train_to_lts3(&mut tx, 6);
    sink_requests(&mut tx, [5, 6, 7, 8]);
    tx.exec_frl_state().expect("LTS:3 failed");
    assert_eq!(tx.core_mut().frl_ltp(0), Some(LinkTrainingPattern::Lfsr0));
    assert_eq!(tx.core_mut().frl_ltp(1), Some(LinkTrainingPattern::Lfsr1));
    assert_eq!(tx.core_mut().frl_ltp(2), Some(LinkTrainingPattern::Lfsr2));
    assert_eq!(tx.core_mut().frl_ltp(3), Some(LinkTrainingPattern::Lfsr3));
}

#[test]
fn test_wrong_ltp_forces_nyquist_on_lane_two() {
    let mut tx = tx();
    tx.set_frl_wrong_ltp();
    train_to_lts3(&mut tx, 6);
    sink_requests(&mut tx, [5, 5, 5, 5]);
    tx.exec_frl_state().expect("LTS:3 failed");
    assert_eq!(tx.core_mut().frl_ltp(0), Some(LinkTrainingPattern::Lfsr0));
    assert_eq!(tx.core_mut().frl_ltp(2), Some(LinkTrainingPattern::NyquistClock));

    tx.clear_frl_wrong_ltp();
    sink_requests(&mut tx, [5, 5, 5, 5]);
    tx.exec_frl_state().expect("LTS:3 failed");
    assert_eq!(tx.core_mut().frl_ltp(2), Some(LinkTrainingPattern::Lfsr0));
}

#[test]
fn test_nyquist_request_needs_no_timeout_mode() {
    let mut tx = tx();
    train_to_lts3(&mut tx, 6);
    sink_requests(&mut tx, [3, 1, 1, 1]);
    tx.exec_frl_state().expect("LTS:3 failed");
    assert_eq!(tx.core_mut().frl_ltp(0), Some(LinkTrainingPattern::None));
    assert_eq!(tx.core_mut().frl_ltp(1), Some(LinkTrainingPattern::AllOnes));

    let mut sink = hdmi21_sink();
    sink.set_register(scdc::SOURCE_TEST_CONFIG, source_test_config::FLT_NO_TIMEOUT);
    let mut tx = tx_with(sink, TxConfig::default());
    train_to_lts3(&mut tx, 6);
    sink_requests(&mut tx, [3, 1, 1, 1]);
    tx.exec_frl_state().expect("LTS:3 failed");
    assert_eq!(tx.core_mut().frl_ltp(0), Some(LinkTrainingPattern::NyquistClock));
}

#[test]
fn test_ffe_requests_wrap_at_levels() {
    let mut tx = tx();
    tx.set_ffe_levels(3);
    train_to_lts3(&mut tx, 6);

    for expected in [1, 2, 0] {
        sink_requests(&mut tx, [0xE, 0, 0, 0]);
        tx.exec_frl_state().expect("LTS:3 failed");
        assert_eq!(tx.link().lane_ffe_adjust_request, [expected, 0, 0, 0]);
    }
    assert!(tx.observer().contains(TxEvent::FrlFfe([2, 0, 0, 0])));
}

#[test]
fn test_lane_ffe_override() {
    let mut tx = tx();
    tx.set_ffe_levels(4);
    tx.set_frl_lane_ffe(1, 3).expect("lane 1 is valid");
    tx.set_frl_lane_ffe(2, 4).expect("lane 2 is valid");
    assert_eq!(tx.link().lane_ffe_adjust_request, [0, 3, 0, 0]);
    assert!(matches!(
        tx.set_frl_lane_ffe(4, 0),
        Err(TrainingError::InvalidLaneIndex { lane: 4 })
    ));
    assert_eq!(tx.observer().count(TxEvent::FrlFfe([0, 3, 0, 0])), 2);
}

// ── LTS:P ────────────────────────────────────────────────────────────────────

#[test]
fn test_frl_start_moves_to_ready() {
    let mut tx = tx();
    train_to_lts_p(&mut tx, 6);

    tx.registers_mut()
        .sink_mut()
        .set_bits(scdc::UPDATE_FLAGS, update_flags::FRL_START);
    tx.exec_frl_state().expect("LTS:P failed");

    assert_eq!(tx.training_state(), TrainingState::LtsPFrlReady);
    assert!(tx.link().training_state.is_passed());
    assert_eq!(tx.observer().count(TxEvent::FrlStart), 1);
    assert!(tx.observer().contains(TxEvent::LtsP(LtsPEvent::FrlStart)));
    assert_eq!(tx.registers().frl_timer(), TxConfig::default().timer_cycles_ms(250));
    assert_eq!(
        tx.registers().sink().register(scdc::UPDATE_FLAGS) & update_flags::FRL_START,
        0,
        "FRL start not acknowledged"
    );

    // Once ready, further FRL start flags are ignored.
    tx.registers_mut()
        .sink_mut()
        .set_bits(scdc::UPDATE_FLAGS, update_flags::FRL_START);
    tx.exec_frl_state().expect("LTS:P failed");
    assert_eq!(tx.observer().count(TxEvent::FrlStart), 1);
}

#[test]
fn test_frl_start_unacknowledged_clear_still_ready() {
    let mut tx = tx();
    train_to_lts_p(&mut tx, 6);

    let sink = tx.registers_mut().sink_mut();
    sink.set_bits(scdc::UPDATE_FLAGS, update_flags::FRL_START);
    sink.reject_writes_to(scdc::UPDATE_FLAGS);
    let outcome = tx.exec_frl_state().expect("LTS:P should not fail on the clear");

    assert_eq!(outcome, StepOutcome::Executed);
    assert_eq!(tx.training_state(), TrainingState::LtsPFrlReady);
    assert_eq!(tx.observer().count(TxEvent::FrlStart), 1);
    assert!(tx.observer().contains(TxEvent::LtsP(LtsPEvent::FrlStart)));
    assert_eq!(tx.registers().frl_timer(), TxConfig::default().timer_cycles_ms(250));
    assert_ne!(
        tx.registers().sink().register(scdc::UPDATE_FLAGS) & update_flags::FRL_START,
        0,
        "sink refused the clear"
    );
}

#[test]
fn test_flt_update_in_lts_p_retrains() {
    let mut tx = tx();
    train_to_lts_p(&mut tx, 6);
    tx.frl_stream_start();

    tx.registers_mut()
        .sink_mut()
        .set_bits(scdc::UPDATE_FLAGS, update_flags::FLT_UPDATE);
    tx.exec_frl_state().expect("LTS:P failed");

    assert_eq!(tx.training_state(), TrainingState::Lts3);
    assert!(tx.observer().contains(TxEvent::FrlStop));
    assert!(tx.observer().contains(TxEvent::LtsP(LtsPEvent::FltUpdate)));
    assert_eq!(tx.registers().frl_ctrl() & frl_ctrl::ACT, 0, "expected GAP-only");
}

#[test]
fn test_ced_update_notifies() {
    let mut tx = tx();
    train_to_lts_p(&mut tx, 6);
    tx.registers_mut()
        .sink_mut()
        .set_bits(scdc::UPDATE_FLAGS, update_flags::CED_UPDATE);
    tx.exec_frl_state().expect("LTS:P failed");
    assert_eq!(tx.training_state(), TrainingState::LtsP);
    assert!(tx.observer().contains(TxEvent::CedUpdate));
}

#[test]
fn test_lts_p_read_failure_is_reported() {
    let mut tx = tx();
    train_to_lts_p(&mut tx, 6);
    tx.registers_mut().sink_mut().set_connected(false);

    let err = tx.exec_frl_state().expect_err("read should fail");
    assert_eq!(
        err,
        TrainingError::RegisterIoFailed {
            source: TransactionError::NoAck
        }
    );
    assert!(tx.observer().contains(TxEvent::LtsP(LtsPEvent::ReadFailed)));
}

// ── Stream and events ────────────────────────────────────────────────────────

#[test]
fn test_stream_start_and_stop() {
    let mut tx = tx_with(hdmi21_sink(), TxConfig::default().with_dynamic_hdr(true));
    train_to_lts_p(&mut tx, 6);

    tx.frl_stream_start();
    assert_eq!(tx.stream().state, StreamState::Up);
    assert_ne!(tx.registers().frl_ctrl() & frl_ctrl::ACT, 0);
    assert_ne!(tx.registers().aux_ctrl() & aux_ctrl::RUN, 0);
    assert_ne!(tx.registers().pio_out() & pio_out::DYN_HDR_DM_EN, 0);

    tx.frl_stream_stop();
    assert_eq!(tx.stream().state, StreamState::Down);
    assert_eq!(tx.registers().aux_ctrl() & (aux_ctrl::RUN | aux_ctrl::IE), 0);
    assert_eq!(tx.registers().pio_out() & pio_out::DYN_HDR_DM_EN, 0);
    assert!(tx.observer().contains(TxEvent::StreamUp));
    assert!(tx.observer().contains(TxEvent::StreamDown));
}

#[test]
fn test_dvi_sink_gets_no_aux_packets() {
    let mut tx = tx();
    tx.set_sink_is_hdmi(false);
    tx.frl_stream_start();
    assert_eq!(tx.registers().aux_ctrl() & aux_ctrl::RUN, 0);
    assert_ne!(tx.registers().aux_ctrl() & aux_ctrl::IE, 0);
}

#[test]
fn test_disconnect_returns_to_legacy() {
    let mut tx = tx();
    tx.on_connect(true);
    assert!(tx.stream().scdc_support);
    train_to_lts_p(&mut tx, 6);
    tx.frl_stream_start();

    tx.on_connect(false);
    assert_eq!(tx.training_state(), TrainingState::Legacy);
    assert_eq!(tx.stream().state, StreamState::Down);
    assert!(!tx.stream().is_frl);
    assert!(!tx.stream().is_connected);
    assert!(!tx.link().training_requested);
    let events = tx.observer().events();
    assert!(events.contains(&TxEvent::TmdsConfig));
    assert_eq!(events.last(), Some(&TxEvent::Connect(false)));
}

#[test]
fn test_tmds_mode_tears_down_on_next_exec() {
    let mut tx = tx();
    train_to_lts3(&mut tx, 6);
    tx.start_tmds_mode();
    assert_eq!(tx.training_state(), TrainingState::Legacy);
    tx.exec_frl_state().expect("LTS:L failed");
    assert_eq!(tx.training_state(), TrainingState::Legacy);
    assert_eq!(tx.registers().frl_ctrl() & frl_ctrl::OP_MODE, 0);
    assert_eq!(tx.observer().count(TxEvent::LtsLegacy), 1);
}

#[test]
fn test_timer_events_are_coalesced() {
    let mut tx = tx();
    tx.start_frl_training(6).expect("LTS:1 failed");
    assert!(tx.run_pending().is_none());

    assert!(tx.on_frl_timer_event());
    assert!(!tx.on_frl_timer_event());
    tx.run_pending().expect("event pending").expect("LTS:2 failed");
    assert!(tx.run_pending().is_none());
    assert_eq!(tx.training_state(), TrainingState::Lts3Arm);
}

#[test]
fn test_link_ready_runs_training_state() {
    let mut tx = tx();
    assert!(tx.on_link_ready().is_none(), "Legacy needs no execution");

    tx.start_frl_training(6).expect("LTS:1 failed");
    tx.registers_mut().set_link_ready(false);
    assert!(tx.on_link_ready().is_none());

    tx.registers_mut().set_link_ready(true);
    tx.on_link_ready().expect("link is up").expect("LTS:2 failed");
    assert_eq!(tx.training_state(), TrainingState::Lts3Arm);
}

#[test]
fn test_interrupts_masked_during_execution() {
    let mut tx = tx();
    train_to_lts3(&mut tx, 6);
    assert!(tx.registers().transaction_pio_ie().iter().all(|ie| !ie));
    assert!(tx.core_mut().frl_intr_enabled());
    assert!(tx.core_mut().pio_intr_enabled());
}
