// SPDX-License-Identifier: AGPL-3.0-only

//! FRL link training against the simulated TX core
//!
//! Plays the sink's side of the handshake: asks for LFSR patterns, then an
//! FFE step, then a rate drop, then passes and starts FRL.
//!
//! ```text
//! RUST_LOG=hdmitx_driver=debug cargo run --example simulated_training
//! ```

use hdmitx_chip::scdc::{self, status_flags, update_flags};
use hdmitx_driver::backends::{SimulatedSink, SimulatedTx};
use hdmitx_driver::prelude::*;
use hdmitx_driver::{Lts3Event, LtsPEvent};

/// Prints the notifications a transceiver driver would act on.
#[derive(Debug, Default)]
struct Console;

impl TrainingObserver for Console {
    fn frl_config(&mut self, link: &FrlLinkState) {
        println!(
            "  ⚙️  configure transceivers: rate {} = {} lanes x {} Gbps",
            link.frl_rate(),
            link.lanes(),
            link.line_rate_gbps()
        );
    }

    fn frl_ffe(&mut self, link: &FrlLinkState) {
        println!("  🎚️  FFE levels {:?}", link.lane_ffe_adjust_request);
    }

    fn frl_start(&mut self, _link: &FrlLinkState) {
        println!("  ▶️  sink ready for the FRL stream");
    }

    fn lts3(&mut self, event: Lts3Event, _link: &FrlLinkState) {
        if !matches!(event, Lts3Event::LaneRequest { code: 0, .. }) {
            println!("  LTS:3 {event:?}");
        }
    }

    fn lts_p(&mut self, event: LtsPEvent, _link: &FrlLinkState) {
        println!("  LTS:P {event:?}");
    }

    fn stream_up(&mut self) {
        println!("  📺 stream up");
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("hdmitx_driver=info")
        .init();

    println!("📡 HDMI 2.1 FRL training (simulated)\n");

    let mut sink = SimulatedSink::new();
    sink.set_register(scdc::SINK_VERSION, 1);
    sink.set_register(scdc::STATUS_FLAGS, status_flags::FLT_READY);

    let mut tx = HdmiTx::with_observer(
        SimulatedTx::with_sink(sink),
        TxConfig::default(),
        Console,
    );
    tx.set_ffe_levels(3);

    let mut script = [[5, 6, 7, 8], [0xE, 0, 0xE, 0], [0xF; 4], [0; 4]].into_iter();

    tx.start_frl_training(6)?;
    for step in 1..=64 {
        let state = tx.training_state();
        let sink = tx.registers_mut().sink_mut();
        match state {
            TrainingState::Lts3 => {
                if let Some(codes) = script.next() {
                    sink.set_lane_requests(codes);
                    sink.set_bits(scdc::UPDATE_FLAGS, update_flags::FLT_UPDATE);
                }
            }
            TrainingState::LtsP => sink.set_bits(scdc::UPDATE_FLAGS, update_flags::FRL_START),
            TrainingState::LtsPFrlReady => {
                println!("\n✅ trained in {step} steps");
                break;
            }
            _ => {}
        }
        tx.on_frl_timer_event();
        if let Some(result) = tx.run_pending() {
            result?;
        }
    }

    if tx.training_state() != TrainingState::LtsPFrlReady {
        anyhow::bail!("training did not complete: {}", tx.training_state());
    }

    tx.frl_stream_start();
    let link = tx.link();
    println!(
        "\nLink: FRL rate {} ({} lanes x {} Gbps), {} FRL executes",
        link.frl_rate(),
        link.lanes(),
        link.line_rate_gbps(),
        tx.registers().frl_executes()
    );

    Ok(())
}
