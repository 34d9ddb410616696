// SPDX-License-Identifier: AGPL-3.0-only

//! Dump a sink's SCDC status through a UIO-mapped TX core
//!
//! ```text
//! HDMITX_UIO_DEVICE=/dev/uio1 cargo run --example scdc_dump
//! ```

use hdmitx_driver::mmio::MappedRegisters;
use hdmitx_driver::{HdmiTx, RegisterAccess, TxConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("hdmitx_driver=info")
        .init();

    let regs = MappedRegisters::from_env()?;
    println!("🔌 {} backend at {}\n", regs.backend_type(), regs.path().display());

    let mut tx = HdmiTx::new(regs, TxConfig::default());
    if !tx.detect_hdmi20() {
        println!("ℹ️  sink does not answer on the SCDC address (HDMI 1.4 or disconnected)");
        return Ok(());
    }

    let snapshot = tx.read_scdc_snapshot()?;
    println!("Sink version:      {:#04x}", snapshot.sink_version);
    println!("TMDS config:       {:#04x}", snapshot.tmds_config);
    println!(
        "Scrambler status:  {:#04x} ({})",
        snapshot.scrambler_status,
        if snapshot.scrambling_locked() { "locked" } else { "unlocked" }
    );
    println!("Status flags:      {:#04x}", snapshot.status_flags);

    let ced = tx.read_ced_counters()?;
    println!("\nCharacter error detection: {ced:02x?}");

    Ok(())
}
