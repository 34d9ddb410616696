// SPDX-License-Identifier: AGPL-3.0-only

//! Register backends
//!
//! - [`crate::mmio::MappedRegisters`]: real hardware through a UIO mapping
//! - [`SimulatedTx`]: TX core model with an attached SCDC sink, for CI

pub mod simulated;

pub use simulated::{BusFault, SimulatedSink, SimulatedTx};
