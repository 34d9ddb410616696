// SPDX-License-Identifier: AGPL-3.0-only

//! Pure Rust driver for HDMI 2.1 transmitter cores.
//!
//! This crate drives the link-facing side of the TX core: the DDC engine
//! used for SCDC register access on the sink, and the Fixed Rate Link (FRL)
//! training state machine that brings up 3-lane and 4-lane links at 3 to
//! 12 Gbps per lane.
//!
//! # Backends
//!
//! ```text
//! Hardware:
//!   MappedRegisters  - UIO register window (mmap, volatile access)
//!
//! Development / CI:
//!   SimulatedTx      - register-level model of the core plus a scripted sink
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use hdmitx_driver::prelude::*;
//! use hdmitx_driver::mmio::MappedRegisters;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let regs = MappedRegisters::from_env()?;
//! let mut tx = HdmiTx::new(regs, TxConfig::default());
//!
//! if tx.detect_hdmi20() {
//!     tx.start_frl_training(6)?;
//! }
//! // From the FRL timer interrupt:
//! tx.on_frl_timer_event();
//! // From the driver's event loop:
//! if let Some(step) = tx.run_pending() {
//!     step?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # FRL rates
//!
//! | Rate | Lanes | Gbps/lane |
//! |------|-------|-----------|
//! | 1 | 3 | 3 |
//! | 2 | 3 | 6 |
//! | 3 | 4 | 6 |
//! | 4 | 4 | 8 |
//! | 5 | 4 | 10 |
//! | 6 | 4 | 12 |

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod backends;
pub mod ddc;
mod error;
pub mod frl;
mod hdmitx;
pub mod mmio;
mod registers;
mod scdc;
mod tx;

/// Silicon constants (re-exported from hdmitx-chip).
pub mod chip {
    pub use hdmitx_chip::ltp::{LinkTrainingPattern, LANE_COUNT};
    pub use hdmitx_chip::rate::{RateTableEntry, FRL_RATE_NONE, MAX_FRL_RATE, RATE_TABLE};
    pub use hdmitx_chip::scdc::{ScdcField, SLAVE_ADDRESS};
}

pub use ddc::{Ddc, DdcConfig, TransactionResult};
pub use error::{HdmiTxError, Result, TrainingError, TransactionError};
pub use frl::{
    EventLog, FrlLinkState, Lts3Event, LtsPEvent, StepOutcome, StreamState, StreamStatus,
    TrainingObserver, TrainingState, TxEvent,
};
pub use hdmitx::HdmiTx;
pub use registers::{BackendType, RegisterAccess};
pub use scdc::ScdcSnapshot;
pub use tx::{FrlActiveMode, TxConfig, TxCore};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        DdcConfig, FrlLinkState, HdmiTx, HdmiTxError, RegisterAccess, Result, StepOutcome,
        TrainingError, TrainingObserver, TrainingState, TransactionError, TxConfig,
    };
}
