// SPDX-License-Identifier: AGPL-3.0-only

//! FRL link training
//!
//! ```text
//!            start_frl_training
//!   Legacy ─────────────────────► LTS:1 ──► LTS:2 ──► LTS:3-Arm ──► LTS:3 ──► LTS:P-Arm ──► LTS:P ──► LTS:P-FRL-Ready
//!     ▲                             │         │            ▲           │  ▲                    │
//!     │        no SCDC / timeout    │         │            │   0xF     ▼  │  FLT update        │
//!     └─────────────────────────────┴─────────┘            └──────── LTS:4  └────────────────────┘
//! ```
//!
//! Each call to [`crate::HdmiTx::exec_frl_state`] runs the current state's
//! handler to completion: a few SCDC transactions, register updates, a new
//! countdown timer value and zero or more [`TrainingObserver`] notifications.

mod observer;
mod state;
pub(crate) mod stream;
pub(crate) mod training;

pub use observer::{EventLog, Lts3Event, LtsPEvent, TrainingObserver, TxEvent};
pub use state::{FrlLinkState, StepOutcome, StreamState, StreamStatus, TrainingState};
