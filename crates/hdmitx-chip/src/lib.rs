// SPDX-License-Identifier: AGPL-3.0-only

//! Silicon model for the HDMI 2.1 transmitter core.
//!
//! This crate has **no dependencies** and **no hardware access**. It is a
//! pure model of the core and of the sink-side register set it talks to:
//! register offsets, bit definitions, DDC command tokens, the SCDC field
//! table, the FRL rate table and link training pattern codes.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | TX core register map (PIO, DDC, AUX, FRL peripherals) |
//! | [`scdc`] | SCDC register addresses, flag masks and the [`scdc::ScdcField`] table |
//! | [`rate`] | FRL rate table (lanes and line rate per rate index) |
//! | [`ltp`] | Link training patterns and sink request codes |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ltp;
pub mod rate;
pub mod regs;
pub mod scdc;
