// SPDX-License-Identifier: AGPL-3.0-only

//! TX core register map.
//!
//! The core is split into peripherals of sixteen 32-bit words each. Every
//! peripheral starts with an ID word followed by a control word and its
//! write-one-to-set / write-one-to-clear aliases.
//!
//! ```text
//! 0x000  VER   version / ID
//! 0x040  PIO   interrupt enable, link ready, misc outputs
//! 0x080  DDC   command/data FIFO engine for the sideband bus
//! 0x0C0  AUX   auxiliary (packet) data transmission
//! 0x180  FRL   fixed rate link control, pattern requests, countdown timer
//! ```

/// Size in bytes of one peripheral block.
pub const PERIPHERAL_STRIDE: usize = 64;

/// Bytes needed to cover every register used by the driver.
pub const REGISTER_SPACE: usize = 7 * PERIPHERAL_STRIDE;

// ── Version ──────────────────────────────────────────────────────────────────

/// Core identification word.
pub const VER_ID: usize = 0x000;
/// Core version word.
pub const VER_VERSION: usize = 0x004;

// ── PIO ──────────────────────────────────────────────────────────────────────

/// PIO peripheral base.
pub const PIO_BASE: usize = PERIPHERAL_STRIDE;
/// PIO control.
pub const PIO_CTRL: usize = PIO_BASE + 0x04;
/// PIO control, write one to set.
pub const PIO_CTRL_SET: usize = PIO_BASE + 0x08;
/// PIO control, write one to clear.
pub const PIO_CTRL_CLR: usize = PIO_BASE + 0x0C;
/// PIO status.
pub const PIO_STA: usize = PIO_BASE + 0x10;
/// PIO outputs.
pub const PIO_OUT: usize = PIO_BASE + 0x14;
/// PIO outputs, write one to set.
pub const PIO_OUT_SET: usize = PIO_BASE + 0x18;
/// PIO outputs, write one to clear.
pub const PIO_OUT_CLR: usize = PIO_BASE + 0x1C;
/// PIO inputs.
pub const PIO_IN: usize = PIO_BASE + 0x24;

/// PIO control bits.
pub mod pio_ctrl {
    /// Peripheral running.
    pub const RUN: u32 = 1 << 0;
    /// Interrupt enable.
    pub const IE: u32 = 1 << 1;
}

/// PIO output bits.
pub mod pio_out {
    /// Dynamic HDR data mover enable.
    pub const DYN_HDR_DM_EN: u32 = 1 << 27;
}

/// PIO input bits.
pub mod pio_in {
    /// Link (transceiver) ready.
    pub const LNK_RDY: u32 = 1 << 0;
    /// Video ready.
    pub const VID_RDY: u32 = 1 << 1;
    /// Hot plug detect.
    pub const HPD: u32 = 1 << 2;
}

// ── DDC ──────────────────────────────────────────────────────────────────────

/// DDC peripheral base.
pub const DDC_BASE: usize = 2 * PERIPHERAL_STRIDE;
/// DDC ID.
pub const DDC_ID: usize = DDC_BASE;
/// DDC control.
pub const DDC_CTRL: usize = DDC_BASE + 0x04;
/// DDC control, write one to set.
pub const DDC_CTRL_SET: usize = DDC_BASE + 0x08;
/// DDC control, write one to clear.
pub const DDC_CTRL_CLR: usize = DDC_BASE + 0x0C;
/// DDC status. `DONE` and `TIMEOUT` are write-one-to-clear.
pub const DDC_STA: usize = DDC_BASE + 0x10;
/// DDC command FIFO (write only).
pub const DDC_CMD: usize = DDC_BASE + 0x14;
/// DDC data FIFO (read only).
pub const DDC_DAT: usize = DDC_BASE + 0x18;

/// DDC control bits.
pub mod ddc_ctrl {
    /// Engine running.
    pub const RUN: u32 = 1 << 0;
    /// Interrupt enable.
    pub const IE: u32 = 1 << 1;
    /// Issue a stop condition on timeout.
    pub const TO_STOP: u32 = 1 << 2;
    /// Clock divider field mask (after shift).
    pub const CLK_DIV_MASK: u32 = 0xFFFF;
    /// Clock divider field shift.
    pub const CLK_DIV_SHIFT: u32 = 16;
}

/// DDC status bits.
pub mod ddc_sta {
    /// Interrupt pending.
    pub const IRQ: u32 = 1 << 0;
    /// Event.
    pub const EVT: u32 = 1 << 1;
    /// Bus busy.
    pub const BUSY: u32 = 1 << 2;
    /// Segment done.
    pub const DONE: u32 = 1 << 3;
    /// Bus timeout.
    pub const TIMEOUT: u32 = 1 << 4;
    /// Last address/data phase was acknowledged.
    pub const ACK: u32 = 1 << 5;
    /// Command FIFO full.
    pub const CMD_FULL: u32 = 1 << 8;
    /// Data FIFO empty.
    pub const DAT_EMPTY: u32 = 1 << 9;
}

/// DDC command FIFO tokens. Plain bytes (length, address, payload) are
/// pushed as values below `0x100`.
pub mod ddc_token {
    /// Start condition.
    pub const START: u32 = 0x100;
    /// Stop condition.
    pub const STOP: u32 = 0x101;
    /// Read segment, followed by a two-byte length.
    pub const READ: u32 = 0x102;
    /// Write segment, followed by a two-byte length and the bytes.
    pub const WRITE: u32 = 0x103;
}

// ── AUX ──────────────────────────────────────────────────────────────────────

/// AUX peripheral base.
pub const AUX_BASE: usize = 3 * PERIPHERAL_STRIDE;
/// AUX control.
pub const AUX_CTRL: usize = AUX_BASE + 0x04;
/// AUX control, write one to set.
pub const AUX_CTRL_SET: usize = AUX_BASE + 0x08;
/// AUX control, write one to clear.
pub const AUX_CTRL_CLR: usize = AUX_BASE + 0x0C;

/// AUX control bits.
pub mod aux_ctrl {
    /// Transmission running.
    pub const RUN: u32 = 1 << 0;
    /// Interrupt enable.
    pub const IE: u32 = 1 << 1;
}

// ── FRL ──────────────────────────────────────────────────────────────────────

/// FRL peripheral base.
pub const FRL_BASE: usize = 6 * PERIPHERAL_STRIDE;
/// FRL control.
pub const FRL_CTRL: usize = FRL_BASE + 0x04;
/// FRL control, write one to set.
pub const FRL_CTRL_SET: usize = FRL_BASE + 0x08;
/// FRL control, write one to clear.
pub const FRL_CTRL_CLR: usize = FRL_BASE + 0x0C;
/// FRL status.
pub const FRL_STA: usize = FRL_BASE + 0x10;
/// FRL countdown timer in AXI-lite clock cycles. Zero stops the timer.
pub const FRL_TMR: usize = FRL_BASE + 0x14;

/// FRL control bits.
pub mod frl_ctrl {
    /// Active-low reset. Cleared = block held in reset.
    pub const RSTN: u32 = 1 << 0;
    /// Interrupt enable.
    pub const IE: u32 = 1 << 1;
    /// Operation mode. Set = FRL, clear = TMDS.
    pub const OP_MODE: u32 = 1 << 2;
    /// Lane operation. Set = 4 lanes, clear = 3 lanes.
    pub const LN_OP: u32 = 1 << 3;
    /// Commit pending control changes.
    pub const EXEC: u32 = 1 << 4;
    /// Active mode. Set = full stream, clear = GAP characters only.
    pub const ACT: u32 = 1 << 7;
    /// Width mask of one lane's pattern field.
    pub const LTP_MASK: u32 = 0xF;
    /// Shift of lane 0's pattern field. Lane `n` sits at `LTP_SHIFT + 4 * n`.
    pub const LTP_SHIFT: u32 = 8;
    /// Video clock enable from an external source.
    pub const VCKE_EXT: u32 = 1 << 24;
}

/// FRL status bits.
pub mod frl_sta {
    /// Interrupt pending.
    pub const IRQ: u32 = 1 << 0;
    /// Timer expired.
    pub const TMR_EVT: u32 = 1 << 1;
    /// Timer reached zero.
    pub const TMR_ZERO: u32 = 1 << 2;
}

/// Bit position of lane `lane`'s pattern field in [`FRL_CTRL`].
pub const fn ltp_shift(lane: u8) -> u32 {
    frl_ctrl::LTP_SHIFT + 4 * lane as u32
}
