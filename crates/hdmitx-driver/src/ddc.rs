// SPDX-License-Identifier: AGPL-3.0-only

//! DDC transaction engine
//!
//! Drives the TX core's two-FIFO DDC peripheral: command tokens and bytes go
//! into the command FIFO, read data comes back through the data FIFO, and
//! segment completion is signalled through the status register.
//!
//! ```text
//! write:  START  WRITE 0 1 addr|W  ─wait/ack─  WRITE len_hi len_lo bytes..  ─wait/ack─  [STOP ─wait─]
//! read:   START  WRITE 0 1 addr|R  ─wait/ack─  READ  len_hi len_lo  <data FIFO>  ─wait─  [STOP ─wait─]
//! ```
//!
//! Every poll is bounded by [`DdcConfig::max_polls`]. While a transaction is
//! in flight the PIO interrupt is masked and the FRL countdown timer is
//! stopped; both are restored when the transaction ends, whatever the outcome.

use crate::error::TransactionError;
use crate::registers::RegisterAccess;
use crate::tx::TxCore;
use hdmitx_chip::regs::{self, ddc_ctrl, ddc_sta, ddc_token};
use hdmitx_chip::scdc::{self, ScdcField};
use std::ops::{Deref, DerefMut};
use tracing::{debug, trace};

/// Result type for DDC transactions
pub type TransactionResult<T> = std::result::Result<T, TransactionError>;

/// DDC engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdcConfig {
    /// Upper bound on iterations of every status poll.
    pub max_polls: u32,
}

impl Default for DdcConfig {
    fn default() -> Self {
        Self { max_polls: 100_000 }
    }
}

impl DdcConfig {
    /// Create a configuration with the default poll bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the poll bound.
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls.max(1);
        self
    }
}

/// Holds the engine for one transaction and undoes its side effects on drop.
struct TransactionGuard<'a, R: RegisterAccess> {
    core: &'a mut TxCore<R>,
    saved_timer: u32,
    pio_ie: bool,
}

impl<'a, R: RegisterAccess> TransactionGuard<'a, R> {
    fn begin(core: &'a mut TxCore<R>) -> Self {
        let pio_ie = core.pio_intr_enabled();
        core.pio_intr_disable();

        let saved_timer = core.frl_timer();
        if saved_timer != 0 {
            core.set_frl_timer_cycles(0);
        }

        core.ddc_enable();
        core.ddc_intr_disable();
        Self {
            core,
            saved_timer,
            pio_ie,
        }
    }
}

impl<R: RegisterAccess> Deref for TransactionGuard<'_, R> {
    type Target = TxCore<R>;

    fn deref(&self) -> &Self::Target {
        self.core
    }
}

impl<R: RegisterAccess> DerefMut for TransactionGuard<'_, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.core
    }
}

impl<R: RegisterAccess> Drop for TransactionGuard<'_, R> {
    fn drop(&mut self) {
        self.core.ddc_disable();
        if self.pio_ie {
            self.core.pio_intr_enable();
        }
        if self.saved_timer != 0 {
            self.core.set_frl_timer_cycles(self.saved_timer);
        }
    }
}

/// Transaction engine bound to one TX core.
#[derive(Debug)]
pub struct Ddc<'a, R> {
    core: &'a mut TxCore<R>,
    config: DdcConfig,
}

impl<'a, R: RegisterAccess> Ddc<'a, R> {
    /// Borrow the core's DDC peripheral.
    pub fn new(core: &'a mut TxCore<R>, config: DdcConfig) -> Self {
        Self { core, config }
    }

    /// Write `data` to `slave` (7-bit address), optionally ending with STOP.
    ///
    /// # Errors
    ///
    /// [`TransactionError::NoAck`] if the address or data phase is not
    /// acknowledged, [`TransactionError::Timeout`] on a bus timeout or an
    /// exhausted poll.
    pub fn write(&mut self, slave: u8, data: &[u8], stop: bool) -> TransactionResult<()> {
        let len = segment_len(data.len())?;
        let polls = self.config.max_polls;
        let mut tx = TransactionGuard::begin(self.core);

        address(&mut tx, polls, (slave << 1) & 0xFE).inspect_err(|e| {
            debug!("DDC write to {slave:#04x}: address phase {e}");
        })?;

        command(&mut tx, polls, ddc_token::WRITE)?;
        command(&mut tx, polls, u32::from(len >> 8))?;
        command(&mut tx, polls, u32::from(len & 0xFF))?;
        for &byte in data {
            command(&mut tx, polls, u32::from(byte))?;
        }
        wait_done(&mut tx, polls)?;
        if !acked(&mut tx) {
            debug!("DDC write to {slave:#04x}: data phase not acknowledged");
            return Err(TransactionError::NoAck);
        }

        if stop {
            command(&mut tx, polls, ddc_token::STOP)?;
            wait_done(&mut tx, polls)?;
        }
        trace!("DDC write {slave:#04x} {data:02x?}");
        Ok(())
    }

    /// Read `len` bytes from `slave` (7-bit address), optionally ending with STOP.
    ///
    /// # Errors
    ///
    /// [`TransactionError::NoAck`] if the address phase is not acknowledged,
    /// [`TransactionError::Timeout`] on a bus timeout or an exhausted poll.
    pub fn read(&mut self, slave: u8, len: usize, stop: bool) -> TransactionResult<Vec<u8>> {
        let seg = segment_len(len)?;
        let polls = self.config.max_polls;
        let mut tx = TransactionGuard::begin(self.core);

        address(&mut tx, polls, (slave << 1) | 0x01).inspect_err(|e| {
            debug!("DDC read from {slave:#04x}: address phase {e}");
        })?;

        command(&mut tx, polls, ddc_token::READ)?;
        command(&mut tx, polls, u32::from(seg >> 8))?;
        command(&mut tx, polls, u32::from(seg & 0xFF))?;

        let mut data = Vec::with_capacity(len);
        for _ in 0..len {
            data.push(read_data(&mut tx, polls)?);
        }
        wait_done(&mut tx, polls)?;

        if stop {
            command(&mut tx, polls, ddc_token::STOP)?;
            wait_done(&mut tx, polls)?;
        }
        trace!("DDC read {slave:#04x} {data:02x?}");
        Ok(data)
    }

    /// Read `len` bytes starting at register `register` of `slave`.
    ///
    /// # Errors
    ///
    /// See [`Ddc::write`] and [`Ddc::read`].
    pub fn read_register(&mut self, slave: u8, len: usize, register: u8) -> TransactionResult<Vec<u8>> {
        self.write(slave, &[register], false)?;
        self.read(slave, len, true)
    }

    /// Read one SCDC register.
    ///
    /// # Errors
    ///
    /// See [`Ddc::read_register`].
    pub fn read_scdc(&mut self, register: u8) -> TransactionResult<u8> {
        let data = self.read_register(scdc::SLAVE_ADDRESS, 1, register)?;
        data.first().copied().ok_or(TransactionError::Timeout)
    }

    /// Write one SCDC register.
    ///
    /// # Errors
    ///
    /// See [`Ddc::write`].
    pub fn write_scdc(&mut self, register: u8, value: u8) -> TransactionResult<()> {
        self.write(scdc::SLAVE_ADDRESS, &[register, value], true)
    }

    /// Write an SCDC field, preserving the register's other bits when the
    /// field is narrower than a byte.
    ///
    /// # Errors
    ///
    /// See [`Ddc::write`] and [`Ddc::read`].
    pub fn write_field(&mut self, field: ScdcField, value: u8) -> TransactionResult<()> {
        let desc = field.descriptor();
        let current = if desc.needs_read_modify_write() {
            self.read_scdc(desc.offset)?
        } else {
            0
        };
        let merged = desc.merge(current, value);
        trace!("SCDC {field:?} <- {value:#x} (reg {:#04x} = {merged:#04x})", desc.offset);
        self.write_scdc(desc.offset, merged)
    }
}

impl<R: RegisterAccess> TxCore<R> {
    /// Borrow the DDC transaction engine.
    pub fn ddc(&mut self, config: DdcConfig) -> Ddc<'_, R> {
        Ddc::new(self, config)
    }
}

fn segment_len(len: usize) -> TransactionResult<u16> {
    u16::try_from(len).map_err(|_| TransactionError::SegmentTooLong { len })
}

/// START plus the one-byte address segment.
fn address<R: RegisterAccess>(core: &mut TxCore<R>, polls: u32, addr_byte: u8) -> TransactionResult<()> {
    command(core, polls, ddc_token::START)?;
    command(core, polls, ddc_token::WRITE)?;
    command(core, polls, 0)?;
    command(core, polls, 1)?;
    command(core, polls, u32::from(addr_byte))?;
    wait_done(core, polls)?;
    if acked(core) {
        Ok(())
    } else {
        Err(TransactionError::NoAck)
    }
}

fn running<R: RegisterAccess>(core: &mut TxCore<R>) -> bool {
    core.read(regs::DDC_CTRL) & ddc_ctrl::RUN != 0
}

fn acked<R: RegisterAccess>(core: &mut TxCore<R>) -> bool {
    core.read(regs::DDC_STA) & ddc_sta::ACK != 0
}

/// Push one word into the command FIFO once it has room.
fn command<R: RegisterAccess>(core: &mut TxCore<R>, polls: u32, word: u32) -> TransactionResult<()> {
    for _ in 0..polls {
        if core.read(regs::DDC_STA) & ddc_sta::CMD_FULL == 0 {
            core.write(regs::DDC_CMD, word);
            return Ok(());
        }
        if !running(core) {
            return Err(TransactionError::Timeout);
        }
    }
    Err(TransactionError::Timeout)
}

/// Wait for the current segment to finish; clears the flag that ended it.
fn wait_done<R: RegisterAccess>(core: &mut TxCore<R>, polls: u32) -> TransactionResult<()> {
    for _ in 0..polls {
        if !running(core) {
            return Err(TransactionError::Timeout);
        }
        let sta = core.read(regs::DDC_STA);
        if sta & ddc_sta::DONE != 0 {
            core.write(regs::DDC_STA, ddc_sta::DONE);
            return Ok(());
        }
        if sta & ddc_sta::TIMEOUT != 0 {
            core.write(regs::DDC_STA, ddc_sta::TIMEOUT);
            return Err(TransactionError::Timeout);
        }
    }
    Err(TransactionError::Timeout)
}

/// Pop one byte from the data FIFO once it is available.
fn read_data<R: RegisterAccess>(core: &mut TxCore<R>, polls: u32) -> TransactionResult<u8> {
    for _ in 0..polls {
        if core.read(regs::DDC_STA) & ddc_sta::DAT_EMPTY == 0 {
            let [byte, ..] = core.read(regs::DDC_DAT).to_le_bytes();
            return Ok(byte);
        }
        if !running(core) {
            return Err(TransactionError::Timeout);
        }
    }
    Err(TransactionError::Timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{BusFault, SimulatedSink, SimulatedTx};
    use crate::tx::TxConfig;

    fn core_with(sink: SimulatedSink) -> TxCore<SimulatedTx> {
        TxCore::new(SimulatedTx::with_sink(sink), TxConfig::default())
    }

    fn config() -> DdcConfig {
        DdcConfig::new().with_max_polls(64)
    }

    #[test]
    fn register_read_returns_sink_contents() {
        let mut sink = SimulatedSink::new();
        sink.set_register(scdc::LANE01_REQUEST, 0x21);
        sink.set_register(scdc::LANE23_REQUEST, 0x43);
        let mut core = core_with(sink);

        let data = core
            .ddc(config())
            .read_register(scdc::SLAVE_ADDRESS, 2, scdc::LANE01_REQUEST)
            .unwrap();
        assert_eq!(data, vec![0x21, 0x43]);
        assert!(!core.registers().ddc_running());
    }

    #[test]
    fn write_lands_in_sink() {
        let mut core = core_with(SimulatedSink::new());
        core.ddc(config()).write_scdc(scdc::SOURCE_VERSION, 1).unwrap();
        assert_eq!(core.registers().sink().register(scdc::SOURCE_VERSION), 1);
        assert_eq!(core.registers().sink().writes(), &[(scdc::SOURCE_VERSION, 1)]);
    }

    #[test]
    fn absent_sink_is_no_ack() {
        let mut sink = SimulatedSink::new();
        sink.set_connected(false);
        let mut core = core_with(sink);
        assert_eq!(
            core.ddc(config()).read_scdc(scdc::SINK_VERSION),
            Err(TransactionError::NoAck)
        );
    }

    #[test]
    fn wrong_address_is_no_ack() {
        let mut core = core_with(SimulatedSink::new().with_address(0x50));
        assert_eq!(
            core.ddc(config()).write_scdc(scdc::SOURCE_VERSION, 1),
            Err(TransactionError::NoAck)
        );
    }

    #[test]
    fn bus_timeout_is_reported() {
        let mut core = core_with(SimulatedSink::new());
        core.registers_mut().set_bus_fault(BusFault::Timeout);
        assert_eq!(
            core.ddc(config()).read_scdc(scdc::SINK_VERSION),
            Err(TransactionError::Timeout)
        );
    }

    #[test]
    fn hung_engine_is_bounded() {
        let mut core = core_with(SimulatedSink::new());
        core.registers_mut().set_bus_fault(BusFault::Hang);
        assert_eq!(
            core.ddc(config()).write_scdc(scdc::SOURCE_VERSION, 1),
            Err(TransactionError::Timeout)
        );
    }

    #[test]
    fn timer_and_pio_interrupt_are_restored() {
        let mut core = core_with(SimulatedSink::new());
        core.pio_intr_enable();
        core.set_frl_timer_ms(5);
        let armed = core.frl_timer();

        core.ddc(config()).read_scdc(scdc::SINK_VERSION).unwrap();

        assert_eq!(core.frl_timer(), armed);
        assert!(core.pio_intr_enabled());
        let sim = core.registers();
        assert!(sim.transaction_timers().iter().all(|&t| t == 0));
        assert!(sim.transaction_pio_ie().iter().all(|&ie| !ie));
    }

    #[test]
    fn timer_is_restored_on_failure() {
        let mut sink = SimulatedSink::new();
        sink.set_connected(false);
        let mut core = core_with(sink);
        core.set_frl_timer_ms(2);
        let armed = core.frl_timer();

        assert!(core.ddc(config()).write_scdc(scdc::SOURCE_VERSION, 1).is_err());
        assert_eq!(core.frl_timer(), armed);
        assert!(!core.pio_intr_enabled());
    }

    #[test]
    fn write_field_preserves_neighbouring_bits() {
        let mut sink = SimulatedSink::new();
        sink.set_register(scdc::CONFIG_0, 0xF1);
        let mut core = core_with(sink);

        core.ddc(config()).write_field(ScdcField::FltNoRetrain, 1).unwrap();
        assert_eq!(core.registers().sink().register(scdc::CONFIG_0), 0xF3);
        core.ddc(config()).write_field(ScdcField::FltNoRetrain, 0).unwrap();
        assert_eq!(core.registers().sink().register(scdc::CONFIG_0), 0xF1);
    }

    #[test]
    fn whole_byte_field_skips_the_read() {
        let mut core = core_with(SimulatedSink::new());
        core.ddc(config()).write_field(ScdcField::SinkConfig1, 0x36).unwrap();
        let sim = core.registers();
        assert_eq!(sim.sink().register(scdc::CONFIG_1), 0x36);
        // One START for the single write.
        assert_eq!(sim.transaction_timers().len(), 1);
    }

    #[test]
    fn oversize_segment_is_rejected() {
        let mut core = core_with(SimulatedSink::new());
        let big = vec![0u8; 70_000];
        assert_eq!(
            core.ddc(config()).write(scdc::SLAVE_ADDRESS, &big, true),
            Err(TransactionError::SegmentTooLong { len: 70_000 })
        );
    }
}
