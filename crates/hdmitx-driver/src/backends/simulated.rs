// SPDX-License-Identifier: AGPL-3.0-only

//! Simulated TX core backend
//!
//! Implements [`RegisterAccess`] with a behavioural model of the TX core's
//! register space and a sink attached to its DDC bus. This enables:
//!
//! 1. **CI without hardware**: the DDC engine and the training state machine
//!    run against the same register protocol the silicon implements.
//!
//! 2. **Scripted sinks**: tests set SCDC registers between state executions
//!    to walk the training state machine through any path, and inject bus
//!    faults (no acknowledge, bus timeout, hung engine).
//!
//! 3. **Observation**: SCDC writes, FRL register commits, and the timer
//!    value and PIO interrupt state at each START condition are recorded.
//!
//! ## DDC model
//!
//! Command FIFO tokens are processed as soon as they are written. A write
//! segment (`WRITE`, length, bytes) directly after `START` carries the slave
//! address; later write segments go to the sink, the first byte after the
//! address setting the sink's register pointer. A read segment (`READ`,
//! length) fills the data FIFO from the sink. Completing a segment raises
//! `DONE` (or `TIMEOUT` under [`BusFault::Timeout`]) and sets `ACK` if the
//! sink acknowledged it.

use crate::registers::{BackendType, RegisterAccess};
use hdmitx_chip::regs::{
    self, aux_ctrl, ddc_ctrl, ddc_sta, ddc_token, frl_ctrl, pio_ctrl, pio_in,
};
use hdmitx_chip::scdc;
use std::collections::{HashMap, VecDeque};
use tracing::trace;

/// ID word reported by the simulated core.
pub const SIMULATED_CORE_ID: u32 = 0x4844_5458;

/// Bus fault injected on the simulated DDC bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusFault {
    /// Normal operation.
    #[default]
    None,
    /// Every segment ends with the engine's timeout flag.
    Timeout,
    /// The engine never reports completion.
    Hang,
}

/// Sink attached to the simulated DDC bus.
#[derive(Debug, Clone)]
pub struct SimulatedSink {
    registers: [u8; 256],
    address: u8,
    connected: bool,
    write_one_to_clear: bool,
    pointer: u8,
    writes: Vec<(u8, u8)>,
    rejected: Vec<u8>,
    hidden: Vec<u8>,
}

impl Default for SimulatedSink {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSink {
    /// HDMI 2.1 sink at the SCDC address with an empty register file.
    ///
    /// Update flags are write-one-to-clear, as on real sinks.
    pub fn new() -> Self {
        Self {
            registers: [0; 256],
            address: scdc::SLAVE_ADDRESS,
            connected: true,
            write_one_to_clear: true,
            pointer: 0,
            writes: Vec::new(),
            rejected: Vec::new(),
            hidden: Vec::new(),
        }
    }

    /// Treat the update flags register as plain storage.
    pub fn with_plain_update_flags(mut self) -> Self {
        self.write_one_to_clear = false;
        self
    }

    /// Answer on a different 7-bit address.
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Connect or disconnect the sink. A disconnected sink acknowledges nothing.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Refuse writes to one register: data bytes aimed at it are not
    /// acknowledged and leave it unchanged.
    pub fn reject_writes_to(&mut self, offset: u8) {
        self.rejected.push(offset);
    }

    /// Refuse to select one register, so reads and writes of it fail.
    pub fn hide_register(&mut self, offset: u8) {
        self.hidden.push(offset);
    }

    /// Whether the sink is on the bus.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Register contents.
    pub fn register(&self, offset: u8) -> u8 {
        self.registers[usize::from(offset)]
    }

    /// Set a register as the sink itself would.
    pub fn set_register(&mut self, offset: u8, value: u8) {
        self.registers[usize::from(offset)] = value;
    }

    /// Set bits in a register as the sink itself would.
    pub fn set_bits(&mut self, offset: u8, bits: u8) {
        self.registers[usize::from(offset)] |= bits;
    }

    /// Publish lane request codes (lanes 0..4).
    pub fn set_lane_requests(&mut self, codes: [u8; 4]) {
        self.set_register(scdc::LANE01_REQUEST, (codes[0] & 0xF) | (codes[1] << 4));
        self.set_register(scdc::LANE23_REQUEST, (codes[2] & 0xF) | (codes[3] << 4));
    }

    /// Every `(register, value)` the source wrote, oldest first.
    pub fn writes(&self) -> &[(u8, u8)] {
        &self.writes
    }

    /// Values the source wrote to one register, oldest first.
    pub fn writes_to(&self, offset: u8) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(reg, _)| *reg == offset)
            .map(|(_, value)| *value)
            .collect()
    }

    /// Forget recorded writes.
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    fn acknowledges(&self, address: u8) -> bool {
        self.connected && address == self.address
    }

    fn set_pointer(&mut self, offset: u8) {
        self.pointer = offset;
    }

    fn write_byte(&mut self, value: u8) -> bool {
        let offset = self.pointer;
        self.pointer = offset.wrapping_add(1);
        if self.rejected.contains(&offset) {
            return false;
        }
        self.writes.push((offset, value));
        let slot = &mut self.registers[usize::from(offset)];
        if self.write_one_to_clear && offset == scdc::UPDATE_FLAGS {
            *slot &= !value;
        } else {
            *slot = value;
        }
        true
    }

    fn read_byte(&mut self) -> u8 {
        let value = self.registers[usize::from(self.pointer)];
        self.pointer = self.pointer.wrapping_add(1);
        value
    }
}

/// Command FIFO parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmdPhase {
    Idle,
    WriteLenHi,
    WriteLenLo { hi: u8 },
    WriteData { remaining: u16 },
    ReadLenHi,
    ReadLenLo { hi: u8 },
}

/// Addressing state of the simulated bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusState {
    /// No transfer, or the address was not acknowledged.
    Idle,
    /// START seen, next write byte is the address.
    AwaitAddress,
    /// Addressed for write; the next byte sets the sink pointer.
    WriteOffset,
    /// Addressed for write; bytes go to the register file.
    WriteData,
    /// Addressed for read.
    Read,
}

/// Simulated TX core with a sink on its DDC bus.
#[derive(Debug)]
pub struct SimulatedTx {
    sink: SimulatedSink,
    fault: BusFault,

    pio_ctrl: u32,
    pio_out: u32,
    pio_in: u32,

    ddc_ctrl: u32,
    ddc_done: bool,
    ddc_timeout: bool,
    ddc_ack: bool,
    phase: CmdPhase,
    bus: BusState,
    segment_acked: bool,
    data_fifo: VecDeque<u8>,

    aux_ctrl: u32,

    frl_ctrl: u32,
    frl_timer: u32,
    frl_executes: usize,

    transaction_timers: Vec<u32>,
    transaction_pio_ie: Vec<bool>,
    other: HashMap<usize, u32>,
}

impl Default for SimulatedTx {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTx {
    /// Core in its reset state with a connected HDMI 2.1 sink.
    pub fn new() -> Self {
        Self::with_sink(SimulatedSink::new())
    }

    /// Core with a specific sink.
    pub fn with_sink(sink: SimulatedSink) -> Self {
        Self {
            sink,
            fault: BusFault::None,
            pio_ctrl: pio_ctrl::RUN,
            pio_out: 0,
            pio_in: pio_in::LNK_RDY | pio_in::HPD,
            ddc_ctrl: 0,
            ddc_done: false,
            ddc_timeout: false,
            ddc_ack: false,
            phase: CmdPhase::Idle,
            bus: BusState::Idle,
            segment_acked: false,
            data_fifo: VecDeque::new(),
            aux_ctrl: 0,
            frl_ctrl: 0,
            frl_timer: 0,
            frl_executes: 0,
            transaction_timers: Vec::new(),
            transaction_pio_ie: Vec::new(),
            other: HashMap::new(),
        }
    }

    /// Attached sink.
    pub fn sink(&self) -> &SimulatedSink {
        &self.sink
    }

    /// Attached sink, mutable.
    pub fn sink_mut(&mut self) -> &mut SimulatedSink {
        &mut self.sink
    }

    /// Inject a bus fault.
    pub fn set_bus_fault(&mut self, fault: BusFault) {
        self.fault = fault;
    }

    /// Drive the transceiver link-ready input.
    pub fn set_link_ready(&mut self, ready: bool) {
        if ready {
            self.pio_in |= pio_in::LNK_RDY;
        } else {
            self.pio_in &= !pio_in::LNK_RDY;
        }
    }

    /// Raw FRL control word.
    pub fn frl_ctrl(&self) -> u32 {
        self.frl_ctrl
    }

    /// Raw AUX control word.
    pub fn aux_ctrl(&self) -> u32 {
        self.aux_ctrl
    }

    /// Raw PIO output word.
    pub fn pio_out(&self) -> u32 {
        self.pio_out
    }

    /// Countdown timer register.
    pub fn frl_timer(&self) -> u32 {
        self.frl_timer
    }

    /// Number of FRL register commits.
    pub fn frl_executes(&self) -> usize {
        self.frl_executes
    }

    /// Timer register value at each START condition, oldest first.
    pub fn transaction_timers(&self) -> &[u32] {
        &self.transaction_timers
    }

    /// PIO interrupt enable at each START condition, oldest first.
    pub fn transaction_pio_ie(&self) -> &[bool] {
        &self.transaction_pio_ie
    }

    /// Whether the DDC engine is running.
    pub fn ddc_running(&self) -> bool {
        self.ddc_ctrl & ddc_ctrl::RUN != 0
    }

    fn ddc_status(&self) -> u32 {
        let mut sta = 0;
        if self.ddc_done {
            sta |= ddc_sta::DONE;
        }
        if self.ddc_timeout {
            sta |= ddc_sta::TIMEOUT;
        }
        if self.ddc_ack {
            sta |= ddc_sta::ACK;
        }
        if self.data_fifo.is_empty() {
            sta |= ddc_sta::DAT_EMPTY;
        }
        sta
    }

    fn complete_segment(&mut self, acked: bool) {
        match self.fault {
            BusFault::None => {
                self.ddc_done = true;
                self.ddc_ack = acked;
            }
            BusFault::Timeout => {
                self.ddc_timeout = true;
                self.ddc_ack = false;
            }
            BusFault::Hang => {}
        }
    }

    fn command(&mut self, word: u32) {
        if !self.ddc_running() {
            trace!("DDC command {word:#x} dropped, engine stopped");
            return;
        }
        match word {
            ddc_token::START => {
                self.transaction_timers.push(self.frl_timer);
                self.transaction_pio_ie.push(self.pio_ctrl & pio_ctrl::IE != 0);
                self.bus = BusState::AwaitAddress;
                self.phase = CmdPhase::Idle;
            }
            ddc_token::STOP => {
                self.bus = BusState::Idle;
                self.phase = CmdPhase::Idle;
                self.complete_segment(true);
            }
            ddc_token::WRITE => self.phase = CmdPhase::WriteLenHi,
            ddc_token::READ => self.phase = CmdPhase::ReadLenHi,
            byte => {
                #[allow(clippy::cast_possible_truncation)]
                let byte = (byte & 0xFF) as u8;
                self.data_word(byte);
            }
        }
    }

    fn data_word(&mut self, byte: u8) {
        match self.phase {
            CmdPhase::Idle => trace!("DDC byte {byte:#04x} outside a segment"),
            CmdPhase::WriteLenHi => self.phase = CmdPhase::WriteLenLo { hi: byte },
            CmdPhase::WriteLenLo { hi } => {
                let len = u16::from_be_bytes([hi, byte]);
                self.segment_acked = true;
                if len == 0 {
                    self.phase = CmdPhase::Idle;
                    self.complete_segment(true);
                } else {
                    self.phase = CmdPhase::WriteData { remaining: len };
                }
            }
            CmdPhase::WriteData { remaining } => {
                let acked = self.write_bus_byte(byte);
                self.segment_acked &= acked;
                if remaining == 1 {
                    self.phase = CmdPhase::Idle;
                    let acked = self.segment_acked;
                    self.complete_segment(acked);
                } else {
                    self.phase = CmdPhase::WriteData { remaining: remaining - 1 };
                }
            }
            CmdPhase::ReadLenHi => self.phase = CmdPhase::ReadLenLo { hi: byte },
            CmdPhase::ReadLenLo { hi } => {
                let len = u16::from_be_bytes([hi, byte]);
                let addressed = self.bus == BusState::Read;
                for _ in 0..len {
                    // An unaddressed bus floats high.
                    let value = if addressed { self.sink.read_byte() } else { 0xFF };
                    self.data_fifo.push_back(value);
                }
                self.phase = CmdPhase::Idle;
                self.complete_segment(addressed);
            }
        }
    }

    fn write_bus_byte(&mut self, byte: u8) -> bool {
        match self.bus {
            BusState::AwaitAddress => {
                let address = byte >> 1;
                let read = byte & 1 != 0;
                if self.sink.acknowledges(address) {
                    self.bus = if read { BusState::Read } else { BusState::WriteOffset };
                    true
                } else {
                    self.bus = BusState::Idle;
                    false
                }
            }
            BusState::WriteOffset => {
                if self.sink.hidden.contains(&byte) {
                    self.bus = BusState::Idle;
                    return false;
                }
                self.sink.set_pointer(byte);
                self.bus = BusState::WriteData;
                true
            }
            BusState::WriteData => self.sink.write_byte(byte),
            BusState::Idle | BusState::Read => false,
        }
    }

    fn set_ddc_ctrl(&mut self, value: u32) {
        let was_running = self.ddc_running();
        self.ddc_ctrl = value;
        if was_running && !self.ddc_running() {
            self.phase = CmdPhase::Idle;
            self.bus = BusState::Idle;
            self.data_fifo.clear();
        }
    }

    fn set_frl_ctrl(&mut self, value: u32) {
        if value & frl_ctrl::EXEC != 0 {
            self.frl_executes += 1;
        }
        // Commit strobe self-clears.
        self.frl_ctrl = value & !frl_ctrl::EXEC;
    }
}

impl RegisterAccess for SimulatedTx {
    fn read32(&mut self, offset: usize) -> u32 {
        match offset {
            regs::VER_ID => SIMULATED_CORE_ID,
            regs::PIO_CTRL => self.pio_ctrl,
            regs::PIO_OUT => self.pio_out,
            regs::PIO_IN => self.pio_in,
            regs::DDC_CTRL => self.ddc_ctrl,
            regs::DDC_STA => self.ddc_status(),
            regs::DDC_DAT => self.data_fifo.pop_front().map_or(0, u32::from),
            regs::AUX_CTRL => self.aux_ctrl,
            regs::FRL_CTRL => self.frl_ctrl,
            regs::FRL_TMR => self.frl_timer,
            _ => self.other.get(&offset).copied().unwrap_or(0),
        }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        match offset {
            regs::PIO_CTRL => self.pio_ctrl = value,
            regs::PIO_CTRL_SET => self.pio_ctrl |= value,
            regs::PIO_CTRL_CLR => self.pio_ctrl &= !value,
            regs::PIO_OUT => self.pio_out = value,
            regs::PIO_OUT_SET => self.pio_out |= value,
            regs::PIO_OUT_CLR => self.pio_out &= !value,
            regs::DDC_CTRL => self.set_ddc_ctrl(value),
            regs::DDC_CTRL_SET => self.set_ddc_ctrl(self.ddc_ctrl | value),
            regs::DDC_CTRL_CLR => self.set_ddc_ctrl(self.ddc_ctrl & !value),
            regs::DDC_STA => {
                if value & ddc_sta::DONE != 0 {
                    self.ddc_done = false;
                }
                if value & ddc_sta::TIMEOUT != 0 {
                    self.ddc_timeout = false;
                }
            }
            regs::DDC_CMD => self.command(value),
            regs::AUX_CTRL => self.aux_ctrl = value,
            regs::AUX_CTRL_SET => self.aux_ctrl |= value,
            regs::AUX_CTRL_CLR => self.aux_ctrl &= !value,
            regs::FRL_CTRL => self.set_frl_ctrl(value),
            regs::FRL_CTRL_SET => self.set_frl_ctrl(self.frl_ctrl | value),
            regs::FRL_CTRL_CLR => self.frl_ctrl &= !value,
            regs::FRL_TMR => self.frl_timer = value,
            _ => {
                self.other.insert(offset, value);
            }
        }
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Simulated
    }
}
