// SPDX-License-Identifier: AGPL-3.0-only

//! Status and Control Data Channel (SCDC) register set of an HDMI 2.x sink.
//!
//! The sink exposes a 256-byte register file on the DDC bus at
//! [`SLAVE_ADDRESS`]. Register addresses and flag masks follow HDMI 2.1.

/// 7-bit DDC address of the SCDC register file.
pub const SLAVE_ADDRESS: u8 = 0x54;

// ── Register addresses ───────────────────────────────────────────────────────

/// Sink version.
pub const SINK_VERSION: u8 = 0x01;
/// Source version.
pub const SOURCE_VERSION: u8 = 0x02;
/// Update flags. The source clears a flag by writing one to it.
pub const UPDATE_FLAGS: u8 = 0x10;
/// TMDS configuration (scrambling enable, clock ratio).
pub const TMDS_CONFIG: u8 = 0x20;
/// Scrambler status.
pub const SCRAMBLER_STATUS: u8 = 0x21;
/// Sink configuration 0.
pub const CONFIG_0: u8 = 0x30;
/// Sink configuration 1 (FRL rate, FFE levels).
pub const CONFIG_1: u8 = 0x31;
/// Source test configuration.
pub const SOURCE_TEST_CONFIG: u8 = 0x35;
/// Status flags.
pub const STATUS_FLAGS: u8 = 0x40;
/// Lane 0/1 link training requests.
pub const LANE01_REQUEST: u8 = 0x41;
/// Lane 2/3 link training requests.
pub const LANE23_REQUEST: u8 = 0x42;
/// Character error detection counters.
pub const CED: u8 = 0x50;

/// CED counter bytes in TMDS mode (three channels, valid flags, checksum).
pub const CED_LEN_TMDS: usize = 7;
/// CED counter bytes in FRL mode (four lanes, valid flags, checksum).
pub const CED_LEN_FRL: usize = 11;

/// [`UPDATE_FLAGS`] bits.
pub mod update_flags {
    /// Status flags changed.
    pub const STATUS_UPDATE: u8 = 0x01;
    /// Character error counters changed.
    pub const CED_UPDATE: u8 = 0x02;
    /// Source test configuration changed.
    pub const SOURCE_TEST_UPDATE: u8 = 0x08;
    /// Sink is ready for the FRL stream.
    pub const FRL_START: u8 = 0x10;
    /// Sink published new link training requests.
    pub const FLT_UPDATE: u8 = 0x20;
}

/// [`TMDS_CONFIG`] bits.
pub mod tmds_config {
    /// Scrambling enable.
    pub const SCRAMBLING_ENABLE: u8 = 0x01;
    /// TMDS bit clock ratio 1/40.
    pub const CLOCK_RATIO_40: u8 = 0x02;
}

/// [`SOURCE_TEST_CONFIG`] bits.
pub mod source_test_config {
    /// Sink asks the source to disable training timeouts.
    pub const FLT_NO_TIMEOUT: u8 = 0x20;
}

/// [`STATUS_FLAGS`] bits.
pub mod status_flags {
    /// Sink is ready for link training.
    pub const FLT_READY: u8 = 0x40;
}

/// [`CONFIG_1`] layout.
pub mod config_1 {
    /// FRL rate field mask.
    pub const FRL_RATE_MASK: u8 = 0x0F;
    /// FFE levels field mask (after shift).
    pub const FFE_LEVELS_MASK: u8 = 0x0F;
    /// FFE levels field shift.
    pub const FFE_LEVELS_SHIFT: u8 = 4;

    /// Encode a rate index and FFE level count into one config byte.
    pub const fn encode(frl_rate: u8, ffe_levels: u8) -> u8 {
        (frl_rate & FRL_RATE_MASK) | ((ffe_levels & FFE_LEVELS_MASK) << FFE_LEVELS_SHIFT)
    }
}

// ── Field table ──────────────────────────────────────────────────────────────

/// Logical SCDC fields the training state machine writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScdcField {
    /// Source version.
    SourceVersion,
    /// Sink configuration 0.
    SinkConfig0,
    /// Sink configuration 1 (FRL rate and FFE levels).
    SinkConfig1,
    /// Source test update flag.
    SourceTestUpdate,
    /// CED update flag.
    CedUpdate,
    /// FRL start flag.
    FrlStart,
    /// FLT update flag.
    FltUpdate,
    /// FLT no-retrain flag in sink configuration 0.
    FltNoRetrain,
}

/// Location of a field inside the SCDC register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Register address.
    pub offset: u8,
    /// Field mask, applied before shifting. `0xFF` means a whole-byte write.
    pub mask: u8,
    /// Field position.
    pub shift: u8,
}

impl FieldDescriptor {
    /// Whether writing this field must preserve the register's other bits.
    pub const fn needs_read_modify_write(&self) -> bool {
        self.mask != 0xFF
    }

    /// Merge `value` into `current` at this field's position.
    pub const fn merge(&self, current: u8, value: u8) -> u8 {
        let cleared = current & !(self.mask << self.shift);
        cleared | ((value & self.mask) << self.shift)
    }

    /// Extract this field from a register byte.
    pub const fn extract(&self, register: u8) -> u8 {
        (register >> self.shift) & self.mask
    }
}

impl ScdcField {
    /// All fields, in table order.
    pub const ALL: [Self; 8] = [
        Self::SourceVersion,
        Self::SinkConfig0,
        Self::SinkConfig1,
        Self::SourceTestUpdate,
        Self::CedUpdate,
        Self::FrlStart,
        Self::FltUpdate,
        Self::FltNoRetrain,
    ];

    /// Register location of this field.
    pub const fn descriptor(self) -> FieldDescriptor {
        let (offset, mask, shift) = match self {
            Self::SourceVersion => (SOURCE_VERSION, 0xFF, 0),
            Self::SinkConfig0 => (CONFIG_0, 0xFF, 0),
            Self::SinkConfig1 => (CONFIG_1, 0xFF, 0),
            Self::SourceTestUpdate => (UPDATE_FLAGS, 0x01, 3),
            Self::CedUpdate => (UPDATE_FLAGS, 0xFF, 1),
            Self::FrlStart => (UPDATE_FLAGS, 0xFF, 4),
            Self::FltUpdate => (UPDATE_FLAGS, 0xFF, 5),
            Self::FltNoRetrain => (CONFIG_0, 0x01, 1),
        };
        FieldDescriptor { offset, mask, shift }
    }
}
