// SPDX-License-Identifier: AGPL-3.0-only

//! Link training patterns (LTP) and the request codes a sink publishes in
//! the lane request registers during LTS:3.

/// Number of FRL lanes the core drives.
pub const LANE_COUNT: usize = 4;

/// Pattern transmitted on one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum LinkTrainingPattern {
    /// No pattern.
    #[default]
    None = 0,
    /// All ones.
    AllOnes = 1,
    /// All zeroes.
    AllZeroes = 2,
    /// Nyquist clock.
    NyquistClock = 3,
    /// TX DDE compliance test pattern.
    ComplianceTest = 4,
    /// LFSR 0.
    Lfsr0 = 5,
    /// LFSR 1.
    Lfsr1 = 6,
    /// LFSR 2.
    Lfsr2 = 7,
    /// LFSR 3.
    Lfsr3 = 8,
}

impl LinkTrainingPattern {
    /// Pattern for a 4-bit code, if the code names one.
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::None,
            1 => Self::AllOnes,
            2 => Self::AllZeroes,
            3 => Self::NyquistClock,
            4 => Self::ComplianceTest,
            5 => Self::Lfsr0,
            6 => Self::Lfsr1,
            7 => Self::Lfsr2,
            8 => Self::Lfsr3,
            _ => return None,
        })
    }

    /// 4-bit register code.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Lane request codes.
pub mod request {
    /// Lane passed training.
    pub const PASS: u8 = 0x0;
    /// Sink asks for an FFE level change.
    pub const FFE_CHANGE: u8 = 0xE;
    /// Sink asks for a lower rate.
    pub const RATE_DROP: u8 = 0xF;
}

/// Split the two lane request bytes into per-lane codes.
///
/// Lane 0 is the low nibble of the first byte, lane 1 its high nibble,
/// lanes 2 and 3 likewise in the second byte.
pub const fn decode_lane_requests(ln01: u8, ln23: u8) -> [u8; LANE_COUNT] {
    [ln01 & 0x0F, ln01 >> 4, ln23 & 0x0F, ln23 >> 4]
}
