// SPDX-License-Identifier: AGPL-3.0-only

//! FRL rate table.
//!
//! ```text
//! index  lanes  Gbps/lane
//!   0      3        0      not supported (TMDS)
//!   1      3        3
//!   2      3        6
//!   3      4        6
//!   4      4        8
//!   5      4       10
//!   6      4       12
//! ```

/// One row of the rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateTableEntry {
    /// Active lanes, 3 or 4.
    pub lanes: u8,
    /// Per-lane line rate in Gbps. Zero for index 0.
    pub line_rate_gbps: u8,
}

/// Rate index meaning "FRL not supported".
pub const FRL_RATE_NONE: u8 = 0;

/// Highest defined rate index.
pub const MAX_FRL_RATE: u8 = 6;

/// Rate table, indexed by FRL rate.
pub const RATE_TABLE: [RateTableEntry; MAX_FRL_RATE as usize + 1] = [
    RateTableEntry { lanes: 3, line_rate_gbps: 0 },
    RateTableEntry { lanes: 3, line_rate_gbps: 3 },
    RateTableEntry { lanes: 3, line_rate_gbps: 6 },
    RateTableEntry { lanes: 4, line_rate_gbps: 6 },
    RateTableEntry { lanes: 4, line_rate_gbps: 8 },
    RateTableEntry { lanes: 4, line_rate_gbps: 10 },
    RateTableEntry { lanes: 4, line_rate_gbps: 12 },
];

/// Look up a rate index. `None` above [`MAX_FRL_RATE`].
pub fn entry(frl_rate: u8) -> Option<RateTableEntry> {
    RATE_TABLE.get(usize::from(frl_rate)).copied()
}

/// Aggregate link bandwidth in Gbps for a rate index.
pub fn link_bandwidth_gbps(frl_rate: u8) -> u32 {
    entry(frl_rate).map_or(0, |e| u32::from(e.lanes) * u32::from(e.line_rate_gbps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_are_monotonic() {
        for pair in RATE_TABLE.windows(2) {
            let lower = u32::from(pair[0].lanes) * u32::from(pair[0].line_rate_gbps);
            let upper = u32::from(pair[1].lanes) * u32::from(pair[1].line_rate_gbps);
            assert!(upper > lower);
        }
    }

    #[test]
    fn low_rates_use_three_lanes() {
        assert_eq!(RATE_TABLE[1], RateTableEntry { lanes: 3, line_rate_gbps: 3 });
        assert_eq!(RATE_TABLE[2], RateTableEntry { lanes: 3, line_rate_gbps: 6 });
        assert_eq!(RATE_TABLE[3], RateTableEntry { lanes: 4, line_rate_gbps: 6 });
    }

    #[test]
    fn top_rate_is_48_gbps() {
        assert_eq!(link_bandwidth_gbps(MAX_FRL_RATE), 48);
        assert_eq!(entry(MAX_FRL_RATE + 1), None);
    }
}
