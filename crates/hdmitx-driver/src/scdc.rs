// SPDX-License-Identifier: AGPL-3.0-only

//! Sink-side SCDC helpers outside of link training

use crate::ddc::TransactionResult;
use crate::frl::TrainingObserver;
use crate::hdmitx::HdmiTx;
use crate::registers::RegisterAccess;
use hdmitx_chip::scdc::{self, tmds_config, ScdcField};
use tracing::{debug, info};

/// SCDC status registers of interest when debugging a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScdcSnapshot {
    /// Sink version.
    pub sink_version: u8,
    /// TMDS configuration.
    pub tmds_config: u8,
    /// Scrambler status.
    pub scrambler_status: u8,
    /// Status flags.
    pub status_flags: u8,
}

impl ScdcSnapshot {
    /// Sink reports the scrambled TMDS stream locked.
    pub const fn scrambling_locked(&self) -> bool {
        self.scrambler_status & 0x01 != 0
    }
}

impl<R: RegisterAccess, O: TrainingObserver> HdmiTx<R, O> {
    /// Probe for an HDMI 2.0+ sink by writing the source version.
    ///
    /// Updates and returns [`crate::StreamStatus::scdc_support`].
    pub fn detect_hdmi20(&mut self) -> bool {
        let supported = self.ddc().write_field(ScdcField::SourceVersion, 1).is_ok();
        debug!("SCDC probe: {}", if supported { "acknowledged" } else { "no answer" });
        self.set_scdc_support(supported);
        supported
    }

    /// Ask the sink to expect a scrambled TMDS stream.
    ///
    /// # Errors
    ///
    /// Any DDC failure.
    pub fn set_sink_scrambling(&mut self, enable: bool) -> TransactionResult<()> {
        self.update_tmds_config(tmds_config::SCRAMBLING_ENABLE, enable)
    }

    /// Select the 1/40 TMDS bit clock ratio at the sink.
    ///
    /// # Errors
    ///
    /// Any DDC failure.
    pub fn set_sink_clock_ratio(&mut self, ratio_40: bool) -> TransactionResult<()> {
        self.update_tmds_config(tmds_config::CLOCK_RATIO_40, ratio_40)
    }

    fn update_tmds_config(&mut self, bit: u8, set: bool) -> TransactionResult<()> {
        let mut ddc = self.ddc();
        let current = ddc.read_scdc(scdc::TMDS_CONFIG)?;
        let value = if set { current | bit } else { current & !bit };
        ddc.write_scdc(scdc::TMDS_CONFIG, value)
    }

    /// Read the sink's version, TMDS configuration and status registers.
    ///
    /// # Errors
    ///
    /// Any DDC failure.
    pub fn read_scdc_snapshot(&mut self) -> TransactionResult<ScdcSnapshot> {
        let mut ddc = self.ddc();
        let snapshot = ScdcSnapshot {
            sink_version: ddc.read_scdc(scdc::SINK_VERSION)?,
            tmds_config: ddc.read_scdc(scdc::TMDS_CONFIG)?,
            scrambler_status: ddc.read_scdc(scdc::SCRAMBLER_STATUS)?,
            status_flags: ddc.read_scdc(scdc::STATUS_FLAGS)?,
        };
        info!(
            "SCDC: version {:#04x}, TMDS config {:#04x}, scrambler {:#04x}, status {:#04x}",
            snapshot.sink_version,
            snapshot.tmds_config,
            snapshot.scrambler_status,
            snapshot.status_flags
        );
        Ok(snapshot)
    }

    /// Read the character error counters: 11 bytes in FRL mode, 7 in TMDS.
    ///
    /// # Errors
    ///
    /// Any DDC failure.
    pub fn read_ced_counters(&mut self) -> TransactionResult<Vec<u8>> {
        let len = if self.stream().is_frl {
            scdc::CED_LEN_FRL
        } else {
            scdc::CED_LEN_TMDS
        };
        self.ddc().read_register(scdc::SLAVE_ADDRESS, len, scdc::CED)
    }
}
