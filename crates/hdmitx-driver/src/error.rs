// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for HDMI TX driver operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for driver setup operations
pub type Result<T> = std::result::Result<T, HdmiTxError>;

/// Failure of a single DDC transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The slave did not acknowledge the address or a data phase
    #[error("DDC slave did not acknowledge")]
    NoAck,

    /// The engine reported a bus timeout, or a poll ran out of iterations
    #[error("DDC transaction timed out")]
    Timeout,

    /// Segment longer than the engine's 16-bit length field
    #[error("DDC segment of {len} bytes exceeds 65535")]
    SegmentTooLong {
        /// Requested length
        len: usize,
    },
}

/// Errors reported by the FRL training state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrainingError {
    /// An SCDC access needed by the current state failed
    #[error("SCDC register access failed: {source}")]
    RegisterIoFailed {
        /// Underlying transaction failure
        #[from]
        source: TransactionError,
    },

    /// Lane index outside `0..4`
    #[error("Invalid lane index {lane} (have 4 lanes)")]
    InvalidLaneIndex {
        /// Requested lane
        lane: u8,
    },
}

impl TrainingError {
    /// Create an invalid lane index error
    pub const fn invalid_lane(lane: u8) -> Self {
        Self::InvalidLaneIndex { lane }
    }
}

/// Errors that can occur while bringing up a TX core
#[derive(Debug, Error)]
pub enum HdmiTxError {
    /// Device node not found at the expected path
    #[error("Device not found: {path}")]
    DeviceNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// I/O error while opening or querying the device
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Mapping the register space failed
    #[error("Failed to map registers: {reason}")]
    MappingFailed {
        /// Reason for failure
        reason: String,
    },

    /// The mapped window is too small for the register map
    #[error("Register window of {size:#x} bytes is smaller than required {required:#x}")]
    RegisterWindowTooSmall {
        /// Size of the mapping
        size: usize,
        /// Bytes the register map needs
        required: usize,
    },

    /// A DDC transaction failed outside of training
    #[error("DDC transaction failed: {source}")]
    Transaction {
        /// Underlying transaction failure
        #[from]
        source: TransactionError,
    },

    /// Training state machine error
    #[error(transparent)]
    Training(#[from] TrainingError),
}

impl HdmiTxError {
    /// Create a device not found error
    pub fn device_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DeviceNotFound { path: path.into() }
    }

    /// Create a mapping failed error
    pub fn mapping_failed(reason: impl Into<String>) -> Self {
        Self::MappingFailed {
            reason: reason.into(),
        }
    }
}
