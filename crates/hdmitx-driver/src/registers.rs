// SPDX-License-Identifier: AGPL-3.0-only

//! Register access abstraction
//!
//! Every backend (memory-mapped hardware, simulated core) exposes the TX
//! core's 32-bit register space through [`RegisterAccess`]. Reads take
//! `&mut self` because some registers have read side effects (the DDC data
//! FIFO pops a byte on every read).

use std::fmt::Debug;

/// 32-bit register space of one TX core.
pub trait RegisterAccess: Debug + Send {
    /// Read the register at byte offset `offset`.
    fn read32(&mut self, offset: usize) -> u32;

    /// Write the register at byte offset `offset`.
    fn write32(&mut self, offset: usize, value: u32);

    /// Backend identifier for logging
    fn backend_type(&self) -> BackendType;
}

/// Backend type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// UIO device, registers mapped with mmap
    Mmio,

    /// Simulated TX core and sink, no hardware required
    Simulated,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mmio => write!(f, "MMIO"),
            Self::Simulated => write!(f, "Simulated"),
        }
    }
}

impl<R: RegisterAccess + ?Sized> RegisterAccess for Box<R> {
    fn read32(&mut self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    fn write32(&mut self, offset: usize, value: u32) {
        (**self).write32(offset, value);
    }

    fn backend_type(&self) -> BackendType {
        (**self).backend_type()
    }
}
