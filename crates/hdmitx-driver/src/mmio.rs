// SPDX-License-Identifier: AGPL-3.0-only

//! Memory-mapped register access through a UIO device
//!
//! The TX core is exposed to userspace as `/dev/uioN`. Map 0 of the device
//! covers the core's AXI-lite register space; its size is published by the
//! kernel under `/sys/class/uio/uioN/maps/map0/size`.

// MMIO registers are naturally aligned by hardware, so pointer casts are safe
#![allow(clippy::cast_ptr_alignment)]
#![allow(clippy::cast_possible_truncation)]

use crate::error::{HdmiTxError, Result};
use crate::registers::{BackendType, RegisterAccess};
use hdmitx_chip::regs::REGISTER_SPACE;
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsFd;
use std::path::{Path, PathBuf};

/// Environment variable naming the UIO device node.
pub const UIO_DEVICE_ENV: &str = "HDMITX_UIO_DEVICE";

/// Device node used when [`UIO_DEVICE_ENV`] is unset.
pub const DEFAULT_UIO_DEVICE: &str = "/dev/uio0";

/// Register window used when sysfs does not publish a map size.
const FALLBACK_MAP_SIZE: usize = 0x1_0000;

/// TX core register space mapped from a UIO device
pub struct MappedRegisters {
    /// Memory-mapped pointer
    ptr: *mut u8,
    /// Size of the mapping
    size: usize,
    /// Device node the mapping came from
    path: PathBuf,
    /// Keeps the UIO file open for the lifetime of the mapping
    _file: File,
}

impl std::fmt::Debug for MappedRegisters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegisters")
            .field("ptr", &format_args!("{:p}", self.ptr))
            .field("size", &self.size)
            .field("path", &self.path)
            .finish()
    }
}

// SAFETY: Send - MappedRegisters owns the mapping exclusively. Moving between threads
// doesn't invalidate the mapping (mmap'd memory is process-wide). No thread-local state.
unsafe impl Send for MappedRegisters {}

impl MappedRegisters {
    /// Open the device named by `HDMITX_UIO_DEVICE`, or `/dev/uio0`.
    ///
    /// # Errors
    ///
    /// See [`MappedRegisters::open`].
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(UIO_DEVICE_ENV).unwrap_or_else(|_| DEFAULT_UIO_DEVICE.into());
        Self::open(path)
    }

    /// Map map 0 of a UIO device.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The device node does not exist or cannot be opened read/write
    /// - The published map is smaller than the register map
    /// - Memory mapping fails
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HdmiTxError::device_not_found(path));
        }

        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let size = uio_map_size(path).unwrap_or(FALLBACK_MAP_SIZE);
        if size < REGISTER_SPACE {
            return Err(HdmiTxError::RegisterWindowTooSmall {
                size,
                required: REGISTER_SPACE,
            });
        }

        tracing::debug!("{}: map0 size={:#x}", path.display(), size);

        // SAFETY: mmap necessary for MMIO - maps the core's register window into the process.
        // Invariants: (1) file is an open UIO node; (2) offset 0 selects map 0 per the UIO ABI;
        // (3) size was published by the kernel for map 0 or is the core's fixed window;
        // (4) ptr valid for size bytes or Err.
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                0,
            )
            .map_err(|e| {
                HdmiTxError::mapping_failed(format!("mmap {}: {e}", path.display()))
            })?
        };

        tracing::info!("Mapped {} at {:p}, size={:#x}", path.display(), ptr, size);

        Ok(Self {
            ptr: ptr.cast(),
            size,
            path: path.to_path_buf(),
            _file: file,
        })
    }

    /// Get mapping size
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Device node backing this mapping
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegisterAccess for MappedRegisters {
    /// # Panics
    ///
    /// Panics if `offset + 4` exceeds the mapped region size.
    fn read32(&mut self, offset: usize) -> u32 {
        assert!(offset + 4 <= self.size, "Register offset out of bounds");
        // SAFETY: read_volatile necessary for MMIO - hardware can change value.
        // Invariants: (1) ptr from mmap in open(), valid for self.size; (2) offset+4 <= size;
        // (3) u32 aligned. Caller guarantees: offset from the register map.
        unsafe { std::ptr::read_volatile(self.ptr.add(offset).cast::<u32>()) }
    }

    /// # Panics
    ///
    /// Panics if `offset + 4` exceeds the mapped region size.
    fn write32(&mut self, offset: usize, value: u32) {
        assert!(offset + 4 <= self.size, "Register offset out of bounds");
        // SAFETY: write_volatile necessary for MMIO - triggers hardware side effects.
        // Invariants: (1) ptr from mmap; (2) offset+4 <= size; (3) u32 aligned.
        unsafe {
            std::ptr::write_volatile(self.ptr.add(offset).cast::<u32>(), value);
        }
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Mmio
    }
}

impl Drop for MappedRegisters {
    fn drop(&mut self) {
        // SAFETY: munmap necessary - must unmap region before the file closes.
        // Invariants: (1) ptr from mmap in open(), valid for self.size; (2) Drop runs at most once.
        unsafe {
            // Ignore error in Drop (can't propagate)
            let _ = munmap(self.ptr.cast(), self.size);
        }
        tracing::debug!("Unmapped {}", self.path.display());
    }
}

/// Read `/sys/class/uio/<name>/maps/map0/size` for a `/dev/<name>` node.
fn uio_map_size(dev: &Path) -> Option<usize> {
    let name = dev.file_name()?.to_str()?;
    let sysfs = format!("/sys/class/uio/{name}/maps/map0/size");
    let text = std::fs::read_to_string(sysfs).ok()?;
    parse_hex(&text)
}

fn parse_hex(text: &str) -> Option<usize> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    usize::from_str_radix(digits, 16).ok()
}
