//! MSR (Model-Specific Register) device access
//!
//! Registers are reached through the per-CPU character devices under
//! `/dev/cpu/<N>/`. The allow-listed `msr_safe` device is preferred, the
//! generic `msr` driver is used when it is absent. Handle caching lives in
//! amdenergy-agent.

use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, MsrError>;

/// Default root of the per-CPU register devices
pub const DEV_CPU_ROOT: &str = "/dev/cpu";

/// Device provided by the msr-safe kernel module
pub const MSR_SAFE_DEVICE: &str = "msr_safe";

/// Device provided by the generic x86 MSR driver (CONFIG_X86_MSR)
pub const MSR_DEVICE: &str = "msr";

const MSR_WIDTH: usize = std::mem::size_of::<u64>();

/// Errors that can occur during MSR operations
#[derive(Debug, thiserror::Error)]
pub enum MsrError {
    #[error("Failed to open MSR device for CPU {cpu}: {source}")]
    OpenFailed { cpu: u32, source: io::Error },

    #[error("Failed to read MSR 0x{msr:X} on CPU {cpu}: {source}")]
    ReadFailed {
        cpu: u32,
        msr: u64,
        source: io::Error,
    },

    #[error("Short read of MSR 0x{msr:X} on CPU {cpu}: got {got} of 8 bytes")]
    ShortRead { cpu: u32, msr: u64, got: usize },

    #[error("MSR 0x{msr:X} is not readable on CPU {cpu}")]
    Unsupported { cpu: u32, msr: u64 },
}

/// Path of a register device for one CPU, e.g. `/dev/cpu/3/msr_safe`
pub fn device_path(root: &Path, cpu: u32, device: &str) -> PathBuf {
    root.join(cpu.to_string()).join(device)
}

/// An open, read-only register device for one logical CPU
#[derive(Debug)]
pub struct MsrDevice {
    file: File,
    cpu: u32,
    path: PathBuf,
}

impl MsrDevice {
    /// Open the register device of `cpu` below `root`
    ///
    /// `msr_safe` is tried first, then `msr`. When both fail the error of the
    /// last attempt is returned.
    ///
    /// # Errors
    ///
    /// Returns [`MsrError::OpenFailed`] if neither device can be opened
    /// (module not loaded, missing CAP_SYS_RAWIO, or no read permission).
    pub fn open(root: &Path, cpu: u32) -> Result<Self> {
        let safe_path = device_path(root, cpu, MSR_SAFE_DEVICE);
        if let Ok(file) = File::open(&safe_path) {
            return Ok(Self {
                file,
                cpu,
                path: safe_path,
            });
        }

        let path = device_path(root, cpu, MSR_DEVICE);
        let file = File::open(&path).map_err(|source| MsrError::OpenFailed { cpu, source })?;

        Ok(Self { file, cpu, path })
    }

    /// Read a 64-bit value from register `msr`
    ///
    /// This is a positioned read: it does not move a shared file cursor, so
    /// concurrent reads through the same device are independent.
    ///
    /// # Errors
    ///
    /// - [`MsrError::Unsupported`] if the driver rejects the address (EIO)
    /// - [`MsrError::ShortRead`] if fewer than 8 bytes are available
    /// - [`MsrError::ReadFailed`] for any other I/O error
    pub fn read(&self, msr: u64) -> Result<u64> {
        let mut buffer = [0u8; MSR_WIDTH];
        let mut filled = 0;

        while filled < MSR_WIDTH {
            match self.file.read_at(&mut buffer[filled..], msr + filled as u64) {
                Ok(0) => {
                    return Err(MsrError::ShortRead {
                        cpu: self.cpu,
                        msr,
                        got: filled,
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.raw_os_error() == Some(libc::EIO) => {
                    return Err(MsrError::Unsupported { cpu: self.cpu, msr })
                }
                Err(source) => {
                    return Err(MsrError::ReadFailed {
                        cpu: self.cpu,
                        msr,
                        source,
                    })
                }
            }
        }

        Ok(u64::from_ne_bytes(buffer))
    }

    pub fn cpu(&self) -> u32 {
        self.cpu
    }

    /// Device file this handle was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fake_device(root: &Path, cpu: u32, device: &str, msr: u64, value: u64) {
        let dir = root.join(cpu.to_string());
        fs::create_dir_all(&dir).unwrap();
        let file = File::create(dir.join(device)).unwrap();
        file.write_all_at(&value.to_ne_bytes(), msr).unwrap();
    }

    #[test]
    fn test_msr_error_display() {
        let err = MsrError::OpenFailed {
            cpu: 0,
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("Failed to open MSR device"));

        let err = MsrError::ShortRead {
            cpu: 2,
            msr: 0xC001029B,
            got: 3,
        };
        assert_eq!(
            err.to_string(),
            "Short read of MSR 0xC001029B on CPU 2: got 3 of 8 bytes"
        );
    }

    #[test]
    fn test_open_falls_back_to_msr() {
        let root = tempfile::tempdir().unwrap();
        fake_device(root.path(), 1, MSR_DEVICE, 0x10, 0xDEAD_BEEF);

        let device = MsrDevice::open(root.path(), 1).unwrap();
        assert_eq!(device.cpu(), 1);
        assert!(device.path().ends_with("1/msr"));
        assert_eq!(device.read(0x10).unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn test_open_prefers_msr_safe() {
        let root = tempfile::tempdir().unwrap();
        fake_device(root.path(), 0, MSR_DEVICE, 0x10, 1);
        fake_device(root.path(), 0, MSR_SAFE_DEVICE, 0x10, 2);

        let device = MsrDevice::open(root.path(), 0).unwrap();
        assert!(device.path().ends_with("0/msr_safe"));
        assert_eq!(device.read(0x10).unwrap(), 2);
    }

    #[test]
    fn test_open_missing_device() {
        let root = tempfile::tempdir().unwrap();
        let err = MsrDevice::open(root.path(), 7).unwrap_err();
        assert!(matches!(err, MsrError::OpenFailed { cpu: 7, .. }));
    }

    #[test]
    fn test_short_read() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MSR_DEVICE), [0u8; 12]).unwrap();

        let device = MsrDevice::open(root.path(), 0).unwrap();
        let err = device.read(8).unwrap_err();
        assert!(matches!(err, MsrError::ShortRead { got: 4, msr: 8, .. }));
    }
}
