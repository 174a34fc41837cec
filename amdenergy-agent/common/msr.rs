use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use amdenergy_raw::msr::MSR_SAFE_DEVICE;
use amdenergy_raw::{MsrDevice, MsrError};

use crate::error::{EnergyError, Result};

/// Logical CPU index through which a package or core register is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessPoint(pub u32);

impl AccessPoint {
    pub fn cpu(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AccessPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cpu{}", self.0)
    }
}

/// Source of raw register values, keyed by access point
pub trait RegisterReader: Send + Sync {
    /// Make `point` readable, opening its device on first use
    fn open(&self, point: AccessPoint) -> Result<()>;

    /// Read the 64-bit register at `address` through `point`
    fn read(&self, point: AccessPoint, address: u64) -> Result<u64>;
}

/// Register devices under `/dev/cpu`, opened lazily and cached until dropped
pub struct MsrAccess {
    root: PathBuf,
    handles: RwLock<HashMap<AccessPoint, Arc<MsrDevice>>>,
}

impl MsrAccess {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            handles: RwLock::new(HashMap::new()),
        }
    }

    fn get_handle(&self, point: AccessPoint) -> Result<Arc<MsrDevice>> {
        {
            let handles = self.handles.read();
            if let Some(handle) = handles.get(&point) {
                return Ok(Arc::clone(handle));
            }
        }

        // Opening happens under the write lock so two callers never race on one point
        let mut handles = self.handles.write();
        if let Some(handle) = handles.get(&point) {
            return Ok(Arc::clone(handle));
        }

        let device = MsrDevice::open(&self.root, point.cpu()).map_err(|e| match e {
            MsrError::OpenFailed { cpu, source } => {
                EnergyError::AccessUnavailable(format!("Can't open fd for cpu{cpu}: {source}"))
            }
            other => other.into(),
        })?;

        if !device.path().ends_with(MSR_SAFE_DEVICE) {
            tracing::warn!("{} unavailable for {}, using msr", MSR_SAFE_DEVICE, point);
        }
        tracing::info!(
            "Opened {} for access point {}",
            device.path().display(),
            point
        );

        let handle = Arc::new(device);
        handles.insert(point, Arc::clone(&handle));
        Ok(handle)
    }

    /// Number of devices currently held open
    pub fn open_count(&self) -> usize {
        self.handles.read().len()
    }

    /// Close every cached device
    pub fn close_all(&self) {
        let mut handles = self.handles.write();
        if !handles.is_empty() {
            tracing::info!("Closing {} register devices", handles.len());
        }
        handles.clear();
    }
}

impl RegisterReader for MsrAccess {
    fn open(&self, point: AccessPoint) -> Result<()> {
        self.get_handle(point).map(|_| ())
    }

    fn read(&self, point: AccessPoint, address: u64) -> Result<u64> {
        let handle = self.get_handle(point)?;
        let value = handle.read(address)?;
        tracing::debug!(
            "MSR read: {} MSR 0x{:08x} = 0x{:016x}",
            point,
            address,
            value
        );
        Ok(value)
    }
}

impl Drop for MsrAccess {
    fn drop(&mut self) {
        self.close_all();
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::os::unix::fs::FileExt;

    fn fake_msr(root: &Path, cpu: u32, address: u64, value: u64) {
        let dir = root.join(cpu.to_string());
        fs::create_dir_all(&dir).unwrap();
        let file = File::create(dir.join("msr")).unwrap();
        file.write_all_at(&value.to_ne_bytes(), address).unwrap();
    }

    #[test]
    fn test_handles_are_cached() {
        let root = tempfile::tempdir().unwrap();
        fake_msr(root.path(), 0, 0x20, 42);

        let access = MsrAccess::new(root.path());
        assert_eq!(access.open_count(), 0);

        assert_eq!(access.read(AccessPoint(0), 0x20).unwrap(), 42);
        assert_eq!(access.read(AccessPoint(0), 0x20).unwrap(), 42);
        access.open(AccessPoint(0)).unwrap();
        assert_eq!(access.open_count(), 1);

        access.close_all();
        assert_eq!(access.open_count(), 0);
    }

    #[test]
    fn test_unavailable_device() {
        let root = tempfile::tempdir().unwrap();
        let access = MsrAccess::new(root.path());

        let err = access.open(AccessPoint(3)).unwrap_err();
        assert!(matches!(err, EnergyError::AccessUnavailable(_)));
        assert!(err.to_string().starts_with("Can't open fd for cpu3: "));
        assert_eq!(access.open_count(), 0);
    }

    #[test]
    fn test_read_error_is_recoverable() {
        let root = tempfile::tempdir().unwrap();
        fake_msr(root.path(), 1, 0x0, 7);

        let access = MsrAccess::new(root.path());
        let err = access.read(AccessPoint(1), 0x1000).unwrap_err();
        assert!(matches!(err, EnergyError::Msr(MsrError::ShortRead { .. })));

        // The handle stays usable after a failed read
        assert_eq!(access.read(AccessPoint(1), 0x0).unwrap(), 7);
    }

    #[test]
    fn test_concurrent_first_open_shares_one_handle() {
        let root = tempfile::tempdir().unwrap();
        fake_msr(root.path(), 0, 0x40, 0xDEAD_BEEF);

        let access = MsrAccess::new(root.path());
        let values: Vec<u64> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| s.spawn(|| access.read(AccessPoint(0), 0x40).unwrap()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert_eq!(values, vec![0xDEAD_BEEF; 8]);
        assert_eq!(access.open_count(), 1);
    }

    #[test]
    fn test_access_point_display() {
        assert_eq!(AccessPoint(12).to_string(), "cpu12");
    }
}
