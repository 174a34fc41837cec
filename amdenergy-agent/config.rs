use std::path::{Path, PathBuf};

use amdenergy_raw::current_arch::rapl::ENERGY_COUNTER_WIDTH;
use amdenergy_raw::msr::DEV_CPU_ROOT;

use crate::common::{CpuIdentity, CPU_IDENTITY};

/// Kernel directory holding `kernel_max` and the per-CPU topology entries
pub const SYSFS_CPU_ROOT: &str = "/sys/devices/system/cpu";

/// Overrides [`SYSFS_CPU_ROOT`] (containers often mount the host sysfs elsewhere)
pub const SYSFS_CPU_ENV: &str = "AMDENERGY_SYSFS_CPU";

/// Overrides the `/dev/cpu` register device root
pub const DEV_CPU_ENV: &str = "AMDENERGY_DEV_CPU";

#[derive(Debug, Clone)]
pub struct EnergyConfig {
    pub sysfs_cpu_root: PathBuf,
    pub dev_cpu_root: PathBuf,
    /// Width of the hardware energy counters in bits
    pub counter_width: u32,
    /// Skip CPUID detection and use this identity instead
    pub identity: Option<CpuIdentity>,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            sysfs_cpu_root: PathBuf::from(SYSFS_CPU_ROOT),
            dev_cpu_root: PathBuf::from(DEV_CPU_ROOT),
            counter_width: ENERGY_COUNTER_WIDTH,
            identity: None,
        }
    }
}

impl EnergyConfig {
    /// Kernel paths, unless overridden through the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(root) = std::env::var(SYSFS_CPU_ENV) {
            tracing::info!("Using sysfs CPU root {} from {}", root, SYSFS_CPU_ENV);
            config.sysfs_cpu_root = PathBuf::from(root);
        }
        if let Ok(root) = std::env::var(DEV_CPU_ENV) {
            tracing::info!("Using register device root {} from {}", root, DEV_CPU_ENV);
            config.dev_cpu_root = PathBuf::from(root);
        }

        config
    }

    pub fn with_roots(
        mut self,
        sysfs_cpu_root: impl AsRef<Path>,
        dev_cpu_root: impl AsRef<Path>,
    ) -> Self {
        self.sysfs_cpu_root = sysfs_cpu_root.as_ref().to_path_buf();
        self.dev_cpu_root = dev_cpu_root.as_ref().to_path_buf();
        self
    }

    pub fn with_identity(mut self, identity: CpuIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_counter_width(mut self, counter_width: u32) -> Self {
        self.counter_width = counter_width;
        self
    }

    /// The configured identity, or the one detected from CPUID
    pub fn identity(&self) -> CpuIdentity {
        self.identity.unwrap_or_else(|| *CPU_IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CpuVendor;

    #[test]
    fn test_default_uses_kernel_paths() {
        let config = EnergyConfig::default();
        assert_eq!(config.sysfs_cpu_root, Path::new("/sys/devices/system/cpu"));
        assert_eq!(config.dev_cpu_root, Path::new("/dev/cpu"));
        assert_eq!(config.counter_width, 32);
        assert!(config.identity.is_none());
    }

    #[test]
    fn test_identity_override() {
        let identity = CpuIdentity {
            vendor: CpuVendor::Amd,
            family: 0x17,
            model: 0x31,
        };
        let config = EnergyConfig::default()
            .with_roots("/tmp/sys", "/tmp/dev")
            .with_identity(identity);

        assert_eq!(config.identity(), identity);
        assert_eq!(config.dev_cpu_root, Path::new("/tmp/dev"));
    }
}
