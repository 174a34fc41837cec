// Package and core discovery from sysfs

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::common::msr::AccessPoint;
use crate::error::{EnergyError, Result};

/// A physical package (socket) and the core chosen to read its registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Package {
    pub id: u32,
    pub representative: AccessPoint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    packages: Vec<Package>,
    core_count: u32,
}

impl Topology {
    /// Build a topology from already known parts, packages ordered by id
    pub fn new(mut packages: Vec<Package>, core_count: u32) -> Self {
        packages.sort_by_key(|p| p.id);
        Self {
            packages,
            core_count,
        }
    }

    /// Walk `cpu0`, `cpu1`, ... below `sysfs_root` until a core has no
    /// topology entry, grouping cores by physical package id.
    ///
    /// The first core seen in a package becomes its representative.
    pub fn discover(sysfs_root: &Path) -> Result<Self> {
        let nr_cpus = kernel_nr_cpus(sysfs_root);
        let mut seen = HashSet::new();
        let mut packages = Vec::new();
        let mut core = 0u32;

        loop {
            let path = sysfs_root
                .join(format!("cpu{core}"))
                .join("topology")
                .join("physical_package_id");

            let Ok(contents) = fs::read_to_string(&path) else {
                break;
            };

            let package: i64 = contents.trim().parse().map_err(|_| {
                EnergyError::Topology(format!("Error reading file: {}", path.display()))
            })?;

            if package < 0 || package >= i64::from(nr_cpus) {
                tracing::error!(
                    "Core {} reports package {} outside of 0..{}",
                    core,
                    package,
                    nr_cpus
                );
                return Err(EnergyError::Topology(
                    "Package outside of allowed range".to_string(),
                ));
            }

            let package = package as u32;
            if seen.insert(package) {
                tracing::info!("Found package {} (read through core {})", package, core);
                packages.push(Package {
                    id: package,
                    representative: AccessPoint(core),
                });
            }

            core += 1;
        }

        if packages.is_empty() {
            return Err(EnergyError::Topology(format!(
                "No CPU packages found below {}",
                sysfs_root.display()
            )));
        }

        tracing::info!("Found {} packages with {} cores", packages.len(), core);

        Ok(Self::new(packages, core))
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn core_count(&self) -> usize {
        self.core_count as usize
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Every core reads its own core-scoped registers
    pub fn core_access_point(&self, core: u32) -> Option<AccessPoint> {
        (core < self.core_count).then_some(AccessPoint(core))
    }
}

/// Upper bound on core indices supported by the running kernel
///
/// A missing or unreadable `kernel_max` is treated as a single-core system.
pub fn kernel_nr_cpus(sysfs_root: &Path) -> u32 {
    let path = sysfs_root.join("kernel_max");
    match fs::read_to_string(&path)
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
    {
        Some(kernel_max) => kernel_max.saturating_add(1),
        None => {
            tracing::warn!("Cannot read {}, assuming 1 CPU", path.display());
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_sysfs(root: &Path, kernel_max: Option<&str>, packages: &[&str]) {
        if let Some(kernel_max) = kernel_max {
            fs::write(root.join("kernel_max"), kernel_max).unwrap();
        }
        for (core, package) in packages.iter().enumerate() {
            let dir = root.join(format!("cpu{core}")).join("topology");
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("physical_package_id"), package).unwrap();
        }
    }

    #[test]
    fn test_two_packages_four_cores() {
        let root = tempfile::tempdir().unwrap();
        fake_sysfs(root.path(), Some("511\n"), &["0\n", "0\n", "1\n", "1\n"]);

        let topology = Topology::discover(root.path()).unwrap();
        assert_eq!(topology.package_count(), 2);
        assert_eq!(topology.core_count(), 4);
        assert_eq!(
            topology.packages(),
            &[
                Package {
                    id: 0,
                    representative: AccessPoint(0)
                },
                Package {
                    id: 1,
                    representative: AccessPoint(2)
                },
            ]
        );
        assert_eq!(topology.core_access_point(3), Some(AccessPoint(3)));
        assert_eq!(topology.core_access_point(4), None);
    }

    #[test]
    fn test_interleaved_packages_keep_first_core() {
        let root = tempfile::tempdir().unwrap();
        fake_sysfs(root.path(), Some("7"), &["1", "0", "1", "0"]);

        let topology = Topology::discover(root.path()).unwrap();
        let reps: Vec<_> = topology
            .packages()
            .iter()
            .map(|p| (p.id, p.representative))
            .collect();
        assert_eq!(reps, vec![(0, AccessPoint(1)), (1, AccessPoint(0))]);
    }

    #[test]
    fn test_package_out_of_range() {
        let root = tempfile::tempdir().unwrap();
        fake_sysfs(root.path(), Some("3"), &["0", "4"]);

        let err = Topology::discover(root.path()).unwrap_err();
        assert_eq!(err.to_string(), "Package outside of allowed range");

        let root = tempfile::tempdir().unwrap();
        fake_sysfs(root.path(), Some("3"), &["-1"]);
        assert!(Topology::discover(root.path()).is_err());
    }

    #[test]
    fn test_missing_kernel_max_assumes_one_cpu() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(kernel_nr_cpus(root.path()), 1);

        fake_sysfs(root.path(), None, &["0", "0"]);
        let topology = Topology::discover(root.path()).unwrap();
        assert_eq!(topology.package_count(), 1);
        assert_eq!(topology.core_count(), 2);

        // Package 1 cannot be below a single-CPU bound
        let root = tempfile::tempdir().unwrap();
        fake_sysfs(root.path(), Some("garbage"), &["1"]);
        assert!(Topology::discover(root.path()).is_err());
    }

    #[test]
    fn test_huge_kernel_max() {
        let root = tempfile::tempdir().unwrap();
        fake_sysfs(root.path(), Some("4294967295\n"), &["0", "4000000000", "0"]);

        let topology = Topology::discover(root.path()).unwrap();
        assert_eq!(kernel_nr_cpus(root.path()), u32::MAX);
        let ids: Vec<u32> = topology.packages().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 4_000_000_000]);
        assert_eq!(topology.core_count(), 3);
    }

    #[test]
    fn test_unparsable_package_id() {
        let root = tempfile::tempdir().unwrap();
        fake_sysfs(root.path(), Some("3"), &["zero"]);

        let err = Topology::discover(root.path()).unwrap_err();
        assert!(err.to_string().starts_with("Error reading file: "));
        assert!(err.to_string().ends_with("physical_package_id"));
    }

    #[test]
    fn test_no_packages() {
        let root = tempfile::tempdir().unwrap();
        fake_sysfs(root.path(), Some("3"), &[]);

        let err = Topology::discover(root.path()).unwrap_err();
        assert!(matches!(err, EnergyError::Topology(_)));
    }
}
