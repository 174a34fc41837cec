use std::sync::Arc;

use crate::common::{MsrAccess, RegisterReader, Topology};
use crate::config::EnergyConfig;
use crate::counters::energy::{Calibration, Catalog, CounterDescriptor, EventCode};
use crate::error::{EnergyError, Result};
use crate::metrics::energy::CounterWidth;

/// Everything built once at component initialization
///
/// The topology, calibration and catalog never change afterwards and can be
/// shared by any number of measurement contexts. Register devices stay open
/// until the registry is dropped.
pub struct EnergyRegistry {
    topology: Topology,
    calibration: Calibration,
    catalog: Catalog,
    registers: Arc<dyn RegisterReader>,
    counter_width: CounterWidth,
}

impl EnergyRegistry {
    /// Check the CPU, discover topology and open the register devices
    pub fn initialize(config: &EnergyConfig) -> Result<Self> {
        config.identity().check_supported()?;

        let topology = Topology::discover(&config.sysfs_cpu_root)?;
        let registers = Arc::new(MsrAccess::new(&config.dev_cpu_root));

        Self::with_registers(topology, registers, config.counter_width)
    }

    /// Calibrate and build the catalog for a known topology
    pub fn with_registers(
        topology: Topology,
        registers: Arc<dyn RegisterReader>,
        counter_width: u32,
    ) -> Result<Self> {
        let counter_width = CounterWidth::new(counter_width)?;

        let first = topology
            .packages()
            .first()
            .map(|package| package.representative)
            .ok_or_else(|| EnergyError::Topology("No CPU packages found".to_string()))?;

        registers.open(first)?;
        let calibration = Calibration::read(registers.as_ref(), first)?;
        let catalog = Catalog::build(&topology)?;

        Ok(Self {
            topology,
            calibration,
            catalog,
            registers,
            counter_width,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn counter_width(&self) -> CounterWidth {
        self.counter_width
    }

    pub fn event(&self, code: EventCode) -> Result<&CounterDescriptor> {
        self.catalog
            .get(code)
            .ok_or_else(|| EnergyError::NoEvent(format!("event code {code}")))
    }

    /// Current raw value of the register behind `event`
    pub fn read(&self, event: &CounterDescriptor) -> Result<u64> {
        self.registers.read(event.access_point, event.register)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::msr::fake::FakeRegisters;
    use crate::common::topology::Package;
    use crate::common::AccessPoint;
    use crate::counters::energy::MeasurementContext;
    use amdenergy_raw::current_arch::rapl::msr::{MSR_PKG_ENERGY_STATUS, MSR_RAPL_POWER_UNIT};

    fn single_package() -> Topology {
        Topology::new(
            vec![Package {
                id: 0,
                representative: AccessPoint(0),
            }],
            2,
        )
    }

    #[test]
    fn test_registry_from_fake_registers() {
        let registers = Arc::new(FakeRegisters::new());
        registers.set(AccessPoint(0), MSR_RAPL_POWER_UNIT, 0x000A_1003);

        let registry = EnergyRegistry::with_registers(single_package(), registers, 32).unwrap();
        assert_eq!(registry.catalog().len(), 6);
        assert_eq!(registry.calibration().energy_divisor(), 65536);
        assert_eq!(registry.counter_width().bits(), 32);
        assert_eq!(registry.topology().core_count(), 2);
        assert!(registry.event(6).is_err());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_shared_across_threads() {
        assert_send_sync::<EnergyRegistry>();
        assert_send_sync::<Catalog>();
        assert_send_sync::<MsrAccess>();

        let registers = Arc::new(FakeRegisters::new());
        registers.set(AccessPoint(0), MSR_RAPL_POWER_UNIT, 0x000A_1003);
        registers.set(AccessPoint(0), MSR_PKG_ENERGY_STATUS, 10);
        let registry =
            EnergyRegistry::with_registers(single_package(), registers.clone(), 32).unwrap();

        // One context per thread over the same registry
        let starts: Vec<u64> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        let mut context = MeasurementContext::new(registry.catalog());
                        context.select(&registry, &[0]).unwrap();
                        context.start(&registry).unwrap();
                        context.stop(&registry).unwrap()[0]
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        assert_eq!(starts, vec![0; 4]);
    }

    #[test]
    fn test_unreachable_first_package() {
        let registers = Arc::new(FakeRegisters::new());
        registers.break_point(AccessPoint(0));

        let err = EnergyRegistry::with_registers(single_package(), registers, 32)
            .err()
            .unwrap();
        assert!(matches!(err, EnergyError::AccessUnavailable(_)));
    }

    #[test]
    fn test_empty_topology() {
        let registers = Arc::new(FakeRegisters::new());
        let result = EnergyRegistry::with_registers(Topology::new(vec![], 0), registers, 32);
        assert!(matches!(result, Err(EnergyError::Topology(_))));
    }
}
