use amdenergy_raw::current_arch::rapl::{msr::MSR_RAPL_POWER_UNIT, RaplPowerUnit};
use amdenergy_raw::RegisterLayout;

use crate::common::{AccessPoint, RegisterReader};
use crate::error::{EnergyError, Result};

/// Divisors turning raw counts into watts and joules, read once from hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    power_divisor: u64,
    energy_divisor: u64,
}

impl Calibration {
    /// Read the RAPL unit register through `point`
    ///
    /// Any failure here means RAPL registers are not accessible at all (a
    /// guest VM typically faults on this MSR), so the error is not retried.
    pub fn read(registers: &dyn RegisterReader, point: AccessPoint) -> Result<Self> {
        let raw = registers.read(point, MSR_RAPL_POWER_UNIT).map_err(|e| {
            tracing::error!("Cannot read RAPL power unit through {}: {}", point, e);
            EnergyError::Calibration("Unable to access RAPL registers".to_string())
        })?;

        let calibration = Self::from_units(RaplPowerUnit::from_msr_value(raw));
        tracing::info!(
            "RAPL units: 1 W = {} counts, 1 J = {} counts",
            calibration.power_divisor,
            calibration.energy_divisor
        );

        Ok(calibration)
    }

    pub fn from_units(units: RaplPowerUnit) -> Self {
        Self {
            power_divisor: units.power_divisor(),
            energy_divisor: units.energy_divisor(),
        }
    }

    pub fn power_divisor(&self) -> u64 {
        self.power_divisor
    }

    pub fn energy_divisor(&self) -> u64 {
        self.energy_divisor
    }
}
