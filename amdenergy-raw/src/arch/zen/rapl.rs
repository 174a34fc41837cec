//! RAPL (Running Average Power Limit) register definitions for AMD family 17h
//!
//! Family 17h exposes one package energy counter per socket and one core
//! energy counter per logical core. Both counters are 32 bits wide and wrap.
//!
//! ## References
//!
//! - Processor Programming Reference (PPR) for AMD Family 17h, MSRC001_0299..029B

use crate::register::RegisterLayout;

/// MSR addresses for RAPL
pub mod msr {
    /// RAPL Power Unit - power, energy and time units
    pub const MSR_RAPL_POWER_UNIT: u64 = 0xC001_0299;

    /// Core Energy Status - energy consumed by one core
    pub const MSR_CORE_ENERGY_STATUS: u64 = 0xC001_029A;

    /// Package Energy Status - energy consumed by the whole socket
    pub const MSR_PKG_ENERGY_STATUS: u64 = 0xC001_029B;
}

/// Width in bits of the energy status counters
pub const ENERGY_COUNTER_WIDTH: u32 = 32;

const POWER_UNIT_OFFSET: u32 = 0;
const POWER_UNIT_MASK: u64 = 0x0F;
const ENERGY_UNIT_OFFSET: u32 = 8;
const ENERGY_UNIT_MASK: u64 = 0x1F;
const TIME_UNIT_OFFSET: u32 = 16;
const TIME_UNIT_MASK: u64 = 0x0F;

/// RAPL Power Unit Register layout
///
/// Each field encodes a unit of `1 / 2^field`, so the field is the base-2
/// logarithm of the divisor that turns raw counts into physical units.
///
/// ## Register Format
///
/// | Bits   | Field        | Description                   |
/// |--------|--------------|-------------------------------|
/// | 0-3    | power_units  | Power unit (1/2^PU watts)     |
/// | 4-7    | reserved     |                               |
/// | 8-12   | energy_units | Energy unit (1/2^ESU joules)  |
/// | 13-15  | reserved     |                               |
/// | 16-19  | time_units   | Time unit (1/2^TU seconds)    |
/// | 20-63  | reserved     |                               |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaplPowerUnit {
    pub power_units: u8,
    pub energy_units: u8,
    pub time_units: u8,
}

impl RegisterLayout for RaplPowerUnit {
    fn to_msr_value(&self) -> u64 {
        ((self.power_units as u64 & POWER_UNIT_MASK) << POWER_UNIT_OFFSET)
            | ((self.energy_units as u64 & ENERGY_UNIT_MASK) << ENERGY_UNIT_OFFSET)
            | ((self.time_units as u64 & TIME_UNIT_MASK) << TIME_UNIT_OFFSET)
    }

    fn from_msr_value(value: u64) -> Self {
        Self {
            power_units: ((value >> POWER_UNIT_OFFSET) & POWER_UNIT_MASK) as u8,
            energy_units: ((value >> ENERGY_UNIT_OFFSET) & ENERGY_UNIT_MASK) as u8,
            time_units: ((value >> TIME_UNIT_OFFSET) & TIME_UNIT_MASK) as u8,
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.power_units > 15 {
            return Err("Power units must be <= 15 (4 bits)");
        }
        if self.energy_units > 31 {
            return Err("Energy units must be <= 31 (5 bits)");
        }
        if self.time_units > 15 {
            return Err("Time units must be <= 15 (4 bits)");
        }
        Ok(())
    }
}

impl RaplPowerUnit {
    /// Raw power counts per watt
    pub fn power_divisor(&self) -> u64 {
        1u64 << self.power_units
    }

    /// Raw energy counts per joule
    pub fn energy_divisor(&self) -> u64 {
        1u64 << self.energy_units
    }

    /// Raw time counts per second
    pub fn time_divisor(&self) -> u64 {
        1u64 << self.time_units
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_typical_epyc_value() {
        // Reported by EPYC 7002 parts: 1/8 W, 1/65536 J (15.3 uJ), 1/1024 s
        let unit = RaplPowerUnit::from_msr_value(0x000A_1003);

        assert_eq!(unit.power_units, 3);
        assert_eq!(unit.energy_units, 16);
        assert_eq!(unit.time_units, 10);
        assert_eq!(unit.power_divisor(), 8);
        assert_eq!(unit.energy_divisor(), 65536);
        assert_eq!(unit.time_divisor(), 1024);
        assert!(unit.validate().is_ok());
    }

    #[test]
    fn test_reserved_bits_ignored() {
        let unit = RaplPowerUnit::from_msr_value(0xFFFF_FFFF_FFF0_E0F0 | 0x000A_1003);
        assert_eq!(unit, RaplPowerUnit::from_msr_value(0x000A_1003));
        assert_eq!(unit.to_msr_value() & !0x000F_1F0F, 0);
    }

    #[test]
    fn test_validate_rejects_oversized_fields() {
        let unit = RaplPowerUnit {
            power_units: 3,
            energy_units: 40,
            time_units: 10,
        };
        assert!(unit.validate().is_err());
    }
}
