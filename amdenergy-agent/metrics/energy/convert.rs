// Wraparound-aware differencing and unit conversion for energy counters

use crate::error::{EnergyError, Result};

const NANOJOULES_PER_JOULE: f64 = 1e9;

/// Bit width of a hardware counter that wraps to zero on overflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterWidth(u32);

impl CounterWidth {
    pub fn new(bits: u32) -> Result<Self> {
        if bits == 0 || bits > 64 {
            return Err(EnergyError::InvalidArgument(format!(
                "counter width must be 1..=64 bits, got {bits}"
            )));
        }
        Ok(Self(bits))
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn mask(&self) -> u64 {
        if self.0 == 64 {
            u64::MAX
        } else {
            (1u64 << self.0) - 1
        }
    }

    /// Counts elapsed from `baseline` to `reading`, both already masked
    ///
    /// A reading below the baseline means the counter wrapped once in between.
    pub fn delta(&self, baseline: u64, reading: u64) -> u64 {
        if reading < baseline {
            let modulus = 1u128 << self.0;
            let delta = u128::from(reading) + modulus - u128::from(baseline);
            tracing::debug!(
                "Wraparound: baseline 0x{:08x}, reading 0x{:08x}, delta 0x{:x}",
                baseline,
                reading,
                delta
            );
            delta as u64
        } else {
            reading - baseline
        }
    }
}

/// Raw energy counts to nanojoules: round(value / divisor * 1e9)
pub fn to_nanojoules(value: u128, energy_divisor: u64) -> u64 {
    ((value as f64 / energy_divisor as f64) * NANOJOULES_PER_JOULE).round() as u64
}
