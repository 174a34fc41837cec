// Energy counter kinds, domains and result types
use amdenergy_raw::current_arch::rapl::msr::{MSR_CORE_ENERGY_STATUS, MSR_PKG_ENERGY_STATUS};

use crate::{enum_with_data, metric_enum};

metric_enum! {
    pub enum CounterKind {
        RawCount => "RAW_COUNT",
        ConvertedEnergy => "CONVERTED_ENERGY",
    }
}

impl CounterKind {
    /// Whether readings are differenced against a baseline taken at start
    pub fn needs_difference(&self) -> bool {
        matches!(self, CounterKind::RawCount | CounterKind::ConvertedEnergy)
    }

    pub fn units(&self) -> &'static str {
        match self {
            CounterKind::RawCount => "",
            CounterKind::ConvertedEnergy => "nJ",
        }
    }
}

metric_enum! {
    pub enum DataType {
        Uint64 => "UINT64",
        Int64 => "INT64",
        Fp64 => "FP64",
    }
}

// Name prefix and status register of each energy domain
enum_with_data! {
    pub enum EnergyDomain: u64 {
        Package => ("PACKAGE_ENERGY", MSR_PKG_ENERGY_STATUS),
        Core => ("PP0_ENERGY", MSR_CORE_ENERGY_STATUS),
    }
    impl register -> u64
}

impl EnergyDomain {
    /// Suffix identifying the source, e.g. `PACKAGE0` or `CORE12`
    pub fn source_label(&self, index: u32) -> String {
        match self {
            EnergyDomain::Package => format!("PACKAGE{index}"),
            EnergyDomain::Core => format!("CORE{index}"),
        }
    }
}
