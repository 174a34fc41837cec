// CPU vendor and family identification

use once_cell::sync::Lazy;

use amdenergy_raw::current_arch;

use crate::common::cpuid;
use crate::error::{EnergyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuVendor {
    Amd,
    Intel,
    Unknown,
}

impl CpuVendor {
    pub fn from_vendor_id(vendor_id: &str) -> Self {
        match vendor_id {
            "AuthenticAMD" => CpuVendor::Amd,
            "GenuineIntel" => CpuVendor::Intel,
            _ => CpuVendor::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CpuVendor::Amd => "AMD",
            CpuVendor::Intel => "Intel",
            CpuVendor::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuIdentity {
    pub vendor: CpuVendor,
    pub family: u32,
    pub model: u32,
}

pub static CPU_IDENTITY: Lazy<CpuIdentity> = Lazy::new(detect_identity);

fn detect_identity() -> CpuIdentity {
    let vendor = CpuVendor::from_vendor_id(&cpuid::vendor_id());
    let (family, model, stepping) = cpuid::signature();

    tracing::info!(
        "CPU: {} Family {:X}, Model {:X}, Stepping {:X}",
        vendor.name(),
        family,
        model,
        stepping
    );

    CpuIdentity {
        vendor,
        family,
        model,
    }
}

impl CpuIdentity {
    /// Check that the energy registers of this build exist on this CPU
    pub fn check_supported(&self) -> Result<()> {
        if CpuVendor::from_vendor_id(current_arch::VENDOR_ID) != self.vendor {
            return Err(EnergyError::UnsupportedVendor(
                "Not a supported processor".to_string(),
            ));
        }

        if self.family != current_arch::FAMILY {
            tracing::warn!(
                "CPU family {:X}h detected, only {:X}h is supported",
                self.family,
                current_arch::FAMILY
            );
            return Err(EnergyError::UnsupportedFamily(
                "CPU family not supported".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_family_17h_supported() {
        let identity = CpuIdentity {
            vendor: CpuVendor::Amd,
            family: 0x17,
            model: 0x31,
        };
        assert!(identity.check_supported().is_ok());
    }

    #[test]
    fn test_other_vendor_rejected() {
        let identity = CpuIdentity {
            vendor: CpuVendor::Intel,
            family: 0x6,
            model: 0x55,
        };
        let err = identity.check_supported().unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoSupport);
        assert_eq!(err.to_string(), "Not a supported processor");
    }

    #[test]
    fn test_other_family_rejected() {
        let identity = CpuIdentity {
            vendor: CpuVendor::Amd,
            family: 0x19,
            model: 0x01,
        };
        let err = identity.check_supported().unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoImplementation);
        assert_eq!(err.to_string(), "CPU family not supported");
    }
}
