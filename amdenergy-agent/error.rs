use std::io;
use thiserror::Error;

use amdenergy_raw::MsrError;

#[derive(Error, Debug)]
pub enum EnergyError {
    #[error("{0}")]
    UnsupportedVendor(String),

    #[error("{0}")]
    UnsupportedFamily(String),

    #[error("{0}")]
    Topology(String),

    #[error("{0}")]
    AccessUnavailable(String),

    #[error("{0}")]
    Calibration(String),

    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    #[error("MSR operation failed: {0}")]
    Msr(#[from] MsrError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No such event: {0}")]
    NoEvent(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Component disabled: {0}")]
    Disabled(String),
}

/// Status codes understood by the host measurement framework
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Hardware is not supported at all
    NoSupport,
    /// Hardware is recognised but this family is not implemented
    NoImplementation,
    /// System call or system configuration failure
    System,
    NoMemory,
    NoEvent,
    Invalid,
}

impl EnergyError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EnergyError::UnsupportedVendor(_) => ErrorCode::NoSupport,
            EnergyError::UnsupportedFamily(_) => ErrorCode::NoImplementation,
            EnergyError::Topology(_)
            | EnergyError::AccessUnavailable(_)
            | EnergyError::Calibration(_)
            | EnergyError::Msr(_)
            | EnergyError::Io(_) => ErrorCode::System,
            EnergyError::OutOfMemory(_) => ErrorCode::NoMemory,
            EnergyError::NoEvent(_) => ErrorCode::NoEvent,
            EnergyError::InvalidArgument(_) => ErrorCode::Invalid,
            EnergyError::Disabled(_) => ErrorCode::NoSupport,
        }
    }
}

pub type Result<T> = std::result::Result<T, EnergyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_failures_map_to_host_codes() {
        let vendor = EnergyError::UnsupportedVendor("Not a supported processor".to_string());
        assert_eq!(vendor.code(), ErrorCode::NoSupport);
        assert_eq!(vendor.to_string(), "Not a supported processor");

        let family = EnergyError::UnsupportedFamily("CPU family not supported".to_string());
        assert_eq!(family.code(), ErrorCode::NoImplementation);

        let msr = EnergyError::from(MsrError::ShortRead {
            cpu: 0,
            msr: 0x10,
            got: 0,
        });
        assert_eq!(msr.code(), ErrorCode::System);
        assert!(msr.to_string().starts_with("MSR operation failed"));
    }
}
