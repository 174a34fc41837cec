pub mod arch;
pub mod cpuid;
pub mod msr;
pub mod topology;

pub use arch::{CpuIdentity, CpuVendor, CPU_IDENTITY};
pub use msr::{AccessPoint, MsrAccess, RegisterReader};
pub use topology::Topology;
