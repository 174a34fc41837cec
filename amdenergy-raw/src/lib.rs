//! # amdenergy-raw
//!
//! Register definitions and device access for AMD RAPL energy counters.
//!
//! This crate knows where the energy registers live, how their unit
//! descriptor is laid out and how to read a 64-bit value out of
//! `/dev/cpu/<N>/msr_safe` or `/dev/cpu/<N>/msr`. It does not cache handles
//! or accumulate counter values; that is the job of amdenergy-agent.
//!
//! ## Features
//!
//! - `zen` (default) - AMD family 17h register definitions
//!
//! ## Usage
//!
//! ```ignore
//! use amdenergy_raw::current_arch::rapl::{self, RaplPowerUnit};
//! use amdenergy_raw::{MsrDevice, RegisterLayout};
//!
//! let device = MsrDevice::open("/dev/cpu".as_ref(), 0)?;
//! let units = RaplPowerUnit::from_msr_value(device.read(rapl::msr::MSR_RAPL_POWER_UNIT)?);
//! println!("1 J = {} counts", units.energy_divisor());
//! ```

pub mod arch;
pub mod msr;
pub mod register;

pub use msr::{MsrDevice, MsrError, Result};
pub use register::RegisterLayout;

#[cfg(feature = "zen")]
pub use arch::zen as current_arch;
