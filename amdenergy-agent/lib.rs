// Macros (must be first for visibility)
#[macro_use]
pub mod macros;

pub mod common;
pub mod config;
pub mod counters;
pub mod error;
pub mod metrics;
pub mod orchestrator;

pub use config::EnergyConfig;
pub use counters::energy::{Catalog, CounterDescriptor, EventCode, MeasurementContext};
pub use error::{EnergyError, ErrorCode, Result};
pub use orchestrator::{EnergyComponent, EnergyRegistry, EnumModifier};
