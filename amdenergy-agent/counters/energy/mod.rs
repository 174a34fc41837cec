pub mod calibration;
pub mod events;
pub mod monitor;

pub use calibration::Calibration;
pub use events::{Catalog, CounterDescriptor, EventCode};
pub use monitor::{ActiveSet, MeasurementContext};
