pub mod convert;
pub mod types;

pub use convert::{to_nanojoules, CounterWidth};
pub use types::{CounterKind, DataType, EnergyDomain};
