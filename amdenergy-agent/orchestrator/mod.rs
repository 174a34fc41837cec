pub mod component;
pub mod registry;

pub use component::{
    ComponentInfo, ComponentOption, Domain, EnergyComponent, EnumModifier, EventInfo, Granularity,
    COMPONENT_NAME,
};
pub use registry::EnergyRegistry;
