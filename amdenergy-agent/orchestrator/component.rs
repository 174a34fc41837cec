// Host-facing lifecycle and native event introspection for the energy component

use crate::config::EnergyConfig;
use crate::counters::energy::{EventCode, MeasurementContext};
use crate::error::{EnergyError, ErrorCode, Result};
use crate::metric_enum;
use crate::metrics::energy::DataType;
use crate::orchestrator::EnergyRegistry;

pub const COMPONENT_NAME: &str = "amd_energy";
pub const COMPONENT_DESCRIPTION: &str = "Linux RAPL energy measurements";
pub const COMPONENT_VERSION: &str = "0.0.1";

metric_enum! {
    pub enum Domain {
        User => "USER",
        Kernel => "KERNEL",
        Other => "OTHER",
        All => "ALL",
    }
}

metric_enum! {
    pub enum Granularity {
        Thread => "THREAD",
        Process => "PROCESS",
        System => "SYSTEM",
    }
}

metric_enum! {
    pub enum EnumModifier {
        First => "FIRST",
        Next => "NEXT",
        Umasks => "UMASKS",
    }
}

// Options the host may pass to `ctl`
metric_enum! {
    pub enum ComponentOption {
        DefaultDomain => "DEFDOM",
        Domain => "DOMAIN",
        DefaultGranularity => "DEFGRN",
        Granularity => "GRANUL",
        Inherit => "INHERIT",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    pub name: &'static str,
    pub short_name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub default_domain: Domain,
    pub available_domains: Vec<Domain>,
    pub default_granularity: Granularity,
    pub available_granularities: Vec<Granularity>,
    pub num_native_events: usize,
    pub num_counters: usize,
    pub num_mpx_counters: usize,
    /// Set when initialization failed
    pub disabled: Option<ErrorCode>,
    pub disabled_reason: String,
}

impl Default for ComponentInfo {
    fn default() -> Self {
        Self {
            name: COMPONENT_NAME,
            short_name: COMPONENT_NAME,
            description: COMPONENT_DESCRIPTION,
            version: COMPONENT_VERSION,
            default_domain: Domain::All,
            available_domains: vec![Domain::All],
            default_granularity: Granularity::System,
            available_granularities: vec![Granularity::System],
            num_native_events: 0,
            num_counters: 0,
            num_mpx_counters: 0,
            disabled: None,
            disabled_reason: String::new(),
        }
    }
}

/// Structured description of one native event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInfo {
    pub symbol: String,
    pub long_descr: String,
    pub units: String,
    pub data_type: DataType,
}

/// The energy component as seen by a host measurement framework
///
/// Initialization never fails outright: an unusable machine yields a
/// disabled component carrying the reason, and every later call on it
/// returns [`EnergyError::Disabled`].
pub struct EnergyComponent {
    info: ComponentInfo,
    registry: Option<EnergyRegistry>,
}

impl EnergyComponent {
    pub fn init_component(config: &EnergyConfig) -> Self {
        match EnergyRegistry::initialize(config) {
            Ok(registry) => Self::from_registry(registry),
            Err(e) => Self::disabled(e),
        }
    }

    pub fn from_registry(registry: EnergyRegistry) -> Self {
        let events = registry.catalog().len();
        let info = ComponentInfo {
            num_native_events: events,
            num_counters: events,
            num_mpx_counters: events,
            ..ComponentInfo::default()
        };

        tracing::info!("{} component enabled with {} events", COMPONENT_NAME, events);

        Self {
            info,
            registry: Some(registry),
        }
    }

    fn disabled(error: EnergyError) -> Self {
        tracing::error!("{} component disabled: {}", COMPONENT_NAME, error);

        let info = ComponentInfo {
            disabled: Some(error.code()),
            disabled_reason: error.to_string(),
            ..ComponentInfo::default()
        };

        Self {
            info,
            registry: None,
        }
    }

    pub fn info(&self) -> &ComponentInfo {
        &self.info
    }

    pub fn is_enabled(&self) -> bool {
        self.registry.is_some()
    }

    pub fn registry(&self) -> Result<&EnergyRegistry> {
        self.registry.as_ref().ok_or_else(|| {
            if self.info.disabled_reason.is_empty() {
                EnergyError::Disabled("component is shut down".to_string())
            } else {
                EnergyError::Disabled(self.info.disabled_reason.clone())
            }
        })
    }

    pub fn init_thread(&self) -> Result<()> {
        Ok(())
    }

    pub fn shutdown_thread(&self) -> Result<()> {
        Ok(())
    }

    /// Release the catalog and close every register device
    pub fn shutdown_component(&mut self) -> Result<()> {
        if self.registry.take().is_some() {
            tracing::info!("{} component shut down", COMPONENT_NAME);
        }
        Ok(())
    }

    pub fn init_control_state(&self) -> Result<MeasurementContext> {
        Ok(MeasurementContext::new(self.registry()?.catalog()))
    }

    /// Select the events measured by `context`, returning their positions
    pub fn update_control_state(
        &self,
        context: &mut MeasurementContext,
        codes: &[EventCode],
    ) -> Result<Vec<usize>> {
        context.select(self.registry()?, codes)
    }

    pub fn start(&self, context: &mut MeasurementContext) -> Result<()> {
        context.start(self.registry()?)
    }

    pub fn stop<'a>(&self, context: &'a mut MeasurementContext) -> Result<&'a [u64]> {
        context.stop(self.registry()?)
    }

    pub fn read<'a>(&self, context: &'a mut MeasurementContext) -> Result<&'a [u64]> {
        context.read(self.registry()?)
    }

    /// Energy counters cannot be zeroed; a reset is a no-op
    pub fn reset(&self, _context: &mut MeasurementContext) -> Result<()> {
        Ok(())
    }

    /// All options are accepted and ignored
    pub fn ctl(&self, _context: &mut MeasurementContext, _option: ComponentOption) -> Result<()> {
        Ok(())
    }

    /// Only system-wide counting exists
    pub fn set_domain(&self, _context: &mut MeasurementContext, domain: Domain) -> Result<()> {
        if domain != Domain::All {
            return Err(EnergyError::InvalidArgument(format!(
                "domain {} is not supported, only {}",
                domain.name(),
                Domain::All.name()
            )));
        }
        Ok(())
    }

    pub fn enum_events(&self, code: EventCode, modifier: EnumModifier) -> Result<EventCode> {
        let len = self.registry()?.catalog().len();

        match modifier {
            EnumModifier::First => {
                if len == 0 {
                    return Err(EnergyError::NoEvent("catalog is empty".to_string()));
                }
                Ok(0)
            }
            EnumModifier::Next => {
                if (code as usize) + 1 < len {
                    Ok(code + 1)
                } else {
                    Err(EnergyError::NoEvent(format!("no event after {code}")))
                }
            }
            EnumModifier::Umasks => Err(EnergyError::InvalidArgument(
                "events have no unit masks".to_string(),
            )),
        }
    }

    pub fn code_to_name(&self, code: EventCode) -> Result<&str> {
        Ok(&self.registry()?.event(code)?.name)
    }

    pub fn code_to_descr(&self, code: EventCode) -> Result<&str> {
        Ok(&self.registry()?.event(code)?.description)
    }

    pub fn code_to_info(&self, code: EventCode) -> Result<EventInfo> {
        let event = self.registry()?.event(code)?;
        Ok(EventInfo {
            symbol: event.name.clone(),
            long_descr: event.description.clone(),
            units: event.units.to_string(),
            data_type: event.data_type,
        })
    }

    pub fn name_to_code(&self, name: &str) -> Result<EventCode> {
        self.registry()?
            .catalog()
            .lookup(name)
            .ok_or_else(|| EnergyError::NoEvent(name.to_string()))
    }
}
