// Native event catalog: one raw and one converted counter per package and per core

use std::collections::HashMap;

use crate::common::{AccessPoint, Topology};
use crate::error::{EnergyError, Result};
use crate::metrics::energy::{CounterKind, DataType, EnergyDomain};

/// External event code: the 0-based position in the catalog
pub type EventCode = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterDescriptor {
    pub name: String,
    pub description: String,
    pub units: &'static str,
    pub register: u64,
    pub access_point: AccessPoint,
    pub domain: EnergyDomain,
    pub kind: CounterKind,
    pub data_type: DataType,
    /// 1-based internal selector
    pub selector: u32,
}

impl CounterDescriptor {
    pub fn code(&self) -> EventCode {
        self.selector - 1
    }
}

/// A physical counter source, read through one access point
#[derive(Debug, Clone, Copy)]
struct Source {
    domain: EnergyDomain,
    index: u32,
    access_point: AccessPoint,
}

impl Source {
    fn describe(&self, kind: CounterKind) -> String {
        let subject = match self.domain {
            EnergyDomain::Package => format!("chip package {}", self.index),
            EnergyDomain::Core => format!("core {}", self.index),
        };
        match kind {
            CounterKind::RawCount => format!("Energy used in counts by {subject}"),
            CounterKind::ConvertedEnergy => format!("Energy used by {subject}"),
        }
    }

    fn name(&self, kind: CounterKind) -> String {
        let suffix = match kind {
            CounterKind::RawCount => "_CNT",
            CounterKind::ConvertedEnergy => "",
        };
        format!(
            "{}{}:{}",
            self.domain.name(),
            suffix,
            self.domain.source_label(self.index)
        )
    }
}

/// Ordered counter descriptors; the first half holds raw counts, the second
/// half the converted values of the same sources in the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    events: Vec<CounterDescriptor>,
    by_name: HashMap<String, EventCode>,
}

impl Catalog {
    pub fn build(topology: &Topology) -> Result<Self> {
        let sources: Vec<Source> = topology
            .packages()
            .iter()
            .map(|package| Source {
                domain: EnergyDomain::Package,
                index: package.id,
                access_point: package.representative,
            })
            .chain((0..topology.core_count() as u32).map(|core| Source {
                domain: EnergyDomain::Core,
                index: core,
                access_point: AccessPoint(core),
            }))
            .collect();

        let len = sources.len() * 2;
        let mut events = Vec::new();
        events.try_reserve_exact(len).map_err(|e| {
            EnergyError::OutOfMemory(format!("catalog of {len} events: {e}"))
        })?;

        for kind in [CounterKind::RawCount, CounterKind::ConvertedEnergy] {
            for source in &sources {
                let selector = events.len() as u32 + 1;
                events.push(CounterDescriptor {
                    name: source.name(kind),
                    description: source.describe(kind),
                    units: kind.units(),
                    register: source.domain.register(),
                    access_point: source.access_point,
                    domain: source.domain,
                    kind,
                    data_type: DataType::Uint64,
                    selector,
                });
            }
        }

        let by_name = events
            .iter()
            .map(|event| (event.name.clone(), event.code()))
            .collect();

        tracing::info!(
            "Built {} native events for {} packages and {} cores",
            events.len(),
            topology.package_count(),
            topology.core_count()
        );

        Ok(Self { events, by_name })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, code: EventCode) -> Option<&CounterDescriptor> {
        self.events.get(code as usize)
    }

    pub fn lookup(&self, name: &str) -> Option<EventCode> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CounterDescriptor> {
        self.events.iter()
    }

    /// The event reading the same source with the other kind
    pub fn counterpart(&self, code: EventCode) -> Option<EventCode> {
        let half = (self.len() / 2) as u32;
        let event = self.get(code)?;
        Some(match event.kind {
            CounterKind::RawCount => code + half,
            CounterKind::ConvertedEnergy => code - half,
        })
    }
}
