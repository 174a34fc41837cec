// Per-session counter state: active set, baselines and accumulated totals

use std::time::Instant;

use crate::counters::energy::events::{Catalog, EventCode};
use crate::error::{EnergyError, Result};
use crate::metrics::energy::{to_nanojoules, CounterKind};
use crate::orchestrator::EnergyRegistry;

/// Catalog positions selected for measurement, ascending and without repeats
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSet(Vec<EventCode>);

impl ActiveSet {
    pub fn contains(&self, code: EventCode) -> bool {
        self.0.binary_search(&code).is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EventCode> + '_ {
        self.0.iter().copied()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SlotState {
    needs_difference: bool,
    /// Last masked raw reading
    baseline: u64,
    accumulated: u128,
}

/// One measurement session over the catalog
///
/// Each slot of the catalog has a baseline and an accumulated total. `start`
/// takes the baselines, every `stop` or `read` adds the counts elapsed since
/// the previous call (handling one counter wrap per interval) and reports the
/// totals, converted to nanojoules for energy events.
#[derive(Debug, Clone)]
pub struct MeasurementContext {
    active: ActiveSet,
    slots: Vec<SlotState>,
    counts: Vec<u64>,
    running: bool,
    last_update: Option<Instant>,
}

impl MeasurementContext {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            active: ActiveSet::default(),
            slots: vec![SlotState::default(); catalog.len()],
            counts: vec![0; catalog.len()],
            running: false,
            last_update: None,
        }
    }

    /// Replace the active set with `codes`
    ///
    /// Returns the catalog position of each code, in the order given.
    /// Counter state is left untouched; the next `start` resets it.
    pub fn select(&mut self, registry: &EnergyRegistry, codes: &[EventCode]) -> Result<Vec<usize>> {
        if self.running {
            return Err(EnergyError::InvalidArgument(
                "active events cannot change while measuring".to_string(),
            ));
        }

        self.check_catalog(registry)?;

        let catalog = registry.catalog();
        let mut positions = Vec::with_capacity(codes.len());
        for &code in codes {
            let event = catalog
                .get(code)
                .ok_or_else(|| EnergyError::NoEvent(format!("event code {code}")))?;
            positions.push((event.selector - 1) as usize);
        }

        let mut active: Vec<EventCode> = codes.to_vec();
        active.sort_unstable();
        active.dedup();

        for &code in &active {
            if let Some(event) = catalog.get(code) {
                self.slots[code as usize].needs_difference = event.kind.needs_difference();
            }
        }
        self.active = ActiveSet(active);

        Ok(positions)
    }

    pub fn start(&mut self, registry: &EnergyRegistry) -> Result<()> {
        self.check_catalog(registry)?;
        let mask = registry.counter_width().mask();

        for code in self.active.iter() {
            let slot = &mut self.slots[code as usize];
            if !slot.needs_difference {
                continue;
            }
            let event = registry.event(code)?;
            slot.baseline = registry.read(event)? & mask;
            slot.accumulated = 0;
        }

        self.running = true;
        self.last_update = Some(Instant::now());
        Ok(())
    }

    /// Accumulate and report, then end the session
    ///
    /// The session ends even when a read fails, so the active set can be
    /// changed afterwards.
    pub fn stop(&mut self, registry: &EnergyRegistry) -> Result<&[u64]> {
        let result = self.update(registry);
        self.running = false;
        result.map(|()| &self.counts[..])
    }

    /// Accumulate and report without ending the session
    ///
    /// This advances the baselines exactly like `stop`: two reads in a row
    /// each add the counts elapsed since the previous call.
    pub fn read(&mut self, registry: &EnergyRegistry) -> Result<&[u64]> {
        self.update(registry)?;
        Ok(&self.counts)
    }

    // A failed read leaves slots before it updated and the rest untouched.
    fn update(&mut self, registry: &EnergyRegistry) -> Result<()> {
        self.check_catalog(registry)?;
        let width = registry.counter_width();
        let energy_divisor = registry.calibration().energy_divisor();

        for code in self.active.iter() {
            let event = registry.event(code)?;
            let raw = registry.read(event)?;
            let slot = &mut self.slots[code as usize];

            let value = if slot.needs_difference {
                let reading = raw & width.mask();
                slot.accumulated += u128::from(width.delta(slot.baseline, reading));
                slot.baseline = reading;
                slot.accumulated
            } else {
                u128::from(raw)
            };

            self.counts[code as usize] = match event.kind {
                CounterKind::ConvertedEnergy => to_nanojoules(value, energy_divisor),
                CounterKind::RawCount => u64::try_from(value).unwrap_or(u64::MAX),
            };
        }

        self.last_update = Some(Instant::now());
        Ok(())
    }

    // Slots are indexed by event code, so the registry must own the catalog
    // this context was sized for.
    fn check_catalog(&self, registry: &EnergyRegistry) -> Result<()> {
        let expected = registry.catalog().len();
        if self.slots.len() != expected {
            return Err(EnergyError::InvalidArgument(format!(
                "context holds {} slots, catalog has {} events",
                self.slots.len(),
                expected
            )));
        }
        Ok(())
    }

    /// Last reported value of every catalog position
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn active(&self) -> &ActiveSet {
        &self.active
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Raw counts accumulated by `code` since the last start
    pub fn accumulated(&self, code: EventCode) -> Option<u128> {
        self.slots.get(code as usize).map(|slot| slot.accumulated)
    }

    /// Time of the last start, stop or read
    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }
}
