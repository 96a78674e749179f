use crate::error::{PaymentPlanError, Result};
use crate::pool::InstrumentPool;
use crate::schema::{Instrument, InstrumentId};
use crate::store::PaymentPlan;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// The notes currently chosen for a plan, in selection order. Ids never repeat.
///
/// Nothing is recomputed on change; callers run the summary themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    instruments: Vec<Instrument>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a selection straight from a stored plan, without consulting a pool.
    pub fn from_plan(plan: &PaymentPlan) -> Result<Self> {
        let instruments = plan
            .instruments
            .iter()
            .map(|line| line.to_instrument())
            .collect::<Result<Vec<_>>>()?;

        let mut state = Self::new();
        state.replace(instruments)?;
        Ok(state)
    }

    pub fn toggle(&mut self, pool: &InstrumentPool, id: &InstrumentId) -> Result<ToggleOutcome> {
        if let Some(pos) = self.instruments.iter().position(|i| i.id() == id) {
            self.instruments.remove(pos);
            return Ok(ToggleOutcome::Removed);
        }

        let instrument = pool
            .get(id)
            .ok_or_else(|| PaymentPlanError::UnknownInstrument(id.clone()))?;
        self.instruments.push(instrument.clone());
        Ok(ToggleOutcome::Added)
    }

    /// Overwrites the whole selection. Fails without modifying anything if an
    /// id appears twice.
    pub fn replace(&mut self, instruments: Vec<Instrument>) -> Result<()> {
        let mut seen = HashSet::new();
        for instrument in &instruments {
            if !seen.insert(instrument.id()) {
                return Err(PaymentPlanError::DuplicateInstrument(instrument.id().clone()));
            }
        }
        self.instruments = instruments;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.instruments.clear();
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn ids(&self) -> Vec<&InstrumentId> {
        self.instruments.iter().map(|i| i.id()).collect()
    }

    pub fn contains(&self, id: &InstrumentId) -> bool {
        self.instruments.iter().any(|i| i.id() == id)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Selected ids that no longer exist in `pool`.
    pub fn stale_ids(&self, pool: &InstrumentPool) -> Vec<InstrumentId> {
        self.instruments
            .iter()
            .filter(|i| !pool.contains(i.id()))
            .map(|i| i.id().clone())
            .collect()
    }

    /// Drops selected notes missing from `pool`. Returns how many were dropped.
    pub fn retain_in(&mut self, pool: &InstrumentPool) -> usize {
        let before = self.instruments.len();
        self.instruments.retain(|i| pool.contains(i.id()));
        before - self.instruments.len()
    }
}
