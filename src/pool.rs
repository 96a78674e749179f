use crate::error::{PaymentPlanError, Result};
use crate::schema::{Instrument, InstrumentId, InstrumentStatus};
use log::debug;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// Read-only snapshot of the notes available for a planning session.
///
/// Instruments are kept in due-date ascending order (ties by id) so that every
/// consumer iterates them deterministically.
#[derive(Debug, Clone, Default)]
pub struct InstrumentPool {
    instruments: Vec<Instrument>,
    index: HashMap<InstrumentId, usize>,
}

impl InstrumentPool {
    pub fn new(instruments: Vec<Instrument>) -> Result<Self> {
        let received = instruments.len();
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(received);

        for instrument in instruments {
            if instrument.status() != InstrumentStatus::InPortfolio {
                debug!(
                    "Skipping instrument {} with status {:?}",
                    instrument.id(),
                    instrument.status()
                );
                continue;
            }

            if !seen.insert(instrument.id().clone()) {
                return Err(PaymentPlanError::DuplicateInstrument(instrument.id().clone()));
            }
            kept.push(instrument);
        }

        kept.sort_by(|a, b| {
            a.due_date()
                .cmp(&b.due_date())
                .then_with(|| a.id().cmp(b.id()))
        });

        let index = kept
            .iter()
            .enumerate()
            .map(|(i, instrument)| (instrument.id().clone(), i))
            .collect();

        debug!(
            "Loaded instrument pool with {} of {} received instruments",
            kept.len(),
            received
        );

        Ok(Self {
            instruments: kept,
            index,
        })
    }

    pub fn all(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Case-insensitive substring match on the serial number.
    pub fn filter_by_serial(&self, needle: &str) -> Vec<&Instrument> {
        let needle = needle.to_lowercase();
        self.instruments
            .iter()
            .filter(|i| i.serial_no().to_lowercase().contains(&needle))
            .collect()
    }

    pub fn get(&self, id: &InstrumentId) -> Option<&Instrument> {
        self.index.get(id).map(|&i| &self.instruments[i])
    }

    pub fn contains(&self, id: &InstrumentId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn total_amount(&self) -> Decimal {
        self.instruments.iter().map(|i| i.amount()).sum()
    }
}
