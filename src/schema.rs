use crate::config::Tolerances;
use crate::error::{PaymentPlanError, Result};
use crate::utils::days_between;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct InstrumentId(pub String);

impl InstrumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for InstrumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentStatus {
    #[schemars(description = "Held in the company portfolio and available for a payment plan")]
    #[serde(alias = "portfolio")]
    InPortfolio,

    #[schemars(description = "Endorsed over to a third party")]
    Endorsed,

    #[schemars(description = "Already collected at maturity")]
    Collected,

    #[schemars(description = "Protested after a failed collection")]
    Protested,
}

impl Default for InstrumentStatus {
    fn default() -> Self {
        Self::InPortfolio
    }
}

/// A check or promissory note as delivered by the ERP collaborator.
///
/// This is the unvalidated wire shape; convert it with `Instrument::try_from`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstrumentRecord {
    #[schemars(description = "Unique identifier of the note in the ERP")]
    pub id: InstrumentId,

    #[schemars(description = "Face amount of the note. Must be greater than zero.")]
    pub amount: Decimal,

    #[schemars(description = "Maturity date in YYYY-MM-DD format")]
    pub due_date: NaiveDate,

    #[serde(default)]
    pub bank_name: String,

    #[serde(default)]
    pub serial_no: String,

    #[serde(default)]
    #[schemars(description = "Name of the client the note was received from")]
    pub client_name: String,

    #[serde(default)]
    pub status: InstrumentStatus,
}

/// A validated financial note. `amount` is always strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "InstrumentRecord", into = "InstrumentRecord")]
pub struct Instrument {
    id: InstrumentId,
    amount: Decimal,
    due_date: NaiveDate,
    bank_name: String,
    serial_no: String,
    owner_label: String,
    status: InstrumentStatus,
}

impl Instrument {
    pub fn new(id: impl Into<InstrumentId>, amount: Decimal, due_date: NaiveDate) -> Result<Self> {
        let id = id.into();
        if amount <= Decimal::ZERO {
            return Err(PaymentPlanError::InvalidAmount { id, amount });
        }

        Ok(Self {
            id,
            amount,
            due_date,
            bank_name: String::new(),
            serial_no: String::new(),
            owner_label: String::new(),
            status: InstrumentStatus::InPortfolio,
        })
    }

    pub fn with_bank_name(mut self, bank_name: impl Into<String>) -> Self {
        self.bank_name = bank_name.into();
        self
    }

    pub fn with_serial_no(mut self, serial_no: impl Into<String>) -> Self {
        self.serial_no = serial_no.into();
        self
    }

    pub fn with_owner_label(mut self, owner_label: impl Into<String>) -> Self {
        self.owner_label = owner_label.into();
        self
    }

    pub fn with_status(mut self, status: InstrumentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn id(&self) -> &InstrumentId {
        &self.id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn bank_name(&self) -> &str {
        &self.bank_name
    }

    pub fn serial_no(&self) -> &str {
        &self.serial_no
    }

    pub fn owner_label(&self) -> &str {
        &self.owner_label
    }

    pub fn status(&self) -> InstrumentStatus {
        self.status
    }

    /// Whole days from `now` until maturity. Negative for overdue notes.
    pub fn days_until(&self, now: NaiveDate) -> i64 {
        days_between(now, self.due_date)
    }
}

impl TryFrom<InstrumentRecord> for Instrument {
    type Error = PaymentPlanError;

    fn try_from(record: InstrumentRecord) -> Result<Self> {
        Ok(Instrument::new(record.id, record.amount, record.due_date)?
            .with_bank_name(record.bank_name)
            .with_serial_no(record.serial_no)
            .with_owner_label(record.client_name)
            .with_status(record.status))
    }
}

impl From<Instrument> for InstrumentRecord {
    fn from(instrument: Instrument) -> Self {
        Self {
            id: instrument.id,
            amount: instrument.amount,
            due_date: instrument.due_date,
            bank_name: instrument.bank_name,
            serial_no: instrument.serial_no,
            client_name: instrument.owner_label,
            status: instrument.status,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TargetRecord {
    amount: Decimal,
    #[serde(default)]
    date: Option<NaiveDate>,
}

/// What the user wants to settle: an amount, and optionally the date the
/// selected notes should mature around on average.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TargetRecord")]
pub struct Target {
    amount: Decimal,
    date: Option<NaiveDate>,
}

impl Target {
    pub fn new(amount: Decimal, date: Option<NaiveDate>) -> Result<Self> {
        if amount <= Decimal::ZERO {
            return Err(PaymentPlanError::InvalidTarget(amount));
        }
        Ok(Self { amount, date })
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Overshoot allowance under the default tolerances.
    pub fn max_overshoot(&self) -> Decimal {
        Tolerances::default().max_overshoot(self.amount)
    }

    pub fn target_days(&self, now: NaiveDate) -> Option<i64> {
        self.date.map(|date| days_between(now, date))
    }
}

impl TryFrom<TargetRecord> for Target {
    type Error = PaymentPlanError;

    fn try_from(record: TargetRecord) -> Result<Self> {
        Target::new(record.amount, record.date)
    }
}
