use crate::error::{PaymentPlanError, Result};
use crate::schema::{Instrument, InstrumentId};
use crate::selection::SelectionState;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PlanId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanLine {
    pub id: InstrumentId,
    pub amount: Decimal,
    pub serial_no: String,
    pub bank_name: String,
    #[schemars(description = "Maturity date in YYYY-MM-DD format")]
    pub due_date: NaiveDate,
    pub client_name: String,
}

impl PlanLine {
    pub fn to_instrument(&self) -> Result<Instrument> {
        Ok(Instrument::new(self.id.clone(), self.amount, self.due_date)?
            .with_serial_no(self.serial_no.clone())
            .with_bank_name(self.bank_name.clone())
            .with_owner_label(self.client_name.clone()))
    }
}

impl From<&Instrument> for PlanLine {
    fn from(instrument: &Instrument) -> Self {
        Self {
            id: instrument.id().clone(),
            amount: instrument.amount(),
            serial_no: instrument.serial_no().to_string(),
            bank_name: instrument.bank_name().to_string(),
            due_date: instrument.due_date(),
            client_name: instrument.owner_label().to_string(),
        }
    }
}

/// A named settlement plan as handed to plan storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PaymentPlan {
    #[schemars(description = "Display name of the plan")]
    pub name: String,

    #[schemars(description = "Who receives the notes in settlement")]
    pub receiver_label: String,

    pub instruments: Vec<PlanLine>,
}

impl PaymentPlan {
    pub fn from_selection(
        name: impl Into<String>,
        receiver_label: impl Into<String>,
        selection: &SelectionState,
    ) -> Self {
        Self {
            name: name.into(),
            receiver_label: receiver_label.into(),
            instruments: selection.instruments().iter().map(PlanLine::from).collect(),
        }
    }

    pub fn total_amount(&self) -> Decimal {
        self.instruments.iter().map(|line| line.amount).sum()
    }

    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(PaymentPlan)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::json_schema())
    }
}

/// Storage collaborator for named plans.
pub trait PlanStore {
    fn save(&mut self, plan: &PaymentPlan) -> Result<PlanId>;
    fn load(&self, id: PlanId) -> Result<PaymentPlan>;
    fn list(&self) -> Result<Vec<PlanId>>;
}

#[derive(Debug, Default)]
pub struct InMemoryPlanStore {
    plans: BTreeMap<PlanId, PaymentPlan>,
    next_id: u64,
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlanStore for InMemoryPlanStore {
    fn save(&mut self, plan: &PaymentPlan) -> Result<PlanId> {
        self.next_id += 1;
        let id = PlanId(self.next_id);
        self.plans.insert(id, plan.clone());
        Ok(id)
    }

    fn load(&self, id: PlanId) -> Result<PaymentPlan> {
        self.plans
            .get(&id)
            .cloned()
            .ok_or(PaymentPlanError::PlanNotFound(id.0))
    }

    fn list(&self) -> Result<Vec<PlanId>> {
        Ok(self.plans.keys().copied().collect())
    }
}

/// Keeps each plan as `plan-<id>.json` inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFilePlanStore {
    dir: PathBuf,
}

impl JsonFilePlanStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: PlanId) -> PathBuf {
        self.dir.join(format!("plan-{}.json", id.0))
    }
}

fn parse_plan_file_name(name: &str) -> Option<PlanId> {
    name.strip_prefix("plan-")?
        .strip_suffix(".json")?
        .parse()
        .ok()
        .map(PlanId)
}

impl PlanStore for JsonFilePlanStore {
    fn save(&mut self, plan: &PaymentPlan) -> Result<PlanId> {
        let next = self.list()?.last().map(|id| id.0 + 1).unwrap_or(1);
        let id = PlanId(next);
        let json = serde_json::to_string_pretty(plan)?;
        fs::write(self.path_for(id), json)?;
        debug!("Saved plan '{}' as {}", plan.name, self.path_for(id).display());
        Ok(id)
    }

    fn load(&self, id: PlanId) -> Result<PaymentPlan> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(PaymentPlanError::PlanNotFound(id.0));
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn list(&self) -> Result<Vec<PlanId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(id) = entry.file_name().to_str().and_then(parse_plan_file_name) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
