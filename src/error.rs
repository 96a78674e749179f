use crate::schema::InstrumentId;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentPlanError {
    #[error("Invalid amount {amount} for instrument {id}: must be greater than zero")]
    InvalidAmount { id: InstrumentId, amount: Decimal },

    #[error("Invalid target amount {0}: must be greater than zero")]
    InvalidTarget(Decimal),

    #[error("Duplicate instrument id: {0}")]
    DuplicateInstrument(InstrumentId),

    #[error("Instrument {0} is not present in the pool")]
    UnknownInstrument(InstrumentId),

    #[error("No target has been set for this planning session")]
    MissingTarget,

    #[error("Invalid planner configuration: {0}")]
    InvalidConfig(String),

    #[error("Plan {0} not found")]
    PlanNotFound(u64),

    #[error("Background optimization failed: {0}")]
    BackgroundTask(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PaymentPlanError>;
