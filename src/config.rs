use crate::error::{PaymentPlanError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ITERATIONS: usize = 1000;
pub const DEFAULT_MAX_DATE_DEVIATION_DAYS: f64 = 5.0;

/// Hard limits a candidate selection must respect to be considered feasible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Tolerances {
    #[schemars(
        description = "Target amounts at or above this value use the fixed overshoot cap instead of the ratio"
    )]
    pub large_target_threshold: Decimal,

    #[schemars(description = "Fixed overshoot allowance for large targets")]
    pub large_target_overshoot: Decimal,

    #[schemars(description = "Overshoot allowance as a fraction of the target amount (0.05 = 5%)")]
    pub overshoot_ratio: Decimal,

    #[schemars(
        description = "Maximum distance in days between the weighted average maturity and the target date"
    )]
    pub max_date_deviation_days: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            large_target_threshold: dec!(5_000_000),
            large_target_overshoot: dec!(200_000),
            overshoot_ratio: dec!(0.05),
            max_date_deviation_days: DEFAULT_MAX_DATE_DEVIATION_DAYS,
        }
    }
}

impl Tolerances {
    pub fn max_overshoot(&self, target_amount: Decimal) -> Decimal {
        if target_amount >= self.large_target_threshold {
            self.large_target_overshoot
        } else {
            target_amount * self.overshoot_ratio
        }
    }

    /// Largest total a feasible selection may reach for this target amount.
    pub fn amount_ceiling(&self, target_amount: Decimal) -> Decimal {
        target_amount + self.max_overshoot(target_amount)
    }

    pub fn validate(&self) -> Result<()> {
        if self.large_target_threshold < Decimal::ZERO || self.large_target_overshoot < Decimal::ZERO {
            return Err(PaymentPlanError::InvalidConfig(
                "Overshoot threshold and cap must be non-negative".to_string(),
            ));
        }

        if self.overshoot_ratio < Decimal::ZERO || self.overshoot_ratio > Decimal::ONE {
            return Err(PaymentPlanError::InvalidConfig(format!(
                "Overshoot ratio {} must be between 0 and 1",
                self.overshoot_ratio
            )));
        }

        if !self.max_date_deviation_days.is_finite() || self.max_date_deviation_days < 0.0 {
            return Err(PaymentPlanError::InvalidConfig(format!(
                "Maximum date deviation {} must be a non-negative number of days",
                self.max_date_deviation_days
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PlannerConfig {
    #[schemars(description = "Number of randomized greedy rounds per optimization run")]
    pub iterations: usize,

    #[schemars(
        description = "Number of parallel workers the rounds are split across. 1 runs sequentially."
    )]
    pub workers: usize,

    #[schemars(
        description = "Seed for the random search. Leave empty to seed from system entropy."
    )]
    pub seed: Option<u64>,

    pub tolerances: Tolerances,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            workers: 1,
            seed: None,
            tolerances: Tolerances::default(),
        }
    }
}

impl PlannerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlannerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(PaymentPlanError::InvalidConfig(
                "iterations must be greater than zero".to_string(),
            ));
        }

        if self.workers == 0 {
            return Err(PaymentPlanError::InvalidConfig(
                "workers must be greater than zero".to_string(),
            ));
        }

        self.tolerances.validate()
    }

    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(PlannerConfig)
    }
}
