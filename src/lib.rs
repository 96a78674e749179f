//! # Payment Plan Builder
//!
//! A library for picking which portfolio checks and promissory notes to hand over
//! in settlement of a payment, so that the total lands close to a target amount
//! and the amount-weighted average maturity lands close to a target date.
//!
//! ## Core Concepts
//!
//! - **Instrument**: A note with a face amount and a due date
//! - **Pool**: The notes currently in the portfolio, sorted by due date
//! - **Target**: The amount to settle and, optionally, the date the notes should mature around
//! - **Overshoot**: How far above the target the total may go (5%, capped at 200,000 for targets of 5,000,000 or more)
//! - **Date deviation**: Distance between the weighted average maturity and the target date (at most 5 days)
//! - **Search**: Randomized multi-start greedy rounds, keeping the best feasible selection found
//!
//! ## Example
//!
//! ```rust,ignore
//! use payment_plan_builder::*;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let now = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let pool = pool_from_json(&std::fs::read_to_string("portfolio.json")?)?;
//! let target = Target::new(dec!(250_000), NaiveDate::from_ymd_opt(2024, 3, 1))?;
//!
//! let config = PlannerConfig {
//!     seed: Some(42),
//!     ..PlannerConfig::default()
//! };
//!
//! let result = plan_payment(&pool, &target, now, &config)?;
//! if result.feasible {
//!     let summary = SummaryCalculator::summarize(&result.selection, now);
//!     println!("{} notes totalling {}", summary.count, summary.total_amount);
//! }
//! ```

#[cfg(feature = "async")]
pub mod background;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod ingestion;
pub mod optimizer;
pub mod pool;
pub mod schema;
pub mod selection;
pub mod session;
pub mod store;
pub mod summary;
pub mod utils;

#[cfg(feature = "async")]
pub use background::{spawn_optimization, OptimizationHandle};
pub use config::{PlannerConfig, Tolerances};
pub use error::{PaymentPlanError, Result};
pub use evaluator::{evaluate, ConstraintEvaluator, ScoreResult};
pub use ingestion::*;
pub use optimizer::{Candidate, OptimizationResult, SelectionOptimizer, SelectionSearch};
pub use pool::InstrumentPool;
pub use schema::*;
pub use selection::{SelectionState, ToggleOutcome};
pub use session::{PlanningSession, SessionPhase};
pub use store::{InMemoryPlanStore, JsonFilePlanStore, PaymentPlan, PlanId, PlanLine, PlanStore};
pub use summary::{SelectionSummary, SummaryCalculator, TargetDiff};
pub use utils::*;

use chrono::NaiveDate;
use log::{debug, info};

pub struct PaymentPlanner {
    optimizer: SelectionOptimizer,
}

impl PaymentPlanner {
    pub fn new(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            optimizer: SelectionOptimizer::new(config),
        })
    }

    pub fn plan(
        &self,
        pool: &InstrumentPool,
        target: &Target,
        now: NaiveDate,
    ) -> Result<OptimizationResult> {
        info!(
            "Planning payment of {} from {} instruments (pool total {})",
            target.amount(),
            pool.len(),
            pool.total_amount()
        );
        debug!(
            "Overshoot allowance {}, target date {:?}",
            self.optimizer
                .config()
                .tolerances
                .max_overshoot(target.amount()),
            target.date()
        );

        Ok(self.optimizer.run(pool, target, now))
    }

    /// Plans and immediately summarizes the result.
    pub fn plan_with_summary(
        &self,
        pool: &InstrumentPool,
        target: &Target,
        now: NaiveDate,
    ) -> Result<(OptimizationResult, SelectionSummary)> {
        let result = self.plan(pool, target, now)?;
        let summary = SummaryCalculator::summarize(&result.selection, now);
        Ok((result, summary))
    }
}

pub fn plan_payment(
    pool: &InstrumentPool,
    target: &Target,
    now: NaiveDate,
    config: &PlannerConfig,
) -> Result<OptimizationResult> {
    PaymentPlanner::new(config.clone())?.plan(pool, target, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use rust_decimal_macros::dec;

    fn now() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn pool() -> InstrumentPool {
        let in_days = |d| now().checked_add_days(Days::new(d)).unwrap();
        InstrumentPool::new(vec![
            Instrument::new("A", dec!(3000), in_days(10)).unwrap(),
            Instrument::new("B", dec!(4000), in_days(12)).unwrap(),
            Instrument::new("C", dec!(3200), in_days(8)).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_end_to_end_planning() {
        let config = PlannerConfig {
            seed: Some(1),
            ..PlannerConfig::default()
        };
        let target = Target::new(dec!(7000), now().checked_add_days(Days::new(10))).unwrap();

        let planner = PaymentPlanner::new(config).unwrap();
        let (result, summary) = planner.plan_with_summary(&pool(), &target, now()).unwrap();

        assert!(result.feasible);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_amount, dec!(7000));
        assert_eq!(summary.avg_due_date, now().checked_add_days(Days::new(11)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PlannerConfig {
            workers: 0,
            ..PlannerConfig::default()
        };
        let target = Target::new(dec!(7000), None).unwrap();
        let result = plan_payment(&pool(), &target, now(), &config);
        assert!(matches!(result, Err(PaymentPlanError::InvalidConfig(_))));
    }
}
