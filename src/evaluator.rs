use crate::config::Tolerances;
use crate::schema::{Instrument, Target};
use crate::utils::{decimal_to_f64, weighted_average_days};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const AMOUNT_PENALTY_WEIGHT: f64 = 10_000.0;
pub const DATE_PENALTY_WEIGHT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub feasible: bool,
    /// Lower is better. `f64::INFINITY` for infeasible candidates.
    pub score: f64,
    pub total_amount: Decimal,
    pub weighted_avg_days: f64,
    /// Absolute distance to the target date, when one was given.
    pub date_deviation_days: Option<f64>,
}

impl ScoreResult {
    fn infeasible(total_amount: Decimal, weighted_avg_days: f64, deviation: Option<f64>) -> Self {
        Self {
            feasible: false,
            score: f64::INFINITY,
            total_amount,
            weighted_avg_days,
            date_deviation_days: deviation,
        }
    }
}

/// Scores candidate selections against a target. Pure: the result depends only
/// on the arguments.
#[derive(Debug, Clone, Default)]
pub struct ConstraintEvaluator {
    tolerances: Tolerances,
}

impl ConstraintEvaluator {
    pub fn new(tolerances: Tolerances) -> Self {
        Self { tolerances }
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    pub fn evaluate<'a, I>(&self, subset: I, target: &Target, now: NaiveDate) -> ScoreResult
    where
        I: IntoIterator<Item = &'a Instrument>,
    {
        let subset: Vec<&Instrument> = subset.into_iter().collect();
        if subset.is_empty() {
            return ScoreResult::infeasible(Decimal::ZERO, 0.0, None);
        }

        let total_amount: Decimal = subset.iter().map(|i| i.amount()).sum();
        let weighted_avg_days =
            weighted_average_days(now, subset.iter().map(|i| (i.amount(), i.due_date())));
        let deviation = target
            .target_days(now)
            .map(|days| (weighted_avg_days - days as f64).abs());

        if total_amount > self.tolerances.amount_ceiling(target.amount()) {
            return ScoreResult::infeasible(total_amount, weighted_avg_days, deviation);
        }

        if let Some(dev) = deviation {
            if dev > self.tolerances.max_date_deviation_days {
                return ScoreResult::infeasible(total_amount, weighted_avg_days, deviation);
            }
        }

        let amount_gap = decimal_to_f64((total_amount - target.amount()).abs())
            / decimal_to_f64(target.amount());
        let amount_penalty = amount_gap * AMOUNT_PENALTY_WEIGHT;
        let date_penalty = deviation.unwrap_or(0.0) * DATE_PENALTY_WEIGHT;

        ScoreResult {
            feasible: true,
            score: amount_penalty + date_penalty,
            total_amount,
            weighted_avg_days,
            date_deviation_days: deviation,
        }
    }
}

/// Evaluates with the default tolerances.
pub fn evaluate<'a, I>(subset: I, target: &Target, now: NaiveDate) -> ScoreResult
where
    I: IntoIterator<Item = &'a Instrument>,
{
    ConstraintEvaluator::default().evaluate(subset, target, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use rust_decimal_macros::dec;

    fn now() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn note(id: &str, amount: Decimal, days: u64) -> Instrument {
        Instrument::new(id, amount, now().checked_add_days(Days::new(days)).unwrap()).unwrap()
    }

    fn target(amount: Decimal, days: Option<u64>) -> Target {
        Target::new(amount, days.map(|d| now().checked_add_days(Days::new(d)).unwrap())).unwrap()
    }

    #[test]
    fn test_empty_subset_is_infeasible() {
        let result = evaluate(Vec::<&Instrument>::new(), &target(dec!(7000), Some(10)), now());
        assert!(!result.feasible);
        assert!(result.score.is_infinite());
    }

    #[test]
    fn test_exact_match_scores_zero() {
        let a = note("A", dec!(3000), 10);
        let b = note("B", dec!(4000), 10);
        let result = evaluate([&a, &b], &target(dec!(7000), Some(10)), now());
        assert!(result.feasible);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.total_amount, dec!(7000));
    }

    #[test]
    fn test_weighted_date_penalty() {
        let a = note("A", dec!(3000), 10);
        let b = note("B", dec!(4000), 12);
        let result = evaluate([&a, &b], &target(dec!(7000), Some(10)), now());
        assert!(result.feasible);
        assert!((result.weighted_avg_days - 78.0 / 7.0).abs() < 1e-9);
        let expected = (78.0 / 7.0 - 10.0) * 100.0;
        assert!((result.score - expected).abs() < 1e-6);
    }

    #[test]
    fn test_overshoot_is_hard_constraint() {
        // Ceiling for 7000 is 7350.
        let within = note("A", dec!(7350), 10);
        let over = note("B", dec!(7350.01), 10);
        let t = target(dec!(7000), None);

        assert!(evaluate([&within], &t, now()).feasible);
        let result = evaluate([&over], &t, now());
        assert!(!result.feasible);
        assert!(result.score.is_infinite());
    }

    #[test]
    fn test_date_deviation_is_hard_constraint() {
        let a = note("A", dec!(7000), 16);
        let result = evaluate([&a], &target(dec!(7000), Some(10)), now());
        assert!(!result.feasible);
        assert_eq!(result.date_deviation_days, Some(6.0));

        let b = note("B", dec!(7000), 15);
        assert!(evaluate([&b], &target(dec!(7000), Some(10)), now()).feasible);
    }

    #[test]
    fn test_undershoot_only_penalized() {
        let a = note("A", dec!(700), 400);
        let result = evaluate([&a], &target(dec!(7000), None), now());
        assert!(result.feasible);
        assert!((result.score - 9000.0).abs() < 1e-6);
        assert_eq!(result.date_deviation_days, None);
    }

    #[test]
    fn test_custom_tolerances() {
        let evaluator = ConstraintEvaluator::new(Tolerances {
            max_date_deviation_days: 1.0,
            ..Tolerances::default()
        });
        let a = note("A", dec!(7000), 12);
        assert!(!evaluator
            .evaluate([&a], &target(dec!(7000), Some(10)), now())
            .feasible);
    }
}
