use crate::schema::{Instrument, Target};
use crate::utils::{offset_by_days, weighted_average_days};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate figures shown for a selection and handed to the report generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub count: usize,
    pub total_amount: Decimal,
    pub weighted_avg_days: f64,
    pub avg_due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDiff {
    /// Selected total minus the target amount. Negative means undershoot.
    pub amount_diff: Decimal,
    /// Weighted average days minus target days, when the target has a date.
    pub days_diff: Option<f64>,
}

impl SelectionSummary {
    pub fn empty() -> Self {
        Self {
            count: 0,
            total_amount: Decimal::ZERO,
            weighted_avg_days: 0.0,
            avg_due_date: None,
        }
    }

    pub fn diff_from_target(&self, target: &Target, now: NaiveDate) -> TargetDiff {
        TargetDiff {
            amount_diff: self.total_amount - target.amount(),
            days_diff: target
                .target_days(now)
                .map(|days| self.weighted_avg_days - days as f64),
        }
    }
}

pub struct SummaryCalculator;

impl SummaryCalculator {
    pub fn summarize(selection: &[Instrument], now: NaiveDate) -> SelectionSummary {
        if selection.is_empty() {
            return SelectionSummary::empty();
        }

        let total_amount: Decimal = selection.iter().map(|i| i.amount()).sum();
        let weighted_avg_days =
            weighted_average_days(now, selection.iter().map(|i| (i.amount(), i.due_date())));

        SelectionSummary {
            count: selection.len(),
            total_amount,
            weighted_avg_days,
            avg_due_date: offset_by_days(now, weighted_avg_days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use rust_decimal_macros::dec;

    fn now() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_empty_selection() {
        let summary = SummaryCalculator::summarize(&[], now());
        assert_eq!(summary, SelectionSummary::empty());
        assert_eq!(summary.count, 0);
        assert_eq!(summary.total_amount, Decimal::ZERO);
        assert_eq!(summary.weighted_avg_days, 0.0);
        assert!(summary.avg_due_date.is_none());
    }

    #[test]
    fn test_summary_and_diff() {
        let selection = vec![
            Instrument::new("A", dec!(3000), now().checked_add_days(Days::new(10)).unwrap())
                .unwrap(),
            Instrument::new("B", dec!(4000), now().checked_add_days(Days::new(12)).unwrap())
                .unwrap(),
        ];

        let summary = SummaryCalculator::summarize(&selection, now());
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_amount, dec!(7000));
        assert!((summary.weighted_avg_days - 78.0 / 7.0).abs() < 1e-9);
        assert_eq!(summary.avg_due_date, NaiveDate::from_ymd_opt(2024, 1, 12));

        let target = Target::new(dec!(7500), NaiveDate::from_ymd_opt(2024, 1, 11)).unwrap();
        let diff = summary.diff_from_target(&target, now());
        assert_eq!(diff.amount_diff, dec!(-500));
        assert!((diff.days_diff.unwrap() - (78.0 / 7.0 - 10.0)).abs() < 1e-9);

        let undated = Target::new(dec!(7000), None).unwrap();
        assert_eq!(summary.diff_from_target(&undated, now()).days_diff, None);
    }
}
