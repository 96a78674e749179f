use chrono::{Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Whole days from `from` to `to`. Negative when `to` is in the past.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Shifts `date` by a fractional number of days, rounded to the nearest whole day.
/// Returns `None` if the result falls outside the representable calendar.
pub fn offset_by_days(date: NaiveDate, days: f64) -> Option<NaiveDate> {
    if !days.is_finite() {
        return None;
    }

    let rounded = days.round();
    if rounded >= 0.0 {
        date.checked_add_days(Days::new(rounded as u64))
    } else {
        date.checked_sub_days(Days::new((-rounded) as u64))
    }
}

/// Sum of `amount` weighted by days-to-due, divided by the total amount.
/// Returns 0.0 when the total is zero.
pub fn weighted_average_days<I>(now: NaiveDate, items: I) -> f64
where
    I: IntoIterator<Item = (Decimal, NaiveDate)>,
{
    let mut weighted_sum = 0.0;
    let mut total = 0.0;

    for (amount, due_date) in items {
        let amount = decimal_to_f64(amount);
        weighted_sum += days_between(now, due_date) as f64 * amount;
        total += amount;
    }

    if total == 0.0 {
        0.0
    } else {
        weighted_sum / total
    }
}
