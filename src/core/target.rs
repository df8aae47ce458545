use chrono::Datelike;

use super::types::{Deposit, Snapshot};

/// Blended return used when there are no deposits to weight.
pub const DEFAULT_ANNUAL_RETURN: f64 = 0.07;

/// Nominal capital needed in `year` to fund perpetual spending at the safe
/// withdrawal rate plus the remaining face value of every time-bounded
/// obligation that has not yet ended.
///
/// Variable expenses are not inflated: they are nominal contracted amounts.
pub fn fire_target(snapshot: &Snapshot, year: i32, cumulative_inflation: f64) -> f64 {
    let basics = &snapshot.basics;
    let perpetual =
        basics.annual_expenses * cumulative_inflation / (basics.withdrawal_rate / 100.0);

    let sinking_fund: f64 = snapshot
        .variable_expenses
        .iter()
        .filter(|expense| expense.end_year >= year)
        .filter_map(|expense| {
            let remaining_years = expense.end_year - year.max(expense.start_year) + 1;
            (remaining_years > 0).then(|| expense.monthly_amount * 12.0 * remaining_years as f64)
        })
        .sum();

    perpetual + sinking_fund
}

/// Contribution-weighted mean of expected returns over the deposits that pass
/// `eligible`, as a fraction.
///
/// Zero total weight falls back to the plain mean over all deposits; no
/// deposits at all falls back to [`DEFAULT_ANNUAL_RETURN`].
pub fn blended_annual_return(deposits: &[Deposit], eligible: impl Fn(&Deposit) -> bool) -> f64 {
    let (weight, weighted) = deposits
        .iter()
        .filter(|deposit| eligible(deposit))
        .fold((0.0, 0.0), |(weight, weighted), deposit| {
            (
                weight + deposit.monthly_amount,
                weighted + deposit.monthly_amount * deposit.expected_annual_return / 100.0,
            )
        });

    if weight > 0.0 {
        weighted / weight
    } else if !deposits.is_empty() {
        let sum: f64 = deposits.iter().map(|d| d.expected_annual_return).sum();
        sum / deposits.len() as f64 / 100.0
    } else {
        DEFAULT_ANNUAL_RETURN
    }
}

/// Blended return for the deterministic projector: deposits starting no later
/// than the end of the calendar year `horizon_end_year`.
pub fn projection_blended_return(snapshot: &Snapshot, horizon_end_year: i32) -> f64 {
    blended_annual_return(&snapshot.deposits, |deposit| {
        deposit.start_date.year() <= horizon_end_year
    })
}

pub fn monthly_rate(annual: f64) -> f64 {
    (1.0 + annual).powf(1.0 / 12.0) - 1.0
}
