//! Net cash flow lookups over a snapshot's contribution and event records.
//!
//! Withdrawal-kind records always subtract; deposits add. All functions are
//! pure sums over the borrowed snapshot.

use super::types::{CalendarMonth, Snapshot};

pub fn monthly_one_time_flow(snapshot: &Snapshot, year: i32, month0: u32) -> f64 {
    snapshot
        .one_time_events
        .iter()
        .filter(|event| event.year == year && event.month.checked_sub(1) == Some(month0))
        .map(|event| event.kind.signed(event.amount))
        .sum()
}

pub fn monthly_recurring_flow(snapshot: &Snapshot, year: i32, month0: u32) -> f64 {
    snapshot
        .recurring_events
        .iter()
        .filter(|event| event.is_active_in_year(year) && event.periodicity.fires_in(month0))
        .map(|event| event.kind.signed(event.period_amount))
        .sum()
}

pub fn annual_one_time_flow(snapshot: &Snapshot, year: i32) -> f64 {
    snapshot
        .one_time_events
        .iter()
        .filter(|event| event.year == year)
        .map(|event| event.kind.signed(event.amount))
        .sum()
}

pub fn annual_recurring_flow(snapshot: &Snapshot, year: i32) -> f64 {
    snapshot
        .recurring_events
        .iter()
        .filter(|event| event.is_active_in_year(year))
        .map(|event| {
            event.kind.signed(event.period_amount) * event.periodicity.occurrences_per_year() as f64
        })
        .sum()
}

/// Sum of `monthly_amount` over deposits active in `month`.
pub fn monthly_deposit_contributions(snapshot: &Snapshot, month: CalendarMonth) -> f64 {
    snapshot
        .deposits
        .iter()
        .filter(|deposit| deposit.is_active_in(month))
        .map(|deposit| deposit.monthly_amount)
        .sum()
}

/// Twelve months of contributions for every deposit whose calendar years
/// bracket `year`.
pub fn annual_deposit_contributions(snapshot: &Snapshot, year: i32) -> f64 {
    snapshot
        .deposits
        .iter()
        .filter(|deposit| deposit.is_active_in_year(year))
        .map(|deposit| deposit.monthly_amount * 12.0)
        .sum()
}

/// Everything that lands in `month` besides investment growth.
pub fn monthly_net_flow(snapshot: &Snapshot, month: CalendarMonth) -> f64 {
    let (year, month0) = (month.year(), month.month0());
    monthly_deposit_contributions(snapshot, month)
        + monthly_recurring_flow(snapshot, year, month0)
        + monthly_one_time_flow(snapshot, year, month0)
}

pub fn annual_net_flow(snapshot: &Snapshot, year: i32) -> f64 {
    annual_deposit_contributions(snapshot, year)
        + annual_recurring_flow(snapshot, year)
        + annual_one_time_flow(snapshot, year)
}
