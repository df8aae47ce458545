use std::collections::HashSet;
use std::ops::RangeInclusive;

use thiserror::Error;

use super::types::Snapshot;

pub const MAX_AGE: u32 = 120;
/// Calendar years a simulation may start in.
pub const BASE_YEARS: RangeInclusive<i32> = 1900..=2200;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    #[error("withdrawal rate must be > 0, got {0}")]
    NonPositiveWithdrawalRate(f64),
    #[error("{field} must be a finite number")]
    NonFinite { field: String },
    #[error("{field} must be <= {max}, got {value}", max = MAX_AGE)]
    AgeOutOfRange { field: &'static str, value: u32 },
    #[error("one-time event {id}: month must be between 1 and 12, got {month}")]
    MonthOutOfRange { id: u64, month: u32 },
    #[error("duplicate {collection} id {id}")]
    DuplicateId { collection: &'static str, id: u64 },
    #[error("{collection} {id}: end ({end}) precedes start ({start})")]
    InvertedWindow {
        collection: &'static str,
        id: u64,
        start: String,
        end: String,
    },
    #[error("deposit {id}: return standard deviation must be >= 0, got {value}")]
    NegativeStdDev { id: u64, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("trial count must be > 0")]
    NoTrials,
    #[error("simulation age cap must be <= {max}, got {0}", max = MAX_AGE)]
    AgeCapOutOfRange(u32),
    #[error(
        "base year must be between {lo} and {hi}, got {0}",
        lo = BASE_YEARS.start(),
        hi = BASE_YEARS.end()
    )]
    BaseYearOutOfRange(i32),
    #[error("simulation cancelled")]
    Cancelled,
}

fn check_finite(field: impl Into<String>, value: f64) -> Result<(), SnapshotError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SnapshotError::NonFinite {
            field: field.into(),
        })
    }
}

fn check_unique(
    collection: &'static str,
    ids: impl Iterator<Item = u64>,
) -> Result<(), SnapshotError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(SnapshotError::DuplicateId { collection, id });
        }
    }
    Ok(())
}

impl Snapshot {
    /// Rejects anything the simulators cannot run on. Called once, before any
    /// simulation starts.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let basics = &self.basics;
        for (field, value) in [
            ("withdrawalRate", basics.withdrawal_rate),
            ("annualInflation", basics.annual_inflation),
            ("annualIncome", basics.annual_income),
            ("annualExpenses", basics.annual_expenses),
            ("investedAmount", basics.invested_amount),
        ] {
            check_finite(field, value)?;
        }
        if basics.withdrawal_rate <= 0.0 {
            return Err(SnapshotError::NonPositiveWithdrawalRate(
                basics.withdrawal_rate,
            ));
        }
        for (field, value) in [
            ("currentAge", basics.current_age),
            ("retirementAge", basics.retirement_age),
        ] {
            if value > MAX_AGE {
                return Err(SnapshotError::AgeOutOfRange { field, value });
            }
        }

        check_unique("deposit", self.deposits.iter().map(|d| d.id))?;
        for deposit in &self.deposits {
            check_finite(format!("deposit {} monthlyAmount", deposit.id), deposit.monthly_amount)?;
            check_finite(
                format!("deposit {} expectedAnnualReturn", deposit.id),
                deposit.expected_annual_return,
            )?;
            if let Some(sd) = deposit.annual_return_std_dev {
                check_finite(format!("deposit {} annualReturnStdDev", deposit.id), sd)?;
                if sd < 0.0 {
                    return Err(SnapshotError::NegativeStdDev {
                        id: deposit.id,
                        value: sd,
                    });
                }
            }
            if deposit.end_date < deposit.start_date {
                return Err(SnapshotError::InvertedWindow {
                    collection: "deposit",
                    id: deposit.id,
                    start: deposit.start_date.to_string(),
                    end: deposit.end_date.to_string(),
                });
            }
        }

        check_unique("one-time event", self.one_time_events.iter().map(|e| e.id))?;
        for event in &self.one_time_events {
            check_finite(format!("one-time event {} amount", event.id), event.amount)?;
            if !(1..=12).contains(&event.month) {
                return Err(SnapshotError::MonthOutOfRange {
                    id: event.id,
                    month: event.month,
                });
            }
        }

        check_unique("recurring event", self.recurring_events.iter().map(|e| e.id))?;
        for event in &self.recurring_events {
            check_finite(
                format!("recurring event {} periodAmount", event.id),
                event.period_amount,
            )?;
            if event.end_year < event.start_year {
                return Err(SnapshotError::InvertedWindow {
                    collection: "recurring event",
                    id: event.id,
                    start: event.start_year.to_string(),
                    end: event.end_year.to_string(),
                });
            }
        }

        check_unique("variable expense", self.variable_expenses.iter().map(|e| e.id))?;
        for expense in &self.variable_expenses {
            check_finite(
                format!("variable expense {} monthlyAmount", expense.id),
                expense.monthly_amount,
            )?;
            if expense.end_year < expense.start_year {
                return Err(SnapshotError::InvertedWindow {
                    collection: "variable expense",
                    id: expense.id,
                    start: expense.start_year.to_string(),
                    end: expense.end_year.to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{
        BasicParams, Deposit, FlowKind, OneTimeEvent, RecurringEvent, Periodicity,
    };
    use chrono::NaiveDate;

    fn basics() -> BasicParams {
        BasicParams {
            withdrawal_rate: 4.0,
            annual_inflation: 2.0,
            current_age: 30,
            retirement_age: 50,
            annual_income: 50_000.0,
            annual_expenses: 20_000.0,
            invested_amount: 100_000.0,
        }
    }

    fn deposit(id: u64) -> Deposit {
        Deposit {
            id,
            label: "ETF".to_string(),
            monthly_amount: 500.0,
            expected_annual_return: 7.0,
            annual_return_std_dev: None,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2055, 1, 1).unwrap(),
            description: String::new(),
        }
    }

    #[test]
    fn valid_snapshot_passes() {
        let mut snapshot = Snapshot::new(basics());
        snapshot.deposits = vec![deposit(1), deposit(2)];
        assert_eq!(snapshot.validate(), Ok(()));
    }

    #[test]
    fn zero_withdrawal_rate_is_rejected() {
        let mut snapshot = Snapshot::new(basics());
        snapshot.basics.withdrawal_rate = 0.0;
        let err = snapshot.validate().expect_err("must reject zero rate");
        assert_eq!(err, SnapshotError::NonPositiveWithdrawalRate(0.0));
    }

    #[test]
    fn non_finite_inflation_is_rejected() {
        let mut snapshot = Snapshot::new(basics());
        snapshot.basics.annual_inflation = f64::NAN;
        let err = snapshot.validate().expect_err("must reject NaN");
        assert!(err.to_string().contains("annualInflation"));
    }

    #[test]
    fn retirement_before_current_age_is_allowed() {
        let mut snapshot = Snapshot::new(basics());
        snapshot.basics.retirement_age = 25;
        assert_eq!(snapshot.validate(), Ok(()));
        assert_eq!(snapshot.basics.horizon_years(), 1);
    }

    #[test]
    fn duplicate_deposit_ids_are_rejected() {
        let mut snapshot = Snapshot::new(basics());
        snapshot.deposits = vec![deposit(7), deposit(7)];
        assert_eq!(
            snapshot.validate(),
            Err(SnapshotError::DuplicateId {
                collection: "deposit",
                id: 7
            })
        );
    }

    #[test]
    fn inverted_deposit_window_is_rejected() {
        let mut snapshot = Snapshot::new(basics());
        let mut dep = deposit(1);
        dep.end_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        snapshot.deposits = vec![dep];
        let err = snapshot.validate().expect_err("must reject inverted window");
        assert!(err.to_string().contains("deposit 1"));
    }

    #[test]
    fn negative_std_dev_is_rejected() {
        let mut snapshot = Snapshot::new(basics());
        let mut dep = deposit(3);
        dep.annual_return_std_dev = Some(-1.0);
        snapshot.deposits = vec![dep];
        assert_eq!(
            snapshot.validate(),
            Err(SnapshotError::NegativeStdDev { id: 3, value: -1.0 })
        );
    }

    #[test]
    fn one_time_event_month_must_be_calendar_month() {
        let mut snapshot = Snapshot::new(basics());
        snapshot.one_time_events = vec![OneTimeEvent {
            id: 1,
            kind: FlowKind::Deposit,
            year: 2030,
            month: 13,
            amount: 1_000.0,
        }];
        assert_eq!(
            snapshot.validate(),
            Err(SnapshotError::MonthOutOfRange { id: 1, month: 13 })
        );
    }

    #[test]
    fn inverted_recurring_window_is_rejected() {
        let mut snapshot = Snapshot::new(basics());
        snapshot.recurring_events = vec![RecurringEvent {
            id: 4,
            kind: FlowKind::Withdrawal,
            periodicity: Periodicity::Annual,
            period_amount: 100.0,
            start_year: 2040,
            end_year: 2030,
        }];
        let err = snapshot.validate().expect_err("must reject");
        assert!(err.to_string().contains("recurring event 4"));
    }
}
