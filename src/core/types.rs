use std::ops::Range;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowKind {
    Deposit,
    #[serde(alias = "withdraw")]
    Withdrawal,
}

impl FlowKind {
    pub fn signed(self, amount: f64) -> f64 {
        match self {
            FlowKind::Deposit => amount,
            FlowKind::Withdrawal => -amount,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Periodicity {
    Monthly,
    Quarterly,
    #[serde(alias = "semi-annual", alias = "semiAnnual")]
    Semiannual,
    #[serde(alias = "yearly")]
    Annual,
}

impl Periodicity {
    pub fn occurrences_per_year(self) -> u32 {
        match self {
            Periodicity::Monthly => 12,
            Periodicity::Quarterly => 4,
            Periodicity::Semiannual => 2,
            Periodicity::Annual => 1,
        }
    }

    /// Whether a payment falls in the zero-based month `month0`.
    pub fn fires_in(self, month0: u32) -> bool {
        match self {
            Periodicity::Monthly => true,
            Periodicity::Quarterly => month0 % 3 == 0,
            Periodicity::Semiannual => month0 % 6 == 0,
            Periodicity::Annual => month0 == 0,
        }
    }
}

/// A calendar month as a single ordinal (`year * 12 + month0`), so month
/// windows become plain half-open integer ranges.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CalendarMonth(i32);

impl CalendarMonth {
    pub fn new(year: i32, month0: u32) -> Self {
        debug_assert!(month0 < 12);
        Self(year * 12 + month0 as i32)
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month0())
    }

    /// The first month whose 1st day is on or after `date`.
    pub fn first_starting_on_or_after(date: NaiveDate) -> Self {
        let month = Self::containing(date);
        if date.day() == 1 { month } else { month.next() }
    }

    pub fn year(self) -> i32 {
        self.0.div_euclid(12)
    }

    pub fn month0(self) -> u32 {
        self.0.rem_euclid(12) as u32
    }

    pub fn is_december(self) -> bool {
        self.month0() == 11
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn offset(self, months: i32) -> Self {
        Self(self.0 + months)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicParams {
    /// Safe withdrawal rate, percent.
    pub withdrawal_rate: f64,
    /// Percent per year.
    pub annual_inflation: f64,
    pub current_age: u32,
    pub retirement_age: u32,
    pub annual_income: f64,
    /// Perpetual spending in today's money.
    pub annual_expenses: f64,
    pub invested_amount: f64,
}

impl BasicParams {
    /// Years simulated by the deterministic and stress paths, never below one.
    pub fn horizon_years(&self) -> u32 {
        self.retirement_age.saturating_sub(self.current_age).max(1)
    }
}

pub const DEFAULT_RETURN_STD_DEV: f64 = 15.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub id: u64,
    pub label: String,
    pub monthly_amount: f64,
    /// Percent per year.
    pub expected_annual_return: f64,
    /// Percent per year; [`DEFAULT_RETURN_STD_DEV`] when absent or zero.
    #[serde(default)]
    pub annual_return_std_dev: Option<f64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub description: String,
}

impl Deposit {
    /// A missing or zero spread both mean [`DEFAULT_RETURN_STD_DEV`].
    pub fn std_dev(&self) -> f64 {
        self.annual_return_std_dev
            .filter(|sd| *sd > 0.0)
            .unwrap_or(DEFAULT_RETURN_STD_DEV)
    }

    /// Months whose first day lies within `[start_date, end_date]`.
    pub fn active_months(&self) -> Range<CalendarMonth> {
        CalendarMonth::first_starting_on_or_after(self.start_date)
            ..CalendarMonth::containing(self.end_date).next()
    }

    pub fn is_active_in(&self, month: CalendarMonth) -> bool {
        self.active_months().contains(&month)
    }

    pub fn is_active_in_year(&self, year: i32) -> bool {
        (self.start_date.year()..=self.end_date.year()).contains(&year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneTimeEvent {
    pub id: u64,
    pub kind: FlowKind,
    pub year: i32,
    /// 1-12.
    pub month: u32,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringEvent {
    pub id: u64,
    pub kind: FlowKind,
    pub periodicity: Periodicity,
    pub period_amount: f64,
    pub start_year: i32,
    pub end_year: i32,
}

impl RecurringEvent {
    pub fn is_active_in_year(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableExpense {
    pub id: u64,
    #[serde(default)]
    pub description: String,
    pub monthly_amount: f64,
    pub start_year: i32,
    pub end_year: i32,
}

/// Everything a simulation reads. Simulators borrow it immutably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub basics: BasicParams,
    #[serde(default)]
    pub deposits: Vec<Deposit>,
    #[serde(default)]
    pub one_time_events: Vec<OneTimeEvent>,
    #[serde(default)]
    pub recurring_events: Vec<RecurringEvent>,
    #[serde(default)]
    pub variable_expenses: Vec<VariableExpense>,
}

impl Snapshot {
    pub fn new(basics: BasicParams) -> Self {
        Self {
            basics,
            deposits: Vec::new(),
            one_time_events: Vec::new(),
            recurring_events: Vec::new(),
            variable_expenses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    pub nominal: f64,
    pub real: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualPoint {
    pub year: i32,
    pub nominal: f64,
    pub real: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NominalPoint {
    pub year: i32,
    pub nominal: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireAchievement {
    pub year: i32,
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub monthly: Vec<MonthlyPoint>,
    pub annual: Vec<AnnualPoint>,
    pub achievement: Option<FireAchievement>,
    /// `None` when the horizon ends before the target is reached.
    pub years_to_fire: Option<u32>,
    pub fire_age: Option<u32>,
    /// Target at achievement, or at the end of the horizon when unreached.
    pub required_capital: f64,
    pub nominal_return_pct: f64,
    pub real_return_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireAgePercentiles {
    /// `None` means fewer than the required share of trials ever reached FIRE.
    pub p10: Option<u32>,
    pub p50: Option<u32>,
    pub p90: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloSummary {
    pub trials: u32,
    pub planned_retirement_year: i32,
    /// False when the planned retirement December lies past the age cap, in
    /// which case every terminal wealth reads 0.
    pub planned_retirement_reached: bool,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub success_target: f64,
    /// Percent of trials at or above `success_target`.
    pub success_rate: f64,
    pub fire_age: FireAgePercentiles,
    pub trials_reaching_fire: u32,
    /// Ascending.
    pub terminal_wealth: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StressReport {
    pub stress_years: u32,
    pub stress_return_pct: f64,
    pub baseline_return_pct: f64,
    pub stressed: Vec<NominalPoint>,
    pub baseline: Vec<NominalPoint>,
}
