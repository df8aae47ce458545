use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::cashflow::monthly_net_flow;
use super::error::{BASE_YEARS, MAX_AGE, SimulationError};
use super::random::{Gaussian, trial_rng};
use super::target::{fire_target, monthly_rate};
use super::types::{CalendarMonth, Deposit, FireAgePercentiles, MonteCarloSummary, Snapshot};

pub const DEFAULT_TRIALS: u32 = 1000;
pub const DEFAULT_SEED: u64 = 42;
pub const MAX_SIMULATED_AGE: u32 = 85;

// Portfolio-free draw when no deposit carries weight.
const FALLBACK_RETURN_MEAN: f64 = 0.06;
const FALLBACK_RETURN_STD_DEV: f64 = 0.10;
// Keeps (1 + r)^(1/12) real.
const ANNUAL_RETURN_FLOOR: f64 = -0.95;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonteCarloConfig {
    pub trials: u32,
    pub seed: u64,
    /// Age at which every trial stops, whatever the planned retirement age.
    pub max_age: u32,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: DEFAULT_SEED,
            max_age: MAX_SIMULATED_AGE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TrialPlan {
    start: CalendarMonth,
    horizon_months: u32,
    planned_retirement_year: i32,
    inflation_growth: f64,
}

#[derive(Debug, Clone, Copy)]
struct TrialOutcome {
    planned_retirement_wealth: f64,
    fire_age: Option<u32>,
}

/// Runs `config.trials` independent randomized-return paths to the age cap.
///
/// Each trial owns a generator seeded from `(config.seed, trial_id)`, so the
/// summary depends only on the snapshot, base year and config. `cancel` is
/// polled before every trial.
pub fn run_monte_carlo(
    snapshot: &Snapshot,
    base_year: i32,
    config: &MonteCarloConfig,
    cancel: Option<&AtomicBool>,
) -> Result<MonteCarloSummary, SimulationError> {
    snapshot.validate()?;
    if config.trials == 0 {
        return Err(SimulationError::NoTrials);
    }
    if config.max_age > MAX_AGE {
        return Err(SimulationError::AgeCapOutOfRange(config.max_age));
    }
    if !BASE_YEARS.contains(&base_year) {
        return Err(SimulationError::BaseYearOutOfRange(base_year));
    }

    let basics = &snapshot.basics;
    let years_to_retirement = basics.retirement_age.saturating_sub(basics.current_age);
    let planned_age = basics.current_age + years_to_retirement;
    let plan = TrialPlan {
        start: CalendarMonth::new(base_year, 0),
        horizon_months: config.max_age.saturating_sub(basics.current_age) * 12,
        planned_retirement_year: base_year + years_to_retirement as i32,
        inflation_growth: 1.0 + basics.annual_inflation / 100.0,
    };
    // Trials stop at the cap; a later planned December is never recorded.
    let planned_retirement_reached = planned_age < config.max_age;
    if !planned_retirement_reached {
        warn!(
            planned_age,
            max_age = config.max_age,
            "planned retirement lies beyond the simulated horizon"
        );
    }
    debug!(
        trials = config.trials,
        seed = config.seed,
        planned_retirement_year = plan.planned_retirement_year,
        "starting monte carlo run"
    );

    let outcomes = (0..config.trials)
        .into_par_iter()
        .map(|trial_id| {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(SimulationError::Cancelled);
            }
            let mut rng = trial_rng(config.seed, trial_id);
            Ok(simulate_trial(snapshot, &plan, &mut rng))
        })
        .collect::<Result<Vec<_>, _>>()
        .inspect_err(|_| warn!("monte carlo run cancelled"))?;

    let success_target = fire_target(
        snapshot,
        plan.planned_retirement_year,
        plan.inflation_growth.powi(years_to_retirement as i32),
    );
    let summary = summarize(
        outcomes,
        plan.planned_retirement_year,
        planned_retirement_reached,
        success_target,
    );
    info!(
        trials = summary.trials,
        success_rate = summary.success_rate,
        p50 = summary.p50,
        "monte carlo run complete"
    );
    Ok(summary)
}

fn simulate_trial<R: Rng + ?Sized>(
    snapshot: &Snapshot,
    plan: &TrialPlan,
    rng: &mut R,
) -> TrialOutcome {
    let basics = &snapshot.basics;
    let base_year = plan.start.year();
    let mut wealth = basics.invested_amount;
    let mut monthly_return = 0.0;
    let mut planned_retirement_wealth = 0.0;
    let mut fire_age = None;

    for step in 1..=plan.horizon_months {
        let month = plan.start.offset(step as i32 - 1);
        // The horizon opens in January, so the first step draws as well.
        if month.month0() == 0 {
            monthly_return = monthly_rate(sample_blended_return(&snapshot.deposits, rng));
        }

        wealth += wealth * monthly_return + monthly_net_flow(snapshot, month);

        if !month.is_december() {
            continue;
        }
        if month.year() == plan.planned_retirement_year {
            planned_retirement_wealth = wealth;
        }
        if fire_age.is_none() {
            let inflation = plan.inflation_growth.powi((step / 12) as i32);
            if wealth >= fire_target(snapshot, month.year(), inflation) {
                fire_age = Some(basics.current_age + (month.year() - base_year) as u32);
            }
        }
    }

    TrialOutcome {
        planned_retirement_wealth,
        fire_age,
    }
}

/// One year's portfolio return: every deposit draws its own return, blended
/// by monthly contribution.
fn sample_blended_return<R: Rng + ?Sized>(deposits: &[Deposit], rng: &mut R) -> f64 {
    let mut weighted = 0.0;
    let mut weight = 0.0;
    for deposit in deposits {
        let drawn = rng.normal(
            deposit.expected_annual_return / 100.0,
            deposit.std_dev() / 100.0,
        );
        weighted += deposit.monthly_amount * drawn;
        weight += deposit.monthly_amount;
    }

    let annual = if weight > 0.0 {
        weighted / weight
    } else {
        rng.normal(FALLBACK_RETURN_MEAN, FALLBACK_RETURN_STD_DEV)
    };
    annual.max(ANNUAL_RETURN_FLOOR)
}

fn summarize(
    outcomes: Vec<TrialOutcome>,
    planned_retirement_year: i32,
    planned_retirement_reached: bool,
    success_target: f64,
) -> MonteCarloSummary {
    let trials = outcomes.len();
    let mut terminal_wealth: Vec<f64> = outcomes
        .iter()
        .map(|outcome| outcome.planned_retirement_wealth)
        .collect();
    terminal_wealth.sort_by(|a, b| a.total_cmp(b));
    let mut ages: Vec<u32> = outcomes.iter().filter_map(|outcome| outcome.fire_age).collect();
    ages.sort_unstable();

    let successes = terminal_wealth
        .iter()
        .filter(|&&wealth| wealth >= success_target)
        .count();

    MonteCarloSummary {
        trials: trials as u32,
        planned_retirement_year,
        planned_retirement_reached,
        p10: nearest_rank(&terminal_wealth, 0.10),
        p50: nearest_rank(&terminal_wealth, 0.50),
        p90: nearest_rank(&terminal_wealth, 0.90),
        success_target,
        success_rate: successes as f64 / trials as f64 * 100.0,
        fire_age: FireAgePercentiles {
            p10: age_percentile(&ages, trials, 0.10),
            p50: age_percentile(&ages, trials, 0.50),
            p90: age_percentile(&ages, trials, 0.90),
        },
        trials_reaching_fire: ages.len() as u32,
        terminal_wealth,
    }
}

/// `sorted[floor(n * p)]`, clamped to the last element.
fn nearest_rank<T: Copy + Default>(sorted: &[T], p: f64) -> T {
    if sorted.is_empty() {
        return T::default();
    }
    let index = ((sorted.len() as f64 * p).floor() as usize).min(sorted.len() - 1);
    sorted[index]
}

/// Percentile over the trials that reached FIRE, or `None` when fewer than
/// `trials * p` of them did.
fn age_percentile(sorted_ages: &[u32], trials: usize, p: f64) -> Option<u32> {
    if sorted_ages.is_empty() || (sorted_ages.len() as f64) < trials as f64 * p {
        return None;
    }
    Some(nearest_rank(sorted_ages, p))
}
