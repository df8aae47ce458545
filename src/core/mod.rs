mod cashflow;
mod error;
mod monte_carlo;
mod projector;
mod random;
mod stress;
mod target;
mod templates;
mod types;

pub use cashflow::{
    annual_one_time_flow, annual_recurring_flow, monthly_one_time_flow, monthly_recurring_flow,
};
pub use error::{BASE_YEARS, MAX_AGE, SimulationError, SnapshotError};
pub use monte_carlo::{
    DEFAULT_SEED, DEFAULT_TRIALS, MAX_SIMULATED_AGE, MonteCarloConfig, run_monte_carlo,
};
pub use projector::project;
pub use random::{Gaussian, trial_rng};
pub use stress::{StressScenario, baseline_path, run_stress};
pub use target::{blended_annual_return, fire_target};
pub use templates::{
    PortfolioTemplate, TemplateListing, TemplateMode, apply_template, template_listings,
};
pub use types::{
    AnnualPoint, BasicParams, CalendarMonth, Deposit, FireAchievement, FireAgePercentiles,
    FlowKind, MonteCarloSummary, MonthlyPoint, NominalPoint, OneTimeEvent, Periodicity,
    Projection, RecurringEvent, Snapshot, StressReport, VariableExpense,
};
