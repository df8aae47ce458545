use tracing::debug;

use super::cashflow::annual_net_flow;
use super::target::blended_annual_return;
use super::types::{NominalPoint, Snapshot, StressReport};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressScenario {
    /// Leading years that earn `stress_return_pct` instead of the baseline.
    pub years: u32,
    /// Percent per year.
    pub stress_return_pct: f64,
}

/// Annual-step projection where the first `scenario.years` years earn the
/// stressed return, paired with the same path at the baseline return.
pub fn run_stress(snapshot: &Snapshot, base_year: i32, scenario: &StressScenario) -> StressReport {
    let baseline_return = blended_annual_return(&snapshot.deposits, |_| true);
    let stress_return = scenario.stress_return_pct / 100.0;
    debug!(
        years = scenario.years,
        stress_return,
        baseline_return,
        "starting sequence-of-returns stress"
    );

    let stressed = annual_path(snapshot, base_year, |offset| {
        if offset < scenario.years {
            stress_return
        } else {
            baseline_return
        }
    });

    StressReport {
        stress_years: scenario.years,
        stress_return_pct: scenario.stress_return_pct,
        baseline_return_pct: baseline_return * 100.0,
        stressed,
        baseline: baseline_path(snapshot, base_year),
    }
}

/// The unstressed annual path over the same horizon.
pub fn baseline_path(snapshot: &Snapshot, base_year: i32) -> Vec<NominalPoint> {
    let baseline_return = blended_annual_return(&snapshot.deposits, |_| true);
    annual_path(snapshot, base_year, |_| baseline_return)
}

fn annual_path(
    snapshot: &Snapshot,
    base_year: i32,
    return_for_offset: impl Fn(u32) -> f64,
) -> Vec<NominalPoint> {
    let horizon_years = snapshot.basics.horizon_years();
    let mut wealth = snapshot.basics.invested_amount;
    let mut path = Vec::with_capacity(horizon_years as usize + 1);
    path.push(NominalPoint {
        year: base_year,
        nominal: wealth,
    });

    for offset in 0..horizon_years {
        let year = base_year + offset as i32;
        wealth += wealth * return_for_offset(offset) + annual_net_flow(snapshot, year);
        path.push(NominalPoint {
            year,
            nominal: wealth,
        });
    }
    path
}
