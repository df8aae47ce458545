use tracing::debug;

use super::cashflow::monthly_net_flow;
use super::target::{fire_target, monthly_rate, projection_blended_return};
use super::types::{
    AnnualPoint, CalendarMonth, FireAchievement, MonthlyPoint, Projection, Snapshot,
};

/// Single-path monthly projection at the blended expected return, from
/// January of `base_year` to the planned retirement age.
pub fn project(snapshot: &Snapshot, base_year: i32) -> Projection {
    let basics = &snapshot.basics;
    let horizon_years = basics.horizon_years();
    let horizon_months = horizon_years * 12;

    let nominal_annual = projection_blended_return(snapshot, base_year + horizon_years as i32);
    let nominal_monthly = monthly_rate(nominal_annual);
    let inflation_monthly = monthly_rate(basics.annual_inflation / 100.0);
    debug!(
        base_year,
        horizon_years,
        nominal_annual,
        "starting deterministic projection"
    );

    let mut wealth = basics.invested_amount;
    let mut monthly = Vec::with_capacity(horizon_months as usize + 1);
    let mut annual = Vec::with_capacity(horizon_years as usize + 1);
    monthly.push(MonthlyPoint {
        year: base_year,
        month: 0,
        nominal: wealth,
        real: wealth,
    });
    annual.push(AnnualPoint {
        year: base_year,
        nominal: wealth,
        real: wealth,
    });

    let start = CalendarMonth::new(base_year, 0);
    let mut achievement: Option<FireAchievement> = None;

    for step in 1..=horizon_months {
        let month = start.offset(step as i32 - 1);
        let interest = wealth * nominal_monthly;
        wealth += interest + monthly_net_flow(snapshot, month);

        let inflation = (1.0 + inflation_monthly).powi(step as i32);
        let real = wealth / inflation;
        monthly.push(MonthlyPoint {
            year: month.year(),
            month: month.month0(),
            nominal: wealth,
            real,
        });

        if !month.is_december() {
            continue;
        }
        annual.push(AnnualPoint {
            year: month.year(),
            nominal: wealth,
            real,
        });

        if achievement.is_none() {
            let target = fire_target(snapshot, month.year(), inflation);
            if wealth >= target {
                debug!(year = month.year(), target, "FIRE target reached");
                achievement = Some(FireAchievement {
                    year: month.year(),
                    target,
                });
            }
        }
    }

    let years_to_fire = achievement.map(|hit| (hit.year - base_year) as u32);
    let required_capital = match achievement {
        Some(hit) => hit.target,
        None => {
            let final_inflation = (1.0 + inflation_monthly).powi(horizon_months as i32);
            fire_target(snapshot, base_year + horizon_years as i32, final_inflation)
        }
    };

    Projection {
        monthly,
        annual,
        achievement,
        years_to_fire,
        fire_age: years_to_fire.map(|years| basics.current_age + years),
        required_capital,
        nominal_return_pct: nominal_annual * 100.0,
        real_return_pct: (nominal_annual - basics.annual_inflation / 100.0) * 100.0,
    }
}
