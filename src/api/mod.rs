mod cli;
mod http;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::core::{
    AnnualPoint, BASE_YEARS, MAX_AGE, MAX_SIMULATED_AGE, MonteCarloConfig, MonteCarloSummary,
    PortfolioTemplate, Projection, Snapshot, StressReport, StressScenario, TemplateMode,
    apply_template,
};

pub use cli::{Cli, run_cli};
pub use http::run_http_server;

const MAX_TRIALS: u32 = 100_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulatePayload {
    #[serde(flatten)]
    snapshot: Snapshot,
    #[serde(default)]
    base_year: Option<i32>,
    #[serde(default)]
    template: Option<String>,
    #[serde(default)]
    template_mode: TemplateMode,
    #[serde(default)]
    trials: Option<u32>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    max_age: Option<u32>,
    #[serde(default)]
    srr_duration: Option<u32>,
    #[serde(default)]
    srr_return: Option<f64>,
}

#[derive(Debug)]
struct ApiRequest {
    snapshot: Snapshot,
    base_year: i32,
    monte_carlo: MonteCarloConfig,
    stress: Option<StressScenario>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    base_year: i32,
    #[serde(flatten)]
    projection: Projection,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MonteCarloResponse {
    base_year: i32,
    seed: u64,
    max_age: u32,
    #[serde(flatten)]
    summary: MonteCarloSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StressResponse {
    base_year: i32,
    #[serde(flatten)]
    report: StressReport,
    /// The monthly projection's December history over the same horizon.
    deterministic: Vec<AnnualPoint>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Applies the optional template and validates, so nothing malformed reaches
/// a simulator.
fn prepare_snapshot(
    mut snapshot: Snapshot,
    template: Option<&str>,
    mode: TemplateMode,
) -> Result<Snapshot, String> {
    if let Some(name) = template {
        let template = PortfolioTemplate::by_name(name)
            .ok_or_else(|| format!("unknown template '{name}'"))?;
        apply_template(&mut snapshot, template, mode);
    }
    snapshot.validate().map_err(|e| e.to_string())?;
    Ok(snapshot)
}

fn resolve_base_year(base_year: Option<i32>) -> Result<i32, String> {
    let year = base_year.unwrap_or_else(current_year);
    if !BASE_YEARS.contains(&year) {
        return Err(format!(
            "baseYear must be between {} and {}",
            BASE_YEARS.start(),
            BASE_YEARS.end()
        ));
    }
    Ok(year)
}

fn build_monte_carlo_config(
    trials: Option<u32>,
    seed: Option<u64>,
    max_age: Option<u32>,
) -> Result<MonteCarloConfig, String> {
    let defaults = MonteCarloConfig::default();
    let config = MonteCarloConfig {
        trials: trials.unwrap_or(defaults.trials),
        seed: seed.unwrap_or(defaults.seed),
        max_age: max_age.unwrap_or(MAX_SIMULATED_AGE),
    };
    if config.trials == 0 {
        return Err("trials must be > 0".to_string());
    }
    if config.trials > MAX_TRIALS {
        return Err(format!("trials must be <= {MAX_TRIALS}"));
    }
    if config.max_age > MAX_AGE {
        return Err(format!("maxAge must be <= {MAX_AGE}"));
    }
    Ok(config)
}

fn build_stress_scenario(
    duration: Option<u32>,
    stress_return: Option<f64>,
) -> Result<Option<StressScenario>, String> {
    match (duration, stress_return) {
        (None, None) => Ok(None),
        (Some(years), Some(stress_return_pct)) => {
            if !stress_return_pct.is_finite() || stress_return_pct <= -100.0 {
                return Err("srrReturn must be a finite percentage above -100".to_string());
            }
            Ok(Some(StressScenario {
                years,
                stress_return_pct,
            }))
        }
        _ => Err("srrDuration and srrReturn must be given together".to_string()),
    }
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    Ok(ApiRequest {
        snapshot: prepare_snapshot(
            payload.snapshot,
            payload.template.as_deref(),
            payload.template_mode,
        )?,
        base_year: resolve_base_year(payload.base_year)?,
        monte_carlo: build_monte_carlo_config(payload.trials, payload.seed, payload.max_age)?,
        stress: build_stress_scenario(payload.srr_duration, payload.srr_return)?,
    })
}

fn build_project_response(request: &ApiRequest) -> ProjectResponse {
    ProjectResponse {
        base_year: request.base_year,
        projection: crate::core::project(&request.snapshot, request.base_year),
    }
}

fn build_monte_carlo_response(request: &ApiRequest) -> Result<MonteCarloResponse, String> {
    let summary = crate::core::run_monte_carlo(
        &request.snapshot,
        request.base_year,
        &request.monte_carlo,
        None,
    )
    .map_err(|e| e.to_string())?;
    Ok(MonteCarloResponse {
        base_year: request.base_year,
        seed: request.monte_carlo.seed,
        max_age: request.monte_carlo.max_age,
        summary,
    })
}

fn build_stress_response(request: &ApiRequest) -> Result<StressResponse, String> {
    let scenario = request
        .stress
        .ok_or_else(|| "srrDuration and srrReturn are required".to_string())?;
    let report = crate::core::run_stress(&request.snapshot, request.base_year, &scenario);
    let deterministic = crate::core::project(&request.snapshot, request.base_year).annual;
    Ok(StressResponse {
        base_year: request.base_year,
        report,
        deterministic,
    })
}
