use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use tracing::info;

use super::{
    ApiRequest, build_monte_carlo_config, build_monte_carlo_response, build_project_response,
    build_stress_response, prepare_snapshot, resolve_base_year,
};
use crate::core::{
    DEFAULT_SEED, DEFAULT_TRIALS, MAX_SIMULATED_AGE, Snapshot, StressScenario, TemplateMode,
    template_listings,
};

#[derive(Parser, Debug)]
#[command(
    name = "fire-path",
    about = "FIRE wealth projector (deterministic path, Monte Carlo, sequence-of-returns stress)"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value_t = Ipv4Addr::UNSPECIFIED)]
        bind: Ipv4Addr,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Deterministic monthly projection.
    Project {
        #[command(flatten)]
        snapshot: SnapshotArgs,
    },
    /// Stochastic projection over many seeded trials.
    MonteCarlo {
        #[command(flatten)]
        snapshot: SnapshotArgs,
        #[arg(long, default_value_t = DEFAULT_TRIALS)]
        trials: u32,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        #[arg(
            long,
            default_value_t = MAX_SIMULATED_AGE,
            help = "Age at which each trial stops"
        )]
        max_age: u32,
    },
    /// Annual projection with depressed returns in the first years.
    Stress {
        #[command(flatten)]
        snapshot: SnapshotArgs,
        #[arg(long, help = "Number of leading years at the stressed return")]
        duration: u32,
        #[arg(
            long,
            allow_hyphen_values = true,
            help = "Stressed annual return in percent, e.g. -20"
        )]
        stress_return: f64,
    },
    /// List the built-in portfolio templates.
    Templates,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    #[arg(long, help = "Path to a snapshot JSON file")]
    snapshot: PathBuf,
    #[arg(long, help = "Calendar year of the first simulated month; defaults to this year")]
    base_year: Option<i32>,
    #[arg(long, help = "Apply a named deposit template to the snapshot")]
    template: Option<String>,
    #[arg(long, value_enum, default_value_t = CliTemplateMode::Replace)]
    template_mode: CliTemplateMode,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTemplateMode {
    Replace,
    Append,
}

impl From<CliTemplateMode> for TemplateMode {
    fn from(value: CliTemplateMode) -> Self {
        match value {
            CliTemplateMode::Replace => TemplateMode::Replace,
            CliTemplateMode::Append => TemplateMode::Append,
        }
    }
}

impl SnapshotArgs {
    fn load(&self) -> Result<(Snapshot, i32)> {
        let raw = fs::read_to_string(&self.snapshot)
            .with_context(|| format!("reading {}", self.snapshot.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", self.snapshot.display()))?;
        let snapshot = prepare_snapshot(
            snapshot,
            self.template.as_deref(),
            self.template_mode.into(),
        )
        .map_err(|e| anyhow!(e))?;
        let base_year = resolve_base_year(self.base_year).map_err(|e| anyhow!(e))?;
        Ok((snapshot, base_year))
    }

    fn request(
        &self,
        monte_carlo_args: (u32, u64, u32),
        stress: Option<StressScenario>,
    ) -> Result<ApiRequest> {
        let (snapshot, base_year) = self.load()?;
        let (trials, seed, max_age) = monte_carlo_args;
        let monte_carlo = build_monte_carlo_config(Some(trials), Some(seed), Some(max_age))
            .map_err(|e| anyhow!(e))?;
        Ok(ApiRequest {
            snapshot,
            base_year,
            monte_carlo,
            stress,
        })
    }
}

const DEFAULT_RUN: (u32, u64, u32) = (DEFAULT_TRIALS, DEFAULT_SEED, MAX_SIMULATED_AGE);

pub async fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve { bind, port } => {
            super::run_http_server(bind.octets(), port)
                .await
                .context("HTTP server failed")?;
        }
        Command::Project { snapshot } => {
            let request = snapshot.request(DEFAULT_RUN, None)?;
            print_json(&build_project_response(&request))?;
        }
        Command::MonteCarlo {
            snapshot,
            trials,
            seed,
            max_age,
        } => {
            let request = snapshot.request((trials, seed, max_age), None)?;
            info!(trials, seed, "running monte carlo");
            let response = build_monte_carlo_response(&request).map_err(|e| anyhow!(e))?;
            print_json(&response)?;
        }
        Command::Stress {
            snapshot,
            duration,
            stress_return,
        } => {
            let scenario = super::build_stress_scenario(Some(duration), Some(stress_return))
                .map_err(|e| anyhow!(e))?;
            let request = snapshot.request(DEFAULT_RUN, scenario)?;
            let response = build_stress_response(&request).map_err(|e| anyhow!(e))?;
            print_json(&response)?;
        }
        Command::Templates => print_json(&template_listings())?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monte_carlo_flags_parse_with_defaults() {
        let cli = Cli::try_parse_from([
            "fire-path",
            "monte-carlo",
            "--snapshot",
            "plan.json",
            "--trials",
            "250",
        ])
        .expect("parse");
        match cli.command {
            Command::MonteCarlo {
                snapshot,
                trials,
                seed,
                max_age,
            } => {
                assert_eq!(snapshot.snapshot, PathBuf::from("plan.json"));
                assert_eq!(snapshot.base_year, None);
                assert_eq!(trials, 250);
                assert_eq!(seed, DEFAULT_SEED);
                assert_eq!(max_age, MAX_SIMULATED_AGE);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn stress_accepts_negative_return() {
        let cli = Cli::try_parse_from([
            "fire-path",
            "stress",
            "--snapshot",
            "plan.json",
            "--duration",
            "3",
            "--stress-return",
            "-25",
            "--template",
            "moderate",
        ])
        .expect("parse");
        match cli.command {
            Command::Stress {
                snapshot,
                duration,
                stress_return,
            } => {
                assert_eq!(duration, 3);
                assert_eq!(stress_return, -25.0);
                assert_eq!(snapshot.template.as_deref(), Some("moderate"));
                assert_eq!(snapshot.template_mode, CliTemplateMode::Replace);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn template_mode_flag_parses() {
        let cli = Cli::try_parse_from([
            "fire-path",
            "project",
            "--snapshot",
            "plan.json",
            "--template",
            "aggressive",
            "--template-mode",
            "append",
        ])
        .expect("parse");
        match cli.command {
            Command::Project { snapshot } => {
                assert_eq!(snapshot.template_mode, CliTemplateMode::Append);
                assert_eq!(TemplateMode::from(snapshot.template_mode), TemplateMode::Append);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn serve_defaults_to_all_interfaces() {
        let cli = Cli::try_parse_from(["fire-path", "serve"]).expect("parse");
        match cli.command {
            Command::Serve { bind, port } => {
                assert_eq!(bind, Ipv4Addr::UNSPECIFIED);
                assert_eq!(port, 8080);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn missing_snapshot_file_reports_path() {
        let args = SnapshotArgs {
            snapshot: PathBuf::from("/nonexistent/fire-path-plan.json"),
            base_year: Some(2026),
            template: None,
            template_mode: CliTemplateMode::Replace,
        };
        let err = args.load().expect_err("must fail");
        assert!(format!("{err:#}").contains("fire-path-plan.json"));
    }

    #[test]
    fn snapshot_file_loads_and_validates() {
        let path =
            std::env::temp_dir().join(format!("fire-path-cli-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"basics":{"withdrawalRate":4,"annualInflation":2,"currentAge":30,"retirementAge":40,
               "annualIncome":50000,"annualExpenses":20000,"investedAmount":1000}}"#,
        )
        .expect("write");
        let args = SnapshotArgs {
            snapshot: path.clone(),
            base_year: Some(2030),
            template: Some("conservative".to_string()),
            template_mode: CliTemplateMode::Append,
        };
        let request = args.request((10, 1, 85), None).expect("load");
        let err = args
            .request((10, 1, 400_000_000), None)
            .expect_err("age cap must be bounded");
        fs::remove_file(&path).ok();
        assert!(err.to_string().contains("maxAge"));
        assert_eq!(request.base_year, 2030);
        assert_eq!(request.snapshot.deposits.len(), 3);
        assert_eq!(request.monte_carlo.trials, 10);
    }
}
