use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use co2net_cli::cli::{AssetKindArg, Cli, Commands};
use co2net_cli::config::load_config;
use co2net_cli::pipeline::{run_solve, validate_assets, validate_cost_file, SolveArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(cli.log_level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("failed to load config: {err:?}");
            return ExitCode::FAILURE;
        }
    };

    let result = match &cli.command {
        Commands::Solve {
            cost_file,
            assets,
            sinks,
            corridors,
            duration,
            target,
            crf,
            out,
            solver,
            solver_binary,
            timeout_seconds,
        } => (|| {
            let (solver_backend, solver_binary, timeout_seconds) = SolveArgs::resolve_solver(
                solver.as_deref(),
                solver_binary.clone(),
                *timeout_seconds,
                &config,
            )?;
            let args = SolveArgs {
                cost_file: cost_file.clone(),
                sources: assets.clone(),
                sinks: sinks.clone(),
                corridors: corridors.clone(),
                duration_years: *duration,
                capital_recovery_factor: *crf,
                target: *target,
                out_dir: out.clone(),
                solver_backend,
                solver_binary,
                timeout_seconds,
            };
            run_solve(&args)
        })(),
        Commands::ValidateCostFile { path } => validate_cost_file(path),
        Commands::ValidateAssets { cost_file, path, kind } => {
            let kind: AssetKindArg = *kind;
            validate_assets(cost_file, path, kind.into())
        }
    };

    match result {
        Ok(()) => {
            info!("done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}
