//! # co2net-cli: the planner's command-line driver
//!
//! Wires the pipeline stages from `co2net-io` and `co2net-algo` into
//! three subcommands:
//!
//! ```text
//! co2net solve            # C1-C8: ingest, route, solve, export
//! co2net validate-cost-file
//! co2net validate-assets
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - argument parsing (via `clap`)
//! - [`config`] - optional TOML config file merge
//! - [`pipeline`] - the orchestration that actually runs C1-C8

pub mod cli;
pub mod config;
pub mod pipeline;

pub use cli::{AssetKindArg, Cli, Commands};
pub use config::{load_config, PlannerConfig};
pub use pipeline::{run_solve, validate_assets, validate_cost_file, AssetTableKind, SolveArgs};
