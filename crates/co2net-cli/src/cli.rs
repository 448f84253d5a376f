//! Command structures and argument parsing (via `clap`).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "co2net", author, version, about, long_about = None)]
pub struct Cli {
    /// Minimum log level emitted to stderr.
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Optional TOML config file; defaults to `~/.co2net/config.toml` if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full C1-C7 pipeline and write a solution CSV plus solver artifacts.
    Solve {
        /// ASCII-grid cost file (Section 6).
        #[arg(long)]
        cost_file: PathBuf,
        /// Capture-source table (CSV).
        #[arg(long)]
        assets: PathBuf,
        /// Storage-sink table (CSV).
        #[arg(long)]
        sinks: PathBuf,
        /// Pipeline corridor table (CSV), if existing infrastructure is modeled.
        #[arg(long)]
        corridors: Option<PathBuf>,
        /// Project horizon in years.
        #[arg(long)]
        duration: f64,
        /// Annual capture target in MtCO2/yr.
        #[arg(long)]
        target: f64,
        /// Capital recovery factor applied to fixed costs.
        #[arg(long)]
        crf: f64,
        /// Output directory for the solution CSV and MPS/LP/ILP artifacts.
        #[arg(long)]
        out: PathBuf,
        /// Solver backend: "highs", "cbc", or "symphony".
        #[arg(long)]
        solver: Option<String>,
        /// Explicit path to the solver binary, bypassing auto-discovery.
        #[arg(long)]
        solver_binary: Option<PathBuf>,
        /// Solver subprocess timeout in seconds.
        #[arg(long)]
        timeout_seconds: Option<u64>,
    },
    /// Parse a cost file and report its header and edge count without building a network.
    ValidateCostFile {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Parse a source or sink table against a cost file's grid and report diagnostics.
    ValidateAssets {
        #[arg(long)]
        cost_file: PathBuf,
        #[arg(value_name = "PATH")]
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = AssetKindArg::Source)]
        kind: AssetKindArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKindArg {
    Source,
    Sink,
}

impl From<AssetKindArg> for crate::pipeline::AssetTableKind {
    fn from(value: AssetKindArg) -> Self {
        match value {
            AssetKindArg::Source => crate::pipeline::AssetTableKind::Source,
            AssetKindArg::Sink => crate::pipeline::AssetTableKind::Sink,
        }
    }
}
