//! Orchestrates C1 through C8 end to end: load the cost surface, ingest
//! the asset and corridor tables, route candidates, build and solve the
//! MILP, and write the solution CSV plus the MPS/LP/ILP artifacts.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use co2net_algo::{
    delaunay::{triangulate, Point},
    export_network, import_corridor, route_candidates,
    milp::{solve, CostTrend, MilpModel, ProjectParams},
};
use co2net_core::{AssetKind, Diagnostics};
use co2net_io::{
    load_cost_file, read_corridor_table, read_sink_table, read_source_table, write_solution_file,
    PipelineRow, SinkRow, SolutionSummary, SourceRow,
};
use co2net_solver_common::{SolverId, SolverProcess};

use crate::config::PlannerConfig;

/// Everything the `solve` subcommand needs, already merged from CLI
/// flags and an optional config file by the caller.
pub struct SolveArgs {
    pub cost_file: PathBuf,
    pub sources: PathBuf,
    pub sinks: PathBuf,
    pub corridors: Option<PathBuf>,
    pub duration_years: f64,
    pub capital_recovery_factor: f64,
    pub target: f64,
    pub out_dir: PathBuf,
    pub solver_backend: SolverId,
    pub solver_binary: Option<PathBuf>,
    pub timeout_seconds: u64,
}

impl SolveArgs {
    /// Resolves a solver backend/binary/timeout from explicit CLI
    /// values, falling back to `config.solver`, then to HiGHS with
    /// auto-discovery and a 300s timeout.
    pub fn resolve_solver(
        backend: Option<&str>,
        binary: Option<PathBuf>,
        timeout_seconds: Option<u64>,
        config: &PlannerConfig,
    ) -> Result<(SolverId, Option<PathBuf>, u64)> {
        let backend_str = backend
            .map(str::to_string)
            .or_else(|| config.solver.backend.clone())
            .unwrap_or_else(|| "highs".to_string());
        let solver_id = SolverId::from_str(&backend_str)
            .map_err(|e| anyhow::anyhow!("unknown solver backend '{backend_str}': {e}"))?;
        let binary = binary.or_else(|| config.solver.binary_path.clone());
        let timeout = timeout_seconds
            .or(config.solver.timeout_seconds)
            .unwrap_or(300);
        Ok((solver_id, binary, timeout))
    }
}

/// Runs the full C1-C8 pipeline and writes artifacts into `args.out_dir`.
pub fn run_solve(args: &SolveArgs) -> Result<()> {
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating output directory '{}'", args.out_dir.display()))?;

    let cost_reader = File::open(&args.cost_file)
        .with_context(|| format!("opening cost file '{}'", args.cost_file.display()))?;
    let (grid, mut surface) = load_cost_file(cost_reader, None)
        .with_context(|| "loading cost file".to_string())?;
    info!(edges = surface.edge_count(), "loaded cost surface");

    let mut diagnostics = Diagnostics::new();

    let source_reader = File::open(&args.sources)
        .with_context(|| format!("opening source table '{}'", args.sources.display()))?;
    let (mut assets, source_diag) =
        read_source_table(source_reader, &grid).with_context(|| "reading source table".to_string())?;
    diagnostics.merge(source_diag);

    let sink_reader = File::open(&args.sinks)
        .with_context(|| format!("opening sink table '{}'", args.sinks.display()))?;
    let (sinks, sink_diag) =
        read_sink_table(sink_reader, &grid).with_context(|| "reading sink table".to_string())?;
    diagnostics.merge(sink_diag);
    assets.extend(sinks);

    let mut corridors = Vec::new();
    if let Some(corridor_path) = &args.corridors {
        let corridor_reader = File::open(corridor_path)
            .with_context(|| format!("opening corridor table '{}'", corridor_path.display()))?;
        let (table, corridor_diag) = read_corridor_table(corridor_reader, &grid)
            .with_context(|| "reading pipeline corridor table".to_string())?;
        diagnostics.merge(corridor_diag);
        corridors = table;
    }

    for issue in diagnostics.warnings() {
        warn!("{issue}");
    }
    info!(sources = assets.iter().filter(|a| a.is_source()).count(),
          sinks = assets.iter().filter(|a| a.is_sink()).count(),
          corridors = corridors.len(),
          "ingested asset and corridor tables");

    let mut expanded_corridors = Vec::with_capacity(corridors.len());
    for corridor in &corridors {
        expanded_corridors.push(import_corridor(&mut surface, corridor)?);
    }
    corridors = expanded_corridors;

    let points: Vec<Point> = assets
        .iter()
        .map(|a| {
            let xy = grid.cell_to_xy(a.cell)?;
            Ok(Point { x: xy.x as f64, y: xy.y as f64, cell: a.cell })
        })
        .collect::<co2net_core::PlannerResult<Vec<_>>>()?;
    let edges = triangulate(&points);
    info!(candidate_edges = edges.len(), "triangulated candidate topology");

    let routed = route_candidates(&mut surface, &assets, &edges, &corridors)?;
    let exported = export_network(&routed, &corridors);
    info!(nodes = exported.nodes.len(), arcs = exported.arcs.len(), "exported candidate network");

    let params = ProjectParams {
        duration_years: args.duration_years,
        capital_recovery_factor: args.capital_recovery_factor,
        capture_target: co2net_core::units::MtCo2PerYear(args.target),
    };
    let model = MilpModel::build(&exported, &routed.assets, params, CostTrend::default());
    for issue in model.diagnostics().warnings() {
        warn!("{issue}");
    }

    let binary_path = match &args.solver_binary {
        Some(p) => p.clone(),
        None => SolverProcess::find_binary(args.solver_backend)
            .with_context(|| format!("locating {} solver binary", args.solver_backend))?,
    };
    let process = SolverProcess::new(args.solver_backend, binary_path, args.timeout_seconds);

    let solution = solve(&model, &process, &args.out_dir)?;
    info!(objective = solution.objective, "MILP solved");

    write_results(args, &routed.assets, &solution, &params)?;
    Ok(())
}

fn write_results(
    args: &SolveArgs,
    assets: &[co2net_core::Asset],
    solution: &co2net_algo::milp::MilpSolution,
    params: &ProjectParams,
) -> Result<()> {
    use co2net_core::units::{DollarsM, MtCo2};

    let mut actual_capture = co2net_core::units::MtCo2PerYear(0.0);
    let mut actual_storage = MtCo2(0.0);
    let mut capture_cost = DollarsM(0.0);
    let mut storage_cost = DollarsM(0.0);
    let mut transport_cost = DollarsM(0.0);

    let mut source_rows = Vec::new();
    let mut sink_rows = Vec::new();
    let mut pipeline_rows = Vec::new();

    for asset in assets {
        match &asset.kind {
            AssetKind::Source { .. } => {
                let captured = solution
                    .source_captured
                    .get(&asset.id)
                    .copied()
                    .unwrap_or(co2net_core::units::MtCo2PerYear(0.0));
                let cost = solution.source_cost.get(&asset.id).copied().unwrap_or(DollarsM(0.0));
                actual_capture = actual_capture + captured;
                capture_cost = capture_cost + cost;
                source_rows.push(SourceRow { id: asset.id.clone(), captured, cost });
            }
            AssetKind::Sink { .. } => {
                let injected = solution.sink_injected.get(&asset.id).copied().unwrap_or(MtCo2(0.0));
                let cost = solution.sink_cost.get(&asset.id).copied().unwrap_or(DollarsM(0.0));
                actual_storage = actual_storage + injected;
                storage_cost = storage_cost + cost;
                sink_rows.push(SinkRow { id: asset.id.clone(), injected, cost });
            }
            AssetKind::Junction { .. } => {}
        }
    }

    for ((from, to), flow) in &solution.arc_flow {
        if flow.value() <= 0.0 {
            continue;
        }
        let cost = solution
            .arc_cost
            .get(&(from.clone(), to.clone()))
            .copied()
            .unwrap_or(DollarsM(0.0));
        transport_cost = transport_cost + cost;
        pipeline_rows.push(PipelineRow { from: from.clone(), to: to.clone(), flow: *flow, cost });
    }

    let summary = SolutionSummary {
        duration_years: params.duration_years,
        capital_recovery_factor: params.capital_recovery_factor,
        target: params.capture_target,
        actual_capture,
        actual_storage,
        capture_cost,
        transport_cost,
        storage_cost,
    };

    let solution_path = args.out_dir.join("solution.csv");
    write_solution_file(&solution_path, &summary, &source_rows, &sink_rows, &pipeline_rows)?;
    info!(path = %solution_path.display(), "wrote solution CSV");
    Ok(())
}

/// Validates a cost file's header and body without building the full
/// network; used by `co2net validate-cost-file`.
pub fn validate_cost_file(path: &Path) -> Result<()> {
    let reader = File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    let (_, surface) = load_cost_file(reader, None)?;
    if surface.edge_count() == 0 {
        bail!("cost file parsed but produced zero edges");
    }
    Ok(())
}

/// Validates a source or sink table against a cost file's grid extent;
/// used by `co2net validate-assets`.
pub fn validate_assets(cost_file: &Path, table: &Path, kind: AssetTableKind) -> Result<()> {
    let cost_reader = File::open(cost_file).with_context(|| format!("opening '{}'", cost_file.display()))?;
    let (grid, _) = load_cost_file(cost_reader, None)?;

    let table_reader = File::open(table).with_context(|| format!("opening '{}'", table.display()))?;
    let (assets, diagnostics) = match kind {
        AssetTableKind::Source => read_source_table(table_reader, &grid)?,
        AssetTableKind::Sink => read_sink_table(table_reader, &grid)?,
    };

    info!(count = assets.len(), warnings = diagnostics.warning_count(), "validated asset table");
    if diagnostics.has_warnings() {
        for issue in diagnostics.warnings() {
            warn!("{issue}");
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetTableKind {
    Source,
    Sink,
}
