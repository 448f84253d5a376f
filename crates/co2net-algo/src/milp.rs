//! C7: builds the capacity-expansion MILP from C6's exported network,
//! writes it as MPS and LP, drives an external solver process against
//! the MPS file, and extracts the optimal solution back into
//! per-source/sink/arc breakdowns.
//!
//! The solver itself is treated as a black box (see
//! `co2net-solver-common`): this module's only contract with it is
//! "write a standard MPS file, read back a `name value` solution
//! file". No in-process LP modeling crate is involved.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use co2net_core::units::{DollarsM, DollarsPerTonne, MtCo2, MtCo2PerYear};
use co2net_core::{Asset, AssetKind, Diagnostics, PlannerError};
use co2net_solver_common::{SolutionBatch, SolutionStatus, SolverError, SolverProcess};

use crate::network_exporter::ExportedNetwork;

/// The two linear cost-trend segments `{(slope0,intercept0),
/// (slope1,intercept1)}` relating pipeline flow/build indicator to a
/// per-length annualized cost. Defaults are the planner's reference
/// trends, fit from observed pipeline cost data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostTrend {
    pub slopes: [f64; 2],
    pub intercepts: [f64; 2],
}

impl Default for CostTrend {
    fn default() -> Self {
        Self {
            slopes: [0.1157192, 0.0783067],
            intercepts: [0.4316551, 0.770037],
        }
    }
}

impl CostTrend {
    /// The flow at which the two linear segments intersect, derived
    /// (never hard-coded) so the piecewise-linear pipeline cost curve
    /// stays continuous across the kink.
    pub fn mid_cap(&self) -> MtCo2PerYear {
        MtCo2PerYear((self.intercepts[1] - self.intercepts[0]) / (self.slopes[0] - self.slopes[1]))
    }
}

/// Project-level parameters that sit outside the network topology.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectParams {
    pub duration_years: f64,
    pub capital_recovery_factor: f64,
    pub capture_target: MtCo2PerYear,
}

/// Errors raised while building, writing, or solving the MILP.
#[derive(Debug, Error)]
pub enum MilpError {
    #[error(transparent)]
    Planner(#[from] PlannerError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("I/O error writing MILP artifact: {0}")]
    Io(#[from] std::io::Error),
}

pub type MilpResult<T> = Result<T, MilpError>;

#[derive(Debug, Clone)]
struct SourceParam {
    id: String,
    capacity: MtCo2PerYear,
    fixed_cost: DollarsM,
    variable_cost: DollarsPerTonne,
}

#[derive(Debug, Clone)]
struct SinkParam {
    id: String,
    capacity: MtCo2,
    fixed_cost: DollarsM,
    variable_cost: DollarsPerTonne,
}

#[derive(Debug, Clone)]
struct ArcParam {
    from: String,
    to: String,
    weighted_cost: f64,
    /// Per-segment lower bound, `lo[e,c]`.
    lower: [MtCo2PerYear; 2],
    /// Per-segment upper bound, `hi[e,c]`.
    upper: [MtCo2PerYear; 2],
}

/// The built MILP: sets, parameters, and index structures ready to be
/// serialized and solved. Construction also runs the capture-target
/// validation/clamp (Section 4.7's "Validation" step).
#[derive(Debug, Clone)]
pub struct MilpModel {
    sources: Vec<SourceParam>,
    sinks: Vec<SinkParam>,
    junctions: Vec<String>,
    arcs: Vec<ArcParam>,
    pair_of: HashMap<(String, String), usize>,
    incoming: HashMap<String, Vec<usize>>,
    outgoing: HashMap<String, Vec<usize>>,
    cost_trend: CostTrend,
    params: ProjectParams,
    diagnostics: Diagnostics,
}

impl MilpModel {
    /// Builds the MILP's sets and parameters from C6's export plus the
    /// asset table (for capture/storage capacities and costs), then
    /// clamps the capture target to the limiting flow if needed.
    pub fn build(exported: &ExportedNetwork, assets: &[Asset], mut params: ProjectParams, cost_trend: CostTrend) -> Self {
        let mid_cap = cost_trend.mid_cap();

        let mut sources = Vec::new();
        let mut sinks = Vec::new();
        let mut junctions = Vec::new();
        for asset in assets {
            match &asset.kind {
                AssetKind::Source { capacity } => sources.push(SourceParam {
                    id: asset.id.clone(),
                    capacity: *capacity,
                    fixed_cost: asset.fixed_cost,
                    variable_cost: asset.variable_cost,
                }),
                AssetKind::Sink { capacity } => sinks.push(SinkParam {
                    id: asset.id.clone(),
                    capacity: *capacity,
                    fixed_cost: asset.fixed_cost,
                    variable_cost: asset.variable_cost,
                }),
                AssetKind::Junction { .. } => junctions.push(asset.id.clone()),
            }
        }
        sources.sort_by(|a, b| a.id.cmp(&b.id));
        sinks.sort_by(|a, b| a.id.cmp(&b.id));
        junctions.sort();

        let max_cap: MtCo2PerYear = sources.iter().map(|s| s.capacity).sum();

        let mut ordered_pairs: Vec<(String, String)> = exported.arcs.clone();
        ordered_pairs.sort();

        let mut arcs = Vec::with_capacity(ordered_pairs.len());
        let mut pair_of = HashMap::with_capacity(ordered_pairs.len());
        let mut incoming: HashMap<String, Vec<usize>> = HashMap::new();
        let mut outgoing: HashMap<String, Vec<usize>> = HashMap::new();

        for (from, to) in ordered_pairs {
            let info = exported
                .arc_info(&from, &to)
                .expect("network_exporter populates arcs_info for every entry in arcs");

            let upper_below_mid = info.upper_bound < mid_cap;
            let lower = if info.lower_bound.value() > 0.0 {
                info.lower_bound
            } else {
                MtCo2PerYear(0.0)
            };
            let upper0 = if upper_below_mid { info.upper_bound } else { mid_cap };
            let upper1 = if upper_below_mid { info.upper_bound } else { max_cap };

            let idx = arcs.len();
            incoming.entry(to.clone()).or_default().push(idx);
            outgoing.entry(from.clone()).or_default().push(idx);
            pair_of.insert((from.clone(), to.clone()), idx);
            arcs.push(ArcParam {
                from,
                to,
                weighted_cost: info.weighted_cost,
                lower: [lower, lower],
                upper: [upper0, upper1],
            });
        }

        let mut diagnostics = Diagnostics::new();
        let total_source_cap: MtCo2PerYear = sources.iter().map(|s| s.capacity).sum();
        let total_sink_cap_per_year = sinks.iter().map(|s| s.capacity).sum::<MtCo2>().per_year(params.duration_years);
        let total_hi: MtCo2PerYear = arcs.iter().flat_map(|a| a.upper).sum();
        let limiting_flow = total_source_cap.min(total_sink_cap_per_year).min(total_hi);

        if params.capture_target > limiting_flow {
            diagnostics.add_warning(
                "validation",
                &format!(
                    "capture target {} exceeds limiting flow {}; clamped to the limiting flow",
                    params.capture_target, limiting_flow
                ),
            );
            params.capture_target = limiting_flow;
        }

        Self {
            sources,
            sinks,
            junctions,
            arcs,
            pair_of,
            incoming,
            outgoing,
            cost_trend,
            params,
            diagnostics,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn capture_target(&self) -> MtCo2PerYear {
        self.params.capture_target
    }

    /// Writes the model as a free-format MPS file.
    pub fn write_mps(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, self.to_lp_problem().render_mps())
    }

    /// Writes the model as a free-format LP file (`min`/`s.t.` form),
    /// kept alongside the MPS file for human inspection and as the
    /// `.lp` artifact the external interfaces section calls for.
    pub fn write_lp(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, self.to_lp_problem().render_lp())
    }

    fn to_lp_problem(&self) -> LpProblem {
        let mut problem = LpProblem::new();
        let t = self.params.duration_years;
        let crf = self.params.capital_recovery_factor;

        for source in &self.sources {
            let q = var_name("qS", &source.id);
            let x = var_name("xS", &source.id);
            problem.continuous(&q);
            problem.binary(&x);
            problem.add_objective_term(&x, source.fixed_cost.value());
            problem.add_objective_term(&q, source.variable_cost.value() * t);

            // capture_limit: qS[s] - capS[s]*xS[s] <= 0
            problem.add_row(
                &format!("capture_limit_{}", sanitize(&source.id)),
                RowSense::Le,
                0.0,
                vec![(q.clone(), 1.0), (x.clone(), -source.capacity.value())],
            );
        }

        for sink in &self.sinks {
            let q = var_name("qD", &sink.id);
            let x = var_name("xD", &sink.id);
            problem.continuous(&q);
            problem.binary(&x);
            problem.add_objective_term(&x, sink.fixed_cost.value());
            problem.add_objective_term(&q, sink.variable_cost.value());

            // storage_limit: qD[d] - capD[d]*xD[d] <= 0
            problem.add_row(
                &format!("storage_limit_{}", sanitize(&sink.id)),
                RowSense::Le,
                0.0,
                vec![(q.clone(), 1.0), (x.clone(), -sink.capacity.value())],
            );
        }

        for (idx, arc) in self.arcs.iter().enumerate() {
            for c in 0..2 {
                let f = flow_var(idx, c);
                let y = built_var(idx, c);
                problem.continuous(&f);
                problem.binary(&y);
                problem.add_objective_term(&f, self.cost_trend.slopes[c] * arc.weighted_cost * crf * t);
                problem.add_objective_term(&y, self.cost_trend.intercepts[c] * arc.weighted_cost * crf * t);

                // arc_lower: lo[e,c]*y[e,c] - f[e,c] <= 0
                problem.add_row(
                    &format!("arc_lower_{}_{}", idx, c),
                    RowSense::Le,
                    0.0,
                    vec![(f.clone(), -1.0), (y.clone(), arc.lower[c].value())],
                );
                // arc_upper: f[e,c] - hi[e,c]*y[e,c] <= 0
                problem.add_row(
                    &format!("arc_upper_{}_{}", idx, c),
                    RowSense::Le,
                    0.0,
                    vec![(f.clone(), 1.0), (y.clone(), -arc.upper[c].value())],
                );
            }
        }

        // One segment per undirected pair: sum_c y[e,c] + sum_c y[reverse(e),c] <= 1.
        let mut paired: std::collections::HashSet<usize> = std::collections::HashSet::new();
        for (idx, arc) in self.arcs.iter().enumerate() {
            if paired.contains(&idx) {
                continue;
            }
            let reverse_idx = self.pair_of.get(&(arc.to.clone(), arc.from.clone())).copied();
            let mut terms = vec![(built_var(idx, 0), 1.0), (built_var(idx, 1), 1.0)];
            paired.insert(idx);
            if let Some(rev) = reverse_idx {
                terms.push((built_var(rev, 0), 1.0));
                terms.push((built_var(rev, 1), 1.0));
                paired.insert(rev);
            }
            problem.add_row(&format!("segment_pair_{}", idx), RowSense::Le, 1.0, terms);
        }

        for node in &self.junctions {
            let mut terms = Vec::new();
            for &idx in self.incoming.get(node).into_iter().flatten() {
                terms.push((flow_var(idx, 0), 1.0));
                terms.push((flow_var(idx, 1), 1.0));
            }
            for &idx in self.outgoing.get(node).into_iter().flatten() {
                terms.push((flow_var(idx, 0), -1.0));
                terms.push((flow_var(idx, 1), -1.0));
            }
            problem.add_row(&format!("node_balance_{}", sanitize(node)), RowSense::Eq, 0.0, terms);
        }

        for sink in &self.sinks {
            let q = var_name("qD", &sink.id);
            let mut terms = vec![(q, -1.0)];
            for &idx in self.incoming.get(&sink.id).into_iter().flatten() {
                terms.push((flow_var(idx, 0), t));
                terms.push((flow_var(idx, 1), t));
            }
            for &idx in self.outgoing.get(&sink.id).into_iter().flatten() {
                terms.push((flow_var(idx, 0), -t));
                terms.push((flow_var(idx, 1), -t));
            }
            problem.add_row(&format!("sink_balance_{}", sanitize(&sink.id)), RowSense::Eq, 0.0, terms);
        }

        for source in &self.sources {
            let q = var_name("qS", &source.id);
            let mut terms = vec![(q, 1.0)];
            for &idx in self.incoming.get(&source.id).into_iter().flatten() {
                terms.push((flow_var(idx, 0), 1.0));
                terms.push((flow_var(idx, 1), 1.0));
            }
            for &idx in self.outgoing.get(&source.id).into_iter().flatten() {
                terms.push((flow_var(idx, 0), -1.0));
                terms.push((flow_var(idx, 1), -1.0));
            }
            problem.add_row(&format!("source_balance_{}", sanitize(&source.id)), RowSense::Eq, 0.0, terms);
        }

        let target_terms: Vec<(String, f64)> = self.sources.iter().map(|s| (var_name("qS", &s.id), 1.0)).collect();
        problem.add_row("capture_target", RowSense::Ge, self.params.capture_target.value(), target_terms);

        problem
    }

    /// Substitutes a solved variable batch back into per-component
    /// costs and flows (Section 4.7's "Solve & extract" step).
    fn extract_solution(&self, batch: &SolutionBatch) -> MilpSolution {
        let t = self.params.duration_years;
        let crf = self.params.capital_recovery_factor;

        let mut solution = MilpSolution {
            objective: batch.objective,
            ..Default::default()
        };

        for source in &self.sources {
            let q = value_of(batch, &var_name("qS", &source.id));
            if q > 0.0 {
                let x = value_of(batch, &var_name("xS", &source.id));
                let captured = MtCo2PerYear(q);
                let cost = source.fixed_cost.value() * if x > 0.5 { 1.0 } else { 0.0 } + source.variable_cost.value() * q * t;
                solution.source_captured.insert(source.id.clone(), captured);
                solution.source_cost.insert(source.id.clone(), DollarsM(cost));
            }
        }

        for sink in &self.sinks {
            let q = value_of(batch, &var_name("qD", &sink.id));
            if q > 0.0 {
                let x = value_of(batch, &var_name("xD", &sink.id));
                let injected = MtCo2(q);
                let cost = sink.fixed_cost.value() * if x > 0.5 { 1.0 } else { 0.0 } + sink.variable_cost.value() * q;
                solution.sink_injected.insert(sink.id.clone(), injected);
                solution.sink_cost.insert(sink.id.clone(), DollarsM(cost));
            }
        }

        for (idx, arc) in self.arcs.iter().enumerate() {
            let f0 = value_of(batch, &flow_var(idx, 0));
            let f1 = value_of(batch, &flow_var(idx, 1));
            let total_flow = f0 + f1;
            if total_flow <= 0.0 {
                continue;
            }
            let y0 = value_of(batch, &built_var(idx, 0));
            let y1 = value_of(batch, &built_var(idx, 1));
            let cost = (self.cost_trend.slopes[0] * f0 + self.cost_trend.intercepts[0] * y0
                + self.cost_trend.slopes[1] * f1
                + self.cost_trend.intercepts[1] * y1)
                * arc.weighted_cost
                * crf
                * t;
            let key = (arc.from.clone(), arc.to.clone());
            solution.arc_flow.insert(key.clone(), MtCo2PerYear(total_flow));
            solution.arc_cost.insert(key, DollarsM(cost));
        }

        solution
    }
}

/// The optimized network: captured/injected amounts, flows, and
/// per-component cost breakdowns, keyed by the node/arc ids C6 assigned.
#[derive(Debug, Clone, Default)]
pub struct MilpSolution {
    pub objective: f64,
    pub arc_flow: HashMap<(String, String), MtCo2PerYear>,
    pub source_captured: HashMap<String, MtCo2PerYear>,
    pub sink_injected: HashMap<String, MtCo2>,
    pub source_cost: HashMap<String, DollarsM>,
    pub sink_cost: HashMap<String, DollarsM>,
    pub arc_cost: HashMap<(String, String), DollarsM>,
}

/// Writes the model's MPS/LP artifacts to `artifact_dir`, invokes
/// `process` against the MPS file, and on infeasibility persists the
/// model that produced it at the `.ilp` path before returning the
/// matching [`PlannerError`] variant. A generic external solver can't
/// be asked for a true irreducible inconsistent subsystem the way a
/// commercial solver's native API can; the written MPS file itself is
/// the artifact an operator inspects to diagnose the infeasibility.
pub fn solve(model: &MilpModel, process: &SolverProcess, artifact_dir: &Path) -> MilpResult<MilpSolution> {
    fs::create_dir_all(artifact_dir)?;
    let mps_path: PathBuf = artifact_dir.join("CO2_network_optimization.mps");
    let lp_path: PathBuf = artifact_dir.join("CO2_network_optimization.lp");
    let ilp_path: PathBuf = artifact_dir.join("CO2_network_optimization.ilp");

    model.write_mps(&mps_path)?;
    model.write_lp(&lp_path)?;
    debug!(solver = %process.solver_id(), mps = %mps_path.display(), "invoking MILP solver");

    let batch = process.solve_blocking(&mps_path)?;

    match batch.status {
        Some(SolutionStatus::Infeasible) => {
            fs::copy(&mps_path, &ilp_path)?;
            warn!(artifact = %ilp_path.display(), "MILP infeasible for requested capture target");
            Err(MilpError::Planner(PlannerError::Infeasible {
                artifact_path: Some(ilp_path),
            }))
        }
        Some(SolutionStatus::InfOrUnbd) => {
            fs::copy(&mps_path, &ilp_path)?;
            warn!(artifact = %ilp_path.display(), "MILP infeasible or unbounded");
            Err(MilpError::Planner(PlannerError::InfOrUnbd {
                artifact_path: Some(ilp_path),
            }))
        }
        Some(SolutionStatus::Optimal) => {
            info!(objective = batch.objective, solve_time_ms = batch.solve_time_ms, "MILP solved to optimality");
            Ok(model.extract_solution(&batch))
        }
        Some(SolutionStatus::Timeout) => Err(MilpError::Solver(SolverError::Timeout { seconds: 0 })),
        Some(SolutionStatus::Error) | None => Err(MilpError::Solver(SolverError::SolutionParse(
            "solver did not report an optimal status".to_string(),
        ))),
    }
}

fn value_of(batch: &SolutionBatch, name: &str) -> f64 {
    *batch.values.get(name).unwrap_or(&0.0)
}

fn flow_var(idx: usize, c: usize) -> String {
    format!("f_{}_{}", idx, c)
}

fn built_var(idx: usize, c: usize) -> String {
    format!("y_{}_{}", idx, c)
}

fn var_name(prefix: &str, id: &str) -> String {
    format!("{}_{}", prefix, sanitize(id))
}

/// MPS/LP column and row names tolerate only a conservative character
/// set in practice; replace anything else with `_`.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowSense {
    Eq,
    Le,
    Ge,
}

struct Row {
    name: String,
    sense: RowSense,
    rhs: f64,
    terms: Vec<(String, f64)>,
}

/// A minimal, solver-agnostic LP/MILP representation: just enough
/// structure to render MPS and LP text without depending on an
/// in-process modeling crate.
struct LpProblem {
    objective: Vec<(String, f64)>,
    rows: Vec<Row>,
    binaries: Vec<String>,
    continuous: Vec<String>,
}

impl LpProblem {
    fn new() -> Self {
        Self {
            objective: Vec::new(),
            rows: Vec::new(),
            binaries: Vec::new(),
            continuous: Vec::new(),
        }
    }

    fn continuous(&mut self, name: &str) {
        if !self.continuous.iter().any(|c| c == name) {
            self.continuous.push(name.to_string());
        }
    }

    fn binary(&mut self, name: &str) {
        if !self.binaries.iter().any(|c| c == name) {
            self.binaries.push(name.to_string());
        }
    }

    fn add_objective_term(&mut self, name: &str, coeff: f64) {
        self.objective.push((name.to_string(), coeff));
    }

    fn add_row(&mut self, name: &str, sense: RowSense, rhs: f64, terms: Vec<(String, f64)>) {
        self.rows.push(Row {
            name: name.to_string(),
            sense,
            rhs,
            terms,
        });
    }

    /// Column name -> ordered (row name, coeff) pairs, objective first.
    fn columns(&self) -> Vec<(String, Vec<(String, f64)>)> {
        let mut by_col: HashMap<String, Vec<(String, f64)>> = HashMap::new();
        for (name, coeff) in &self.objective {
            by_col.entry(name.clone()).or_default().push(("COST".to_string(), *coeff));
        }
        for row in &self.rows {
            for (name, coeff) in &row.terms {
                by_col.entry(name.clone()).or_default().push((row.name.clone(), *coeff));
            }
        }

        let mut ordered = Vec::new();
        for name in self.continuous.iter().chain(self.binaries.iter()) {
            ordered.push((name.clone(), by_col.remove(name).unwrap_or_default()));
        }
        ordered
    }

    fn render_mps(&self) -> String {
        let mut out = String::new();
        out.push_str("NAME          CO2NET\n");
        out.push_str("ROWS\n");
        out.push_str(" N  COST\n");
        for row in &self.rows {
            let code = match row.sense {
                RowSense::Eq => "E",
                RowSense::Le => "L",
                RowSense::Ge => "G",
            };
            out.push_str(&format!(" {}  {}\n", code, row.name));
        }

        out.push_str("COLUMNS\n");
        let columns = self.columns();
        let mut in_integer_block = false;
        for (idx, (name, entries)) in columns.iter().enumerate() {
            let is_binary = idx >= self.continuous.len();
            if is_binary && !in_integer_block {
                out.push_str("    MARKER                 'MARKER'                 'INTORG'\n");
                in_integer_block = true;
            }
            for (row, coeff) in entries {
                out.push_str(&format!("    {:<10} {:<15} {}\n", name, row, coeff));
            }
        }
        if in_integer_block {
            out.push_str("    MARKER                 'MARKER'                 'INTEND'\n");
        }

        out.push_str("RHS\n");
        for row in &self.rows {
            if row.rhs != 0.0 {
                out.push_str(&format!("    RHS        {:<15} {}\n", row.name, row.rhs));
            }
        }

        out.push_str("BOUNDS\n");
        for name in &self.binaries {
            out.push_str(&format!(" BV BND        {}\n", name));
        }

        out.push_str("ENDATA\n");
        out
    }

    fn render_lp(&self) -> String {
        let mut out = String::new();
        out.push_str("\\ CO2 network capacity-expansion MILP\n");
        out.push_str("Minimize\n COST: ");
        out.push_str(&render_terms(&self.objective));
        out.push('\n');

        out.push_str("Subject To\n");
        for row in &self.rows {
            let relation = match row.sense {
                RowSense::Eq => "=",
                RowSense::Le => "<=",
                RowSense::Ge => ">=",
            };
            out.push_str(&format!(" {}: {} {} {}\n", row.name, render_terms(&row.terms), relation, row.rhs));
        }

        if !self.binaries.is_empty() {
            out.push_str("Binaries\n");
            for name in &self.binaries {
                out.push_str(&format!(" {}\n", name));
            }
        }

        out.push_str("End\n");
        out
    }
}

fn render_terms(terms: &[(String, f64)]) -> String {
    if terms.is_empty() {
        return "0".to_string();
    }
    terms
        .iter()
        .map(|(name, coeff)| {
            if *coeff < 0.0 {
                format!("- {} {}", coeff.abs(), name)
            } else {
                format!("+ {} {}", coeff, name)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network_exporter::ArcInfo;
    use co2net_core::units::{CellLength, Degrees};
    use co2net_core::CellId;
    use std::collections::HashMap as Map;

    fn source(id: &str, cap: f64) -> Asset {
        Asset::source(id, Degrees(0.0), Degrees(0.0), CellId::new(1), MtCo2PerYear(cap), DollarsM(1.0), DollarsPerTonne(10.0))
    }

    fn sink(id: &str, cap: f64) -> Asset {
        Asset::sink(id, Degrees(0.0), Degrees(0.0), CellId::new(2), MtCo2(cap), DollarsM(1.0), DollarsPerTonne(5.0))
    }

    fn single_arc_network(weighted_cost: f64) -> ExportedNetwork {
        let mut arcs_info = Map::new();
        arcs_info.insert(
            ("source_1".to_string(), "sink_1".to_string()),
            ArcInfo {
                length: CellLength(10.0),
                weight: 1.0,
                weighted_cost,
                lower_bound: MtCo2PerYear(0.0),
                upper_bound: MtCo2PerYear(f64::INFINITY),
            },
        );
        arcs_info.insert(
            ("sink_1".to_string(), "source_1".to_string()),
            ArcInfo {
                length: CellLength(10.0),
                weight: 1.0,
                weighted_cost,
                lower_bound: MtCo2PerYear(0.0),
                upper_bound: MtCo2PerYear(f64::INFINITY),
            },
        );
        let mut arc_paths = Map::new();
        arc_paths.insert(("source_1".to_string(), "sink_1".to_string()), vec![CellId::new(1), CellId::new(2)]);
        arc_paths.insert(("sink_1".to_string(), "source_1".to_string()), vec![CellId::new(2), CellId::new(1)]);

        ExportedNetwork {
            nodes: vec!["source_1".to_string(), "sink_1".to_string()],
            arcs: vec![("source_1".to_string(), "sink_1".to_string()), ("sink_1".to_string(), "source_1".to_string())],
            arcs_info,
            arc_paths,
            node_balance: Map::new(),
        }
    }

    fn default_params() -> ProjectParams {
        ProjectParams {
            duration_years: 10.0,
            capital_recovery_factor: 0.1,
            capture_target: MtCo2PerYear(1.0),
        }
    }

    #[test]
    fn test_mid_cap_matches_trend_intersection() {
        let trend = CostTrend::default();
        let mid = trend.mid_cap();
        let y0 = trend.slopes[0] * mid.value() + trend.intercepts[0];
        let y1 = trend.slopes[1] * mid.value() + trend.intercepts[1];
        assert!((y0 - y1).abs() < 1e-9);
    }

    #[test]
    fn test_target_clamps_to_limiting_flow() {
        let exported = single_arc_network(1.0);
        let assets = vec![source("source_1", 1.0), sink("sink_1", 20.0)];
        let params = ProjectParams {
            capture_target: MtCo2PerYear(5.0),
            ..default_params()
        };
        let model = MilpModel::build(&exported, &assets, params, CostTrend::default());
        assert_eq!(model.capture_target(), MtCo2PerYear(1.0));
        assert!(model.diagnostics().has_warnings());
    }

    #[test]
    fn test_no_clamp_when_target_within_limit() {
        let exported = single_arc_network(1.0);
        let assets = vec![source("source_1", 5.0), sink("sink_1", 100.0)];
        let params = ProjectParams {
            capture_target: MtCo2PerYear(1.0),
            ..default_params()
        };
        let model = MilpModel::build(&exported, &assets, params, CostTrend::default());
        assert_eq!(model.capture_target(), MtCo2PerYear(1.0));
        assert!(!model.diagnostics().has_warnings());
    }

    #[test]
    fn test_mps_contains_expected_sections() {
        let exported = single_arc_network(2.0);
        let assets = vec![source("source_1", 1.0), sink("sink_1", 20.0)];
        let model = MilpModel::build(&exported, &assets, default_params(), CostTrend::default());
        let rendered = model.to_lp_problem().render_mps();
        assert!(rendered.contains("ROWS"));
        assert!(rendered.contains("COLUMNS"));
        assert!(rendered.contains("capture_target"));
        assert!(rendered.contains("BV BND"));
        assert!(rendered.contains("ENDATA"));
    }

    #[test]
    fn test_extract_solution_skips_zero_flow_arcs() {
        let exported = single_arc_network(2.0);
        let assets = vec![source("source_1", 1.0), sink("sink_1", 20.0)];
        let model = MilpModel::build(&exported, &assets, default_params(), CostTrend::default());

        let mut values = HashMap::new();
        values.insert("qS_source_1".to_string(), 1.0);
        values.insert("xS_source_1".to_string(), 1.0);
        values.insert("qD_sink_1".to_string(), 10.0);
        values.insert("xD_sink_1".to_string(), 1.0);
        values.insert("f_0_0".to_string(), 1.0);
        values.insert("y_0_0".to_string(), 1.0);
        let batch = SolutionBatch {
            status: Some(SolutionStatus::Optimal),
            objective: 42.0,
            values,
            solve_time_ms: 1,
        };

        let solution = model.extract_solution(&batch);
        assert_eq!(solution.source_captured.get("source_1"), Some(&MtCo2PerYear(1.0)));
        assert_eq!(solution.sink_injected.get("sink_1"), Some(&MtCo2(10.0)));
        assert_eq!(solution.arc_flow.len(), 1);
        assert!(solution.arc_flow.contains_key(&("source_1".to_string(), "sink_1".to_string())));
        assert!(!solution.arc_flow.contains_key(&("sink_1".to_string(), "source_1".to_string())));
    }
}
