//! C6: assigns stable node ids, assembles the directed arc list (both
//! directions for every routed path), and derives each node's flow
//! balance from its asset capacity.
//!
//! Junction ids are already final by the time C5 hands off its
//! [`RoutedNetwork`] — `JunctionId`'s `Display` impl produced the
//! `P_TS{k}`/`TS{k}` forms at discovery time. This stage's own job is
//! strictly the fan-out into directed arcs plus bound inheritance.

use std::collections::HashMap;

use co2net_core::units::{CellLength, MtCo2, MtCo2PerYear};
use co2net_core::{Arc, AssetKind, CellId, FlowType, PipelineCorridor};

use crate::candidate_router::RoutedNetwork;

/// Per-arc length/weight/cost plus the flow bounds it admits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcInfo {
    pub length: CellLength,
    pub weight: f64,
    pub weighted_cost: f64,
    pub lower_bound: MtCo2PerYear,
    pub upper_bound: MtCo2PerYear,
}

/// What a node contributes to (or draws from) the network's mass
/// balance, derived from its asset kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeBalance {
    Source(MtCo2PerYear),
    Sink(MtCo2),
    Junction,
}

/// The compact, MILP-ready network handed off to C7.
#[derive(Debug, Clone)]
pub struct ExportedNetwork {
    pub nodes: Vec<String>,
    pub arcs: Vec<(String, String)>,
    pub arcs_info: HashMap<(String, String), ArcInfo>,
    pub arc_paths: HashMap<(String, String), Vec<CellId>>,
    pub node_balance: HashMap<String, NodeBalance>,
}

impl ExportedNetwork {
    pub fn arc_info(&self, from: &str, to: &str) -> Option<&ArcInfo> {
        self.arcs_info.get(&(from.to_string(), to.to_string()))
    }
}

/// Assembles C6's export from C5's routed network and the corridor
/// list (needed to detect pipeline-inherited bounds).
pub fn export_network(routed: &RoutedNetwork, corridors: &[PipelineCorridor]) -> ExportedNetwork {
    let nodes: Vec<String> = routed.assets.iter().map(|a| a.id.clone()).collect();
    let id_to_cell: HashMap<&str, CellId> = routed.assets.iter().map(|a| (a.id.as_str(), a.cell)).collect();
    let corridor_by_name: HashMap<&str, &PipelineCorridor> = corridors.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut arcs = Vec::with_capacity(routed.spaths.len() * 2);
    let mut arcs_info = HashMap::with_capacity(routed.spaths.len() * 2);
    let mut arc_paths = HashMap::with_capacity(routed.spaths.len() * 2);

    for ((u, v), path) in &routed.spaths {
        let (fwd_lower, fwd_upper, rev_lower, rev_upper) = inherited_bounds(u, v, &corridor_by_name, &id_to_cell);

        arcs.push((u.clone(), v.clone()));
        arcs_info.insert(
            (u.clone(), v.clone()),
            ArcInfo {
                length: path.length,
                weight: path.weight,
                weighted_cost: path.weighted_cost,
                lower_bound: fwd_lower,
                upper_bound: fwd_upper,
            },
        );
        arc_paths.insert((u.clone(), v.clone()), path.cells.clone());

        let mut reversed = path.cells.clone();
        reversed.reverse();
        arcs.push((v.clone(), u.clone()));
        arcs_info.insert(
            (v.clone(), u.clone()),
            ArcInfo {
                length: path.length,
                weight: path.weight,
                weighted_cost: path.weighted_cost,
                lower_bound: rev_lower,
                upper_bound: rev_upper,
            },
        );
        arc_paths.insert((v.clone(), u.clone()), reversed);
    }

    let node_balance = routed
        .assets
        .iter()
        .map(|asset| {
            let balance = match &asset.kind {
                AssetKind::Source { capacity } => NodeBalance::Source(*capacity),
                AssetKind::Sink { capacity } => NodeBalance::Sink(*capacity),
                AssetKind::Junction { .. } => NodeBalance::Junction,
            };
            (asset.id.clone(), balance)
        })
        .collect();

    ExportedNetwork {
        nodes,
        arcs,
        arcs_info,
        arc_paths,
        node_balance,
    }
}

/// An id carries a pipeline's junction-naming prefix (`P_TS{k}`) iff
/// it ends in `_TS{digits}`; plain free junctions (`TS{k}`) and
/// source/sink ids never match.
fn pipeline_prefix(id: &str) -> Option<&str> {
    let (prefix, suffix) = id.rsplit_once("_TS")?;
    if prefix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) || suffix.is_empty() {
        None
    } else {
        Some(prefix)
    }
}

/// Returns `(lower(u,v), upper(u,v), lower(v,u), upper(v,u))`. Both
/// endpoints must carry the same pipeline prefix to inherit that
/// corridor's bounds; a unidirectional corridor only lets the
/// direction matching its own vertex order inherit nonzero bounds,
/// pinning the opposite direction to zero so the solver can never
/// build flow back into it.
fn inherited_bounds(
    u: &str,
    v: &str,
    corridors: &HashMap<&str, &PipelineCorridor>,
    id_to_cell: &HashMap<&str, CellId>,
) -> (MtCo2PerYear, MtCo2PerYear, MtCo2PerYear, MtCo2PerYear) {
    let default = (Arc::DEFAULT_LOWER, Arc::DEFAULT_UPPER, Arc::DEFAULT_LOWER, Arc::DEFAULT_UPPER);

    let (Some(pu), Some(pv)) = (pipeline_prefix(u), pipeline_prefix(v)) else {
        return default;
    };
    if pu != pv {
        return default;
    }
    let Some(corridor) = corridors.get(pu) else {
        return default;
    };

    match corridor.flow_type {
        FlowType::Bidirectional => (
            corridor.lower_bound,
            corridor.upper_bound,
            corridor.lower_bound,
            corridor.upper_bound,
        ),
        FlowType::Unidirectional => {
            let zero = MtCo2PerYear(0.0);
            if forward_matches_corridor_order(u, v, corridor, id_to_cell) {
                (corridor.lower_bound, corridor.upper_bound, zero, zero)
            } else {
                (zero, zero, corridor.lower_bound, corridor.upper_bound)
            }
        }
    }
}

/// Whether `(u, v)` runs in the same direction as the corridor's own
/// vertex list. Unresolvable cells (shouldn't occur once the asset
/// table is complete) default to `true` rather than refusing to export.
fn forward_matches_corridor_order(
    u: &str,
    v: &str,
    corridor: &PipelineCorridor,
    id_to_cell: &HashMap<&str, CellId>,
) -> bool {
    let (Some(&u_cell), Some(&v_cell)) = (id_to_cell.get(u), id_to_cell.get(v)) else {
        return true;
    };
    let (Some(u_pos), Some(v_pos)) = (
        corridor.cells.iter().position(|&c| c == u_cell),
        corridor.cells.iter().position(|&c| c == v_cell),
    ) else {
        return true;
    };
    u_pos <= v_pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use co2net_core::units::{CellLength as CL, Degrees, DollarsM, DollarsPerTonne};
    use co2net_core::{Asset, CandidatePath};

    fn path(cells: Vec<CellId>) -> CandidatePath {
        CandidatePath {
            cells,
            length: CL(1.0),
            weight: 2.0,
            weighted_cost: 2.0,
        }
    }

    #[test]
    fn test_export_duplicates_both_directions() {
        let source = Asset::source(
            "source_1",
            Degrees(0.0),
            Degrees(0.0),
            CellId::new(1),
            MtCo2PerYear(1.0),
            DollarsM(0.0),
            DollarsPerTonne(0.0),
        );
        let sink = Asset::sink(
            "sink_1",
            Degrees(0.0),
            Degrees(0.0),
            CellId::new(2),
            MtCo2(10.0),
            DollarsM(0.0),
            DollarsPerTonne(0.0),
        );
        let mut spaths = HashMap::new();
        spaths.insert(
            ("source_1".to_string(), "sink_1".to_string()),
            path(vec![CellId::new(1), CellId::new(2)]),
        );
        let routed = RoutedNetwork {
            assets: vec![source, sink],
            spaths,
        };

        let exported = export_network(&routed, &[]);
        assert_eq!(exported.nodes, vec!["source_1".to_string(), "sink_1".to_string()]);
        assert_eq!(exported.arcs.len(), 2);
        assert!(exported.arcs.contains(&("source_1".to_string(), "sink_1".to_string())));
        assert!(exported.arcs.contains(&("sink_1".to_string(), "source_1".to_string())));
        assert_eq!(
            exported.arc_paths[&("sink_1".to_string(), "source_1".to_string())],
            vec![CellId::new(2), CellId::new(1)]
        );
        assert!(matches!(exported.node_balance["source_1"], NodeBalance::Source(_)));
        assert!(matches!(exported.node_balance["sink_1"], NodeBalance::Sink(_)));
    }

    #[test]
    fn test_unidirectional_pipeline_zeroes_reverse_bounds() {
        let corridor = PipelineCorridor::new(
            "pipe1",
            vec![CellId::new(1), CellId::new(2)],
            FlowType::Unidirectional,
            MtCo2PerYear(0.0),
            MtCo2PerYear(50.0),
        );
        let n1 = Asset::junction(
            co2net_core::JunctionId::Pipeline { carrier: "pipe1".into(), seq: 1 },
            Degrees(0.0),
            Degrees(0.0),
            CellId::new(1),
        );
        let n2 = Asset::junction(
            co2net_core::JunctionId::Pipeline { carrier: "pipe1".into(), seq: 2 },
            Degrees(0.0),
            Degrees(0.0),
            CellId::new(2),
        );
        let mut spaths = HashMap::new();
        spaths.insert(("pipe1_TS1".to_string(), "pipe1_TS2".to_string()), path(vec![CellId::new(1), CellId::new(2)]));
        let routed = RoutedNetwork {
            assets: vec![n1, n2],
            spaths,
        };

        let exported = export_network(&routed, &[corridor]);
        let forward = exported.arc_info("pipe1_TS1", "pipe1_TS2").unwrap();
        let reverse = exported.arc_info("pipe1_TS2", "pipe1_TS1").unwrap();
        assert_eq!(forward.upper_bound, MtCo2PerYear(50.0));
        assert_eq!(reverse.upper_bound, MtCo2PerYear(0.0));
    }

    #[test]
    fn test_bidirectional_pipeline_shares_bounds_both_ways() {
        let corridor = PipelineCorridor::new(
            "pipe1",
            vec![CellId::new(1), CellId::new(2)],
            FlowType::Bidirectional,
            MtCo2PerYear(0.0),
            MtCo2PerYear(50.0),
        );
        let n1 = Asset::junction(
            co2net_core::JunctionId::Pipeline { carrier: "pipe1".into(), seq: 1 },
            Degrees(0.0),
            Degrees(0.0),
            CellId::new(1),
        );
        let n2 = Asset::junction(
            co2net_core::JunctionId::Pipeline { carrier: "pipe1".into(), seq: 2 },
            Degrees(0.0),
            Degrees(0.0),
            CellId::new(2),
        );
        let mut spaths = HashMap::new();
        spaths.insert(("pipe1_TS1".to_string(), "pipe1_TS2".to_string()), path(vec![CellId::new(1), CellId::new(2)]));
        let routed = RoutedNetwork {
            assets: vec![n1, n2],
            spaths,
        };

        let exported = export_network(&routed, &[corridor]);
        let forward = exported.arc_info("pipe1_TS1", "pipe1_TS2").unwrap();
        let reverse = exported.arc_info("pipe1_TS2", "pipe1_TS1").unwrap();
        assert_eq!(forward.upper_bound, MtCo2PerYear(50.0));
        assert_eq!(reverse.upper_bound, MtCo2PerYear(50.0));
    }
}
