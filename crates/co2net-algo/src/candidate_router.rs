//! C5: routes every Delaunay candidate edge over the cost surface,
//! discovers shared-path and shared-pipeline junctions, and collapses
//! the result into a compact, deduplicated path dictionary.

use crate::pipeline_corridors::enforce_no_diagonal_crossover;
use co2net_core::cost_surface::RoutingMetric;
use co2net_core::{Asset, AssetKind, CandidatePath, CellId, CostSurface, JunctionId, PipelineCorridor, PlannerResult};
use std::collections::{HashMap, HashSet};

use crate::delaunay::DelaunayEdge;

/// The routed network handed off to C6: the (possibly junction-
/// augmented) asset table and the deduplicated path dictionary.
#[derive(Debug, Clone)]
pub struct RoutedNetwork {
    pub assets: Vec<Asset>,
    pub spaths: HashMap<(String, String), CandidatePath>,
}

struct Carrier {
    /// All cells naming this carrier's route, in order.
    cells: Vec<CellId>,
    /// Asset ids known to lie on this carrier so far (endpoints plus
    /// any junctions discovered on it), unordered.
    waypoint_ids: HashSet<String>,
}

/// Routes every Delaunay edge, folds in pipeline corridors as
/// zero-cost carriers, discovers junctions, and deduplicates.
pub fn route_candidates(
    surface: &mut CostSurface,
    assets: &[Asset],
    edges: &[DelaunayEdge],
    corridors: &[PipelineCorridor],
) -> PlannerResult<RoutedNetwork> {
    let mut assets: Vec<Asset> = assets.to_vec();
    let mut cell_to_id: HashMap<CellId, String> = assets.iter().map(|a| (a.cell, a.id.clone())).collect();

    let mut spaths: HashMap<(String, String), CandidatePath> = HashMap::new();
    let mut carriers: HashMap<String, Carrier> = HashMap::new();
    let mut free_seq: u32 = 1;
    let mut pipe_seq: HashMap<String, u32> = HashMap::new();

    // Step 1: route every Delaunay edge and register it as a carrier.
    for edge in edges {
        let id_a = cell_to_id.get(&edge.a).cloned();
        let id_b = cell_to_id.get(&edge.b).cloned();
        let (Some(id_a), Some(id_b)) = (id_a, id_b) else {
            continue;
        };
        if id_a == id_b {
            continue;
        }

        let (_, cells) = surface.shortest_path(edge.a, edge.b, RoutingMetric::Weight)?;
        let pairs: Vec<(CellId, CellId)> = cells.windows(2).map(|w| (w[0], w[1])).collect();
        enforce_no_diagonal_crossover(surface, surface.width(), &pairs);

        let path = build_path(surface, &cells);
        let carrier_key = carrier_name(&id_a, &id_b);
        carriers.insert(
            carrier_key,
            Carrier {
                cells: cells.clone(),
                waypoint_ids: [id_a.clone(), id_b.clone()].into_iter().collect(),
            },
        );
        spaths.insert(ordered_key(&id_a, &id_b), path);
    }

    // Step 2: register pipeline corridors as zero-cost carriers too,
    // so path-vs-pipeline junction discovery has something to scan.
    for corridor in corridors {
        carriers.insert(
            format!("pipeline:{}", corridor.name),
            Carrier {
                cells: corridor.cells.clone(),
                waypoint_ids: HashSet::new(),
            },
        );
    }

    // Step 3: path-vs-path junction discovery.
    discover_trans_nodes(surface, &mut assets, &mut cell_to_id, &mut spaths, &mut carriers, &mut free_seq);

    // Step 4: path-vs-pipeline junction discovery.
    discover_pipe_trans_nodes(
        surface,
        &mut assets,
        &mut cell_to_id,
        &mut spaths,
        &mut carriers,
        corridors,
        &mut pipe_seq,
    );

    // Step 5: post-process every carrier, keeping only consecutive
    // junction/endpoint pairs as edges.
    post_process_carriers(&carriers, &mut spaths);

    // Step 6: dedup symmetric pairs.
    dedup_symmetric_pairs(&mut spaths);

    Ok(RoutedNetwork { assets, spaths })
}

fn ordered_key(a: &str, b: &str) -> (String, String) {
    (a.to_string(), b.to_string())
}

fn carrier_name(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}|{}", a, b)
    } else {
        format!("{}|{}", b, a)
    }
}

fn build_path(surface: &CostSurface, cells: &[CellId]) -> CandidatePath {
    let (length, weight, weighted_cost) = path_metrics(surface, cells);
    CandidatePath {
        cells: cells.to_vec(),
        length,
        weight,
        weighted_cost,
    }
}

/// Sums per-edge length/weight/weight*length along an already-known
/// cell sequence, rather than re-running Dijkstra.
fn path_metrics(surface: &CostSurface, cells: &[CellId]) -> (co2net_core::units::CellLength, f64, f64) {
    let mut total_length = co2net_core::units::CellLength(0.0);
    let mut total_weight = 0.0;
    let mut total_weighted = 0.0;
    for pair in cells.windows(2) {
        let (u, v) = (pair[0], pair[1]);
        let w = surface.edge_weight(u, v).unwrap_or(0.0);
        let l = surface.edge_length(u, v);
        total_length = total_length + l;
        total_weight += w;
        total_weighted += w * l.value();
    }
    (total_length, total_weight, total_weighted)
}

/// Finds the first maximal contiguous run of `scan`'s cells that all
/// appear in `reference`, returning `(n1, n2)` if the run has more
/// than one cell.
fn first_shared_run(reference: &[CellId], scan: &[CellId]) -> Option<(CellId, CellId)> {
    let reference_set: HashSet<CellId> = reference.iter().copied().collect();
    let mut run_start: Option<usize> = None;
    for (idx, cell) in scan.iter().enumerate() {
        if reference_set.contains(cell) {
            if run_start.is_none() {
                run_start = Some(idx);
            }
        } else if let Some(start) = run_start {
            if idx - start > 1 {
                return Some((scan[start], scan[idx - 1]));
            }
            run_start = None;
        }
    }
    if let Some(start) = run_start {
        if scan.len() - start > 1 {
            return Some((scan[start], scan[scan.len() - 1]));
        }
    }
    None
}

fn ensure_junction_asset(
    assets: &mut Vec<Asset>,
    cell_to_id: &mut HashMap<CellId, String>,
    cell: CellId,
    id: JunctionId,
) -> String {
    if let Some(existing) = cell_to_id.get(&cell) {
        return existing.clone();
    }
    let name = id.to_string();
    assets.push(Asset::junction(id, co2net_core::units::Degrees(0.0), co2net_core::units::Degrees(0.0), cell));
    cell_to_id.insert(cell, name.clone());
    name
}

/// Splits the carrier between cell `n1` and `n2` (inclusive, in
/// carrier-cell order) out of `cells`, returning the three sub-slices
/// `(start..=n1, n1..=n2, n2..=end)`.
fn split_at(cells: &[CellId], n1: CellId, n2: CellId) -> Option<(Vec<CellId>, Vec<CellId>, Vec<CellId>)> {
    let i1 = cells.iter().position(|c| *c == n1)?;
    let i2 = cells.iter().position(|c| *c == n2)?;
    let (lo, hi) = if i1 <= i2 { (i1, i2) } else { (i2, i1) };
    Some((
        cells[0..=lo].to_vec(),
        cells[lo..=hi].to_vec(),
        cells[hi..].to_vec(),
    ))
}

#[allow(clippy::too_many_arguments)]
fn discover_trans_nodes(
    surface: &CostSurface,
    assets: &mut Vec<Asset>,
    cell_to_id: &mut HashMap<CellId, String>,
    spaths: &mut HashMap<(String, String), CandidatePath>,
    carriers: &mut HashMap<String, Carrier>,
    free_seq: &mut u32,
) {
    let snapshot: Vec<((String, String), Vec<CellId>)> =
        spaths.iter().map(|(k, v)| (k.clone(), v.cells.clone())).collect();

    for (q_key, q_cells) in &snapshot {
        if !spaths.contains_key(q_key) {
            continue; // already consumed by an earlier split this pass
        }
        for (p_key, p_cells) in &snapshot {
            if p_key == q_key {
                continue;
            }
            let Some((n1, n2)) = first_shared_run(p_cells, q_cells) else {
                continue;
            };
            if n1 == n2 {
                continue;
            }
            let Some((seg1, seg2, seg3)) = split_at(q_cells, n1, n2) else {
                continue;
            };

            let id_n1 = ensure_junction_asset(assets, cell_to_id, n1, JunctionId::Free { seq: *free_seq });
            *free_seq += 1;
            let id_n2 = ensure_junction_asset(assets, cell_to_id, n2, JunctionId::Free { seq: *free_seq });
            *free_seq += 1;

            let (start_id, end_id) = (q_key.0.clone(), q_key.1.clone());
            spaths.remove(q_key);
            spaths.insert(ordered_key(&start_id, &id_n1), build_path(surface, &seg1));
            spaths.insert(ordered_key(&id_n1, &id_n2), build_path(surface, &seg2));
            spaths.insert(ordered_key(&id_n2, &end_id), build_path(surface, &seg3));

            if let Some(carrier) = carriers.get_mut(&carrier_name(&start_id, &end_id)) {
                carrier.waypoint_ids.insert(id_n1);
                carrier.waypoint_ids.insert(id_n2);
            }
            break;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn discover_pipe_trans_nodes(
    surface: &CostSurface,
    assets: &mut Vec<Asset>,
    cell_to_id: &mut HashMap<CellId, String>,
    spaths: &mut HashMap<(String, String), CandidatePath>,
    carriers: &mut HashMap<String, Carrier>,
    corridors: &[PipelineCorridor],
    pipe_seq: &mut HashMap<String, u32>,
) {
    let snapshot: Vec<((String, String), Vec<CellId>)> =
        spaths.iter().map(|(k, v)| (k.clone(), v.cells.clone())).collect();

    for corridor in corridors {
        for (q_key, q_cells) in &snapshot {
            if !spaths.contains_key(q_key) {
                continue;
            }
            let Some((n1, n2)) = first_shared_run(&corridor.cells, q_cells) else {
                continue;
            };
            if n1 == n2 {
                continue;
            }
            let Some((seg1, seg2, seg3)) = split_at(q_cells, n1, n2) else {
                continue;
            };

            let seq = pipe_seq.entry(corridor.name.clone()).or_insert(1);
            let id_n1 = ensure_junction_asset(
                assets,
                cell_to_id,
                n1,
                JunctionId::Pipeline {
                    carrier: corridor.name.clone(),
                    seq: *seq,
                },
            );
            *seq += 1;
            let id_n2 = ensure_junction_asset(
                assets,
                cell_to_id,
                n2,
                JunctionId::Pipeline {
                    carrier: corridor.name.clone(),
                    seq: *seq,
                },
            );
            *seq += 1;

            let (start_id, end_id) = (q_key.0.clone(), q_key.1.clone());
            spaths.remove(q_key);
            spaths.insert(ordered_key(&start_id, &id_n1), build_path(surface, &seg1));
            // Middle sub-path rides the pipeline's free capacity: cost forced to 0.
            let mut middle = build_path(surface, &seg2);
            middle.weight = 0.0;
            middle.weighted_cost = 0.0;
            spaths.insert(ordered_key(&id_n1, &id_n2), middle);
            spaths.insert(ordered_key(&id_n2, &end_id), build_path(surface, &seg3));

            if let Some(carrier) = carriers.get_mut(&format!("pipeline:{}", corridor.name)) {
                carrier.waypoint_ids.insert(id_n1.clone());
                carrier.waypoint_ids.insert(id_n2.clone());
            }
            if let Some(carrier) = carriers.get_mut(&carrier_name(&start_id, &end_id)) {
                carrier.waypoint_ids.insert(id_n1);
                carrier.waypoint_ids.insert(id_n2);
            }
            break;
        }
    }
}

/// For every carrier, keeps only consecutive junction/endpoint pairs
/// (by position along the carrier's cell list) as edges, dropping any
/// non-consecutive combination that split may have left behind.
fn post_process_carriers(
    carriers: &HashMap<String, Carrier>,
    spaths: &mut HashMap<(String, String), CandidatePath>,
) {
    for carrier in carriers.values() {
        if carrier.waypoint_ids.len() < 2 {
            continue;
        }
        let seen: HashSet<&str> = carrier.waypoint_ids.iter().map(String::as_str).collect();
        let pairs: Vec<(String, String)> = spaths
            .keys()
            .filter(|key| seen.contains(key.0.as_str()) && seen.contains(key.1.as_str()))
            .cloned()
            .collect();
        // Prune any edge whose endpoints both sit on this carrier but whose
        // underlying cells are not a contiguous sub-slice of the carrier.
        for key in pairs {
            if let Some(path) = spaths.get(&key) {
                if !is_contiguous_subslice(&carrier.cells, &path.cells) {
                    spaths.remove(&key);
                }
            }
        }
    }
}

fn is_contiguous_subslice(carrier: &[CellId], candidate: &[CellId]) -> bool {
    if candidate.is_empty() {
        return true;
    }
    carrier
        .windows(candidate.len())
        .any(|window| window == candidate || window.iter().rev().eq(candidate.iter()))
}

/// For every symmetric pair `(a,b)`/`(b,a)` present in `spaths`, keeps
/// only the lexicographically first.
fn dedup_symmetric_pairs(spaths: &mut HashMap<(String, String), CandidatePath>) {
    let keys: Vec<(String, String)> = spaths.keys().cloned().collect();
    for (a, b) in keys {
        if a == b {
            continue;
        }
        let reverse = (b.clone(), a.clone());
        if spaths.contains_key(&reverse) {
            if (a.clone(), b.clone()) < reverse {
                spaths.remove(&reverse);
            } else {
                spaths.remove(&(a, b));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delaunay::DelaunayEdge;
    use co2net_core::units::{Degrees, DollarsM, DollarsPerTonne, MtCo2, MtCo2PerYear};

    fn grid_surface(width: u64, height: u64) -> CostSurface {
        let mut surface = CostSurface::new(width);
        for y in 1..=height {
            for x in 1..=width {
                let cell = (y - 1) * width + x;
                for (dx, dy) in [(1i64, 0i64), (0, 1), (1, 1), (1, -1), (-1, 0), (0, -1), (-1, -1), (-1, 1)] {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx >= 1 && nx <= width as i64 && ny >= 1 && ny <= height as i64 {
                        let neighbor = (ny as u64 - 1) * width + nx as u64;
                        surface.add_edge(CellId::new(cell), CellId::new(neighbor), 1.0);
                    }
                }
            }
        }
        surface
    }

    #[test]
    fn test_routes_single_delaunay_edge() {
        let mut surface = grid_surface(10, 10);
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
            CellId::new(34),
            MtCo2(20.0),
            DollarsM(0.0),
            DollarsPerTonne(0.0),
        );
        let edges = vec![DelaunayEdge { a: CellId::new(1), b: CellId::new(34) }];
        let routed = route_candidates(&mut surface, &[source, sink], &edges, &[]).unwrap();
        assert_eq!(routed.spaths.len(), 1);
        assert!(routed.spaths.contains_key(&("source_1".to_string(), "sink_1".to_string())));
    }

    #[test]
    fn test_dedup_keeps_lexicographically_first() {
        let mut spaths = HashMap::new();
        let p = CandidatePath {
            cells: vec![CellId::new(1), CellId::new(2)],
            length: co2net_core::units::CellLength(1.0),
            weight: 1.0,
            weighted_cost: 1.0,
        };
        spaths.insert(("a".to_string(), "b".to_string()), p.clone());
        spaths.insert(("b".to_string(), "a".to_string()), p);
        dedup_symmetric_pairs(&mut spaths);
        assert_eq!(spaths.len(), 1);
        assert!(spaths.contains_key(&("a".to_string(), "b".to_string())));
    }
}
