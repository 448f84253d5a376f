//! C4: rasterize user-provided pipeline polylines onto the cost
//! surface as zero-cost (or zero-forward/blocked-backward) edges, and
//! enforce tie-in and diagonal-crossover invariants around them.

use co2net_core::cost_surface::{RoutingMetric, BLOCKED};
use co2net_core::{CellId, CostSurface, FlowType, PipelineCorridor};

/// Which side of a tie-in point to exclude ingress/egress from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionSide {
    Before,
    After,
}

/// Imports `corridor` onto `surface`: expands non-adjacent vertex
/// pairs by shortest path, then patches each adjacent pair's edge
/// weights per the corridor's flow type.
///
/// Returns the corridor with its vertex list expanded to a fully
/// 8-adjacent polyline (the input corridor may have been defined by
/// sparse waypoints).
pub fn import_corridor(
    surface: &mut CostSurface,
    corridor: &PipelineCorridor,
) -> co2net_core::PlannerResult<PipelineCorridor> {
    let expanded = expand_to_adjacent(surface, &corridor.cells)?;

    for window in expanded.windows(2) {
        let (u, v) = (window[0], window[1]);
        match corridor.flow_type {
            FlowType::Bidirectional => {
                surface.set_weight(u, v, 0.0);
                surface.set_weight(v, u, 0.0);
            }
            FlowType::Unidirectional => {
                surface.set_weight(u, v, 0.0);
                surface.set_weight(v, u, BLOCKED);
            }
        }
    }

    Ok(PipelineCorridor::new(
        corridor.name.clone(),
        expanded,
        corridor.flow_type,
        corridor.lower_bound,
        corridor.upper_bound,
    ))
}

/// Inserts a shortest-path hop between any two consecutive vertices
/// that are not already 8-adjacent on the grid.
fn expand_to_adjacent(
    surface: &CostSurface,
    cells: &[CellId],
) -> co2net_core::PlannerResult<Vec<CellId>> {
    if cells.len() < 2 {
        return Ok(cells.to_vec());
    }

    let mut expanded = vec![cells[0]];
    for pair in cells.windows(2) {
        let (u, v) = (pair[0], pair[1]);
        if is_eight_adjacent(surface, u, v) {
            expanded.push(v);
        } else {
            let (_, path) = surface.shortest_path(u, v, RoutingMetric::Weight)?;
            expanded.extend(path.into_iter().skip(1));
        }
    }
    Ok(expanded)
}

fn is_eight_adjacent(surface: &CostSurface, u: CellId, v: CellId) -> bool {
    let width = surface.width();
    let diff = u.get().abs_diff(v.get());
    diff == 1 || diff == width || is_diagonal_diff(diff, width)
}

fn is_diagonal_diff(diff: u64, width: u64) -> bool {
    width > 0 && (diff == width - 1 || diff == width + 1)
}

/// Models the four `enforceTiePoints` cases from a tie-in point (or
/// pair of points) on `corridor`, blocking all other ingress/egress
/// into the corridor's vertex set.
pub fn enforce_tie_points(
    surface: &mut CostSurface,
    corridor: &PipelineCorridor,
    point1: Option<CellId>,
    point2: Option<CellId>,
    exclusion: bool,
    side: ExclusionSide,
) {
    let vertices = &corridor.cells;

    let exclusion_list: Vec<CellId> = match (point1, point2) {
        (Some(p1), Some(p2)) if !exclusion => {
            // Case 1: block all non-tie ingress/egress.
            vertices.clone().into_iter().filter(|c| *c != p1 && *c != p2).collect()
        }
        (Some(p1), Some(p2)) => {
            // Case 2: block everything strictly outside [p1..p2].
            let (i1, i2) = match (index_of(vertices, p1), index_of(vertices, p2)) {
                (Some(a), Some(b)) => (a.min(b), a.max(b)),
                _ => return,
            };
            vertices
                .iter()
                .enumerate()
                .filter(|(idx, c)| (*idx < i1 || *idx > i2) && **c != p1 && **c != p2)
                .map(|(_, c)| *c)
                .collect()
        }
        (Some(p), None) | (None, Some(p)) if !exclusion => {
            // Case 3: single point, block everything else but the tie.
            vertices.clone().into_iter().filter(|c| *c != p).collect()
        }
        (Some(p), None) | (None, Some(p)) => {
            // Case 4: single point, block one side only.
            let idx = match index_of(vertices, p) {
                Some(i) => i,
                None => return,
            };
            match side {
                ExclusionSide::Before => vertices[..idx].to_vec(),
                ExclusionSide::After => vertices[idx + 1..].to_vec(),
            }
        }
        (None, None) => return,
    };

    block_external_edges(surface, vertices, &exclusion_list);
}

fn index_of(vertices: &[CellId], target: CellId) -> Option<usize> {
    vertices.iter().position(|c| *c == target)
}

/// Sets `BLOCKED` on every edge crossing from an excluded corridor
/// cell to something outside the corridor, and vice versa.
fn block_external_edges(surface: &mut CostSurface, vertices: &[CellId], excluded: &[CellId]) {
    for &cell in excluded {
        for neighbor in surface.neighbors(cell).collect::<Vec<_>>() {
            if !vertices.contains(&neighbor) {
                surface.set_weight(cell, neighbor, BLOCKED);
                surface.set_weight(neighbor, cell, BLOCKED);
            }
        }
    }
}

/// For each consecutive pair in `path` whose index difference equals
/// `width ± 1` (a diagonal move), blocks the opposing diagonal so the
/// resulting polyline cannot visually cross itself.
pub fn enforce_no_diagonal_crossover(surface: &mut CostSurface, width: u64, path: &[(CellId, CellId)]) {
    for &(u, v) in path {
        let diff = u.get().abs_diff(v.get());
        let (lower, upper) = if u.get() < v.get() { (u.get(), v.get()) } else { (v.get(), u.get()) };

        if diff == width + 1 {
            let lower_diag = CellId::new(lower + 1);
            let upper_diag = CellId::new(upper - 1);
            surface.set_weight(lower_diag, upper_diag, BLOCKED);
            surface.set_weight(upper_diag, lower_diag, BLOCKED);
        } else if diff == width {
            let lower_diag = CellId::new(lower - 1);
            let upper_diag = CellId::new(upper + 1);
            surface.set_weight(lower_diag, upper_diag, BLOCKED);
            surface.set_weight(upper_diag, lower_diag, BLOCKED);
        }
    }
}
