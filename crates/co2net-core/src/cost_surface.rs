//! C2: sparse 8-neighbor weighted-edge store over the subsetted grid,
//! plus Dijkstra routing.

use crate::error::{PlannerError, PlannerResult};
use crate::geo_grid::{edge_length_cells, CellId, GeoGrid};
use crate::units::CellLength;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Sentinel weight rendering an edge non-traversable without removing
/// it from the store, so it can later be restored.
pub const BLOCKED: f64 = 1e9;

/// Which quantity Dijkstra accumulates along a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingMetric {
    /// Sum of edge weights (the reference default).
    Weight,
    /// Sum of weight * length (legacy variant).
    WeightTimesLength,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct EdgeAttrs {
    weight: f64,
    length: CellLength,
}

/// The live, mutable weighted-edge graph over admitted cells.
#[derive(Debug, Clone, Default)]
pub struct CostSurface {
    width: u64,
    edges: HashMap<(CellId, CellId), EdgeAttrs>,
    adjacency: HashMap<CellId, Vec<CellId>>,
}

impl CostSurface {
    pub fn new(width: u64) -> Self {
        Self {
            width,
            edges: HashMap::new(),
            adjacency: HashMap::new(),
        }
    }

    /// Stream-load edges from `(source, neighbors, weights)` triples,
    /// admitting a pair only when `grid.in_bounding_box` holds for
    /// both endpoints.
    pub fn load_from_rows<I>(grid: &GeoGrid, rows: I) -> Self
    where
        I: IntoIterator<Item = (CellId, Vec<CellId>, Vec<f64>)>,
    {
        let mut surface = Self::new(grid.width());
        for (source, neighbors, weights) in rows {
            for (neighbor, weight) in neighbors.into_iter().zip(weights.into_iter()) {
                if grid.in_bounding_box(source, neighbor) {
                    surface.add_edge(source, neighbor, weight);
                }
            }
        }
        surface
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The raster width this surface was built over, used by callers
    /// that need to reason about row-wraparound adjacency.
    pub fn width(&self) -> u64 {
        self.width
    }

    pub fn edge_weight(&self, u: CellId, v: CellId) -> Option<f64> {
        self.edges.get(&(u, v)).map(|a| a.weight)
    }

    /// 1.0 for an orthogonal move, sqrt(2) for a diagonal one, derived
    /// purely from index arithmetic (not from the stored attrs).
    pub fn edge_length(&self, u: CellId, v: CellId) -> CellLength {
        edge_length_cells(self.width, u, v)
    }

    /// Insert or overwrite a directed edge, registering the adjacency
    /// entry if this is the edge's first appearance.
    pub fn add_edge(&mut self, u: CellId, v: CellId, weight: f64) {
        let length = self.edge_length(u, v);
        if self.edges.insert((u, v), EdgeAttrs { weight, length }).is_none() {
            self.adjacency.entry(u).or_default().push(v);
        }
    }

    /// Overwrite an existing edge's weight, adding it if absent.
    pub fn set_weight(&mut self, u: CellId, v: CellId, weight: f64) {
        self.add_edge(u, v, weight);
    }

    pub fn neighbors(&self, u: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.adjacency.get(&u).into_iter().flatten().copied()
    }

    /// Dijkstra over the live surface. Ties are broken by preferring
    /// the lower neighbor-cell id, then the lower accumulated cost.
    pub fn shortest_path(
        &self,
        src: CellId,
        dst: CellId,
        metric: RoutingMetric,
    ) -> PlannerResult<(f64, Vec<CellId>)> {
        if src == dst {
            return Ok((0.0, vec![src]));
        }

        let mut dist: HashMap<CellId, f64> = HashMap::new();
        let mut prev: HashMap<CellId, CellId> = HashMap::new();
        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();

        dist.insert(src, 0.0);
        heap.push(HeapEntry {
            cost: 0.0,
            cell: src,
        });

        while let Some(HeapEntry { cost, cell }) = heap.pop() {
            if cell == dst {
                break;
            }
            if cost > *dist.get(&cell).unwrap_or(&f64::INFINITY) {
                continue;
            }

            let mut neighbors: Vec<CellId> = self.neighbors(cell).collect();
            neighbors.sort();

            for neighbor in neighbors {
                let attrs = match self.edges.get(&(cell, neighbor)) {
                    Some(a) => a,
                    None => continue,
                };
                if attrs.weight >= BLOCKED {
                    continue;
                }
                let step = match metric {
                    RoutingMetric::Weight => attrs.weight,
                    RoutingMetric::WeightTimesLength => attrs.weight * attrs.length.value(),
                };
                let next_cost = cost + step;
                let better = next_cost < *dist.get(&neighbor).unwrap_or(&f64::INFINITY);
                if better {
                    dist.insert(neighbor, next_cost);
                    prev.insert(neighbor, cell);
                    heap.push(HeapEntry {
                        cost: next_cost,
                        cell: neighbor,
                    });
                }
            }
        }

        let total = *dist
            .get(&dst)
            .ok_or(PlannerError::Unreachable {
                from: src.get(),
                to: dst.get(),
            })?;

        let mut path = vec![dst];
        let mut current = dst;
        while current != src {
            current = *prev.get(&current).ok_or(PlannerError::Unreachable {
                from: src.get(),
                to: dst.get(),
            })?;
            path.push(current);
        }
        path.reverse();

        Ok((total, path))
    }
}

/// Min-heap entry ordered by cost ascending, then cell id ascending so
/// the heap pops the lower neighbor-cell id on a cost tie.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    cost: f64,
    cell: CellId,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_surface() -> CostSurface {
        let mut surface = CostSurface::new(10);
        surface.add_edge(CellId::new(1), CellId::new(2), 1.0);
        surface.add_edge(CellId::new(2), CellId::new(1), 1.0);
        surface.add_edge(CellId::new(2), CellId::new(3), 1.0);
        surface.add_edge(CellId::new(3), CellId::new(2), 1.0);
        surface.add_edge(CellId::new(1), CellId::new(3), 5.0);
        surface.add_edge(CellId::new(3), CellId::new(1), 5.0);
        surface
    }

    #[test]
    fn test_shortest_path_prefers_cheaper_route() {
        let surface = line_surface();
        let (cost, path) = surface
            .shortest_path(CellId::new(1), CellId::new(3), RoutingMetric::Weight)
            .unwrap();
        assert_eq!(cost, 2.0);
        assert_eq!(path, vec![CellId::new(1), CellId::new(2), CellId::new(3)]);
    }

    #[test]
    fn test_blocked_edge_is_impassable() {
        let mut surface = CostSurface::new(10);
        surface.add_edge(CellId::new(1), CellId::new(2), BLOCKED);
        let err = surface
            .shortest_path(CellId::new(1), CellId::new(2), RoutingMetric::Weight)
            .unwrap_err();
        assert!(matches!(err, PlannerError::Unreachable { .. }));
    }

    #[test]
    fn test_set_weight_can_zero_out_pipeline_edge() {
        let mut surface = line_surface();
        surface.set_weight(CellId::new(1), CellId::new(3), 0.0);
        surface.set_weight(CellId::new(3), CellId::new(1), 0.0);
        let (cost, path) = surface
            .shortest_path(CellId::new(1), CellId::new(3), RoutingMetric::Weight)
            .unwrap();
        assert_eq!(cost, 0.0);
        assert_eq!(path, vec![CellId::new(1), CellId::new(3)]);
    }

    #[test]
    fn test_edge_length_matches_geo_grid() {
        let surface = CostSurface::new(10);
        assert_eq!(surface.edge_length(CellId::new(5), CellId::new(6)).value(), 1.0);
        assert!((surface.edge_length(CellId::new(5), CellId::new(14)).value() - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_unreachable_when_no_edges() {
        let surface = CostSurface::new(10);
        let err = surface
            .shortest_path(CellId::new(1), CellId::new(99), RoutingMetric::Weight)
            .unwrap_err();
        assert!(matches!(err, PlannerError::Unreachable { .. }));
    }
}
