//! C3: 2-D Delaunay triangulation of asset points, reduced to the
//! unique undirected candidate edge list between assets.

use co2net_core::CellId;
use std::collections::HashSet;

/// An undirected candidate edge between two asset cells, with `a <
/// b` so equal edges compare equal regardless of discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelaunayEdge {
    pub a: CellId,
    pub b: CellId,
}

impl DelaunayEdge {
    fn new(p: CellId, q: CellId) -> Self {
        if p <= q {
            Self { a: p, b: q }
        } else {
            Self { a: q, b: p }
        }
    }
}

/// 2-D point used only for triangulation; `x`/`y` are grid columns
/// and rows, not geographic degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub cell: CellId,
}

/// Computes the unique undirected Delaunay edges over `points`.
///
/// Fewer than two points yields no edges. Exactly two points is the
/// degenerate case: the single edge between them, since a
/// triangulation needs at least three non-collinear points.
pub fn triangulate(points: &[Point]) -> Vec<DelaunayEdge> {
    match points.len() {
        0 | 1 => Vec::new(),
        2 => vec![DelaunayEdge::new(points[0].cell, points[1].cell)],
        _ => {
            let coords: Vec<delaunator::Point> = points
                .iter()
                .map(|p| delaunator::Point { x: p.x, y: p.y })
                .collect();
            let triangulation = delaunator::triangulate(&coords);

            let mut seen = HashSet::new();
            let mut edges = Vec::new();
            for tri in triangulation.triangles.chunks(3) {
                let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
                for (i, j) in [(i0, i1), (i1, i2), (i2, i0)] {
                    let edge = DelaunayEdge::new(points[i].cell, points[j].cell);
                    if seen.insert(edge) {
                        edges.push(edge);
                    }
                }
            }
            edges
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64, cell: u64) -> Point {
        Point {
            x,
            y,
            cell: CellId::new(cell),
        }
    }

    #[test]
    fn test_empty_and_single_point() {
        assert!(triangulate(&[]).is_empty());
        assert!(triangulate(&[pt(0.0, 0.0, 1)]).is_empty());
    }

    #[test]
    fn test_two_points_degenerate_case() {
        let edges = triangulate(&[pt(0.0, 0.0, 1), pt(10.0, 10.0, 2)]);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0], DelaunayEdge::new(CellId::new(1), CellId::new(2)));
    }

    #[test]
    fn test_triangle_has_three_unique_edges() {
        let points = vec![pt(0.0, 0.0, 1), pt(10.0, 0.0, 2), pt(5.0, 10.0, 3)];
        let edges = triangulate(&points);
        assert_eq!(edges.len(), 3);

        let mut seen = HashSet::new();
        for e in &edges {
            assert!(seen.insert(*e), "edge {:?} appeared twice", e);
        }
    }

    #[test]
    fn test_square_dedups_shared_diagonal() {
        let points = vec![
            pt(0.0, 0.0, 1),
            pt(10.0, 0.0, 2),
            pt(10.0, 10.0, 3),
            pt(0.0, 10.0, 4),
        ];
        let edges = triangulate(&points);
        // 4 square sides + 1 shared diagonal = 5 unique edges, never 6
        // (which would mean the diagonal was double-counted).
        assert_eq!(edges.len(), 5);
    }
}
