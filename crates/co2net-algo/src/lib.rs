//! # co2net-algo: candidate network construction and MILP optimization
//!
//! Builds on `co2net-core`'s grid/cost-surface primitives to produce a
//! routed candidate network and solve the capacity-expansion MILP over
//! it.
//!
//! ## Pipeline
//!
//! | Stage | Module | Responsibility |
//! |---|---|---|
//! | C3 | [`delaunay`] | Candidate topology: which asset pairs are worth routing |
//! | C4 | [`pipeline_corridors`] | Rasterize existing pipelines onto the cost surface |
//! | C5 | [`candidate_router`] | Route every candidate edge, discover junctions |
//! | C6 | [`network_exporter`] | Assign stable node ids, assemble the arc list |
//! | C7 | [`milp`] | Build and solve the capacity-expansion MILP |
//!
//! Candidate routing (C5) is the largest stage: it runs Dijkstra over
//! every Delaunay edge, then repeatedly looks for shared sub-paths
//! between carriers to split into junctions, before deduplicating
//! symmetric path pairs.

pub mod candidate_router;
pub mod delaunay;
pub mod milp;
pub mod network_exporter;
pub mod pipeline_corridors;

pub use candidate_router::{route_candidates, RoutedNetwork};
pub use delaunay::{triangulate, DelaunayEdge, Point};
pub use milp::{solve, MilpError, MilpModel, MilpSolution};
pub use network_exporter::{export_network, ExportedNetwork};
pub use pipeline_corridors::{enforce_no_diagonal_crossover, enforce_tie_points, import_corridor, ExclusionSide};
