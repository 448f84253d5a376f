//! # co2net-core: CO2 Network Planning Core
//!
//! Domain types and deterministic geo-raster/graph primitives for the
//! CO2 capture-transport-storage network planner.
//!
//! ## Pipeline
//!
//! ```text
//! GeoGrid (C1) ─┬─> CostSurface (C2) ──> CandidateRouter (C5) ──> NetworkExporter (C6) ──> MilpModel (C7)
//!               └─> PipelineCorridors (C4) mutates CostSurface before C5 runs.
//! ```
//!
//! This crate owns C1 and C2 plus the shared domain model (Section 3
//! of the design): [`Asset`], [`PipelineCorridor`], [`CandidatePath`],
//! and [`Arc`]. Triangulation, routing, junction discovery, export,
//! and the MILP itself live in `co2net-algo`.
//!
//! ```
//! use co2net_core::geo_grid::{GeoGrid, GridHeader};
//! use co2net_core::units::{Degrees, CellSize};
//!
//! let grid = GeoGrid::new(GridHeader {
//!     ncols: 100,
//!     nrows: 100,
//!     xllcorner: Degrees(-98.0),
//!     yllcorner: Degrees(35.0),
//!     cellsize: CellSize(0.01),
//!     nodata: -9999.0,
//! });
//! let cell = grid.lat_lon_to_cell(Degrees(35.5), Degrees(-97.5)).unwrap();
//! assert!(cell.get() >= 1);
//! ```

pub mod cost_surface;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod geo_grid;
pub mod units;

pub use cost_surface::{CostSurface, RoutingMetric, BLOCKED};
pub use diagnostics::{DiagnosticIssue, Diagnostics, ImportDiagnostics, ImportStats, Severity};
pub use domain::{Arc, Asset, AssetKind, CandidatePath, FlowType, JunctionId, PipelineCorridor};
pub use error::{PlannerError, PlannerResult};
pub use geo_grid::{CellId, GeoGrid, GridHeader, GridXY};
