//! Section 3 data model: assets, pipeline corridors, candidate paths,
//! and the compact arc representation handed to the MILP stage.

use crate::geo_grid::CellId;
use crate::units::{CellLength, Degrees, DollarsM, DollarsPerTonne, MtCo2, MtCo2PerYear};
use serde::{Deserialize, Serialize};

/// A stable tag for a junction cell, carrying enough provenance to be
/// rendered to a string at export time (`P_TS{k}` or `TS{k}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JunctionId {
    /// A junction discovered on an existing pipeline corridor.
    Pipeline { carrier: String, seq: u32 },
    /// A junction discovered between two candidate paths.
    Free { seq: u32 },
}

impl std::fmt::Display for JunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JunctionId::Pipeline { carrier, seq } => write!(f, "{}_TS{}", carrier, seq),
            JunctionId::Free { seq } => write!(f, "TS{}", seq),
        }
    }
}

/// What kind of asset a node in the network represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssetKind {
    /// Annual capture capacity in MtCO2/yr.
    Source { capacity: MtCo2PerYear },
    /// Total storage capacity in MtCO2.
    Sink { capacity: MtCo2 },
    /// Zero-capacity transshipment node discovered during routing.
    Junction { id: JunctionId },
}

/// A named point asset: a source, a sink, or a discovered junction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub kind: AssetKind,
    pub lat: Degrees,
    pub lon: Degrees,
    pub cell: CellId,
    pub fixed_cost: DollarsM,
    pub variable_cost: DollarsPerTonne,
}

impl Asset {
    pub fn source(
        id: impl Into<String>,
        lat: Degrees,
        lon: Degrees,
        cell: CellId,
        capacity: MtCo2PerYear,
        fixed_cost: DollarsM,
        variable_cost: DollarsPerTonne,
    ) -> Self {
        Self {
            id: id.into(),
            kind: AssetKind::Source { capacity },
            lat,
            lon,
            cell,
            fixed_cost,
            variable_cost,
        }
    }

    pub fn sink(
        id: impl Into<String>,
        lat: Degrees,
        lon: Degrees,
        cell: CellId,
        capacity: MtCo2,
        fixed_cost: DollarsM,
        variable_cost: DollarsPerTonne,
    ) -> Self {
        Self {
            id: id.into(),
            kind: AssetKind::Sink { capacity },
            lat,
            lon,
            cell,
            fixed_cost,
            variable_cost,
        }
    }

    pub fn junction(id: JunctionId, lat: Degrees, lon: Degrees, cell: CellId) -> Self {
        Self {
            id: id.to_string(),
            kind: AssetKind::Junction { id },
            lat,
            lon,
            cell,
            fixed_cost: DollarsM(0.0),
            variable_cost: DollarsPerTonne(0.0),
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self.kind, AssetKind::Source { .. })
    }

    pub fn is_sink(&self) -> bool {
        matches!(self.kind, AssetKind::Sink { .. })
    }

    pub fn is_junction(&self) -> bool {
        matches!(self.kind, AssetKind::Junction { .. })
    }
}

/// Whether flow may run both directions of a corridor, or only one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowType {
    Bidirectional,
    Unidirectional,
}

/// A user-supplied existing pipeline, expressed as an ordered cell
/// polyline with capacity bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCorridor {
    pub name: String,
    pub cells: Vec<CellId>,
    pub flow_type: FlowType,
    pub lower_bound: MtCo2PerYear,
    pub upper_bound: MtCo2PerYear,
}

impl PipelineCorridor {
    pub fn new(
        name: impl Into<String>,
        cells: Vec<CellId>,
        flow_type: FlowType,
        lower_bound: MtCo2PerYear,
        upper_bound: MtCo2PerYear,
    ) -> Self {
        Self {
            name: name.into(),
            cells,
            flow_type,
            lower_bound,
            upper_bound,
        }
    }

    /// Consecutive pairs of cells along the corridor.
    pub fn adjacent_pairs(&self) -> impl Iterator<Item = (CellId, CellId)> + '_ {
        self.cells.windows(2).map(|w| (w[0], w[1]))
    }
}

/// An ordered sequence of raster cells realizing one routed path, with
/// its derived length/weight totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePath {
    pub cells: Vec<CellId>,
    pub length: CellLength,
    pub weight: f64,
    pub weighted_cost: f64,
}

impl CandidatePath {
    pub fn endpoints(&self) -> Option<(CellId, CellId)> {
        match (self.cells.first(), self.cells.last()) {
            (Some(&a), Some(&b)) => Some((a, b)),
            _ => None,
        }
    }
}

/// A directed MILP-ready arc between two named network nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arc {
    pub from: String,
    pub to: String,
    pub path_cells: Vec<CellId>,
    pub length: CellLength,
    pub weight: f64,
    pub weighted_cost: f64,
    pub lower_bound: MtCo2PerYear,
    pub upper_bound: MtCo2PerYear,
}

impl Arc {
    /// Default bounds, used unless both endpoints share an existing
    /// pipeline's inherited bounds.
    pub const DEFAULT_LOWER: MtCo2PerYear = MtCo2PerYear(0.0);
    pub const DEFAULT_UPPER: MtCo2PerYear = MtCo2PerYear(f64::INFINITY);

    pub fn key(&self) -> (String, String) {
        (self.from.clone(), self.to.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_junction_id_display() {
        let pipe = JunctionId::Pipeline {
            carrier: "pipeline1".into(),
            seq: 2,
        };
        assert_eq!(pipe.to_string(), "pipeline1_TS2");

        let free = JunctionId::Free { seq: 3 };
        assert_eq!(free.to_string(), "TS3");
    }

    #[test]
    fn test_asset_kind_predicates() {
        let source = Asset::source(
            "source_1",
            Degrees(35.0),
            Degrees(-97.0),
            CellId::new(1),
            MtCo2PerYear(1.0),
            DollarsM(0.0),
            DollarsPerTonne(0.0),
        );
        assert!(source.is_source());
        assert!(!source.is_sink());
    }

    #[test]
    fn test_corridor_adjacent_pairs() {
        let corridor = PipelineCorridor::new(
            "pipeline1",
            vec![CellId::new(1), CellId::new(2), CellId::new(3)],
            FlowType::Bidirectional,
            MtCo2PerYear(0.0),
            MtCo2PerYear(50.0),
        );
        let pairs: Vec<_> = corridor.adjacent_pairs().collect();
        assert_eq!(pairs, vec![(CellId::new(1), CellId::new(2)), (CellId::new(2), CellId::new(3))]);
    }
}
