//! C8 source/sink table reader (Section 6): tabular rows with `ID`,
//! `UNIQUE NAME`, `Lat`, `Lon`, `X loc`, `Y loc`, a capacity column
//! (`Capture Capacity (MTCO2/yr)` for sources, `Storage Capacity
//! (MTCO2)` for sinks), `Total Unit Cost ($/tCO2)`, `Fixed Cost
//! ($M)`, `Operating Cost ($/tCO2)`.
//!
//! When both Fixed Cost and Operating Cost are zero (or absent), the
//! variable cost falls back to Total Unit Cost — see `SPEC_FULL.md`
//! section 9. Missing or unparseable numeric cells default to zero
//! and are recorded in the returned [`Diagnostics`] rather than
//! failing the row.

use std::io::Read;

use co2net_core::geo_grid::GeoGrid;
use co2net_core::units::{Degrees, DollarsM, DollarsPerTonne, MtCo2, MtCo2PerYear};
use co2net_core::{Asset, Diagnostics, PlannerError, PlannerResult};
use tracing::info;

const COL_ID: &str = "ID";
const COL_LAT: &str = "Lat";
const COL_LON: &str = "Lon";
const COL_TOTAL_UNIT_COST: &str = "Total Unit Cost ($/tCO2)";
const COL_FIXED_COST: &str = "Fixed Cost ($M)";
const COL_OPERATING_COST: &str = "Operating Cost ($/tCO2)";
const COL_CAPTURE_CAPACITY: &str = "Capture Capacity (MTCO2/yr)";
const COL_STORAGE_CAPACITY: &str = "Storage Capacity (MTCO2)";

/// Reads a capture-source table into [`Asset`]s with `source_`-prefixed ids.
pub fn read_source_table<R: Read>(reader: R, grid: &GeoGrid) -> PlannerResult<(Vec<Asset>, Diagnostics)> {
    read_table(reader, grid, COL_CAPTURE_CAPACITY, "source_", Asset::source, MtCo2PerYear)
}

/// Reads a storage-sink table into [`Asset`]s with `sink_`-prefixed ids.
pub fn read_sink_table<R: Read>(reader: R, grid: &GeoGrid) -> PlannerResult<(Vec<Asset>, Diagnostics)> {
    read_table(reader, grid, COL_STORAGE_CAPACITY, "sink_", Asset::sink, MtCo2)
}

fn read_table<R: Read, C: Copy>(
    reader: R,
    grid: &GeoGrid,
    capacity_column: &str,
    id_prefix: &str,
    make_asset: fn(String, Degrees, Degrees, co2net_core::CellId, C, DollarsM, DollarsPerTonne) -> Asset,
    wrap_capacity: fn(f64) -> C,
) -> PlannerResult<(Vec<Asset>, Diagnostics)> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| PlannerError::Parse(e.to_string()))?
        .clone();
    let mut diagnostics = Diagnostics::new();
    let mut assets = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| PlannerError::Parse(e.to_string()))?;
        let line_no = line + 2; // account for the header row, 1-based

        let id = cell(&record, &headers, COL_ID)
            .map(|s| format!("{id_prefix}{s}"))
            .unwrap_or_else(|| format!("{id_prefix}row{line_no}"));

        let lat = parse_numeric(&record, &headers, COL_LAT, line_no, &mut diagnostics);
        let lon = parse_numeric(&record, &headers, COL_LON, line_no, &mut diagnostics);
        let capacity = parse_numeric(&record, &headers, capacity_column, line_no, &mut diagnostics);
        let total_unit_cost = parse_numeric(&record, &headers, COL_TOTAL_UNIT_COST, line_no, &mut diagnostics);
        let fixed_cost = parse_numeric(&record, &headers, COL_FIXED_COST, line_no, &mut diagnostics);
        let operating_cost = parse_numeric(&record, &headers, COL_OPERATING_COST, line_no, &mut diagnostics);

        let variable_cost = if fixed_cost == 0.0 && operating_cost == 0.0 {
            total_unit_cost
        } else {
            operating_cost
        };

        let cell_id = grid.lat_lon_to_cell(Degrees(lat), Degrees(lon))?;

        assets.push(make_asset(
            id,
            Degrees(lat),
            Degrees(lon),
            cell_id,
            wrap_capacity(capacity),
            DollarsM(fixed_cost),
            DollarsPerTonne(variable_cost),
        ));
    }

    info!(count = assets.len(), prefix = id_prefix, "read asset table");
    Ok((assets, diagnostics))
}

fn cell<'r>(record: &'r csv::StringRecord, headers: &csv::StringRecord, name: &str) -> Option<&'r str> {
    let idx = headers.iter().position(|h| h == name)?;
    record.get(idx).filter(|s| !s.trim().is_empty())
}

fn parse_numeric(
    record: &csv::StringRecord,
    headers: &csv::StringRecord,
    name: &str,
    line: usize,
    diagnostics: &mut Diagnostics,
) -> f64 {
    match cell(record, headers, name) {
        Some(raw) => raw.trim().parse::<f64>().unwrap_or_else(|_| {
            diagnostics.add_warning_at_line("parse", &format!("defaulted unparseable {name} to 0"), line);
            0.0
        }),
        None => {
            diagnostics.add_warning_at_line("parse", &format!("defaulted missing {name} to 0"), line);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use co2net_core::geo_grid::GridHeader;
    use co2net_core::units::CellSize;

    fn grid() -> GeoGrid {
        GeoGrid::new(GridHeader {
            ncols: 1000,
            nrows: 1000,
            xllcorner: Degrees(-100.0),
            yllcorner: Degrees(30.0),
            cellsize: CellSize(0.01),
            nodata: -9999.0,
        })
    }

    #[test]
    fn test_read_source_table_applies_variable_cost_fallback() {
        let csv = "ID,UNIQUE NAME,Lat,Lon,X loc,Y loc,Capture Capacity (MTCO2/yr),Total Unit Cost ($/tCO2),Fixed Cost ($M),Operating Cost ($/tCO2)\n\
                   s1,Plant A,35.5,-97.5,1,1,1.0,15.0,0,0\n";
        let (assets, diagnostics) = read_source_table(csv.as_bytes(), &grid()).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "source_s1");
        assert_eq!(assets[0].variable_cost, DollarsPerTonne(15.0));
        assert!(!diagnostics.has_warnings());
    }

    #[test]
    fn test_read_source_table_uses_operating_cost_when_present() {
        let csv = "ID,UNIQUE NAME,Lat,Lon,X loc,Y loc,Capture Capacity (MTCO2/yr),Total Unit Cost ($/tCO2),Fixed Cost ($M),Operating Cost ($/tCO2)\n\
                   s1,Plant A,35.5,-97.5,1,1,1.0,15.0,2.0,8.0\n";
        let (assets, _) = read_source_table(csv.as_bytes(), &grid()).unwrap();
        assert_eq!(assets[0].variable_cost, DollarsPerTonne(8.0));
        assert_eq!(assets[0].fixed_cost, DollarsM(2.0));
    }

    #[test]
    fn test_missing_numeric_cell_defaults_to_zero_with_warning() {
        let csv = "ID,UNIQUE NAME,Lat,Lon,X loc,Y loc,Capture Capacity (MTCO2/yr),Total Unit Cost ($/tCO2),Fixed Cost ($M),Operating Cost ($/tCO2)\n\
                   s1,Plant A,35.5,-97.5,1,1,,15.0,0,0\n";
        let (assets, diagnostics) = read_source_table(csv.as_bytes(), &grid()).unwrap();
        assert_eq!(assets[0].kind, co2net_core::AssetKind::Source { capacity: MtCo2PerYear(0.0) });
        assert!(diagnostics.has_warnings());
    }

    #[test]
    fn test_read_sink_table_uses_storage_capacity_column() {
        let csv = "ID,UNIQUE NAME,Lat,Lon,X loc,Y loc,Storage Capacity (MTCO2),Total Unit Cost ($/tCO2),Fixed Cost ($M),Operating Cost ($/tCO2)\n\
                   k1,Sink A,35.9,-96.7,1,1,20.0,5.0,0,0\n";
        let (assets, _) = read_sink_table(csv.as_bytes(), &grid()).unwrap();
        assert_eq!(assets[0].id, "sink_k1");
        assert_eq!(assets[0].kind, co2net_core::AssetKind::Sink { capacity: MtCo2(20.0) });
    }
}
