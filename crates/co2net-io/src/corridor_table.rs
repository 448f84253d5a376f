//! C8 pipeline-corridor table reader (Section 6): tabular rows with
//! `Name`, `Lat`, `Long`, `Lower Cap`, `Upper Cap`. Consecutive rows
//! sharing the same `Name` are one corridor's ordered vertex list.
//!
//! The table carries no explicit flow-direction column. This
//! implementation infers it from the corridor's lower bound: a
//! nonzero lower bound means some forward flow is mandatory, which
//! only makes sense for a one-way corridor, so it is read as
//! [`FlowType::Unidirectional`]; a zero lower bound is read as
//! [`FlowType::Bidirectional`] (see `DESIGN.md`).

use std::io::Read;

use co2net_core::geo_grid::GeoGrid;
use co2net_core::units::{Degrees, MtCo2PerYear};
use co2net_core::{Diagnostics, FlowType, PipelineCorridor, PlannerError, PlannerResult};
use tracing::info;

const COL_NAME: &str = "Name";
const COL_LAT: &str = "Lat";
const COL_LONG: &str = "Long";
const COL_LOWER_CAP: &str = "Lower Cap";
const COL_UPPER_CAP: &str = "Upper Cap";

pub fn read_corridor_table<R: Read>(
    reader: R,
    grid: &GeoGrid,
) -> PlannerResult<(Vec<PipelineCorridor>, Diagnostics)> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| PlannerError::Parse(e.to_string()))?
        .clone();
    let mut diagnostics = Diagnostics::new();

    struct Group {
        name: String,
        lower: f64,
        upper: f64,
        cells: Vec<co2net_core::CellId>,
    }
    let mut groups: Vec<Group> = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| PlannerError::Parse(e.to_string()))?;
        let line_no = line + 2;

        let name = cell(&record, &headers, COL_NAME)
            .map(str::to_string)
            .ok_or_else(|| PlannerError::BadInput(format!("corridor row {line_no} missing Name")))?;
        let lat = parse_numeric(&record, &headers, COL_LAT, line_no, &mut diagnostics);
        let lon = parse_numeric(&record, &headers, COL_LONG, line_no, &mut diagnostics);
        let lower = parse_numeric(&record, &headers, COL_LOWER_CAP, line_no, &mut diagnostics);
        let upper = parse_numeric(&record, &headers, COL_UPPER_CAP, line_no, &mut diagnostics);
        let cell_id = grid.lat_lon_to_cell(Degrees(lat), Degrees(lon))?;

        match groups.last_mut() {
            Some(group) if group.name == name => {
                group.cells.push(cell_id);
            }
            _ => {
                groups.push(Group {
                    name,
                    lower,
                    upper,
                    cells: vec![cell_id],
                });
            }
        }
    }

    let corridors = groups
        .into_iter()
        .map(|group| {
            let flow_type = if group.lower > 0.0 {
                FlowType::Unidirectional
            } else {
                FlowType::Bidirectional
            };
            PipelineCorridor::new(
                group.name,
                group.cells,
                flow_type,
                MtCo2PerYear(group.lower),
                MtCo2PerYear(group.upper),
            )
        })
        .collect::<Vec<_>>();

    info!(count = corridors.len(), "read pipeline corridor table");
    Ok((corridors, diagnostics))
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
    fn test_groups_consecutive_rows_by_name() {
        let csv = "Name,Lat,Long,Lower Cap,Upper Cap\n\
                   pipe1,36.0,-96.9,0,50\n\
                   pipe1,35.96,-96.72,0,50\n";
        let (corridors, _) = read_corridor_table(csv.as_bytes(), &grid()).unwrap();
        assert_eq!(corridors.len(), 1);
        assert_eq!(corridors[0].cells.len(), 2);
        assert_eq!(corridors[0].flow_type, FlowType::Bidirectional);
    }

    #[test]
    fn test_nonzero_lower_cap_is_unidirectional() {
        let csv = "Name,Lat,Long,Lower Cap,Upper Cap\n\
                   pipe1,36.0,-96.9,5,50\n\
                   pipe1,35.96,-96.72,5,50\n";
        let (corridors, _) = read_corridor_table(csv.as_bytes(), &grid()).unwrap();
        assert_eq!(corridors[0].flow_type, FlowType::Unidirectional);
        assert_eq!(corridors[0].lower_bound, MtCo2PerYear(5.0));
    }

    #[test]
    fn test_two_distinct_corridors() {
        let csv = "Name,Lat,Long,Lower Cap,Upper Cap\n\
                   pipe1,36.0,-96.9,0,50\n\
                   pipe1,35.96,-96.72,0,50\n\
                   pipe2,35.0,-95.0,0,30\n\
                   pipe2,35.1,-95.1,0,30\n";
        let (corridors, _) = read_corridor_table(csv.as_bytes(), &grid()).unwrap();
        assert_eq!(corridors.len(), 2);
        assert_eq!(corridors[1].name, "pipe2");
    }
}
