//! C8 cost-file reader: streams the ASCII block format (Section 6)
//! into a [`GeoGrid`] + [`CostSurface`] pair, admitting each edge
//! through the grid's bounding-box predicate one row at a time so the
//! full raster is never materialized.
//!
//! Format: six header lines (`ncols`, `nrows`, `xllcorner`,
//! `yllcorner`, `cellsize`, `NODATA_value`, order-independent), a
//! blank line, then for each source cell a row of `source neighbor*`
//! ids followed by a row of `0 weight*` in the same order, terminated
//! by a blank line or end of file.

use std::io::{BufRead, BufReader, Read};

use co2net_core::geo_grid::{CellId, GeoGrid, GridHeader};
use co2net_core::units::{CellSize, Degrees};
use co2net_core::{CostSurface, PlannerError, PlannerResult};
use tracing::{debug, info};

/// Reads the header and body in one pass, optionally cropping the grid
/// to `bbox = (south, west, north, east)` before edges are admitted.
pub fn load_cost_file<R: Read>(
    reader: R,
    bbox: Option<(Degrees, Degrees, Degrees, Degrees)>,
) -> PlannerResult<(GeoGrid, CostSurface)> {
    let mut buf = BufReader::new(reader);
    let header = parse_header(&mut buf)?;
    debug!(ncols = header.ncols, nrows = header.nrows, "parsed cost file header");

    let mut grid = GeoGrid::new(header);
    if let Some((south, west, north, east)) = bbox {
        grid.subset_by_bounding_box(south, west, north, east)?;
    }

    let surface = load_body(&mut buf, &grid)?;
    info!(edges = surface.edge_count(), "loaded cost surface");
    Ok((grid, surface))
}

/// Parses the six header lines into a [`GridHeader`]. Lines are
/// accepted in any order; a blank line before all six are seen is
/// skipped rather than treated as the body's leading separator.
pub fn parse_header<R: BufRead>(reader: &mut R) -> PlannerResult<GridHeader> {
    let mut ncols = None;
    let mut nrows = None;
    let mut xllcorner = None;
    let mut yllcorner = None;
    let mut cellsize = None;
    let mut nodata = None;

    let mut line = String::new();
    while ncols.is_none()
        || nrows.is_none()
        || xllcorner.is_none()
        || yllcorner.is_none()
        || cellsize.is_none()
        || nodata.is_none()
    {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            return Err(PlannerError::BadInput(
                "cost file ended before a complete header was read".into(),
            ));
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let key = parts.next().unwrap_or_default().to_ascii_lowercase();
        let value = parts
            .next()
            .ok_or_else(|| PlannerError::BadInput(format!("header line missing value: {trimmed}")))?;

        match key.as_str() {
            "ncols" => ncols = Some(parse_field(value, "ncols")?),
            "nrows" => nrows = Some(parse_field(value, "nrows")?),
            "xllcorner" => xllcorner = Some(parse_field(value, "xllcorner")?),
            "yllcorner" => yllcorner = Some(parse_field(value, "yllcorner")?),
            "cellsize" => cellsize = Some(parse_field(value, "cellsize")?),
            "nodata_value" => nodata = Some(parse_field(value, "nodata_value")?),
            other => return Err(PlannerError::BadInput(format!("unexpected header field: {other}"))),
        }
    }

    Ok(GridHeader {
        ncols: ncols.unwrap() as u64,
        nrows: nrows.unwrap() as u64,
        xllcorner: Degrees(xllcorner.unwrap()),
        yllcorner: Degrees(yllcorner.unwrap()),
        cellsize: CellSize(cellsize.unwrap()),
        nodata: nodata.unwrap(),
    })
}

fn parse_field(value: &str, field: &str) -> PlannerResult<f64> {
    value
        .parse::<f64>()
        .map_err(|_| PlannerError::BadInput(format!("invalid {field} value: {value}")))
}

/// Streams the remaining `(ids, weights)` row pairs into a
/// [`CostSurface`], delegating admission to [`CostSurface::load_from_rows`].
fn load_body<R: BufRead>(reader: &mut R, grid: &GeoGrid) -> PlannerResult<CostSurface> {
    let mut rows = Vec::new();
    for row in RowIter { reader } {
        rows.push(row?);
    }
    Ok(CostSurface::load_from_rows(grid, rows))
}

struct RowIter<'a, R: BufRead> {
    reader: &'a mut R,
}

impl<'a, R: BufRead> Iterator for RowIter<'a, R> {
    type Item = PlannerResult<(CellId, Vec<CellId>, Vec<f64>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut id_line = String::new();
        match self.reader.read_line(&mut id_line) {
            Ok(0) => return None,
            Ok(_) => {}
            Err(e) => return Some(Err(e.into())),
        }
        if id_line.trim().is_empty() {
            return None;
        }

        let mut ids = id_line.trim().split_whitespace();
        let source = match ids.next().and_then(|s| s.parse::<u64>().ok()) {
            Some(v) => CellId::new(v),
            None => {
                return Some(Err(PlannerError::BadInput(format!(
                    "malformed source-id row: {}",
                    id_line.trim()
                ))))
            }
        };
        let neighbors: Result<Vec<CellId>, _> = ids.map(|s| s.parse::<u64>().map(CellId::new)).collect();
        let neighbors = match neighbors {
            Ok(n) => n,
            Err(_) => {
                return Some(Err(PlannerError::BadInput(format!(
                    "malformed neighbor-id row: {}",
                    id_line.trim()
                ))))
            }
        };

        let mut weight_line = String::new();
        match self.reader.read_line(&mut weight_line) {
            Ok(0) => {
                return Some(Err(PlannerError::BadInput(
                    "cost file ended mid-row: missing weight line".into(),
                )))
            }
            Ok(_) => {}
            Err(e) => return Some(Err(e.into())),
        }

        let mut weights_iter = weight_line.trim().split_whitespace();
        if weights_iter.next().is_none() {
            return Some(Err(PlannerError::BadInput(format!(
                "malformed weight row: {}",
                weight_line.trim()
            ))));
        }
        let weights: Result<Vec<f64>, _> = weights_iter.map(|s| s.parse::<f64>()).collect();
        let weights = match weights {
            Ok(w) => w,
            Err(_) => {
                return Some(Err(PlannerError::BadInput(format!(
                    "malformed weight row: {}",
                    weight_line.trim()
                ))))
            }
        };

        if weights.len() != neighbors.len() {
            return Some(Err(PlannerError::BadInput(format!(
                "source {source} has {} neighbors but {} weights",
                neighbors.len(),
                weights.len()
            ))));
        }

        Some(Ok((source, neighbors, weights)))
    }
}
