//! C1: deterministic (lat, lon) <-> (x, y) <-> cell-index mapping and
//! bounding-box subsetting over a large regular raster, without ever
//! materializing the full grid.
//!
//! Cells are numbered `1..=width*height` in row-major order from the
//! bottom-left (row 1 is southernmost).

use crate::error::{PlannerError, PlannerResult};
use crate::units::{CellSize, Degrees};
use serde::{Deserialize, Serialize};

/// A 1-based linear cell index into the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct CellId(pub u64);

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl CellId {
    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Raster header fields, read verbatim from the cost file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridHeader {
    pub ncols: u64,
    pub nrows: u64,
    pub xllcorner: Degrees,
    pub yllcorner: Degrees,
    pub cellsize: CellSize,
    pub nodata: f64,
}

/// A 1-based (column, row) coordinate pair within the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridXY {
    pub x: u64,
    pub y: u64,
}

/// One row's inclusive `[left, right]` cell-id span admitted by a
/// bounding-box subset. Rows are stored in ascending order so that
/// membership can be resolved with a binary search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct RowBound {
    left: u64,
    right: u64,
}

/// Deterministic geo-raster index, immutable once constructed.
///
/// `subset_by_bounding_box` narrows the region `in_bounding_box` will
/// admit; without a prior subset call every cell within the header's
/// extent is considered in-bounds.
#[derive(Debug, Clone)]
pub struct GeoGrid {
    header: GridHeader,
    row_bounds: Option<Vec<RowBound>>,
}

impl GeoGrid {
    pub fn new(header: GridHeader) -> Self {
        Self {
            header,
            row_bounds: None,
        }
    }

    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    pub fn width(&self) -> u64 {
        self.header.ncols
    }

    pub fn height(&self) -> u64 {
        self.header.nrows
    }

    /// `y = nrows − floor((lat − yll)/cellsize); x = floor((lon − xll)/cellsize) + 1`
    pub fn lat_lon_to_cell(&self, lat: Degrees, lon: Degrees) -> PlannerResult<CellId> {
        let xy = self.lat_lon_to_xy(lat, lon)?;
        Ok(self.xy_to_cell(xy))
    }

    pub fn lat_lon_to_xy(&self, lat: Degrees, lon: Degrees) -> PlannerResult<GridXY> {
        let cellsize = self.header.cellsize.value();
        let y_offset = ((lat.value() - self.header.yllcorner.value()) / cellsize).floor();
        let y = self.header.nrows as f64 - y_offset;
        let x = ((lon.value() - self.header.xllcorner.value()) / cellsize).floor() + 1.0;

        if x < 1.0 || x > self.header.ncols as f64 || y < 1.0 || y > self.header.nrows as f64 {
            return Err(PlannerError::OutOfExtent {
                lat: lat.value(),
                lon: lon.value(),
            });
        }

        Ok(GridXY {
            x: x as u64,
            y: y as u64,
        })
    }

    /// Centroid of the cell, offset by half a cell so the point falls
    /// inside it (subtract 0.5 from x and y before scaling).
    pub fn cell_to_lat_lon(&self, cell: CellId) -> PlannerResult<(Degrees, Degrees)> {
        let xy = self.cell_to_xy(cell)?;
        let cellsize = self.header.cellsize.value();
        let lon = self.header.xllcorner.value() + (xy.x as f64 - 0.5) * cellsize;
        let lat = self.header.yllcorner.value()
            + (self.header.nrows as f64 - (xy.y as f64 - 0.5)) * cellsize;
        Ok((Degrees(lat), Degrees(lon)))
    }

    /// `cell = (y-1)*W + x`
    pub fn xy_to_cell(&self, xy: GridXY) -> CellId {
        CellId((xy.y - 1) * self.header.ncols + xy.x)
    }

    /// `x = ((cell-1) mod W)+1`, `y = ((cell-1) div W)+1`
    pub fn cell_to_xy(&self, cell: CellId) -> PlannerResult<GridXY> {
        let max_cell = self.header.ncols * self.header.nrows;
        if cell.0 == 0 || cell.0 > max_cell {
            return Err(PlannerError::BadInput(format!(
                "cell {} is outside the grid's {} cells",
                cell.0, max_cell
            )));
        }
        let idx = cell.0 - 1;
        let x = idx % self.header.ncols + 1;
        let y = idx / self.header.ncols + 1;
        Ok(GridXY { x, y })
    }

    /// Computes the four corner cells and derives, per row, the
    /// left/right bound columns, stored as sorted vectors so that
    /// `in_bounding_box` can answer via two binary searches.
    pub fn subset_by_bounding_box(
        &mut self,
        south: Degrees,
        west: Degrees,
        north: Degrees,
        east: Degrees,
    ) -> PlannerResult<()> {
        let sw = self.lat_lon_to_xy(south, west)?;
        let se = self.lat_lon_to_xy(south, east)?;
        let nw = self.lat_lon_to_xy(north, west)?;
        let ne = self.lat_lon_to_xy(north, east)?;

        let top_y = nw.y.min(ne.y);
        let bottom_y = sw.y.max(se.y);
        let left_x = sw.x.min(nw.x);
        let right_x = se.x.max(ne.x);

        let mut bounds = Vec::new();
        for y in top_y..=bottom_y {
            let row_start = self.xy_to_cell(GridXY { x: left_x, y }).0;
            let row_end = self.xy_to_cell(GridXY { x: right_x, y }).0;
            bounds.push(RowBound {
                left: row_start,
                right: row_end,
            });
        }
        bounds.sort_by_key(|b| b.left);
        self.row_bounds = Some(bounds);
        Ok(())
    }

    /// `u` must lie within some row's `[left, right]` span, and `v`
    /// must lie in that same row or an adjacent one. Without a prior
    /// `subset_by_bounding_box` call, every cell within the header's
    /// raw extent is in-bounds.
    pub fn in_bounding_box(&self, u: CellId, v: CellId) -> bool {
        let Some(bounds) = &self.row_bounds else {
            let max_cell = self.header.ncols * self.header.nrows;
            return u.0 >= 1 && u.0 <= max_cell && v.0 >= 1 && v.0 <= max_cell;
        };

        let Some(row_idx) = row_containing(bounds, u.0) else {
            return false;
        };

        let candidate_rows = [
            row_idx.checked_sub(1),
            Some(row_idx),
            row_idx.checked_add(1),
        ];
        candidate_rows.into_iter().flatten().any(|idx| {
            bounds
                .get(idx)
                .is_some_and(|b| v.0 >= b.left && v.0 <= b.right)
        })
    }
}

/// Binary search for the row whose `[left, right]` span contains `cell`.
fn row_containing(bounds: &[RowBound], cell: u64) -> Option<usize> {
    let idx = bounds.partition_point(|b| b.left <= cell);
    if idx == 0 {
        return None;
    }
    let candidate = idx - 1;
    if bounds[candidate].left <= cell && cell <= bounds[candidate].right {
        Some(candidate)
    } else {
        None
    }
}

/// `edgeLength` is 1 for `|u-v| in {1, W}` and sqrt(2) for `|u-v| in {W-1, W+1}`.
pub fn edge_length_cells(width: u64, u: CellId, v: CellId) -> crate::units::CellLength {
    let diff = u.0.abs_diff(v.0);
    if diff == width - 1 || diff == width + 1 {
        crate::units::CellLength::DIAGONAL
    } else {
        crate::units::CellLength::ORTHOGONAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> GridHeader {
        GridHeader {
            ncols: 10,
            nrows: 10,
            xllcorner: Degrees(-100.0),
            yllcorner: Degrees(30.0),
            cellsize: CellSize(1.0),
            nodata: -9999.0,
        }
    }

    #[test]
    fn test_cell_xy_roundtrip() {
        let grid = GeoGrid::new(sample_header());
        for y in 1..=10u64 {
            for x in 1..=10u64 {
                let cell = grid.xy_to_cell(GridXY { x, y });
                let back = grid.cell_to_xy(cell).unwrap();
                assert_eq!(back.x, x);
                assert_eq!(back.y, y);
            }
        }
    }

    #[test]
    fn test_lat_lon_out_of_extent() {
        let grid = GeoGrid::new(sample_header());
        let err = grid.lat_lon_to_cell(Degrees(0.0), Degrees(0.0)).unwrap_err();
        assert!(matches!(err, PlannerError::OutOfExtent { .. }));
    }

    #[test]
    fn test_lat_lon_to_cell_in_extent() {
        let grid = GeoGrid::new(sample_header());
        let cell = grid.lat_lon_to_cell(Degrees(39.5), Degrees(-99.5)).unwrap();
        let xy = grid.cell_to_xy(cell).unwrap();
        assert_eq!(xy, GridXY { x: 1, y: 1 });
    }

    #[test]
    fn test_lat_lon_monotone_in_y() {
        let grid = GeoGrid::new(sample_header());
        let high = grid.lat_lon_to_xy(Degrees(39.5), Degrees(-99.5)).unwrap();
        let low = grid.lat_lon_to_xy(Degrees(30.5), Degrees(-99.5)).unwrap();
        assert!(low.y > high.y);
    }

    #[test]
    fn test_edge_length() {
        assert_eq!(edge_length_cells(10, CellId(5), CellId(6)).value(), 1.0);
        assert_eq!(edge_length_cells(10, CellId(5), CellId(15)).value(), 1.0);
        assert!((edge_length_cells(10, CellId(5), CellId(14)).value() - std::f64::consts::SQRT_2).abs() < 1e-12);
        assert!((edge_length_cells(10, CellId(5), CellId(16)).value() - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_box_subset_admits_interior_and_rejects_outside() {
        let mut grid = GeoGrid::new(sample_header());
        grid.subset_by_bounding_box(Degrees(33.0), Degrees(-97.0), Degrees(37.0), Degrees(-93.0))
            .unwrap();

        let center = grid.lat_lon_to_cell(Degrees(35.0), Degrees(-95.0)).unwrap();
        assert!(grid.in_bounding_box(center, center));

        let outside = grid.lat_lon_to_cell(Degrees(31.0), Degrees(-99.5)).unwrap();
        assert!(!grid.in_bounding_box(outside, outside));
    }
}
