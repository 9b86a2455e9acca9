use crate::frame::detection::Point;
use serde::{Deserialize, Serialize};

/// Cells per side of the maze grid.
pub const GRID_DIM: u32 = 8;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("region {width}x{height} is smaller than one pixel per cell")]
    RegionTooSmall { width: u32, height: u32 },
    #[error("region at ({x}, {y}) sized {width}x{height} extends past the pixel range")]
    RegionOutOfRange {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// Pixel rectangle bounding the maze within the video frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionOfInterest {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionOfInterest {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Cell width; integer division drops any remainder sliver on the right edge.
    pub fn cell_width(&self) -> u32 {
        self.width / GRID_DIM
    }

    pub fn cell_height(&self) -> u32 {
        self.height / GRID_DIM
    }
}

/// Grid cell addressed by column then row, both in `[0, GRID_DIM)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoordinate {
    pub col: u8,
    pub row: u8,
}

impl CellCoordinate {
    /// Returns `None` when either index is off the grid.
    pub fn new(col: u8, row: u8) -> Option<Self> {
        if u32::from(col) < GRID_DIM && u32::from(row) < GRID_DIM {
            Some(Self { col, row })
        } else {
            None
        }
    }
}

/// Result of mapping a pixel onto the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellLookup {
    Inside(CellCoordinate),
    OutOfBounds,
}

impl CellLookup {
    pub fn cell(self) -> Option<CellCoordinate> {
        match self {
            CellLookup::Inside(cell) => Some(cell),
            CellLookup::OutOfBounds => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LineSegment {
    pub from: Point,
    pub to: Point,
}

/// Maps detection centers onto the 8x8 maze grid inside a region of interest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMapper {
    roi: RegionOfInterest,
    cell_width: u32,
    cell_height: u32,
}

impl GridMapper {
    pub fn new(roi: RegionOfInterest) -> Result<Self, GridError> {
        let cell_width = roi.cell_width();
        let cell_height = roi.cell_height();
        if cell_width == 0 || cell_height == 0 {
            return Err(GridError::RegionTooSmall {
                width: roi.width,
                height: roi.height,
            });
        }
        if roi.x.checked_add(roi.width).is_none() || roi.y.checked_add(roi.height).is_none() {
            return Err(GridError::RegionOutOfRange {
                x: roi.x,
                y: roi.y,
                width: roi.width,
                height: roi.height,
            });
        }
        Ok(Self {
            roi,
            cell_width,
            cell_height,
        })
    }

    pub fn roi(&self) -> RegionOfInterest {
        self.roi
    }

    pub fn cell_size(&self) -> (u32, u32) {
        (self.cell_width, self.cell_height)
    }

    pub fn map_to_cell(&self, point: Point) -> CellLookup {
        if !point.x.is_finite() || !point.y.is_finite() {
            return CellLookup::OutOfBounds;
        }

        let col = ((point.x - f64::from(self.roi.x)) / f64::from(self.cell_width)).floor();
        let row = ((point.y - f64::from(self.roi.y)) / f64::from(self.cell_height)).floor();
        let dim = f64::from(GRID_DIM);
        if !(0.0..dim).contains(&col) || !(0.0..dim).contains(&row) {
            return CellLookup::OutOfBounds;
        }

        match CellCoordinate::new(col as u8, row as u8) {
            Some(cell) => CellLookup::Inside(cell),
            None => CellLookup::OutOfBounds,
        }
    }

    pub fn cell_bounds(&self, cell: CellCoordinate) -> PixelRect {
        PixelRect {
            x: self.roi.x + u32::from(cell.col) * self.cell_width,
            y: self.roi.y + u32::from(cell.row) * self.cell_height,
            width: self.cell_width,
            height: self.cell_height,
        }
    }

    /// Vertical then horizontal grid lines, including both outer edges.
    pub fn grid_lines(&self) -> Vec<LineSegment> {
        let left = f64::from(self.roi.x);
        let top = f64::from(self.roi.y);
        let right = left + f64::from(self.roi.width);
        let bottom = top + f64::from(self.roi.height);

        let vertical = (0..=GRID_DIM).map(|i| {
            let x = left + f64::from(i * self.cell_width);
            LineSegment {
                from: Point::new(x, top),
                to: Point::new(x, bottom),
            }
        });
        let horizontal = (0..=GRID_DIM).map(|i| {
            let y = top + f64::from(i * self.cell_height);
            LineSegment {
                from: Point::new(left, y),
                to: Point::new(right, y),
            }
        });
        vertical.chain(horizontal).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(x: u32, y: u32, width: u32, height: u32) -> GridMapper {
        GridMapper::new(RegionOfInterest::new(x, y, width, height)).unwrap()
    }

    fn cell(col: u8, row: u8) -> CellCoordinate {
        CellCoordinate::new(col, row).unwrap()
    }

    #[test]
    fn maps_corners_of_square_roi() {
        let grid = mapper(0, 0, 80, 80);
        assert_eq!(grid.map_to_cell(Point::new(5.0, 5.0)), CellLookup::Inside(cell(0, 0)));
        assert_eq!(grid.map_to_cell(Point::new(75.0, 75.0)), CellLookup::Inside(cell(7, 7)));
    }

    #[test]
    fn offset_roi_shifts_mapping() {
        let grid = mapper(100, 50, 160, 80);
        assert_eq!(grid.map_to_cell(Point::new(139.9, 69.0)), CellLookup::Inside(cell(1, 1)));
        assert_eq!(grid.map_to_cell(Point::new(100.0, 50.0)), CellLookup::Inside(cell(0, 0)));
    }

    #[test]
    fn points_outside_roi_are_out_of_bounds() {
        let grid = mapper(10, 10, 80, 80);
        for point in [
            Point::new(9.5, 20.0),
            Point::new(20.0, 9.99),
            Point::new(90.0, 20.0),
            Point::new(20.0, 200.0),
            Point::new(-1.0, -1.0),
            Point::new(f64::NAN, 20.0),
            Point::new(20.0, f64::INFINITY),
        ] {
            assert_eq!(grid.map_to_cell(point), CellLookup::OutOfBounds, "{point:?}");
        }
    }

    #[test]
    fn truncated_cell_size_leaves_edge_sliver_unmapped() {
        // 85 / 8 = 10, so pixels 80..85 fall past column 7.
        let grid = mapper(0, 0, 85, 85);
        assert_eq!(grid.cell_size(), (10, 10));
        assert_eq!(grid.map_to_cell(Point::new(79.9, 0.0)), CellLookup::Inside(cell(7, 0)));
        assert_eq!(grid.map_to_cell(Point::new(82.0, 0.0)), CellLookup::OutOfBounds);
    }

    #[test]
    fn mapping_is_repeatable() {
        let grid = mapper(3, 7, 123, 97);
        let point = Point::new(64.2, 51.7);
        let first = grid.map_to_cell(point);
        for _ in 0..10 {
            assert_eq!(grid.map_to_cell(point), first);
        }
    }

    #[test]
    fn tiny_region_is_rejected() {
        let err = GridMapper::new(RegionOfInterest::new(0, 0, 7, 80)).unwrap_err();
        assert_eq!(err, GridError::RegionTooSmall { width: 7, height: 80 });
    }

    #[test]
    fn region_past_pixel_range_is_rejected() {
        let overflowing = RegionOfInterest::new(u32::MAX - 10, 0, 80, 80);
        assert!(matches!(
            GridMapper::new(overflowing),
            Err(GridError::RegionOutOfRange { .. })
        ));
        assert!(GridMapper::new(RegionOfInterest::new(0, u32::MAX, 80, 80)).is_err());

        let edge = mapper(u32::MAX - 80, u32::MAX - 80, 80, 80);
        let last = edge.cell_bounds(cell(7, 7));
        assert_eq!(last.x, u32::MAX - 10);
        assert_eq!(last.y, u32::MAX - 10);
    }

    #[test]
    fn grid_lines_cover_both_edges() {
        let grid = mapper(0, 0, 80, 40);
        let lines = grid.grid_lines();
        assert_eq!(lines.len(), 18);
        assert_eq!(lines[8].from, Point::new(80.0, 0.0));
        assert_eq!(lines[17].to, Point::new(80.0, 40.0));
    }

    #[test]
    fn cell_bounds_follow_cell_size() {
        let grid = mapper(10, 20, 80, 160);
        let rect = grid.cell_bounds(cell(2, 3));
        assert_eq!(
            rect,
            PixelRect {
                x: 30,
                y: 80,
                width: 10,
                height: 20
            }
        );
    }

    #[test]
    fn cell_coordinate_rejects_off_grid_indices() {
        assert!(CellCoordinate::new(8, 0).is_none());
        assert!(CellCoordinate::new(0, 8).is_none());
        assert!(CellCoordinate::new(7, 7).is_some());
    }
}
