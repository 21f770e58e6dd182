use crate::error::{PlacementError, Result};
use crate::grid::{CellState, OccupancyGrid};
use crate::types::{Offset, Shape};

/// Largest canvas, in cells, the builder will allocate.
pub const MAX_CANVAS_CELLS: usize = 1 << 24;

/// Builds the occupancy grid for a surface.
///
/// Without an offset the whole `shape` is free. With an offset the canvas is
/// the bounding box of two `shape`-sized rectangles, one at the origin and one
/// displaced by `offset`; cells covered by neither are blocked.
pub fn build_surface(shape: Shape, offset: Option<Offset>) -> Result<OccupancyGrid> {
    if shape.is_empty() {
        return Err(PlacementError::surface(format!(
            "surface {shape} must have non-zero height and width"
        )));
    }

    if shape.area() > MAX_CANVAS_CELLS as u64 {
        return Err(PlacementError::surface(format!(
            "surface {shape} exceeds {MAX_CANVAS_CELLS} cells"
        )));
    }

    let Some(offset) = offset else {
        tracing::debug!(%shape, "building rectangular surface");
        return Ok(OccupancyGrid::new(shape.h as usize, shape.w as usize));
    };

    let (dr, dc) = match (usize::try_from(offset.rows), usize::try_from(offset.cols)) {
        (Ok(dr), Ok(dc)) => (dr, dc),
        _ => {
            return Err(PlacementError::surface(format!(
                "offset {offset} must be non-negative"
            )));
        }
    };
    let h = shape.h as usize;
    let w = shape.w as usize;
    let (Some(rows), Some(cols)) = (h.checked_add(dr), w.checked_add(dc)) else {
        return Err(PlacementError::surface(format!(
            "canvas for {shape} offset by {offset} is too large"
        )));
    };
    if rows.checked_mul(cols).is_none_or(|cells| cells > MAX_CANVAS_CELLS) {
        return Err(PlacementError::surface(format!(
            "canvas {rows}x{cols} exceeds {MAX_CANVAS_CELLS} cells"
        )));
    }

    tracing::debug!(%shape, %offset, rows, cols, "building composite surface");
    let mut grid = OccupancyGrid::filled(rows, cols, CellState::Occupied);
    for (r0, c0) in [(0, 0), (dr, dc)] {
        for r in r0..r0 + h {
            for c in c0..c0 + w {
                grid.set(r, c, CellState::Free);
            }
        }
    }
    Ok(grid)
}
