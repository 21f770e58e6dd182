use crate::grid::{CellState, OccupancyGrid};
use crate::types::Placement;

const BLOCKED: char = '#';
const EMPTY: char = '.';
const LABELS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Draws the surface inside a `+-|` frame: blocked cells as `#`, uncovered
/// free cells as `.`, and each placed panel as its own letter.
pub fn render_layout(grid: &OccupancyGrid, placements: &[Placement]) -> String {
    let rows = grid.rows();
    let cols = grid.cols();
    if rows == 0 || cols == 0 {
        return String::new();
    }

    let mut canvas = vec![vec![EMPTY; cols]; rows];
    for (r, line) in canvas.iter_mut().enumerate() {
        for (c, ch) in line.iter_mut().enumerate() {
            if grid.get(r, c) == Some(CellState::Occupied) {
                *ch = BLOCKED;
            }
        }
    }

    for (i, p) in placements.iter().enumerate() {
        let label = LABELS[i % LABELS.len()] as char;
        for line in canvas.iter_mut().take(p.row_end().min(rows)).skip(p.row) {
            for ch in line.iter_mut().take(p.col_end().min(cols)).skip(p.col) {
                *ch = label;
            }
        }
    }

    let border = format!("+{}+\n", "-".repeat(cols));
    let mut result = border.clone();
    for line in &canvas {
        result.push('|');
        result.extend(line.iter());
        result.push_str("|\n");
    }
    result.push_str(&border);
    result
}
