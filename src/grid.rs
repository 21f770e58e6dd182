use crate::types::Placement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    Free,
    Occupied,
}

/// Row-major cell occupancy of a surface. Dimensions never change after
/// construction; only cell states are mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    rows: usize,
    cols: usize,
    cells: Vec<CellState>,
}

impl OccupancyGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, CellState::Free)
    }

    pub fn filled(rows: usize, cols: usize, state: CellState) -> Self {
        Self {
            rows,
            cols,
            cells: vec![state; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<CellState> {
        if row < self.rows && col < self.cols {
            Some(self.cells[self.index(row, col)])
        } else {
            None
        }
    }

    pub fn is_free(&self, row: usize, col: usize) -> bool {
        self.get(row, col) == Some(CellState::Free)
    }

    /// Panics if `(row, col)` is outside the grid.
    pub fn set(&mut self, row: usize, col: usize, state: CellState) {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({row}, {col}) outside {}x{} grid",
            self.rows,
            self.cols
        );
        let idx = self.index(row, col);
        self.cells[idx] = state;
    }

    pub fn free_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|&&c| c == CellState::Free)
            .count()
    }

    /// First free cell at or after raster index `from`, as a raster index.
    pub fn next_free(&self, from: usize) -> Option<usize> {
        self.cells
            .get(from..)?
            .iter()
            .position(|&c| c == CellState::Free)
            .map(|offset| from + offset)
    }

    /// Splits a raster index into `(row, col)`.
    pub fn position(&self, idx: usize) -> (usize, usize) {
        (idx / self.cols, idx % self.cols)
    }

    pub fn feasible(&self, p: &Placement) -> bool {
        if p.shape.is_empty() || p.row_end() > self.rows || p.col_end() > self.cols {
            return false;
        }
        (p.row..p.row_end()).all(|r| {
            let start = self.index(r, p.col);
            self.cells[start..start + p.shape.w as usize]
                .iter()
                .all(|&c| c == CellState::Free)
        })
    }

    /// Marks the placement's footprint occupied. The placement must be
    /// feasible.
    pub fn apply(&mut self, p: &Placement) {
        debug_assert!(self.feasible(p), "applying infeasible placement {p:?}");
        self.fill(p, CellState::Occupied);
    }

    /// Frees exactly the placement's footprint. Only valid for the most
    /// recently applied placement.
    pub fn revert(&mut self, p: &Placement) {
        self.fill(p, CellState::Free);
    }

    fn fill(&mut self, p: &Placement, state: CellState) {
        for r in p.row..p.row_end() {
            let start = self.index(r, p.col);
            self.cells[start..start + p.shape.w as usize].fill(state);
        }
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }
}
