use serde::{Deserialize, Deserializer, Serialize};

/// A rectangle measured in grid cells: `h` rows by `w` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub h: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub w: u32,
}

impl Shape {
    pub fn new(h: u32, w: u32) -> Self {
        Self { h, w }
    }

    pub fn area(&self) -> u64 {
        self.h as u64 * self.w as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            h: self.w,
            w: self.h,
        }
    }

    pub fn is_square(&self) -> bool {
        self.h == self.w
    }

    pub fn is_empty(&self) -> bool {
        self.h == 0 || self.w == 0
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.h, self.w)
    }
}

/// Displacement of the second rectangle of a composite surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Offset {
    pub rows: i64,
    pub cols: i64,
}

impl Offset {
    pub fn new(rows: i64, cols: i64) -> Self {
        Self { rows, cols }
    }
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.rows, self.cols)
    }
}

/// A panel anchored at its top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub shape: Shape,
    pub rotated: bool,
}

impl Placement {
    pub fn row_end(&self) -> usize {
        self.row + self.shape.h as usize
    }

    pub fn col_end(&self) -> usize {
        self.col + self.shape.w as usize
    }

    pub fn covers(&self, row: usize, col: usize) -> bool {
        (self.row..self.row_end()).contains(&row) && (self.col..self.col_end()).contains(&col)
    }

    pub fn overlaps(&self, other: &Placement) -> bool {
        self.row < other.row_end()
            && other.row < self.row_end()
            && self.col < other.col_end()
            && other.col < self.col_end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub count: usize,
    pub placements: Vec<Placement>,
    pub steps: u64,
}

/// Solver configuration. Flattened into service requests, where the step
/// budget travels as `max_steps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SolverOptions {
    #[serde(default = "default_true")]
    pub allow_rotate: bool,
    #[serde(default, rename = "max_steps", alias = "step_budget")]
    pub step_budget: Option<u64>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            allow_rotate: true,
            step_budget: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Accepts any JSON number with an integral value (`3` or `3.0`) as a `u32`.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = f64::deserialize(deserializer)?;
    if n.fract() != 0.0 || n < 0.0 || n > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {n}"
        )));
    }
    Ok(n as u32)
}
