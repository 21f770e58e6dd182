//! Exhaustive solver for the maximum number of rectangular panels that fit
//! on a grid surface, optionally shaped as the union of two offset
//! rectangles.

pub mod error;
pub mod grid;
pub mod render;
pub mod solver;
pub mod surface;
pub mod types;

pub use error::{PlacementError, Result};
pub use grid::{CellState, OccupancyGrid};
pub use solver::{Solver, solve};
pub use surface::build_surface;
pub use types::{Offset, Placement, Shape, Solution, SolverOptions};
