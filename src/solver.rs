use crate::error::{PlacementError, Result};
use crate::grid::OccupancyGrid;
use crate::types::{Placement, Shape, Solution, SolverOptions};

/// Decision at a free cell. Tried in declaration order, so among equally
/// good layouts the one placing panels earliest in raster order wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    PlaceNormal,
    PlaceRotated,
    Skip,
}

/// One level of the explicit search stack.
#[derive(Debug)]
struct Frame {
    // raster index of the free cell being decided, None once the scan is past the end
    cell: Option<usize>,
    // free cells at or after `cell`
    free_ahead: usize,
    next_branch: usize,
    // placement this frame has on the grid while its child subtree runs
    applied: Option<Placement>,
}

impl Frame {
    fn new(cell: Option<usize>, free_ahead: usize) -> Self {
        Self {
            cell,
            free_ahead,
            next_branch: 0,
            applied: None,
        }
    }
}

pub struct Solver {
    panel: Shape,
    options: SolverOptions,
    branches: Vec<Branch>,
}

impl Solver {
    pub fn new(panel: Shape) -> Result<Self> {
        Self::with_options(panel, SolverOptions::default())
    }

    pub fn with_options(panel: Shape, options: SolverOptions) -> Result<Self> {
        if panel.is_empty() {
            return Err(PlacementError::InvalidPanelShape { shape: panel });
        }

        let mut branches = vec![Branch::PlaceNormal];
        // A square panel rotated is the same panel
        if options.allow_rotate && !panel.is_square() {
            branches.push(Branch::PlaceRotated);
        }
        branches.push(Branch::Skip);

        Ok(Self {
            panel,
            options,
            branches,
        })
    }

    pub fn panel(&self) -> Shape {
        self.panel
    }

    pub fn options(&self) -> SolverOptions {
        self.options
    }

    /// Finds the maximum number of panels that fit on the free cells of
    /// `grid`, along with one layout achieving it.
    ///
    /// The grid is borrowed for the whole search and is returned to its
    /// exact prior state, whether the search completes or runs out of
    /// budget.
    pub fn solve(&self, grid: &mut OccupancyGrid) -> Result<Solution> {
        let area = usize::try_from(self.panel.area()).unwrap_or(usize::MAX);
        let free = grid.free_count();
        tracing::debug!(
            rows = grid.rows(),
            cols = grid.cols(),
            free,
            panel = %self.panel,
            "starting placement search"
        );

        let mut best = Solution {
            count: 0,
            placements: Vec::new(),
            steps: 0,
        };
        let mut path: Vec<Placement> = Vec::new();
        let mut steps: u64 = 0;
        let mut stack = vec![Frame::new(grid.next_free(0), free)];

        while let Some(frame) = stack.last_mut() {
            if let Some(p) = frame.applied.take() {
                grid.revert(&p);
                path.pop();
            }

            // Nothing more fits from here on: this path is a complete layout
            let cell = match frame.cell {
                Some(cell) if frame.free_ahead >= area => cell,
                _ => {
                    if path.len() > best.count {
                        best.count = path.len();
                        best.placements = path.clone();
                    }
                    stack.pop();
                    continue;
                }
            };

            // Area bound: even a perfect fill of the rest cannot beat the best
            if path.len() + frame.free_ahead / area <= best.count {
                stack.pop();
                continue;
            }

            let Some(&branch) = self.branches.get(frame.next_branch) else {
                stack.pop();
                continue;
            };
            frame.next_branch += 1;

            if let Some(budget) = self.options.step_budget
                && steps >= budget
            {
                Self::unwind(grid, &mut stack);
                tracing::debug!(budget, best = best.count, "step budget exhausted");
                return Err(PlacementError::ResourceExhausted { budget, steps });
            }
            steps += 1;

            let child = match branch {
                Branch::Skip => Frame::new(grid.next_free(cell + 1), frame.free_ahead - 1),
                Branch::PlaceNormal | Branch::PlaceRotated => {
                    let rotated = branch == Branch::PlaceRotated;
                    let (row, col) = grid.position(cell);
                    let placement = Placement {
                        row,
                        col,
                        shape: if rotated {
                            self.panel.rotated()
                        } else {
                            self.panel
                        },
                        rotated,
                    };
                    if !grid.feasible(&placement) {
                        continue;
                    }
                    grid.apply(&placement);
                    path.push(placement);
                    frame.applied = Some(placement);
                    Frame::new(grid.next_free(cell + 1), frame.free_ahead - area)
                }
            };
            stack.push(child);
        }

        best.steps = steps;
        tracing::debug!(count = best.count, steps, "placement search finished");
        Ok(best)
    }

    fn unwind(grid: &mut OccupancyGrid, stack: &mut Vec<Frame>) {
        while let Some(frame) = stack.pop() {
            if let Some(p) = frame.applied {
                grid.revert(&p);
            }
        }
    }
}

/// Maximum number of `panel`s that fit on `grid`, trying both orientations.
pub fn solve(grid: &mut OccupancyGrid, panel: Shape) -> Result<usize> {
    Solver::new(panel)?.solve(grid).map(|s| s.count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellState;
    use crate::surface::build_surface;
    use crate::types::Offset;

    /// Validates a solution against the grid it was computed on:
    /// 1. The placement count matches the reported count
    /// 2. Every placement is the panel in one of its orientations
    /// 3. Every placement lies in bounds on cells that were free
    /// 4. No two placements overlap
    fn assert_solution_valid(grid: &OccupancyGrid, panel: Shape, sol: &Solution) {
        assert_eq!(
            sol.placements.len(),
            sol.count,
            "expected {} placements, got {}",
            sol.count,
            sol.placements.len()
        );

        for (i, p) in sol.placements.iter().enumerate() {
            let expected = if p.rotated { panel.rotated() } else { panel };
            assert_eq!(p.shape, expected, "placement {i} has wrong shape {}", p.shape);
            assert!(
                grid.feasible(p),
                "placement {i} ({} @ ({},{})) is out of bounds or on a blocked cell",
                p.shape,
                p.row,
                p.col
            );
        }

        for i in 0..sol.placements.len() {
            for j in (i + 1)..sol.placements.len() {
                let a = &sol.placements[i];
                let b = &sol.placements[j];
                assert!(
                    !a.overlaps(b),
                    "placement {i} ({} @ ({},{})) overlaps placement {j} ({} @ ({},{}))",
                    a.shape,
                    a.row,
                    a.col,
                    b.shape,
                    b.row,
                    b.col
                );
            }
        }
    }

    fn max_panels(grid: &mut OccupancyGrid, h: u32, w: u32) -> usize {
        let panel = Shape::new(h, w);
        let sol = Solver::new(panel).unwrap().solve(grid).unwrap();
        assert_solution_valid(grid, panel, &sol);
        sol.count
    }

    #[test]
    fn test_rectangular_surface() {
        let mut grid = build_surface(Shape::new(3, 5), None).unwrap();
        assert_eq!(max_panels(&mut grid, 1, 2), 7);
    }

    #[test]
    fn test_composite_surface() {
        let mut grid = build_surface(Shape::new(3, 5), Some(Offset::new(2, 3))).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (5, 8));
        assert_eq!(max_panels(&mut grid, 1, 2), 14);
    }

    #[test]
    fn test_single_cell_surface() {
        let mut grid = build_surface(Shape::new(1, 1), None).unwrap();
        assert_eq!(max_panels(&mut grid, 1, 1), 1);
        assert_eq!(max_panels(&mut grid, 2, 1), 0);
    }

    #[test]
    fn test_known_optima() {
        let cases = [
            ((3, 3), (1, 2), 4),
            ((4, 4), (1, 3), 5),
            ((5, 5), (2, 2), 4),
            ((2, 3), (2, 2), 1),
            ((3, 2), (2, 3), 1),
            ((4, 6), (2, 3), 4),
        ];
        for ((rows, cols), (h, w), expected) in cases {
            let mut grid = OccupancyGrid::new(rows, cols);
            assert_eq!(
                max_panels(&mut grid, h, w),
                expected,
                "{rows}x{cols} surface with {h}x{w} panels"
            );
        }
    }

    #[test]
    fn test_blocked_center() {
        let mut grid = OccupancyGrid::new(3, 3);
        grid.set(1, 1, CellState::Occupied);
        assert_eq!(max_panels(&mut grid, 1, 2), 4);
        assert_eq!(max_panels(&mut grid, 2, 2), 0);
    }

    #[test]
    fn test_grid_restored_and_idempotent() {
        let mut grid = build_surface(Shape::new(3, 5), Some(Offset::new(2, 3))).unwrap();
        let before = grid.clone();
        let solver = Solver::new(Shape::new(1, 3)).unwrap();

        let first = solver.solve(&mut grid).unwrap();
        assert_eq!(grid, before);
        let second = solver.solve(&mut grid).unwrap();
        assert_eq!(grid, before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_count_bounded_by_free_area() {
        let surfaces = [
            build_surface(Shape::new(3, 5), None).unwrap(),
            build_surface(Shape::new(3, 5), Some(Offset::new(2, 3))).unwrap(),
            build_surface(Shape::new(4, 3), Some(Offset::new(1, 2))).unwrap(),
        ];
        for mut grid in surfaces {
            let free = grid.free_count();
            for (h, w) in [(1, 2), (2, 2), (1, 3), (2, 3)] {
                let count = max_panels(&mut grid, h, w);
                assert!(count <= free / (h * w) as usize);
            }
        }
    }

    #[test]
    fn test_unit_panel_fills_every_free_cell() {
        let mut grid = build_surface(Shape::new(3, 4), Some(Offset::new(1, 2))).unwrap();
        let free = grid.free_count();
        assert_eq!(max_panels(&mut grid, 1, 1), free);
    }

    #[test]
    fn test_orientation_symmetry() {
        let surfaces = [
            OccupancyGrid::new(4, 4),
            build_surface(Shape::new(3, 4), Some(Offset::new(1, 2))).unwrap(),
            build_surface(Shape::new(3, 5), Some(Offset::new(2, 3))).unwrap(),
        ];
        for mut grid in surfaces {
            for (h, w) in [(1, 2), (1, 3), (2, 3)] {
                assert_eq!(
                    max_panels(&mut grid, h, w),
                    max_panels(&mut grid, w, h),
                    "{h}x{w} vs {w}x{h}"
                );
            }
        }
    }

    #[test]
    fn test_panel_too_large() {
        let mut grid = build_surface(Shape::new(3, 5), None).unwrap();
        assert_eq!(max_panels(&mut grid, 4, 6), 0);
        assert_eq!(max_panels(&mut grid, 6, 4), 0);
    }

    #[test]
    fn test_zero_area_surface() {
        let mut grid = OccupancyGrid::new(0, 5);
        assert_eq!(solve(&mut grid, Shape::new(1, 1)), Ok(0));
        let mut grid = OccupancyGrid::new(4, 0);
        assert_eq!(solve(&mut grid, Shape::new(1, 1)), Ok(0));
    }

    #[test]
    fn test_fully_blocked_surface() {
        let mut grid = OccupancyGrid::filled(3, 3, CellState::Occupied);
        let sol = Solver::new(Shape::new(1, 1)).unwrap().solve(&mut grid).unwrap();
        assert_eq!(sol.count, 0);
        assert_eq!(sol.steps, 0);
    }

    #[test]
    fn test_invalid_panel_shape() {
        let mut grid = OccupancyGrid::new(3, 3);
        assert_eq!(
            solve(&mut grid, Shape::new(0, 2)),
            Err(PlacementError::InvalidPanelShape {
                shape: Shape::new(0, 2)
            })
        );
        assert!(Solver::new(Shape::new(2, 0)).is_err());
    }

    #[test]
    fn test_step_budget_exhausted_restores_grid() {
        let mut grid = OccupancyGrid::new(5, 5);
        grid.set(4, 4, CellState::Occupied);
        let before = grid.clone();
        let options = SolverOptions {
            step_budget: Some(10),
            ..Default::default()
        };
        let solver = Solver::with_options(Shape::new(2, 2), options).unwrap();
        assert_eq!(
            solver.solve(&mut grid),
            Err(PlacementError::ResourceExhausted {
                budget: 10,
                steps: 10
            })
        );
        assert_eq!(grid, before);
    }

    #[test]
    fn test_generous_step_budget() {
        let mut grid = OccupancyGrid::new(5, 5);
        let unbounded = Solver::new(Shape::new(2, 2)).unwrap().solve(&mut grid).unwrap();
        let options = SolverOptions {
            step_budget: Some(unbounded.steps),
            ..Default::default()
        };
        let bounded = Solver::with_options(Shape::new(2, 2), options)
            .unwrap()
            .solve(&mut grid)
            .unwrap();
        assert_eq!(bounded, unbounded);
    }

    #[test]
    fn test_rotation_disabled() {
        let mut grid = OccupancyGrid::new(1, 4);
        let options = SolverOptions {
            allow_rotate: false,
            ..Default::default()
        };
        let fixed = Solver::with_options(Shape::new(2, 1), options).unwrap();
        assert_eq!(fixed.solve(&mut grid).unwrap().count, 0);
        assert_eq!(max_panels(&mut grid, 2, 1), 2);
    }

    #[test]
    fn test_square_panel_skips_rotation() {
        assert_eq!(Solver::new(Shape::new(2, 2)).unwrap().branches.len(), 2);
        assert_eq!(Solver::new(Shape::new(1, 2)).unwrap().branches.len(), 3);
    }

    #[test]
    fn test_layout_prefers_earliest_placements() {
        let mut grid = build_surface(Shape::new(3, 5), None).unwrap();
        let sol = Solver::new(Shape::new(1, 2)).unwrap().solve(&mut grid).unwrap();
        let first = sol.placements[0];
        assert_eq!((first.row, first.col), (0, 0));
        assert!(!first.rotated);
    }
}
