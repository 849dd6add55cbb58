use rand::{Rng, seq::SliceRandom};
use tracing::{debug, warn};

use common::map::{GridDirection, MazeGrid};

// ============================================================================
// Maze Generation
// ============================================================================

/// Carve a perfect maze with a randomized recursive backtracker.
///
/// Every cell ends up visited and reachable from the start cell, and exactly
/// `width * height - 1` walls are cleared. An out-of-range start cell falls back to `(0, 0)`.
#[must_use]
pub fn generate_maze(width: usize, height: usize, start_x: usize, start_y: usize, rng: &mut impl Rng) -> MazeGrid {
    let mut grid = MazeGrid::new(width, height);
    if width == 0 || height == 0 {
        warn!("refusing to carve an empty {width}x{height} maze");
        return grid;
    }

    let start = if start_x < width && start_y < height {
        (start_x, start_y)
    } else {
        warn!("maze start ({start_x}, {start_y}) is outside {width}x{height}, starting from (0, 0)");
        (0, 0)
    };

    mark_visited(&mut grid, start);
    let mut stack = vec![start];

    while let Some(&(x, y)) = stack.last() {
        let mut directions = GridDirection::ALL;
        directions.shuffle(rng);

        let next = directions.iter().find_map(|dir| {
            grid.neighbor(x, y, *dir)
                .filter(|&(nx, ny)| grid.cell(nx, ny).is_some_and(|cell| !cell.visited))
        });

        match next {
            Some(neighbor) => {
                grid.clear_wall_between((x, y), neighbor);
                mark_visited(&mut grid, neighbor);
                stack.push(neighbor);
            }
            None => {
                // Dead end, backtrack
                stack.pop();
            }
        }
    }

    debug!(
        "carved {}x{} maze from {:?}, {} walls cleared",
        width,
        height,
        start,
        grid.cleared_wall_count()
    );
    grid
}

fn mark_visited(grid: &mut MazeGrid, (x, y): (usize, usize)) {
    if let Some(cell) = grid.cell_mut(x, y) {
        cell.visited = true;
    }
}
