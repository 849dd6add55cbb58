use bevy_math::Vec3;
use std::collections::VecDeque;

use crate::constants::*;

// ============================================================================
// Maze Data Model
// ============================================================================

// One maze cell. Only the top (toward y - 1) and left (toward x - 1) walls are stored; the
// right and bottom walls are the neighbor's left/top wall or the grid boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MazeCell {
    pub x: usize,
    pub y: usize,
    pub visited: bool,
    pub top_wall: bool,
    pub left_wall: bool,
}

impl MazeCell {
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self {
            x,
            y,
            visited: false,
            top_wall: true,
            left_wall: true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GridDirection {
    North, // y - 1, through the cell's top wall
    South, // y + 1
    West,  // x - 1, through the cell's left wall
    East,  // x + 1
}

impl GridDirection {
    pub const ALL: [Self; 4] = [Self::North, Self::South, Self::West, Self::East];

    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::West => (-1, 0),
            Self::East => (1, 0),
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }
}

// Axis-aligned wall segment on the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub x1: f32,
    pub z1: f32,
    pub x2: f32,
    pub z2: f32,
    pub width: f32,
}

impl Wall {
    // Box center and half extents, from slightly below the floor up to the wall top.
    #[must_use]
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let dx = (self.x2 - self.x1).abs();
        let dz = (self.z2 - self.z1).abs();
        let half_height = (WALL_HEIGHT + WALL_FLOOR_SINK) / 2.0;
        let center = Vec3::new(
            f32::midpoint(self.x1, self.x2),
            WALL_HEIGHT - half_height,
            f32::midpoint(self.z1, self.z2),
        );
        let half = if dx > dz {
            Vec3::new(dx / 2.0, half_height, self.width / 2.0)
        } else {
            Vec3::new(self.width / 2.0, half_height, dz / 2.0)
        };
        (center, half)
    }
}

// Rectangular maze, row-major. Read-only once carving has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MazeGrid {
    width: usize,
    height: usize,
    cells: Vec<MazeCell>,
}

impl MazeGrid {
    // Fully walled, unvisited grid.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(MazeCell::new(x, y));
            }
        }
        Self { width, height, cells }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn cells(&self) -> &[MazeCell] {
        &self.cells
    }

    #[must_use]
    pub const fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<&MazeCell> {
        if x < self.width && y < self.height {
            self.cells.get(y * self.width + x)
        } else {
            None
        }
    }

    pub fn cell_mut(&mut self, x: usize, y: usize) -> Option<&mut MazeCell> {
        if x < self.width && y < self.height {
            self.cells.get_mut(y * self.width + x)
        } else {
            None
        }
    }

    #[must_use]
    pub fn neighbor(&self, x: usize, y: usize, dir: GridDirection) -> Option<(usize, usize)> {
        let (dx, dy) = dir.offset();
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        self.in_bounds(nx, ny).then_some((nx as usize, ny as usize))
    }

    // Whether a wall separates the cell from its neighbor in `dir`. The grid boundary
    // and out-of-range cells always count as walled.
    #[must_use]
    pub fn has_wall(&self, x: usize, y: usize, dir: GridDirection) -> bool {
        let Some(cell) = self.cell(x, y) else {
            return true;
        };
        match dir {
            GridDirection::North => cell.top_wall,
            GridDirection::West => cell.left_wall,
            GridDirection::East => self.cell(x + 1, y).is_none_or(|right| right.left_wall),
            GridDirection::South => self.cell(x, y + 1).is_none_or(|below| below.top_wall),
        }
    }

    // Clear the wall shared by two adjacent cells. The cell with the higher coordinate owns
    // the shared wall (its left or top flag), whichever of the two is the mover.
    pub fn clear_wall_between(&mut self, from: (usize, usize), to: (usize, usize)) -> bool {
        let (fx, fy) = from;
        let (tx, ty) = to;
        let adjacent = fx.abs_diff(tx) + fy.abs_diff(ty) == 1;
        if !adjacent {
            return false;
        }

        if fx > tx {
            self.cell_mut(fx, fy).map(|cell| cell.left_wall = false).is_some()
        } else if fx < tx {
            self.cell_mut(tx, ty).map(|cell| cell.left_wall = false).is_some()
        } else if fy > ty {
            self.cell_mut(fx, fy).map(|cell| cell.top_wall = false).is_some()
        } else {
            self.cell_mut(tx, ty).map(|cell| cell.top_wall = false).is_some()
        }
    }

    pub fn open_directions(&self, x: usize, y: usize) -> impl Iterator<Item = GridDirection> + '_ {
        GridDirection::ALL.into_iter().filter(move |dir| !self.has_wall(x, y, *dir))
    }

    // Number of stored wall flags that have been cleared. A perfect maze has width*height - 1.
    #[must_use]
    pub fn cleared_wall_count(&self) -> usize {
        self.cells
            .iter()
            .map(|cell| usize::from(!cell.top_wall) + usize::from(!cell.left_wall))
            .sum()
    }

    // Count cells reachable from `start` through open walls (BFS)
    #[must_use]
    pub fn reachable_cells(&self, start: (usize, usize)) -> usize {
        if self.cell(start.0, start.1).is_none() {
            return 0;
        }

        let mut visited = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();
        visited[start.1 * self.width + start.0] = true;
        queue.push_back(start);
        let mut count = 0;

        while let Some((x, y)) = queue.pop_front() {
            count += 1;
            for dir in self.open_directions(x, y) {
                if let Some((nx, ny)) = self.neighbor(x, y, dir) {
                    let idx = ny * self.width + nx;
                    if !visited[idx] {
                        visited[idx] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }
        }

        count
    }

    // Whether the cell is open on all four sides, giving clearance along both axes.
    #[must_use]
    pub fn is_junction(&self, x: usize, y: usize) -> bool {
        self.cell(x, y).is_some() && GridDirection::ALL.iter().all(|dir| !self.has_wall(x, y, *dir))
    }

    // Convert every present wall (stored and derived) into a world-space segment. Segments are
    // extended by half the wall thickness at both ends so corners close up.
    #[must_use]
    pub fn wall_segments(&self, cell_size: f32) -> Vec<Wall> {
        let mut walls = Vec::new();
        let ext = WALL_THICKNESS / 2.0;

        let horizontal = |col: usize, line: usize| Wall {
            x1: (col as f32).mul_add(cell_size, -ext),
            z1: line as f32 * cell_size,
            x2: ((col + 1) as f32).mul_add(cell_size, ext),
            z2: line as f32 * cell_size,
            width: WALL_THICKNESS,
        };
        let vertical = |line: usize, row: usize| Wall {
            x1: line as f32 * cell_size,
            z1: (row as f32).mul_add(cell_size, -ext),
            x2: line as f32 * cell_size,
            z2: ((row + 1) as f32).mul_add(cell_size, ext),
            width: WALL_THICKNESS,
        };

        for cell in &self.cells {
            if cell.top_wall {
                walls.push(horizontal(cell.x, cell.y));
            }
            if cell.left_wall {
                walls.push(vertical(cell.x, cell.y));
            }
            if cell.y + 1 == self.height {
                walls.push(horizontal(cell.x, self.height));
            }
            if cell.x + 1 == self.width {
                walls.push(vertical(self.width, cell.y));
            }
        }

        walls
    }
}

// ============================================================================
// Grid Helper Functions
// ============================================================================

// World position of the center of a cell, on the floor plane
#[must_use]
pub fn cell_center(x: usize, y: usize, cell_size: f32) -> Vec3 {
    Vec3::new((x as f32 + 0.5) * cell_size, 0.0, (y as f32 + 0.5) * cell_size)
}

// Convert a world position to (possibly out-of-range) cell coordinates
#[must_use]
pub fn cell_coords_from_position(pos: Vec3, cell_size: f32) -> (i32, i32) {
    ((pos.x / cell_size).floor() as i32, (pos.z / cell_size).floor() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor_3x1() -> MazeGrid {
        let mut grid = MazeGrid::new(3, 1);
        assert!(grid.clear_wall_between((0, 0), (1, 0)));
        assert!(grid.clear_wall_between((2, 0), (1, 0)));
        grid
    }

    #[test]
    fn new_grid_is_fully_walled() {
        let grid = MazeGrid::new(4, 3);
        assert_eq!(grid.cells().len(), 12);
        assert_eq!(grid.cleared_wall_count(), 0);
        assert!(grid.cells().iter().all(|c| c.top_wall && c.left_wall && !c.visited));
        assert_eq!(grid.reachable_cells((0, 0)), 1);
    }

    #[test]
    fn clearing_toward_higher_x_clears_neighbor_left_wall() {
        let mut grid = MazeGrid::new(2, 2);
        grid.clear_wall_between((0, 0), (1, 0));
        assert!(!grid.cell(1, 0).expect("cell").left_wall);
        assert!(grid.cell(0, 0).expect("cell").left_wall);
        assert!(!grid.has_wall(0, 0, GridDirection::East));
        assert!(!grid.has_wall(1, 0, GridDirection::West));
    }

    #[test]
    fn clearing_from_higher_y_clears_own_top_wall() {
        let mut grid = MazeGrid::new(2, 2);
        grid.clear_wall_between((0, 1), (0, 0));
        assert!(!grid.cell(0, 1).expect("cell").top_wall);
        assert!(!grid.has_wall(0, 0, GridDirection::South));
        assert!(!grid.has_wall(0, 1, GridDirection::North));
    }

    #[test]
    fn clearing_non_adjacent_cells_is_rejected() {
        let mut grid = MazeGrid::new(3, 3);
        assert!(!grid.clear_wall_between((0, 0), (2, 0)));
        assert!(!grid.clear_wall_between((0, 0), (1, 1)));
        assert_eq!(grid.cleared_wall_count(), 0);
    }

    #[test]
    fn boundary_is_always_walled() {
        let grid = corridor_3x1();
        assert!(grid.has_wall(2, 0, GridDirection::East));
        assert!(grid.has_wall(0, 0, GridDirection::West));
        assert!(grid.has_wall(1, 0, GridDirection::South));
        assert!(grid.has_wall(7, 7, GridDirection::North));
    }

    #[test]
    fn reachable_cells_follow_open_walls() {
        let grid = corridor_3x1();
        assert_eq!(grid.cleared_wall_count(), 2);
        assert_eq!(grid.reachable_cells((2, 0)), 3);
        assert_eq!(grid.reachable_cells((5, 0)), 0);
    }

    #[test]
    fn wall_segments_include_derived_boundaries() {
        let grid = MazeGrid::new(2, 2);
        // 4 top + 4 left stored, plus 2 bottom and 2 right boundary walls
        assert_eq!(grid.wall_segments(CELL_SIZE).len(), 12);

        let corridor = corridor_3x1();
        // 3 top, 1 left, 3 bottom, 1 right
        assert_eq!(corridor.wall_segments(CELL_SIZE).len(), 8);
    }

    #[test]
    fn wall_bounds_are_thin_across_the_segment() {
        let wall = Wall {
            x1: 0.0,
            z1: 4.0,
            x2: 4.0,
            z2: 4.0,
            width: 0.2,
        };
        let (center, half) = wall.bounds();
        assert!((center.x - 2.0).abs() < 1e-6);
        assert!((center.z - 4.0).abs() < 1e-6);
        assert!((half.x - 2.0).abs() < 1e-6);
        assert!((half.z - 0.1).abs() < 1e-6);
        assert!(center.y - half.y < 0.0);
    }

    #[test]
    fn position_round_trips_through_cell_center() {
        let center = cell_center(3, 5, 2.0);
        assert_eq!(cell_coords_from_position(center, 2.0), (3, 5));
        assert_eq!(cell_coords_from_position(Vec3::new(-0.1, 0.0, 0.5), 2.0), (-1, 0));
    }

    #[test]
    fn junction_requires_all_four_sides_open() {
        let mut grid = MazeGrid::new(3, 3);
        grid.clear_wall_between((1, 1), (0, 1));
        grid.clear_wall_between((1, 1), (2, 1));
        grid.clear_wall_between((1, 1), (1, 0));
        assert!(!grid.is_junction(1, 1));
        grid.clear_wall_between((1, 1), (1, 2));
        assert!(grid.is_junction(1, 1));
        assert!(!grid.is_junction(0, 0));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn cleared_walls_read_open_from_both_sides(
                width in 1_usize..12,
                height in 1_usize..12,
                x in 0_usize..12,
                y in 0_usize..12,
                dir_index in 0_usize..4
            ) {
                let (x, y) = (x % width, y % height);
                let dir = GridDirection::ALL[dir_index];
                let mut grid = MazeGrid::new(width, height);

                match grid.neighbor(x, y, dir) {
                    Some((nx, ny)) => {
                        prop_assert!(grid.clear_wall_between((x, y), (nx, ny)));
                        prop_assert!(!grid.has_wall(x, y, dir));
                        prop_assert!(!grid.has_wall(nx, ny, dir.opposite()));
                        prop_assert_eq!(grid.cleared_wall_count(), 1);
                    }
                    None => prop_assert!(grid.has_wall(x, y, dir)),
                }
            }
        }
    }
}
