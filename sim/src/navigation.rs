use bevy_math::Vec3;
use std::{collections::VecDeque, rc::Rc};

use crate::services::{NavPath, Navigation, PathStatus};
use common::{
    constants::{ENEMY_RADIUS, PHYSICS_EPSILON, WALL_THICKNESS},
    map::{MazeGrid, cell_center, cell_coords_from_position},
};

// ============================================================================
// Grid Navigator
// ============================================================================

// Navigation over the open walls of a maze. Walkable space is every cell inset by `margin`
// from the cell boundary, so agents keep clear of wall faces.
#[derive(Debug, Clone)]
pub struct GridNavigator {
    grid: Rc<MazeGrid>,
    cell_size: f32,
    margin: f32,
}

impl GridNavigator {
    #[must_use]
    pub fn new(grid: Rc<MazeGrid>, cell_size: f32) -> Self {
        let margin = (ENEMY_RADIUS + WALL_THICKNESS / 2.0).min(cell_size / 2.0);
        Self {
            grid,
            cell_size,
            margin,
        }
    }

    #[must_use]
    pub fn grid(&self) -> &MazeGrid {
        &self.grid
    }

    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn cell_of(&self, point: Vec3) -> Option<(usize, usize)> {
        let (x, y) = cell_coords_from_position(point, self.cell_size);
        self.grid.in_bounds(x, y).then_some((x as usize, y as usize))
    }

    fn clamp_to_grid(&self, point: Vec3) -> (usize, usize) {
        let (x, y) = cell_coords_from_position(point, self.cell_size);
        let max_x = self.grid.width().saturating_sub(1) as i32;
        let max_y = self.grid.height().saturating_sub(1) as i32;
        (x.clamp(0, max_x) as usize, y.clamp(0, max_y) as usize)
    }

    // Clamp a point into the walkable interior of the given cell
    fn clamp_into_cell(&self, point: Vec3, (x, y): (usize, usize)) -> Vec3 {
        let min_x = (x as f32).mul_add(self.cell_size, self.margin);
        let min_z = (y as f32).mul_add(self.cell_size, self.margin);
        let max_x = ((x + 1) as f32).mul_add(self.cell_size, -self.margin);
        let max_z = ((y + 1) as f32).mul_add(self.cell_size, -self.margin);
        Vec3::new(point.x.clamp(min_x, max_x), 0.0, point.z.clamp(min_z, max_z))
    }

    // Breadth-first cell route, both ends included
    fn cell_route(&self, start: (usize, usize), goal: (usize, usize)) -> Option<Vec<(usize, usize)>> {
        let width = self.grid.width();
        let mut came_from: Vec<Option<(usize, usize)>> = vec![None; self.grid.cells().len()];
        let mut queue = VecDeque::new();
        came_from[start.1 * width + start.0] = Some(start);
        queue.push_back(start);

        while let Some((x, y)) = queue.pop_front() {
            if (x, y) == goal {
                let mut route = vec![goal];
                let mut current = goal;
                while current != start {
                    current = came_from[current.1 * width + current.0]?;
                    route.push(current);
                }
                route.reverse();
                return Some(route);
            }

            for dir in self.grid.open_directions(x, y) {
                if let Some((nx, ny)) = self.grid.neighbor(x, y, dir) {
                    let slot = &mut came_from[ny * width + nx];
                    if slot.is_none() {
                        *slot = Some((x, y));
                        queue.push_back((nx, ny));
                    }
                }
            }
        }

        None
    }

    fn waypoints(&self, route: &[(usize, usize)], goal: Vec3) -> Vec<Vec3> {
        let mut waypoints: Vec<Vec3> = route
            .iter()
            .skip(1)
            .map(|&(x, y)| cell_center(x, y, self.cell_size))
            .collect();
        let goal = Vec3::new(goal.x, 0.0, goal.z);
        if waypoints.last().is_none_or(|last| last.distance_squared(goal) > PHYSICS_EPSILON) {
            waypoints.push(goal);
        }
        waypoints
    }
}

impl Navigation for GridNavigator {
    fn find_path(&self, from: Vec3, to: Vec3) -> NavPath {
        let Some(start) = self.cell_of(from) else {
            return NavPath::invalid();
        };

        let (goal_cell, goal, status) = match self.cell_of(to) {
            Some(cell) => (cell, self.clamp_into_cell(to, cell), PathStatus::Complete),
            None => {
                let cell = self.clamp_to_grid(to);
                (cell, self.clamp_into_cell(to, cell), PathStatus::Partial)
            }
        };

        match self.cell_route(start, goal_cell) {
            Some(route) => NavPath {
                status,
                waypoints: self.waypoints(&route, goal),
            },
            None => NavPath::invalid(),
        }
    }

    fn sample_position(&self, point: Vec3, max_radius: f32) -> Option<Vec3> {
        if self.grid.cells().is_empty() {
            return None;
        }
        let cell = self.clamp_to_grid(point);
        let snapped = self.clamp_into_cell(point, cell);
        let flat = Vec3::new(point.x, 0.0, point.z);
        (snapped.distance(flat) <= max_radius).then_some(snapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::constants::CELL_SIZE;

    // 3x1 corridor plus a dead-end cell below the middle: (0,0)-(1,0)-(2,0), (1,0)-(1,1)
    fn navigator() -> GridNavigator {
        let mut grid = MazeGrid::new(3, 2);
        grid.clear_wall_between((0, 0), (1, 0));
        grid.clear_wall_between((1, 0), (2, 0));
        grid.clear_wall_between((1, 0), (1, 1));
        GridNavigator::new(Rc::new(grid), CELL_SIZE)
    }

    #[test]
    fn complete_path_follows_open_cells() {
        let nav = navigator();
        let from = cell_center(0, 0, CELL_SIZE);
        let to = cell_center(1, 1, CELL_SIZE);
        let path = nav.find_path(from, to);
        assert_eq!(path.status, PathStatus::Complete);
        assert_eq!(path.waypoints, vec![cell_center(1, 0, CELL_SIZE), cell_center(1, 1, CELL_SIZE)]);
    }

    #[test]
    fn off_center_goal_is_appended() {
        let nav = navigator();
        let to = cell_center(2, 0, CELL_SIZE) + Vec3::new(1.0, 0.0, 0.5);
        let path = nav.find_path(cell_center(0, 0, CELL_SIZE), to);
        assert!(path.is_complete());
        assert_eq!(path.waypoints.len(), 3);
        assert_eq!(path.end(), Some(to));
    }

    #[test]
    fn unreachable_cell_is_invalid() {
        let nav = navigator();
        // (0,1) is sealed off
        let path = nav.find_path(cell_center(0, 0, CELL_SIZE), cell_center(0, 1, CELL_SIZE));
        assert_eq!(path.status, PathStatus::Invalid);
        assert!(path.waypoints.is_empty());
    }

    #[test]
    fn goal_outside_maze_is_partial_and_start_outside_is_invalid() {
        let nav = navigator();
        let outside = Vec3::new(100.0, 0.0, 2.0);
        let partial = nav.find_path(cell_center(0, 0, CELL_SIZE), outside);
        assert_eq!(partial.status, PathStatus::Partial);
        let end = partial.end().expect("clamped end");
        assert!(end.x < 3.0 * CELL_SIZE);

        assert_eq!(nav.find_path(outside, cell_center(0, 0, CELL_SIZE)).status, PathStatus::Invalid);
    }

    #[test]
    fn sample_position_snaps_within_radius() {
        let nav = navigator();
        let near_wall = Vec3::new(0.05, 0.0, 2.0);
        let snapped = nav.sample_position(near_wall, 1.0).expect("snapped");
        assert!(snapped.x >= 0.5 - 1e-5);
        assert!(nav.sample_position(Vec3::new(-20.0, 0.0, 2.0), 1.0).is_none());
        assert!(nav.sample_position(Vec3::new(-20.0, 0.0, 2.0), 50.0).is_some());
    }
}
