use std::collections::{HashSet, VecDeque};

use crate::constants::{HEIGHT, WIDTH};
use crate::types::Cell;

const FLOOR: char = '.';
const WALL: char = '#';

/// Walkability matrix of one town. Cells start blocked; generation opens them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<bool>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(WIDTH, HEIGHT)
    }
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            cells: vec![false; (width * height) as usize],
        }
    }

    /// Parses rows top to bottom where row 0 is `y = 0`. `.` is walkable,
    /// anything else is a wall. Short rows are padded with walls.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0) as i32;
        let mut grid = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == FLOOR {
                    grid.set_walkable(Cell::new(x as i32, y as i32), true);
                }
            }
        }
        grid
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.in_bounds(self.width, self.height)
    }

    /// Out-of-bounds cells are never walkable.
    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.index_of(cell)
            .and_then(|idx| self.cells.get(idx).copied())
            .unwrap_or(false)
    }

    /// Returns false when the cell lies outside the grid.
    pub fn set_walkable(&mut self, cell: Cell, walkable: bool) -> bool {
        let Some(idx) = self.index_of(cell) else {
            return false;
        };
        self.cells[idx] = walkable;
        true
    }

    pub fn clamp(&self, x: i32, y: i32) -> Cell {
        Cell {
            x: x.clamp(0, self.width - 1),
            y: y.clamp(0, self.height - 1),
        }
    }

    /// `from + (dx, dy)` pinned to the grid edges.
    pub fn offset(&self, from: Cell, dx: i32, dy: i32) -> Cell {
        self.clamp(from.x + dx, from.y + dy)
    }

    pub fn walkable_count(&self) -> usize {
        self.cells.iter().filter(|open| **open).count()
    }

    pub fn walkable_cells(&self) -> Vec<Cell> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = Cell::new(x, y);
                if self.is_walkable(cell) {
                    out.push(cell);
                }
            }
        }
        out
    }

    /// 4-connected walkable region containing `start`.
    pub fn reachable_from(&self, start: Cell) -> HashSet<Cell> {
        let mut out = HashSet::new();
        if !self.is_walkable(start) {
            return out;
        }

        let mut queue = VecDeque::new();
        out.insert(start);
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                let next = Cell::new(cell.x + dx, cell.y + dy);
                if !self.is_walkable(next) {
                    continue;
                }
                if out.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        out
    }

    pub fn to_rows(&self) -> Vec<String> {
        self.render(None)
    }

    /// Text rendering with `marker` drawn as `X`.
    pub fn render(&self, marker: Option<Cell>) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| {
                        let cell = Cell::new(x, y);
                        if marker == Some(cell) {
                            'X'
                        } else if self.is_walkable(cell) {
                            FLOOR
                        } else {
                            WALL
                        }
                    })
                    .collect::<String>()
            })
            .collect()
    }

    fn index_of(&self, cell: Cell) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        Some((cell.y * self.width + cell.x) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_fully_blocked() {
        let grid = Grid::default();
        assert_eq!(grid.width(), WIDTH);
        assert_eq!(grid.height(), HEIGHT);
        assert_eq!(grid.walkable_count(), 0);
    }

    #[test]
    fn out_of_bounds_cells_are_never_walkable() {
        let mut grid = Grid::new(4, 3);
        assert!(!grid.set_walkable(Cell::new(4, 0), true));
        assert!(!grid.set_walkable(Cell::new(0, -1), true));
        assert!(!grid.is_walkable(Cell::new(-1, 0)));
        assert!(!grid.is_walkable(Cell::new(0, 3)));
        assert_eq!(grid.walkable_count(), 0);
    }

    #[test]
    fn rows_round_trip_through_rendering() {
        let rows = ["#..#", "....", "#..."];
        let grid = Grid::from_rows(&rows);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert!(grid.is_walkable(Cell::new(1, 0)));
        assert!(!grid.is_walkable(Cell::new(0, 2)));
        assert_eq!(grid.to_rows(), rows.iter().map(|r| r.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn render_marks_the_player_cell() {
        let grid = Grid::from_rows(&["...", "..."]);
        assert_eq!(grid.render(Some(Cell::new(2, 1))), vec!["...", "..X"]);
    }

    #[test]
    fn offset_pins_to_edges() {
        let grid = Grid::default();
        assert_eq!(grid.offset(Cell::new(0, 3), -1, 0), Cell::new(0, 3));
        assert_eq!(grid.offset(Cell::new(4, 0), 0, -1), Cell::new(4, 0));
        assert_eq!(
            grid.offset(Cell::new(WIDTH - 1, HEIGHT - 1), 1, 1),
            Cell::new(WIDTH - 1, HEIGHT - 1)
        );
        assert_eq!(grid.offset(Cell::new(3, 3), 1, 1), Cell::new(4, 4));
    }

    #[test]
    fn reachable_region_stops_at_walls() {
        let grid = Grid::from_rows(&["..#..", "..#..", "#####"]);
        let left = grid.reachable_from(Cell::new(0, 0));
        assert_eq!(left.len(), 4);
        assert!(!left.contains(&Cell::new(3, 0)));
        assert!(grid.reachable_from(Cell::new(2, 0)).is_empty());
    }
}
