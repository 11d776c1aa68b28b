//! Grid search used by `locate`.
//!
//! The frontier is ordered by `gcost + hcost`, then by `hcost` (stable sort,
//! so remaining ties keep insertion order). The octile heuristic is consistent
//! for these step costs, so a popped cell never needs reopening and every
//! returned route is a cheapest one. Costs are recorded per search in a side
//! table keyed by cell; nothing leaks between searches.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::constants::step_cost;
use crate::grid::Grid;
use crate::types::Cell;

const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Cells from goal back to start, goal first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Route {
    pub cells: Vec<Cell>,
    pub cost: i32,
}

impl Route {
    pub fn goal(&self) -> Option<Cell> {
        self.cells.first().copied()
    }

    pub fn start(&self) -> Option<Cell> {
        self.cells.last().copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// `[[x,y],[x,y],...]`
    pub fn format(&self) -> String {
        let parts: Vec<String> = self.cells.iter().map(|cell| cell.to_string()).collect();
        format!("[{}]", parts.join(","))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

#[derive(Clone, Copy, Debug)]
struct SearchNode {
    gcost: i32,
    hcost: i32,
    parent: Option<Cell>,
}

/// Octile distance with cardinal cost 10 and diagonal cost 14.
pub fn heuristic(a: Cell, b: Cell) -> i32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    if dx > dy {
        14 * dy + 10 * (dx - dy)
    } else {
        14 * dx + 10 * (dy - dx)
    }
}

/// Clamped 8-neighbourhood. Clamping at an edge can fold a neighbour onto the
/// cell itself or onto an earlier neighbour; those are dropped.
pub fn neighbors(grid: &Grid, cell: Cell) -> Vec<Cell> {
    let mut out: Vec<Cell> = Vec::with_capacity(NEIGHBOR_OFFSETS.len());
    for (dx, dy) in NEIGHBOR_OFFSETS {
        let next = grid.offset(cell, dx, dy);
        if next == cell || out.contains(&next) {
            continue;
        }
        out.push(next);
    }
    out
}

pub fn find_path(grid: &Grid, start: Cell, goal: Cell) -> Option<Route> {
    if !grid.contains(start) || !grid.contains(goal) {
        return None;
    }
    if start == goal {
        return Some(Route {
            cells: vec![start],
            cost: 0,
        });
    }
    if !grid.is_walkable(start) || !grid.is_walkable(goal) {
        return None;
    }

    let mut nodes: HashMap<Cell, SearchNode> = HashMap::new();
    let mut open: Vec<Cell> = vec![start];
    let mut closed: HashSet<Cell> = HashSet::new();
    nodes.insert(
        start,
        SearchNode {
            gcost: 0,
            hcost: heuristic(start, goal),
            parent: None,
        },
    );

    while !open.is_empty() {
        open.sort_by_key(|cell| {
            nodes
                .get(cell)
                .map(|node| (node.gcost + node.hcost, node.hcost))
                .unwrap_or((i32::MAX, i32::MAX))
        });
        let current = open.remove(0);
        closed.insert(current);

        if current == goal {
            return Some(reconstruct(&nodes, goal));
        }

        let current_g = nodes.get(&current).map(|node| node.gcost).unwrap_or(0);
        for next in neighbors(grid, current) {
            if closed.contains(&next) || !grid.is_walkable(next) {
                continue;
            }
            let tentative = current_g + step_cost(next.x - current.x, next.y - current.y);
            let improves = nodes
                .get(&next)
                .map(|node| tentative < node.gcost)
                .unwrap_or(true);
            if improves {
                nodes.insert(
                    next,
                    SearchNode {
                        gcost: tentative,
                        hcost: heuristic(next, goal),
                        parent: Some(current),
                    },
                );
            }
            if !open.contains(&next) {
                open.push(next);
            }
        }
    }

    None
}

fn reconstruct(nodes: &HashMap<Cell, SearchNode>, goal: Cell) -> Route {
    let cost = nodes.get(&goal).map(|node| node.gcost).unwrap_or(0);
    let mut cells = vec![goal];
    let mut cursor = nodes.get(&goal).and_then(|node| node.parent);
    while let Some(cell) = cursor {
        cells.push(cell);
        cursor = nodes.get(&cell).and_then(|node| node.parent);
    }
    Route { cells, cost }
}

/// Sum of step costs along consecutive cells, `None` if two cells are not
/// 8-neighbours.
pub fn path_cost(cells: &[Cell]) -> Option<i32> {
    let mut total = 0;
    for pair in cells.windows(2) {
        let dx = pair[1].x - pair[0].x;
        let dy = pair[1].y - pair[0].y;
        if dx.abs() > 1 || dy.abs() > 1 || (dx == 0 && dy == 0) {
            return None;
        }
        total += step_cost(dx, dy);
    }
    Some(total)
}
