use crate::constants::{MAX_TUNNELS, MAX_TUNNEL_LENGTH};
use crate::grid::Grid;
use crate::rng::Rng;
use crate::types::{Cardinal, Cell};

/// Random-walk tunneller. Each tunnel turns onto the other axis, so corridors
/// alternate horizontal/vertical and never double back on themselves.
#[derive(Clone, Copy, Debug)]
pub struct DungeonGenerator {
    pub max_tunnels: usize,
    pub max_tunnel_length: i32,
}

impl Default for DungeonGenerator {
    fn default() -> Self {
        Self {
            max_tunnels: MAX_TUNNELS,
            max_tunnel_length: MAX_TUNNEL_LENGTH,
        }
    }
}

impl DungeonGenerator {
    pub fn generate(&self, width: i32, height: i32, rng: &mut Rng) -> Grid {
        let mut grid = Grid::new(width, height);
        self.carve(&mut grid, rng);
        grid
    }

    pub fn carve(&self, grid: &mut Grid, rng: &mut Rng) {
        let mut cursor = Cell::new(grid.width() / 2, grid.height() / 2);
        grid.set_walkable(cursor, true);

        let mut last = if rng.bool(0.5) {
            Cardinal::East
        } else {
            Cardinal::North
        };

        for _ in 0..self.max_tunnels {
            let direction = pick_perpendicular(last, rng);
            let length = rng.below(self.max_tunnel_length);
            let (dx, dy) = direction.as_direction().delta();

            for _ in 0..length {
                cursor = grid.offset(cursor, dx, dy);
                grid.set_walkable(cursor, true);
            }

            last = direction;
        }
    }
}

fn pick_perpendicular(last: Cardinal, rng: &mut Rng) -> Cardinal {
    let flip = rng.bool(0.5);
    match (last.is_horizontal(), flip) {
        (true, true) => Cardinal::North,
        (true, false) => Cardinal::South,
        (false, true) => Cardinal::East,
        (false, false) => Cardinal::West,
    }
}
