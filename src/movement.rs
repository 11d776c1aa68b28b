//! Player movement inside a town, jumps between towns and `locate` queries.

use crate::constants::ENTRY_POINT;
use crate::dispatch::EventDispatch;
use crate::error::GameError;
use crate::pathfinding::{find_path, Route};
use crate::player::Player;
use crate::town::Town;
use crate::types::{Cardinal, Direction, Event};
use crate::world::World;

pub const WALL_NOTICE: &str = "A wall blocks your path - one must circumvent it";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveReport {
    pub steps: u32,
    pub blocked: bool,
    pub event: Option<Event>,
    pub lines: Vec<String>,
}

pub fn parse_direction(value: &str) -> Result<Direction, GameError> {
    Direction::parse(value).ok_or(GameError::InvalidCommand)
}

pub fn parse_cardinal(value: &str) -> Result<Cardinal, GameError> {
    Cardinal::parse(value).ok_or(GameError::InvalidCommand)
}

pub fn parse_distance(value: &str) -> Result<u32, GameError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| GameError::InvalidCommand)
}

pub fn current_town<'w>(world: &'w World, player: &Player) -> Result<&'w Town, GameError> {
    world
        .town(player.town)
        .ok_or(GameError::UnknownTown(player.town))
}

/// Walks up to `distance` cells, stopping at the first blocked or pinned step,
/// then resolves the first event on the final cell.
pub fn move_player(
    world: &World,
    player: &mut Player,
    direction: Direction,
    distance: u32,
    dispatch: &mut dyn EventDispatch,
) -> Result<MoveReport, GameError> {
    let town = current_town(world, player)?;
    let grid = town.grid();
    let (dx, dy) = direction.delta();

    let mut steps = 0;
    let mut blocked = false;
    while steps < distance {
        let next = grid.offset(player.position, dx, dy);
        if next == player.position || !grid.is_walkable(next) {
            blocked = true;
            break;
        }
        player.position = next;
        steps += 1;
    }

    let mut lines = Vec::new();
    if blocked {
        lines.push(WALL_NOTICE.to_string());
    }
    lines.push(format!("- Your position is {}", player.position));

    let event = if steps > 0 {
        town.claim_event_at(player.position)
    } else {
        None
    };
    if let Some(event) = &event {
        lines.push(format!("You have found a {}", event.event_type.label()));
        lines.extend(dispatch.resolve(player, town, event));
    }

    Ok(MoveReport {
        steps,
        blocked,
        event,
        lines,
    })
}

/// Moves the player through a populated slot to the neighbouring town's entry
/// point.
pub fn jump(world: &World, player: &mut Player, direction: Cardinal) -> Result<String, GameError> {
    let town = current_town(world, player)?;
    let target_id = town.adjacent(direction).ok_or(GameError::NoRouteThatWay)?;
    let target = world
        .town(target_id)
        .ok_or(GameError::UnknownTown(target_id))?;
    player.town = target_id;
    player.position = ENTRY_POINT;
    Ok(format!("You have arrived in {}", target.name))
}

pub fn locate(world: &World, player: &Player, name: &str) -> Result<Route, GameError> {
    let town = current_town(world, player)?;
    let Some(target) = town.find_target(name) else {
        if world.has_character(name) {
            return Err(GameError::EventTargetNotFound(name.to_string()));
        }
        return Err(GameError::ItemNotFound(name.to_string()));
    };
    find_path(town.grid(), player.position, target).ok_or(GameError::PathNotFound)
}
