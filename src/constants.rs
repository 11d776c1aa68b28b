use std::ops::RangeInclusive;

use crate::types::{Cell, ItemType};

pub const WIDTH: i32 = 30;
pub const HEIGHT: i32 = 15;

pub const MAX_TUNNELS: usize = 60;
pub const MAX_TUNNEL_LENGTH: i32 = 8;

/// Rejection-sampling budget when looking for a walkable cell.
pub const MAX_FREE_CELL_ATTEMPTS: usize = 10_000;

pub const CARDINAL_STEP_COST: i32 = 10;
pub const DIAGONAL_STEP_COST: i32 = 14;

pub const STARTING_HEALTH: i32 = 100;
pub const STARTING_GOLD: i32 = 100;

pub const MAX_NAME_LEN: usize = 16;
pub const MAX_WARES_LISTED: usize = 5;

/// Where a player lands when spawning or jumping into a town.
pub const ENTRY_POINT: Cell = Cell {
    x: WIDTH / 2,
    y: HEIGHT / 2,
};

pub const TOWN_COUNT: RangeInclusive<i32> = 2..=6;
pub const ITEM_COUNT: RangeInclusive<i32> = 10..=20;
pub const CONSUMABLE_COUNT: RangeInclusive<i32> = 10..=20;
pub const HOTSPOT_COUNT: RangeInclusive<i32> = 5..=15;
pub const NPC_COUNT: RangeInclusive<i32> = 4..=10;
pub const ENEMY_COUNT: RangeInclusive<i32> = 10..=15;

pub fn step_cost(dx: i32, dy: i32) -> i32 {
    if dx != 0 && dy != 0 {
        DIAGONAL_STEP_COST
    } else {
        CARDINAL_STEP_COST
    }
}

/// Gold a merchant asks for, or pays for, an item of this type.
pub fn ware_price(item_type: ItemType) -> i32 {
    match item_type {
        ItemType::Armour => 9,
        ItemType::Weapon => 8,
        ItemType::Generic => 4,
        ItemType::Consumable => 2,
        ItemType::EventMarker => 0,
    }
}

pub fn enemy_damage_taken(base: i32, has_armour: bool) -> i32 {
    if has_armour {
        return base / 2;
    }
    base
}
