use std::fmt;

use serde::Serialize;

pub type TownId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn in_bounds(self, width: i32, height: i32) -> bool {
        self.x >= 0 && self.y >= 0 && self.x < width && self.y < height
    }

    pub fn chebyshev(self, other: Cell) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

/// Movement directions accepted by `move`. North increases `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "north" => Some(Self::North),
            "south" => Some(Self::South),
            "east" => Some(Self::East),
            "west" => Some(Self::West),
            "northeast" => Some(Self::NorthEast),
            "northwest" => Some(Self::NorthWest),
            "southeast" => Some(Self::SouthEast),
            "southwest" => Some(Self::SouthWest),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, 1),
            Direction::NorthWest => (-1, 1),
            Direction::SouthEast => (1, -1),
            Direction::SouthWest => (-1, -1),
        }
    }
}

/// The four adjacency slots of a town, in slot order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinal {
    North,
    South,
    East,
    West,
}

impl Cardinal {
    pub const ALL: [Cardinal; 4] = [
        Cardinal::North,
        Cardinal::South,
        Cardinal::East,
        Cardinal::West,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "north" => Some(Self::North),
            "south" => Some(Self::South),
            "east" => Some(Self::East),
            "west" => Some(Self::West),
            _ => None,
        }
    }

    pub fn slot(self) -> usize {
        match self {
            Cardinal::North => 0,
            Cardinal::South => 1,
            Cardinal::East => 2,
            Cardinal::West => 3,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Cardinal::North => Cardinal::South,
            Cardinal::South => Cardinal::North,
            Cardinal::East => Cardinal::West,
            Cardinal::West => Cardinal::East,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Cardinal::East | Cardinal::West)
    }

    pub fn as_direction(self) -> Direction {
        match self {
            Cardinal::North => Direction::North,
            Cardinal::South => Direction::South,
            Cardinal::East => Direction::East,
            Cardinal::West => Direction::West,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Cardinal::North => "north",
            Cardinal::South => "south",
            Cardinal::East => "east",
            Cardinal::West => "west",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Armour,
    Weapon,
    Consumable,
    Generic,
    EventMarker,
}

impl ItemType {
    pub fn classify(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("armour") {
            return ItemType::Armour;
        }
        if lower.contains("sword") || lower.contains("spear") {
            return ItemType::Weapon;
        }
        ItemType::Generic
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Item {
    pub description: String,
    pub coordinates: Cell,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "type")]
    pub item_type: ItemType,
}

impl Item {
    pub fn new(description: impl Into<String>, coordinates: Cell, item_type: ItemType) -> Self {
        Self {
            description: description.into(),
            coordinates,
            is_active: true,
            item_type,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Hotspot,
    Npc,
    Enemy,
}

impl EventType {
    pub fn is_single_use(self) -> bool {
        self == EventType::Hotspot
    }

    pub fn label(self) -> &'static str {
        match self {
            EventType::Hotspot => "hotspot",
            EventType::Npc => "humanoid",
            EventType::Enemy => "a dreaded foe",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Event {
    pub coordinates: Cell,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub name: String,
}

impl Event {
    pub fn new(coordinates: Cell, event_type: EventType, name: impl Into<String>) -> Self {
        Self {
            coordinates,
            event_type,
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AdjacentView {
    pub direction: Cardinal,
    #[serde(rename = "townId")]
    pub town_id: TownId,
    pub name: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TownView {
    pub id: TownId,
    pub name: String,
    pub description: String,
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
    #[serde(rename = "walkableCells")]
    pub walkable_cells: usize,
    pub items: Vec<Item>,
    pub events: Vec<Event>,
    pub adjacent: Vec<AdjacentView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct WorldView {
    pub seed: u32,
    pub towns: Vec<TownView>,
}
