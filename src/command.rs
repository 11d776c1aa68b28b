use crate::error::GameError;
use crate::movement::{parse_cardinal, parse_direction, parse_distance};
use crate::types::{Cardinal, Direction};

/// One parsed client line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Move { direction: Direction, distance: u32 },
    Locate { name: String },
    Jump { direction: Cardinal },
    Pickup { item: String },
    Drop { item: String },
    Buy { item: String },
    Sell { item: String },
    Equip { item: String },
    Unequip { item: String },
    Combine { first: String, second: String },
    Scan { distance: u32 },
    Stats,
    Map,
    Routes,
    Help,
    Quit,
}

pub const HELP_LINES: &[&str] = &[
    "move <direction> <distance>  walk north/south/east/west or a diagonal",
    "locate <name>                route to an item or character in this town",
    "jump <north|south|east|west> travel to a neighbouring town",
    "pickup <item>                take the item you are standing on",
    "drop <item>                  leave an item here",
    "buy <item> / sell <item>     trade with the character you stand beside",
    "equip <item> / unequip <item>",
    "combine <item> <item>        merge two items",
    "scan <distance>              list items nearby",
    "stats, map, routes, help, quit",
];

/// Splits on whitespace; the first word is matched case-insensitively and
/// surplus arguments are rejected.
pub fn parse_command(line: &str) -> Result<Command, GameError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((head, args)) = words.split_first() else {
        return Err(GameError::InvalidCommand);
    };

    match (head.to_ascii_lowercase().as_str(), args) {
        ("move", [direction, distance]) => Ok(Command::Move {
            direction: parse_direction(direction)?,
            distance: parse_distance(distance)?,
        }),
        ("locate", [name]) => Ok(Command::Locate {
            name: name.to_string(),
        }),
        ("jump", [direction]) => Ok(Command::Jump {
            direction: parse_cardinal(direction)?,
        }),
        ("pickup", [item]) => Ok(Command::Pickup {
            item: item.to_string(),
        }),
        ("drop", [item]) => Ok(Command::Drop {
            item: item.to_string(),
        }),
        ("buy", [item]) => Ok(Command::Buy {
            item: item.to_string(),
        }),
        ("sell", [item]) => Ok(Command::Sell {
            item: item.to_string(),
        }),
        ("equip", [item]) => Ok(Command::Equip {
            item: item.to_string(),
        }),
        ("unequip", [item]) => Ok(Command::Unequip {
            item: item.to_string(),
        }),
        ("combine", [first, second]) => Ok(Command::Combine {
            first: first.to_string(),
            second: second.to_string(),
        }),
        ("scan", [distance]) => Ok(Command::Scan {
            distance: parse_distance(distance)?,
        }),
        ("stats", []) => Ok(Command::Stats),
        ("map", []) => Ok(Command::Map),
        ("routes", []) => Ok(Command::Routes),
        ("help", []) => Ok(Command::Help),
        ("quit", []) | ("exit", []) => Ok(Command::Quit),
        _ => Err(GameError::InvalidCommand),
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GameError;
    use crate::types::{Cardinal, Direction};

    use super::{parse_command, Command};

    #[test]
    fn parses_movement_commands() {
        assert_eq!(
            parse_command("move east 10"),
            Ok(Command::Move {
                direction: Direction::East,
                distance: 10
            })
        );
        assert_eq!(
            parse_command("  MOVE   SouthWest 0 "),
            Ok(Command::Move {
                direction: Direction::SouthWest,
                distance: 0
            })
        );
        assert_eq!(
            parse_command("jump north"),
            Ok(Command::Jump {
                direction: Cardinal::North
            })
        );
    }

    #[test]
    fn item_commands_keep_argument_case() {
        assert_eq!(
            parse_command("pickup Rusty-Sword"),
            Ok(Command::Pickup {
                item: "Rusty-Sword".to_string()
            })
        );
        assert_eq!(
            parse_command("combine rope lantern"),
            Ok(Command::Combine {
                first: "rope".to_string(),
                second: "lantern".to_string()
            })
        );
        assert_eq!(
            parse_command("BUY Longbow"),
            Ok(Command::Buy {
                item: "Longbow".to_string()
            })
        );
        assert_eq!(
            parse_command("sell apple"),
            Ok(Command::Sell {
                item: "apple".to_string()
            })
        );
        assert_eq!(parse_command("stats"), Ok(Command::Stats));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in [
            "",
            "   ",
            "dance",
            "move east",
            "move up 3",
            "move east -1",
            "move east far",
            "jump northeast",
            "locate",
            "stats now",
            "scan x",
        ] {
            assert_eq!(parse_command(line), Err(GameError::InvalidCommand), "{line:?}");
        }
    }
}
