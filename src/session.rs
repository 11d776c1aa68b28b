//! One client conversation: name prompt, then one command per line.

use std::sync::Arc;

use crate::command::{parse_command, Command, HELP_LINES};
use crate::dispatch::EventDispatch;
use crate::error::GameError;
use crate::movement::{current_town, jump, locate, move_player};
use crate::player::Player;
use crate::server_utils::{format_reply, sanitize_name};
use crate::world::World;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub close: bool,
}

impl Reply {
    fn lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            close: false,
        }
    }

    /// Lines as sent on the wire.
    pub fn rendered(&self) -> Vec<String> {
        self.lines.iter().map(|line| format_reply(line)).collect()
    }
}

pub struct Session {
    world: Arc<World>,
    dispatch: Box<dyn EventDispatch + Send>,
    player: Option<Player>,
}

impl Session {
    pub fn new(world: Arc<World>, dispatch: Box<dyn EventDispatch + Send>) -> Self {
        Self {
            world,
            dispatch,
            player: None,
        }
    }

    pub fn greeting() -> Reply {
        Reply::lines(vec![
            "Welcome to the dungeon".to_string(),
            "What is your name?".to_string(),
        ])
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn handle_line(&mut self, line: &str) -> Reply {
        let Some(player) = self.player.as_mut() else {
            return self.join(line);
        };
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(err) => return Reply::lines(vec![err.to_string()]),
        };
        if command == Command::Quit {
            return Reply {
                lines: vec![format!("Farewell {}", player.name)],
                close: true,
            };
        }
        match execute(&self.world, player, self.dispatch.as_mut(), command) {
            Ok(lines) => Reply::lines(lines),
            Err(err) => Reply::lines(vec![err.to_string()]),
        }
    }

    fn join(&mut self, line: &str) -> Reply {
        let player = Player::new(sanitize_name(line), 0);
        let mut lines = vec![format!("Greetings {}", player.name)];
        if let Some(town) = self.world.town(player.town) {
            lines.push(town.description.clone());
        }
        lines.push(format!("- Your position is {}", player.position));
        lines.push("Type help to list commands".to_string());
        self.player = Some(player);
        Reply::lines(lines)
    }
}

fn execute(
    world: &World,
    player: &mut Player,
    dispatch: &mut dyn EventDispatch,
    command: Command,
) -> Result<Vec<String>, GameError> {
    match command {
        Command::Move {
            direction,
            distance,
        } => Ok(move_player(world, player, direction, distance, dispatch)?.lines),
        Command::Locate { name } => {
            let route = locate(world, player, &name)?;
            Ok(vec![
                format!("Path to {name}: {route}"),
                format!("Path cost: {}", route.cost),
            ])
        }
        Command::Jump { direction } => {
            let arrival = jump(world, player, direction)?;
            let town = current_town(world, player)?;
            Ok(vec![
                arrival,
                town.description.clone(),
                format!("- Your position is {}", player.position),
            ])
        }
        Command::Pickup { item } => {
            let town = current_town(world, player)?;
            Ok(vec![player.pickup(town, &item)?])
        }
        Command::Drop { item } => {
            let town = current_town(world, player)?;
            Ok(vec![player.drop_item(town, &item)?])
        }
        Command::Buy { item } => {
            let town = current_town(world, player)?;
            Ok(vec![player.buy(town, &item)?])
        }
        Command::Sell { item } => {
            let town = current_town(world, player)?;
            Ok(vec![player.sell(town, &item)?])
        }
        Command::Equip { item } => Ok(vec![player.equip(&item)?]),
        Command::Unequip { item } => Ok(vec![player.unequip(&item)?]),
        Command::Combine { first, second } => Ok(vec![player.combine(&first, &second)?]),
        Command::Scan { distance } => {
            let town = current_town(world, player)?;
            Ok(player.scan(town, distance.min(i32::MAX as u32) as i32))
        }
        Command::Stats => {
            let town = current_town(world, player)?;
            Ok(player.stats(&town.name))
        }
        Command::Map => {
            let town = current_town(world, player)?;
            let mut rows = town.grid().render(Some(player.position));
            rows.reverse();
            Ok(rows)
        }
        Command::Routes => {
            let routes = world.routes(player.town);
            if routes.is_empty() {
                return Ok(vec!["There is no way out of this town".to_string()]);
            }
            Ok(routes)
        }
        Command::Help => Ok(HELP_LINES.iter().map(|line| line.to_string()).collect()),
        Command::Quit => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::constants::{ENTRY_POINT, HEIGHT, WIDTH};
    use crate::dispatch::StandardDispatch;
    use crate::grid::Grid;
    use crate::movement::WALL_NOTICE;
    use crate::town::{Town, TownContents};
    use crate::types::{Cardinal, Cell, Event, EventType, Item, ItemType};
    use crate::world::World;

    use super::Session;

    fn world() -> Arc<World> {
        let mut grid = Grid::new(WIDTH, HEIGHT);
        for x in ENTRY_POINT.x..=ENTRY_POINT.x + 3 {
            grid.set_walkable(Cell::new(x, ENTRY_POINT.y), true);
        }
        let contents = TownContents {
            items: vec![Item::new(
                "rusty-sword",
                Cell::new(ENTRY_POINT.x + 2, ENTRY_POINT.y),
                ItemType::Weapon,
            )],
            events: vec![Event::new(
                Cell::new(ENTRY_POINT.x + 3, ENTRY_POINT.y),
                EventType::Npc,
                "Mirela",
            )],
        };
        let mut home = Town::new(0, "Ashford", "Ashford welcomes you.", grid)
            .with_contents(contents);
        let mut away = Town::new(1, "Duskmere", "Duskmere is dark.", Grid::default());
        home.set_adjacent(Cardinal::North, 1);
        away.set_adjacent(Cardinal::South, 0);
        Arc::new(World::from_towns(1, vec![home, away]))
    }

    fn joined() -> Session {
        let mut session = Session::new(world(), Box::new(StandardDispatch::new(1)));
        session.handle_line("  Ada ");
        session
    }

    #[test]
    fn first_line_names_the_player() {
        let mut session = Session::new(world(), Box::new(StandardDispatch::new(1)));
        assert!(session.player().is_none());
        let reply = session.handle_line("Ada");
        assert_eq!(reply.lines[0], "Greetings Ada");
        assert_eq!(reply.lines[1], "Ashford welcomes you.");
        let player = session.player().expect("joined");
        assert_eq!(player.position, ENTRY_POINT);
        assert_eq!(player.town, 0);
    }

    #[test]
    fn rendered_lines_are_prefixed() {
        let mut session = joined();
        let reply = session.handle_line("fly away");
        assert_eq!(reply.rendered(), vec!["$ Invalid command".to_string()]);
        assert!(!reply.close);
    }

    #[test]
    fn walk_pickup_and_equip() {
        let mut session = joined();
        let reply = session.handle_line("move east 5");
        assert_eq!(reply.lines[0], WALL_NOTICE);
        assert_eq!(reply.lines[1], "- Your position is [18,7]");

        let reply = session.handle_line("pickup rusty-sword");
        assert_eq!(reply.lines, vec!["You are not at the location of the rusty-sword"]);

        session.handle_line("move west 1");
        let reply = session.handle_line("pickup rusty-sword");
        assert_eq!(reply.lines, vec!["Picked up rusty-sword"]);
        let reply = session.handle_line("equip rusty-sword");
        assert_eq!(reply.lines, vec!["Equipped rusty-sword as weapon"]);
        let stats = session.handle_line("stats").lines;
        assert!(stats.contains(&"Weapon: rusty-sword".to_string()));
    }

    #[test]
    fn trading_with_a_merchant() {
        let mut session = joined();
        assert_eq!(
            session.handle_line("buy rusty-sword").lines,
            vec!["There is nobody here to trade with"]
        );

        let reply = session.handle_line("move east 3");
        assert_eq!(reply.lines[1], "You have found a humanoid");
        assert_eq!(reply.lines[2], "Goodday fellow union member I am Mirela!");
        assert_eq!(reply.lines[3], "I have these wares for sale: rusty-sword");

        assert_eq!(
            session.handle_line("buy rusty-sword").lines,
            vec!["Purchased rusty-sword from Mirela for 8 gold"]
        );
        assert_eq!(
            session.handle_line("sell rusty-sword").lines,
            vec!["Sold rusty-sword to Mirela for 8 gold"]
        );
        assert_eq!(
            session.handle_line("buy lantern").lines,
            vec!["Sorry I do not sell lantern"]
        );
        let stats = session.handle_line("stats").lines;
        assert!(stats.contains(&"Gold coins: 100".to_string()));
        assert!(stats.contains(&"Inventory contents: ".to_string()));
    }

    #[test]
    fn locate_reports_route_and_cost() {
        let mut session = joined();
        let reply = session.handle_line("locate rusty-sword");
        assert_eq!(
            reply.lines,
            vec![
                "Path to rusty-sword: [[17,7],[16,7],[15,7]]".to_string(),
                "Path cost: 20".to_string()
            ]
        );
        let reply = session.handle_line("locate dragon");
        assert_eq!(reply.lines, vec!["dragon is not within this town"]);
    }

    #[test]
    fn routes_and_jump() {
        let mut session = joined();
        assert_eq!(
            session.handle_line("routes").lines,
            vec!["You can go to Duskmere which is north"]
        );
        assert_eq!(
            session.handle_line("jump east").lines,
            vec!["No town that way"]
        );
        let reply = session.handle_line("jump north");
        assert_eq!(reply.lines[0], "You have arrived in Duskmere");
        assert_eq!(session.player().map(|player| player.town), Some(1));
    }

    #[test]
    fn map_marks_the_player_with_north_on_top() {
        let mut session = joined();
        let rows = session.handle_line("map").lines;
        assert_eq!(rows.len(), HEIGHT as usize);
        let top_index = (HEIGHT - 1 - ENTRY_POINT.y) as usize;
        assert_eq!(rows[top_index].find('X'), Some(ENTRY_POINT.x as usize));
    }

    #[test]
    fn quit_closes_the_session() {
        let mut session = joined();
        let reply = session.handle_line("quit");
        assert!(reply.close);
        assert_eq!(reply.lines, vec!["Farewell Ada"]);
    }
}
