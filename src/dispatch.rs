use crate::constants::{
    enemy_damage_taken, ENTRY_POINT, MAX_FREE_CELL_ATTEMPTS, MAX_WARES_LISTED, STARTING_HEALTH,
};
use crate::player::Player;
use crate::rng::Rng;
use crate::town::{find_free_cell, Town};
use crate::types::{Event, EventType, ItemType};

const SKIRMISH_ROUNDS: usize = 6;
const ENEMY_HEALTH_MIN: i32 = 20;
const ENEMY_HEALTH_MAX: i32 = 40;
const PLAYER_HIT_MIN: i32 = 5;
const PLAYER_HIT_MAX: i32 = 10;
const WEAPON_BONUS: i32 = 5;
const ENEMY_HIT_MIN: i32 = 3;
const ENEMY_HIT_MAX: i32 = 8;
const BOUNTY_MIN: i32 = 5;
const BOUNTY_MAX: i32 = 20;

/// Turns an encounter into player-visible lines. Called after the town lock
/// has been released; implementations may lock the town again.
pub trait EventDispatch {
    fn resolve(&mut self, player: &mut Player, town: &Town, event: &Event) -> Vec<String>;
}

#[derive(Clone, Debug)]
pub struct StandardDispatch {
    rng: Rng,
}

impl StandardDispatch {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: Rng::new(seed),
        }
    }

    fn deport(&mut self, player: &mut Player, town: &Town) -> Vec<String> {
        match find_free_cell(town.grid(), &mut self.rng, MAX_FREE_CELL_ATTEMPTS) {
            Ok(cell) => {
                player.position = cell;
                vec![format!("You have been deported to {cell}")]
            }
            Err(_) => vec!["The hotspot fizzles out".to_string()],
        }
    }

    fn greet(&self, town: &Town, name: &str) -> Vec<String> {
        let wares: Vec<String> = town
            .contents()
            .items
            .iter()
            .filter(|item| item.item_type != ItemType::EventMarker)
            .take(MAX_WARES_LISTED)
            .map(|item| item.description.clone())
            .collect();

        let mut lines = vec![format!("Goodday fellow union member I am {name}!")];
        if wares.is_empty() {
            lines.push("Alas, I have nothing to trade today".to_string());
        } else {
            lines.push(format!("I have these wares for sale: {}", wares.join(", ")));
        }
        lines.push("Use buy <item> or sell <item> while we stand together".to_string());
        lines
    }

    fn skirmish(&mut self, player: &mut Player, name: &str) -> Vec<String> {
        let mut lines = vec![format!("The {name} attacks!")];
        let mut enemy_health = self.rng.int(ENEMY_HEALTH_MIN, ENEMY_HEALTH_MAX);
        let bonus = if player.weapon().is_some() {
            WEAPON_BONUS
        } else {
            0
        };
        let armoured = player.armour().is_some();
        let mut dealt = 0;
        let mut taken = 0;

        for _ in 0..SKIRMISH_ROUNDS {
            let hit = self.rng.int(PLAYER_HIT_MIN, PLAYER_HIT_MAX) + bonus;
            enemy_health -= hit;
            dealt += hit;
            if enemy_health <= 0 {
                let bounty = self.rng.int(BOUNTY_MIN, BOUNTY_MAX);
                player.gold += bounty;
                lines.push(format!(
                    "You slay the {name} dealing {dealt} damage and taking {taken}"
                ));
                lines.push(format!("You loot {bounty} gold coins"));
                return lines;
            }

            let damage = enemy_damage_taken(self.rng.int(ENEMY_HIT_MIN, ENEMY_HIT_MAX), armoured);
            player.health -= damage;
            taken += damage;
            if !player.is_alive() {
                player.health = STARTING_HEALTH;
                player.gold /= 2;
                player.position = ENTRY_POINT;
                lines.push(format!("The {name} has bested you"));
                lines.push(format!(
                    "You wake at {} with half your gold gone",
                    ENTRY_POINT
                ));
                return lines;
            }
        }

        lines.push(format!(
            "The {name} retreats into the shadows after dealing {taken} damage"
        ));
        lines
    }
}

impl EventDispatch for StandardDispatch {
    fn resolve(&mut self, player: &mut Player, town: &Town, event: &Event) -> Vec<String> {
        match event.event_type {
            EventType::Hotspot => self.deport(player, town),
            EventType::Npc => self.greet(town, &event.name),
            EventType::Enemy => self.skirmish(player, &event.name),
        }
    }
}
