use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::catalog::Catalog;
use crate::constants::ware_price;
use crate::error::GameError;
use crate::grid::Grid;
use crate::rng::Rng;
use crate::types::{
    AdjacentView, Cardinal, Cell, Event, EventType, Item, ItemType, TownId, TownView,
};
use crate::world::WorldConfig;

/// Items and events of a town. Everything a player can change lives here,
/// behind the town's lock.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TownContents {
    pub items: Vec<Item>,
    pub events: Vec<Event>,
}

#[derive(Debug)]
pub struct Town {
    pub id: TownId,
    pub name: String,
    pub description: String,
    grid: Grid,
    adjacent: [Option<TownId>; 4],
    contents: Mutex<TownContents>,
}

impl Town {
    pub fn new(
        id: TownId,
        name: impl Into<String>,
        description: impl Into<String>,
        grid: Grid,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            grid,
            adjacent: [None; 4],
            contents: Mutex::new(TownContents::default()),
        }
    }

    /// Carves the grid and scatters catalog items and events over free cells.
    pub fn generate(
        id: TownId,
        name: &str,
        config: &WorldConfig,
        catalog: &Catalog,
        rng: &mut Rng,
    ) -> Result<Self, GameError> {
        let template_idx = rng.pick_index(catalog.town_descriptions.len());
        let description = catalog.describe_town(template_idx, name);
        let grid = config.generator.generate(config.width, config.height, rng);

        let mut contents = TownContents::default();

        let item_count = rng.in_range(&config.item_count).max(0) as usize;
        for item_name in catalog.item_names.iter().take(item_count) {
            let cell = find_free_cell(&grid, rng, config.max_free_cell_attempts)?;
            contents
                .items
                .push(Item::new(item_name.clone(), cell, ItemType::classify(item_name)));
        }

        let consumable_count = rng.in_range(&config.consumable_count).max(0) as usize;
        for idx in 0..consumable_count {
            let Some(food) = catalog
                .consumable_names
                .get(idx % catalog.consumable_names.len().max(1))
            else {
                break;
            };
            let cell = find_free_cell(&grid, rng, config.max_free_cell_attempts)?;
            contents
                .items
                .push(Item::new(food.clone(), cell, ItemType::Consumable));
        }

        for _ in 0..rng.in_range(&config.hotspot_count) {
            let cell = find_free_cell(&grid, rng, config.max_free_cell_attempts)?;
            contents
                .events
                .push(Event::new(cell, EventType::Hotspot, "hotspot"));
        }

        for _ in 0..rng.in_range(&config.npc_count) {
            let Some(npc) = rng.pick(&catalog.npc_names).cloned() else {
                break;
            };
            let cell = find_free_cell(&grid, rng, config.max_free_cell_attempts)?;
            contents.events.push(Event::new(cell, EventType::Npc, npc));
        }

        for _ in 0..rng.in_range(&config.enemy_count) {
            let Some(enemy) = rng.pick(&catalog.enemy_names).cloned() else {
                break;
            };
            let cell = find_free_cell(&grid, rng, config.max_free_cell_attempts)?;
            contents.events.push(Event::new(cell, EventType::Enemy, enemy));
        }

        Ok(Self::new(id, name, description, grid).with_contents(contents))
    }

    pub fn with_contents(mut self, contents: TownContents) -> Self {
        self.contents = Mutex::new(contents);
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn adjacent(&self, direction: Cardinal) -> Option<TownId> {
        self.adjacent[direction.slot()]
    }

    pub fn is_slot_free(&self, direction: Cardinal) -> bool {
        self.adjacent[direction.slot()].is_none()
    }

    pub(crate) fn set_adjacent(&mut self, direction: Cardinal, town: TownId) {
        self.adjacent[direction.slot()] = Some(town);
    }

    pub fn links(&self) -> Vec<(Cardinal, TownId)> {
        Cardinal::ALL
            .into_iter()
            .filter_map(|dir| self.adjacent(dir).map(|id| (dir, id)))
            .collect()
    }

    /// Lock poisoning is recovered: the guarded lists are always consistent
    /// between statements.
    pub fn contents(&self) -> MutexGuard<'_, TownContents> {
        self.contents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes the named item if it lies at `at`. Lookup and removal share one
    /// critical section, so concurrent pickups grant the item once.
    pub fn take_item(&self, name: &str, at: Cell) -> Result<Item, GameError> {
        let mut contents = self.contents();
        if !contents.items.iter().any(|item| item.description == name) {
            return Err(GameError::ItemNotFound(name.to_string()));
        }
        let Some(idx) = contents
            .items
            .iter()
            .position(|item| item.description == name && item.coordinates == at)
        else {
            return Err(GameError::NotAtItemLocation(name.to_string()));
        };
        if contents.items[idx].item_type == ItemType::EventMarker {
            return Err(GameError::CannotPickUp);
        }
        Ok(contents.items.remove(idx))
    }

    pub fn put_item(&self, item: Item) {
        self.contents().items.push(item);
    }

    /// First event at `at`. Single-use events are removed in the same critical
    /// section that finds them.
    pub fn claim_event_at(&self, at: Cell) -> Option<Event> {
        let mut contents = self.contents();
        let idx = contents
            .events
            .iter()
            .position(|event| event.coordinates == at)?;
        if contents.events[idx].event_type.is_single_use() {
            return Some(contents.events.remove(idx));
        }
        Some(contents.events[idx].clone())
    }

    /// Name of the first NPC standing on `at`.
    pub fn merchant_at(&self, at: Cell) -> Option<String> {
        self.contents()
            .events
            .iter()
            .find(|event| event.coordinates == at && event.event_type == EventType::Npc)
            .map(|event| event.name.clone())
    }

    /// Hands the named ware to a buyer holding `budget` gold. Lookup, price
    /// check and removal share one critical section.
    pub fn sell_ware(&self, name: &str, budget: i32) -> Result<(Item, i32), GameError> {
        let mut contents = self.contents();
        let Some(idx) = contents
            .items
            .iter()
            .position(|item| item.description == name && item.item_type != ItemType::EventMarker)
        else {
            return Err(GameError::NotForSale(name.to_string()));
        };
        let price = ware_price(contents.items[idx].item_type);
        if price > budget {
            return Err(GameError::InsufficientFunds { price });
        }
        Ok((contents.items.remove(idx), price))
    }

    /// Coordinates of the first item with this description, else of the first
    /// event with this name.
    pub fn find_target(&self, name: &str) -> Option<Cell> {
        let contents = self.contents();
        contents
            .items
            .iter()
            .find(|item| item.description == name)
            .map(|item| item.coordinates)
            .or_else(|| {
                contents
                    .events
                    .iter()
                    .find(|event| event.name == name)
                    .map(|event| event.coordinates)
            })
    }

    pub fn items_within(&self, center: Cell, distance: i32) -> Vec<Item> {
        self.contents()
            .items
            .iter()
            .filter(|item| item.coordinates.chebyshev(center) <= distance)
            .cloned()
            .collect()
    }

    pub fn to_view(&self, names: &[String]) -> TownView {
        let contents = self.contents().clone();
        TownView {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            width: self.grid.width(),
            height: self.grid.height(),
            tiles: self.grid.to_rows(),
            walkable_cells: self.grid.walkable_count(),
            items: contents.items,
            events: contents.events,
            adjacent: self
                .links()
                .into_iter()
                .map(|(direction, town_id)| AdjacentView {
                    direction,
                    town_id,
                    name: names.get(town_id).cloned().unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Rejection-samples random coordinates until one is walkable.
pub fn find_free_cell(grid: &Grid, rng: &mut Rng, max_attempts: usize) -> Result<Cell, GameError> {
    for _ in 0..max_attempts {
        let cell = Cell::new(rng.below(grid.width()), rng.below(grid.height()));
        if grid.is_walkable(cell) {
            return Ok(cell);
        }
    }
    Err(GameError::NoFreeCellAvailable {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use crate::catalog::Catalog;
    use crate::error::GameError;
    use crate::grid::Grid;
    use crate::rng::Rng;
    use crate::types::{Cell, Event, EventType, Item, ItemType};
    use crate::world::WorldConfig;

    use super::{find_free_cell, Town, TownContents};

    fn corridor_town() -> Town {
        let grid = Grid::from_rows(&["......", "......"]);
        Town::new(0, "Testville", "A test town.", grid).with_contents(TownContents {
            items: vec![
                Item::new("sword", Cell::new(1, 0), ItemType::Weapon),
                Item::new("marker", Cell::new(2, 0), ItemType::EventMarker),
            ],
            events: vec![
                Event::new(Cell::new(3, 1), EventType::Hotspot, "hotspot"),
                Event::new(Cell::new(4, 1), EventType::Npc, "Aldric"),
            ],
        })
    }

    #[test]
    fn generated_town_places_content_on_walkable_cells() {
        let config = WorldConfig::default();
        let catalog = Catalog::default();
        for seed in 0..40u32 {
            let town = Town::generate(0, "Ashford", &config, &catalog, &mut Rng::new(seed))
                .expect("town generates");
            let contents = town.contents();
            assert!(!contents.items.is_empty());
            assert!(!contents.events.is_empty());
            for item in &contents.items {
                assert!(town.grid().is_walkable(item.coordinates), "seed={seed}");
            }
            for event in &contents.events {
                assert!(town.grid().is_walkable(event.coordinates), "seed={seed}");
            }
            assert!(town.description.contains("Ashford"));
        }
    }

    #[test]
    fn generated_items_are_classified_by_name() {
        let config = WorldConfig::default();
        let town = Town::generate(0, "Ashford", &config, &Catalog::default(), &mut Rng::new(3))
            .expect("town generates");
        for item in &town.contents().items {
            match item.item_type {
                ItemType::Consumable => {}
                other => assert_eq!(other, ItemType::classify(&item.description)),
            }
        }
    }

    #[test]
    fn free_cell_search_gives_up_on_solid_grid() {
        let grid = Grid::new(5, 5);
        let result = find_free_cell(&grid, &mut Rng::new(1), 50);
        assert_eq!(result, Err(GameError::NoFreeCellAvailable { attempts: 50 }));
    }

    #[test]
    fn free_cell_search_finds_the_only_open_cell() {
        let grid = Grid::from_rows(&["###", "#.#", "###"]);
        let cell = find_free_cell(&grid, &mut Rng::new(8), 10_000).expect("cell");
        assert_eq!(cell, Cell::new(1, 1));
    }

    #[test]
    fn take_item_requires_standing_on_it() {
        let town = corridor_town();
        assert_eq!(
            town.take_item("sword", Cell::new(0, 0)),
            Err(GameError::NotAtItemLocation("sword".into()))
        );
        assert_eq!(
            town.take_item("shield", Cell::new(1, 0)),
            Err(GameError::ItemNotFound("shield".into()))
        );
        assert_eq!(
            town.take_item("marker", Cell::new(2, 0)),
            Err(GameError::CannotPickUp)
        );
        let sword = town.take_item("sword", Cell::new(1, 0)).expect("picked up");
        assert_eq!(sword.item_type, ItemType::Weapon);
        assert!(town.find_target("sword").is_none());
    }

    #[test]
    fn concurrent_pickups_grant_the_item_once() {
        for _ in 0..20 {
            let town = Arc::new(corridor_town());
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let town = Arc::clone(&town);
                    thread::spawn(move || town.take_item("sword", Cell::new(1, 0)).is_ok())
                })
                .collect();
            let granted = handles
                .into_iter()
                .map(|handle| handle.join().expect("thread"))
                .filter(|ok| *ok)
                .count();
            assert_eq!(granted, 1);
        }
    }

    #[test]
    fn hotspots_are_claimed_once_but_npcs_stay() {
        let town = corridor_town();
        let first = town.claim_event_at(Cell::new(3, 1)).expect("hotspot");
        assert_eq!(first.event_type, EventType::Hotspot);
        assert!(town.claim_event_at(Cell::new(3, 1)).is_none());

        assert!(town.claim_event_at(Cell::new(4, 1)).is_some());
        assert!(town.claim_event_at(Cell::new(4, 1)).is_some());
        assert_eq!(town.contents().events.len(), 1);
    }

    #[test]
    fn concurrent_arrivals_trigger_a_hotspot_once() {
        for _ in 0..20 {
            let town = Arc::new(corridor_town());
            let barrier = Arc::new(Barrier::new(8));
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let town = Arc::clone(&town);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        town.claim_event_at(Cell::new(3, 1))
                    })
                })
                .collect();
            let claimed: Vec<Event> = handles
                .into_iter()
                .filter_map(|handle| handle.join().expect("thread"))
                .collect();
            assert_eq!(claimed.len(), 1);
            assert_eq!(claimed[0].event_type, EventType::Hotspot);
        }
    }

    #[test]
    fn only_the_first_event_on_a_cell_is_claimed() {
        let town = Town::new(0, "Crowded", "", Grid::from_rows(&["..."])).with_contents(
            TownContents {
                items: Vec::new(),
                events: vec![
                    Event::new(Cell::new(1, 0), EventType::Hotspot, "hotspot"),
                    Event::new(Cell::new(1, 0), EventType::Enemy, "goblin"),
                ],
            },
        );
        let first = town.claim_event_at(Cell::new(1, 0)).expect("first");
        assert_eq!(first.event_type, EventType::Hotspot);
        assert_eq!(town.contents().events.len(), 1);

        let second = town.claim_event_at(Cell::new(1, 0)).expect("second");
        assert_eq!(second.name, "goblin");
        assert_eq!(town.contents().events.len(), 1);
    }

    #[test]
    fn merchants_sell_wares_within_budget() {
        let town = corridor_town();
        assert_eq!(town.merchant_at(Cell::new(4, 1)), Some("Aldric".to_string()));
        assert_eq!(town.merchant_at(Cell::new(3, 1)), None);

        assert_eq!(
            town.sell_ware("sword", 7),
            Err(GameError::InsufficientFunds { price: 8 })
        );
        assert_eq!(
            town.sell_ware("marker", 100),
            Err(GameError::NotForSale("marker".into()))
        );
        let (sword, price) = town.sell_ware("sword", 8).expect("sold");
        assert_eq!((sword.description.as_str(), price), ("sword", 8));
        assert_eq!(
            town.sell_ware("sword", 100),
            Err(GameError::NotForSale("sword".into()))
        );
    }

    #[test]
    fn find_target_prefers_items_then_events() {
        let town = corridor_town();
        assert_eq!(town.find_target("sword"), Some(Cell::new(1, 0)));
        assert_eq!(town.find_target("Aldric"), Some(Cell::new(4, 1)));
        assert_eq!(town.find_target("nobody"), None);
    }

    #[test]
    fn items_within_uses_square_radius() {
        let town = corridor_town();
        let near = town.items_within(Cell::new(0, 1), 1);
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].description, "sword");
        assert_eq!(town.items_within(Cell::new(0, 1), 2).len(), 2);
    }
}
