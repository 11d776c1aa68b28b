use std::ops::RangeInclusive;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::constants::{
    CONSUMABLE_COUNT, ENEMY_COUNT, HEIGHT, HOTSPOT_COUNT, ITEM_COUNT, MAX_FREE_CELL_ATTEMPTS,
    NPC_COUNT, TOWN_COUNT, WIDTH,
};
use crate::dungeon::DungeonGenerator;
use crate::error::GameError;
use crate::rng::Rng;
use crate::town::Town;
use crate::types::{Cardinal, EventType, TownId, WorldView};

/// Generation knobs. `Default` gives the standard game.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    pub width: i32,
    pub height: i32,
    pub generator: DungeonGenerator,
    pub town_count: RangeInclusive<i32>,
    pub item_count: RangeInclusive<i32>,
    pub consumable_count: RangeInclusive<i32>,
    pub hotspot_count: RangeInclusive<i32>,
    pub npc_count: RangeInclusive<i32>,
    pub enemy_count: RangeInclusive<i32>,
    pub max_free_cell_attempts: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            generator: DungeonGenerator::default(),
            town_count: TOWN_COUNT,
            item_count: ITEM_COUNT,
            consumable_count: CONSUMABLE_COUNT,
            hotspot_count: HOTSPOT_COUNT,
            npc_count: NPC_COUNT,
            enemy_count: ENEMY_COUNT,
            max_free_cell_attempts: MAX_FREE_CELL_ATTEMPTS,
        }
    }
}

/// All towns of one game. Built once; afterwards only town contents change.
#[derive(Debug)]
pub struct World {
    pub seed: u32,
    towns: Vec<Town>,
}

impl World {
    pub fn build(config: &WorldConfig, catalog: &Catalog, seed: u32) -> Result<Self, GameError> {
        let mut rng = Rng::new(seed);
        let mut name_pool = catalog.town_names.clone();
        let wanted = rng.in_range(&config.town_count).max(1) as usize;
        let count = wanted.min(name_pool.len().max(1));

        let mut towns: Vec<Town> = Vec::with_capacity(count);
        for id in 0..count {
            let name = if name_pool.is_empty() {
                "Unknown".to_string()
            } else {
                name_pool.remove(rng.pick_index(name_pool.len()))
            };
            let mut town_rng = rng.fork(id as u32);
            let town = Town::generate(id, &name, config, catalog, &mut town_rng)?;
            let (items, events) = {
                let contents = town.contents();
                (contents.items.len(), contents.events.len())
            };
            debug!(
                town = %town.name,
                walkable = town.grid().walkable_count(),
                items,
                events,
                "generated town"
            );
            towns.push(town);

            if id > 0 {
                link_to_earlier_town(&mut towns, id, &mut rng);
            }
        }

        info!(seed, towns = towns.len(), "world built");
        Ok(Self { seed, towns })
    }

    pub fn from_towns(seed: u32, towns: Vec<Town>) -> Self {
        Self { seed, towns }
    }

    pub fn towns(&self) -> &[Town] {
        &self.towns
    }

    pub fn town(&self, id: TownId) -> Option<&Town> {
        self.towns.get(id)
    }

    /// Whether a character event with this name exists in any town.
    pub fn has_character(&self, name: &str) -> bool {
        self.towns.iter().any(|town| {
            town.contents()
                .events
                .iter()
                .any(|event| event.event_type != EventType::Hotspot && event.name == name)
        })
    }

    pub fn town_names(&self) -> Vec<String> {
        self.towns.iter().map(|town| town.name.clone()).collect()
    }

    /// "You can go to X which is north" for every populated slot.
    pub fn routes(&self, id: TownId) -> Vec<String> {
        let Some(town) = self.town(id) else {
            return Vec::new();
        };
        town.links()
            .into_iter()
            .filter_map(|(direction, target)| {
                self.town(target).map(|target| {
                    format!(
                        "You can go to {} which is {}",
                        target.name,
                        direction.name()
                    )
                })
            })
            .collect()
    }

    pub fn to_view(&self) -> WorldView {
        let names = self.town_names();
        WorldView {
            seed: self.seed,
            towns: self.towns.iter().map(|town| town.to_view(&names)).collect(),
        }
    }
}

/// Picks a random earlier town with a free slot and joins the new town to it
/// through a pair of opposite slots.
fn link_to_earlier_town(towns: &mut [Town], new_id: TownId, rng: &mut Rng) {
    let mut candidates: Vec<(TownId, Cardinal)> = Vec::new();
    for prior in 0..new_id {
        for direction in Cardinal::ALL {
            if towns[prior].is_slot_free(direction)
                && towns[new_id].is_slot_free(direction.opposite())
            {
                candidates.push((prior, direction));
            }
        }
    }
    let Some(&(prior, direction)) = rng.pick(&candidates) else {
        return;
    };
    towns[prior].set_adjacent(direction, new_id);
    towns[new_id].set_adjacent(direction.opposite(), prior);
}

/// Once-only holder for the process-wide world. Concurrent first callers race
/// on one initialisation; everyone receives the same `Arc`.
#[derive(Debug, Default)]
pub struct SharedWorld {
    cell: OnceLock<Arc<World>>,
}

impl SharedWorld {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    pub fn get_or_build<F>(&self, build: F) -> Arc<World>
    where
        F: FnOnce() -> World,
    {
        Arc::clone(self.cell.get_or_init(|| Arc::new(build())))
    }

    pub fn get(&self) -> Option<Arc<World>> {
        self.cell.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    use crate::catalog::Catalog;
    use crate::grid::Grid;
    use crate::town::Town;
    use crate::types::Cardinal;

    use super::{SharedWorld, World, WorldConfig};

    fn build(seed: u32) -> World {
        World::build(&WorldConfig::default(), &Catalog::default(), seed).expect("world builds")
    }

    #[test]
    fn town_count_and_names_respect_bounds() {
        for seed in 0..100u32 {
            let world = build(seed);
            let count = world.towns().len();
            assert!((2..=6).contains(&count), "seed={seed} count={count}");
            let names: HashSet<String> = world.town_names().into_iter().collect();
            assert_eq!(names.len(), count, "names must be unique");
        }
    }

    #[test]
    fn same_seed_builds_same_world() {
        let a = build(2024);
        let b = build(2024);
        assert_eq!(a.town_names(), b.town_names());
        for (ta, tb) in a.towns().iter().zip(b.towns()) {
            assert_eq!(ta.grid(), tb.grid());
            assert_eq!(*ta.contents(), *tb.contents());
            assert_eq!(ta.links(), tb.links());
        }
    }

    #[test]
    fn adjacency_forms_a_tree_with_mirrored_slots() {
        for seed in 0..200u32 {
            let world = build(seed);
            let towns = world.towns();
            let mut edges = 0;
            for town in towns {
                for (direction, target) in town.links() {
                    edges += 1;
                    let back = world.town(target).expect("linked town exists");
                    assert_eq!(back.adjacent(direction.opposite()), Some(town.id));
                }
            }
            assert_eq!(edges, 2 * (towns.len() - 1), "seed={seed}");

            let mut seen = HashSet::new();
            let mut queue = VecDeque::from([0usize]);
            seen.insert(0usize);
            while let Some(id) = queue.pop_front() {
                for (_, next) in world.town(id).expect("town").links() {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
            assert_eq!(seen.len(), towns.len(), "seed={seed} graph is disconnected");
        }
    }

    #[test]
    fn town_count_is_capped_by_name_pool() {
        let mut catalog = Catalog::default();
        catalog.town_names = vec!["Solo".to_string()];
        let config = WorldConfig {
            town_count: 4..=4,
            ..WorldConfig::default()
        };
        let world = World::build(&config, &catalog, 1).expect("world builds");
        assert_eq!(world.town_names(), vec!["Solo"]);
        assert!(world.routes(0).is_empty());
    }

    #[test]
    fn routes_describe_each_link() {
        let mut north = Town::new(0, "Northwick", "", Grid::default());
        let mut south = Town::new(1, "Southby", "", Grid::default());
        north.set_adjacent(Cardinal::South, 1);
        south.set_adjacent(Cardinal::North, 0);
        let world = World::from_towns(0, vec![north, south]);
        assert_eq!(
            world.routes(0),
            vec!["You can go to Southby which is south".to_string()]
        );
        assert_eq!(
            world.routes(1),
            vec!["You can go to Northwick which is north".to_string()]
        );
        assert!(world.routes(7).is_empty());
    }

    #[test]
    fn world_view_serializes_every_town() {
        let world = build(9);
        let view = world.to_view();
        assert_eq!(view.towns.len(), world.towns().len());
        let json = serde_json::to_value(&view).expect("serializes");
        assert_eq!(json["seed"], 9);
        assert!(json["towns"][0]["tiles"].is_array());
    }

    #[test]
    fn shared_world_builds_once_under_concurrent_first_access() {
        let shared = Arc::new(SharedWorld::new());
        let builds = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = Arc::clone(&shared);
                let builds = Arc::clone(&builds);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    shared.get_or_build(|| {
                        builds.fetch_add(1, Ordering::SeqCst);
                        build(77)
                    })
                })
            })
            .collect();

        let worlds: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect();
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        for world in &worlds {
            assert!(Arc::ptr_eq(world, &worlds[0]));
        }
        assert!(shared.get().is_some());
    }
}
