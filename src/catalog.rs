use std::fs;
use std::path::Path;

use crate::error::CatalogError;

const TOWNS_FILE: &str = "towns.txt";
const DESCRIPTIONS_FILE: &str = "townDescription.txt";
const ITEMS_FILE: &str = "items.txt";
const FOOD_FILE: &str = "food.txt";
const NPC_FILE: &str = "npcNames.txt";
const ENEMY_FILE: &str = "enemies.txt";

const DEFAULT_TOWNS: &[&str] = &[
    "Ashford",
    "Brackenmoor",
    "Cinderfall",
    "Duskmere",
    "Eldergrove",
    "Frostholm",
    "Gloomwater",
    "Hollowdeep",
];

const DEFAULT_DESCRIPTIONS: &[&str] = &[
    "You arrive in {}, a town of narrow tunnels and damp stone.",
    "{} sprawls beneath a collapsed mine, its corridors lit by lanterns.",
    "The wind howls through the passages of {}.",
    "Merchants and monsters alike wander the halls of {}.",
];

const DEFAULT_ITEMS: &[&str] = &[
    "rusty-sword",
    "leather-armour",
    "iron-spear",
    "lantern",
    "rope",
    "chainmail-armour",
    "broadsword",
    "compass",
    "map-fragment",
    "torch",
    "hunting-spear",
    "silver-key",
    "plate-armour",
    "bedroll",
    "whetstone",
    "tinderbox",
    "short-sword",
    "flask",
    "lockpick",
    "old-coin",
];

const DEFAULT_FOOD: &[&str] = &[
    "bread",
    "apple",
    "cheese",
    "dried-meat",
    "mushroom",
    "honey-cake",
];

const DEFAULT_NPCS: &[&str] = &[
    "Aldric",
    "Brenna",
    "Corwin",
    "Dagna",
    "Edmund",
    "Fiona",
    "Gareth",
    "Hilda",
    "Ivor",
    "Jorunn",
];

const DEFAULT_ENEMIES: &[&str] = &[
    "goblin",
    "cave-troll",
    "giant-rat",
    "skeleton",
    "bandit",
    "wraith",
];

/// Flavour lists consumed by world generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    pub town_names: Vec<String>,
    pub town_descriptions: Vec<String>,
    pub item_names: Vec<String>,
    pub consumable_names: Vec<String>,
    pub npc_names: Vec<String>,
    pub enemy_names: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            town_names: owned(DEFAULT_TOWNS),
            town_descriptions: owned(DEFAULT_DESCRIPTIONS),
            item_names: owned(DEFAULT_ITEMS),
            consumable_names: owned(DEFAULT_FOOD),
            npc_names: owned(DEFAULT_NPCS),
            enemy_names: owned(DEFAULT_ENEMIES),
        }
    }
}

impl Catalog {
    /// Loads every list from newline-separated files in `dir`. Blank lines are
    /// skipped; a missing or empty file is an error.
    pub fn load_dir(dir: &Path) -> Result<Self, CatalogError> {
        let catalog = Self {
            town_names: read_list(dir, TOWNS_FILE)?,
            town_descriptions: read_list(dir, DESCRIPTIONS_FILE)?,
            item_names: read_list(dir, ITEMS_FILE)?,
            consumable_names: read_list(dir, FOOD_FILE)?,
            npc_names: read_list(dir, NPC_FILE)?,
            enemy_names: read_list(dir, ENEMY_FILE)?,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let lists: [(&'static str, &Vec<String>); 6] = [
            (TOWNS_FILE, &self.town_names),
            (DESCRIPTIONS_FILE, &self.town_descriptions),
            (ITEMS_FILE, &self.item_names),
            (FOOD_FILE, &self.consumable_names),
            (NPC_FILE, &self.npc_names),
            (ENEMY_FILE, &self.enemy_names),
        ];
        for (name, list) in lists {
            if list.is_empty() {
                return Err(CatalogError::Empty(name));
            }
        }
        Ok(())
    }

    pub fn describe_town(&self, template_idx: usize, name: &str) -> String {
        self.town_descriptions
            .get(template_idx)
            .map(|template| template.replace("{}", name))
            .unwrap_or_else(|| format!("You arrive in {name}."))
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn read_list(dir: &Path, file: &'static str) -> Result<Vec<String>, CatalogError> {
    let path = dir.join(file);
    let raw = fs::read_to_string(&path).map_err(|source| CatalogError::Read {
        path: path.clone(),
        source,
    })?;
    let list: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if list.is_empty() {
        return Err(CatalogError::Empty(file));
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::error::CatalogError;

    use super::Catalog;

    fn write_all(dir: &std::path::Path) {
        fs::write(dir.join("towns.txt"), "Oakvale\n\nRiverend\n").expect("write towns");
        fs::write(dir.join("townDescription.txt"), "Welcome to {}!\n").expect("write desc");
        fs::write(dir.join("items.txt"), "long-sword\nrope\r\n").expect("write items");
        fs::write(dir.join("food.txt"), "bread\n").expect("write food");
        fs::write(dir.join("npcNames.txt"), "Tom\n").expect("write npcs");
        fs::write(dir.join("enemies.txt"), "ogre\n").expect("write enemies");
    }

    #[test]
    fn default_catalog_is_valid() {
        assert!(Catalog::default().validate().is_ok());
    }

    #[test]
    fn load_dir_reads_trimmed_non_empty_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_all(dir.path());
        let catalog = Catalog::load_dir(dir.path()).expect("catalog loads");
        assert_eq!(catalog.town_names, vec!["Oakvale", "Riverend"]);
        assert_eq!(catalog.item_names, vec!["long-sword", "rope"]);
        assert_eq!(catalog.describe_town(0, "Oakvale"), "Welcome to Oakvale!");
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_all(dir.path());
        fs::remove_file(dir.path().join("enemies.txt")).expect("remove");
        match Catalog::load_dir(dir.path()) {
            Err(CatalogError::Read { path, .. }) => assert!(path.ends_with("enemies.txt")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn blank_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_all(dir.path());
        fs::write(dir.path().join("food.txt"), "\n  \n").expect("write food");
        assert!(matches!(
            Catalog::load_dir(dir.path()),
            Err(CatalogError::Empty("food.txt"))
        ));
    }

    #[test]
    fn out_of_range_template_falls_back() {
        let catalog = Catalog::default();
        assert_eq!(catalog.describe_town(999, "Nowhere"), "You arrive in Nowhere.");
    }
}
