use crate::constants::{ware_price, ENTRY_POINT, STARTING_GOLD, STARTING_HEALTH};
use crate::error::GameError;
use crate::town::Town;
use crate::types::{Cell, Item, ItemType, TownId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub position: Cell,
    pub town: TownId,
    pub inventory: Vec<Item>,
    pub health: i32,
    pub gold: i32,
    equipped_weapon: Option<usize>,
    equipped_armour: Option<usize>,
}

impl Player {
    pub fn new(name: impl Into<String>, town: TownId) -> Self {
        Self::at(name, town, ENTRY_POINT)
    }

    pub fn at(name: impl Into<String>, town: TownId, position: Cell) -> Self {
        Self {
            name: name.into(),
            position,
            town,
            inventory: Vec::new(),
            health: STARTING_HEALTH,
            gold: STARTING_GOLD,
            equipped_weapon: None,
            equipped_armour: None,
        }
    }

    pub fn weapon(&self) -> Option<&Item> {
        self.equipped_weapon.and_then(|idx| self.inventory.get(idx))
    }

    pub fn armour(&self) -> Option<&Item> {
        self.equipped_armour.and_then(|idx| self.inventory.get(idx))
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    fn inventory_index(&self, name: &str) -> Result<usize, GameError> {
        self.inventory
            .iter()
            .position(|item| item.description == name)
            .ok_or_else(|| GameError::NotInInventory(name.to_string()))
    }

    /// Removes an inventory slot, keeping equipment pointing at the same items.
    fn remove_at(&mut self, idx: usize) -> Item {
        for slot in [&mut self.equipped_weapon, &mut self.equipped_armour] {
            *slot = match *slot {
                Some(current) if current == idx => None,
                Some(current) if current > idx => Some(current - 1),
                other => other,
            };
        }
        self.inventory.remove(idx)
    }

    pub fn pickup(&mut self, town: &Town, name: &str) -> Result<String, GameError> {
        let item = town.take_item(name, self.position)?;
        let message = format!("Picked up {}", item.description);
        self.inventory.push(item);
        Ok(message)
    }

    /// Drops the item on the player's cell in `town`.
    pub fn drop_item(&mut self, town: &Town, name: &str) -> Result<String, GameError> {
        let idx = self.inventory_index(name)?;
        let mut item = self.remove_at(idx);
        item.coordinates = self.position;
        let message = format!("Dropped {}", item.description);
        town.put_item(item);
        Ok(message)
    }

    pub fn equip(&mut self, name: &str) -> Result<String, GameError> {
        let idx = self.inventory_index(name)?;
        match self.inventory[idx].item_type {
            ItemType::Weapon => {
                self.equipped_weapon = Some(idx);
                Ok(format!("Equipped {name} as weapon"))
            }
            ItemType::Armour => {
                self.equipped_armour = Some(idx);
                Ok(format!("Equipped {name} as armour"))
            }
            _ => Err(GameError::CannotEquip(name.to_string())),
        }
    }

    pub fn unequip(&mut self, name: &str) -> Result<String, GameError> {
        let idx = self.inventory_index(name)?;
        let (slot, label) = match self.inventory[idx].item_type {
            ItemType::Weapon => (&mut self.equipped_weapon, "weapon"),
            ItemType::Armour => (&mut self.equipped_armour, "armour"),
            _ => return Err(GameError::CannotEquip(name.to_string())),
        };
        if *slot != Some(idx) {
            return Err(GameError::NotEquipped(name.to_string()));
        }
        *slot = None;
        Ok(format!("Unequipped {name} as {label}"))
    }

    /// Merges two distinct inventory items into one generic item.
    pub fn combine(&mut self, first: &str, second: &str) -> Result<String, GameError> {
        if first == second {
            return Err(GameError::SameItemTwice);
        }
        let first_idx = self.inventory_index(first)?;
        let second_idx = self.inventory_index(second)?;
        let coordinates = self.inventory[first_idx].coordinates;
        let combined = Item::new(format!("{first}{second}"), coordinates, ItemType::Generic);

        let (high, low) = if first_idx > second_idx {
            (first_idx, second_idx)
        } else {
            (second_idx, first_idx)
        };
        self.remove_at(high);
        self.remove_at(low);

        let message = format!(
            "Combined {first} and {second} to create a {}",
            combined.description
        );
        self.inventory.push(combined);
        Ok(message)
    }

    /// Buys a ware from the NPC on the player's cell.
    pub fn buy(&mut self, town: &Town, name: &str) -> Result<String, GameError> {
        let merchant = town
            .merchant_at(self.position)
            .ok_or(GameError::NoMerchantHere)?;
        let (item, price) = town.sell_ware(name, self.gold)?;
        self.gold -= price;
        self.inventory.push(item);
        Ok(format!("Purchased {name} from {merchant} for {price} gold"))
    }

    /// Sells an inventory item to the NPC on the player's cell. The item
    /// joins the town's wares at that cell.
    pub fn sell(&mut self, town: &Town, name: &str) -> Result<String, GameError> {
        let merchant = town
            .merchant_at(self.position)
            .ok_or(GameError::NoMerchantHere)?;
        let idx = self.inventory_index(name)?;
        let mut item = self.remove_at(idx);
        let price = ware_price(item.item_type);
        item.coordinates = self.position;
        self.gold += price;
        town.put_item(item);
        Ok(format!("Sold {name} to {merchant} for {price} gold"))
    }

    pub fn scan(&self, town: &Town, distance: i32) -> Vec<String> {
        let mut lines: Vec<String> = town
            .items_within(self.position, distance)
            .into_iter()
            .map(|item| format!("Found: {} at {}", item.description, item.coordinates))
            .collect();
        lines.push("Scan finished".to_string());
        lines
    }

    pub fn stats(&self, town_name: &str) -> Vec<String> {
        let inventory: Vec<&str> = self
            .inventory
            .iter()
            .map(|item| item.description.as_str())
            .collect();
        vec![
            format!("Name: {}", self.name),
            format!("Town: {town_name}"),
            format!("Position: {}", self.position),
            format!("Health: {}", self.health),
            format!("Gold coins: {}", self.gold),
            format!(
                "Armour: {}",
                self.armour()
                    .map(|item| item.description.as_str())
                    .unwrap_or("Not Equipped")
            ),
            format!(
                "Weapon: {}",
                self.weapon()
                    .map(|item| item.description.as_str())
                    .unwrap_or("Not Equipped")
            ),
            format!("Inventory contents: {}", inventory.join(" ")),
        ]
    }
}
