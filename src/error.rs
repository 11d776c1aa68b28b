use std::path::PathBuf;

use thiserror::Error;

/// Player-facing failures. None of these touch shared state; the `Display`
/// text is what the session writes back to the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid command")]
    InvalidCommand,
    #[error("{0} is not within this town")]
    ItemNotFound(String),
    #[error("Nobody called {0} is around here")]
    EventTargetNotFound(String),
    #[error("{0} is not within your inventory")]
    NotInInventory(String),
    #[error("Cannot locate a path there")]
    PathNotFound,
    #[error("No town that way")]
    NoRouteThatWay,
    #[error("You are not at the location of the {0}")]
    NotAtItemLocation(String),
    #[error("Cannot pickup an events object - investigate it pronto")]
    CannotPickUp,
    #[error("{0} cannot be equipped")]
    CannotEquip(String),
    #[error("{0} is not equipped")]
    NotEquipped(String),
    #[error("You have chosen to combine the same item")]
    SameItemTwice,
    #[error("There is nobody here to trade with")]
    NoMerchantHere,
    #[error("Sorry I do not sell {0}")]
    NotForSale(String),
    #[error("You possess insufficient funds to purchase from the vendor")]
    InsufficientFunds { price: i32 },
    #[error("town {0} does not exist")]
    UnknownTown(usize),
    #[error("no free cell found after {attempts} attempts")]
    NoFreeCellAvailable { attempts: usize },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog list `{0}` is empty")]
    Empty(&'static str),
}
