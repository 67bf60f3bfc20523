mod command;
mod query;

pub use self::command::{InventoryAdjuster, InventoryAdjusterDeps};
pub use self::query::ProductQueryService;
