mod command;
mod query;

pub use self::command::{DynInventoryAdjuster, InventoryAdjusterTrait};
pub use self::query::{DynProductQueryService, ProductQueryServiceTrait};
