mod product;

pub use self::product::{DynProductClient, ProductClientTrait};
