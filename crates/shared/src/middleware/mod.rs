mod validate;

pub use self::validate::{ValidatedJson, describe};
