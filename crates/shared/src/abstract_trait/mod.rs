mod kafka;

pub use self::kafka::{DynKafka, KafkaTrait};
