pub mod order;
pub mod outbox;
