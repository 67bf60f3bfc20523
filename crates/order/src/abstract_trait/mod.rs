pub mod http_client;
pub mod order;
pub mod outbox;
