mod dispatcher;

pub use self::dispatcher::{DispatcherConfig, DrainResult, OutboxDispatcher, backoff_delay};
