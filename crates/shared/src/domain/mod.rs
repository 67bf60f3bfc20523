mod availability;
mod event;

pub use self::availability::{
    ProductAvailability, ProductAvailabilityRequest, ProductAvailabilityResponse,
};
pub use self::event::{
    ORDER_CANCELLED_TOPIC, ORDER_PLACED_TOPIC, OrderEvent, OrderEventItem, OrderEventType,
};
