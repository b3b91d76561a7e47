//! Event infrastructure shared by the companion components.
//!
//! - [`EventBus`]: synchronous publish/subscribe with isolated handlers and
//!   an optional bounded diagnostic buffer.
//! - [`Event`]: the record kept by the diagnostic buffer.
//! - Well-known event names published by the personality pipeline.

pub mod event;
pub mod event_bus;

pub use event::{Event, EMOTION_DETECTED, PERSONALITY_UPDATED};
pub use event_bus::{
    EventBus, EventHandler, Subscription, SubscriptionId, DEFAULT_DIAGNOSTIC_CAPACITY,
};
