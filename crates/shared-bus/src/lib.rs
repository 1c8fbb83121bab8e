//! # Shared Bus - Event Bus for Directory-Service Subsystems
//!
//! In-process publish/subscribe bus carrying [`DsEvent`]s between the DS
//! subsystems (choreography, no direct calls).
//!
//! ```text
//! ┌──────────────────┐                    ┌───────────────────────┐
//! │ Microblock (18)  │    publish()       │ Final block consensus │
//! │                  │ ──────┐            │                       │
//! └──────────────────┘       │            └───────────────────────┘
//!                            ▼                        ↑
//!                      ┌──────────────┐               │
//!                      │  Event Bus   │ ──────────────┘
//!                      └──────────────┘  subscribe()
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{DsEvent, EventFilter, EventTopic, DS_MICROBLOCK_SUBSYSTEM_ID};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::Subscription;

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
