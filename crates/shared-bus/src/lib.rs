//! # Shared Bus - Registry Notification Stream
//!
//! Carries one structured event per committed registry mutation to external
//! indexers and UIs. This is the only channel by which consumers learn of
//! state changes without polling.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────────┐                    ┌──────────────┐
//! │ RegistryService  │                    │  Indexer/UI  │
//! │  (after commit)  │    publish()       │              │
//! │                  │ ──────┐            │              │
//! └──────────────────┘       │            └──────────────┘
//!                            ▼                    ↑
//!                      ┌──────────────┐          │
//!                      │  Event Bus   │ ─────────┘
//!                      └──────────────┘  subscribe()
//! ```
//!
//! ## Ordering
//!
//! - Events are published only after the state change is committed.
//! - Every event carries the commit `sequence`; sequences increase by one per
//!   committed mutation, so a subscriber can detect gaps after lagging.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, RegistryEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
