//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Port (Inbound)**: `ProvenanceRegistryApi`
//! - **Driven Port (Outbound)**: `TimeSource`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
