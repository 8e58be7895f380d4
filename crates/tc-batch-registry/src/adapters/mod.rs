//! # Adapters Layer (Outer Hexagon)
//!
//! - `SystemTimeSource` / `ManualTimeSource`: implementations of `TimeSource`
//! - `ApiGatewayHandler`: JSON query surface for admin tooling

pub mod api_handler;
pub mod clock;

pub use api_handler::{handle_api_query, ApiGatewayHandler, ApiQueryError, RegistryMetrics};
pub use clock::{ManualTimeSource, SystemTimeSource};
