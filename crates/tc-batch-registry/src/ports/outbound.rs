//! # Driven Ports (SPI - Outbound)
//!
//! Dependencies the registry needs from its host. Event publication goes
//! through `shared_bus::EventPublisher`.

/// Source of logical time stamped onto new records.
///
/// Values are opaque to the registry: they are recorded, never compared.
pub trait TimeSource: Send + Sync {
    /// Current logical time (seconds since epoch for the system clock).
    fn now(&self) -> u64;
}
