//! Client-side status store for the FX autopilot console.
//!
//! Owns the authoritative snapshot of agent state, drives the fixed-cadence
//! poll, and serializes command submission so the presentation layer always
//! sees the most recent confirmed truth. Network access goes through the
//! [`StatusTransport`] seam so the store is testable with a scripted fake.

pub mod store;
pub mod transport;

pub use store::{StatusStore, StoreError, StorePhase, StoreView};
pub use transport::{RelayTransport, StatusTransport, TransportError};
