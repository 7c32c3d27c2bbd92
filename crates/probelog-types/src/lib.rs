//! Shared data model for probelog sensor telemetry.
//!
//! This crate defines the types that cross crate boundaries: the
//! [`Reading`] record that the log store persists and the
//! [`SensorPayload`] object that travels over the wire. It does no I/O.

mod payload;
mod reading;

pub use payload::{PayloadEntry, SensorPayload};
pub use reading::Reading;
