//! Simulated environmental sensors.
//!
//! Each [`SimulatedSensor`] generates plausible values for one quantity
//! (temperature, humidity, pressure, light) on demand, with a per-sensor
//! cadence: reads inside the cadence window return the cached reading
//! instead of generating a new one. Sensors can be stopped, restarted,
//! and calibrated by a scale factor.
//!
//! [`standard_bank`] returns the default four-sensor set used by the
//! client loop.

mod error;
mod sensor;

pub use error::{Error, Result};
pub use sensor::{Profile, SimulatedSensor, standard_bank};
