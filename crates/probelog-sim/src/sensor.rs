//! Value generation for the simulated sensor bank.

use std::time::{Duration, Instant};

use rand::Rng;
use time::OffsetDateTime;

use probelog_types::Reading;

use crate::error::{Error, Result};

/// How a sensor turns "now" plus its own history into the next value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Uniform draw over the sensor's range.
    Uniform,
    /// Diurnal sine around 15 with a 10-degree swing, plus small noise.
    Temperature,
    /// 40-70 band, pulled down slightly by the sensor's own last value.
    Humidity,
    /// 1013.25 plus or minus up to 10.
    Pressure,
    /// Daylight curve peaking at solar noon, dark at night.
    Light,
}

impl Profile {
    fn generate(self, last: Option<f64>, at: OffsetDateTime, min: f64, max: f64) -> f64 {
        let mut rng = rand::rng();
        let hour = f64::from(at.hour());
        match self {
            Profile::Uniform => rng.random_range(min..=max),
            Profile::Temperature => {
                let base = 15.0 + 10.0 * ((std::f64::consts::PI / 12.0) * (hour - 6.0)).sin();
                base + rng.random_range(-2.0..=2.0)
            }
            Profile::Humidity => {
                let temp_effect = -0.2 * last.unwrap_or(20.0);
                rng.random_range(40.0..=70.0) + temp_effect + rng.random_range(-5.0..=5.0)
            }
            Profile::Pressure => 1013.25 + rng.random_range(-10.0..=10.0),
            Profile::Light => {
                let base =
                    (10_000.0 * ((std::f64::consts::PI / 12.0) * (hour - 6.0)).sin()).max(0.0);
                base + rng.random_range(-200.0..=200.0)
            }
        }
    }
}

/// One simulated sensor.
///
/// `read` is rate-limited by the cadence: a second read inside the window
/// returns the cached reading unchanged, so fast polling loops do not
/// fabricate data the physical quantity could not produce.
#[derive(Debug)]
pub struct SimulatedSensor {
    id: String,
    name: String,
    unit: String,
    min: f64,
    max: f64,
    cadence: Duration,
    profile: Profile,
    active: bool,
    last: Option<Reading>,
    last_read_at: Option<Instant>,
}

impl SimulatedSensor {
    pub fn new(
        id: &str,
        name: &str,
        unit: &str,
        min: f64,
        max: f64,
        cadence: Duration,
        profile: Profile,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            unit: unit.to_string(),
            min,
            max,
            cadence,
            profile,
            active: true,
            last: None,
            last_read_at: None,
        }
    }

    /// Outdoor temperature, -20 to 50 °C, 1 s cadence.
    pub fn temperature() -> Self {
        Self::new(
            "T1",
            "Outdoor temperature",
            "°C",
            -20.0,
            50.0,
            Duration::from_secs(1),
            Profile::Temperature,
        )
    }

    /// Relative humidity, 0 to 100 %, 2 s cadence.
    pub fn humidity() -> Self {
        Self::new(
            "H1",
            "Relative humidity",
            "%",
            0.0,
            100.0,
            Duration::from_secs(2),
            Profile::Humidity,
        )
    }

    /// Atmospheric pressure, 950 to 1050 hPa, 4 s cadence.
    pub fn pressure() -> Self {
        Self::new(
            "P1",
            "Atmospheric pressure",
            "hPa",
            950.0,
            1050.0,
            Duration::from_secs(4),
            Profile::Pressure,
        )
    }

    /// Illuminance, 0 to 10000 lx, 2 s cadence.
    pub fn light() -> Self {
        Self::new(
            "L1",
            "Illuminance",
            "lx",
            0.0,
            10_000.0,
            Duration::from_secs(2),
            Profile::Light,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Re-enable a stopped sensor.
    pub fn start(&mut self) {
        self.active = true;
    }

    /// Disable the sensor; reads fail until `start`.
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Produce the current reading.
    ///
    /// Returns the cached reading when called again within the cadence
    /// window. Reading a stopped sensor is an error.
    pub fn read(&mut self) -> Result<Reading> {
        if !self.active {
            return Err(Error::Inactive(self.id.clone()));
        }

        let now = Instant::now();
        if let (Some(reading), Some(read_at)) = (&self.last, self.last_read_at)
            && now.duration_since(read_at) < self.cadence
        {
            return Ok(reading.clone());
        }

        let raw = self.profile.generate(
            self.last.as_ref().map(|r| r.value),
            OffsetDateTime::now_utc(),
            self.min,
            self.max,
        );
        let reading = Reading::new(
            &self.id,
            OffsetDateTime::now_utc(),
            raw.clamp(self.min, self.max),
            &self.unit,
        );
        self.last = Some(reading.clone());
        self.last_read_at = Some(now);
        Ok(reading)
    }

    /// The most recent reading, generating one first if none exists.
    pub fn last_reading(&mut self) -> Result<Reading> {
        match &self.last {
            Some(reading) => Ok(reading.clone()),
            None => self.read(),
        }
    }

    /// Scale the last value by `factor`, reading first if needed, and
    /// return the adjusted value.
    pub fn calibrate(&mut self, factor: f64) -> Result<f64> {
        if self.last.is_none() {
            self.read()?;
        }
        // read() above guarantees a cached reading on the Ok path.
        let reading = self.last.as_mut().ok_or_else(|| Error::Inactive(self.id.clone()))?;
        reading.value *= factor;
        Ok(reading.value)
    }
}

/// The default four-sensor set: T1, H1, P1, L1.
pub fn standard_bank() -> Vec<SimulatedSensor> {
    vec![
        SimulatedSensor::temperature(),
        SimulatedSensor::humidity(),
        SimulatedSensor::pressure(),
        SimulatedSensor::light(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_stays_in_range() {
        for sensor in &mut standard_bank() {
            for _ in 0..50 {
                // Fresh value every iteration.
                sensor.last_read_at = None;
                let reading = sensor.read().unwrap();
                assert!(
                    reading.value >= sensor.min && reading.value <= sensor.max,
                    "{} out of range: {}",
                    sensor.id(),
                    reading.value
                );
            }
        }
    }

    #[test]
    fn test_cadence_returns_cached_reading() {
        let mut sensor = SimulatedSensor::new(
            "U1",
            "Uniform",
            "x",
            0.0,
            1000.0,
            Duration::from_secs(3600),
            Profile::Uniform,
        );
        let first = sensor.read().unwrap();
        let second = sensor.read().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_cadence_always_generates() {
        let mut sensor = SimulatedSensor::new(
            "U1",
            "Uniform",
            "x",
            5.0,
            5.0,
            Duration::ZERO,
            Profile::Uniform,
        );
        let first = sensor.read().unwrap();
        let second = sensor.read().unwrap();
        // Degenerate range pins the value; the timestamps are fresh.
        assert_eq!(first.value, 5.0);
        assert!(second.timestamp >= first.timestamp);
    }

    #[test]
    fn test_stopped_sensor_fails_to_read() {
        let mut sensor = SimulatedSensor::temperature();
        sensor.stop();
        assert!(matches!(sensor.read(), Err(Error::Inactive(id)) if id == "T1"));
        sensor.start();
        assert!(sensor.read().is_ok());
    }

    #[test]
    fn test_calibrate_scales_last_value() {
        let mut sensor = SimulatedSensor::new(
            "U1",
            "Uniform",
            "x",
            10.0,
            10.0,
            Duration::from_secs(3600),
            Profile::Uniform,
        );
        let calibrated = sensor.calibrate(1.5).unwrap();
        assert_eq!(calibrated, 15.0);
        assert_eq!(sensor.last_reading().unwrap().value, 15.0);
    }

    #[test]
    fn test_calibrate_without_prior_read_reads_first() {
        let mut sensor = SimulatedSensor::pressure();
        assert!(sensor.calibrate(1.0).is_ok());
    }

    #[test]
    fn test_standard_bank_ids() {
        let ids: Vec<_> = standard_bank().iter().map(|s| s.id().to_string()).collect();
        assert_eq!(ids, ["T1", "H1", "P1", "L1"]);
    }
}
