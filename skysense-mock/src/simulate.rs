use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::rngs::SmallRng;
use skysense_node::error::Result;
use skysense_node::sensor::{SensorBus, SensorKind};

/// Raw daylight channel reading for a point in the day, peaking at noon.
pub fn daylight_raw(day_fraction: f64) -> i32 {
    let radians = day_fraction * 2.0 * std::f64::consts::PI;

    (radians.sin().max(0.0) * 700.0).round() as i32
}

/// Raw SHT11 temperature word for a point in the day. The firmware's
/// two-stage transform maps these back to roughly 5-30 degrees Celsius.
pub fn ambient_temperature_raw(day_fraction: f64) -> i32 {
    let radians = day_fraction * 2.0 * std::f64::consts::PI;
    let celsius = radians.sin().max(0.0) * 25.0 + 5.0;

    ((celsius * 10.0).round() as i32 + 396) * 10
}

/// Sensor bus producing hardware-shaped raw words, with a little noise on
/// top of the time-of-day curve.
pub struct SimulatedBus {
    rng: SmallRng,
}

impl SimulatedBus {
    pub fn new(rng: SmallRng) -> Self {
        Self { rng }
    }

    fn day_fraction() -> f64 {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        (since_epoch.as_secs() % 86_400) as f64 / 86_400.0
    }
}

impl SensorBus for SimulatedBus {
    fn read_raw(&mut self, kind: SensorKind) -> Result<i32> {
        let day_fraction = Self::day_fraction();

        let value = match kind {
            SensorKind::Temperature => {
                ambient_temperature_raw(day_fraction) + self.rng.random_range(-20..=20)
            }
            SensorKind::Humidity => self.rng.random_range(40..=80),
            SensorKind::Light => (daylight_raw(day_fraction) + self.rng.random_range(-30..=30))
                .clamp(0, 700),
        };

        Ok(value)
    }
}
