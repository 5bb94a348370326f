use rand::Rng;

use crate::error::Result;

use super::{SensorBus, SensorKind};

/// Synthetic sensor source for nodes without real hardware attached.
///
/// Each read draws an independent, uniformly distributed value from the
/// range of the corresponding sensor. The generator is injected so tests
/// can seed it.
pub struct SyntheticSensor<R> {
    rng: R,
}

impl<R: Rng> SyntheticSensor<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> SensorBus for SyntheticSensor<R> {
    fn read_raw(&mut self, kind: SensorKind) -> Result<i32> {
        let value = match kind {
            SensorKind::Temperature => self.rng.random_range(0..=35),
            SensorKind::Humidity => self.rng.random_range(40..=80),
            SensorKind::Light => self.rng.random_range(0..=4095),
        };
        Ok(value)
    }
}
