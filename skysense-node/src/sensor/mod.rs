mod synthetic;
mod transform;

pub use synthetic::SyntheticSensor;
pub use transform::{light_level, temperature_celsius};

use crate::error::Result;

/// The sensors a node can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Temperature,
    Humidity,
    Light,
}

impl SensorKind {
    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "Temperature",
            SensorKind::Humidity => "Humidity",
            SensorKind::Light => "Light",
        }
    }
}

/// One sample. Created fresh on each read, serialized, then discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    pub name: &'static str,
    pub value: i32,
}

impl SensorReading {
    pub fn new(kind: SensorKind, value: i32) -> Self {
        Self {
            name: kind.label(),
            value,
        }
    }
}

/// Capability interface over raw driver access. Substitutable with a fixed
/// or seeded fake in tests.
pub trait SensorBus {
    fn read_raw(&mut self, kind: SensorKind) -> Result<i32>;

    fn read(&mut self, kind: SensorKind) -> Result<SensorReading> {
        Ok(SensorReading::new(kind, self.read_raw(kind)?))
    }
}
