use std::error::Error;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reporter {
    pub period_secs: u64,
    pub jitter_bound_secs: u64,
    /// Seed for the jitter/sensor generators; omit for entropy seeding.
    pub seed: Option<u64>,
    /// Network prefix the routing infrastructure would advertise.
    pub prefix: String,
    /// Hardware-derived interface identifier of the simulated node.
    pub interface_id: [u16; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Responder {
    pub listen: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub reporter: Reporter,
    pub responder: Responder,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let settings: Settings = toml::from_str(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/default.toml"
        )))?;

        Ok(settings)
    }
}
