use embassy_time::{Duration, Ticker};
use log::warn;

use crate::error::{Error, Result};
use crate::sensor::{SensorBus, SensorKind, light_level, temperature_celsius};

/// The two read-only resources this node serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceId {
    Temperature,
    Light,
}

impl ResourceId {
    pub const ALL: [ResourceId; 2] = [ResourceId::Temperature, ResourceId::Light];

    pub fn path(&self) -> &'static str {
        match self {
            ResourceId::Temperature => "sensors/temperature",
            ResourceId::Light => "sensors/light",
        }
    }

    /// Link-format attributes advertised during resource registration.
    pub fn attributes(&self) -> &'static str {
        match self {
            ResourceId::Temperature => "title=\"Temperature\";rt=\"Temperature\"",
            ResourceId::Light => "title=\"Light\";rt=\"Light\"",
        }
    }

    /// Dispatch a request path. Unknown paths get `None`; the resource
    /// framework turns that into its own not-found response.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.path() == path)
    }
}

/// CoAP content formats this node emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    Json,
}

impl ContentFormat {
    /// Numeric CoAP Content-Format option value.
    pub const fn id(self) -> u16 {
        match self {
            ContentFormat::Json => 50, // application/json
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetResponse {
    pub len: usize,
    pub content_format: ContentFormat,
}

/// Serves on-demand sensor snapshots. Every request reads the hardware
/// anew; nothing is cached between requests.
pub struct Responder<S> {
    sensors: S,
}

impl<S: SensorBus> Responder<S> {
    pub fn new(sensors: S) -> Self {
        Self { sensors }
    }

    /// Handle a GET on `resource`, writing the JSON body into the
    /// framework-provided `buffer` and reporting its length and content
    /// format. Fails if the body does not fit or the sensor read fails.
    pub fn handle(&mut self, resource: ResourceId, buffer: &mut [u8]) -> Result<GetResponse> {
        let raw = self
            .sensors
            .read_raw(match resource {
                ResourceId::Temperature => SensorKind::Temperature,
                ResourceId::Light => SensorKind::Light,
            })
            .inspect_err(|err| warn!("GET {} failed: {}", resource.path(), err))?;

        let body = match resource {
            ResourceId::Temperature => {
                alloc::format!("{{\"temperature\": {}}}", temperature_celsius(raw))
            }
            ResourceId::Light => alloc::format!("{{\"light\": {}}}", light_level(raw)),
        };

        if body.len() > buffer.len() {
            return Err(Error::BufferTooSmall);
        }

        buffer[..body.len()].copy_from_slice(body.as_bytes());

        Ok(GetResponse {
            len: body.len(),
            content_format: ContentFormat::Json,
        })
    }
}

/// Interval of the background wake-up tick.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(2);

/// Recurring no-op tick. It does no sensor work; it only gives the
/// cooperative scheduler a standing reason to wake the responder task.
pub async fn keep_alive() -> ! {
    let mut ticker = Ticker::every(KEEP_ALIVE_INTERVAL);

    loop {
        ticker.next().await;
    }
}
