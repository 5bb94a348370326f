use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    JitterExceedsPeriod,
    ZeroPeriod,
    SensorUnavailable,
    SensorReadingOutOfRange,
    NetworkError,
    PayloadTooLarge,
    BufferTooSmall,
    MalformedReport,
    InitializationError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::JitterExceedsPeriod => write!(f, "Jitter bound exceeds period"),
            Error::ZeroPeriod => write!(f, "Period must be non-zero"),
            Error::SensorUnavailable => write!(f, "Sensor unavailable"),
            Error::SensorReadingOutOfRange => write!(f, "Sensor reading out of valid range"),
            Error::NetworkError => write!(f, "Network error"),
            Error::PayloadTooLarge => write!(f, "Payload exceeds wire limit"),
            Error::BufferTooSmall => write!(f, "Response buffer too small"),
            Error::MalformedReport => write!(f, "Malformed report payload"),
            Error::InitializationError => write!(f, "Initialization error"),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
