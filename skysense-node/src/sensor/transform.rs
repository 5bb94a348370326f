//! Raw-to-unit conversions for the on-board sensors.
//!
//! Both transforms are fixed-point and must stay bit-for-bit stable: clients
//! compare the served values against firmware revisions in the field.

/// SHT11 raw temperature to whole degrees Celsius.
///
/// The two-stage truncating division is intentional and observable for raw
/// values below the 0 degree point; do not fold it into a single division.
pub fn temperature_celsius(raw: i32) -> i32 {
    ((raw / 10) - 396) / 10
}

/// Photosynthetic light channel to light units.
pub fn light_level(raw: i32) -> i32 {
    10 * raw / 7
}
