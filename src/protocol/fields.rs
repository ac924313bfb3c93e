//! Field-level codecs shared by the message encoders
//!
//! Remote ID packs floating-point telemetry into fixed-width scaled little-
//! endian integers. The scaling factors, breakpoints and bucket thresholds
//! here are requirements of the broadcast standard and must not drift.

use chrono::{DateTime, Timelike, Utc};

use crate::core::{Error, Result, RID_EPOCH_UNIX};

/// Upper bound of the 0.25 m/s ground-speed regime
pub const SPEED_LOW_REGIME_MAX: f64 = 63.75;

/// Ground speed at and above which the encoded value saturates
pub const SPEED_SATURATION: f64 = 254.25;

/// Encoded altitude broadcast when a field is not measured (−1000 m)
pub const UNKNOWN_ALTITUDE: u16 = 0;

/// Ground speed above which the asset counts as airborne
const MOVING_THRESHOLD_MS: f64 = 0.25;

/// Scales a latitude or longitude into the on-air 1e-7 degree integer
pub fn encode_coordinate(deg: f64) -> i32 {
    (deg * 1e7).round() as i32
}

/// Inverse of [`encode_coordinate`]
pub fn decode_coordinate(raw: i32) -> f64 {
    raw as f64 / 1e7
}

/// Encodes an altitude-like value: 0.5 m resolution, biased by +1000 m so
/// every legal altitude lands in the unsigned range
pub fn encode_altitude(meters: f64) -> u16 {
    let scaled = ((meters + 1000.0) * 2.0).round();
    scaled.clamp(0.0, u16::MAX as f64) as u16
}

/// Inverse of [`encode_altitude`]
pub fn decode_altitude(raw: u16) -> f64 {
    raw as f64 / 2.0 - 1000.0
}

/// Folds a track direction into the 0-179 on-air range
///
/// Directions of 180° and above are stored shifted down by 180 with the
/// east/west flag set; the flag restores the upper half of the range on the
/// receiving side.
pub fn encode_direction(track_deg: f64) -> (u8, bool) {
    let rounded = track_deg.rem_euclid(360.0).round() as u16 % 360;
    if rounded >= 180 {
        ((rounded - 180) as u8, true)
    } else {
        (rounded as u8, false)
    }
}

/// Encodes ground speed with its dual-resolution scheme
///
/// Speeds up to [`SPEED_LOW_REGIME_MAX`] use 0.25 m/s resolution with the
/// multiplier flag clear; faster speeds are rebased onto a 0.75 m/s grid
/// with the flag set, saturating at the highest encodable value.
pub fn encode_speed(speed_ms: f64) -> (u8, bool) {
    let speed = speed_ms.max(0.0);
    if speed <= SPEED_LOW_REGIME_MAX {
        ((speed * 4.0).round() as u8, false)
    } else if speed < SPEED_SATURATION {
        (((speed - SPEED_LOW_REGIME_MAX) / 0.75).round() as u8, true)
    } else {
        (254, true)
    }
}

/// Encodes vertical speed at 0.5 m/s resolution, positive up
pub fn encode_vertical_speed(speed_ms: f64) -> i8 {
    (speed_ms * 2.0).round().clamp(i8::MIN as f64, i8::MAX as f64) as i8
}

/// Seconds since the Remote ID epoch, 2019-01-01T00:00:00Z
pub fn epoch_timestamp(time: &DateTime<Utc>) -> u32 {
    (time.timestamp() - RID_EPOCH_UNIX).max(0) as u32
}

/// Tenths of a second elapsed since the start of the current hour
pub fn tenths_after_hour(time: &DateTime<Utc>) -> u16 {
    let tenths = u32::from(time.minute()) * 600
        + u32::from(time.second()) * 10
        + time.timestamp_subsec_millis() / 100;
    tenths as u16
}

/// Packs text into a fixed-width null-padded byte field
///
/// Rejects over-long input before the caller touches any shared state, so a
/// failed encode never perturbs the transmission counters.
pub fn encode_text(field: &'static str, text: &str, width: usize) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    if bytes.len() > width {
        return Err(Error::length_violation(field, width, bytes.len()));
    }
    let mut out = vec![0u8; width];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

/// Operating-area radius in 10 m units
pub fn encode_area_radius(meters: f64) -> u8 {
    (meters / 10.0).round().clamp(0.0, 255.0) as u8
}

/// Operational status nibble of the Location/Vector message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperationalStatus {
    Undeclared = 0,
    Ground = 1,
    Airborne = 2,
}

impl OperationalStatus {
    /// Classifies the asset from its ground speed
    pub fn from_ground_speed(speed_ms: f64) -> Self {
        if speed_ms > MOVING_THRESHOLD_MS {
            OperationalStatus::Airborne
        } else {
            OperationalStatus::Ground
        }
    }

    /// On-air nibble value
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Reference surface for the Location/Vector height field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HeightReference {
    AboveTakeoff = 0,
    AboveGround = 1,
}

impl HeightReference {
    /// On-air flag bit
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Horizontal position accuracy classes, loosest to tightest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HorizontalAccuracy {
    Unknown = 0,
    Within18520M = 1,
    Within7408M = 2,
    Within3704M = 3,
    Within1852M = 4,
    Within926M = 5,
    Within555M = 6,
    Within185M = 7,
    Within92M = 8,
    Within30M = 9,
    Within10M = 10,
    Within3M = 11,
    Within1M = 12,
}

impl HorizontalAccuracy {
    /// Classifies an error estimate, scanning tightest to loosest; a value
    /// exactly on a threshold takes the tighter class
    pub fn from_meters(meters: f64) -> Self {
        if meters <= 1.0 {
            HorizontalAccuracy::Within1M
        } else if meters <= 3.0 {
            HorizontalAccuracy::Within3M
        } else if meters <= 10.0 {
            HorizontalAccuracy::Within10M
        } else if meters <= 30.0 {
            HorizontalAccuracy::Within30M
        } else if meters <= 92.6 {
            HorizontalAccuracy::Within92M
        } else if meters <= 185.2 {
            HorizontalAccuracy::Within185M
        } else if meters <= 555.6 {
            HorizontalAccuracy::Within555M
        } else if meters <= 926.0 {
            HorizontalAccuracy::Within926M
        } else if meters <= 1852.0 {
            HorizontalAccuracy::Within1852M
        } else if meters <= 3704.0 {
            HorizontalAccuracy::Within3704M
        } else if meters <= 7408.0 {
            HorizontalAccuracy::Within7408M
        } else if meters <= 18520.0 {
            HorizontalAccuracy::Within18520M
        } else {
            HorizontalAccuracy::Unknown
        }
    }

    /// On-air nibble value
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Vertical position accuracy classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VerticalAccuracy {
    Unknown = 0,
    Within150M = 1,
    Within45M = 2,
    Within25M = 3,
    Within10M = 4,
    Within3M = 5,
    Within1M = 6,
}

impl VerticalAccuracy {
    /// Classifies an error estimate; boundary values take the tighter class
    pub fn from_meters(meters: f64) -> Self {
        if meters <= 1.0 {
            VerticalAccuracy::Within1M
        } else if meters <= 3.0 {
            VerticalAccuracy::Within3M
        } else if meters <= 10.0 {
            VerticalAccuracy::Within10M
        } else if meters <= 25.0 {
            VerticalAccuracy::Within25M
        } else if meters <= 45.0 {
            VerticalAccuracy::Within45M
        } else if meters <= 150.0 {
            VerticalAccuracy::Within150M
        } else {
            VerticalAccuracy::Unknown
        }
    }

    /// On-air nibble value
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Speed accuracy classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SpeedAccuracy {
    Unknown = 0,
    Within10Mps = 1,
    Within3Mps = 2,
    Within1Mps = 3,
    Within03Mps = 4,
}

impl SpeedAccuracy {
    /// Classifies an error estimate; boundary values take the tighter class
    pub fn from_ms(ms: f64) -> Self {
        if ms <= 0.3 {
            SpeedAccuracy::Within03Mps
        } else if ms <= 1.0 {
            SpeedAccuracy::Within1Mps
        } else if ms <= 3.0 {
            SpeedAccuracy::Within3Mps
        } else if ms <= 10.0 {
            SpeedAccuracy::Within10Mps
        } else {
            SpeedAccuracy::Unknown
        }
    }

    /// On-air nibble value
    pub fn code(&self) -> u8 {
        *self as u8
    }
}
