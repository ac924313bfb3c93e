use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One GNSS position/velocity solution consumed per broadcast round
///
/// Supplied fresh by the location collaborator before each advertising round;
/// this core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationFix {
    /// UTC time the fix was produced
    #[serde(serialize_with = "super::serde::serialize_utc")]
    #[serde(deserialize_with = "super::serde::deserialize_utc")]
    pub timestamp: DateTime<Utc>,
    /// Latitude in decimal degrees, positive north
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east
    pub longitude: f64,
    /// Geodetic altitude in meters
    pub altitude_m: f64,
    /// Ground speed in meters per second
    pub ground_speed_ms: f64,
    /// Vertical speed in meters per second, positive up
    pub vertical_speed_ms: f64,
    /// Direction of motion over ground, degrees clockwise from true north
    pub heading_motion_deg: f64,
    /// Vehicle nose heading, degrees clockwise from true north
    pub heading_vehicle_deg: f64,
    /// Estimated horizontal position error in meters
    pub horiz_acc_m: f64,
    /// Estimated vertical position error in meters
    pub vert_acc_m: f64,
    /// Estimated speed error in meters per second
    pub speed_acc_ms: f64,
}

/// Serial device settings for the companion radio link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UartSettings {
    /// Serial device path
    pub device: String,
    /// Baud rate
    pub baud_rate: u32,
}

impl Default for UartSettings {
    fn default() -> Self {
        UartSettings {
            device: "/dev/ttyS1".to_string(),
            baud_rate: 115_200,
        }
    }
}

/// Identifier type nibble of the Basic ID message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum UasIdType {
    /// No identifier broadcast
    None = 0,
    /// ANSI/CTA-2063-A serial number
    SerialNumber = 1,
    /// Civil aviation authority registration
    CaaRegistration = 2,
    /// UTM-assigned UUID
    UtmAssigned = 3,
    /// Session identifier specific to this broadcast
    SpecificSession = 4,
}

impl UasIdType {
    /// On-air nibble value
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Airframe category nibble of the Basic ID message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum UaType {
    Undeclared = 0,
    Aeroplane = 1,
    Helicopter = 2,
    Gyroplane = 3,
    HybridLift = 4,
    Ornithopter = 5,
    Glider = 6,
    Kite = 7,
    FreeBalloon = 8,
    CaptiveBalloon = 9,
    Airship = 10,
    FreeFallParachute = 11,
    Rocket = 12,
    TetheredPowered = 13,
    GroundObstacle = 14,
    Other = 15,
}

impl UaType {
    /// On-air nibble value
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Authentication method nibble of the Auth message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AuthType {
    None = 0,
    UasIdSignature = 1,
    OperatorIdSignature = 2,
    MessageSetSignature = 3,
    NetworkRemoteId = 4,
    SpecificMethod = 5,
}

impl AuthType {
    /// On-air nibble value
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl Default for AuthType {
    fn default() -> Self {
        AuthType::None
    }
}

/// How the operator location in the System message was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OperatorLocationType {
    /// Location of the takeoff point
    TakeOff = 0,
    /// Live GNSS position of the operator
    LiveGnss = 1,
    /// Fixed configured location
    Fixed = 2,
}

impl OperatorLocationType {
    /// On-air value (low two bits of the System flags byte)
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Static identity broadcast in the Basic ID messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// ANSI/CTA-2063-A serial number of the asset
    pub serial_number: String,
    /// Session identifier broadcast as the second Basic ID variant
    pub session_id: String,
    /// Airframe category of the asset
    pub ua_type: UaType,
}

impl Default for Identity {
    fn default() -> Self {
        Identity {
            serial_number: String::new(),
            session_id: String::new(),
            ua_type: UaType::Undeclared,
        }
    }
}

/// Fixed operator and operating-area parameters
///
/// Feeds the Self ID, System and Operator ID messages. Supplied by
/// configuration management; treated as constants for the device uptime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorParams {
    /// CAA-issued operator registration text
    pub operator_id: String,
    /// Free-text description broadcast in the Self ID message
    pub self_description: String,
    /// Operator latitude in decimal degrees
    pub operator_latitude: f64,
    /// Operator longitude in decimal degrees
    pub operator_longitude: f64,
    /// Operator geodetic altitude in meters
    pub operator_altitude_m: f64,
    /// How the operator location was obtained
    pub location_type: OperatorLocationType,
    /// Number of aircraft in the operating area
    pub area_count: u16,
    /// Operating area radius in meters
    pub area_radius_m: f64,
    /// Operating area ceiling in meters
    pub area_ceiling_m: f64,
    /// Operating area floor in meters
    pub area_floor_m: f64,
}

impl Default for OperatorParams {
    fn default() -> Self {
        OperatorParams {
            operator_id: String::new(),
            self_description: String::new(),
            operator_latitude: 0.0,
            operator_longitude: 0.0,
            operator_altitude_m: 0.0,
            location_type: OperatorLocationType::Fixed,
            area_count: 1,
            area_radius_m: 0.0,
            area_ceiling_m: 0.0,
            area_floor_m: 0.0,
        }
    }
}

/// Opaque authentication payload carried across the Auth message pages
///
/// The content is produced elsewhere; this core only splits it over the
/// pages without interpreting it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthParams {
    /// Authentication method the payload belongs to
    pub auth_type: AuthType,
    /// Raw authentication data, at most the three-page capacity
    pub payload: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_codes() {
        assert_eq!(UasIdType::SerialNumber.code(), 1);
        assert_eq!(UasIdType::SpecificSession.code(), 4);
        assert_eq!(UaType::Helicopter.code(), 2);
        assert_eq!(UaType::Other.code(), 15);
        assert_eq!(AuthType::MessageSetSignature.code(), 3);
        assert_eq!(OperatorLocationType::Fixed.code(), 2);
    }

    #[test]
    fn test_operator_defaults() {
        let params = OperatorParams::default();
        assert_eq!(params.area_count, 1);
        assert_eq!(params.location_type, OperatorLocationType::Fixed);
    }

    #[test]
    fn test_fix_serialization() {
        let fix = LocationFix {
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            latitude: 52.473,
            longitude: 13.402,
            altitude_m: 100.0,
            ground_speed_ms: 12.0,
            vertical_speed_ms: 0.0,
            heading_motion_deg: 270.0,
            heading_vehicle_deg: 265.0,
            horiz_acc_m: 2.0,
            vert_acc_m: 4.0,
            speed_acc_ms: 0.5,
        };

        let serialized = serde_json::to_string(&fix).unwrap();
        let deserialized: LocationFix = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized.timestamp, fix.timestamp);
        assert_eq!(deserialized.latitude, fix.latitude);
        assert_eq!(deserialized.heading_motion_deg, fix.heading_motion_deg);
    }
}
