//! The six Remote ID broadcast messages
//!
//! Each encoder produces a complete AD structure: the fixed service-data
//! header, the per-kind transmission counter, the kind/version byte, and the
//! 24-byte message body. Length checks run before any counter is advanced,
//! so a rejected encode never perturbs shared counter state.

use chrono::{DateTime, Utc};

use crate::core::types::{AuthParams, LocationFix, OperatorParams, UaType, UasIdType};
use crate::core::{
    Error, Result, ASTM_SERVICE_UUID, MAX_ADVERTISEMENT_BYTES, MAX_AUTH_BYTES, MAX_ID_BYTES,
    MAX_SELF_ID_BYTES, MESSAGE_SIZE, PROTOCOL_VERSION, RID_APP_CODE,
};
use crate::util::to_hex;
use super::fields::{
    encode_altitude, encode_area_radius, encode_coordinate, encode_direction, encode_speed,
    encode_text, encode_vertical_speed, epoch_timestamp, tenths_after_hour, HeightReference,
    HorizontalAccuracy, OperationalStatus, SpeedAccuracy, VerticalAccuracy, UNKNOWN_ALTITUDE,
};
use super::{AdvertisementFrame, MessageCounters, MessageKind};

/// AD structure length byte: everything after it in the advertisement
const AD_LENGTH: u8 = (MAX_ADVERTISEMENT_BYTES - 1) as u8;

/// AD type for service data with a 16-bit UUID
const AD_TYPE_SERVICE_DATA: u8 = 0x16;

/// Size of a message body after the kind/version byte
const BODY_SIZE: usize = MESSAGE_SIZE - 1;

/// Self-ID description type for plain text
const DESCRIPTION_TYPE_TEXT: u8 = 0;

/// Operator-ID type for a CAA-issued registration
const OPERATOR_ID_TYPE_CAA: u8 = 0;

/// Timestamp accuracy nibble of the Location message, in 0.1 s units
const TIMESTAMP_ACCURACY_TENTHS: u8 = 1;

/// Number of pages every authentication message spans
pub const AUTH_PAGE_COUNT: usize = 3;

/// Bytes of authentication payload carried on page 0
const AUTH_PAGE0_BYTES: usize = 17;

/// Bytes of authentication payload carried on each continuation page
const AUTH_PAGE_BYTES: usize = 23;

/// Wraps a message body into the advertised AD structure
fn assemble(kind: MessageKind, counter: u8, body: &[u8; BODY_SIZE]) -> AdvertisementFrame {
    let mut frame = Vec::with_capacity(MAX_ADVERTISEMENT_BYTES);
    frame.push(AD_LENGTH);
    frame.push(AD_TYPE_SERVICE_DATA);
    frame.extend_from_slice(&ASTM_SERVICE_UUID.to_le_bytes());
    frame.push(RID_APP_CODE);
    frame.push(counter);
    frame.push((kind.nibble() << 4) | PROTOCOL_VERSION);
    frame.extend_from_slice(body);
    AdvertisementFrame {
        kind,
        payload_hex: to_hex(&frame),
    }
}

/// Encodes a Basic ID message carrying one identifier variant
pub fn basic_id(
    counters: &mut MessageCounters,
    id_type: UasIdType,
    ua_type: UaType,
    uas_id: &str,
) -> Result<AdvertisementFrame> {
    let id = encode_text("UAS ID", uas_id, MAX_ID_BYTES)?;
    let mut body = [0u8; BODY_SIZE];
    body[0] = (id_type.code() << 4) | ua_type.code();
    body[1..21].copy_from_slice(&id);
    let counter = counters.advance(MessageKind::BasicId);
    Ok(assemble(MessageKind::BasicId, counter, &body))
}

/// Encodes the Location/Vector message from a live fix
///
/// Pressure altitude and height above takeoff are broadcast as unknown; the
/// fix carries a geodetic altitude only.
pub fn location(counters: &mut MessageCounters, fix: &LocationFix) -> Result<AdvertisementFrame> {
    let (track, east_west) = encode_direction(fix.heading_motion_deg);
    let (speed, multiplier) = encode_speed(fix.ground_speed_ms);
    let status = OperationalStatus::from_ground_speed(fix.ground_speed_ms);

    let mut body = [0u8; BODY_SIZE];
    body[0] = (status.code() << 4)
        | (HeightReference::AboveTakeoff.code() << 2)
        | ((east_west as u8) << 1)
        | multiplier as u8;
    body[1] = track;
    body[2] = speed;
    body[3] = encode_vertical_speed(fix.vertical_speed_ms) as u8;
    body[4..8].copy_from_slice(&encode_coordinate(fix.latitude).to_le_bytes());
    body[8..12].copy_from_slice(&encode_coordinate(fix.longitude).to_le_bytes());
    body[12..14].copy_from_slice(&UNKNOWN_ALTITUDE.to_le_bytes());
    body[14..16].copy_from_slice(&encode_altitude(fix.altitude_m).to_le_bytes());
    body[16..18].copy_from_slice(&UNKNOWN_ALTITUDE.to_le_bytes());
    body[18] = (VerticalAccuracy::from_meters(fix.vert_acc_m).code() << 4)
        | HorizontalAccuracy::from_meters(fix.horiz_acc_m).code();
    body[19] = SpeedAccuracy::from_ms(fix.speed_acc_ms).code();
    body[20..22].copy_from_slice(&tenths_after_hour(&fix.timestamp).to_le_bytes());
    body[22] = TIMESTAMP_ACCURACY_TENTHS;
    let counter = counters.advance(MessageKind::Location);
    Ok(assemble(MessageKind::Location, counter, &body))
}

/// Encodes one page of the three-page authentication message
///
/// Page 0 advances the Auth counter; continuation pages reuse its value so
/// receivers see the pages as one transmission.
pub fn auth_page(
    counters: &mut MessageCounters,
    auth: &AuthParams,
    time: &DateTime<Utc>,
    page: u8,
) -> Result<AdvertisementFrame> {
    if usize::from(page) >= AUTH_PAGE_COUNT {
        return Err(Error::encoding(format!("auth page {} out of range", page)));
    }
    if auth.payload.len() > MAX_AUTH_BYTES {
        return Err(Error::length_violation(
            "auth payload",
            MAX_AUTH_BYTES,
            auth.payload.len(),
        ));
    }
    let mut padded = [0u8; MAX_AUTH_BYTES];
    padded[..auth.payload.len()].copy_from_slice(&auth.payload);

    let mut body = [0u8; BODY_SIZE];
    let counter = if page == 0 {
        body[0] = auth.auth_type.code() << 4;
        body[1] = (AUTH_PAGE_COUNT - 1) as u8;
        body[2] = auth.payload.len() as u8;
        body[3..7].copy_from_slice(&epoch_timestamp(time).to_le_bytes());
        body[7..].copy_from_slice(&padded[..AUTH_PAGE0_BYTES]);
        counters.advance(MessageKind::Auth)
    } else {
        body[0] = (auth.auth_type.code() << 4) | page;
        let start = AUTH_PAGE0_BYTES + (usize::from(page) - 1) * AUTH_PAGE_BYTES;
        body[1..].copy_from_slice(&padded[start..start + AUTH_PAGE_BYTES]);
        counters.current(MessageKind::Auth)
    };
    Ok(assemble(MessageKind::Auth, counter, &body))
}

/// Encodes the Self ID message carrying the free-text description
pub fn self_id(counters: &mut MessageCounters, description: &str) -> Result<AdvertisementFrame> {
    let text = encode_text("self-ID description", description, MAX_SELF_ID_BYTES)?;
    let mut body = [0u8; BODY_SIZE];
    body[0] = DESCRIPTION_TYPE_TEXT;
    body[1..].copy_from_slice(&text);
    let counter = counters.advance(MessageKind::SelfId);
    Ok(assemble(MessageKind::SelfId, counter, &body))
}

/// Encodes the System message from the fixed operator/area parameters
pub fn system(
    counters: &mut MessageCounters,
    operator: &OperatorParams,
    time: &DateTime<Utc>,
) -> Result<AdvertisementFrame> {
    let mut body = [0u8; BODY_SIZE];
    body[0] = operator.location_type.code();
    body[1..5].copy_from_slice(&encode_coordinate(operator.operator_latitude).to_le_bytes());
    body[5..9].copy_from_slice(&encode_coordinate(operator.operator_longitude).to_le_bytes());
    body[9..11].copy_from_slice(&operator.area_count.to_le_bytes());
    body[11] = encode_area_radius(operator.area_radius_m);
    body[12..14].copy_from_slice(&encode_altitude(operator.area_ceiling_m).to_le_bytes());
    body[14..16].copy_from_slice(&encode_altitude(operator.area_floor_m).to_le_bytes());
    // body[16] stays zero: EU category/class undeclared
    body[17..19].copy_from_slice(&encode_altitude(operator.operator_altitude_m).to_le_bytes());
    body[19..23].copy_from_slice(&epoch_timestamp(time).to_le_bytes());
    let counter = counters.advance(MessageKind::System);
    Ok(assemble(MessageKind::System, counter, &body))
}

/// Encodes the Operator ID message
pub fn operator_id(counters: &mut MessageCounters, id: &str) -> Result<AdvertisementFrame> {
    let text = encode_text("operator ID", id, MAX_ID_BYTES)?;
    let mut body = [0u8; BODY_SIZE];
    body[0] = OPERATOR_ID_TYPE_CAA;
    body[1..21].copy_from_slice(&text);
    let counter = counters.advance(MessageKind::OperatorId);
    Ok(assemble(MessageKind::OperatorId, counter, &body))
}
