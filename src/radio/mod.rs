//! Companion radio module driver
//!
//! Drives the external BLE co-processor over its serial AT command protocol:
//! transport and power management, the request/response command engine, and
//! the bring-up sequence that puts the module into advertiser mode.

pub mod init;
pub mod link;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use self::init::InitStage;
pub use self::link::{ExchangeOutcome, LinkConfig, RadioLink};
pub use self::transport::{PowerSwitch, SerialTransport, SysfsPowerPin, Transport};

/// Unsolicited banner printed by the module after boot or restore
pub const BANNER_READY: &str = "ready";

/// Factory restore command; the module reboots after acknowledging
pub const CMD_RESTORE: &str = "AT+RESTORE";

/// Disables the module's station/AP networking role
pub const CMD_DISABLE_NETWORKING: &str = "AT+CWMODE=0";

/// Puts the module into the BLE peripheral/server role
pub const CMD_BLE_SERVER_ROLE: &str = "AT+BLEINIT=2";

/// Advertisement parameters: interval bounds, advertising type, own address
/// type, channel map (all three channels), filter policy
pub const CMD_ADV_PARAMS: &str = "AT+BLEADVPARAM=50,50,0,0,7,0";

/// Starts advertising with the configured parameters
pub const CMD_ADV_START: &str = "AT+BLEADVSTART";

/// Builds the command that replaces the active advertisement payload
pub fn set_adv_data_command(hex_payload: &str) -> String {
    format!("AT+BLEADVDATA=\"{}\"", hex_payload)
}

/// Reply validator: true once a terminal `OK` or error marker has arrived
pub fn reply_complete(data: &[u8], _elapsed: f64) -> bool {
    contains(data, b"OK") || reply_failed(data)
}

/// True when the accumulated reply contains an error marker
pub fn reply_failed(data: &[u8]) -> bool {
    contains(data, b"ERROR") || contains(data, b"Error")
}

/// Banner validator: true once the module has printed its boot banner
pub fn banner_seen(data: &[u8], _elapsed: f64) -> bool {
    contains(data, BANNER_READY.as_bytes())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
