//! Core types and constants for the Remote ID broadcast core
//!
//! This module contains the fundamental building blocks used throughout the library.

pub mod error;
pub mod serde;
pub mod types;

pub use self::error::{Error, Result};
pub use self::types::{
    AuthParams,
    AuthType,
    Identity,
    LocationFix,
    OperatorLocationType,
    OperatorParams,
    UartSettings,
    UaType,
    UasIdType,
};

/// Remote ID protocol version carried in the low nibble of every message header
pub const PROTOCOL_VERSION: u8 = 2;

/// Total size of one legacy advertisement AD structure in bytes
pub const MAX_ADVERTISEMENT_BYTES: usize = 31;

/// Size of one encoded Remote ID message (kind/version byte plus body)
pub const MESSAGE_SIZE: usize = 25;

/// ASTM International 16-bit service UUID carried in the AD structure
pub const ASTM_SERVICE_UUID: u16 = 0xFFFA;

/// Application code distinguishing Remote ID service data
pub const RID_APP_CODE: u8 = 0x0D;

/// Unix timestamp of the Remote ID epoch, 2019-01-01T00:00:00Z
pub const RID_EPOCH_UNIX: i64 = 1_546_300_800;

/// Maximum UAS ID / operator ID length in bytes
pub const MAX_ID_BYTES: usize = 20;

/// Maximum self-ID description length in bytes
pub const MAX_SELF_ID_BYTES: usize = 23;

/// Capacity of a three-page authentication message in bytes
pub const MAX_AUTH_BYTES: usize = 63;
