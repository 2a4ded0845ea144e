//! Protocol constants for the PCSensor TEMPerHUM.

// ============================================================================
// Device Identification
// ============================================================================

/// PCSensor Vendor ID
pub const TEMPERHUM_VENDOR_ID: u16 = 0x413D;

/// TEMPerHUM Product ID
pub const TEMPERHUM_PRODUCT_ID: u16 = 0x2107;

/// Interface carrying the sensor endpoints
pub const TEMPERHUM_INTERFACE: u8 = 1;

/// Configuration index the endpoints are read from.
pub const TEMPERHUM_CONFIG_INDEX: u8 = 0;

/// Alternate setting the endpoints are read from.
pub const TEMPERHUM_ALT_SETTING: u8 = 0;

// ============================================================================
// Exchange
// ============================================================================

/// Request for a temperature/humidity sample (Host -> Device)
pub const READ_SAMPLE_REQUEST: [u8; 8] = [0x01, 0x80, 0x33, 0x01, 0x00, 0x00, 0x00, 0x00];

/// Response length (Device -> Host)
pub const SAMPLE_LEN: usize = 8;

/// Offset of the big-endian temperature word in a response.
pub const TEMPERATURE_OFFSET: usize = 2;

/// Offset of the big-endian humidity word in a response.
pub const HUMIDITY_OFFSET: usize = 4;

/// Raw words are hundredths of a degree / percent.
pub const RAW_SCALE: i64 = 100;

/// Default per-transfer timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Longest accepted per-transfer timeout. libusb takes an unsigned int of
/// milliseconds and reads 0 as "no timeout", so 0 is rejected too.
pub const MAX_TIMEOUT_MS: u64 = u32::MAX as u64;
