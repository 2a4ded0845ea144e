//! USB Transport layer abstraction.
//!
//! Defines the `UsbTransport` trait (device discovery) and the `UsbHandle`
//! trait (operations on one opened device), allowing different
//! implementations (libusb, mock, etc.).

use std::time::Duration;
use thiserror::Error;

use crate::protocol::DeviceIdentity;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Device not found: VID={vid:04X} PID={pid:04X}")]
    DeviceNotFound { vid: u16, pid: u16 },

    #[error("Failed to enumerate USB devices: {0}")]
    EnumerationFailed(String),

    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    #[error("Interface {interface} not present in configuration {config}")]
    InterfaceNotFound { interface: u8, config: u8 },

    #[error("Operation not supported on this platform")]
    NotSupported,

    #[error("Access denied (insufficient permissions)")]
    Access,

    #[error("Resource busy")]
    Busy,

    #[error("Endpoint stalled")]
    Pipe,

    #[error("Device disconnected")]
    Disconnected,

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Short transfer: expected {expected} bytes, got {actual}")]
    ShortTransfer { expected: usize, actual: usize },

    #[error("USB error: {0}")]
    Usb(String),
}

/// Locates the sensor among attached devices.
pub trait UsbTransport {
    type Handle: UsbHandle;

    /// Open the first attached device matching `identity`.
    fn locate(&self, identity: &DeviceIdentity) -> Result<Self::Handle, TransportError>;
}

/// Operations on one opened device.
///
/// Dropping the handle closes the device.
pub trait UsbHandle {
    /// Get the VID.
    fn vendor_id(&self) -> u16;

    /// Get the PID.
    fn product_id(&self) -> u16;

    /// One-line description for diagnostics (bus/address, ids).
    fn describe(&self) -> String;

    /// Whether a kernel driver currently owns `interface`.
    fn kernel_driver_active(&self, interface: u8) -> Result<bool, TransportError>;

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), TransportError>;

    fn attach_kernel_driver(&mut self, interface: u8) -> Result<(), TransportError>;

    fn claim_interface(&mut self, interface: u8) -> Result<(), TransportError>;

    fn release_interface(&mut self, interface: u8) -> Result<(), TransportError>;

    /// Endpoint addresses of `interface`, in descriptor order.
    fn endpoint_addresses(&mut self, interface: u8) -> Result<Vec<u8>, TransportError>;

    /// Write `data` to the OUT endpoint `endpoint`.
    fn write(&self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize, TransportError>;

    /// Read into `buf` from the IN endpoint `endpoint`.
    fn read(&self, endpoint: u8, buf: &mut [u8], timeout: Duration)
    -> Result<usize, TransportError>;
}
