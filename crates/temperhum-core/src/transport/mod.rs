//! Transport layer module.

pub mod libusb;
pub mod mock;
pub mod traits;

pub use libusb::{LibusbHandle, LibusbTransport};
pub use mock::{MockCall, MockHandle, MockStep, MockTransport};
pub use traits::{TransportError, UsbHandle, UsbTransport};
