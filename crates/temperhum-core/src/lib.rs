//! temperhum-core: PCSensor TEMPerHUM USB protocol implementation in Rust.
//!
//! This crate talks to the TEMPerHUM temperature/humidity sensor (USB ID
//! `413d:2107`): it finds the device, takes interface 1 away from the kernel
//! HID driver, sends the 8-byte sample request and decodes the 8-byte answer.
//!
//! # Architecture
//!
//! The crate is organized into layers:
//!
//! - **Codec**: hex dumps and two's-complement decoding
//! - **Protocol**: Constants, device identity, raw sample layout
//! - **Reading**: Sample decoding (units, signed/unsigned policy, rounding)
//! - **Transport**: USB communication abstraction (libusb, mock)
//! - **State**: Session lifecycle and kernel driver bookkeeping
//! - **Events**: Observer pattern for UI decoupling
//! - **Session**: Open / exchange / close with guaranteed teardown
//!
//! # Example
//!
//! ```no_run
//! use temperhum_core::{DeviceIdentity, LibusbTransport, Session, SessionConfig};
//!
//! let session = Session::new(
//!     LibusbTransport::new(),
//!     DeviceIdentity::TEMPERHUM,
//!     SessionConfig::default(),
//! );
//! let sample = session.run().into_result().expect("read failed");
//! println!(
//!     "{}C {}%",
//!     sample.reading.temperature, sample.reading.humidity_percent
//! );
//! ```
//!
//! # Limitations
//!
//! With several identical sensors attached, the first one enumerated is used.

pub mod codec;
pub mod error;
pub mod events;
pub mod protocol;
pub mod reading;
pub mod session;
pub mod state;
pub mod transport;

// Re-exports for convenience
pub use codec::{hex_dump, signed_from_twos_complement};
pub use error::{SessionError, SessionErrorKind};
pub use events::{NullObserver, PacketDirection, SessionEvent, SessionObserver, TracingObserver};
pub use protocol::{DeviceIdentity, RawSample, SampleError};
pub use reading::{DecodePolicy, DecodedReading, Temperature, TemperatureUnit, decode};
pub use session::{RunOutcome, Sample, Session, SessionConfig};
pub use state::{EndpointPair, KernelDriverState, SessionState};
pub use transport::{
    LibusbTransport, MockTransport, TransportError, UsbHandle, UsbTransport,
};
