//! Protocol module - TEMPerHUM wire definitions.

pub mod constants;
pub mod identity;
pub mod sample;

pub use constants::*;
pub use identity::DeviceIdentity;
pub use sample::{RawSample, SampleError};
