//! Raw response buffer returned by the sensor.

use byteorder::{BigEndian, ByteOrder};
use std::fmt;
use thiserror::Error;

use super::constants::{HUMIDITY_OFFSET, SAMPLE_LEN, TEMPERATURE_OFFSET};
use crate::codec::hex_dump;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SampleError {
    #[error("Invalid sample length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// 8-byte response to a sample request.
///
/// Layout (big-endian words):
///
/// | Offset | Meaning                     |
/// |--------|-----------------------------|
/// | 0..2   | reserved                    |
/// | 2..4   | temperature, 1/100 degree C |
/// | 4..6   | humidity, 1/100 percent     |
/// | 6..8   | reserved                    |
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample([u8; SAMPLE_LEN]);

impl RawSample {
    pub const SIZE: usize = SAMPLE_LEN;

    pub fn new(bytes: [u8; SAMPLE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, SampleError> {
        let bytes: [u8; SAMPLE_LEN] =
            data.try_into().map_err(|_| SampleError::InvalidLength {
                expected: SAMPLE_LEN,
                actual: data.len(),
            })?;
        Ok(Self(bytes))
    }

    /// Temperature word, unsigned.
    pub fn temperature_word(&self) -> u16 {
        BigEndian::read_u16(&self.0[TEMPERATURE_OFFSET..TEMPERATURE_OFFSET + 2])
    }

    /// Humidity word, unsigned.
    pub fn humidity_word(&self) -> u16 {
        BigEndian::read_u16(&self.0[HUMIDITY_OFFSET..HUMIDITY_OFFSET + 2])
    }

    pub fn as_bytes(&self) -> &[u8; SAMPLE_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex_dump(&self.0)
    }
}

impl fmt::Debug for RawSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawSample({})", self.to_hex())
    }
}

impl fmt::Display for RawSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
