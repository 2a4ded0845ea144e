//! Sample decoding: raw words to temperature and humidity.
//!
//! The sensor reports hundredths. Rounding to one decimal place is done on
//! exact integers (round half to even), so the result never depends on how a
//! binary float happens to represent a tie.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::signed_from_twos_complement;
use crate::protocol::RawSample;
use crate::protocol::constants::RAW_SCALE;

/// Unit the temperature is reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureUnit::Celsius => write!(f, "Celsius"),
            TemperatureUnit::Fahrenheit => write!(f, "Fahrenheit"),
        }
    }
}

/// How the temperature word is interpreted.
///
/// Earlier firmware tooling read the word as unsigned, which turns every
/// sub-zero reading into a value around 655 degrees. Later revisions decode it
/// as two's complement. Both stay selectable since they disagree whenever the
/// high bit is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    #[default]
    Signed,
    Unsigned,
}

impl DecodePolicy {
    pub fn from_signed(signed: bool) -> Self {
        if signed {
            DecodePolicy::Signed
        } else {
            DecodePolicy::Unsigned
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, DecodePolicy::Signed)
    }

    /// Temperature in hundredths of a degree Celsius.
    fn hundredths(&self, word: u16) -> i64 {
        match self {
            DecodePolicy::Signed => signed_from_twos_complement(u32::from(word), 16),
            DecodePolicy::Unsigned => i64::from(word),
        }
    }
}

impl fmt::Display for DecodePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodePolicy::Signed => write!(f, "signed"),
            DecodePolicy::Unsigned => write!(f, "unsigned"),
        }
    }
}

/// Temperature rounded to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temperature {
    tenths: i32,
    unit: TemperatureUnit,
}

impl Temperature {
    pub fn from_tenths(tenths: i32, unit: TemperatureUnit) -> Self {
        Self { tenths, unit }
    }

    pub fn tenths(&self) -> i32 {
        self.tenths
    }

    pub fn value(&self) -> f64 {
        f64::from(self.tenths) / 10.0
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }
}

/// Value only; the unit symbol is left to the caller.
impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.tenths < 0 { "-" } else { "" };
        let abs = self.tenths.unsigned_abs();
        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
    }
}

/// A decoded reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedReading {
    pub temperature: Temperature,
    pub humidity_percent: u16,
}

/// Decode a raw response.
pub fn decode(raw: &RawSample, unit: TemperatureUnit, policy: DecodePolicy) -> DecodedReading {
    let hundredths = policy.hundredths(raw.temperature_word());

    let tenths = match unit {
        TemperatureUnit::Celsius => round_half_even_div(hundredths, RAW_SCALE / 10),
        // F * 10 = (h / 100 * 9 / 5 + 32) * 10 = (9h + 16000) / 50
        TemperatureUnit::Fahrenheit => round_half_even_div(9 * hundredths + 160 * RAW_SCALE, 50),
    };

    DecodedReading {
        // |tenths| < 13_000 for any 16-bit word
        temperature: Temperature::from_tenths(tenths as i32, unit),
        humidity_percent: raw.humidity_word() / RAW_SCALE as u16,
    }
}

/// `num / den` rounded to the nearest integer, ties to even. `den` must be positive.
fn round_half_even_div(num: i64, den: i64) -> i64 {
    let q = num.div_euclid(den);
    let r = num.rem_euclid(den);
    match (2 * r).cmp(&den) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => q + (q & 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(temp: u16, humidity: u16) -> RawSample {
        let t = temp.to_be_bytes();
        let h = humidity.to_be_bytes();
        RawSample::new([0x80, 0x40, t[0], t[1], h[0], h[1], 0x00, 0x00])
    }

    fn celsius(temp: u16, policy: DecodePolicy) -> String {
        decode(&sample(temp, 0), TemperatureUnit::Celsius, policy)
            .temperature
            .to_string()
    }

    fn fahrenheit(temp: u16, policy: DecodePolicy) -> String {
        decode(&sample(temp, 0), TemperatureUnit::Fahrenheit, policy)
            .temperature
            .to_string()
    }

    #[test]
    fn test_room_temperature_example() {
        let raw = RawSample::new([0x00, 0x00, 0x09, 0xC4, 0x0E, 0x74, 0x00, 0x00]);
        let reading = decode(&raw, TemperatureUnit::Celsius, DecodePolicy::Unsigned);
        assert_eq!(reading.temperature.tenths(), 250);
        assert_eq!(reading.temperature.to_string(), "25.0");
        assert_eq!(reading.temperature.unit(), TemperatureUnit::Celsius);
        assert_eq!(reading.humidity_percent, 37);

        let signed = decode(&raw, TemperatureUnit::Celsius, DecodePolicy::Signed);
        assert_eq!(signed, reading);
    }

    #[test]
    fn test_policies_agree_without_high_bit() {
        for word in [0u16, 1, 999, 2500, 0x7FFF] {
            assert_eq!(
                celsius(word, DecodePolicy::Signed),
                celsius(word, DecodePolicy::Unsigned)
            );
        }
    }

    #[test]
    fn test_policies_diverge_with_high_bit() {
        // 0xFF9C = -100 hundredths
        assert_eq!(celsius(0xFF9C, DecodePolicy::Signed), "-1.0");
        assert_eq!(celsius(0xFF9C, DecodePolicy::Unsigned), "654.4");

        // -0.01 rounds to zero; 655.35 is a tie that goes to the even digit
        assert_eq!(celsius(0xFFFF, DecodePolicy::Signed), "0.0");
        assert_eq!(celsius(0xFFFF, DecodePolicy::Unsigned), "655.4");

        assert_eq!(celsius(0x8000, DecodePolicy::Signed), "-327.7");
        assert_eq!(celsius(0x8000, DecodePolicy::Unsigned), "327.7");
    }

    #[test]
    fn test_small_negatives_print_without_sign() {
        // -0.01, -0.04 and the -0.05 tie all round to zero tenths
        for word in [0xFFFFu16, 0xFFFC, 0xFFFB] {
            let reading = decode(&sample(word, 0), TemperatureUnit::Celsius, DecodePolicy::Signed);
            assert_eq!(reading.temperature.tenths(), 0);
            assert_eq!(reading.temperature.to_string(), "0.0");
        }
        // -0.06 is the first word that reaches -0.1
        assert_eq!(celsius(0xFFFA, DecodePolicy::Signed), "-0.1");
    }

    #[test]
    fn test_celsius_rounds_half_to_even() {
        assert_eq!(celsius(2504, DecodePolicy::Signed), "25.0");
        assert_eq!(celsius(2505, DecodePolicy::Signed), "25.0");
        assert_eq!(celsius(2506, DecodePolicy::Signed), "25.1");
        assert_eq!(celsius(2515, DecodePolicy::Signed), "25.2");
        // -1.05 -> -1.0, -1.15 -> -1.2
        assert_eq!(celsius(-105i16 as u16, DecodePolicy::Signed), "-1.0");
        assert_eq!(celsius(-115i16 as u16, DecodePolicy::Signed), "-1.2");
        assert_eq!(celsius(-101i16 as u16, DecodePolicy::Signed), "-1.0");
    }

    #[test]
    fn test_fahrenheit_conversion() {
        assert_eq!(fahrenheit(2500, DecodePolicy::Signed), "77.0");
        assert_eq!(fahrenheit(0, DecodePolicy::Signed), "32.0");
        assert_eq!(fahrenheit(10000, DecodePolicy::Signed), "212.0");
        assert_eq!(fahrenheit(-4000i16 as u16, DecodePolicy::Signed), "-40.0");
        // 25.05 C = 77.09 F, converted before rounding
        assert_eq!(fahrenheit(2505, DecodePolicy::Signed), "77.1");
        // 0.25 C = 32.45 F, tie to even
        assert_eq!(fahrenheit(25, DecodePolicy::Signed), "32.4");
    }

    #[test]
    fn test_fahrenheit_monotonic() {
        let mut last = i32::MIN;
        for word in (0u16..=0x7FFF).step_by(7) {
            let tenths = decode(&sample(word, 0), TemperatureUnit::Fahrenheit, DecodePolicy::Signed)
                .temperature
                .tenths();
            assert!(tenths >= last, "not monotonic at word {word}");
            last = tenths;
        }
    }

    #[test]
    fn test_humidity_truncates() {
        let reading = decode(&sample(0, 12345), TemperatureUnit::Celsius, DecodePolicy::Signed);
        assert_eq!(reading.humidity_percent, 123);

        let reading = decode(&sample(0, 9999), TemperatureUnit::Celsius, DecodePolicy::Signed);
        assert_eq!(reading.humidity_percent, 99);

        let reading = decode(&sample(0, 0xFFFF), TemperatureUnit::Celsius, DecodePolicy::Signed);
        assert_eq!(reading.humidity_percent, 655);
    }

    #[test]
    fn test_humidity_independent_of_unit() {
        let raw = sample(2500, 4567);
        let c = decode(&raw, TemperatureUnit::Celsius, DecodePolicy::Signed);
        let f = decode(&raw, TemperatureUnit::Fahrenheit, DecodePolicy::Signed);
        assert_eq!(c.humidity_percent, 45);
        assert_eq!(f.humidity_percent, 45);
    }

    #[test]
    fn test_temperature_value() {
        let t = Temperature::from_tenths(-15, TemperatureUnit::Celsius);
        assert_eq!(t.to_string(), "-1.5");
        assert!((t.value() + 1.5).abs() < f64::EPSILON);

        let t = Temperature::from_tenths(-5, TemperatureUnit::Celsius);
        assert_eq!(t.to_string(), "-0.5");
    }

    #[test]
    fn test_policy_from_signed() {
        assert_eq!(DecodePolicy::from_signed(true), DecodePolicy::Signed);
        assert_eq!(DecodePolicy::from_signed(false), DecodePolicy::Unsigned);
        assert!(DecodePolicy::default().is_signed());
    }
}
