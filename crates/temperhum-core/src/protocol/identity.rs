//! Device identity used for discovery.

use std::fmt;

use super::constants::{TEMPERHUM_INTERFACE, TEMPERHUM_PRODUCT_ID, TEMPERHUM_VENDOR_ID};

/// Identifies the supported hardware variant and the interface to claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface_number: u8,
}

impl DeviceIdentity {
    /// PCSensor TEMPerHUM, interface 1.
    pub const TEMPERHUM: Self = Self {
        vendor_id: TEMPERHUM_VENDOR_ID,
        product_id: TEMPERHUM_PRODUCT_ID,
        interface_number: TEMPERHUM_INTERFACE,
    };

    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self::TEMPERHUM
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_lsusb_id() {
        assert_eq!(DeviceIdentity::TEMPERHUM.to_string(), "413d:2107");
    }

    #[test]
    fn test_matches() {
        let id = DeviceIdentity::default();
        assert!(id.matches(0x413D, 0x2107));
        assert!(!id.matches(0x413D, 0x2108));
        assert!(!id.matches(0x0C45, 0x2107));
        assert_eq!(id.interface_number, 1);
    }
}
