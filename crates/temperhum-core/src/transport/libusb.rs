//! rusb (libusb) based USB transport implementation.
//!
//! Key rusb patterns used here:
//! - `rusb::devices()` for enumeration, `device.open()` for a handle
//! - `kernel_driver_active` / `detach_kernel_driver` / `attach_kernel_driver`
//!   are Linux-only in libusb and report `NotSupported` elsewhere
//! - endpoints come from `device.config_descriptor(index)`, so they can be
//!   listed before the interface becomes the active alternate setting

use std::collections::HashMap;
use std::time::Duration;

use rusb::{Device, DeviceHandle, GlobalContext, TransferType};
use tracing::{debug, info, instrument};

use super::traits::{TransportError, UsbHandle, UsbTransport};
use crate::protocol::DeviceIdentity;
use crate::protocol::constants::{TEMPERHUM_ALT_SETTING, TEMPERHUM_CONFIG_INDEX};

/// libusb-backed transport using the global context.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibusbTransport;

impl LibusbTransport {
    pub fn new() -> Self {
        Self
    }
}

impl UsbTransport for LibusbTransport {
    type Handle = LibusbHandle;

    #[instrument(level = "info", skip(self), fields(id = %identity))]
    fn locate(&self, identity: &DeviceIdentity) -> Result<LibusbHandle, TransportError> {
        let devices =
            rusb::devices().map_err(|e| TransportError::EnumerationFailed(e.to_string()))?;

        // First match wins; identical sensors are not told apart.
        let device = devices
            .iter()
            .find(|d| {
                d.device_descriptor()
                    .map(|desc| identity.matches(desc.vendor_id(), desc.product_id()))
                    .unwrap_or(false)
            })
            .ok_or_else(|| {
                debug!("No suitable device found");
                TransportError::DeviceNotFound {
                    vid: identity.vendor_id,
                    pid: identity.product_id,
                }
            })?;

        info!(
            bus = device.bus_number(),
            address = device.address(),
            "Found device"
        );

        let handle = device
            .open()
            .map_err(|e| TransportError::OpenFailed(e.to_string()))?;

        Ok(LibusbHandle {
            device,
            handle,
            vid: identity.vendor_id,
            pid: identity.product_id,
            transfer_types: HashMap::new(),
        })
    }
}

/// An opened libusb device.
pub struct LibusbHandle {
    device: Device<GlobalContext>,
    handle: DeviceHandle<GlobalContext>,
    vid: u16,
    pid: u16,
    /// Transfer type per endpoint address, filled by `endpoint_addresses`.
    transfer_types: HashMap<u8, TransferType>,
}

impl LibusbHandle {
    fn transfer_type(&self, endpoint: u8) -> TransferType {
        self.transfer_types
            .get(&endpoint)
            .copied()
            .unwrap_or(TransferType::Bulk)
    }
}

impl UsbHandle for LibusbHandle {
    fn vendor_id(&self) -> u16 {
        self.vid
    }

    fn product_id(&self) -> u16 {
        self.pid
    }

    fn describe(&self) -> String {
        format!(
            "Bus {:03} Device {:03}: ID {:04x}:{:04x}",
            self.device.bus_number(),
            self.device.address(),
            self.vid,
            self.pid
        )
    }

    fn kernel_driver_active(&self, interface: u8) -> Result<bool, TransportError> {
        self.handle
            .kernel_driver_active(interface)
            .map_err(|e| map_rusb_error(e, 0))
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), TransportError> {
        self.handle
            .detach_kernel_driver(interface)
            .map_err(|e| map_rusb_error(e, 0))
    }

    fn attach_kernel_driver(&mut self, interface: u8) -> Result<(), TransportError> {
        self.handle
            .attach_kernel_driver(interface)
            .map_err(|e| map_rusb_error(e, 0))
    }

    fn claim_interface(&mut self, interface: u8) -> Result<(), TransportError> {
        self.handle
            .claim_interface(interface)
            .map_err(|e| map_rusb_error(e, 0))
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), TransportError> {
        self.handle
            .release_interface(interface)
            .map_err(|e| map_rusb_error(e, 0))
    }

    fn endpoint_addresses(&mut self, interface: u8) -> Result<Vec<u8>, TransportError> {
        let config = self
            .device
            .config_descriptor(TEMPERHUM_CONFIG_INDEX)
            .map_err(|e| map_rusb_error(e, 0))?;

        let alt = config
            .interfaces()
            .filter(|iface| iface.number() == interface)
            .flat_map(|iface| iface.descriptors())
            .find(|desc| desc.setting_number() == TEMPERHUM_ALT_SETTING)
            .ok_or(TransportError::InterfaceNotFound {
                interface,
                config: TEMPERHUM_CONFIG_INDEX,
            })?;

        let mut addresses = Vec::new();
        for ep in alt.endpoint_descriptors() {
            debug!(
                address = %format!("0x{:02x}", ep.address()),
                transfer_type = ?ep.transfer_type(),
                max_packet_size = ep.max_packet_size(),
                "Endpoint"
            );
            self.transfer_types.insert(ep.address(), ep.transfer_type());
            addresses.push(ep.address());
        }

        Ok(addresses)
    }

    #[instrument(skip(self, data, timeout), fields(endpoint = %format!("0x{:02x}", endpoint), len = data.len()))]
    fn write(&self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize, TransportError> {
        let timeout_ms = timeout.as_millis() as u64;
        let n = match self.transfer_type(endpoint) {
            TransferType::Interrupt => self.handle.write_interrupt(endpoint, data, timeout),
            _ => self.handle.write_bulk(endpoint, data, timeout),
        }
        .map_err(|e| map_rusb_error(e, timeout_ms))?;

        debug!(bytes_written = n, "Write complete");
        Ok(n)
    }

    #[instrument(skip(self, buf, timeout), fields(endpoint = %format!("0x{:02x}", endpoint), max_len = buf.len()))]
    fn read(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, TransportError> {
        let timeout_ms = timeout.as_millis() as u64;
        let n = match self.transfer_type(endpoint) {
            TransferType::Interrupt => self.handle.read_interrupt(endpoint, buf, timeout),
            _ => self.handle.read_bulk(endpoint, buf, timeout),
        }
        .map_err(|e| map_rusb_error(e, timeout_ms))?;

        debug!(bytes_read = n, "Read complete");
        Ok(n)
    }
}

/// Map rusb errors onto transport errors.
pub fn map_rusb_error(err: rusb::Error, timeout_ms: u64) -> TransportError {
    match err {
        rusb::Error::Timeout => TransportError::Timeout { timeout_ms },
        rusb::Error::Pipe => TransportError::Pipe,
        rusb::Error::NoDevice => TransportError::Disconnected,
        rusb::Error::Busy => TransportError::Busy,
        rusb::Error::Access => TransportError::Access,
        rusb::Error::NotSupported => TransportError::NotSupported,
        rusb::Error::NotFound => TransportError::Usb("entity not found".into()),
        _ => TransportError::Usb(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_rusb_error() {
        assert_eq!(
            map_rusb_error(rusb::Error::Timeout, 5000),
            TransportError::Timeout { timeout_ms: 5000 }
        );
        assert_eq!(map_rusb_error(rusb::Error::Pipe, 0), TransportError::Pipe);
        assert_eq!(
            map_rusb_error(rusb::Error::NoDevice, 0),
            TransportError::Disconnected
        );
        assert_eq!(map_rusb_error(rusb::Error::Busy, 0), TransportError::Busy);
        assert_eq!(
            map_rusb_error(rusb::Error::NotSupported, 0),
            TransportError::NotSupported
        );
        assert!(matches!(
            map_rusb_error(rusb::Error::Overflow, 0),
            TransportError::Usb(_)
        ));
    }
}
