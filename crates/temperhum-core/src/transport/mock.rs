//! Mock USB transport for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::traits::{TransportError, UsbHandle, UsbTransport};
use crate::protocol::DeviceIdentity;

/// Operations a mock device can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockStep {
    Locate,
    QueryDriver,
    Detach,
    Claim,
    Endpoints,
    Write,
    Read,
    Release,
    Attach,
}

/// Calls recorded by the mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Locate,
    QueryDriver(u8),
    Detach(u8),
    Attach(u8),
    Claim(u8),
    Release(u8),
    Endpoints(u8),
    Write { endpoint: u8, data: Vec<u8> },
    Read { endpoint: u8, max_len: usize },
    Close,
}

#[derive(Debug)]
struct MockState {
    vid: u16,
    pid: u16,
    present: bool,
    driver_attached: bool,
    endpoints: Vec<u8>,
    responses: VecDeque<Vec<u8>>,
    failures: HashMap<MockStep, TransportError>,
    calls: Vec<MockCall>,
}

/// Mock transport for unit testing session logic.
///
/// Clones share state, so a test can keep one copy to inspect the call log
/// after the session that owned the other copy is gone.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// A present TEMPerHUM with no kernel driver and endpoints `0x82`/`0x02`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                vid: DeviceIdentity::TEMPERHUM.vendor_id,
                pid: DeviceIdentity::TEMPERHUM.product_id,
                present: true,
                driver_attached: false,
                endpoints: vec![0x82, 0x02],
                responses: VecDeque::new(),
                failures: HashMap::new(),
                calls: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Simulate no device attached.
    pub fn unplug(&self) {
        self.lock().present = false;
    }

    /// Set VID/PID the simulated device reports.
    pub fn set_ids(&self, vid: u16, pid: u16) {
        let mut state = self.lock();
        state.vid = vid;
        state.pid = pid;
    }

    /// Whether a kernel driver owns the interface.
    pub fn set_kernel_driver(&self, attached: bool) {
        self.lock().driver_attached = attached;
    }

    pub fn kernel_driver_attached(&self) -> bool {
        self.lock().driver_attached
    }

    /// Replace the endpoint list of the sensor interface.
    pub fn set_endpoints(&self, endpoints: &[u8]) {
        self.lock().endpoints = endpoints.to_vec();
    }

    /// Queue a response to be returned on next read.
    pub fn queue_response(&self, bytes: &[u8]) {
        self.lock().responses.push_back(bytes.to_vec());
    }

    /// Make `step` fail from now on.
    pub fn fail(&self, step: MockStep) {
        self.fail_with(step, TransportError::Usb(format!("injected {step:?} failure")));
    }

    /// Make `step` fail with a specific error.
    pub fn fail_with(&self, step: MockStep, error: TransportError) {
        self.lock().failures.insert(step, error);
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Get all captured writes.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MockCall::Write { data, .. } => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn called(&self, call: &MockCall) -> bool {
        self.lock().calls.contains(call)
    }

    /// Record `call`, then fail if `step` was armed.
    fn record(&self, call: MockCall, step: MockStep) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.calls.push(call);
        match state.failures.get(&step) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbTransport for MockTransport {
    type Handle = MockHandle;

    fn locate(&self, identity: &DeviceIdentity) -> Result<MockHandle, TransportError> {
        self.record(MockCall::Locate, MockStep::Locate)?;
        let state = self.lock();
        if !state.present || !identity.matches(state.vid, state.pid) {
            return Err(TransportError::DeviceNotFound {
                vid: identity.vendor_id,
                pid: identity.product_id,
            });
        }
        Ok(MockHandle {
            mock: self.clone(),
        })
    }
}

/// Handle onto a `MockTransport` device.
#[derive(Debug)]
pub struct MockHandle {
    mock: MockTransport,
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.mock.lock().calls.push(MockCall::Close);
    }
}

impl UsbHandle for MockHandle {
    fn vendor_id(&self) -> u16 {
        self.mock.lock().vid
    }

    fn product_id(&self) -> u16 {
        self.mock.lock().pid
    }

    fn describe(&self) -> String {
        let state = self.mock.lock();
        format!("Mock device: ID {:04x}:{:04x}", state.vid, state.pid)
    }

    fn kernel_driver_active(&self, interface: u8) -> Result<bool, TransportError> {
        self.mock
            .record(MockCall::QueryDriver(interface), MockStep::QueryDriver)?;
        Ok(self.mock.kernel_driver_attached())
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), TransportError> {
        self.mock
            .record(MockCall::Detach(interface), MockStep::Detach)?;
        self.mock.set_kernel_driver(false);
        Ok(())
    }

    fn attach_kernel_driver(&mut self, interface: u8) -> Result<(), TransportError> {
        self.mock
            .record(MockCall::Attach(interface), MockStep::Attach)?;
        self.mock.set_kernel_driver(true);
        Ok(())
    }

    fn claim_interface(&mut self, interface: u8) -> Result<(), TransportError> {
        self.mock.record(MockCall::Claim(interface), MockStep::Claim)?;
        if self.mock.kernel_driver_attached() {
            return Err(TransportError::Busy);
        }
        Ok(())
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), TransportError> {
        self.mock
            .record(MockCall::Release(interface), MockStep::Release)
    }

    fn endpoint_addresses(&mut self, interface: u8) -> Result<Vec<u8>, TransportError> {
        self.mock
            .record(MockCall::Endpoints(interface), MockStep::Endpoints)?;
        Ok(self.mock.lock().endpoints.clone())
    }

    fn write(&self, endpoint: u8, data: &[u8], _timeout: Duration) -> Result<usize, TransportError> {
        self.mock.record(
            MockCall::Write {
                endpoint,
                data: data.to_vec(),
            },
            MockStep::Write,
        )?;
        Ok(data.len())
    }

    fn read(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, TransportError> {
        self.mock.record(
            MockCall::Read {
                endpoint,
                max_len: buf.len(),
            },
            MockStep::Read,
        )?;
        let response = self
            .mock
            .lock()
            .responses
            .pop_front()
            .ok_or(TransportError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            })?;
        let n = response.len().min(buf.len());
        buf[..n].copy_from_slice(&response[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_response_queue() {
        let mock = MockTransport::new();
        mock.queue_response(&[1, 2, 3]);

        let handle = mock.locate(&DeviceIdentity::TEMPERHUM).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(handle.read(0x82, &mut buf, Duration::from_millis(10)).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);

        // Queue is empty now
        assert_eq!(
            handle.read(0x82, &mut buf, Duration::from_millis(10)),
            Err(TransportError::Timeout { timeout_ms: 10 })
        );
    }

    #[test]
    fn test_mock_write_capture() {
        let mock = MockTransport::new();
        let handle = mock.locate(&DeviceIdentity::TEMPERHUM).unwrap();
        handle.write(0x02, b"Hello", Duration::ZERO).unwrap();
        handle.write(0x02, b"World", Duration::ZERO).unwrap();

        let writes = mock.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], b"Hello");
        assert_eq!(writes[1], b"World");
    }

    #[test]
    fn test_mock_unplugged() {
        let mock = MockTransport::new();
        mock.unplug();
        assert!(matches!(
            mock.locate(&DeviceIdentity::TEMPERHUM),
            Err(TransportError::DeviceNotFound { .. })
        ));
    }

    #[test]
    fn test_mock_wrong_ids() {
        let mock = MockTransport::new();
        mock.set_ids(0x0C45, 0x7401);
        assert!(mock.locate(&DeviceIdentity::TEMPERHUM).is_err());
    }

    #[test]
    fn test_mock_injected_failure_is_recorded() {
        let mock = MockTransport::new();
        mock.fail(MockStep::Claim);
        let mut handle = mock.locate(&DeviceIdentity::TEMPERHUM).unwrap();
        assert!(handle.claim_interface(1).is_err());
        assert!(mock.called(&MockCall::Claim(1)));
    }

    #[test]
    fn test_mock_claim_refused_while_driver_attached() {
        let mock = MockTransport::new();
        mock.set_kernel_driver(true);
        let mut handle = mock.locate(&DeviceIdentity::TEMPERHUM).unwrap();
        assert_eq!(handle.claim_interface(1), Err(TransportError::Busy));
        handle.detach_kernel_driver(1).unwrap();
        assert!(handle.claim_interface(1).is_ok());
    }

    #[test]
    fn test_mock_close_on_drop() {
        let mock = MockTransport::new();
        let handle = mock.locate(&DeviceIdentity::TEMPERHUM).unwrap();
        drop(handle);
        assert_eq!(mock.calls(), vec![MockCall::Locate, MockCall::Close]);
    }
}
