//! Sensor session - owns one claimed interface for one exchange.
//!
//! The lifecycle is linear:
//! `Closed -> Located -> DriverResolved -> InterfaceClaimed -> Exchanged -> Released -> Closed`.
//! Every acquisition (open handle, detached driver, claimed interface) is
//! recorded as it happens, so `close()` undoes exactly what was taken no
//! matter which step failed. Dropping a session that still holds a device
//! runs the same teardown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::SessionError;
use crate::events::{PacketDirection, SessionEvent, SessionObserver, TracingObserver};
use crate::protocol::constants::{
    DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS, READ_SAMPLE_REQUEST, SAMPLE_LEN,
};
use crate::protocol::{DeviceIdentity, RawSample};
use crate::reading::{DecodePolicy, DecodedReading, TemperatureUnit, decode};
use crate::state::{EndpointPair, KernelDriverState, Lifecycle, SessionState};
use crate::transport::{TransportError, UsbHandle, UsbTransport};

/// Configuration for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Unit readings are reported in.
    pub unit: TemperatureUnit,
    /// Temperature word interpretation used by `Session::run`.
    pub policy: DecodePolicy,
    /// Hand the interface back to the kernel driver on close.
    pub force_reattach: bool,
    /// Per-transfer timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            unit: TemperatureUnit::default(),
            policy: DecodePolicy::default(),
            force_reattach: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl SessionConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SessionConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check values the transport cannot honour.
    ///
    /// The timeout must be bounded: 1 ..= `MAX_TIMEOUT_MS`.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            bail!(
                "timeout_ms must be between 1 and {}, got {}",
                MAX_TIMEOUT_MS,
                self.timeout_ms
            );
        }
        Ok(())
    }

    /// Per-transfer timeout, clamped into the bounded range even when
    /// `validate` was skipped.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.clamp(1, MAX_TIMEOUT_MS))
    }
}

/// Raw response together with its decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub raw: RawSample,
    pub reading: DecodedReading,
}

/// Result of `Session::run`: the exchange and the teardown, reported apart.
#[derive(Debug)]
pub struct RunOutcome {
    pub sample: Result<Sample, SessionError>,
    pub teardown: Result<(), SessionError>,
}

impl RunOutcome {
    /// Collapse into one result; an exchange error wins over a teardown error.
    pub fn into_result(self) -> Result<Sample, SessionError> {
        let sample = self.sample?;
        self.teardown?;
        Ok(sample)
    }
}

fn invalid(expected: SessionState, actual: SessionState) -> SessionError {
    SessionError::InvalidState { expected, actual }
}

/// Session with one TEMPerHUM device.
pub struct Session<T: UsbTransport, O: SessionObserver = TracingObserver> {
    transport: T,
    identity: DeviceIdentity,
    config: SessionConfig,
    observer: Arc<O>,
    handle: Option<T::Handle>,
    lifecycle: Lifecycle,
}

impl<T: UsbTransport> Session<T, TracingObserver> {
    /// Create a new session with default tracing observer.
    pub fn new(transport: T, identity: DeviceIdentity, config: SessionConfig) -> Self {
        Self::with_observer(transport, identity, config, Arc::new(TracingObserver))
    }
}

impl<T: UsbTransport, O: SessionObserver> Session<T, O> {
    /// Create a new session with a custom observer.
    pub fn with_observer(
        transport: T,
        identity: DeviceIdentity,
        config: SessionConfig,
        observer: Arc<O>,
    ) -> Self {
        Self {
            transport,
            identity,
            config,
            observer,
            handle: None,
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state
    }

    pub fn driver_state(&self) -> KernelDriverState {
        self.lifecycle.driver
    }

    pub fn endpoints(&self) -> Option<EndpointPair> {
        self.lifecycle.endpoints
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open, read one sample with the configured policy, close.
    pub fn run(mut self) -> RunOutcome {
        let policy = self.config.policy;
        let sample = self.open().and_then(|()| self.read_sample(policy));
        let teardown = self.close();
        RunOutcome { sample, teardown }
    }

    /// Locate the device, detach a kernel driver if one owns the interface,
    /// claim it and resolve its endpoints.
    ///
    /// On failure the session keeps what it acquired; call `close()`.
    #[instrument(skip(self), fields(id = %self.identity))]
    pub fn open(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Closed)?;
        self.locate()?;
        self.resolve_driver()?;
        self.claim_interface()?;
        Ok(())
    }

    fn locate(&mut self) -> Result<(), SessionError> {
        let handle = self
            .transport
            .locate(&self.identity)
            .map_err(|source| SessionError::DeviceNotFound {
                identity: self.identity,
                source,
            })?;

        self.observer.on_event(&SessionEvent::DeviceFound {
            vid: handle.vendor_id(),
            pid: handle.product_id(),
            description: handle.describe(),
        });
        self.handle = Some(handle);
        self.transition(SessionState::Located);
        Ok(())
    }

    fn resolve_driver(&mut self) -> Result<(), SessionError> {
        let interface = self.identity.interface_number;
        let handle = self
            .handle
            .as_mut()
            .ok_or(invalid(SessionState::Located, self.lifecycle.state))?;

        let active = match handle.kernel_driver_active(interface) {
            Ok(active) => active,
            Err(TransportError::NotSupported) => {
                debug!(interface, "Kernel driver state not available on this platform");
                false
            }
            Err(source) => return Err(SessionError::DriverDetachFailed { interface, source }),
        };

        if active {
            handle
                .detach_kernel_driver(interface)
                .map_err(|source| SessionError::DriverDetachFailed { interface, source })?;
            self.lifecycle.driver = KernelDriverState::DetachedByUs;
            self.observer.on_event(&SessionEvent::KernelDriverDetached {
                interface,
                reattach_on_close: self.config.force_reattach,
            });
        } else {
            debug!(interface, "No kernel driver attached");
            self.lifecycle.driver = KernelDriverState::NeverAttached;
        }

        self.transition(SessionState::DriverResolved);
        Ok(())
    }

    fn claim_interface(&mut self) -> Result<(), SessionError> {
        let interface = self.identity.interface_number;
        let handle = self
            .handle
            .as_mut()
            .ok_or(invalid(SessionState::DriverResolved, self.lifecycle.state))?;

        handle
            .claim_interface(interface)
            .map_err(|source| SessionError::InterfaceClaimFailed { interface, source })?;
        self.lifecycle.interface_claimed = true;
        self.observer
            .on_event(&SessionEvent::InterfaceClaimed { interface });

        let addresses = handle.endpoint_addresses(interface).map_err(|e| {
            SessionError::EndpointResolutionFailed {
                interface,
                reason: e.to_string(),
            }
        })?;
        let endpoints = EndpointPair::from_positional(&addresses).ok_or_else(|| {
            SessionError::EndpointResolutionFailed {
                interface,
                reason: format!("found {} endpoint(s), need 2", addresses.len()),
            }
        })?;

        self.lifecycle.endpoints = Some(endpoints);
        self.observer
            .on_event(&SessionEvent::EndpointsResolved(endpoints));
        self.transition(SessionState::InterfaceClaimed);
        Ok(())
    }

    /// Send the sample request and read the 8-byte response.
    ///
    /// A session performs one exchange; the slot is spent even if it fails.
    #[instrument(skip(self))]
    pub fn exchange(&mut self) -> Result<RawSample, SessionError> {
        self.expect_state(SessionState::InterfaceClaimed)?;
        let endpoints = self
            .lifecycle
            .endpoints
            .ok_or(invalid(SessionState::InterfaceClaimed, self.lifecycle.state))?;
        self.transition(SessionState::Exchanged);

        let timeout = self.config.timeout();
        let handle = self
            .handle
            .as_ref()
            .ok_or(invalid(SessionState::InterfaceClaimed, self.lifecycle.state))?;

        let endpoint = endpoints.write_address;
        let written = handle
            .write(endpoint, &READ_SAMPLE_REQUEST, timeout)
            .map_err(|source| SessionError::RequestWriteFailed { endpoint, source })?;
        if written != READ_SAMPLE_REQUEST.len() {
            return Err(SessionError::RequestWriteFailed {
                endpoint,
                source: TransportError::ShortTransfer {
                    expected: READ_SAMPLE_REQUEST.len(),
                    actual: written,
                },
            });
        }
        self.observer.on_event(&SessionEvent::Packet {
            direction: PacketDirection::Tx,
            endpoint,
            data: READ_SAMPLE_REQUEST.to_vec(),
        });

        let endpoint = endpoints.read_address;
        let mut buf = [0u8; SAMPLE_LEN];
        let n = handle
            .read(endpoint, &mut buf, timeout)
            .map_err(|source| SessionError::ResponseReadFailed { endpoint, source })?;
        self.observer.on_event(&SessionEvent::Packet {
            direction: PacketDirection::Rx,
            endpoint,
            data: buf[..n].to_vec(),
        });
        if n != SAMPLE_LEN {
            return Err(SessionError::ResponseReadFailed {
                endpoint,
                source: TransportError::ShortTransfer {
                    expected: SAMPLE_LEN,
                    actual: n,
                },
            });
        }

        Ok(RawSample::new(buf))
    }

    /// Exchange once and decode the response in the configured unit.
    pub fn read_sample(&mut self, policy: DecodePolicy) -> Result<Sample, SessionError> {
        let raw = self.exchange()?;
        let reading = decode(&raw, self.config.unit, policy);
        Ok(Sample { raw, reading })
    }

    /// Release everything this session acquired.
    ///
    /// Idempotent. The interface is released first; a failure there
    /// (`ResourceReleaseFailed`) is logged and does not stop the reattach
    /// step. If both fail, the reattach error is returned.
    #[instrument(skip(self))]
    pub fn close(&mut self) -> Result<(), SessionError> {
        let Some(mut handle) = self.handle.take() else {
            self.lifecycle.reset();
            return Ok(());
        };
        let interface = self.identity.interface_number;

        let mut released = Ok(());
        if self.lifecycle.interface_claimed {
            match handle.release_interface(interface) {
                Ok(()) => {
                    self.lifecycle.interface_claimed = false;
                    self.observer
                        .on_event(&SessionEvent::InterfaceReleased { interface });
                }
                Err(source) => {
                    self.observer.on_event(&SessionEvent::TeardownFailed {
                        step: "release interface",
                        message: source.to_string(),
                    });
                    released = Err(SessionError::ResourceReleaseFailed { interface, source });
                }
            }
        }
        self.transition(SessionState::Released);

        let mut reattached = Ok(());
        if self.lifecycle.request_reattach(self.config.force_reattach) {
            match handle.attach_kernel_driver(interface) {
                Ok(()) => {
                    self.observer
                        .on_event(&SessionEvent::KernelDriverReattached { interface });
                }
                Err(source) => {
                    self.observer.on_event(&SessionEvent::TeardownFailed {
                        step: "reattach kernel driver",
                        message: source.to_string(),
                    });
                    reattached = Err(SessionError::DriverReattachFailed { interface, source });
                }
            }
        }

        drop(handle);
        self.observer.on_event(&SessionEvent::Closed);
        self.transition(SessionState::Closed);
        self.lifecycle.reset();

        reattached.and(released)
    }

    fn expect_state(&self, expected: SessionState) -> Result<(), SessionError> {
        if self.lifecycle.state == expected {
            Ok(())
        } else {
            Err(invalid(expected, self.lifecycle.state))
        }
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.lifecycle.state;
        self.lifecycle.goto_state(to);
        self.observer
            .on_event(&SessionEvent::StateChanged { from, to });
    }
}

impl<T: UsbTransport, O: SessionObserver> Drop for Session<T, O> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.close() {
                warn!(error = %e, "Teardown on drop failed");
            }
        }
    }
}
