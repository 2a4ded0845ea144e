//! Session error taxonomy.

use thiserror::Error;

use crate::protocol::DeviceIdentity;
use crate::state::SessionState;
use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Device {identity} not found")]
    DeviceNotFound {
        identity: DeviceIdentity,
        #[source]
        source: TransportError,
    },

    #[error("Unable to detach kernel driver from interface {interface}")]
    DriverDetachFailed {
        interface: u8,
        #[source]
        source: TransportError,
    },

    #[error("Unable to claim interface {interface}")]
    InterfaceClaimFailed {
        interface: u8,
        #[source]
        source: TransportError,
    },

    #[error("Unable to resolve read/write endpoints of interface {interface}: {reason}")]
    EndpointResolutionFailed { interface: u8, reason: String },

    #[error("Failed sending request to endpoint 0x{endpoint:02x}")]
    RequestWriteFailed {
        endpoint: u8,
        #[source]
        source: TransportError,
    },

    #[error("Failed reading response from endpoint 0x{endpoint:02x}")]
    ResponseReadFailed {
        endpoint: u8,
        #[source]
        source: TransportError,
    },

    #[error("Failed releasing interface {interface}")]
    ResourceReleaseFailed {
        interface: u8,
        #[source]
        source: TransportError,
    },

    #[error("Failed reattaching kernel driver to interface {interface}")]
    DriverReattachFailed {
        interface: u8,
        #[source]
        source: TransportError,
    },

    #[error("Session is {actual}, expected {expected}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },
}

/// Field-less mirror of `SessionError`, for matching and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionErrorKind {
    DeviceNotFound,
    DriverDetachFailed,
    InterfaceClaimFailed,
    EndpointResolutionFailed,
    RequestWriteFailed,
    ResponseReadFailed,
    ResourceReleaseFailed,
    DriverReattachFailed,
    InvalidState,
}

impl SessionError {
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            SessionError::DeviceNotFound { .. } => SessionErrorKind::DeviceNotFound,
            SessionError::DriverDetachFailed { .. } => SessionErrorKind::DriverDetachFailed,
            SessionError::InterfaceClaimFailed { .. } => SessionErrorKind::InterfaceClaimFailed,
            SessionError::EndpointResolutionFailed { .. } => {
                SessionErrorKind::EndpointResolutionFailed
            }
            SessionError::RequestWriteFailed { .. } => SessionErrorKind::RequestWriteFailed,
            SessionError::ResponseReadFailed { .. } => SessionErrorKind::ResponseReadFailed,
            SessionError::ResourceReleaseFailed { .. } => SessionErrorKind::ResourceReleaseFailed,
            SessionError::DriverReattachFailed { .. } => SessionErrorKind::DriverReattachFailed,
            SessionError::InvalidState { .. } => SessionErrorKind::InvalidState,
        }
    }

    /// Whether the error comes from teardown rather than the exchange.
    pub fn is_teardown(&self) -> bool {
        matches!(
            self.kind(),
            SessionErrorKind::ResourceReleaseFailed | SessionErrorKind::DriverReattachFailed
        )
    }
}
