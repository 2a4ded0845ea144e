//! Session lifecycle state.

use std::fmt;

/// Where a session is in its single-shot lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing acquired.
    #[default]
    Closed,
    /// Device found and opened.
    Located,
    /// Kernel driver checked (and detached if it owned the interface).
    DriverResolved,
    /// Interface claimed and endpoints resolved.
    InterfaceClaimed,
    /// The one request/response exchange has happened.
    Exchanged,
    /// Interface released, driver reattached if requested.
    Released,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Closed => write!(f, "CLOSED"),
            SessionState::Located => write!(f, "LOCATED"),
            SessionState::DriverResolved => write!(f, "DRIVER_RESOLVED"),
            SessionState::InterfaceClaimed => write!(f, "INTERFACE_CLAIMED"),
            SessionState::Exchanged => write!(f, "EXCHANGED"),
            SessionState::Released => write!(f, "RELEASED"),
        }
    }
}

/// Kernel driver ownership of the sensor interface, from this session's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KernelDriverState {
    /// No driver owned the interface when we looked.
    #[default]
    NeverAttached,
    /// We detached the driver and have not given it back.
    DetachedByUs,
    /// Teardown decided to hand the interface back to the driver.
    ReattachRequested,
}

impl fmt::Display for KernelDriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelDriverState::NeverAttached => write!(f, "NEVER_ATTACHED"),
            KernelDriverState::DetachedByUs => write!(f, "DETACHED_BY_US"),
            KernelDriverState::ReattachRequested => write!(f, "REATTACH_REQUESTED"),
        }
    }
}

/// Endpoint addresses used for the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointPair {
    pub read_address: u8,
    pub write_address: u8,
}

impl EndpointPair {
    /// First endpoint is read, second is write; anything after is ignored.
    pub fn from_positional(addresses: &[u8]) -> Option<Self> {
        match addresses {
            [read, write, ..] => Some(Self {
                read_address: *read,
                write_address: *write,
            }),
            _ => None,
        }
    }
}

/// What the session currently holds, so teardown can undo exactly that.
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    pub(crate) state: SessionState,
    pub(crate) driver: KernelDriverState,
    pub(crate) interface_claimed: bool,
    pub(crate) endpoints: Option<EndpointPair>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Transition to a new state.
    pub(crate) fn goto_state(&mut self, new_state: SessionState) {
        tracing::debug!(from = %self.state, to = %new_state, "State transition");
        self.state = new_state;
    }

    /// Decide whether teardown gives the interface back to the kernel driver.
    ///
    /// Only a driver this session detached is reattached, and only on request.
    pub(crate) fn request_reattach(&mut self, force_reattach: bool) -> bool {
        if self.driver == KernelDriverState::DetachedByUs && force_reattach {
            self.driver = KernelDriverState::ReattachRequested;
            true
        } else {
            false
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
