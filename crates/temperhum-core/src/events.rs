//! Event system for UI decoupling.
//!
//! Allows the CLI (or any other front end) to follow a session without
//! tight coupling to the core logic.

use std::fmt;

use crate::state::{EndpointPair, SessionState};

/// USB packet direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketDirection {
    Tx, // Transmit (Host -> Device)
    Rx, // Receive (Device -> Host)
}

impl fmt::Display for PacketDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketDirection::Tx => write!(f, "TX"),
            PacketDirection::Rx => write!(f, "RX"),
        }
    }
}

/// Events emitted by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Device located and opened.
    DeviceFound {
        vid: u16,
        pid: u16,
        description: String,
    },
    /// Lifecycle state changed.
    StateChanged { from: SessionState, to: SessionState },
    /// A kernel driver owned the interface and was detached.
    KernelDriverDetached { interface: u8, reattach_on_close: bool },
    /// Interface claimed.
    InterfaceClaimed { interface: u8 },
    /// Read/write endpoints resolved.
    EndpointsResolved(EndpointPair),
    /// USB packet sent/received.
    Packet {
        direction: PacketDirection,
        endpoint: u8,
        data: Vec<u8>,
    },
    /// Interface released during teardown.
    InterfaceReleased { interface: u8 },
    /// Kernel driver handed back the interface.
    KernelDriverReattached { interface: u8 },
    /// A teardown step failed; teardown carried on.
    TeardownFailed { step: &'static str, message: String },
    /// Device handle closed.
    Closed,
}

/// Observer trait for receiving session events.
///
/// Implement this trait in your UI layer to receive updates.
pub trait SessionObserver {
    /// Called when an event occurs.
    fn on_event(&self, event: &SessionEvent);
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn on_event(&self, _event: &SessionEvent) {}
}

/// Observer that logs events using tracing.
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::DeviceFound {
                vid,
                pid,
                description,
            } => {
                tracing::info!(vid = %format!("{:04x}", vid), pid = %format!("{:04x}", pid), "Found device");
                tracing::debug!("{}", description);
            }
            SessionEvent::StateChanged { from, to } => {
                tracing::debug!(from = %from, to = %to, "State changed");
            }
            SessionEvent::KernelDriverDetached {
                interface,
                reattach_on_close,
            } => {
                if *reattach_on_close {
                    tracing::info!(interface, "Kernel driver detached, will reattach at the end");
                } else {
                    tracing::info!(interface, "Kernel driver detached, leaving it detached");
                }
            }
            SessionEvent::InterfaceClaimed { interface } => {
                tracing::debug!(interface, "Claimed interface");
            }
            SessionEvent::EndpointsResolved(pair) => {
                tracing::debug!(
                    read = %format!("0x{:02x}", pair.read_address),
                    write = %format!("0x{:02x}", pair.write_address),
                    "Endpoints resolved"
                );
            }
            SessionEvent::Packet {
                direction,
                endpoint,
                data,
            } => {
                tracing::debug!(
                    dir = %direction,
                    endpoint = %format!("0x{:02x}", endpoint),
                    data = %crate::codec::hex_dump(data),
                    "USB Packet"
                );
            }
            SessionEvent::InterfaceReleased { interface } => {
                tracing::debug!(interface, "Released interface");
            }
            SessionEvent::KernelDriverReattached { interface } => {
                tracing::info!(interface, "Kernel driver reattached");
            }
            SessionEvent::TeardownFailed { step, message } => {
                tracing::warn!(step = %step, "Teardown step failed: {}", message);
            }
            SessionEvent::Closed => {
                tracing::debug!("Device closed");
            }
        }
    }
}
