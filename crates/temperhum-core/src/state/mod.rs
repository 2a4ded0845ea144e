//! State module - session lifecycle tracking.

pub mod machine;

pub(crate) use machine::Lifecycle;
pub use machine::{EndpointPair, KernelDriverState, SessionState};
