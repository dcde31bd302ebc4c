//! Shared helpers for unit tests.

pub mod frontend;
pub mod socket_guard;
