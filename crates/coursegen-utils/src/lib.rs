//! Foundation utilities shared by every coursegen crate.

pub mod atomic_write;
pub mod error;
pub mod exit_codes;
pub mod logging;
