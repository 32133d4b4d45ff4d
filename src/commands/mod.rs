//! Command implementations

pub mod deploy;
pub mod verify;
