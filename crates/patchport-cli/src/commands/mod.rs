//! CLI command implementations.
//!
//! This module contains the implementation of each CLI command.

pub mod fingerprint;
pub mod hex_utils;
pub mod locate;
pub mod port;
