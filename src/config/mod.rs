//! Radio and link configuration
//!
//! This module contains the fixed modem setup written to the chip and the
//! timing policy of the Ping/Pong protocol. It includes:
//! - Modem parameters (frequency, bandwidth, coding rate, spreading factor)
//! - Output power and preamble
//! - Reply timeout, poll granularity and inter-round delays

/// Modem configuration and register encoders
pub mod radio;

/// Link protocol timing and role selection
pub mod link;

pub use link::{LinkConfig, Role, TxCompletion};
pub use radio::{Bandwidth, CodingRate, OutputPower, RadioConfig, SpreadingFactor};
