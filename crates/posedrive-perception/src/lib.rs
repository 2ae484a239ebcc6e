//! `posedrive-perception` – turns raw pose measurements into channel values.
//!
//! # Modules
//!
//! - [`angles`] – yaw/pitch derivation from a pose quaternion and the
//!   [`AngleWrap`][angles::AngleWrap] policy for angular channels.
//! - [`hysteresis`] – [`ChannelState`][hysteresis::ChannelState]: the
//!   per-channel step quantizer that debounces continuous values into
//!   discrete commands.

pub mod angles;
pub mod hysteresis;

pub use angles::{AngleWrap, Orientation, PITCH_OFFSET_DEG};
pub use hysteresis::ChannelState;
