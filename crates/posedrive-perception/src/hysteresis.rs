//! Per-channel hysteresis step quantizer.
//!
//! Each [`ChannelState`] compares an incoming value against its baseline.
//! When the distance exceeds the threshold the channel emits its positive or
//! negative [`Command`] and moves the baseline by exactly one threshold step
//! toward the value.
//!
//! The baseline never snaps to the value. Small oscillations around a step
//! boundary therefore cannot re-trigger, and a single large jump emits once
//! per sample rather than once per threshold multiple; the channel catches up
//! one step per subsequent sample.
//!
//! # Example
//!
//! ```rust
//! use posedrive_perception::hysteresis::ChannelState;
//! use posedrive_types::{Channel, Command};
//!
//! let mut ch = ChannelState::new(Channel::TranslationY, 1.0);
//! assert_eq!(ch.evaluate(2.5), Some(Command::Forward));
//! assert_eq!(ch.baseline(), 1.0); // one step, not 2.5
//! assert_eq!(ch.evaluate(1.8), None); // within the band around 1.0
//! ```

use posedrive_types::{Channel, Command};
use tracing::trace;

use crate::angles::AngleWrap;

/// Baseline and threshold for one monitored channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    channel: Channel,
    baseline: f64,
    threshold: f64,
    wrap: AngleWrap,
}

impl ChannelState {
    /// New channel with a zero baseline and raw differencing.
    pub fn new(channel: Channel, threshold: f64) -> Self {
        Self {
            channel,
            baseline: 0.0,
            threshold,
            wrap: AngleWrap::Raw,
        }
    }

    pub fn with_baseline(mut self, baseline: f64) -> Self {
        self.baseline = baseline;
        self
    }

    /// Select how the distance to the baseline is measured.
    pub fn with_wrap(mut self, wrap: AngleWrap) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn wrap(&self) -> AngleWrap {
        self.wrap
    }

    /// Feed one raw value into the channel.
    ///
    /// Returns the command to emit, if any. The baseline moves by one
    /// threshold step only when a command is returned. NaN values compare
    /// false both ways and are ignored.
    pub fn evaluate(&mut self, value: f64) -> Option<Command> {
        let delta = self.wrap.delta(value, self.baseline);
        let command = if delta > self.threshold {
            self.baseline += self.threshold;
            self.channel.positive()
        } else if delta < -self.threshold {
            self.baseline -= self.threshold;
            self.channel.negative()
        } else {
            return None;
        };
        trace!(
            channel = ?self.channel,
            value,
            baseline = self.baseline,
            command = %command,
            "threshold crossed"
        );
        Some(command)
    }
}
