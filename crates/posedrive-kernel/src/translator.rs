//! [`PoseCommandTranslator`] – the pose-to-command state machine.
//!
//! One translator exists per tracked pose stream. For every admitted
//! [`PoseSample`] it:
//!
//! 1. derives yaw and pitch from the rotation quaternion,
//! 2. runs the translation-Y, yaw and pitch [`ChannelState`]s against the
//!    same sample snapshot (in that order),
//! 3. hands each emitted [`Command`] to the [`CommandSink`], and
//! 4. posts the [`Completion`] for the sample to the sink after the
//!    commands, so the next sample is admitted only once the sink has run
//!    the effects.
//!
//! Samples arriving while a previous one is in flight are dropped whole.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Mutex;
//! use posedrive_kernel::guard::Completion;
//! use posedrive_kernel::translator::{CommandSink, PoseCommandTranslator};
//! use posedrive_types::{Command, PoseSample, Quaternion, Vec3};
//!
//! #[derive(Default)]
//! struct Immediate(Mutex<Vec<Command>>);
//!
//! impl CommandSink for Immediate {
//!     fn dispatch(&self, command: Command) {
//!         self.0.lock().unwrap().push(command);
//!     }
//!     fn schedule_completion(&self, completion: Completion) {
//!         completion.complete();
//!     }
//! }
//!
//! // Held level: a quarter turn about X puts pitch at zero.
//! let level = Quaternion::from_x_rotation(std::f64::consts::FRAC_PI_2);
//! let mut translator = PoseCommandTranslator::new(Immediate::default());
//! translator.on_pose_sample(PoseSample::new(Vec3::new(0.0, 1.5, 0.0), level));
//! assert_eq!(*translator.sink().0.lock().unwrap(), vec![Command::Forward]);
//! ```

use std::sync::Arc;

use posedrive_perception::angles::{AngleWrap, Orientation, PITCH_OFFSET_DEG};
use posedrive_perception::hysteresis::ChannelState;
use posedrive_types::{Channel, Command, PoseSample};
use tracing::{debug, info};

use crate::guard::{Completion, ProcessingGuard};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Translation-Y distance (source units) that triggers forward/backward.
pub const TRANSLATION_THRESHOLD: f64 = 1.0;

/// Angular distance in degrees that triggers left/right and up/down.
pub const ROTATION_THRESHOLD_DEG: f64 = 15.0;

// ─────────────────────────────────────────────────────────────────────────────
// CommandSink
// ─────────────────────────────────────────────────────────────────────────────

/// Destination for emitted commands.
///
/// # Contract
///
/// * `dispatch` must not block: it queues the command's effect for execution
///   on the sink's own context and returns.
/// * `schedule_completion` queues `completion` behind every command
///   dispatched before it. The sink completes (or drops) the token once
///   those effects have run.
pub trait CommandSink: Send + Sync {
    /// Queue `command` for execution on the sink context.
    fn dispatch(&self, command: Command);

    /// Queue `completion` to run after the previously dispatched commands.
    fn schedule_completion(&self, completion: Completion);
}

impl<S: CommandSink + ?Sized> CommandSink for Arc<S> {
    fn dispatch(&self, command: Command) {
        (**self).dispatch(command);
    }

    fn schedule_completion(&self, completion: Completion) {
        (**self).schedule_completion(completion);
    }
}

impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    fn dispatch(&self, command: Command) {
        (**self).dispatch(command);
    }

    fn schedule_completion(&self, completion: Completion) {
        (**self).schedule_completion(completion);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Thresholds and angle policy for a [`PoseCommandTranslator`].
///
/// [`Default`] reproduces the fixed tracking behavior: 1.0 unit of
/// translation, 15° of rotation, −90° pitch offset, raw angle differences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslatorConfig {
    pub translation_threshold: f64,
    pub rotation_threshold: f64,
    pub pitch_offset: f64,
    pub angle_wrap: AngleWrap,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            translation_threshold: TRANSLATION_THRESHOLD,
            rotation_threshold: ROTATION_THRESHOLD_DEG,
            pitch_offset: PITCH_OFFSET_DEG,
            angle_wrap: AngleWrap::Raw,
        }
    }
}

/// Running counters kept by the translator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslatorStats {
    /// Samples that passed the admission guard and were evaluated.
    pub admitted: u64,
    /// Samples discarded because a previous sample was still in flight.
    pub dropped: u64,
    /// Commands handed to the sink.
    pub emitted: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// PoseCommandTranslator
// ─────────────────────────────────────────────────────────────────────────────

/// Stateful filter turning pose samples into debounced [`Command`]s.
pub struct PoseCommandTranslator<S: CommandSink> {
    translation_y: ChannelState,
    yaw: ChannelState,
    pitch: ChannelState,
    pitch_offset: f64,
    guard: ProcessingGuard,
    sink: S,
    stats: TranslatorStats,
}

impl<S: CommandSink> PoseCommandTranslator<S> {
    /// Create a translator with the default thresholds.
    pub fn new(sink: S) -> Self {
        Self::with_config(TranslatorConfig::default(), sink)
    }

    /// Create a translator from an explicit configuration.
    ///
    /// All baselines start at zero.
    pub fn with_config(config: TranslatorConfig, sink: S) -> Self {
        Self {
            translation_y: ChannelState::new(Channel::TranslationY, config.translation_threshold),
            yaw: ChannelState::new(Channel::Yaw, config.rotation_threshold)
                .with_wrap(config.angle_wrap),
            pitch: ChannelState::new(Channel::Pitch, config.rotation_threshold)
                .with_wrap(config.angle_wrap),
            pitch_offset: config.pitch_offset,
            guard: ProcessingGuard::new(),
            sink,
            stats: TranslatorStats::default(),
        }
    }

    /// Entry point for the pose source.
    ///
    /// Drops the sample when the guard is set; otherwise evaluates every
    /// channel, dispatches the emitted commands and schedules the guard's
    /// release on the sink.
    pub fn on_pose_sample(&mut self, sample: PoseSample) {
        let Some(completion) = self.guard.try_acquire() else {
            self.stats.dropped += 1;
            debug!(timestamp = sample.timestamp, "sample dropped: previous dispatch in flight");
            return;
        };
        self.stats.admitted += 1;

        let t = sample.translation;
        let r = sample.rotation;
        debug!(
            timestamp = sample.timestamp,
            "Translation: {}, {}, {} | Rotation: {}, {}, {}, {}",
            t.x, t.y, t.z, r.x, r.y, r.z, r.w
        );

        for command in self.evaluate(&sample).into_iter().flatten() {
            info!(command = %command, "dispatching command");
            self.sink.dispatch(command);
            self.stats.emitted += 1;
        }
        self.sink.schedule_completion(completion);
    }

    /// Run all three channels against one sample snapshot.
    fn evaluate(&mut self, sample: &PoseSample) -> [Option<Command>; 3] {
        let orientation = Orientation::from_quaternion(&sample.rotation, self.pitch_offset);
        [
            self.translation_y.evaluate(sample.translation.y),
            self.yaw.evaluate(orientation.yaw_deg),
            self.pitch.evaluate(orientation.pitch_deg),
        ]
    }

    /// Current state of `channel`.
    pub fn channel(&self, channel: Channel) -> &ChannelState {
        match channel {
            Channel::TranslationY => &self.translation_y,
            Channel::Yaw => &self.yaw,
            Channel::Pitch => &self.pitch,
        }
    }

    /// Handle to the admission guard shared with in-flight completions.
    pub fn guard(&self) -> &ProcessingGuard {
        &self.guard
    }

    pub fn stats(&self) -> TranslatorStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
