//! `posedrive-kernel` – Decision core.
//!
//! Owns the only stateful decision logic in PoseDrive: which pose samples are
//! admitted and which commands they produce.
//!
//! # Modules
//!
//! - [`translator`] – [`PoseCommandTranslator`][translator::PoseCommandTranslator]:
//!   consumes one [`PoseSample`][posedrive_types::PoseSample] at a time, applies
//!   per-channel hysteresis, and dispatches [`Command`][posedrive_types::Command]s
//!   to a [`CommandSink`][translator::CommandSink].
//! - [`guard`] – [`ProcessingGuard`][guard::ProcessingGuard]: the atomic
//!   at-most-one-in-flight flag shared between the producer context and the
//!   sink context, released through a [`Completion`][guard::Completion] token.

pub mod guard;
pub mod translator;

pub use guard::{Completion, ProcessingGuard};
pub use translator::{
    CommandSink, PoseCommandTranslator, ROTATION_THRESHOLD_DEG, TRANSLATION_THRESHOLD,
    TranslatorConfig, TranslatorStats,
};
