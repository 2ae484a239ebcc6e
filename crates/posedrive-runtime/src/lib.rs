//! `posedrive-runtime` – Process wiring.
//!
//! # Modules
//!
//! - [`pipeline`] – [`PosePipeline`][pipeline::PosePipeline]: runs a
//!   [`PoseSource`][posedrive_middleware::PoseSource] through a
//!   [`PoseCommandTranslator`][posedrive_kernel::PoseCommandTranslator] on the
//!   producer task while a spawned sink loop executes the emitted commands.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: initialises
//!   the global `tracing` subscriber with an optional OTLP span exporter.
//!   Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace export.

pub mod pipeline;
pub mod telemetry;

pub use pipeline::{PipelineConfig, PipelineReport, PosePipeline};
pub use telemetry::{TracerProviderGuard, init_tracing};
