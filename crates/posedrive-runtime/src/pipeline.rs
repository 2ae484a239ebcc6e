//! [`PosePipeline`] – source → translator → sink wiring.
//!
//! Running a pipeline creates the two execution contexts:
//!
//! * the **producer** – the calling task, which pulls samples from the
//!   [`PoseSource`] and feeds them to [`PoseCommandTranslator::on_pose_sample`];
//! * the **sink** – a spawned [`SinkLoop`][posedrive_middleware::SinkLoop] task that runs command effects
//!   through the [`ActionExecutor`] and releases the processing guard.
//!
//! The run ends when the source is exhausted or the shutdown future
//! resolves. Commands already dispatched are still executed before
//! [`PosePipeline::run`] returns; there is no cancellation of in-flight
//! effects.
//!
//! Without a `sample_interval` the producer admits a sample whenever the sink
//! happens to have released the guard, so the number of dropped samples
//! depends on scheduling. On a current-thread runtime a source that is always
//! ready may never yield to the sink task, so every sample after the
//! first can be dropped. Pace replayed sources to get repeatable output.

use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use posedrive_kernel::{PoseCommandTranslator, TranslatorConfig, TranslatorStats};
use posedrive_middleware::sink::{self, SinkReport};
use posedrive_middleware::{ActionExecutor, PoseSource, paced};
use posedrive_types::PoseError;
use tracing::info;

/// Configuration bundle for [`PosePipeline`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PipelineConfig {
    pub translator: TranslatorConfig,
    /// Space samples out by this interval, emulating a live sensor rate.
    /// `None` delivers samples as fast as the source yields them.
    pub sample_interval: Option<Duration>,
}

/// What happened during one [`PosePipeline::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub translator: TranslatorStats,
    pub sink: SinkReport,
}

/// A configured pipeline waiting for a source.
pub struct PosePipeline<E> {
    config: PipelineConfig,
    executor: E,
}

impl<E: ActionExecutor + 'static> PosePipeline<E> {
    pub fn new(config: PipelineConfig, executor: E) -> Self {
        Self { config, executor }
    }

    /// Drive `source` through the translator until it ends or `shutdown`
    /// resolves.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Sink`] if the sink task panicked.
    pub async fn run<P, F>(self, source: &P, shutdown: F) -> Result<PipelineReport, PoseError>
    where
        P: PoseSource + ?Sized,
        F: Future<Output = ()>,
    {
        let (command_sink, sink_loop) = sink::channel(self.executor);
        let sink_task = tokio::spawn(sink_loop.run());
        let mut translator = PoseCommandTranslator::with_config(self.config.translator, command_sink);

        let mut samples = source.sample_stream().await;
        if let Some(interval) = self.config.sample_interval {
            samples = paced(samples, interval);
        }

        info!(config = ?self.config, "pose pipeline started");
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("shutdown requested; stopping pose intake");
                    break;
                }
                next = samples.next() => match next {
                    Some(sample) => translator.on_pose_sample(sample),
                    None => break,
                },
            }
        }

        let stats = translator.stats();
        // Dropping the translator drops the last sender, letting the sink
        // loop drain and exit.
        drop(translator);
        let sink_report = sink_task
            .await
            .map_err(|e| PoseError::Sink(format!("sink loop failed: {e}")))?;

        let report = PipelineReport {
            translator: stats,
            sink: sink_report,
        };
        info!(?report, "pose pipeline finished");
        Ok(report)
    }
}
