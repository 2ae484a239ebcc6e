//! Pose sample sources.
//!
//! PoseDrive never talks to a tracking service directly. A [`PoseSource`]
//! yields an ordered stream of [`PoseSample`]s and the runtime feeds them to
//! the translator one at a time.
//!
//! - [`JsonLinesSource`] – newline-delimited JSON replay from any
//!   [`AsyncBufRead`] (a file, stdin, a socket). One object per line:
//!   `{"timestamp": 0.1, "translation": [x, y, z], "rotation": [x, y, z, w]}`.
//!   Blank lines and lines starting with `#` are ignored; malformed lines are
//!   logged and skipped.
//! - [`ReplaySource`] – an in-memory list of samples.
//!
//! [`paced`] spaces any sample stream out to a fixed interval, emulating a
//! sensor's delivery rate.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use posedrive_types::PoseSample;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

/// Producer of ordered pose samples.
#[async_trait]
pub trait PoseSource: Send + Sync {
    /// Live stream of samples; ends when the source is exhausted.
    async fn sample_stream(&self) -> BoxStream<'static, PoseSample>;
}

/// Delay each sample of `samples` by `interval` before yielding it.
pub fn paced(
    samples: BoxStream<'static, PoseSample>,
    interval: Duration,
) -> BoxStream<'static, PoseSample> {
    samples
        .then(move |sample| async move {
            tokio::time::sleep(interval).await;
            sample
        })
        .boxed()
}

// ─────────────────────────────────────────────────────────────────────────────
// JsonLinesSource
// ─────────────────────────────────────────────────────────────────────────────

/// Replays newline-delimited JSON pose samples from a reader.
///
/// The reader is consumed by the first call to
/// [`sample_stream`][PoseSource::sample_stream]; later calls yield an empty
/// stream.
pub struct JsonLinesSource<R> {
    reader: Mutex<Option<R>>,
}

impl<R> JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
        }
    }
}

#[async_trait]
impl<R> PoseSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn sample_stream(&self) -> BoxStream<'static, PoseSample> {
        let reader = match self.reader.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(reader) = reader else {
            warn!("JSON lines source already consumed");
            return stream::empty().boxed();
        };

        stream::unfold((reader.lines(), 0usize), |(mut lines, mut line_no)| async move {
            loop {
                line_no += 1;
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() || trimmed.starts_with('#') {
                            continue;
                        }
                        match serde_json::from_str::<PoseSample>(trimmed) {
                            Ok(sample) => return Some((sample, (lines, line_no))),
                            Err(e) => {
                                warn!(line = line_no, error = %e, "skipping malformed pose sample");
                            }
                        }
                    }
                    Ok(None) => return None,
                    Err(e) => {
                        warn!(line = line_no, error = %e, "pose source read failed");
                        return None;
                    }
                }
            }
        })
        .boxed()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ReplaySource
// ─────────────────────────────────────────────────────────────────────────────

/// Replays a fixed list of samples; every stream starts from the beginning.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    samples: Vec<PoseSample>,
}

impl ReplaySource {
    pub fn new(samples: Vec<PoseSample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[async_trait]
impl PoseSource for ReplaySource {
    async fn sample_stream(&self) -> BoxStream<'static, PoseSample> {
        stream::iter(self.samples.clone()).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posedrive_types::{Quaternion, Vec3};

    const LINES: &str = r#"# recorded walk
{"timestamp":0.0,"translation":[0,0,0],"rotation":[0,0,0,1]}

{"timestamp":0.1,"translation":[0,1.5,0],"rotation":[0,0,0,1]}
not json at all
{"timestamp":0.2,"translation":[0,2.5],"rotation":[0,0,0,1]}
{"timestamp":0.3,"translation":[0,3,0],"rotation":[0,0,0.17,0.98]}
"#;

    #[tokio::test]
    async fn json_lines_skips_comments_blanks_and_malformed() {
        let source = JsonLinesSource::new(LINES.as_bytes());
        let samples: Vec<PoseSample> = source.sample_stream().await.collect().await;
        let stamps: Vec<f64> = samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![0.0, 0.1, 0.3]);
        assert_eq!(samples[1].translation, Vec3::new(0.0, 1.5, 0.0));
        assert_eq!(samples[2].rotation, Quaternion::new(0.0, 0.0, 0.17, 0.98));
    }

    #[tokio::test]
    async fn json_lines_source_is_single_use() {
        let source = JsonLinesSource::new(LINES.as_bytes());
        assert_eq!(source.sample_stream().await.count().await, 3);
        assert_eq!(source.sample_stream().await.count().await, 0);
    }

    #[tokio::test]
    async fn replay_source_restarts_each_stream() {
        let samples = vec![
            PoseSample::default(),
            PoseSample::new(Vec3::new(0.0, 1.0, 0.0), Quaternion::identity()),
        ];
        let source = ReplaySource::new(samples.clone());
        assert_eq!(source.len(), 2);
        let first: Vec<_> = source.sample_stream().await.collect().await;
        let second: Vec<_> = source.sample_stream().await.collect().await;
        assert_eq!(first, samples);
        assert_eq!(second, samples);
    }

    #[tokio::test]
    async fn paced_stream_waits_between_samples() {
        let source = ReplaySource::new(vec![PoseSample::default(); 3]);
        let started = std::time::Instant::now();
        let count = paced(source.sample_stream().await, Duration::from_millis(10))
            .count()
            .await;
        assert_eq!(count, 3);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
