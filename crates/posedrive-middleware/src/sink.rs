//! Sink run loop – the command-executing context.
//!
//! [`channel`] splits a sink into two halves:
//!
//! * [`ChannelSink`] – the [`CommandSink`] handed to the translator. Both
//!   `dispatch` and `schedule_completion` push onto an unbounded queue and
//!   return immediately, so the producer never waits on the effect.
//! * [`SinkLoop`] – drains the queue in FIFO order on its own task, running
//!   each command through an [`ActionExecutor`] and completing each
//!   [`Completion`] only after every command queued before it has run.
//!
//! The loop ends once every [`ChannelSink`] clone has been dropped and the
//! queue is empty.

use posedrive_kernel::{CommandSink, Completion};
use posedrive_types::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::executor::ActionExecutor;

enum SinkMessage {
    Command(Command),
    Completion(Completion),
}

/// Create a connected [`ChannelSink`] / [`SinkLoop`] pair.
pub fn channel<E: ActionExecutor>(executor: E) -> (ChannelSink, SinkLoop<E>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx }, SinkLoop { rx, executor })
}

// ─────────────────────────────────────────────────────────────────────────────
// ChannelSink
// ─────────────────────────────────────────────────────────────────────────────

/// Non-blocking [`CommandSink`] that posts to a [`SinkLoop`].
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkMessage>,
}

impl ChannelSink {
    /// `true` once the [`SinkLoop`] has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl CommandSink for ChannelSink {
    fn dispatch(&self, command: Command) {
        if self.tx.send(SinkMessage::Command(command)).is_err() {
            warn!(command = %command, "sink loop closed; command dropped");
        }
    }

    fn schedule_completion(&self, completion: Completion) {
        // On a closed loop the returned message is dropped along with the
        // completion, which clears the guard.
        if self.tx.send(SinkMessage::Completion(completion)).is_err() {
            debug!("sink loop closed; completion released immediately");
        }
    }
}

impl std::fmt::Debug for SinkMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkMessage::Command(c) => f.debug_tuple("Command").field(c).finish(),
            SinkMessage::Completion(_) => f.write_str("Completion"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SinkLoop
// ─────────────────────────────────────────────────────────────────────────────

/// Summary returned when a [`SinkLoop`] finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkReport {
    /// Commands whose effect ran successfully.
    pub executed: u64,
    /// Commands whose executor returned an error.
    pub failed: u64,
    /// Completions run (one per admitted sample).
    pub completions: u64,
}

/// The sink's execution context.
pub struct SinkLoop<E> {
    rx: mpsc::UnboundedReceiver<SinkMessage>,
    executor: E,
}

impl<E: ActionExecutor> SinkLoop<E> {
    /// Drain the queue until every sender is gone.
    pub async fn run(mut self) -> SinkReport {
        let mut report = SinkReport::default();
        while let Some(message) = self.rx.recv().await {
            match message {
                SinkMessage::Command(command) => match self.executor.execute(command).await {
                    Ok(()) => report.executed += 1,
                    Err(e) => {
                        warn!(command = %command, error = %e, "action failed");
                        report.failed += 1;
                    }
                },
                SinkMessage::Completion(completion) => {
                    completion.complete();
                    report.completions += 1;
                }
            }
        }
        debug!(?report, "sink loop finished");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use posedrive_kernel::ProcessingGuard;
    use posedrive_types::PoseError;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Executor that records commands along with the guard state it observed.
    #[derive(Clone)]
    struct Observer {
        guard: ProcessingGuard,
        seen: Arc<Mutex<Vec<(Command, bool)>>>,
        delay: Duration,
    }

    #[async_trait]
    impl ActionExecutor for Observer {
        async fn execute(&self, command: Command) -> Result<(), PoseError> {
            tokio::time::sleep(self.delay).await;
            self.seen.lock().unwrap().push((command, self.guard.is_set()));
            if command == Command::Down {
                return Err(PoseError::Sink("down is broken".to_string()));
            }
            Ok(())
        }
    }

    fn observer(guard: &ProcessingGuard, delay: Duration) -> Observer {
        Observer {
            guard: guard.clone(),
            seen: Arc::default(),
            delay,
        }
    }

    #[tokio::test]
    async fn commands_run_in_order_before_completion() {
        let guard = ProcessingGuard::new();
        let exec = observer(&guard, Duration::from_millis(5));
        let seen = Arc::clone(&exec.seen);
        let (sink, sink_loop) = channel(exec);

        let token = guard.try_acquire().unwrap();
        sink.dispatch(Command::Forward);
        sink.dispatch(Command::Right);
        sink.schedule_completion(token);
        drop(sink);

        let report = sink_loop.run().await;
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(Command::Forward, true), (Command::Right, true)],
            "guard must stay set while commands run"
        );
        assert!(!guard.is_set());
        assert_eq!(report.executed, 2);
        assert_eq!(report.completions, 1);
    }

    #[tokio::test]
    async fn dispatch_does_not_wait_for_effect() {
        let guard = ProcessingGuard::new();
        let (sink, sink_loop) = channel(observer(&guard, Duration::from_millis(200)));
        let handle = tokio::spawn(sink_loop.run());

        let started = std::time::Instant::now();
        for _ in 0..10 {
            sink.dispatch(Command::Up);
        }
        assert!(started.elapsed() < Duration::from_millis(100));

        drop(sink);
        let report = handle.await.unwrap();
        assert_eq!(report.executed, 10);
    }

    #[tokio::test]
    async fn failed_action_is_counted_and_loop_continues() {
        let guard = ProcessingGuard::new();
        let (sink, sink_loop) = channel(observer(&guard, Duration::ZERO));
        let token = guard.try_acquire().unwrap();
        sink.dispatch(Command::Down);
        sink.dispatch(Command::Left);
        sink.schedule_completion(token);
        drop(sink);

        let report = sink_loop.run().await;
        assert_eq!(
            report,
            SinkReport {
                executed: 1,
                failed: 1,
                completions: 1,
            }
        );
        assert!(!guard.is_set());
    }

    #[tokio::test]
    async fn completion_on_closed_loop_releases_guard() {
        let guard = ProcessingGuard::new();
        let (sink, sink_loop) = channel(observer(&guard, Duration::ZERO));
        drop(sink_loop);
        assert!(sink.is_closed());

        sink.dispatch(Command::Forward);
        sink.schedule_completion(guard.try_acquire().unwrap());
        assert!(!guard.is_set());
    }
}
