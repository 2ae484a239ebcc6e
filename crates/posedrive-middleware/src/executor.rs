//! Action executors – the user-visible effect of a [`Command`].
//!
//! The sink loop never interprets commands itself; it hands each one to an
//! [`ActionExecutor`]. Executors run on the sink context, so they may take as
//! long as the effect needs without stalling pose translation.
//!
//! - [`ScriptExecutor`] – writes the named script action (`forward();`) to an
//!   async writer, one per line.
//! - [`BusExecutor`] – publishes a [`CommandEvent`] on the [`CommandBus`].
//! - [`LogExecutor`] – logs the command and does nothing else.
//!
//! A `Vec<Box<dyn ActionExecutor>>` is itself an executor that runs every
//! member in order.

use async_trait::async_trait;
use posedrive_types::{Command, CommandEvent, PoseError};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::bus::CommandBus;

/// Runs the effect of one command on the sink context.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Execute `command`.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Sink`] (or an I/O variant) when the effect could
    /// not be applied. The sink loop logs the failure and moves on; commands
    /// are never retried.
    async fn execute(&self, command: Command) -> Result<(), PoseError>;
}

#[async_trait]
impl ActionExecutor for Box<dyn ActionExecutor> {
    async fn execute(&self, command: Command) -> Result<(), PoseError> {
        (**self).execute(command).await
    }
}

#[async_trait]
impl ActionExecutor for Vec<Box<dyn ActionExecutor>> {
    /// Run every executor; report the first failure after all have run.
    async fn execute(&self, command: Command) -> Result<(), PoseError> {
        let mut first_err = None;
        for executor in self {
            if let Err(e) = executor.execute(command).await {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScriptExecutor
// ─────────────────────────────────────────────────────────────────────────────

/// Writes each command's script invocation (`left();`) as a line.
pub struct ScriptExecutor<W> {
    writer: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> ScriptExecutor<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer, e.g. to inspect an in-memory buffer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ActionExecutor for ScriptExecutor<W> {
    async fn execute(&self, command: Command) -> Result<(), PoseError> {
        let line = format!("{}\n", command.script());
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BusExecutor
// ─────────────────────────────────────────────────────────────────────────────

/// Publishes each executed command on a [`CommandBus`].
pub struct BusExecutor {
    bus: CommandBus,
    source: String,
}

impl BusExecutor {
    pub fn new(bus: CommandBus, source: impl Into<String>) -> Self {
        Self {
            bus,
            source: source.into(),
        }
    }
}

#[async_trait]
impl ActionExecutor for BusExecutor {
    async fn execute(&self, command: Command) -> Result<(), PoseError> {
        // An idle bus is not a failure of the effect.
        match self.bus.publish(CommandEvent::new(self.source.clone(), command)) {
            Ok(n) => debug!(command = %command, receivers = n, "command published"),
            Err(_) => debug!(command = %command, "command bus has no subscribers"),
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LogExecutor
// ─────────────────────────────────────────────────────────────────────────────

/// Logs each command at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogExecutor;

#[async_trait]
impl ActionExecutor for LogExecutor {
    async fn execute(&self, command: Command) -> Result<(), PoseError> {
        info!(action = command.action_name(), "executing action");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl ActionExecutor for Failing {
        async fn execute(&self, command: Command) -> Result<(), PoseError> {
            Err(PoseError::Sink(format!("cannot run {command}")))
        }
    }

    #[tokio::test]
    async fn script_executor_writes_one_line_per_command() {
        let exec = ScriptExecutor::new(Vec::<u8>::new());
        exec.execute(Command::Forward).await.unwrap();
        exec.execute(Command::Left).await.unwrap();
        let out = String::from_utf8(exec.into_inner()).unwrap();
        assert_eq!(out, "forward();\nleft();\n");
    }

    #[tokio::test]
    async fn bus_executor_publishes_event() {
        let bus = CommandBus::default();
        let mut sub = bus.subscribe();
        let exec = BusExecutor::new(bus, "test-sink");
        exec.execute(Command::Down).await.unwrap();

        let event = sub.recv().await.expect("event");
        assert_eq!(event.command, Command::Down);
        assert_eq!(event.source, "test-sink");
    }

    #[tokio::test]
    async fn bus_executor_without_subscribers_is_ok() {
        let exec = BusExecutor::new(CommandBus::default(), "test-sink");
        assert!(exec.execute(Command::Up).await.is_ok());
    }

    #[tokio::test]
    async fn fanout_runs_all_and_reports_first_error() {
        let bus = CommandBus::default();
        let mut sub = bus.subscribe();
        let fanout: Vec<Box<dyn ActionExecutor>> = vec![
            Box::new(Failing),
            Box::new(BusExecutor::new(bus, "fanout")),
            Box::new(LogExecutor),
        ];

        let result = fanout.execute(Command::Right).await;
        assert_eq!(
            result,
            Err(PoseError::Sink("cannot run right".to_string()))
        );
        // The executor after the failing one still ran.
        assert_eq!(sub.recv().await.expect("event").command, Command::Right);
    }
}
