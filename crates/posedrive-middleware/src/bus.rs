//! Broadcast bus of executed commands.
//!
//! Uses [`tokio::sync::broadcast`] so that every subscriber (a console
//! printer, a recorder, a UI bridge) sees every [`CommandEvent`] without any
//! single subscriber blocking the sink loop.

use posedrive_types::{CommandEvent, PoseError};
use tokio::sync::broadcast;
use tracing::warn;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Shared command bus. Clone it cheaply – all clones share the same
/// underlying broadcast channel.
#[derive(Clone, Debug)]
pub struct CommandBus {
    sender: broadcast::Sender<CommandEvent>,
}

impl CommandBus {
    /// Create a new bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish `event` to every current subscriber.
    ///
    /// Returns the number of receivers handed the event, or
    /// [`PoseError::Channel`] when nobody is subscribed.
    pub fn publish(&self, event: CommandEvent) -> Result<usize, PoseError> {
        self.sender
            .send(event)
            .map_err(|e| PoseError::Channel(format!("command bus send error: {e}")))
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> CommandSubscriber {
        CommandSubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Async receiver for [`CommandEvent`]s that rides over lag.
pub struct CommandSubscriber {
    receiver: broadcast::Receiver<CommandEvent>,
}

impl CommandSubscriber {
    /// Wait for the next event.
    ///
    /// Returns `None` once the bus is closed and drained. Lagging is logged
    /// and skipped.
    pub async fn recv(&mut self) -> Option<CommandEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(lagged_by = n, "CommandSubscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posedrive_types::Command;

    #[tokio::test]
    async fn publish_and_receive() -> Result<(), Box<dyn std::error::Error>> {
        let bus = CommandBus::default();
        let mut sub = bus.subscribe();

        let event = CommandEvent::new("test", Command::Forward);
        assert_eq!(bus.publish(event.clone())?, 1);

        let received = sub.recv().await.ok_or("no event received")?;
        assert_eq!(received.id, event.id);
        assert_eq!(received.command, Command::Forward);
        Ok(())
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = CommandBus::default();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let event = CommandEvent::new("test", Command::Up);
        bus.publish(event.clone())?;

        assert_eq!(a.recv().await.ok_or("a")?.id, event.id);
        assert_eq!(b.recv().await.ok_or("b")?.id, event.id);
        Ok(())
    }

    #[test]
    fn publish_no_subscribers_returns_error() {
        let bus = CommandBus::default();
        let result = bus.publish(CommandEvent::new("test", Command::Left));
        assert!(matches!(result, Err(PoseError::Channel(_))));
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_to_newest() {
        let bus = CommandBus::new(4);
        let mut slow = bus.subscribe();
        for _ in 0..20 {
            let _ = bus.publish(CommandEvent::new("flood", Command::Down));
        }
        let last = CommandEvent::new("flood", Command::Up);
        let _ = bus.publish(last.clone());

        // The lag error is swallowed; the subscriber resumes with buffered events.
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(slow.recv().await.expect("event"));
        }
        assert_eq!(seen.last().map(|e| e.id), Some(last.id));
    }

    #[tokio::test]
    async fn recv_returns_none_when_bus_dropped() {
        let bus = CommandBus::default();
        let mut sub = bus.subscribe();
        drop(bus);
        assert!(sub.recv().await.is_none());
    }
}
