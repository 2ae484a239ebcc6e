//! `posedrive-middleware` – Plumbing between contexts.
//!
//! Moves samples in and commands out without caring what they mean.
//!
//! # Modules
//!
//! - [`source`] – [`PoseSource`] trait plus the JSON-lines and in-memory
//!   replay sources.
//! - [`sink`] – [`ChannelSink`] / [`SinkLoop`]: the non-blocking
//!   [`CommandSink`][posedrive_kernel::CommandSink] and the task that runs
//!   command effects and releases the processing guard.
//! - [`executor`] – [`ActionExecutor`] trait and the script, bus and log
//!   executors.
//! - [`bus`] – [`CommandBus`]: broadcast of executed commands to any number
//!   of subscribers.

pub mod bus;
pub mod executor;
pub mod sink;
pub mod source;

pub use bus::{CommandBus, CommandSubscriber};
pub use executor::{ActionExecutor, BusExecutor, LogExecutor, ScriptExecutor};
pub use sink::{ChannelSink, SinkLoop, SinkReport};
pub use source::{JsonLinesSource, PoseSource, ReplaySource, paced};
