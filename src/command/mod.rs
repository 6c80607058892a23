//! Command ingestion and execution
//!
//! This module handles:
//! - Validating inbound messages and turning them into commands
//! - Buffering commands in the shared queue
//! - Applying queued commands to the LED state once per tick
//! - Acknowledging executed commands to their connection

mod dispatcher;
mod executor;
mod ticker;

pub use dispatcher::{Dispatch, IngressDispatcher};
pub use executor::{CommandExecutor, CommandOutcome, TickReport};
pub use ticker::ExecutorTicker;
