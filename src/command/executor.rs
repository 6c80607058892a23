//! Command executor - applies queued commands and acknowledges them

use crate::session::ConnectionRegistry;
use crate::strip::{LedState, SharedStrip, StripError};
use pixel_commander_shared::lifecycle::{
    CommandLifecycle, CommandState, LifecycleEvent, TransitionResult,
};
use pixel_commander_shared::{Command, CommandId, CommandKind, CommandQueue, ConnectionId, Reply};
use std::sync::Arc;
use tracing::{debug, error};

/// What happened to one command during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    pub id: CommandId,
    pub connection: ConnectionId,
    pub kind: CommandKind,
    pub state: CommandState,
}

/// Summary of one executor tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Executed commands, in execution order
    pub outcomes: Vec<CommandOutcome>,
    /// Commands still queued after the tick
    pub remaining: usize,
}

impl TickReport {
    pub fn executed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn acknowledged(&self) -> usize {
        self.count(CommandState::Acknowledged)
    }

    pub fn dropped(&self) -> usize {
        self.count(CommandState::AckDropped)
    }

    fn count(&self, state: CommandState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }
}

/// Drains the command queue into the LED state
pub struct CommandExecutor {
    queue: Arc<CommandQueue>,
    strip: SharedStrip,
    registry: Arc<ConnectionRegistry>,
    drain_per_tick: usize,
}

impl CommandExecutor {
    /// Create a new command executor
    pub fn new(
        queue: Arc<CommandQueue>,
        strip: SharedStrip,
        registry: Arc<ConnectionRegistry>,
        drain_per_tick: usize,
    ) -> Self {
        Self {
            queue,
            strip,
            registry,
            drain_per_tick,
        }
    }

    /// Execute up to `drain_per_tick` queued commands
    ///
    /// Each command is applied before its ack is sent, so an ack always
    /// describes state that already exists.
    pub fn tick(&self) -> TickReport {
        let mut outcomes = Vec::new();
        let mut strip = self.strip.lock();

        while outcomes.len() < self.drain_per_tick {
            let Some(command) = self.queue.dequeue() else {
                break;
            };

            let mut lifecycle = CommandLifecycle::enqueued(command.id);
            advance(&mut lifecycle, LifecycleEvent::Dequeued);

            if let Err(e) = apply(&mut strip, &command.kind) {
                error!(
                    "Command {} ({}) from client {} failed: {}",
                    command.id,
                    command.kind.wire_name(),
                    command.connection,
                    e
                );
            }

            advance(&mut lifecycle, self.acknowledge(&command));

            outcomes.push(CommandOutcome {
                id: command.id,
                connection: command.connection,
                kind: command.kind,
                state: lifecycle.state(),
            });
        }
        drop(strip);

        TickReport {
            outcomes,
            remaining: self.queue.len(),
        }
    }

    /// Send the ack for an applied command, if its client is still there
    fn acknowledge(&self, command: &Command) -> LifecycleEvent {
        if self.registry.send_to(command.connection, Reply::Ack(command.id)) {
            LifecycleEvent::AckSent
        } else {
            debug!(
                "Client {} gone, dropping ack for command {}",
                command.connection, command.id
            );
            LifecycleEvent::AckDropped
        }
    }
}

/// Move a command's lifecycle forward, reporting a transition it does not allow
fn advance(lifecycle: &mut CommandLifecycle, event: LifecycleEvent) -> bool {
    match lifecycle.process_event(event) {
        TransitionResult::Success(_) => true,
        TransitionResult::Invalid { from, event } => {
            error!(
                "Command {}: invalid lifecycle transition {:?} from {:?}",
                lifecycle.id(),
                event,
                from
            );
            false
        }
    }
}

/// Apply one command to the LED state
fn apply(strip: &mut LedState, kind: &CommandKind) -> Result<(), StripError> {
    match *kind {
        CommandKind::SetPixel { index, color } => {
            strip.set_pixel(index, color);
        }
        CommandKind::SetAll { color } => strip.fill(color),
        CommandKind::Clear => strip.clear(),
        CommandKind::Show => strip.show()?,
        CommandKind::SetBrightness { level } => strip.set_brightness(level),
    }
    Ok(())
}
