//! Command Lifecycle
//!
//! Tracks a single command from the queue to its acknowledgment.
//!
//! ```text
//! Enqueued --Dequeued--> Executing --AckSent-----> Acknowledged
//!                                  \--AckDropped--> AckDropped
//! ```
//!
//! There is no retry edge: a command runs once or was never queued.

use crate::CommandId;

/// Where a command is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Enqueued,
    Executing,
    Acknowledged,
    /// Applied, but the connection was gone when the ack was due
    AckDropped,
}

/// Events that move a command forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Taken off the queue for execution
    Dequeued,
    /// Mutation applied and ack delivered
    AckSent,
    /// Mutation applied, no live connection to tell
    AckDropped,
}

/// Result of a transition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    Success(CommandState),
    Invalid {
        from: CommandState,
        event: LifecycleEvent,
    },
}

/// Lifecycle of one command
#[derive(Debug, Clone, Copy)]
pub struct CommandLifecycle {
    id: CommandId,
    state: CommandState,
}

impl CommandLifecycle {
    /// Start tracking a command that is sitting in the queue
    pub fn enqueued(id: CommandId) -> Self {
        Self {
            id,
            state: CommandState::Enqueued,
        }
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    /// True once the command can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            CommandState::Acknowledged | CommandState::AckDropped
        )
    }

    /// Apply an event, leaving the state unchanged if it is not allowed
    pub fn process_event(&mut self, event: LifecycleEvent) -> TransitionResult {
        use CommandState::*;

        let next = match (self.state, event) {
            (Enqueued, LifecycleEvent::Dequeued) => Some(Executing),
            (Executing, LifecycleEvent::AckSent) => Some(Acknowledged),
            (Executing, LifecycleEvent::AckDropped) => Some(AckDropped),
            _ => None,
        };

        match next {
            Some(state) => {
                self.state = state;
                TransitionResult::Success(state)
            }
            None => TransitionResult::Invalid {
                from: self.state,
                event,
            },
        }
    }
}
