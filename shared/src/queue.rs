//! Bounded FIFO of pending commands
//!
//! The queue is the only state shared between connection tasks (producers)
//! and the executor (consumer). Slots are allocated once; `write` and `read`
//! only ever advance, and a command lives in slot `index % capacity`.
//! A full queue refuses new commands instead of overwriting unread ones.

use parking_lot::Mutex;
use thiserror::Error;

use crate::Command;

/// Errors raised when building a queue
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue capacity must be at least 1")]
    ZeroCapacity,
}

/// A command refused because every slot was occupied
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Command queue full, rejected command {}", .0.id)]
pub struct QueueFull(pub Command);

struct Ring {
    slots: Box<[Option<Command>]>,
    read: u64,
    write: u64,
}

impl Ring {
    fn len(&self) -> usize {
        (self.write - self.read) as usize
    }

    fn slot(&self, position: u64) -> usize {
        (position % self.slots.len() as u64) as usize
    }
}

/// Fixed-capacity, multi-producer command queue
pub struct CommandQueue {
    ring: Mutex<Ring>,
    capacity: usize,
}

impl CommandQueue {
    /// Create a queue holding at most `capacity` commands
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }

        Ok(Self {
            ring: Mutex::new(Ring {
                slots: vec![None; capacity].into_boxed_slice(),
                read: 0,
                write: 0,
            }),
            capacity,
        })
    }

    /// Append a command, or hand it back if the queue is full
    pub fn try_enqueue(&self, command: Command) -> Result<(), QueueFull> {
        let mut ring = self.ring.lock();
        if ring.len() >= self.capacity {
            return Err(QueueFull(command));
        }

        let slot = ring.slot(ring.write);
        ring.slots[slot] = Some(command);
        ring.write += 1;
        Ok(())
    }

    /// Take the oldest command, if any
    pub fn dequeue(&self) -> Option<Command> {
        let mut ring = self.ring.lock();
        if ring.len() == 0 {
            return None;
        }

        let slot = ring.slot(ring.read);
        let command = ring.slots[slot].take();
        ring.read += 1;
        command
    }

    /// Number of buffered commands
    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
