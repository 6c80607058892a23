//! Scheduling loop that drives the executor

use super::executor::{CommandExecutor, TickReport};
use crate::session::ConnectionRegistry;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::debug;

/// Runs housekeeping and one executor drain per tick
pub struct ExecutorTicker {
    executor: CommandExecutor,
    registry: Arc<ConnectionRegistry>,
    tick_interval: Duration,
}

impl ExecutorTicker {
    /// Create a new ticker
    pub fn new(
        executor: CommandExecutor,
        registry: Arc<ConnectionRegistry>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            executor,
            registry,
            tick_interval,
        }
    }

    /// Start the tick loop
    pub async fn run(self) {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick_once();
        }
    }

    /// Prune departed clients, then drain the queue once
    pub fn tick_once(&self) -> TickReport {
        let pruned = self.registry.prune_closed();
        if !pruned.is_empty() {
            debug!("Cleaned up {} closed connections", pruned.len());
        }

        let report = self.executor.tick();
        if report.executed() > 0 {
            debug!(
                "Executed {} commands ({} acked, {} dropped), {} still queued",
                report.executed(),
                report.acknowledged(),
                report.dropped(),
                report.remaining
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strip::{LedState, SimulatedStrip};
    use pixel_commander_shared::{Command, CommandKind, CommandQueue, Reply};

    fn ticker(queue: Arc<CommandQueue>, registry: Arc<ConnectionRegistry>) -> ExecutorTicker {
        let strip = LedState::shared(8, SimulatedStrip::new(5));
        let executor = CommandExecutor::new(queue, strip, registry.clone(), 10);
        ExecutorTicker::new(executor, registry, Duration::from_millis(1))
    }

    #[test]
    fn test_tick_prunes_closed_connections() {
        let queue = Arc::new(CommandQueue::new(8).unwrap());
        let registry = Arc::new(ConnectionRegistry::new());
        let ticker = ticker(queue.clone(), registry.clone());

        let (gone, rx) = registry.open("127.0.0.1:40000".parse().unwrap());
        queue.try_enqueue(Command::new(CommandKind::Clear, gone.id, 1)).unwrap();
        drop(rx);

        let report = ticker.tick_once();
        assert_eq!(registry.count(), 0);
        assert_eq!(report.dropped(), 1);
    }

    #[tokio::test]
    async fn test_run_drains_in_background() {
        let queue = Arc::new(CommandQueue::new(64).unwrap());
        let registry = Arc::new(ConnectionRegistry::new());
        let (handle, mut rx) = registry.open("127.0.0.1:40000".parse().unwrap());

        for id in 1..=30 {
            queue.try_enqueue(Command::new(CommandKind::Show, handle.id, id)).unwrap();
        }

        let task = tokio::spawn(ticker(queue.clone(), registry.clone()).run());

        for id in 1..=30 {
            assert_eq!(rx.recv().await, Some(Reply::Ack(id)));
        }
        assert!(queue.is_empty());
        task.abort();
    }
}
