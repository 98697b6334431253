use std::sync::Arc;
use std::time::Duration;

use monitor_logging::{monitor_debug, monitor_trace};
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{Backend, EngineEvent, EventSink};

/// Cancellation handle for one job's poll loop.
///
/// Stopping only halts future ticks; fetches already in flight still report
/// through the sink and must be discarded by the receiver if stale.
#[derive(Debug)]
pub struct PollHandle {
    task_id: String,
    token: CancellationToken,
}

impl PollHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn stop(self) {
        monitor_debug!("Stopping poller for {}", self.task_id);
        self.token.cancel();
    }
}

/// Starts polling `task_id` every `period` on `runtime`.
///
/// Ticks are wall-clock periodic: each tick spawns its own fetch, so a slow
/// response does not delay the next tick and fetches may overlap.
pub fn spawn_poller(
    runtime: &Handle,
    backend: Arc<dyn Backend>,
    task_id: String,
    period: Duration,
    sink: Arc<dyn EventSink>,
) -> PollHandle {
    let token = CancellationToken::new();
    let handle = PollHandle {
        task_id: task_id.clone(),
        token: token.clone(),
    };
    let spawner = runtime.clone();

    runtime.spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    monitor_trace!("Poll tick for {}", task_id);
                    let backend = backend.clone();
                    let sink = sink.clone();
                    let task_id = task_id.clone();
                    spawner.spawn(async move {
                        let result = backend.status(&task_id).await;
                        sink.emit(EngineEvent::StatusFetched { task_id, result });
                    });
                }
            }
        }
        monitor_debug!("Poller for {} exited", task_id);
    });

    handle
}
