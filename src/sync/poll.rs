//! Owned polling timers.
//!
//! A `PollTask` runs its tick immediately and then once per period until it
//! is dropped. Dropping aborts the task, including any request the tick is
//! awaiting, so a timer can never outlive the selection or view that owns it.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub struct PollTask {
    name: String,
    handle: JoinHandle<()>,
}

impl PollTask {
    /// Spawn a timer that awaits `tick()` now and then every `period`.
    ///
    /// Ticks never overlap: a slow tick delays the next one.
    pub fn spawn<F, Fut>(name: impl Into<String>, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        tracing::debug!("Arming {} poll every {:?}", name, period);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick().await;
            }
        });

        Self { name, handle }
    }

    #[cfg(test)]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        tracing::debug!("Cancelling {} poll", self.name);
        self.handle.abort();
    }
}
