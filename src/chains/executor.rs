//! Chain executor
//!
//! Runs one chain at a time: resolve each step's template, hand the text
//! to the dispatcher, then pace the next step. A step whose resolved text
//! is a draw command suspends the chain until the engine reports the
//! drawn card back, bounded by the configured poll budget so a swallowed
//! draw can never wedge the table.
//!
//! Waiting is event-driven on a [`Notify`] paired with an atomic flag.
//! The flag is authoritative and re-checked after every wakeup, so a
//! notification delivered before the executor starts listening is not
//! lost; the per-interval timeout only bounds how long a missed edge can
//! delay the re-check.

use crate::config::ExecutorTiming;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{ChainCatalog, Dispatcher, TemplateResolver};

/// Resolved step text with this prefix suspends the chain for a draw
pub const DRAW_COMMAND_PREFIX: &str = "/dice";

/// Shared run/wait/cancel state between the executor and the engine
#[derive(Debug, Default)]
pub struct ChainControl {
    running: AtomicBool,
    awaiting_draw: AtomicBool,
    cancel: AtomicBool,
    draw_release: Notify,
    finished: Notify,
}

impl ChainControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// True while a chain is suspended on an external draw
    pub fn is_awaiting_draw(&self) -> bool {
        self.awaiting_draw.load(Ordering::Acquire)
    }

    /// Report the awaited draw result back; wakes the suspended chain
    pub fn release_draw(&self) {
        self.awaiting_draw.store(false, Ordering::Release);
        self.draw_release.notify_waiters();
    }

    /// Ask the running chain to stop at its next step boundary
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Release);
        // Wake a draw wait immediately rather than letting it ride out
        // its poll budget.
        self.draw_release.notify_waiters();
    }

    fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Cancel the running chain and wait until it has wound down, up to
    /// `limit`. Returns true when the executor is idle on return.
    pub async fn cancel_and_wait(&self, limit: Duration) -> bool {
        if !self.is_running() {
            return true;
        }
        self.request_cancel();
        self.wait_idle(limit).await
    }

    /// Wait for the executor to go idle without cancelling anything
    pub async fn wait_idle(&self, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while self.is_running() {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let _ = timeout(remaining.min(Duration::from_millis(50)), self.finished.notified())
                .await;
        }
        true
    }

    fn begin(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn finish(&self) {
        self.awaiting_draw.store(false, Ordering::Release);
        self.cancel.store(false, Ordering::Release);
        self.running.store(false, Ordering::Release);
        self.finished.notify_waiters();
    }
}

/// Executes chains from a shared catalog
pub struct ChainExecutor {
    catalog: Arc<RwLock<ChainCatalog>>,
    resolver: Arc<dyn TemplateResolver>,
    dispatcher: Arc<dyn Dispatcher>,
    control: Arc<ChainControl>,
    timing: ExecutorTiming,
    speed_multiplier: f32,
}

impl ChainExecutor {
    pub fn new(
        catalog: Arc<RwLock<ChainCatalog>>,
        resolver: Arc<dyn TemplateResolver>,
        dispatcher: Arc<dyn Dispatcher>,
        timing: ExecutorTiming,
        speed_multiplier: f32,
    ) -> Self {
        Self {
            catalog,
            resolver,
            dispatcher,
            control: Arc::new(ChainControl::new()),
            timing,
            speed_multiplier,
        }
    }

    pub fn control(&self) -> Arc<ChainControl> {
        Arc::clone(&self.control)
    }

    /// Run a chain by name with full draw-wait and overlap protection.
    /// Unknown chains and overlapping runs are warnings, not errors; the
    /// table keeps playing either way.
    pub async fn run(&self, chain_name: &str, target: &str) {
        let steps = {
            let catalog = self.catalog.read().await;
            match catalog.get(chain_name) {
                Some(chain) => chain.steps.clone(),
                None => {
                    warn!(chain = chain_name, "chain not found, skipping");
                    return;
                }
            }
        };

        if !self.control.begin() {
            warn!(chain = chain_name, "executor busy, chain dropped");
            return;
        }

        debug!(chain = chain_name, recipient = target, steps = steps.len(), "chain start");
        for (index, step) in steps.iter().enumerate() {
            if self.control.cancel_requested() {
                debug!(chain = chain_name, step = index, "chain cancelled");
                break;
            }
            if !step.enabled || step.template.trim().is_empty() {
                continue;
            }

            let text = match self.resolver.resolve(&step.template, target).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(chain = chain_name, step = index, error = %e, "template failed");
                    continue;
                }
            };

            if text.trim_start().starts_with(DRAW_COMMAND_PREFIX) {
                // Arm the wait before dispatching so a result observed
                // immediately after delivery cannot slip past it.
                self.control.awaiting_draw.store(true, Ordering::Release);
                if let Err(e) = self.dispatcher.dispatch(&text).await {
                    self.control.awaiting_draw.store(false, Ordering::Release);
                    warn!(chain = chain_name, step = index, error = %e, "dispatch failed");
                    continue;
                }
                self.wait_for_draw(chain_name, index).await;
                if self.control.cancel_requested() {
                    debug!(chain = chain_name, step = index, "chain cancelled");
                    break;
                }
            } else if let Err(e) = self.dispatcher.dispatch(&text).await {
                warn!(chain = chain_name, step = index, error = %e, "dispatch failed");
                continue;
            }

            self.pace(step.delay_seconds).await;
        }

        self.control.finish();
        debug!(chain = chain_name, "chain done");
    }

    /// Run a chain without the overlap guard or draw waits. Branch chains
    /// fired while a card result is being handled use this; their draw
    /// already happened and the parent chain has been cancelled.
    pub async fn run_internal(&self, chain_name: &str, target: &str) {
        let steps = {
            let catalog = self.catalog.read().await;
            match catalog.get(chain_name) {
                Some(chain) => chain.steps.clone(),
                None => {
                    warn!(chain = chain_name, "chain not found, skipping");
                    return;
                }
            }
        };

        debug!(chain = chain_name, recipient = target, steps = steps.len(), "internal chain start");
        for (index, step) in steps.iter().enumerate() {
            if !step.enabled || step.template.trim().is_empty() {
                continue;
            }
            let text = match self.resolver.resolve(&step.template, target).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(chain = chain_name, step = index, error = %e, "template failed");
                    continue;
                }
            };
            if let Err(e) = self.dispatcher.dispatch(&text).await {
                warn!(chain = chain_name, step = index, error = %e, "dispatch failed");
                continue;
            }
            self.pace(step.delay_seconds).await;
        }
        debug!(chain = chain_name, "internal chain done");
    }

    /// Suspend until the draw flag clears, the chain is cancelled, or the
    /// poll budget runs out. A timed-out wait clears the flag itself and
    /// the chain continues degraded rather than wedging the table.
    async fn wait_for_draw(&self, chain_name: &str, step: usize) {
        let mut polls = 0u32;
        while self.control.is_awaiting_draw() && !self.control.cancel_requested() {
            if polls >= self.timing.max_draw_polls {
                self.control.awaiting_draw.store(false, Ordering::Release);
                warn!(
                    chain = chain_name,
                    step,
                    polls,
                    "draw result never arrived, continuing without it"
                );
                return;
            }
            polls += 1;
            let _ = timeout(
                self.timing.draw_poll_interval,
                self.control.draw_release.notified(),
            )
            .await;
        }
    }

    /// Scaled pause after a step, floored so chat output stays readable
    async fn pace(&self, delay_seconds: f32) {
        if delay_seconds <= 0.0 {
            return;
        }
        let scaled = Duration::from_secs_f32(delay_seconds * self.speed_multiplier);
        tokio::time::sleep(scaled.max(self.timing.min_step_delay)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::{ChainCatalog, Step};
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct RecordingDispatcher {
        sent: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl RecordingDispatcher {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail_on: None,
            })
        }

        fn failing_on(text: &str) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail_on: Some(text.to_string()),
            })
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl Dispatcher for RecordingDispatcher {
        async fn dispatch(&self, text: &str) -> Result<()> {
            if self.fail_on.as_deref() == Some(text) {
                return Err(Error::Dispatch("channel rejected message".into()));
            }
            self.sent.lock().push(text.to_string());
            Ok(())
        }
    }

    struct EchoResolver;

    #[async_trait]
    impl TemplateResolver for EchoResolver {
        async fn resolve(&self, template: &str, target: &str) -> Result<String> {
            Ok(template.replace("<t>", target))
        }
    }

    fn fast_timing() -> ExecutorTiming {
        ExecutorTiming {
            draw_poll_interval: Duration::from_millis(5),
            max_draw_polls: 4,
            min_step_delay: Duration::from_millis(1),
        }
    }

    fn executor_with(
        catalog: ChainCatalog,
        dispatcher: Arc<RecordingDispatcher>,
    ) -> Arc<ChainExecutor> {
        Arc::new(ChainExecutor::new(
            Arc::new(RwLock::new(catalog)),
            Arc::new(EchoResolver),
            dispatcher,
            fast_timing(),
            1.0,
        ))
    }

    #[tokio::test]
    async fn unknown_chain_is_a_no_op() {
        let dispatcher = RecordingDispatcher::new();
        let executor = executor_with(ChainCatalog::new(), Arc::clone(&dispatcher));

        executor.run("NoSuchChain", "Ann").await;
        assert!(dispatcher.sent().is_empty());
        assert!(!executor.control().is_running());
    }

    #[tokio::test]
    async fn plain_steps_dispatch_in_order_with_target() {
        let mut catalog = ChainCatalog::new();
        catalog.insert(
            "Greet",
            vec![Step::new("/p hello <t>", 0.0), Step::new("/p play on", 0.0)],
        );
        let dispatcher = RecordingDispatcher::new();
        let executor = executor_with(catalog, Arc::clone(&dispatcher));

        executor.run("Greet", "Ann").await;
        assert_eq!(dispatcher.sent(), vec!["/p hello Ann", "/p play on"]);
    }

    #[tokio::test]
    async fn disabled_and_empty_steps_are_skipped() {
        let mut catalog = ChainCatalog::new();
        let mut off = Step::new("/p never", 0.0);
        off.enabled = false;
        catalog.insert(
            "Mixed",
            vec![off, Step::new("   ", 0.0), Step::new("/p only", 0.0)],
        );
        let dispatcher = RecordingDispatcher::new();
        let executor = executor_with(catalog, Arc::clone(&dispatcher));

        executor.run("Mixed", "").await;
        assert_eq!(dispatcher.sent(), vec!["/p only"]);
    }

    #[tokio::test]
    async fn draw_step_waits_until_released() {
        let mut catalog = ChainCatalog::new();
        catalog.insert(
            "Hit",
            vec![Step::new("/dice party 13", 0.0), Step::new("/p after", 0.0)],
        );
        let dispatcher = RecordingDispatcher::new();
        let executor = executor_with(catalog, Arc::clone(&dispatcher));
        let control = executor.control();

        let runner = {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move { executor.run("Hit", "Ann").await })
        };

        // Wait for the chain to suspend on the draw, then release it.
        for _ in 0..100 {
            if control.is_awaiting_draw() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(control.is_awaiting_draw());
        control.release_draw();

        runner.await.unwrap();
        assert_eq!(dispatcher.sent(), vec!["/dice party 13", "/p after"]);
        assert!(!control.is_running());
    }

    #[tokio::test]
    async fn draw_wait_times_out_and_the_chain_continues() {
        let mut catalog = ChainCatalog::new();
        catalog.insert(
            "Hit",
            vec![Step::new("/dice party 13", 0.0), Step::new("/p after", 0.0)],
        );
        let dispatcher = RecordingDispatcher::new();
        let executor = executor_with(catalog, Arc::clone(&dispatcher));

        // Nobody releases the draw; the poll budget runs out.
        executor.run("Hit", "Ann").await;
        assert_eq!(dispatcher.sent(), vec!["/dice party 13", "/p after"]);
        assert!(!executor.control().is_awaiting_draw());
    }

    #[tokio::test]
    async fn cancel_stops_remaining_steps() {
        let mut catalog = ChainCatalog::new();
        catalog.insert(
            "Long",
            vec![
                Step::new("/dice party 13", 0.0),
                Step::new("/p never one", 0.0),
                Step::new("/p never two", 0.0),
            ],
        );
        let dispatcher = RecordingDispatcher::new();
        let executor = executor_with(catalog, Arc::clone(&dispatcher));
        let control = executor.control();

        let runner = {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move { executor.run("Long", "Ann").await })
        };

        for _ in 0..100 {
            if control.is_awaiting_draw() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(control.cancel_and_wait(Duration::from_secs(1)).await);

        runner.await.unwrap();
        assert_eq!(dispatcher.sent(), vec!["/dice party 13"]);
        assert!(!control.is_running());
    }

    #[tokio::test]
    async fn dispatch_failure_skips_the_step_but_not_the_chain() {
        let mut catalog = ChainCatalog::new();
        catalog.insert(
            "Flaky",
            vec![
                Step::new("/p one", 0.0),
                Step::new("/p broken", 0.0),
                Step::new("/p three", 0.0),
            ],
        );
        let dispatcher = RecordingDispatcher::failing_on("/p broken");
        let executor = executor_with(catalog, Arc::clone(&dispatcher));

        executor.run("Flaky", "").await;
        assert_eq!(dispatcher.sent(), vec!["/p one", "/p three"]);
    }

    #[tokio::test]
    async fn overlapping_run_is_dropped() {
        let mut catalog = ChainCatalog::new();
        catalog.insert("Waiting", vec![Step::new("/dice party 13", 0.0)]);
        catalog.insert("Second", vec![Step::new("/p second", 0.0)]);
        let dispatcher = RecordingDispatcher::new();
        let executor = executor_with(catalog, Arc::clone(&dispatcher));
        let control = executor.control();

        let runner = {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move { executor.run("Waiting", "").await })
        };
        for _ in 0..100 {
            if control.is_awaiting_draw() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        executor.run("Second", "").await;
        assert_eq!(dispatcher.sent(), vec!["/dice party 13"]);

        control.release_draw();
        runner.await.unwrap();
    }

    #[tokio::test]
    async fn cancel_and_wait_on_idle_executor_returns_immediately() {
        let dispatcher = RecordingDispatcher::new();
        let executor = executor_with(ChainCatalog::new(), dispatcher);
        assert!(executor.control().cancel_and_wait(Duration::from_millis(10)).await);
    }
}
