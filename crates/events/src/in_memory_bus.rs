//! In-memory event bus.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, error};

use crate::bus::{EventBus, EventBusError, FailurePolicy, HandlerExecutionError, PublishReport};
use crate::{DomainEvent, EventHandler};

type HandlerList = Vec<Arc<dyn EventHandler>>;

/// Process-local pub/sub bus.
///
/// - Subscription table behind a `RwLock`; never held across an `.await`
/// - Handlers awaited one after another, in subscription order
/// - Handler errors and panics are contained per handler
pub struct InMemoryEventBus {
    subscriptions: RwLock<HashMap<String, HandlerList>>,
    policy: FailurePolicy,
    closed: AtomicBool,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: FailurePolicy) -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            policy,
            closed: AtomicBool::new(false),
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Drop every subscription and refuse further publishes.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("event bus shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn snapshot(&self, event_type: &str) -> HandlerList {
        // Poison is ignored: each mutation is a single push/retain.
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::with_policy(FailurePolicy::default())
    }
}

impl core::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let types: Vec<String> = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("InMemoryEventBus")
            .field("event_types", &types)
            .field("policy", &self.policy)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn same_handler(a: &Arc<dyn EventHandler>, b: &Arc<dyn EventHandler>) -> bool {
    // Data pointers only; vtable pointers are not unique.
    core::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

async fn invoke(
    handler: &dyn EventHandler,
    event: &DomainEvent,
) -> Result<(), HandlerExecutionError> {
    let failure = |reason: String, panicked: bool| HandlerExecutionError {
        handler: handler.name().to_string(),
        event_type: event.event_type().to_string(),
        event_id: event.event_id(),
        reason,
        panicked,
    };

    match AssertUnwindSafe(handler.handle(event)).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(failure(format!("{e:#}"), false)),
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "handler panicked".to_string());
            Err(failure(reason, true))
        }
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    fn subscribe(
        &self,
        event_type: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), EventBusError> {
        if self.is_closed() {
            return Err(EventBusError::Closed);
        }

        debug!(event_type, handler = handler.name(), "subscribing handler");
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
        Ok(())
    }

    fn unsubscribe(&self, event_type: &str, handler: &Arc<dyn EventHandler>) {
        let mut table = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(list) = table.get_mut(event_type) {
            list.retain(|h| !same_handler(h, handler));
            if list.is_empty() {
                table.remove(event_type);
            }
        }
    }

    async fn publish(&self, event: DomainEvent) -> Result<PublishReport, EventBusError> {
        if self.is_closed() {
            return Err(EventBusError::Closed);
        }

        let handlers = self.snapshot(event.event_type());
        let mut report = PublishReport::new(&event);

        debug!(
            event_type = event.event_type(),
            event_id = %event.event_id(),
            handlers = handlers.len(),
            "publishing event"
        );

        for handler in handlers {
            report.invoked += 1;
            if let Err(failure) = invoke(handler.as_ref(), &event).await {
                error!(
                    handler = %failure.handler,
                    event_type = %failure.event_type,
                    event_id = %failure.event_id,
                    panicked = failure.panicked,
                    reason = %failure.reason,
                    "event handler failed"
                );

                match self.policy {
                    FailurePolicy::Isolate => report.failures.push(failure),
                    FailurePolicy::FailFast => return Err(EventBusError::HandlerFailed(failure)),
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    /// Shared log of "<name>:start" / "<name>:end" entries.
    type Journal = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        journal: Journal,
        delay: Option<Duration>,
    }

    impl Recorder {
        fn new(name: &'static str, journal: &Journal) -> Arc<Self> {
            Arc::new(Self {
                name,
                journal: journal.clone(),
                delay: None,
            })
        }

        fn slow(name: &'static str, journal: &Journal, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name,
                journal: journal.clone(),
                delay: Some(delay),
            })
        }
    }

    #[async_trait]
    impl EventHandler for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        async fn handle(&self, _event: &DomainEvent) -> anyhow::Result<()> {
            self.journal.lock().unwrap().push(format!("{}:start", self.name));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.journal.lock().unwrap().push(format!("{}:end", self.name));
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn handle(&self, _event: &DomainEvent) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    struct Panicking;

    #[async_trait]
    impl EventHandler for Panicking {
        async fn handle(&self, _event: &DomainEvent) -> anyhow::Result<()> {
            panic!("boom")
        }
    }

    fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.lock().unwrap().clone()
    }

    fn event(event_type: &str) -> DomainEvent {
        DomainEvent::new(event_type, json!({ "id": 1 }))
    }

    #[tokio::test]
    async fn handlers_run_in_subscription_order_one_at_a_time() {
        let bus = InMemoryEventBus::new();
        let log = journal();
        bus.subscribe("X", Recorder::slow("h1", &log, Duration::from_millis(20)))
            .unwrap();
        bus.subscribe("X", Recorder::new("h2", &log)).unwrap();

        for _ in 0..3 {
            bus.publish(event("X")).await.unwrap();
        }

        let expected: Vec<String> = ["h1:start", "h1:end", "h2:start", "h2:end"]
            .iter()
            .cycle()
            .take(12)
            .map(|s| s.to_string())
            .collect();
        assert_eq!(entries(&log), expected);
    }

    #[tokio::test]
    async fn publish_only_reaches_handlers_of_that_type() {
        let bus = InMemoryEventBus::new();
        let log = journal();
        bus.subscribe("X", Recorder::new("x", &log)).unwrap();
        bus.subscribe("Y", Recorder::new("y", &log)).unwrap();

        let report = bus.publish(event("Y")).await.unwrap();

        assert_eq!(report.invoked, 1);
        assert_eq!(entries(&log), vec!["y:start", "y:end"]);
    }

    #[tokio::test]
    async fn publishing_with_no_subscribers_is_fine() {
        let bus = InMemoryEventBus::new();
        let report = bus.publish(event("nobody.listens")).await.unwrap();
        assert_eq!(report.invoked, 0);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn unsubscribe_only_affects_one_event_type() {
        let bus = InMemoryEventBus::new();
        let log = journal();
        let shared: Arc<dyn EventHandler> = Recorder::new("shared", &log);
        bus.subscribe("X", shared.clone()).unwrap();
        bus.subscribe("Y", shared.clone()).unwrap();

        bus.unsubscribe("X", &shared);

        bus.publish(event("X")).await.unwrap();
        assert!(entries(&log).is_empty());

        bus.publish(event("Y")).await.unwrap();
        assert_eq!(entries(&log), vec!["shared:start", "shared:end"]);
        assert_eq!(bus.subscriber_count("X"), 0);
        assert_eq!(bus.subscriber_count("Y"), 1);
    }

    #[tokio::test]
    async fn unsubscribe_matches_by_identity_not_by_name() {
        let bus = InMemoryEventBus::new();
        let log = journal();
        let first: Arc<dyn EventHandler> = Recorder::new("twin", &log);
        let second: Arc<dyn EventHandler> = Recorder::new("twin", &log);
        bus.subscribe("X", first.clone()).unwrap();
        bus.subscribe("X", second.clone()).unwrap();

        bus.unsubscribe("X", &first);

        assert_eq!(bus.subscriber_count("X"), 1);
        let report = bus.publish(event("X")).await.unwrap();
        assert_eq!(report.invoked, 1);
    }

    #[tokio::test]
    async fn unsubscribing_an_unknown_handler_is_a_no_op() {
        let bus = InMemoryEventBus::new();
        let log = journal();
        let stranger: Arc<dyn EventHandler> = Recorder::new("stranger", &log);
        bus.subscribe("X", Recorder::new("h", &log)).unwrap();

        bus.unsubscribe("X", &stranger);
        bus.unsubscribe("never-seen", &stranger);

        assert_eq!(bus.subscriber_count("X"), 1);
    }

    #[tokio::test]
    async fn duplicate_subscriptions_fire_per_subscription_and_unsubscribe_removes_all() {
        let bus = InMemoryEventBus::new();
        let log = journal();
        let h: Arc<dyn EventHandler> = Recorder::new("dup", &log);
        bus.subscribe("X", h.clone()).unwrap();
        bus.subscribe("X", h.clone()).unwrap();

        let report = bus.publish(event("X")).await.unwrap();
        assert_eq!(report.invoked, 2);

        bus.unsubscribe("X", &h);
        let report = bus.publish(event("X")).await.unwrap();
        assert_eq!(report.invoked, 0);
    }

    #[tokio::test]
    async fn a_failing_handler_does_not_stop_its_siblings() {
        let bus = InMemoryEventBus::new();
        let log = journal();
        bus.subscribe("X", Arc::new(Failing)).unwrap();
        bus.subscribe("X", Arc::new(Panicking)).unwrap();
        bus.subscribe("X", Recorder::new("after", &log)).unwrap();

        let report = bus.publish(event("X")).await.unwrap();

        assert_eq!(report.invoked, 3);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].handler, "failing");
        assert_eq!(report.failures[0].reason, "disk full");
        assert!(!report.failures[0].panicked);
        assert!(report.failures[1].panicked);
        assert_eq!(report.failures[1].reason, "boom");
        assert_eq!(entries(&log), vec!["after:start", "after:end"]);
    }

    #[tokio::test]
    async fn fail_fast_stops_at_the_first_failure() {
        let bus = InMemoryEventBus::with_policy(FailurePolicy::FailFast);
        let log = journal();
        bus.subscribe("X", Arc::new(Failing)).unwrap();
        bus.subscribe("X", Recorder::new("after", &log)).unwrap();

        let err = bus.publish(event("X")).await.unwrap_err();

        let EventBusError::HandlerFailed(failure) = err else {
            panic!("expected handler failure, got {err:?}");
        };
        assert_eq!(failure.handler, "failing");
        assert!(entries(&log).is_empty());
    }

    /// Subscribes a new handler while it is itself being delivered to.
    struct SelfReplicating {
        bus: Arc<InMemoryEventBus>,
        journal: Journal,
    }

    #[async_trait]
    impl EventHandler for SelfReplicating {
        fn name(&self) -> &str {
            "replicating"
        }

        async fn handle(&self, _event: &DomainEvent) -> anyhow::Result<()> {
            self.bus
                .subscribe("X", Recorder::new("late", &self.journal))
                .map_err(anyhow::Error::from)
        }
    }

    #[tokio::test]
    async fn subscriptions_made_during_a_publish_apply_to_the_next_one() {
        let bus = Arc::new(InMemoryEventBus::new());
        let log = journal();
        bus.subscribe(
            "X",
            Arc::new(SelfReplicating {
                bus: bus.clone(),
                journal: log.clone(),
            }),
        )
        .unwrap();

        let first = bus.publish(event("X")).await.unwrap();
        assert_eq!(first.invoked, 1);
        assert!(entries(&log).is_empty());

        let second = bus.publish(event("X")).await.unwrap();
        assert_eq!(second.invoked, 2);
        assert_eq!(entries(&log), vec!["late:start", "late:end"]);
    }

    #[tokio::test]
    async fn concurrent_publishes_and_subscriptions_do_not_interfere() {
        let bus = Arc::new(InMemoryEventBus::new());
        let log = journal();
        bus.subscribe("X", Recorder::slow("slow", &log, Duration::from_millis(5)))
            .unwrap();

        let mut tasks = Vec::new();
        for i in 0..8 {
            let bus = bus.clone();
            let log = log.clone();
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    bus.publish(event("X")).await.map(|r| r.invoked)
                } else {
                    let h: Arc<dyn EventHandler> = Recorder::new("churn", &log);
                    bus.subscribe("X", h.clone())?;
                    bus.unsubscribe("X", &h);
                    Ok(0)
                }
            }));
        }

        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(bus.subscriber_count("X"), 1);
    }

    #[tokio::test]
    async fn shutdown_clears_and_rejects() {
        let bus = InMemoryEventBus::new();
        let log = journal();
        bus.subscribe("X", Recorder::new("h", &log)).unwrap();

        bus.shutdown();

        assert_eq!(bus.subscriber_count("X"), 0);
        assert_eq!(bus.publish(event("X")).await, Err(EventBusError::Closed));
        assert_eq!(
            bus.subscribe("X", Recorder::new("h", &log)),
            Err(EventBusError::Closed)
        );
    }

    #[tokio::test]
    async fn detached_publish_delivers_in_the_background() {
        let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
        let log = journal();
        bus.subscribe("X", Recorder::new("bg", &log)).unwrap();

        let handle = crate::publish_detached(bus.clone(), event("X"));
        let report = handle.await.unwrap().unwrap();

        assert_eq!(report.invoked, 1);
        assert_eq!(entries(&log), vec!["bg:start", "bg:end"]);
    }
}
