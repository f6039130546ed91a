//! The event bus.
//!
//! One `EventBus` is created per session and shared by `Arc`. The sequencer
//! and the pipeline publish on it. Listeners either register a synchronous
//! handler, which runs on the publishing thread, or take a `broadcast`
//! receiver and poll it from a task.

use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{AppEvent, EventCategory};

/// Default broadcast buffer, in events
pub const DEFAULT_CAPACITY: usize = 1024;

/// Identifies a handler registered with [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Which events a handler is called for
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Every event.
    #[default]
    All,
    /// Events in any of these categories.
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

type Handler = Box<dyn Fn(AppEvent) + Send + Sync>;

/// Failure to deliver an event
#[derive(Debug, Clone, thiserror::Error)]
pub enum EventBusError {
    /// Neither a handler nor a receiver was listening
    #[error("No active subscribers")]
    NoSubscribers,
}

pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
    handlers: RwLock<HashMap<SubscriptionId, (EventFilter, Handler)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A bus whose receivers lag after `capacity` unread events
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Deliver `event` to matching handlers, then to every receiver
    ///
    /// Returns the number of receivers reached.
    pub fn publish(&self, event: AppEvent) -> Result<usize, EventBusError> {
        let handlers = self.handlers.read();
        for (filter, handler) in handlers.values() {
            if filter.matches(&event) {
                handler(event.clone());
            }
        }

        match self.sender.send(event) {
            Ok(count) => Ok(count),
            Err(_) if handlers.is_empty() => Err(EventBusError::NoSubscribers),
            Err(_) => Ok(0),
        }
    }

    /// Publish, ignoring the absence of listeners
    ///
    /// A motion run must never fail because nobody is watching.
    pub fn notify(&self, event: AppEvent) {
        if self.publish(event).is_err() {
            tracing::trace!("Event dropped, no listeners");
        }
    }

    /// Call `handler` for every event matching `filter`
    ///
    /// Handlers run on the publishing thread, which may be the motion
    /// worker, and must return quickly.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(AppEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(Uuid::new_v4());
        self.handlers.write().insert(id, (filter, Box::new(handler)));
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Returns false if `id` was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.handlers.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// A receiver that sees every event published from now on
    pub fn receiver(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handler_count())
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SequencerState;
    use crate::event_bus::events::{ConnectionEvent, MotionEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn progress(completed: usize) -> AppEvent {
        AppEvent::Motion(MotionEvent::Progress {
            completed,
            total: 10,
        })
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let id = bus.subscribe(EventFilter::All, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(bus.handler_count(), 1);
        assert!(matches!(bus.publish(progress(1)), Ok(0)));

        assert!(bus.unsubscribe(id));
        assert_eq!(bus.handler_count(), 0);
        assert!(!bus.unsubscribe(id));

        bus.notify(progress(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert!(matches!(
            bus.publish(progress(1)),
            Err(EventBusError::NoSubscribers)
        ));
        bus.notify(progress(2));
    }

    #[test]
    fn test_event_filtering() {
        let bus = EventBus::new();
        let connection_count = Arc::new(AtomicUsize::new(0));
        let motion_count = Arc::new(AtomicUsize::new(0));

        let cc = connection_count.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Connection]),
            move |_| {
                cc.fetch_add(1, Ordering::SeqCst);
            },
        );

        let mc = motion_count.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Motion]),
            move |_| {
                mc.fetch_add(1, Ordering::SeqCst);
            },
        );

        bus.notify(AppEvent::Connection(ConnectionEvent::Connected {
            sink: "simulation".to_string(),
        }));
        bus.notify(AppEvent::Motion(MotionEvent::StateChanged {
            from: SequencerState::Idle,
            to: SequencerState::Running,
        }));
        bus.notify(progress(1));

        assert_eq!(connection_count.load(Ordering::SeqCst), 1);
        assert_eq!(motion_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_receiver_lags_past_capacity() {
        let bus = EventBus::with_capacity(2);
        let mut receiver = bus.receiver();

        for i in 0..4 {
            bus.notify(progress(i));
        }

        assert!(matches!(
            receiver.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
        match receiver.recv().await {
            Ok(AppEvent::Motion(MotionEvent::Progress { completed, total })) => {
                assert_eq!(completed, 2);
                assert_eq!(total, 10);
            }
            other => panic!("Wrong event received: {:?}", other),
        }
    }
}
