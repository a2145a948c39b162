//! In-process change notification.
//!
//! # Responsibility
//! - Carry fire-and-forget change events from the gateway to a delivery side.
//! - Track observers registered against content URIs.
//!
//! # Invariants
//! - `ChangeNotifier::notify` never blocks and never fails the caller.
//! - The event queue is bounded; events beyond its capacity are dropped with
//!   a warning until the dispatcher drains it.
//! - An event for URI `u` reaches observers registered on `u`, on an
//!   ancestor of `u`, or on a descendant of `u`.
//! - Dropping an `ObserverHandle` removes its registration.

use log::{debug, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Default number of undelivered events held by the queue.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Identifier of one observer registration.
pub type ObserverId = Uuid;

/// One "data under this URI may have changed" signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub uri: String,
}

/// Receiver of change events.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, uri: &str);
}

/// Observer that only remembers whether it was notified.
#[derive(Debug, Default)]
pub struct ChangeFlag {
    changed: AtomicBool,
}

impl ChangeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.changed.load(Ordering::Acquire)
    }

    /// Clears the flag, returning its previous value.
    pub fn take(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }
}

impl ChangeObserver for ChangeFlag {
    fn on_change(&self, _uri: &str) {
        self.changed.store(true, Ordering::Release);
    }
}

struct Registration {
    uri: String,
    observer: Arc<dyn ChangeObserver>,
}

#[derive(Default)]
struct ObserverRegistry {
    registrations: Mutex<BTreeMap<ObserverId, Registration>>,
}

impl ObserverRegistry {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<ObserverId, Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn observers_for(&self, uri: &str) -> Vec<Arc<dyn ChangeObserver>> {
        self.lock()
            .values()
            .filter(|registration| uris_overlap(&registration.uri, uri))
            .map(|registration| Arc::clone(&registration.observer))
            .collect()
    }
}

/// Sending half handed to the gateway.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: SyncSender<ChangeEvent>,
    registry: Arc<ObserverRegistry>,
}

impl ChangeNotifier {
    /// Queues a change event for `uri`.
    ///
    /// The event is dropped when the queue is full or the dispatcher is gone.
    pub fn notify(&self, uri: &str) {
        let event = ChangeEvent {
            uri: uri.to_string(),
        };
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("event=change_notify module=notify status=dropped reason=queue_full");
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("event=change_notify module=notify status=dropped reason=dispatcher_closed");
            }
        }
    }

    /// Registers `observer` against `uri` until the returned handle drops.
    pub fn register(&self, uri: &str, observer: Arc<dyn ChangeObserver>) -> ObserverHandle {
        let id = Uuid::new_v4();
        self.registry.lock().insert(
            id,
            Registration {
                uri: uri.to_string(),
                observer,
            },
        );
        debug!("event=observer_register module=notify status=ok observer_id={id}");
        ObserverHandle {
            id,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Number of live registrations.
    pub fn observer_count(&self) -> usize {
        self.registry.lock().len()
    }
}

/// Keeps one observer registered while alive.
pub struct ObserverHandle {
    id: ObserverId,
    registry: Arc<ObserverRegistry>,
}

impl ObserverHandle {
    pub fn id(&self) -> ObserverId {
        self.id
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.id);
    }
}

impl std::fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverHandle").field("id", &self.id).finish()
    }
}

/// Delivery half; owns the event queue.
pub struct ChangeDispatcher {
    rx: Receiver<ChangeEvent>,
    registry: Arc<ObserverRegistry>,
}

impl ChangeDispatcher {
    /// Delivers every queued event without blocking.
    ///
    /// Returns the number of observer deliveries performed.
    pub fn dispatch_pending(&self) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.rx.try_recv() {
            delivered += self.deliver(&event);
        }
        delivered
    }

    /// Blocks delivering events until every notifier is dropped.
    pub fn run(self) {
        for event in self.rx.iter() {
            self.deliver(&event);
        }
        debug!("event=dispatcher_stop module=notify status=ok");
    }

    /// Drains queued events without delivering them.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.rx.try_iter().collect()
    }

    fn deliver(&self, event: &ChangeEvent) -> usize {
        // Observers run outside the registry lock.
        let observers = self.registry.observers_for(&event.uri);
        for observer in &observers {
            observer.on_change(&event.uri);
        }
        observers.len()
    }
}

/// Creates a connected notifier/dispatcher pair with the default capacity.
pub fn notification_channel() -> (ChangeNotifier, ChangeDispatcher) {
    notification_channel_with_capacity(EVENT_QUEUE_CAPACITY)
}

/// Creates a connected pair whose queue holds at most `capacity` events.
pub fn notification_channel_with_capacity(capacity: usize) -> (ChangeNotifier, ChangeDispatcher) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    let registry = Arc::new(ObserverRegistry::default());
    (
        ChangeNotifier {
            tx,
            registry: Arc::clone(&registry),
        },
        ChangeDispatcher { rx, registry },
    )
}

fn uris_overlap(registered: &str, changed: &str) -> bool {
    registered == changed
        || is_path_ancestor(registered, changed)
        || is_path_ancestor(changed, registered)
}

fn is_path_ancestor(ancestor: &str, uri: &str) -> bool {
    uri.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::{
        notification_channel, notification_channel_with_capacity, uris_overlap, ChangeEvent,
        ChangeFlag,
    };
    use std::sync::Arc;

    const PETS: &str = "content://com.example.android.pets/pets";

    #[test]
    fn overlap_follows_path_segments() {
        assert!(uris_overlap(PETS, PETS));
        assert!(uris_overlap(PETS, &format!("{PETS}/1")));
        assert!(uris_overlap(&format!("{PETS}/1"), PETS));
        assert!(!uris_overlap(&format!("{PETS}/1"), &format!("{PETS}/2")));
        assert!(!uris_overlap(&format!("{PETS}/1"), &format!("{PETS}/10")));
    }

    #[test]
    fn dispatch_reaches_matching_observers_only() {
        let (notifier, dispatcher) = notification_channel();
        let collection = Arc::new(ChangeFlag::new());
        let item_one = Arc::new(ChangeFlag::new());
        let item_two = Arc::new(ChangeFlag::new());
        let _h1 = notifier.register(PETS, collection.clone());
        let _h2 = notifier.register(&format!("{PETS}/1"), item_one.clone());
        let _h3 = notifier.register(&format!("{PETS}/2"), item_two.clone());

        notifier.notify(&format!("{PETS}/1"));
        assert_eq!(dispatcher.dispatch_pending(), 2);
        assert!(collection.is_set());
        assert!(item_one.is_set());
        assert!(!item_two.is_set());
    }

    #[test]
    fn dropping_handle_unregisters() {
        let (notifier, dispatcher) = notification_channel();
        let flag = Arc::new(ChangeFlag::new());
        let handle = notifier.register(PETS, flag.clone());
        assert_eq!(notifier.observer_count(), 1);
        drop(handle);
        assert_eq!(notifier.observer_count(), 0);

        notifier.notify(PETS);
        assert_eq!(dispatcher.dispatch_pending(), 0);
        assert!(!flag.is_set());
    }

    #[test]
    fn notify_after_dispatcher_drop_is_silent() {
        let (notifier, dispatcher) = notification_channel();
        drop(dispatcher);
        notifier.notify(PETS);
    }

    #[test]
    fn full_queue_drops_new_events_without_blocking() {
        let (notifier, dispatcher) = notification_channel_with_capacity(2);
        for id in 1..=5 {
            notifier.notify(&format!("{PETS}/{id}"));
        }

        let kept = dispatcher.drain();
        assert_eq!(
            kept,
            vec![
                ChangeEvent {
                    uri: format!("{PETS}/1"),
                },
                ChangeEvent {
                    uri: format!("{PETS}/2"),
                },
            ]
        );

        notifier.notify(PETS);
        assert_eq!(dispatcher.drain().len(), 1);
    }

    #[test]
    fn run_stops_when_notifiers_are_gone() {
        let (notifier, dispatcher) = notification_channel();
        let flag = Arc::new(ChangeFlag::new());
        let _handle = notifier.register(PETS, flag.clone());
        let worker = std::thread::spawn(move || dispatcher.run());

        notifier.notify(PETS);
        drop(notifier);
        worker.join().expect("dispatcher thread should exit cleanly");
        assert!(flag.is_set());
    }
}
