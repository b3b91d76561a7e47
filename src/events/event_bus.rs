//! In-process publish/subscribe event bus.
//!
//! Dispatch is synchronous: every handler registered for an event name runs
//! to completion before [`EventBus::publish`] returns. Handlers are isolated
//! from each other; a panicking handler is logged and the remaining handlers
//! still run. No ordering is promised between handlers of the same event.
//!
//! The bus is an explicitly constructed handle. Clone it to share it between
//! components; all clones address the same registry and diagnostic buffer.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::event::Event;

/// Default number of events kept by the diagnostic buffer.
pub const DEFAULT_DIAGNOSTIC_CAPACITY: usize = 300;

/// A synchronous event handler receiving the event payload.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

// ---------------------------------------------------------------------------
// SubscriptionId
// ---------------------------------------------------------------------------

/// Identifies one registration on a bus.
///
/// Closures cannot be compared, so registrations are addressed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Diagnostic buffer
// ---------------------------------------------------------------------------

/// Bounded drop-oldest record of published events.
struct DiagnosticBuffer {
    capacity: usize,
    records: VecDeque<Event>,
}

impl DiagnosticBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: VecDeque::new(),
        }
    }

    fn push(&mut self, event: Event) {
        if self.capacity == 0 {
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(event);
    }

    fn snapshot(&self) -> Vec<Event> {
        self.records.iter().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

struct BusInner {
    /// Subscriber sets keyed by event name. Empty sets are removed.
    handlers: RwLock<HashMap<String, HashMap<SubscriptionId, EventHandler>>>,
    diagnostics_enabled: AtomicBool,
    diagnostics: Mutex<DiagnosticBuffer>,
    next_id: AtomicU64,
}

impl BusInner {
    fn allocate_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, event: &str, id: SubscriptionId, handler: EventHandler) {
        let mut map = self.handlers.write();
        map.entry(event.to_string()).or_default().insert(id, handler);
    }

    fn remove(&self, event: &str, id: SubscriptionId) -> bool {
        let mut map = self.handlers.write();
        let Some(set) = map.get_mut(event) else {
            return false;
        };
        let removed = set.remove(&id).is_some();
        if set.is_empty() {
            map.remove(event);
        }
        removed
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Disposer returned by [`EventBus::subscribe`] and [`EventBus::subscribe_once`].
///
/// Dropping a `Subscription` does not unsubscribe; registrations live until
/// [`unsubscribe`](Subscription::unsubscribe) is called or the bus is dropped.
pub struct Subscription {
    bus: Weak<BusInner>,
    event: String,
    id: SubscriptionId,
    active: AtomicBool,
}

impl Subscription {
    /// Remove exactly this registration. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(inner) = self.bus.upgrade() {
            inner.remove(&self.event, self.id);
        }
    }

    /// The registration id, usable with [`EventBus::unsubscribe`].
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The event name this subscription listens to.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Whether [`unsubscribe`](Self::unsubscribe) has not been called yet.
    ///
    /// A once-subscription that already fired still reports `true` here; use
    /// [`EventBus::subscriber_count`] to inspect the live registry.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Synchronous, many-to-many event dispatcher with optional diagnostics.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events = self.inner.handlers.read().len();
        f.debug_struct("EventBus")
            .field("events", &events)
            .field("diagnostics_enabled", &self.diagnostics_enabled())
            .finish()
    }
}

impl EventBus {
    /// Create a bus with the default diagnostic capacity (300 events).
    pub fn new() -> Self {
        Self::with_diagnostic_capacity(DEFAULT_DIAGNOSTIC_CAPACITY)
    }

    /// Create a bus whose diagnostic buffer keeps at most `capacity` events.
    pub fn with_diagnostic_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                handlers: RwLock::new(HashMap::new()),
                diagnostics_enabled: AtomicBool::new(false),
                diagnostics: Mutex::new(DiagnosticBuffer::new(capacity)),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register `handler` for `event`.
    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.inner.allocate_id();
        self.inner.insert(event, id, Arc::new(handler));
        self.subscription(event, id)
    }

    /// Register `handler` to fire at most once for `event`.
    ///
    /// The registration removes itself before `handler` runs, so a publish
    /// issued from inside the handler does not re-enter it.
    pub fn subscribe_once<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: FnOnce(&Value) + Send + 'static,
    {
        let id = self.inner.allocate_id();
        let weak = Arc::downgrade(&self.inner);
        let name = event.to_string();
        let slot = Mutex::new(Some(handler));

        let wrapper = move |payload: &Value| {
            // Taking the handler out of the slot is the at-most-once guard;
            // a snapshot taken by a concurrent publish finds it empty.
            let taken = slot.lock().take();
            if let Some(handler) = taken {
                if let Some(inner) = weak.upgrade() {
                    inner.remove(&name, id);
                }
                handler(payload);
            }
        };

        self.inner.insert(event, id, Arc::new(wrapper));
        self.subscription(event, id)
    }

    /// Remove the registration `id` from `event`. Returns whether it existed.
    pub fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool {
        self.inner.remove(event, id)
    }

    fn subscription(&self, event: &str, id: SubscriptionId) -> Subscription {
        Subscription {
            bus: Arc::downgrade(&self.inner),
            event: event.to_string(),
            id,
            active: AtomicBool::new(true),
        }
    }

    /// Number of live registrations for `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.inner
            .handlers
            .read()
            .get(event)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    /// Whether `event` currently has an entry in the registry.
    pub fn has_subscribers(&self, event: &str) -> bool {
        self.inner.handlers.read().contains_key(event)
    }

    // -----------------------------------------------------------------------
    // Emission
    // -----------------------------------------------------------------------

    /// Invoke every handler currently registered for `event` with `payload`.
    ///
    /// The subscriber set is snapshotted before dispatch; registrations made
    /// or removed by a handler take effect from the next publish on.
    pub fn publish(&self, event: &str, payload: Value) {
        if self.diagnostics_enabled() {
            self.inner
                .diagnostics
                .lock()
                .push(Event::new(event, payload.clone()));
        }

        let snapshot: Vec<(SubscriptionId, EventHandler)> = {
            let map = self.inner.handlers.read();
            match map.get(event) {
                Some(set) => set.iter().map(|(id, h)| (*id, h.clone())).collect(),
                None => return,
            }
        };

        for (id, handler) in snapshot {
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler(&payload)));
            if let Err(panic) = result {
                log::error!(
                    "[EventBus] Handler {} for '{}' panicked: {}",
                    id,
                    event,
                    panic_message(panic.as_ref())
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Toggle event recording. Existing records are kept either way.
    pub fn set_diagnostics(&self, enabled: bool) {
        self.inner
            .diagnostics_enabled
            .store(enabled, Ordering::SeqCst);
    }

    /// Whether published events are currently recorded.
    pub fn diagnostics_enabled(&self) -> bool {
        self.inner.diagnostics_enabled.load(Ordering::SeqCst)
    }

    /// Copy of the recorded events, oldest first.
    pub fn diagnostics(&self) -> Vec<Event> {
        self.inner.diagnostics.lock().snapshot()
    }

    /// Maximum number of events the diagnostic buffer keeps.
    pub fn diagnostic_capacity(&self) -> usize {
        self.inner.diagnostics.lock().capacity
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
