//! In-process event bus
//!
//! A small publish/subscribe hub carrying the notifications that cross the
//! host boundary: upload progress ticks from the backend, the captured OAuth
//! redirect, and the window lifecycle signals this layer produces.
//!
//! ## Delivery
//!
//! Handlers run inline on the publishing task, in registration order, and
//! never while the registry lock is held (a handler may publish or
//! unsubscribe). Events of one topic are delivered in publish order; there
//! is no ordering across topics.
//!
//! ## Teardown
//!
//! Every registration is owned by a [`Subscription`]. Calling
//! [`Subscription::unlisten`] or dropping the value removes the handler, so
//! every exit path of the subscriber releases it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use anyhow::{bail, Context};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::trace;

// ============================================================================
// Topics and events
// ============================================================================

/// Named channel on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// `(file_name, percent)` ticks emitted while a transfer runs
    UploadProgress,
    /// The redirected URL captured by the loopback listener
    OAuthCallback,
    /// Hide the tray window
    Close,
    /// Show the tray window
    Open,
    /// Exit the process
    Quit,
}

impl Topic {
    /// Wire name used by the host
    pub const fn as_str(&self) -> &'static str {
        match self {
            Topic::UploadProgress => "upload-progress",
            Topic::OAuthCallback => "oauth_callback",
            Topic::Close => "close",
            Topic::Open => "open",
            Topic::Quit => "quit",
        }
    }

    pub fn parse(name: &str) -> Option<Topic> {
        match name {
            "upload-progress" => Some(Topic::UploadProgress),
            "oauth_callback" => Some(Topic::OAuthCallback),
            "close" => Some(Topic::Close),
            "open" => Some(Topic::Open),
            "quit" => Some(Topic::Quit),
            _ => None,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event together with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    UploadProgress { file_name: String, percent: u8 },
    OAuthCallback { url: String },
    Close,
    Open,
    Quit,
}

impl BusEvent {
    pub fn progress(file_name: impl Into<String>, percent: u8) -> Self {
        BusEvent::UploadProgress {
            file_name: file_name.into(),
            percent,
        }
    }

    pub fn oauth_callback(url: impl Into<String>) -> Self {
        BusEvent::OAuthCallback { url: url.into() }
    }

    pub fn topic(&self) -> Topic {
        match self {
            BusEvent::UploadProgress { .. } => Topic::UploadProgress,
            BusEvent::OAuthCallback { .. } => Topic::OAuthCallback,
            BusEvent::Close => Topic::Close,
            BusEvent::Open => Topic::Open,
            BusEvent::Quit => Topic::Quit,
        }
    }

    /// Payload in the host wire shape
    ///
    /// Progress is a two-element array `["name", 42]`, the redirect is a
    /// bare URL string and lifecycle signals carry `null`.
    pub fn to_wire(&self) -> Value {
        match self {
            BusEvent::UploadProgress { file_name, percent } => {
                Value::Array(vec![Value::from(file_name.as_str()), Value::from(*percent)])
            }
            BusEvent::OAuthCallback { url } => Value::from(url.as_str()),
            BusEvent::Close | BusEvent::Open | BusEvent::Quit => Value::Null,
        }
    }

    /// Decodes an event received from the host
    ///
    /// Progress values above 100 are clamped.
    pub fn from_wire(topic: &str, payload: Value) -> anyhow::Result<Self> {
        let Some(parsed) = Topic::parse(topic) else {
            bail!("Unknown event topic: {topic}");
        };

        let event = match parsed {
            Topic::UploadProgress => {
                let (file_name, percent): (String, u64) = serde_json::from_value(payload)
                    .context("Invalid upload-progress payload")?;
                BusEvent::UploadProgress {
                    file_name,
                    percent: percent.min(100) as u8,
                }
            }
            Topic::OAuthCallback => {
                let url: String =
                    serde_json::from_value(payload).context("Invalid oauth_callback payload")?;
                BusEvent::OAuthCallback { url }
            }
            Topic::Close => BusEvent::Close,
            Topic::Open => BusEvent::Open,
            Topic::Quit => BusEvent::Quit,
        };
        Ok(event)
    }
}

// ============================================================================
// EventBus
// ============================================================================

type Handler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<Topic, Vec<(u64, Handler)>>,
}

/// Publish/subscribe hub shared by the use cases and the host adapters
#[derive(Default)]
pub struct EventBus {
    registry: Mutex<Registry>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock();
        let counts: HashMap<&str, usize> = registry
            .handlers
            .iter()
            .map(|(topic, hs)| (topic.as_str(), hs.len()))
            .collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_id(&self) -> u64 {
        let mut registry = self.lock();
        registry.next_id += 1;
        registry.next_id
    }

    fn register(&self, topic: Topic, id: u64, handler: Handler) {
        self.lock()
            .handlers
            .entry(topic)
            .or_default()
            .push((id, handler));
    }

    fn remove(&self, topic: Topic, id: u64) -> bool {
        let mut registry = self.lock();
        let Some(handlers) = registry.handlers.get_mut(&topic) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(hid, _)| *hid != id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            registry.handlers.remove(&topic);
        }
        removed
    }

    /// Registers `handler` for every event of `topic`
    pub fn listen<F>(self: &Arc<Self>, topic: Topic, handler: F) -> Subscription
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let id = self.allocate_id();
        self.register(topic, id, Arc::new(handler));
        trace!(%topic, id, "Listener registered");
        Subscription {
            bus: Arc::downgrade(self),
            topic,
            id,
            active: true,
        }
    }

    /// Captures at most one event of `topic`
    ///
    /// The handler removes itself on first delivery; [`OnceSubscription`]
    /// releases it on every other exit path.
    pub fn once(self: &Arc<Self>, topic: Topic) -> OnceSubscription {
        let (tx, rx) = oneshot::channel();
        let slot = Mutex::new(Some(tx));
        let id = self.allocate_id();
        let bus = Arc::downgrade(self);

        let handler: Handler = Arc::new(move |event: &BusEvent| {
            let sender = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(sender) = sender {
                let _ = sender.send(event.clone());
                if let Some(bus) = bus.upgrade() {
                    bus.remove(topic, id);
                }
            }
        });
        self.register(topic, id, handler);
        trace!(%topic, id, "One-shot listener registered");

        OnceSubscription {
            rx,
            subscription: Subscription {
                bus: Arc::downgrade(self),
                topic,
                id,
                active: true,
            },
        }
    }

    /// Delivers `event` to every current listener of its topic
    ///
    /// Returns the number of handlers invoked.
    pub fn publish(&self, event: BusEvent) -> usize {
        let topic = event.topic();
        let handlers: Vec<Handler> = self
            .lock()
            .handlers
            .get(&topic)
            .map(|hs| hs.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        trace!(%topic, subscribers = handlers.len(), "Publishing event");
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    /// Number of live listeners on `topic`
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.lock().handlers.get(&topic).map_or(0, Vec::len)
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

/// Ownership of one registered handler
#[must_use = "dropping a Subscription removes its handler"]
pub struct Subscription {
    bus: Weak<EventBus>,
    topic: Topic,
    id: u64,
    active: bool,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Removes the handler
    pub fn unlisten(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.topic, self.id);
            trace!(topic = %self.topic, id = self.id, "Listener removed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

/// A subscription that yields at most one event
#[must_use = "dropping a OnceSubscription removes its handler"]
#[derive(Debug)]
pub struct OnceSubscription {
    rx: oneshot::Receiver<BusEvent>,
    subscription: Subscription,
}

impl OnceSubscription {
    pub fn topic(&self) -> Topic {
        self.subscription.topic
    }

    /// Waits for the single delivery, or `None` after `timeout`
    ///
    /// The handler is gone when this returns, whichever way it returns.
    pub async fn wait(mut self, timeout: Duration) -> Option<BusEvent> {
        let received = tokio::time::timeout(timeout, &mut self.rx).await;
        self.subscription.release();
        match received {
            Ok(Ok(event)) => Some(event),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_topic_wire_names_round_trip() {
        for topic in [
            Topic::UploadProgress,
            Topic::OAuthCallback,
            Topic::Close,
            Topic::Open,
            Topic::Quit,
        ] {
            assert_eq!(Topic::parse(topic.as_str()), Some(topic));
        }
        assert_eq!(Topic::parse("tray-click"), None);
    }

    #[test]
    fn test_from_wire_decodes_progress_tuple() {
        let event =
            BusEvent::from_wire("upload-progress", serde_json::json!(["shot.png", 42])).unwrap();
        assert_eq!(event, BusEvent::progress("shot.png", 42));

        let clamped =
            BusEvent::from_wire("upload-progress", serde_json::json!(["big.iso", 300])).unwrap();
        assert_eq!(clamped, BusEvent::progress("big.iso", 100));
    }

    #[test]
    fn test_from_wire_decodes_redirect_url() {
        let event = BusEvent::from_wire(
            "oauth_callback",
            serde_json::json!("http://localhost:4242/?code=abc"),
        )
        .unwrap();
        assert_eq!(event, BusEvent::oauth_callback("http://localhost:4242/?code=abc"));
        assert_eq!(event.to_wire(), serde_json::json!("http://localhost:4242/?code=abc"));
    }

    #[test]
    fn test_from_wire_rejects_bad_payloads() {
        assert!(BusEvent::from_wire("upload-progress", serde_json::json!("nope")).is_err());
        assert!(BusEvent::from_wire("unknown", Value::Null).is_err());
    }

    #[test]
    fn test_progress_to_wire_shape() {
        assert_eq!(
            BusEvent::progress("a.txt", 10).to_wire(),
            serde_json::json!(["a.txt", 10])
        );
        assert_eq!(BusEvent::Close.to_wire(), Value::Null);
    }

    #[test]
    fn test_listen_receives_only_its_topic() {
        let bus = Arc::new(EventBus::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let _sub = bus.listen(Topic::UploadProgress, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.publish(BusEvent::progress("a", 5)), 1);
        assert_eq!(bus.publish(BusEvent::Open), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unlisten_and_drop_remove_handler() {
        let bus = Arc::new(EventBus::new());
        let sub = bus.listen(Topic::Close, |_| {});
        assert_eq!(bus.subscriber_count(Topic::Close), 1);
        sub.unlisten();
        assert_eq!(bus.subscriber_count(Topic::Close), 0);

        {
            let _sub = bus.listen(Topic::Close, |_| {});
            assert_eq!(bus.subscriber_count(Topic::Close), 1);
        }
        assert_eq!(bus.subscriber_count(Topic::Close), 0);
        assert_eq!(bus.publish(BusEvent::Close), 0);
    }

    #[test]
    fn test_handler_may_publish_reentrantly() {
        let bus = Arc::new(EventBus::new());
        let opened = Arc::new(AtomicUsize::new(0));
        let inner_bus = bus.clone();
        let _close = bus.listen(Topic::Close, move |_| {
            inner_bus.publish(BusEvent::Open);
        });
        let counter = opened.clone();
        let _open = bus.listen(Topic::Open, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(BusEvent::Close);
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_outliving_bus_is_harmless() {
        let bus = Arc::new(EventBus::new());
        let sub = bus.listen(Topic::Quit, |_| {});
        drop(bus);
        assert!(sub.is_active());
        sub.unlisten();
    }

    #[tokio::test]
    async fn test_once_delivers_first_event_and_removes_itself() {
        let bus = Arc::new(EventBus::new());
        let once = bus.once(Topic::OAuthCallback);
        assert_eq!(bus.subscriber_count(Topic::OAuthCallback), 1);

        assert_eq!(bus.publish(BusEvent::oauth_callback("http://localhost:1/?code=1")), 1);
        assert_eq!(bus.subscriber_count(Topic::OAuthCallback), 0);
        assert_eq!(bus.publish(BusEvent::oauth_callback("http://localhost:1/?code=2")), 0);

        let event = once.wait(Duration::from_secs(1)).await;
        assert_eq!(event, Some(BusEvent::oauth_callback("http://localhost:1/?code=1")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_times_out_and_releases() {
        let bus = Arc::new(EventBus::new());
        let once = bus.once(Topic::OAuthCallback);

        let event = once.wait(Duration::from_secs(30)).await;
        assert!(event.is_none());
        assert_eq!(bus.subscriber_count(Topic::OAuthCallback), 0);
    }

    #[test]
    fn test_dropping_once_releases() {
        let bus = Arc::new(EventBus::new());
        let once = bus.once(Topic::OAuthCallback);
        drop(once);
        assert_eq!(bus.subscriber_count(Topic::OAuthCallback), 0);
    }
}
