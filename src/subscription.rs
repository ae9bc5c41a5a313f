//! Subscription handles: non-owning references and scoped auto-removal.
//!
//! Handler bodies have no usable notion of equality, so removal goes
//! through the handle returned at registration time instead of through the
//! handler value itself. A [`SubscriptionHandle`] is non-owning and can be
//! ignored outright when the subscriber should live as long as its topic;
//! [`ScopedSubscription`] ties the subscription to a scope.

use std::mem;
use std::sync::Weak;

use crate::topic::{ErasedCollection, SubscriberId};

/// Non-owning reference to one registered subscriber.
///
/// Clones reference the same subscriber; dropping a handle never removes
/// anything. [`unsubscribe`](Self::unsubscribe) is idempotent: an empty
/// handle, a repeated call, or a topic that has already been dropped are
/// all no-ops.
#[derive(Clone, Default)]
pub struct SubscriptionHandle {
    target: Option<(Weak<dyn ErasedCollection>, SubscriberId)>,
}

impl SubscriptionHandle {
    /// Creates an empty handle referencing no subscriber.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(collection: Weak<dyn ErasedCollection>, id: SubscriberId) -> Self {
        SubscriptionHandle {
            target: Some((collection, id)),
        }
    }

    /// Remove the referenced subscriber and empty this handle.
    pub fn unsubscribe(&mut self) {
        if let Some((collection, id)) = self.target.take() {
            if let Some(collection) = collection.upgrade() {
                collection.remove(id);
            }
        }
    }

    /// Empty this handle without removing the subscription.
    pub fn clear(&mut self) {
        self.target = None;
    }

    /// True while the referenced subscriber is still registered.
    ///
    /// Reports false for an empty handle, for a handle whose topic has been
    /// dropped, and after the subscriber was removed through any handle.
    pub fn is_subscribed(&self) -> bool {
        match &self.target {
            Some((collection, id)) => collection
                .upgrade()
                .is_some_and(|collection| collection.contains(*id)),
            None => false,
        }
    }
}

/// Owning wrapper around a [`SubscriptionHandle`] that unsubscribes when it
/// goes out of scope.
///
/// Ownership is unique, so the type is move-only. Use
/// [`release`](Self::release) to keep the subscription alive past the
/// scope.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use topicbus::{EventRegistry, ScopedSubscription};
///
/// let registry = EventRegistry::new();
/// let topic = registry.register::<()>("document/saved").unwrap();
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// {
///     let count = Arc::clone(&hits);
///     let _scoped: ScopedSubscription = topic
///         .subscribe(move || {
///             count.fetch_add(1, Ordering::SeqCst);
///         })
///         .into();
///     topic.call(());
/// }
/// // leaving the scope removed the subscriber
/// topic.call(());
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[derive(Default)]
pub struct ScopedSubscription {
    handle: SubscriptionHandle,
}

impl ScopedSubscription {
    /// Creates an empty scoped subscription owning nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Remove the owned subscription now instead of at drop time.
    pub fn unsubscribe(&mut self) {
        self.handle.unsubscribe();
    }

    /// True while the owned subscriber is still registered.
    pub fn is_subscribed(&self) -> bool {
        self.handle.is_subscribed()
    }

    /// Take ownership of `handle`, unsubscribing the previously owned
    /// subscription first.
    pub fn replace(&mut self, handle: SubscriptionHandle) {
        self.handle.unsubscribe();
        self.handle = handle;
    }

    /// Give up ownership without unsubscribing, returning the non-owning
    /// handle.
    pub fn release(mut self) -> SubscriptionHandle {
        mem::take(&mut self.handle)
    }
}

impl From<SubscriptionHandle> for ScopedSubscription {
    /// Take ownership of a non-owning handle.
    fn from(handle: SubscriptionHandle) -> Self {
        ScopedSubscription { handle }
    }
}

impl Drop for ScopedSubscription {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::EventRegistry;

    use super::*;

    fn counting_topic(
        registry: &EventRegistry,
    ) -> (crate::Topic<(String,)>, Arc<AtomicUsize>) {
        let topic = registry.register::<(String,)>("counted").unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        topic.subscribe(move |_: String| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (topic, hits)
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let registry = EventRegistry::new();
        let topic = registry.register::<(String,)>("idempotent").unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let mut handle = topic.subscribe(move |_: String| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        topic.call(("one".to_string(),));
        handle.unsubscribe();
        handle.unsubscribe();
        topic.call(("two".to_string(),));

        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let mut empty = SubscriptionHandle::empty();
        empty.unsubscribe();
        assert!(!empty.is_subscribed());
    }

    #[test]
    fn clear_keeps_the_subscription_alive() {
        let registry = EventRegistry::new();
        let (topic, hits) = counting_topic(&registry);

        let mut handle = topic.subscribe(|_: String| {});
        assert_eq!(topic.subscriber_count(), 2);

        handle.clear();
        handle.unsubscribe();
        assert_eq!(topic.subscriber_count(), 2);

        topic.call(("still here".to_string(),));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handle_outliving_its_registry_is_a_no_op() {
        let mut handle = {
            let registry = EventRegistry::new();
            let topic = registry.register::<(String,)>("short-lived").unwrap();
            topic.subscribe(|_: String| {})
        };

        assert!(!handle.is_subscribed());
        handle.unsubscribe();
    }

    #[test]
    fn clones_reference_the_same_subscriber() {
        let registry = EventRegistry::new();
        let (topic, hits) = counting_topic(&registry);

        let handle = topic.subscribe(|_: String| {});
        let mut twin = handle.clone();
        twin.unsubscribe();

        assert!(!handle.is_subscribed());
        assert_eq!(topic.subscriber_count(), 1);

        topic.call(("after twin removal".to_string(),));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn scoped_subscription_unsubscribes_on_drop() {
        let registry = EventRegistry::new();
        let topic = registry.register::<()>("scoped").unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        {
            let counter = Arc::clone(&hits);
            let _scoped = ScopedSubscription::from(topic.subscribe(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
            topic.call(());
        }
        topic.call(());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(topic.subscriber_count(), 0);
    }

    #[test]
    fn release_detaches_ownership() {
        let registry = EventRegistry::new();
        let topic = registry.register::<()>("released").unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let scoped = ScopedSubscription::from(topic.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let handle = scoped.release();
        topic.call(());

        assert!(handle.is_subscribed());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn replace_unsubscribes_the_previous_subscription() {
        let registry = EventRegistry::new();
        let topic = registry.register::<()>("replaced").unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));

        let first_order = Arc::clone(&order);
        let mut scoped = ScopedSubscription::from(topic.subscribe(move || {
            first_order.lock().unwrap().push("first");
        }));

        let second_order = Arc::clone(&order);
        scoped.replace(topic.subscribe(move || {
            second_order.lock().unwrap().push("second");
        }));

        topic.call(());
        assert_eq!(*order.lock().unwrap(), vec!["second"]);
    }
}
