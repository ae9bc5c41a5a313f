//! Topics: subscriber collections plus the typed and erased handles to them.
//!
//! A topic owns one [`SubscriberCollection`]: the registration-ordered list
//! of handlers for its argument tuple. Collections are shared through
//! [`Topic`] (typed: subscribe and invoke) and [`AnyTopic`] (signature-
//! erased: introspection and textual invocation only).
//!
//! Invocation snapshots the subscriber list under a short read lock and runs
//! the handlers lock-free. Subscribing or unsubscribing while an invocation
//! is in flight — including from inside a running handler — is therefore
//! well-defined: the mutation takes effect from the next invocation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use std::any::Any;

use crate::args::{EventArgs, HandlerFn, IntoHandler, IntoHandlerIgnoringResult, Signature};
use crate::error::MarshalError;
use crate::marshal::ParameterKind;
use crate::queue::EventQueue;
use crate::subscription::SubscriptionHandle;

/// Stable identity of a subscriber collection, used to match queued events
/// back to their topic without comparing names.
pub(crate) type TopicId = u64;

static NEXT_TOPIC_ID: AtomicU64 = AtomicU64::new(0);

/// Identifies one subscriber within its collection. Ids are handed out in
/// increasing order and never reused, so a stale id removes nothing.
pub(crate) type SubscriberId = u64;

struct Subscriber<A> {
    id: SubscriberId,
    call: HandlerFn<A>,
}

struct Subscribers<A> {
    list: Vec<Subscriber<A>>,
    next_id: SubscriberId,
}

/// The subscribers registered for one topic, in registration order.
pub(crate) struct SubscriberCollection<A: EventArgs> {
    topic_id: TopicId,
    signature: Signature,
    subscribers: RwLock<Subscribers<A>>,
}

impl<A: EventArgs> SubscriberCollection<A> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(SubscriberCollection {
            topic_id: NEXT_TOPIC_ID.fetch_add(1, Ordering::Relaxed),
            signature: Signature::of::<A>(),
            subscribers: RwLock::new(Subscribers {
                list: Vec::new(),
                next_id: 0,
            }),
        })
    }

    pub(crate) fn id(&self) -> TopicId {
        self.topic_id
    }

    fn add(&self, call: HandlerFn<A>) -> SubscriberId {
        let mut subscribers = self.subscribers.write().unwrap();
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.list.push(Subscriber { id, call });
        id
    }

    fn snapshot(&self) -> Vec<HandlerFn<A>> {
        self.subscribers
            .read()
            .unwrap()
            .list
            .iter()
            .map(|subscriber| Arc::clone(&subscriber.call))
            .collect()
    }

    /// Invoke every subscriber registered at the time of the call, in
    /// registration order.
    pub(crate) fn call(&self, args: A) {
        for handler in self.snapshot() {
            (*handler)(args.clone());
        }
    }
}

/// Object-safe view of a subscriber collection, independent of its argument
/// tuple. Stored by the registry, referenced by subscription handles and
/// queued events.
pub(crate) trait ErasedCollection: Send + Sync {
    fn topic_id(&self) -> TopicId;
    fn signature(&self) -> &Signature;
    fn subscriber_count(&self) -> usize;
    fn remove(&self, id: SubscriberId);
    fn contains(&self, id: SubscriberId) -> bool;
    fn call_from_strings(&self, values: &[&str]) -> Result<(), MarshalError>;
    fn enqueue_from_strings(
        self: Arc<Self>,
        queue: &EventQueue,
        values: &[&str],
    ) -> Result<(), MarshalError>;
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<A: EventArgs> ErasedCollection for SubscriberCollection<A> {
    fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers.read().unwrap().list.len()
    }

    fn remove(&self, id: SubscriberId) {
        let mut subscribers = self.subscribers.write().unwrap();
        subscribers.list.retain(|subscriber| subscriber.id != id);
    }

    fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers
            .read()
            .unwrap()
            .list
            .iter()
            .any(|subscriber| subscriber.id == id)
    }

    fn call_from_strings(&self, values: &[&str]) -> Result<(), MarshalError> {
        let args = A::parse_from_strings(values)?;
        self.call(args);
        Ok(())
    }

    fn enqueue_from_strings(
        self: Arc<Self>,
        queue: &EventQueue,
        values: &[&str],
    ) -> Result<(), MarshalError> {
        let args = A::parse_from_strings(values)?;
        queue.enqueue_collection(self, args);
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Shared, typed handle to one registered topic.
///
/// Clones refer to the same underlying subscriber collection; the
/// collection lives as long as its registry (or any outstanding handle).
#[derive(Clone)]
pub struct Topic<A: EventArgs> {
    collection: Arc<SubscriberCollection<A>>,
}

impl<A: EventArgs> std::fmt::Debug for Topic<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic")
            .field("topic_id", &self.collection.topic_id)
            .field("signature", &self.collection.signature)
            .finish()
    }
}

impl<A: EventArgs> Topic<A> {
    pub(crate) fn new(collection: Arc<SubscriberCollection<A>>) -> Self {
        Topic { collection }
    }

    pub(crate) fn collection(&self) -> &Arc<SubscriberCollection<A>> {
        &self.collection
    }

    /// Register a handler for this topic.
    ///
    /// Accepts any `Fn` matching the topic's argument types and returning
    /// `()`; handlers with a result must use
    /// [`subscribe_ignoring_result`](Self::subscribe_ignoring_result).
    /// Returns a non-owning handle usable to remove the handler again.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionHandle
    where
        F: IntoHandler<A>,
    {
        self.add(handler.into_handler())
    }

    /// Register a handler whose return value is discarded on every call.
    pub fn subscribe_ignoring_result<F>(&self, handler: F) -> SubscriptionHandle
    where
        F: IntoHandlerIgnoringResult<A>,
    {
        self.add(handler.into_handler_ignoring_result())
    }

    fn add(&self, call: HandlerFn<A>) -> SubscriptionHandle {
        let id = self.collection.add(call);
        let erased: Arc<dyn ErasedCollection> = self.collection.clone();
        let weak: Weak<dyn ErasedCollection> = Arc::downgrade(&erased);
        SubscriptionHandle::new(weak, id)
    }

    /// Invoke every registered subscriber with `args`, in registration
    /// order. Each subscriber receives its own clone of the arguments.
    pub fn call(&self, args: A) {
        self.collection.call(args);
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        ErasedCollection::subscriber_count(&*self.collection)
    }

    /// The signature this topic was registered with.
    pub fn signature(&self) -> &Signature {
        &self.collection.signature
    }

    /// The marshaling adapter bound to this topic's signature.
    pub fn parameters_parser(&self) -> ParametersParser {
        ParametersParser {
            collection: self.collection.clone() as Arc<dyn ErasedCollection>,
        }
    }

    /// Signature-erased handle to the same collection.
    pub fn as_untyped(&self) -> AnyTopic {
        AnyTopic::new(self.collection.clone() as Arc<dyn ErasedCollection>)
    }
}

/// Signature-erased handle to a registered topic.
///
/// Offers introspection (subscriber count, signature description) and
/// textual invocation via [`parameters_parser`](Self::parameters_parser),
/// with no static guarantee about the argument types.
#[derive(Clone)]
pub struct AnyTopic {
    collection: Arc<dyn ErasedCollection>,
}

impl AnyTopic {
    pub(crate) fn new(collection: Arc<dyn ErasedCollection>) -> Self {
        AnyTopic { collection }
    }

    pub(crate) fn topic_id(&self) -> TopicId {
        self.collection.topic_id()
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.collection.subscriber_count()
    }

    /// The signature this topic was registered with.
    pub fn signature(&self) -> &Signature {
        self.collection.signature()
    }

    /// The marshaling adapter bound to this topic's signature.
    pub fn parameters_parser(&self) -> ParametersParser {
        ParametersParser {
            collection: Arc::clone(&self.collection),
        }
    }

    /// Recover the typed handle, if `A` is the registered argument tuple.
    pub fn downcast<A: EventArgs>(&self) -> Option<Topic<A>> {
        if !self.collection.signature().matches(&Signature::of::<A>()) {
            return None;
        }
        Arc::clone(&self.collection)
            .as_any()
            .downcast::<SubscriberCollection<A>>()
            .ok()
            .map(Topic::new)
    }
}

/// Marshals textual argument values for one topic.
///
/// Obtained from [`Topic::parameters_parser`] or
/// [`AnyTopic::parameters_parser`]; this is the seam console front-ends and
/// external tooling use to inspect and trigger topics from string input.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use topicbus::{EventRegistry, ParameterKind};
///
/// let registry = EventRegistry::new();
/// let topic = registry.register::<(i64, f64)>("pose/update").unwrap();
///
/// let got = Arc::new(Mutex::new(None));
/// let sink = Arc::clone(&got);
/// topic.subscribe(move |id: i64, x: f64| {
///     *sink.lock().unwrap() = Some((id, x));
/// });
///
/// let parser = topic.parameters_parser();
/// assert_eq!(parser.parameter_count(), 2);
/// assert_eq!(parser.parameter_kind(0), Some(ParameterKind::Int));
/// assert!(parser.can_marshal_all());
///
/// parser.call_with_strings(&["10", "2.5"]).unwrap();
/// assert_eq!(*got.lock().unwrap(), Some((10, 2.5)));
/// ```
#[derive(Clone)]
pub struct ParametersParser {
    collection: Arc<dyn ErasedCollection>,
}

impl ParametersParser {
    /// Number of arguments the bound topic expects.
    pub fn parameter_count(&self) -> usize {
        self.collection.signature().arity()
    }

    /// Marshaling kind of one argument, or `None` out of range.
    pub fn parameter_kind(&self, index: usize) -> Option<ParameterKind> {
        self.collection.signature().kind(index)
    }

    /// True if every argument of the bound topic can be parsed from a
    /// string.
    pub fn can_marshal_all(&self) -> bool {
        self.collection.signature().can_marshal_all()
    }

    /// Parse `values` against the bound signature and invoke the topic's
    /// subscribers synchronously.
    pub fn call_with_strings(&self, values: &[&str]) -> Result<(), MarshalError> {
        self.collection.call_from_strings(values)
    }

    /// Parse `values` against the bound signature and enqueue the event on
    /// `queue` instead of invoking immediately.
    pub fn enqueue_with_strings(
        &self,
        queue: &EventQueue,
        values: &[&str],
    ) -> Result<(), MarshalError> {
        Arc::clone(&self.collection).enqueue_from_strings(queue, values)
    }
}
