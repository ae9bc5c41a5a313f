//! The event system facade: one registry plus one queue.
//!
//! [`EventSystem`] bundles an [`EventRegistry`] and an [`EventQueue`] behind
//! name-based operations, so most callers never touch topic handles
//! directly: subscribe by name, publish by name, process the queue. The
//! underlying parts stay reachable through [`registry`](EventSystem::registry)
//! and [`queue`](EventSystem::queue) for anything the facade does not cover.

use crate::args::{EventArgs, IntoHandler, IntoHandlerIgnoringResult};
use crate::error::RegistryError;
use crate::queue::EventQueue;
use crate::registry::EventRegistry;
use crate::subscription::SubscriptionHandle;
use crate::topic::Topic;

/// Facade over a topic registry and a deferred event queue.
///
/// All methods take `&self`; share the system freely, typically inside an
/// `Arc` when handlers need to publish back into it.
#[derive(Default)]
pub struct EventSystem {
    registry: EventRegistry,
    queue: EventQueue,
}

impl EventSystem {
    /// Creates a system with an empty registry and queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// The topic registry backing this system.
    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// The event queue backing this system.
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Register a new topic, failing if the name is taken.
    pub fn register_topic<A: EventArgs>(
        &self,
        name: impl Into<String>,
    ) -> Result<Topic<A>, RegistryError> {
        self.registry.register(name)
    }

    /// Subscribe a handler to the named topic, registering the topic on
    /// first use. Fails if the name exists with a different signature.
    pub fn subscribe<A, F>(
        &self,
        name: impl Into<String>,
        handler: F,
    ) -> Result<SubscriptionHandle, RegistryError>
    where
        A: EventArgs,
        F: IntoHandler<A>,
    {
        let topic = self.registry.get_or_register::<A>(name)?;
        Ok(topic.subscribe(handler))
    }

    /// Like [`subscribe`](Self::subscribe), for handlers whose return value
    /// should be discarded.
    pub fn subscribe_ignoring_result<A, F>(
        &self,
        name: impl Into<String>,
        handler: F,
    ) -> Result<SubscriptionHandle, RegistryError>
    where
        A: EventArgs,
        F: IntoHandlerIgnoringResult<A>,
    {
        let topic = self.registry.get_or_register::<A>(name)?;
        Ok(topic.subscribe_ignoring_result(handler))
    }

    /// Enqueue an event for the named topic.
    ///
    /// Returns `Ok(false)` when the topic is not registered, so speculative
    /// publishing stays cheap; a registered topic with a different
    /// signature is an error.
    pub fn publish<A: EventArgs>(&self, name: &str, args: A) -> Result<bool, RegistryError> {
        match self.registry.lookup::<A>(name)? {
            Some(topic) => {
                self.queue.enqueue(&topic, args);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Invoke the named topic's subscribers synchronously, bypassing the
    /// queue. Same result convention as [`publish`](Self::publish).
    pub fn call<A: EventArgs>(&self, name: &str, args: A) -> Result<bool, RegistryError> {
        match self.registry.lookup::<A>(name)? {
            Some(topic) => {
                topic.call(args);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run every event pending at the start of the call. Returns false if
    /// the queue was empty.
    pub fn process(&self) -> bool {
        self.queue.process_all()
    }

    /// Run batches until the queue stays empty, up to an optional batch
    /// limit. Returns the number of batches processed.
    pub fn process_until_empty(&self, max_batches: Option<usize>) -> usize {
        self.queue.process_until_empty(max_batches)
    }

    /// Run the single oldest pending event. Returns false if the queue was
    /// empty.
    pub fn process_one(&self) -> bool {
        self.queue.process_one()
    }

    /// Run every pending event addressed to the named topic, leaving other
    /// events queued. Returns false for unknown names and when no event
    /// matched.
    pub fn process_named(&self, name: &str) -> bool {
        match self.registry.lookup_untyped(name) {
            Some(topic) => self.queue.process_for_topic(topic.topic_id()),
            None => false,
        }
    }
}
