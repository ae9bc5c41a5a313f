//! Deferred event queue: publish now, run subscribers later.
//!
//! Enqueued events capture their argument values and target topic at publish
//! time; processing replays them in FIFO order across all topics. The queue
//! detaches the pending batch under its lock and fires handlers with no lock
//! held, so handlers may freely publish, subscribe, or process again without
//! deadlocking.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use topicbus::{EventQueue, EventRegistry};
//!
//! let registry = EventRegistry::new();
//! let queue = EventQueue::new();
//! let topic = registry.register::<(i64,)>("tick").unwrap();
//!
//! let ticks = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&ticks);
//! topic.subscribe(move |n: i64| sink.lock().unwrap().push(n));
//!
//! queue.enqueue(&topic, (1,));
//! queue.enqueue(&topic, (2,));
//! assert!(ticks.lock().unwrap().is_empty());
//!
//! assert!(queue.process_all());
//! assert_eq!(*ticks.lock().unwrap(), vec![1, 2]);
//! assert!(queue.is_empty());
//! ```

use std::collections::VecDeque;
use std::mem;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::args::EventArgs;
use crate::topic::{SubscriberCollection, Topic, TopicId};

/// One pending event: the target collection and its captured arguments,
/// boxed into a single deferred invocation.
struct QueuedEvent {
    topic_id: TopicId,
    fire: Box<dyn FnOnce() + Send>,
}

impl QueuedEvent {
    fn capture<A: EventArgs>(target: Arc<SubscriberCollection<A>>, args: A) -> Self {
        QueuedEvent {
            topic_id: target.id(),
            fire: Box::new(move || target.call(args)),
        }
    }
}

/// FIFO queue of published events awaiting processing.
///
/// Enqueueing and processing are safe from any thread; handlers always run
/// on the thread that calls one of the `process_*` methods.
#[derive(Default)]
pub struct EventQueue {
    events: Mutex<VecDeque<QueuedEvent>>,
}

impl EventQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer an invocation of `topic` with `args`.
    ///
    /// The arguments are captured by value; nothing runs until a
    /// `process_*` method drains the queue.
    pub fn enqueue<A: EventArgs>(&self, topic: &Topic<A>, args: A) {
        self.enqueue_collection(Arc::clone(topic.collection()), args);
    }

    pub(crate) fn enqueue_collection<A: EventArgs>(
        &self,
        target: Arc<SubscriberCollection<A>>,
        args: A,
    ) {
        let event = QueuedEvent::capture(target, args);
        self.events.lock().unwrap().push_back(event);
    }

    /// Run every event that was pending when the call started, in FIFO
    /// order. Events enqueued by the handlers themselves stay queued for a
    /// later batch. Returns false if the queue was already empty.
    pub fn process_all(&self) -> bool {
        let batch = mem::take(&mut *self.events.lock().unwrap());
        if batch.is_empty() {
            return false;
        }
        debug!(events = batch.len(), "processing event batch");
        for event in batch {
            (event.fire)();
        }
        true
    }

    /// Repeat [`process_all`](Self::process_all) until no events remain,
    /// including events enqueued by handlers along the way. An optional
    /// batch limit bounds the work when handlers keep publishing. Returns
    /// the number of batches processed.
    pub fn process_until_empty(&self, max_batches: Option<usize>) -> usize {
        let mut batches = 0;
        while max_batches.map_or(true, |max| batches < max) {
            if !self.process_all() {
                break;
            }
            batches += 1;
        }
        batches
    }

    /// Run the single oldest pending event. Returns false if the queue was
    /// empty.
    pub fn process_one(&self) -> bool {
        let event = self.events.lock().unwrap().pop_front();
        match event {
            Some(event) => {
                (event.fire)();
                true
            }
            None => false,
        }
    }

    /// Run every pending event addressed to `topic_id`, in FIFO order,
    /// keeping all other events queued in their original relative order.
    pub(crate) fn process_for_topic(&self, topic_id: TopicId) -> bool {
        let batch = mem::take(&mut *self.events.lock().unwrap());
        let (matching, kept): (Vec<_>, Vec<_>) = batch
            .into_iter()
            .partition(|event| event.topic_id == topic_id);

        if !kept.is_empty() {
            // put the unrelated events back in front of anything enqueued
            // while we held nothing
            let mut events = self.events.lock().unwrap();
            for event in kept.into_iter().rev() {
                events.push_front(event);
            }
        }

        if matching.is_empty() {
            return false;
        }
        for event in matching {
            (event.fire)();
        }
        true
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// True if no events are pending.
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    /// Discard every pending event without running its handlers.
    pub fn clear(&self) {
        let discarded = mem::take(&mut *self.events.lock().unwrap());
        if !discarded.is_empty() {
            debug!(discarded = discarded.len(), "cleared pending events");
        }
    }
}

impl Drop for EventQueue {
    fn drop(&mut self) {
        if let Ok(events) = self.events.get_mut() {
            if !events.is_empty() {
                warn!(
                    discarded = events.len(),
                    "event queue dropped with pending events"
                );
            }
        }
    }
}
