//! Topic registry: named topics with signature-checked lookup.
//!
//! The registry maps unique names to subscriber collections. Registration
//! fixes a topic's argument tuple; every later typed access is checked
//! against it, and a mismatch is reported as an error rather than silently
//! matching a different topic. The registry lock only guards the name table,
//! so lookups never block subscriber invocation.
//!
//! ```
//! use topicbus::{EventRegistry, RegistryError};
//!
//! let registry = EventRegistry::new();
//! registry.register::<(String,)>("chat/message").unwrap();
//!
//! // names are unique regardless of signature
//! assert!(matches!(
//!     registry.register::<()>("chat/message"),
//!     Err(RegistryError::DuplicateTopic { .. })
//! ));
//!
//! // typed lookup distinguishes "absent" from "present with other types"
//! assert!(registry.lookup::<(String,)>("chat/message").unwrap().is_some());
//! assert!(registry.lookup::<(String,)>("chat/unknown").unwrap().is_none());
//! assert!(matches!(
//!     registry.lookup::<(i64,)>("chat/message"),
//!     Err(RegistryError::SignatureMismatch { .. })
//! ));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::args::{EventArgs, Signature};
use crate::error::RegistryError;
use crate::marshal::ParameterKind;
use crate::topic::{AnyTopic, ErasedCollection, SubscriberCollection, Topic};

/// Named collection of topics.
///
/// All methods take `&self`; the registry is meant to be shared, typically
/// inside an `Arc` or a wider system object.
#[derive(Default)]
pub struct EventRegistry {
    topics: Mutex<BTreeMap<String, Arc<dyn ErasedCollection>>>,
}

fn downcast_checked<A: EventArgs>(
    name: &str,
    collection: &Arc<dyn ErasedCollection>,
) -> Result<Topic<A>, RegistryError> {
    let requested = Signature::of::<A>();
    if !collection.signature().matches(&requested) {
        return Err(RegistryError::SignatureMismatch {
            name: name.to_string(),
            registered: collection.signature().clone(),
            requested,
        });
    }
    match Arc::clone(collection)
        .as_any()
        .downcast::<SubscriberCollection<A>>()
    {
        Ok(collection) => Ok(Topic::new(collection)),
        // unreachable once the signature matched, the tuple type id is part
        // of it
        Err(_) => Err(RegistryError::SignatureMismatch {
            name: name.to_string(),
            registered: collection.signature().clone(),
            requested,
        }),
    }
}

impl EventRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new topic under `name` with argument tuple `A`.
    ///
    /// Fails with [`RegistryError::DuplicateTopic`] if the name is taken,
    /// even by a topic with the same signature.
    pub fn register<A: EventArgs>(
        &self,
        name: impl Into<String>,
    ) -> Result<Topic<A>, RegistryError> {
        let name = name.into();
        let mut topics = self.topics.lock().unwrap();
        if topics.contains_key(&name) {
            return Err(RegistryError::DuplicateTopic { name });
        }

        let collection = SubscriberCollection::<A>::new();
        debug!(topic = %name, signature = %collection.signature(), "registered topic");
        topics.insert(name, Arc::clone(&collection) as Arc<dyn ErasedCollection>);
        Ok(Topic::new(collection))
    }

    /// Return the topic registered under `name`, registering it first if
    /// absent. Fails only if the name exists with a different signature.
    pub fn get_or_register<A: EventArgs>(
        &self,
        name: impl Into<String>,
    ) -> Result<Topic<A>, RegistryError> {
        let name = name.into();
        let mut topics = self.topics.lock().unwrap();
        if let Some(existing) = topics.get(&name) {
            return downcast_checked(&name, existing);
        }

        let collection = SubscriberCollection::<A>::new();
        debug!(topic = %name, signature = %collection.signature(), "registered topic");
        topics.insert(name, Arc::clone(&collection) as Arc<dyn ErasedCollection>);
        Ok(Topic::new(collection))
    }

    /// Look up a topic by name and signature.
    ///
    /// Returns `Ok(None)` if no topic uses the name, and
    /// [`RegistryError::SignatureMismatch`] if the name exists with a
    /// different argument tuple.
    pub fn lookup<A: EventArgs>(&self, name: &str) -> Result<Option<Topic<A>>, RegistryError> {
        let topics = self.topics.lock().unwrap();
        match topics.get(name) {
            Some(collection) => downcast_checked(name, collection).map(Some),
            None => Ok(None),
        }
    }

    /// True if `name` is registered with exactly the argument tuple `A`.
    pub fn contains<A: EventArgs>(&self, name: &str) -> bool {
        matches!(self.lookup::<A>(name), Ok(Some(_)))
    }

    /// Look up a topic by name alone, without committing to a signature.
    pub fn lookup_untyped(&self, name: &str) -> Option<AnyTopic> {
        self.topics
            .lock()
            .unwrap()
            .get(name)
            .map(|collection| AnyTopic::new(Arc::clone(collection)))
    }

    /// All registered topics, in name order.
    pub fn snapshot(&self) -> Vec<(String, AnyTopic)> {
        self.topics
            .lock()
            .unwrap()
            .iter()
            .map(|(name, collection)| (name.clone(), AnyTopic::new(Arc::clone(collection))))
            .collect()
    }

    /// Number of registered topics.
    pub fn topic_count(&self) -> usize {
        self.topics.lock().unwrap().len()
    }
}

impl fmt::Display for EventRegistry {
    /// Lists every registered topic with its argument kinds, one per line,
    /// in name order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self.topics.lock().unwrap();
        for (name, collection) in topics.iter() {
            let signature = collection.signature();
            write!(
                f,
                "Topic {name} with {} argument(s)",
                signature.arity()
            )?;
            if signature.arity() > 0 {
                f.write_str(": [")?;
                for (index, descriptor) in signature.args().iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    match descriptor.kind {
                        ParameterKind::Unsupported => {
                            write!(f, "UNSUPPORTED: {}", descriptor.type_name)?
                        }
                        kind => write!(f, "{kind}")?,
                    }
                }
                f.write_str("]")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
