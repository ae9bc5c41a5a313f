//! In-process publish/subscribe over named, statically typed topics, with a
//! deferred FIFO event queue and string-based invocation for console and
//! script front-ends.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use topicbus::EventSystem;
//!
//! let system = EventSystem::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! system
//!     .subscribe("greeting", move |text: String| {
//!         sink.lock().unwrap().push(text);
//!     })
//!     .unwrap();
//!
//! // synchronous dispatch
//! system.call("greeting", ("hi".to_string(),)).unwrap();
//!
//! // deferred dispatch through the queue
//! system.publish("greeting", ("bye".to_string(),)).unwrap();
//! assert_eq!(system.queue().len(), 1);
//! system.process();
//!
//! assert_eq!(*seen.lock().unwrap(), vec!["hi".to_string(), "bye".to_string()]);
//! ```

mod args;
mod error;
mod marshal;
mod queue;
mod registry;
mod subscription;
mod system;
mod topic;

pub use args::{EventArgs, HandlerFn, IntoHandler, IntoHandlerIgnoringResult, Signature};
pub use error::{ArgParseError, MarshalError, RegistryError};
pub use marshal::{ArgDescriptor, ParameterKind, TopicArg};
pub use queue::EventQueue;
pub use registry::EventRegistry;
pub use subscription::{ScopedSubscription, SubscriptionHandle};
pub use system::EventSystem;
pub use topic::{AnyTopic, ParametersParser, Topic};
