//! Error taxonomy for registry access and textual invocation.
//!
//! Unknown topic names are deliberately *not* errors: `publish` and `call`
//! report them through their boolean result instead, so speculative
//! publishing to not-yet-registered topics stays cheap.

use thiserror::Error;

use crate::args::Signature;
use crate::marshal::ParameterKind;

/// Errors raised by topic registration and lookup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The topic name is already taken, regardless of its signature.
    #[error("topic '{name}' is already registered")]
    DuplicateTopic {
        /// Name of the conflicting topic.
        name: String,
    },

    /// The topic exists, but was registered with different argument types.
    ///
    /// Carries both signatures so the caller can see exactly what diverged.
    #[error(
        "topic '{name}' was registered with signature {registered}, \
         but accessed with signature {requested}"
    )]
    SignatureMismatch {
        /// Name of the accessed topic.
        name: String,
        /// Signature the topic was registered with.
        registered: Signature,
        /// Signature the caller asked for.
        requested: Signature,
    },
}

/// Errors raised when invoking a topic from string-typed input.
#[derive(Debug, Error)]
pub enum MarshalError {
    /// The number of argument strings does not match the topic signature.
    #[error("expected {expected} argument values, got {actual}")]
    Arity {
        /// Arity of the topic signature.
        expected: usize,
        /// Number of strings supplied by the caller.
        actual: usize,
    },

    /// An argument string does not spell a value of the expected kind.
    #[error("argument {index} is not a valid {kind} value: {value:?}")]
    Parse {
        /// Zero-based argument position.
        index: usize,
        /// Kind the argument was expected to parse as.
        kind: ParameterKind,
        /// The offending input string.
        value: String,
    },

    /// The argument type cannot be created from a string at all.
    #[error("argument {index} of type {type_name} cannot be parsed from a string")]
    UnsupportedType {
        /// Zero-based argument position.
        index: usize,
        /// Full name of the unsupported type.
        type_name: &'static str,
    },
}

/// Why a single argument string failed to parse.
///
/// Returned by [`TopicArg::parse_arg`](crate::TopicArg::parse_arg); the
/// marshaling layer attaches the argument position and kind before
/// surfacing it as a [`MarshalError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ArgParseError {
    /// The string does not spell a value of the target type.
    #[error("malformed value")]
    Malformed,
    /// The target type cannot be parsed from a string.
    #[error("type cannot be parsed from a string")]
    Unsupported,
}
