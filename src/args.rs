//! Argument tuples: signatures, string parsing, and handler conversion.
//!
//! A topic's signature is its ordered list of argument types, expressed as
//! an owned-value tuple implementing [`EventArgs`]. Signatures are compared
//! by the exact tuple type, with per-slot descriptors carried alongside for
//! diagnostics — lookups never rely on a bare downcast succeeding.
//!
//! [`IntoHandler`] bridges plain functions and closures into handlers: any
//! `Fn` whose parameters match the tuple and whose return type is `()` is
//! accepted. Handlers with a meaningful result must opt in through
//! [`IntoHandlerIgnoringResult`], which discards the value on every call.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::error::{ArgParseError, MarshalError};
use crate::marshal::{ArgDescriptor, ParameterKind, TopicArg};

/// Type-erased handler body, invoked with the topic's argument tuple.
pub type HandlerFn<A> = Arc<dyn Fn(A) + Send + Sync>;

/// The ordered argument tuple of a topic signature.
///
/// Implemented for tuples of [`TopicArg`] types up to eight elements,
/// including the empty tuple for parameterless topics.
pub trait EventArgs: Clone + Send + 'static {
    /// Number of arguments in the tuple.
    const ARITY: usize;

    /// Descriptors for every argument slot, in order.
    fn descriptors() -> Vec<ArgDescriptor>;

    /// Parse the tuple from textual argument values.
    ///
    /// Fails with [`MarshalError::Arity`] when the slice length does not
    /// match the tuple, and with [`MarshalError::Parse`] or
    /// [`MarshalError::UnsupportedType`] for the first offending slot.
    fn parse_from_strings(values: &[&str]) -> Result<Self, MarshalError>;
}

fn parse_slot<T: TopicArg>(values: &[&str], index: usize) -> Result<T, MarshalError> {
    T::parse_arg(values[index]).map_err(|reason| match reason {
        ArgParseError::Malformed => MarshalError::Parse {
            index,
            kind: T::KIND,
            value: values[index].to_string(),
        },
        ArgParseError::Unsupported => MarshalError::UnsupportedType {
            index,
            type_name: T::type_name(),
        },
    })
}

impl EventArgs for () {
    const ARITY: usize = 0;

    fn descriptors() -> Vec<ArgDescriptor> {
        Vec::new()
    }

    fn parse_from_strings(values: &[&str]) -> Result<Self, MarshalError> {
        if !values.is_empty() {
            return Err(MarshalError::Arity {
                expected: 0,
                actual: values.len(),
            });
        }
        Ok(())
    }
}

macro_rules! impl_event_args {
    ($( ($($ty:ident => $idx:tt),+) ),+ $(,)?) => {$(
        impl<$($ty: TopicArg),+> EventArgs for ($($ty,)+) {
            const ARITY: usize = 0 $(+ impl_event_args!(@one $idx))+;

            fn descriptors() -> Vec<ArgDescriptor> {
                vec![$(ArgDescriptor::of::<$ty>()),+]
            }

            fn parse_from_strings(values: &[&str]) -> Result<Self, MarshalError> {
                if values.len() != Self::ARITY {
                    return Err(MarshalError::Arity {
                        expected: Self::ARITY,
                        actual: values.len(),
                    });
                }
                Ok(($(parse_slot::<$ty>(values, $idx)?,)+))
            }
        }
    )+};
    (@one $idx:tt) => { 1 };
}

impl_event_args! {
    (A0 => 0),
    (A0 => 0, A1 => 1),
    (A0 => 0, A1 => 1, A2 => 2),
    (A0 => 0, A1 => 1, A2 => 2, A3 => 3),
    (A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4),
    (A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5),
    (A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5, A6 => 6),
    (A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5, A6 => 6, A7 => 7),
}

/// The signature a topic was registered with: its ordered argument types.
///
/// Two signatures match when they name the same argument tuple type. Since
/// tuples hold owned values only, the reference/const distinctions a caller
/// might make at the call site collapse into the same signature.
#[derive(Clone, Debug)]
pub struct Signature {
    tuple_type: TypeId,
    args: Vec<ArgDescriptor>,
}

impl Signature {
    /// Build the signature for an argument tuple type.
    pub fn of<A: EventArgs>() -> Self {
        Signature {
            tuple_type: TypeId::of::<A>(),
            args: A::descriptors(),
        }
    }

    /// Number of arguments.
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Per-slot descriptors, in order.
    pub fn args(&self) -> &[ArgDescriptor] {
        &self.args
    }

    /// Marshaling kind of one argument slot, or `None` out of range.
    pub fn kind(&self, index: usize) -> Option<ParameterKind> {
        self.args.get(index).map(|arg| arg.kind)
    }

    /// True if every argument can be parsed from a string.
    pub fn can_marshal_all(&self) -> bool {
        self.args
            .iter()
            .all(|arg| arg.kind != ParameterKind::Unsupported)
    }

    /// True if `other` names the same argument tuple type.
    pub fn matches(&self, other: &Signature) -> bool {
        self.tuple_type == other.tuple_type
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl Eq for Signature {}

impl fmt::Display for Signature {
    /// Renders the argument type list, e.g. `[i64, f64]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, arg) in self.args.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            f.write_str(arg.type_name)?;
        }
        f.write_str("]")
    }
}

/// Conversion from plain functions and closures into topic handlers.
///
/// Implemented for any `Fn` whose parameters match the topic's argument
/// tuple and whose return type is `()`. A bound member-style handler is
/// simply a closure capturing its owner:
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use topicbus::EventRegistry;
///
/// struct Console { lines: Mutex<Vec<String>> }
///
/// impl Console {
///     fn print(&self, line: String) {
///         self.lines.lock().unwrap().push(line);
///     }
/// }
///
/// let console = Arc::new(Console { lines: Mutex::new(Vec::new()) });
/// let registry = EventRegistry::new();
/// let topic = registry.register::<(String,)>("console/print").unwrap();
///
/// let owner = Arc::clone(&console);
/// topic.subscribe(move |line: String| owner.print(line));
///
/// topic.call(("ready".to_string(),));
/// assert_eq!(*console.lines.lock().unwrap(), vec!["ready".to_string()]);
/// ```
pub trait IntoHandler<A: EventArgs> {
    /// Wrap `self` as a handler over the argument tuple.
    fn into_handler(self) -> HandlerFn<A>;
}

/// Conversion for handlers whose return value should be discarded.
///
/// The explicit opt-in mirrors the default rejection of non-unit handlers:
/// a result that would otherwise be silently dropped must be acknowledged
/// at registration time.
pub trait IntoHandlerIgnoringResult<A: EventArgs> {
    /// Wrap `self` as a handler, discarding whatever it returns.
    fn into_handler_ignoring_result(self) -> HandlerFn<A>;
}

impl<F> IntoHandler<()> for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn into_handler(self) -> HandlerFn<()> {
        Arc::new(move |()| self())
    }
}

impl<F, R> IntoHandlerIgnoringResult<()> for F
where
    F: Fn() -> R + Send + Sync + 'static,
{
    fn into_handler_ignoring_result(self) -> HandlerFn<()> {
        Arc::new(move |()| {
            let _ = self();
        })
    }
}

macro_rules! impl_into_handler {
    ($( ($($ty:ident => $arg:ident),+) ),+ $(,)?) => {$(
        impl<F, $($ty),+> IntoHandler<($($ty,)+)> for F
        where
            F: Fn($($ty),+) + Send + Sync + 'static,
            $($ty: TopicArg,)+
        {
            fn into_handler(self) -> HandlerFn<($($ty,)+)> {
                Arc::new(move |($($arg,)+)| self($($arg),+))
            }
        }

        impl<F, R, $($ty),+> IntoHandlerIgnoringResult<($($ty,)+)> for F
        where
            F: Fn($($ty),+) -> R + Send + Sync + 'static,
            $($ty: TopicArg,)+
        {
            fn into_handler_ignoring_result(self) -> HandlerFn<($($ty,)+)> {
                Arc::new(move |($($arg,)+)| {
                    let _ = self($($arg),+);
                })
            }
        }
    )+};
}

impl_into_handler! {
    (A0 => a0),
    (A0 => a0, A1 => a1),
    (A0 => a0, A1 => a1, A2 => a2),
    (A0 => a0, A1 => a1, A2 => a2, A3 => a3),
    (A0 => a0, A1 => a1, A2 => a2, A3 => a3, A4 => a4),
    (A0 => a0, A1 => a1, A2 => a2, A3 => a3, A4 => a4, A5 => a5),
    (A0 => a0, A1 => a1, A2 => a2, A3 => a3, A4 => a4, A5 => a5, A6 => a6),
    (A0 => a0, A1 => a1, A2 => a2, A3 => a3, A4 => a4, A5 => a5, A6 => a6, A7 => a7),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_match_on_identical_tuples() {
        let a = Signature::of::<(i64, f64)>();
        let b = Signature::of::<(i64, f64)>();
        let c = Signature::of::<(f64, i64)>();

        assert!(a.matches(&b));
        assert!(!a.matches(&c));
        assert_eq!(a, b);
    }

    #[test]
    fn signature_reports_slot_kinds() {
        let sig = Signature::of::<(String, bool, i32, f64)>();

        assert_eq!(sig.arity(), 4);
        assert_eq!(sig.kind(0), Some(ParameterKind::String));
        assert_eq!(sig.kind(1), Some(ParameterKind::Bool));
        assert_eq!(sig.kind(2), Some(ParameterKind::Int));
        assert_eq!(sig.kind(3), Some(ParameterKind::Double));
        assert_eq!(sig.kind(4), None);
        assert!(sig.can_marshal_all());
    }

    #[test]
    fn signature_display_lists_type_names() {
        let sig = Signature::of::<(i64, f64)>();
        assert_eq!(sig.to_string(), "[i64, f64]");

        let empty = Signature::of::<()>();
        assert_eq!(empty.to_string(), "[]");
    }

    #[test]
    fn unsupported_slot_disables_marshaling() {
        #[derive(Clone)]
        struct Opaque;
        impl TopicArg for Opaque {}

        let sig = Signature::of::<(String, Opaque)>();
        assert!(!sig.can_marshal_all());
        assert_eq!(sig.kind(1), Some(ParameterKind::Unsupported));
    }

    #[test]
    fn parse_checks_arity_first() {
        let err = <(i64, f64)>::parse_from_strings(&["10"]).unwrap_err();
        assert!(matches!(
            err,
            MarshalError::Arity {
                expected: 2,
                actual: 1
            }
        ));

        let err = <()>::parse_from_strings(&["stray"]).unwrap_err();
        assert!(matches!(
            err,
            MarshalError::Arity {
                expected: 0,
                actual: 1
            }
        ));
    }

    #[test]
    fn parse_builds_the_typed_tuple() {
        let parsed = <(i64, f64)>::parse_from_strings(&["10", "2.5"]).unwrap();
        assert_eq!(parsed, (10, 2.5));

        let parsed = <(String, bool)>::parse_from_strings(&["on", "TRUE"]).unwrap();
        assert_eq!(parsed, ("on".to_string(), true));
    }

    #[test]
    fn parse_reports_the_offending_slot() {
        let err = <(i64, f64)>::parse_from_strings(&["ten", "2.5"]).unwrap_err();
        assert!(matches!(
            err,
            MarshalError::Parse {
                index: 0,
                kind: ParameterKind::Int,
                ..
            }
        ));

        let err = <(i64, bool)>::parse_from_strings(&["1", "yes"]).unwrap_err();
        assert!(matches!(
            err,
            MarshalError::Parse {
                index: 1,
                kind: ParameterKind::Bool,
                ..
            }
        ));
    }

    #[test]
    fn handlers_convert_from_plain_closures() {
        let handler = (|n: i64, x: f64| {
            assert_eq!(n, 2);
            assert_eq!(x, 0.5);
        })
        .into_handler();
        (*handler)((2, 0.5));

        let counted = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let inner = std::sync::Arc::clone(&counted);
        let handler = (move || -> usize {
            inner.fetch_add(1, std::sync::atomic::Ordering::SeqCst)
        })
        .into_handler_ignoring_result();
        (*handler)(());
        (*handler)(());
        assert_eq!(counted.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
