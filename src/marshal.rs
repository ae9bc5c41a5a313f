//! Parameter marshaling: classify argument types and parse them from text.
//!
//! Every type that takes part in a topic signature implements [`TopicArg`].
//! Supported types (strings, booleans, integers, floats) can be parsed from
//! textual input, which lets console and script front-ends trigger topics
//! without knowing their concrete argument types. Everything else is still a
//! perfectly valid topic argument — it just reports
//! [`ParameterKind::Unsupported`] and cannot be invoked from strings.

use std::fmt;

use crate::error::ArgParseError;

/// Generic classification of a topic argument for string marshaling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Passed through unchanged.
    String,
    /// Truth value, parsed from case-insensitive `true`/`false`.
    Bool,
    /// Integral number.
    Int,
    /// Floating point number.
    Double,
    /// The type cannot be created from a string.
    Unsupported,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            ParameterKind::String => "STRING",
            ParameterKind::Bool => "BOOL",
            ParameterKind::Int => "INT",
            ParameterKind::Double => "DOUBLE",
            ParameterKind::Unsupported => "UNSUPPORTED",
        };
        f.write_str(token)
    }
}

/// One argument type of a topic signature.
///
/// The provided defaults classify a type as [`ParameterKind::Unsupported`],
/// so any `Clone + Send + 'static` type can take part in a signature with a
/// one-line impl:
///
/// ```
/// use topicbus::{ParameterKind, TopicArg};
///
/// #[derive(Clone)]
/// struct Pose { x: f64, y: f64 }
///
/// impl TopicArg for Pose {}
///
/// assert_eq!(Pose::KIND, ParameterKind::Unsupported);
/// assert_eq!(String::KIND, ParameterKind::String);
/// assert_eq!(i32::KIND, ParameterKind::Int);
/// ```
pub trait TopicArg: Clone + Send + 'static {
    /// Marshaling classification of this type.
    const KIND: ParameterKind = ParameterKind::Unsupported;

    /// Human-readable type name, used in signature diagnostics.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Parse a value from its textual form.
    fn parse_arg(raw: &str) -> Result<Self, ArgParseError> {
        let _ = raw;
        Err(ArgParseError::Unsupported)
    }
}

impl TopicArg for String {
    const KIND: ParameterKind = ParameterKind::String;

    fn parse_arg(raw: &str) -> Result<Self, ArgParseError> {
        Ok(raw.to_string())
    }
}

impl TopicArg for bool {
    const KIND: ParameterKind = ParameterKind::Bool;

    fn parse_arg(raw: &str) -> Result<Self, ArgParseError> {
        if raw.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(ArgParseError::Malformed)
        }
    }
}

// str::parse is locale-independent and rejects unconsumed trailing input,
// which is exactly the contract textual invocation requires.
macro_rules! numeric_topic_arg {
    ($kind:expr => $($ty:ty),+) => {$(
        impl TopicArg for $ty {
            const KIND: ParameterKind = $kind;

            fn parse_arg(raw: &str) -> Result<Self, ArgParseError> {
                raw.parse().map_err(|_| ArgParseError::Malformed)
            }
        }
    )+};
}

numeric_topic_arg!(ParameterKind::Int =>
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
numeric_topic_arg!(ParameterKind::Double => f32, f64);

/// Describes one slot of a topic signature.
#[derive(Clone, Copy, Debug)]
pub struct ArgDescriptor {
    /// Marshaling classification of the slot.
    pub kind: ParameterKind,
    /// Full type name, for diagnostics.
    pub type_name: &'static str,
}

impl ArgDescriptor {
    /// Build the descriptor for one argument type.
    pub fn of<T: TopicArg>() -> Self {
        ArgDescriptor {
            kind: T::KIND,
            type_name: T::type_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_accepts_true_false_any_case() {
        assert_eq!(bool::parse_arg("true"), Ok(true));
        assert_eq!(bool::parse_arg("True"), Ok(true));
        assert_eq!(bool::parse_arg("FALSE"), Ok(false));
        assert_eq!(bool::parse_arg("fAlSe"), Ok(false));
    }

    #[test]
    fn bool_rejects_everything_else() {
        assert_eq!(bool::parse_arg("yes"), Err(ArgParseError::Malformed));
        assert_eq!(bool::parse_arg("1"), Err(ArgParseError::Malformed));
        assert_eq!(bool::parse_arg(""), Err(ArgParseError::Malformed));
    }

    #[test]
    fn integers_reject_trailing_input() {
        assert_eq!(i64::parse_arg("42"), Ok(42));
        assert_eq!(i64::parse_arg("-7"), Ok(-7));
        assert_eq!(i64::parse_arg("42abc"), Err(ArgParseError::Malformed));
        assert_eq!(i64::parse_arg("4.2"), Err(ArgParseError::Malformed));
        assert_eq!(u32::parse_arg("-1"), Err(ArgParseError::Malformed));
    }

    #[test]
    fn floats_parse_decimal_notation() {
        assert_eq!(f64::parse_arg("2.5"), Ok(2.5));
        assert_eq!(f64::parse_arg("10"), Ok(10.0));
        assert_eq!(f64::parse_arg("2,5"), Err(ArgParseError::Malformed));
    }

    #[test]
    fn strings_pass_through_unchanged() {
        assert_eq!(String::parse_arg("  hi "), Ok("  hi ".to_string()));
    }

    #[test]
    fn unsupported_types_report_their_kind() {
        #[derive(Clone)]
        struct Opaque;
        impl TopicArg for Opaque {}

        assert_eq!(Opaque::KIND, ParameterKind::Unsupported);
        assert!(Opaque::parse_arg("anything").is_err());
    }

    #[test]
    fn kind_tokens_match_diagnostic_output() {
        assert_eq!(ParameterKind::String.to_string(), "STRING");
        assert_eq!(ParameterKind::Bool.to_string(), "BOOL");
        assert_eq!(ParameterKind::Int.to_string(), "INT");
        assert_eq!(ParameterKind::Double.to_string(), "DOUBLE");
        assert_eq!(ParameterKind::Unsupported.to_string(), "UNSUPPORTED");
    }
}
