//! Raw string → field value coercion for path and query binders.
//!
//! Only types implementing [`FromParam`] can be bound to a path or query source, so an
//! unsupported field type is a compile error rather than a silent no-op.

use std::error::Error as StdError;
use std::fmt;

/// Why a raw parameter could not be coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionFailure {
    /// Empty input for a non-text target
    Empty,
    /// Input contains something other than the allowed characters
    Malformed,
    /// Decimal value does not fit the target type
    OutOfRange,
}

/// Structured coercion error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    /// The raw value as received
    pub value: String,
    /// Name of the target type (`u64`, `bool`, ...)
    pub target: &'static str,
    pub failure: CoercionFailure,
}

impl CoercionError {
    pub fn new(value: &str, target: &'static str, failure: CoercionFailure) -> Self {
        Self {
            value: value.to_string(),
            target,
            failure,
        }
    }
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.failure {
            CoercionFailure::Empty => "empty value",
            CoercionFailure::Malformed => "malformed value",
            CoercionFailure::OutOfRange => "value out of range",
        };
        write!(f, "cannot coerce {:?} into {}: {}", self.value, self.target, reason)
    }
}

impl StdError for CoercionError {}

/// A type that can be produced from a single raw path or query value.
pub trait FromParam: Sized {
    /// Target type name used in errors and descriptors.
    const TARGET: &'static str;

    fn from_param(raw: &str) -> Result<Self, CoercionError>;
}

impl FromParam for String {
    const TARGET: &'static str = "string";

    fn from_param(raw: &str) -> Result<Self, CoercionError> {
        Ok(raw.to_string())
    }
}

/// Strict decimal check: ASCII digits only. No sign, no whitespace, no empty input.
fn check_digits(raw: &str, target: &'static str) -> Result<(), CoercionError> {
    if raw.is_empty() {
        return Err(CoercionError::new(raw, target, CoercionFailure::Empty));
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoercionError::new(raw, target, CoercionFailure::Malformed));
    }
    Ok(())
}

macro_rules! unsigned_from_param {
    ($($ty:ty),*) => {
        $(
            impl FromParam for $ty {
                const TARGET: &'static str = stringify!($ty);

                fn from_param(raw: &str) -> Result<Self, CoercionError> {
                    check_digits(raw, Self::TARGET)?;
                    raw.parse::<$ty>().map_err(|_| {
                        CoercionError::new(raw, Self::TARGET, CoercionFailure::OutOfRange)
                    })
                }
            }
        )*
    };
}

macro_rules! signed_from_param {
    ($($ty:ty),*) => {
        $(
            impl FromParam for $ty {
                const TARGET: &'static str = stringify!($ty);

                fn from_param(raw: &str) -> Result<Self, CoercionError> {
                    check_digits(raw.strip_prefix('-').unwrap_or(raw), Self::TARGET)
                        .map_err(|e| CoercionError { value: raw.to_string(), ..e })?;
                    raw.parse::<$ty>().map_err(|_| {
                        CoercionError::new(raw, Self::TARGET, CoercionFailure::OutOfRange)
                    })
                }
            }
        )*
    };
}

unsigned_from_param!(u8, u16, u32, u64, usize);
signed_from_param!(i8, i16, i32, i64, isize);

impl FromParam for bool {
    const TARGET: &'static str = "bool";

    fn from_param(raw: &str) -> Result<Self, CoercionError> {
        if raw.is_empty() {
            return Err(CoercionError::new(raw, Self::TARGET, CoercionFailure::Empty));
        }
        if raw == "1" || raw.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if raw == "0" || raw.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(CoercionError::new(raw, Self::TARGET, CoercionFailure::Malformed))
        }
    }
}

/// Empty input binds as `None`; anything else must coerce into `T`.
impl<T: FromParam> FromParam for Option<T> {
    const TARGET: &'static str = T::TARGET;

    fn from_param(raw: &str) -> Result<Self, CoercionError> {
        if raw.is_empty() {
            Ok(None)
        } else {
            T::from_param(raw).map(Some)
        }
    }
}
