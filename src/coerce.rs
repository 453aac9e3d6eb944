//! Leaf-type coercion from provider [`Value`]s.
//!
//! [`FromValue`] is implemented for every supported destination kind:
//! strings, booleans, the integer and float families, `Duration` (the
//! temporal leaf, never recursed into), `Vec<T>` and `Option<T>`. The trait
//! also answers the zero-value question for the required check and renders a
//! display form for the masked printer.
//!
//! Coercion rules, per destination:
//!
//! - string: scalars stringify as-is; sequences do not.
//! - bool: native bool or one of `1/t/T/TRUE/true/True/0/f/F/FALSE/false/False`.
//! - integers: native integer, float (truncated toward zero), or a base-10
//!   string; unsigned destinations reject negatives. All narrowing is
//!   range-checked.
//! - floats: native float or a numeric string. Integer values do not coerce;
//!   give float fields a fractional literal or quote the number.
//! - `Duration`: a humantime string ("5m30s"), or a native integer/float
//!   counted in nanoseconds. Negative counts are rejected.
//! - `Vec<T>`: a native sequence (elements coerced recursively), or one
//!   string split as comma-separated values. Double quotes protect literal
//!   commas and a doubled quote escapes a quote; items are trimmed of
//!   surrounding whitespace before element coercion.

use std::time::Duration;

use thiserror::Error;

use crate::value::Value;

/// Why a value could not be coerced. The binder wraps this with the
/// offending canonical key.
#[derive(Debug, Error)]
pub enum CoerceError {
    /// The destination kind cannot be populated from provider values at all.
    /// Built-in impls never return this; it is the escape hatch for custom
    /// [`FromValue`] implementations.
    #[error("unsupported destination kind '{kind}'")]
    Unsupported { kind: &'static str },

    /// The value is malformed, out of range, or the wrong shape for the
    /// destination.
    #[error("{0}")]
    Invalid(String),
}

impl CoerceError {
    fn invalid(msg: impl Into<String>) -> Self {
        CoerceError::Invalid(msg.into())
    }
}

/// A leaf field type the binder can populate.
pub trait FromValue: Sized {
    /// Destination kind name, used in error messages.
    const KIND: &'static str;

    fn from_value(value: &Value) -> Result<Self, CoerceError>;

    /// Whether this is the zero value for the type: empty string, zero
    /// number, `false`, empty sequence, `None`. Drives the required check.
    fn is_zero(&self) -> bool;

    /// Display form for the masked printer.
    fn display(&self) -> String;
}

impl FromValue for String {
    const KIND: &'static str = "string";

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            other => Err(CoerceError::invalid(format!(
                "cannot stringify {} value",
                other.kind()
            ))),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn display(&self) -> String {
        self.clone()
    }
}

impl FromValue for bool {
    const KIND: &'static str = "bool";

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Str(s) => parse_bool(s)
                .ok_or_else(|| CoerceError::invalid(format!("invalid boolean literal '{s}'"))),
            other => Err(CoerceError::invalid(format!(
                "cannot parse {} value as bool",
                other.kind()
            ))),
        }
    }

    fn is_zero(&self) -> bool {
        !*self
    }

    fn display(&self) -> String {
        self.to_string()
    }
}

/// The boolean literal set accepted from string sources.
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn float_to_i64(f: f64) -> Result<i64, CoerceError> {
    if !f.is_finite() || f < i64::MIN as f64 || f > i64::MAX as f64 {
        return Err(CoerceError::invalid(format!("{f} out of integer range")));
    }
    Ok(f as i64)
}

fn float_to_u64(f: f64) -> Result<u64, CoerceError> {
    if !f.is_finite() || f < 0.0 || f > u64::MAX as f64 {
        return Err(CoerceError::invalid(format!(
            "{f} out of unsigned integer range"
        )));
    }
    Ok(f as u64)
}

macro_rules! signed_from_value {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            const KIND: &'static str = stringify!($ty);

            fn from_value(value: &Value) -> Result<Self, CoerceError> {
                let wide = match value {
                    Value::Int(i) => *i,
                    Value::Float(f) => float_to_i64(*f)?,
                    Value::Str(s) => s.parse::<i64>().map_err(|e| {
                        CoerceError::invalid(format!("invalid integer '{s}': {e}"))
                    })?,
                    other => {
                        return Err(CoerceError::invalid(format!(
                            "cannot parse {} value as {}",
                            other.kind(),
                            Self::KIND
                        )));
                    }
                };
                <$ty>::try_from(wide).map_err(|_| {
                    CoerceError::invalid(format!("{wide} out of range for {}", Self::KIND))
                })
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn display(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

macro_rules! unsigned_from_value {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            const KIND: &'static str = stringify!($ty);

            fn from_value(value: &Value) -> Result<Self, CoerceError> {
                let wide = match value {
                    Value::Int(i) => u64::try_from(*i).map_err(|_| {
                        CoerceError::invalid(format!("negative value {i} for {}", Self::KIND))
                    })?,
                    Value::Float(f) => float_to_u64(*f)?,
                    Value::Str(s) => s.parse::<u64>().map_err(|e| {
                        CoerceError::invalid(format!("invalid unsigned integer '{s}': {e}"))
                    })?,
                    other => {
                        return Err(CoerceError::invalid(format!(
                            "cannot parse {} value as {}",
                            other.kind(),
                            Self::KIND
                        )));
                    }
                };
                <$ty>::try_from(wide).map_err(|_| {
                    CoerceError::invalid(format!("{wide} out of range for {}", Self::KIND))
                })
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn display(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

signed_from_value!(i8, i16, i32, i64, isize);
unsigned_from_value!(u8, u16, u32, u64, usize);

impl FromValue for f64 {
    const KIND: &'static str = "f64";

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Str(s) => s
                .parse::<f64>()
                .map_err(|e| CoerceError::invalid(format!("invalid float '{s}': {e}"))),
            other => Err(CoerceError::invalid(format!(
                "cannot parse {} value as f64",
                other.kind()
            ))),
        }
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn display(&self) -> String {
        self.to_string()
    }
}

impl FromValue for f32 {
    const KIND: &'static str = "f32";

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Float(f) => Ok(*f as f32),
            Value::Str(s) => s
                .parse::<f32>()
                .map_err(|e| CoerceError::invalid(format!("invalid float '{s}': {e}"))),
            other => Err(CoerceError::invalid(format!(
                "cannot parse {} value as f32",
                other.kind()
            ))),
        }
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn display(&self) -> String {
        self.to_string()
    }
}

impl FromValue for Duration {
    const KIND: &'static str = "duration";

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Str(s) => humantime::parse_duration(s)
                .map_err(|e| CoerceError::invalid(format!("invalid duration '{s}': {e}"))),
            Value::Int(i) => u64::try_from(*i)
                .map(Duration::from_nanos)
                .map_err(|_| CoerceError::invalid(format!("negative duration {i}ns"))),
            Value::Float(f) => float_to_u64(*f).map(Duration::from_nanos),
            other => Err(CoerceError::invalid(format!(
                "cannot parse {} value as duration",
                other.kind()
            ))),
        }
    }

    fn is_zero(&self) -> bool {
        Duration::is_zero(self)
    }

    fn display(&self) -> String {
        humantime::format_duration(*self).to_string()
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const KIND: &'static str = "sequence";

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Seq(items) => items.iter().map(T::from_value).collect(),
            Value::Str(s) => split_csv(s)
                .into_iter()
                .map(|item| T::from_value(&Value::Str(item.trim().to_string())))
                .collect(),
            other => Err(CoerceError::invalid(format!(
                "cannot parse {} value as sequence",
                other.kind()
            ))),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn display(&self) -> String {
        let items: Vec<String> = self.iter().map(FromValue::display).collect();
        format!("[{}]", items.join(", "))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const KIND: &'static str = T::KIND;

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        T::from_value(value).map(Some)
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn display(&self) -> String {
        match self {
            Some(inner) => inner.display(),
            None => String::new(),
        }
    }
}

/// Split one comma-separated line into fields. Double quotes protect
/// literal commas; a doubled quote inside a quoted field yields one quote.
fn split_csv(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    cur.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => parts.push(std::mem::take(&mut cur)),
            _ => cur.push(c),
        }
    }
    parts.push(cur);
    parts
}
