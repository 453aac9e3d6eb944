//! The typed record side of binding: field metadata, the visitor that
//! replaces runtime reflection, and the [`record!`] macro that generates
//! both from a struct-like description.
//!
//! A configuration type describes its own field tree once, in
//! [`Record::visit`]. Every concern that needs to walk the tree (binding
//! values, collecting defaults, checking required fields, printing) is a
//! [`FieldVisitor`], so the coercion dispatch is a static mapping rather
//! than introspection.

use crate::coerce::FromValue;
use crate::error::HotfigError;

/// Per-field annotations: the struct-tag equivalent.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMeta {
    /// Default value fed through the normal provider pipeline by
    /// [`DefaultsProvider`](crate::DefaultsProvider).
    pub default: Option<&'static str>,
    /// The field must resolve to a non-zero value.
    pub required: bool,
    /// Mask the value in printed output.
    pub secret: bool,
}

impl FieldMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

/// Depth-first traversal callbacks over a record's field tree.
///
/// `leaf` receives the declared field name (the key mapper canonicalizes
/// it), the field's annotations, and a typed slot. `nested` descends into a
/// sub-record; implementations extend their path state around the recursion.
pub trait FieldVisitor {
    fn leaf<F: FromValue>(
        &mut self,
        name: &str,
        meta: FieldMeta,
        field: &mut F,
    ) -> Result<(), HotfigError>;

    fn nested<R: Record>(&mut self, name: &str, record: &mut R) -> Result<(), HotfigError>;
}

/// A bindable configuration record.
///
/// Usually generated by [`record!`]; implement by hand to customize field
/// names or to override [`validate`](Record::validate):
///
/// ```ignore
/// impl Record for ServerConfig {
///     fn visit<V: FieldVisitor>(&mut self, v: &mut V) -> Result<(), HotfigError> {
///         v.leaf("Port", FieldMeta::new().default_value("8080"), &mut self.port)?;
///         v.leaf("DatabaseURL", FieldMeta::new().required(), &mut self.database_url)?;
///         v.nested("Tls", &mut self.tls)?;
///         Ok(())
///     }
///
///     fn validate(&self) -> Result<(), String> {
///         if self.port < 1024 {
///             return Err("port must be unprivileged".into());
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Record: Default {
    /// Report every field to `visitor`, in declaration order.
    fn visit<V: FieldVisitor>(&mut self, visitor: &mut V) -> Result<(), HotfigError>;

    /// Intrinsic validation, run last in the validator chain (after the
    /// required check and the caller validator).
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Define a configuration struct together with its [`Record`] impl.
///
/// Field annotations go in brackets after the type: `default = "..."`,
/// `required`, `secret`, or `nested` for a sub-record field.
///
/// ```ignore
/// hotfig::record! {
///     #[derive(Debug, Clone, Default, PartialEq)]
///     pub struct AppConfig {
///         pub host: String [default = "localhost"],
///         pub port: u16 [default = "8080"],
///         pub api_key: String [required, secret],
///         pub debug: bool,
///         pub database: DbConfig [nested],
///     }
/// }
/// ```
///
/// The generated impl uses the default [`Record::validate`]; types that need
/// intrinsic validation implement [`Record`] by hand.
#[macro_export]
macro_rules! record {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fattr:meta])*
                $fvis:vis $field:ident : $fty:ty $([ $($ann:tt)* ])?
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        $vis struct $name {
            $(
                $(#[$fattr])*
                $fvis $field: $fty,
            )*
        }

        impl $crate::Record for $name {
            fn visit<V: $crate::FieldVisitor>(
                &mut self,
                visitor: &mut V,
            ) -> ::std::result::Result<(), $crate::HotfigError> {
                $(
                    $crate::__record_field!(visitor, self, $field, [$($($ann)*)?]);
                )*
                ::std::result::Result::Ok(())
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_field {
    ($visitor:ident, $self_:ident, $field:ident, [nested]) => {
        $visitor.nested(stringify!($field), &mut $self_.$field)?;
    };
    ($visitor:ident, $self_:ident, $field:ident, [$($ann:tt)*]) => {
        $visitor.leaf(
            stringify!($field),
            $crate::__record_meta!($($ann)*),
            &mut $self_.$field,
        )?;
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_meta {
    () => { $crate::FieldMeta::new() };
    (required $(, $($rest:tt)*)?) => {
        $crate::__record_meta!($($($rest)*)?).required()
    };
    (secret $(, $($rest:tt)*)?) => {
        $crate::__record_meta!($($($rest)*)?).secret()
    };
    (default = $value:literal $(, $($rest:tt)*)?) => {
        $crate::__record_meta!($($($rest)*)?).default_value($value)
    };
}
