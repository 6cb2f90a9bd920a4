//! Macros shared by the handler builders.

/// Fail with [`HandlerBuildError::InvalidConfig`] when `$value` equals the
/// default of `$ty` (zero for integers and durations).
///
/// [`HandlerBuildError::InvalidConfig`]: crate::handlers::HandlerBuildError::InvalidConfig
macro_rules! ensure_positive {
    ($value:expr, $ty:ty, $field:expr) => {{
        if $value == <$ty as Default>::default() {
            Err($crate::handlers::HandlerBuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

/// Generate a fluent setter storing `Some(value)` in an optional field.
macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, into $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: impl Into<$ty>) -> Self {
            self.$field = Some(value.into());
            self
        }
    };
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

pub(crate) use ensure_positive;
pub(crate) use option_setter;

