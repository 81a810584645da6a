//! Crate-internal macros.

/// Implement `fmt::Debug` for a struct holding credentials.
///
/// Each field is listed with how it should print:
///
/// - `show field` - the value as-is
/// - `redact field` - `"[REDACTED]"`
/// - `redact_option field` - `Some("[REDACTED]")` when set, `None` otherwise
///
/// ```ignore
/// redacted_debug!(Config {
///     redact_option database_url,
///     show bind_address,
///     redact jwt_secret,
/// });
/// ```
///
/// Fields not listed are hidden behind `..`.
macro_rules! redacted_debug {
    ($name:ident { $( $kind:ident $field:ident ),* $(,)? }) => {
        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                let mut s = f.debug_struct(stringify!($name));
                $( redacted_debug!(@field s, self, $kind, $field); )*
                s.finish_non_exhaustive()
            }
        }
    };
    (@field $s:ident, $self:ident, show, $field:ident) => {
        $s.field(stringify!($field), &$self.$field);
    };
    (@field $s:ident, $self:ident, redact, $field:ident) => {
        $s.field(stringify!($field), &"[REDACTED]");
    };
    (@field $s:ident, $self:ident, redact_option, $field:ident) => {
        $s.field(stringify!($field), &$self.$field.as_ref().map(|_| "[REDACTED]"));
    };
}
