//! Macro for implementing Display and FromStr for status enums
//!
//! Persisted enums (sync status, sync type, service type) are stored as
//! text columns; this macro keeps the string form and the parser in one
//! place.
//!
//! # Example
//!
//! ```rust
//! use cellarsync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum RunState {
//!     Running,
//!     Completed,
//! }
//!
//! impl_domain_status_conversions!(RunState {
//!     Running => "running",
//!     Completed => "completed",
//! });
//!
//! assert_eq!(RunState::Running.to_string(), "running");
//! assert_eq!("COMPLETED".parse::<RunState>().unwrap(), RunState::Completed);
//! ```

/// Implements Display and FromStr traits for status enums
///
/// Parsing is case-insensitive; display always yields the canonical string.
/// Canonical strings must therefore be lowercase-unique.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical string form used for storage.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                let lowered = s.to_lowercase();
                $(
                    if lowered == $str.to_lowercase() {
                        return ::std::result::Result::Ok(Self::$variant);
                    }
                )+
                ::std::result::Result::Err(::std::format!(
                    "Invalid {}: {}",
                    stringify!($enum_name),
                    s
                ))
            }
        }
    };
}
