//! Macro for implementing Display and FromStr for closed domain enums
//!
//! Credential kinds and similar enums are persisted as short lowercase tags.
//! This macro keeps the tag table in one place for both directions.
//!
//! # Example
//!
//! ```rust
//! use graphgate_domain::impl_domain_tag_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Audience {
//!     Page,
//!     AdAccount,
//! }
//!
//! impl_domain_tag_conversions!(Audience {
//!     Page => "page",
//!     AdAccount => "ad_account",
//! });
//!
//! assert_eq!(Audience::AdAccount.to_string(), "ad_account");
//! assert_eq!("PAGE".parse::<Audience>().unwrap(), Audience::Page);
//! ```

/// Implements Display and FromStr for a tag-mapped enum
///
/// - Display writes the tag verbatim
/// - FromStr matches case-insensitively and names the enum on failure
#[macro_export]
macro_rules! impl_domain_tag_conversions {
    ($enum_name:ident { $($variant:ident => $tag:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($tag),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($tag => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
