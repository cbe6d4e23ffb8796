//! Kernel utilities shared by the accounts crates.
//! Keep this crate lightweight: layered configuration loading and id generation only.
//!
//! ## ID generation
//! ```rust
//! # use accounts_kernel::safe_nanoid;
//! let id = safe_nanoid!();
//! assert_eq!(id.len(), 12);
//! ```
//!
//! ## Config loading
//! ```rust,ignore
//! use accounts_domain::config::BoostOptions;
//! use accounts_kernel::config::load_config;
//!
//! let options: BoostOptions = load_config(Some("boost"))?;
//! ```
pub mod config;

// Alphabet excludes visually ambiguous characters (I, O, l, 0, 1).
pub const SAFE_ALPHABET: &[char; 55] = &[
    '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f',
    'g', 'h', 'j', 'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

pub use accounts_domain as domain;
pub use nanoid::nanoid;

/// Generates an unambiguous `NanoID`, used for user and session identifiers.
#[macro_export]
macro_rules! safe_nanoid {
    () => {
        $crate::nanoid!(12, $crate::SAFE_ALPHABET)
    };
    ($size:expr) => {
        $crate::nanoid!($size, $crate::SAFE_ALPHABET)
    };
}
