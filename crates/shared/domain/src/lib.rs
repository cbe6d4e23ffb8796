//! # Domain Models
//!
//! Configuration models and constants shared by every accounts crate.
//! Keep it lean: no I/O and no networking, only data, defaults and field-by-field merging.

pub mod config;
pub mod constants;
