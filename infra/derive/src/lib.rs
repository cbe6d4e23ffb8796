#![allow(unreachable_pub)]

//! # Macros
//!
//! Procedural macros shared across the accounts workspace.
//!
//! Only the error-enum attribute lives here for now; every crate in the workspace declares
//! its error type with it so that contextual messages and `?` conversions behave the same
//! everywhere.

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Declares a crate-level error enum.
///
/// # Generated items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * A companion `<Name>Ext<T>` trait adding `.context(..)` to `Result<T, Name>` and to
///   `Result<T, Source>` for every variant that wraps a source error.
/// * `From<Source>` for every variant with a source field (except `Internal`).
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * A private `format_context` helper used by the `#[error(..)]` strings.
///
/// # Requirements
///
/// * Every variant uses named fields.
/// * A variant with a source (a field named `source`, or marked `#[source]` / `#[from]`)
///   also carries `context: Option<Cow<'static, str>>`.
/// * One annotated enum per module (the helper function is module-scoped).
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[accounts_derive::accounts_error]
/// pub enum StorageError {
///     #[error("Query failed{}: {source}", format_context(.context))]
///     Query { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal storage error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn load() -> Result<(), StorageError> {
///     std::fs::read("users.json").context("Reading user snapshot")?;
///     Err("snapshot is empty".into())
/// }
/// ```
#[proc_macro_attribute]
pub fn accounts_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand(input).unwrap_or_else(syn::Error::into_compile_error).into()
}
