use accounts_graphql::GraphqlError;
use accounts_server::{ServerError, StorageError};
use std::borrow::Cow;

/// A specialized [`BoostError`] enum of the bootstrap. Nothing here is retried.
#[accounts_derive::accounts_error]
pub enum BoostError {
    /// No registered storage driver is available.
    #[error("Missing dependency{}: {message}", format_context(.context))]
    MissingDependency { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The selected storage driver could not connect.
    #[error("Storage connection failed{}: {source}", format_context(.context))]
    ConnectionFailure { source: StorageError, context: Option<Cow<'static, str>> },

    /// The HTTP listener could not bind its address.
    #[error("Failed to bind the HTTP listener{}: {source}", format_context(.context))]
    BindFailure { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Schema composition failed{}: {source}", format_context(.context))]
    Schema { source: GraphqlError, context: Option<Cow<'static, str>> },

    /// A service factory rejected its configuration.
    #[error("Service error{}: {message}", format_context(.context))]
    Service { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The accounts server refused the merged options.
    #[error("Accounts server error{}: {source}", format_context(.context))]
    Server { source: ServerError, context: Option<Cow<'static, str>> },

    #[error("Internal boost error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
