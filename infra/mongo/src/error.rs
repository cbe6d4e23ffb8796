use accounts_server::StorageError;
use mongodb::error::{ErrorKind, WriteFailure};
use std::borrow::Cow;

const DUPLICATE_KEY: i32 = 11000;

/// A specialized [`MongoError`] enum of this crate.
#[accounts_derive::accounts_error]
pub enum MongoError {
    /// Validation errors.
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Occurs when the deployment cannot be reached or does not answer the ping.
    #[error("MongoDB connection failed{}: {message}", format_context(.context))]
    Connection { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A wrapper for driver errors.
    #[error("MongoDB error{}: {source}", format_context(.context))]
    Mongo {
        #[source]
        source: mongodb::error::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal MongoDB error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl MongoError {
    /// Whether the error is a unique index violation.
    #[must_use]
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            Self::Mongo { source, .. } => matches!(
                source.kind.as_ref(),
                ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
            ),
            _ => false,
        }
    }
}

impl From<MongoError> for StorageError {
    fn from(err: MongoError) -> Self {
        let message = err.to_string().into();
        match err {
            e if e.is_duplicate_key() => Self::Duplicate { message, context: None },
            MongoError::Validation { .. } | MongoError::Connection { .. } => {
                Self::Connection { message, context: None }
            }
            MongoError::Mongo { .. } => Self::Query { message, context: None },
            MongoError::Internal { .. } => Self::Internal { message, context: None },
        }
    }
}
