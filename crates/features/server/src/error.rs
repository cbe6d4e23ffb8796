use crate::storage::StorageError;
use std::borrow::Cow;

#[accounts_derive::accounts_error]
pub enum ServerError {
    /// The server was configured with unusable options.
    #[error("Configuration error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Storage error{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    /// A token could not be signed or did not verify.
    #[error("Token error{}: {source}", format_context(.context))]
    Token { source: jsonwebtoken::errors::Error, context: Option<Cow<'static, str>> },

    #[error("Service '{message}' is not registered{}", format_context(.context))]
    ServiceNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("{message}{}", format_context(.context))]
    InvalidCredentials { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid session{}: {message}", format_context(.context))]
    InvalidSession { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("User not found{}: {message}", format_context(.context))]
    UserNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Raised by an authentication service for anything that is not a credential mismatch.
    #[error("{message}{}", format_context(.context))]
    Service { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal server error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ServerError {
    pub(crate) fn invalid_session(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidSession { message: message.into(), context: None }
    }
}
