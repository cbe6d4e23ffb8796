use accounts_server::{ServerError, StorageError};
use std::borrow::Cow;

#[accounts_derive::accounts_error]
pub enum PasswordError {
    /// Input rejected before touching storage.
    #[error("{message}{}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("{message}{}", format_context(.context))]
    UserExists { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("User not found{}", format_context(.context))]
    UserNotFound { context: Option<Cow<'static, str>> },

    #[error("Incorrect password{}", format_context(.context))]
    IncorrectPassword { context: Option<Cow<'static, str>> },

    #[error("User has no password set{}", format_context(.context))]
    NoPasswordSet { context: Option<Cow<'static, str>> },

    #[error("Password hashing failed{}: {message}", format_context(.context))]
    Hash { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Storage error{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    #[error("Internal password service error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl PasswordError {
    /// Whether the error only says the credentials did not match.
    #[must_use]
    pub const fn is_credential_mismatch(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound { .. } | Self::IncorrectPassword { .. } | Self::NoPasswordSet { .. }
        )
    }
}

impl From<argon2::password_hash::Error> for PasswordError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::Hash { message: err.to_string().into(), context: None }
    }
}

impl From<PasswordError> for ServerError {
    fn from(err: PasswordError) -> Self {
        let message = err.to_string().into();
        match err {
            PasswordError::Storage { source, context } => Self::Storage { source, context },
            e if e.is_credential_mismatch() => Self::InvalidCredentials { message, context: None },
            _ => Self::Service { message, context: None },
        }
    }
}
