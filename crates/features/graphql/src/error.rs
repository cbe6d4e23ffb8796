use std::borrow::Cow;

#[accounts_derive::accounts_error]
pub enum GraphqlError {
    /// A field or argument type string is not valid SDL.
    #[error("Invalid type reference '{message}'{}", format_context(.context))]
    TypeRef { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Type definitions, resolvers and directives do not fit together.
    #[error("Schema error{}: {message}", format_context(.context))]
    Schema { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unknown directive '@{message}'{}", format_context(.context))]
    UnknownDirective { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal GraphQL error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl GraphqlError {
    pub(crate) fn schema(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Schema { message: message.into(), context: None }
    }
}
