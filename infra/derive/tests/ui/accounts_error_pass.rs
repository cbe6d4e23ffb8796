use accounts_derive::accounts_error;
use std::borrow::Cow;

#[accounts_error]
#[derive(Debug)]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<std::borrow::Cow<'static, str>>,
    },

    #[error("Missing{}: {message}", format_context(.context))]
    Missing { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let err: DemoError = std::io::Error::other("disk").into();
    let _ = err.to_string();
}
