use crate::resolvers::{Directive, Resolver, resolver};
use accounts_server::{AccountsServer, ConnectionInfo, User};
use async_graphql::dynamic::FieldFuture;
use async_graphql::{Error, Value};
use std::sync::Arc;
use tracing::debug;

pub const UNAUTHORIZED: &str = "Unauthorized";

/// Request data the context is built from, as extracted by the HTTP layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    /// Raw `Authorization` header, with or without the `Bearer` scheme.
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

/// Per-request data available to resolvers.
#[derive(Debug, Clone, Default)]
pub struct AccountsContext {
    pub auth_token: Option<String>,
    /// Set when `auth_token` resumed a live session.
    pub user: Option<User>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

impl AccountsContext {
    #[must_use]
    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo { ip: self.ip.clone(), user_agent: self.user_agent.clone() }
    }
}

/// Builds the resolver context for one request.
///
/// A token that does not resume a session yields an anonymous context rather than an error,
/// so public fields stay reachable.
pub async fn accounts_context(server: &AccountsServer, request: RequestInfo) -> AccountsContext {
    let auth_token = request.authorization.as_deref().map(bearer).filter(|t| !t.is_empty());

    let user = match auth_token {
        Some(token) => match server.resume_session(token).await {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(error = %e, "Ignoring access token that does not resume a session");
                None
            }
        },
        None => None,
    };

    AccountsContext {
        auth_token: auth_token.map(str::to_owned),
        user,
        user_agent: request.user_agent,
        ip: request.ip,
    }
}

fn bearer(header: &str) -> &str {
    let header = header.trim();
    header
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map_or(header, |(_, token)| token.trim())
}

/// [`accounts_context`] bound to a server, for handing to an HTTP layer.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    server: Arc<AccountsServer>,
}

impl ContextBuilder {
    #[must_use]
    pub const fn new(server: Arc<AccountsServer>) -> Self {
        Self { server }
    }

    pub async fn build(&self, request: RequestInfo) -> AccountsContext {
        accounts_context(&self.server, request).await
    }
}

/// The `@auth` directive: the wrapped field fails with `Unauthorized` unless the request
/// context carries a user.
#[must_use]
pub fn auth_directive() -> Directive {
    Arc::new(|next: Resolver| {
        resolver(move |ctx| {
            let authorized = ctx.data_opt::<AccountsContext>().is_some_and(|c| c.user.is_some());
            if authorized {
                next(ctx)
            } else {
                FieldFuture::new(async { Err::<Option<Value>, _>(Error::new(UNAUTHORIZED)) })
            }
        })
    })
}
