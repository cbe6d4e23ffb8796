use crate::context::{AccountsContext, UNAUTHORIZED, auth_directive};
use crate::resolvers::{DirectiveMap, Resolver, ResolverMap, resolver};
use crate::schema::{MUTATION, QUERY};
use crate::typedefs::{FieldDef, TypeDef, TypeDefs};
#[cfg(feature = "password")]
use accounts_password::{CreateUser, PasswordService, SERVICE_NAME as PASSWORD};
use accounts_server::AccountsServer;
use async_graphql::dynamic::{FieldFuture, ResolverContext};
use async_graphql::{Error, Value};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

pub const AUTH_DIRECTIVE: &str = "auth";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FragmentOptions {
    /// Emits the root types as `extend type` so the fragment can join an existing schema.
    pub extend: bool,
}

/// A partial schema: type definitions with the resolvers and directives they rely on.
#[derive(Clone, Default)]
pub struct SchemaFragment {
    pub type_defs: TypeDefs,
    pub resolvers: ResolverMap,
    pub directives: DirectiveMap,
}

impl fmt::Debug for SchemaFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaFragment")
            .field("type_defs", &self.type_defs)
            .field("resolvers", &self.resolvers)
            .field("directives", &self.directives.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Produces schema fragments over an accounts server.
pub trait SchemaAdapter: fmt::Debug + Send + Sync {
    fn schema_fragment(&self, server: &Arc<AccountsServer>, options: FragmentOptions) -> SchemaFragment;
}

/// The accounts GraphQL API.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountsGraphql;

impl SchemaAdapter for AccountsGraphql {
    fn schema_fragment(&self, server: &Arc<AccountsServer>, options: FragmentOptions) -> SchemaFragment {
        create_schema_fragment(server, options)
    }
}

/// Type definitions, resolvers and the `@auth` directive of the accounts API.
#[must_use]
pub fn create_schema_fragment(server: &Arc<AccountsServer>, options: FragmentOptions) -> SchemaFragment {
    SchemaFragment {
        type_defs: type_defs(options),
        resolvers: resolvers(server),
        directives: DirectiveMap::from([(AUTH_DIRECTIVE.to_owned(), auth_directive())]),
    }
}

fn type_defs(options: FragmentOptions) -> TypeDefs {
    let root = |name: &str| if options.extend { TypeDef::extension(name) } else { TypeDef::object(name) };

    let mutation = root(MUTATION)
        .field(
            FieldDef::new("authenticate", "LoginResult")
                .arg("serviceName", "String!")
                .arg("params", "AuthenticateParamsInput!"),
        )
        .field(
            FieldDef::new("refreshTokens", "LoginResult")
                .arg("accessToken", "String!")
                .arg("refreshToken", "String!"),
        )
        .field(FieldDef::new("logout", "Boolean").directive(AUTH_DIRECTIVE));

    let defs = TypeDefs::new()
        .declare_directive(AUTH_DIRECTIVE)
        .with(
            TypeDef::object("Tokens")
                .field(FieldDef::new("refreshToken", "String"))
                .field(FieldDef::new("accessToken", "String")),
        )
        .with(
            TypeDef::object("LoginResult")
                .field(FieldDef::new("sessionId", "String"))
                .field(FieldDef::new("tokens", "Tokens"))
                .field(FieldDef::new("user", "User")),
        )
        .with(
            TypeDef::object("EmailRecord")
                .field(FieldDef::new("address", "String"))
                .field(FieldDef::new("verified", "Boolean")),
        )
        .with(
            TypeDef::object("User")
                .field(FieldDef::new("id", "ID!"))
                .field(FieldDef::new("emails", "[EmailRecord!]"))
                .field(FieldDef::new("username", "String"))
                .field(FieldDef::new("deactivated", "Boolean")),
        )
        .with(
            TypeDef::input("UserInput")
                .field(FieldDef::new("id", "ID"))
                .field(FieldDef::new("email", "String"))
                .field(FieldDef::new("username", "String")),
        )
        .with(
            TypeDef::input("AuthenticateParamsInput")
                .field(FieldDef::new("user", "UserInput"))
                .field(FieldDef::new("password", "String")),
        )
        .with(root(QUERY).field(FieldDef::new("getUser", "User")));

    #[cfg(feature = "password")]
    let (defs, mutation) = (
        defs.with(
            TypeDef::input("CreateUserInput")
                .field(FieldDef::new("username", "String"))
                .field(FieldDef::new("email", "String"))
                .field(FieldDef::new("password", "String!")),
        ),
        mutation
            .field(FieldDef::new("createUser", "ID").arg("user", "CreateUserInput!"))
            .field(
                FieldDef::new("changePassword", "Boolean")
                    .arg("oldPassword", "String!")
                    .arg("newPassword", "String!")
                    .directive(AUTH_DIRECTIVE),
            ),
    );

    defs.with(mutation)
}

fn resolvers(server: &Arc<AccountsServer>) -> ResolverMap {
    let map = ResolverMap::new()
        .with(QUERY, "getUser", resolver(|ctx| {
            let user = context(&ctx).user.clone();
            FieldFuture::new(async move { user.map(|u| to_value(&u)).transpose() })
        }))
        .with(MUTATION, "authenticate", with_server(server, |server, ctx| {
            FieldFuture::new(async move {
                let service = ctx.args.try_get("serviceName")?.string()?;
                let params: serde_json::Value = arg(&ctx, "params")?;
                let info = context(&ctx).connection_info();
                let login = server.login_with_service(service, params, info).await?;
                Ok(Some(to_value(&login)?))
            })
        }))
        .with(MUTATION, "refreshTokens", with_server(server, |server, ctx| {
            FieldFuture::new(async move {
                let access = ctx.args.try_get("accessToken")?.string()?;
                let refresh = ctx.args.try_get("refreshToken")?.string()?;
                let info = context(&ctx).connection_info();
                let login = server.refresh_tokens(access, refresh, info).await?;
                Ok(Some(to_value(&login)?))
            })
        }))
        .with(MUTATION, "logout", with_server(server, |server, ctx| {
            FieldFuture::new(async move {
                let token =
                    context(&ctx).auth_token.as_deref().ok_or_else(|| Error::new(UNAUTHORIZED))?;
                server.logout(token).await?;
                Ok(Some(Value::from(true)))
            })
        }));

    #[cfg(feature = "password")]
    let map = password_resolvers(map, server);

    map
}

#[cfg(feature = "password")]
fn password_resolvers(map: ResolverMap, server: &Arc<AccountsServer>) -> ResolverMap {
    map.with(MUTATION, "createUser", with_server(server, |server, ctx| {
        FieldFuture::new(async move {
            let input: CreateUser = arg(&ctx, "user")?;
            let id = password_service(&server)?.create_user(input).await?;
            Ok(Some(Value::from(id)))
        })
    }))
    .with(MUTATION, "changePassword", with_server(server, |server, ctx| {
        FieldFuture::new(async move {
            let user = context(&ctx).user.as_ref().ok_or_else(|| Error::new(UNAUTHORIZED))?;
            let old = ctx.args.try_get("oldPassword")?.string()?;
            let new = ctx.args.try_get("newPassword")?.string()?;
            password_service(&server)?.change_password(&user.id, old, new).await?;
            Ok(Some(Value::from(true)))
        })
    }))
}

/// A resolver handing `f` its own handle on the server.
fn with_server<F>(server: &Arc<AccountsServer>, f: F) -> Resolver
where
    F: for<'a> Fn(Arc<AccountsServer>, ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
{
    let server = Arc::clone(server);
    resolver(move |ctx| f(Arc::clone(&server), ctx))
}

static ANONYMOUS: AccountsContext =
    AccountsContext { auth_token: None, user: None, user_agent: None, ip: None };

fn context<'a>(ctx: &'a ResolverContext<'_>) -> &'a AccountsContext {
    ctx.data_opt::<AccountsContext>().unwrap_or(&ANONYMOUS)
}

#[cfg(feature = "password")]
fn password_service(server: &AccountsServer) -> async_graphql::Result<&PasswordService> {
    server
        .service_as::<PasswordService>(PASSWORD)
        .ok_or_else(|| Error::new("Password service is not available"))
}

fn arg<T: DeserializeOwned>(ctx: &ResolverContext<'_>, name: &str) -> async_graphql::Result<T> {
    let json = ctx.args.try_get(name)?.as_value().clone().into_json()?;
    Ok(serde_json::from_value(json)?)
}

fn to_value<T: Serialize>(value: &T) -> async_graphql::Result<Value> {
    Ok(Value::from_json(serde_json::to_value(value)?)?)
}
