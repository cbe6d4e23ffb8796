//! # Accounts GraphQL
//!
//! Exposes an [`AccountsServer`](accounts_server::AccountsServer) over GraphQL.
//!
//! Schemas are assembled from [`SchemaFragment`]s: structured type definitions plus the
//! resolvers and directives they need. [`build_executable_schema`] turns any combination of
//! them into an `async_graphql` dynamic schema; [`accounts_context`] builds the per-request
//! [`AccountsContext`] that resolvers and the `@auth` directive read.
//!
//! ```rust,ignore
//! let fragment = create_schema_fragment(&server, FragmentOptions::default());
//! let schema = build_executable_schema(&fragment.type_defs, &fragment.resolvers, &fragment.directives)?;
//! let ctx = accounts_context(&server, RequestInfo::default()).await;
//! let response = schema.execute(Request::new("{ getUser { id } }").data(ctx)).await;
//! ```

mod context;
mod error;
mod fragment;
mod resolvers;
mod schema;
mod typedefs;

pub use crate::context::{
    AccountsContext, ContextBuilder, RequestInfo, UNAUTHORIZED, accounts_context, auth_directive,
};
pub use crate::error::{GraphqlError, GraphqlErrorExt};
pub use crate::fragment::{
    AUTH_DIRECTIVE, AccountsGraphql, FragmentOptions, SchemaAdapter, SchemaFragment,
    create_schema_fragment,
};
pub use crate::resolvers::{
    Directive, DirectiveMap, Resolver, ResolverMap, property_resolver, resolver,
};
pub use crate::schema::{MUTATION, QUERY, build_executable_schema};
pub use crate::typedefs::{ArgDef, FieldDef, TypeDef, TypeDefs, TypeKind, parse_type_ref};

pub use async_graphql::dynamic::Schema;
