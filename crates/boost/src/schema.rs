use crate::error::{BoostError, BoostErrorExt};
use accounts_graphql::{
    ContextBuilder, Directive, DirectiveMap, RequestInfo, ResolverMap, Schema, SchemaFragment,
    TypeDefs, auth_directive, build_executable_schema,
};
use accounts_server::AccountsServer;
use async_graphql::{Request, Response};
use std::fmt;
use std::sync::Arc;

/// The merged GraphQL API of a [`Boost`](crate::Boost) instance. Built once, then shared.
pub struct ComposedSchema {
    /// Type definitions of the base fragment.
    pub type_defs: TypeDefs,
    /// Resolvers of the extended fragment.
    pub resolvers: ResolverMap,
    /// Directives of the extended fragment.
    pub directives: DirectiveMap,
    pub schema: Schema,
    pub context_builder: ContextBuilder,
    /// The `@auth` directive, for callers wrapping their own resolvers.
    pub auth_directive: Directive,
}

impl ComposedSchema {
    /// Executes `request` with the accounts context built from `info`.
    pub async fn execute(&self, request: Request, info: RequestInfo) -> Response {
        let context = self.context_builder.build(info).await;
        self.schema.execute(request.data(context)).await
    }

    /// The composed type definitions rendered as SDL.
    #[must_use]
    pub fn sdl(&self) -> String {
        self.type_defs.to_string()
    }
}

impl fmt::Debug for ComposedSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedSchema")
            .field("type_defs", &self.type_defs)
            .field("resolvers", &self.resolvers)
            .field("directives", &self.directives.keys().collect::<Vec<_>>())
            .field("context_builder", &self.context_builder)
            .finish_non_exhaustive()
    }
}

/// Merges the base fragment's type definitions with the extended fragment's resolvers and
/// directives into one executable schema.
pub(crate) fn compose(
    server: &Arc<AccountsServer>,
    base: SchemaFragment,
    extended: SchemaFragment,
) -> Result<ComposedSchema, BoostError> {
    let SchemaFragment { type_defs, .. } = base;
    let SchemaFragment { resolvers, directives, .. } = extended;

    let schema = build_executable_schema(&type_defs, &resolvers, &directives)
        .context("Building executable schema")?;

    Ok(ComposedSchema {
        type_defs,
        resolvers,
        directives,
        schema,
        context_builder: ContextBuilder::new(Arc::clone(server)),
        auth_directive: auth_directive(),
    })
}
