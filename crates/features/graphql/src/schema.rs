use crate::error::GraphqlError;
use crate::resolvers::{DirectiveMap, ResolverMap, property_resolver};
use crate::typedefs::{TypeDef, TypeDefs, TypeKind, parse_type_ref};
use async_graphql::dynamic::{Field, InputObject, InputValue, Object, Schema};
use tracing::debug;

pub const QUERY: &str = "Query";
pub const MUTATION: &str = "Mutation";

/// Builds an executable schema from type definitions, resolvers and directives.
///
/// Extensions are folded into their base types first. Fields without a resolver read the
/// property of the same name from their parent value. Field directives wrap the resolver in
/// declaration order, so the last one listed runs first.
///
/// # Errors
/// * [`GraphqlError::Schema`] for conflicting definitions, a resolver without a matching
///   field, or when the engine rejects the schema.
/// * [`GraphqlError::UnknownDirective`] when a field names a directive missing from `directives`.
/// * [`GraphqlError::TypeRef`] for malformed type strings.
pub fn build_executable_schema(
    type_defs: &TypeDefs,
    resolvers: &ResolverMap,
    directives: &DirectiveMap,
) -> Result<Schema, GraphqlError> {
    let types = type_defs.fold()?;

    for (type_name, field) in resolvers.entries() {
        let defined = types
            .iter()
            .any(|t| t.name == type_name && t.kind == TypeKind::Object && t.has_field(field));
        if !defined {
            return Err(GraphqlError::schema(format!(
                "Resolver '{type_name}.{field}' has no matching field in the type definitions"
            )));
        }
    }

    let mutation = types.iter().any(|t| t.name == MUTATION).then_some(MUTATION);
    let mut builder = Schema::build(QUERY, mutation, None);
    for def in &types {
        builder = match def.kind {
            TypeKind::Object => builder.register(object(def, resolvers, directives)?),
            TypeKind::Input => builder.register(input_object(def)?),
        };
    }

    let schema = builder.finish().map_err(|e| GraphqlError::schema(e.to_string()))?;
    debug!(types = types.len(), resolvers = resolvers.len(), "Executable schema built");
    Ok(schema)
}

fn object(
    def: &TypeDef,
    resolvers: &ResolverMap,
    directives: &DirectiveMap,
) -> Result<Object, GraphqlError> {
    let mut object = Object::new(def.name.as_str());
    for field in &def.fields {
        let mut resolve = resolvers
            .get(&def.name, &field.name)
            .cloned()
            .unwrap_or_else(|| property_resolver(field.name.as_str()));
        for name in &field.directives {
            let directive = directives.get(name).ok_or_else(|| GraphqlError::UnknownDirective {
                message: name.clone().into(),
                context: Some(format!("{}.{}", def.name, field.name).into()),
            })?;
            resolve = directive(resolve);
        }

        let mut built =
            Field::new(field.name.as_str(), parse_type_ref(&field.ty)?, move |ctx| resolve(ctx));
        for arg in &field.args {
            built = built.argument(InputValue::new(arg.name.as_str(), parse_type_ref(&arg.ty)?));
        }
        object = object.field(built);
    }
    Ok(object)
}

fn input_object(def: &TypeDef) -> Result<InputObject, GraphqlError> {
    def.fields.iter().try_fold(InputObject::new(def.name.as_str()), |input, field| {
        Ok(input.field(InputValue::new(field.name.as_str(), parse_type_ref(&field.ty)?)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::{Directive, Resolver, resolver};
    use crate::typedefs::FieldDef;
    use async_graphql::Value;
    use async_graphql::dynamic::{FieldFuture, FieldValue};
    use serde_json::json;
    use std::sync::Arc;

    fn greeting() -> Resolver {
        resolver(|_| {
            FieldFuture::new(async {
                Ok(Some(FieldValue::value(Value::from_json(json!({
                    "name": "accounts",
                    "tags": [{ "label": "a" }, { "label": "b" }]
                }))?)))
            })
        })
    }

    fn type_defs() -> TypeDefs {
        TypeDefs::new()
            .with(TypeDef::object("Tag").field(FieldDef::new("label", "String!")))
            .with(
                TypeDef::object("Greeting")
                    .field(FieldDef::new("name", "String!"))
                    .field(FieldDef::new("tags", "[Tag!]!")),
            )
            .with(TypeDef::object("Query").field(FieldDef::new("greeting", "Greeting")))
    }

    #[tokio::test]
    async fn default_resolvers_read_parent_properties() {
        let resolvers = ResolverMap::new().with("Query", "greeting", greeting());
        let schema = build_executable_schema(&type_defs(), &resolvers, &DirectiveMap::new()).unwrap();

        let response = schema.execute("{ greeting { name tags { label } } }").await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "greeting": { "name": "accounts", "tags": [{ "label": "a" }, { "label": "b" }] } })
        );
    }

    #[tokio::test]
    async fn directives_wrap_resolvers() {
        let shout: Directive = Arc::new(|_next: Resolver| {
            resolver(|_| FieldFuture::new(async { Ok(Some(Value::from("HELLO"))) }))
        });
        let defs = TypeDefs::new()
            .with(TypeDef::object("Query").field(FieldDef::new("hello", "String").directive("shout")));
        let directives = DirectiveMap::from([("shout".to_owned(), shout)]);

        let schema = build_executable_schema(&defs, &ResolverMap::new(), &directives).unwrap();
        let response = schema.execute("{ hello }").await;
        assert_eq!(response.data.into_json().unwrap(), json!({ "hello": "HELLO" }));
    }

    #[test]
    fn unknown_directive_is_an_error() {
        let defs = TypeDefs::new()
            .with(TypeDef::object("Query").field(FieldDef::new("hello", "String").directive("nope")));
        let err = build_executable_schema(&defs, &ResolverMap::new(), &DirectiveMap::new()).unwrap_err();
        assert!(matches!(err, GraphqlError::UnknownDirective { .. }));
    }

    #[test]
    fn resolver_without_field_is_an_error() {
        let resolvers = ResolverMap::new().with("Query", "missing", greeting());
        let err = build_executable_schema(&type_defs(), &resolvers, &DirectiveMap::new()).unwrap_err();
        assert!(matches!(err, GraphqlError::Schema { .. }));
    }

    #[test]
    fn mutation_root_is_optional() {
        let schema =
            build_executable_schema(&type_defs(), &ResolverMap::new(), &DirectiveMap::new()).unwrap();
        assert!(!schema.sdl().contains("type Mutation"));
    }
}
