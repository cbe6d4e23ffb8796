use async_graphql::Value;
use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A field resolver, shareable between schemas.
pub type Resolver = Arc<dyn for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync>;

/// Wraps a resolver into another one, e.g. to guard it.
pub type Directive = Arc<dyn Fn(Resolver) -> Resolver + Send + Sync>;

/// Directives keyed by name, without the leading `@`.
pub type DirectiveMap = BTreeMap<String, Directive>;

/// Boxes a closure as a [`Resolver`].
pub fn resolver<F>(f: F) -> Resolver
where
    F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Resolves `field` from the parent value when it is an object.
pub fn property_resolver(field: impl Into<String>) -> Resolver {
    let field = field.into();
    resolver(move |ctx| {
        let value = match ctx.parent_value.as_value() {
            Some(Value::Object(map)) => map.get(field.as_str()).cloned(),
            _ => None,
        };
        FieldFuture::new(async move { Ok(value.map(field_value)) })
    })
}

/// Lists become list field values so object items keep resolving their own fields.
pub(crate) fn field_value<'a>(value: Value) -> FieldValue<'a> {
    match value {
        Value::List(items) => FieldValue::list(items.into_iter().map(field_value)),
        other => FieldValue::value(other),
    }
}

/// Resolvers keyed by type name, then field name.
#[derive(Clone, Default)]
pub struct ResolverMap(BTreeMap<String, BTreeMap<String, Resolver>>);

impl ResolverMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_name: impl Into<String>, field: impl Into<String>, resolver: Resolver) {
        self.0.entry(type_name.into()).or_default().insert(field.into(), resolver);
    }

    #[must_use]
    pub fn with(mut self, type_name: impl Into<String>, field: impl Into<String>, resolver: Resolver) -> Self {
        self.insert(type_name, field, resolver);
        self
    }

    #[must_use]
    pub fn get(&self, type_name: &str, field: &str) -> Option<&Resolver> {
        self.0.get(type_name)?.get(field)
    }

    #[must_use]
    pub fn contains(&self, type_name: &str, field: &str) -> bool {
        self.get(type_name, field).is_some()
    }

    /// Every `(type, field)` pair, sorted.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(ty, fields)| fields.keys().map(move |f| (ty.as_str(), f.as_str())))
    }

    /// Every resolver as `Type.field`, sorted.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.entries().map(|(ty, field)| format!("{ty}.{field}")).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds every resolver of `other`, replacing ones already present.
    pub fn merge(&mut self, other: Self) {
        for (ty, fields) in other.0 {
            self.0.entry(ty).or_default().extend(fields);
        }
    }
}

impl fmt::Debug for ResolverMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries().map(|(ty, field)| format!("{ty}.{field}"))).finish()
    }
}
