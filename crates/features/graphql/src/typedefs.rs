//! Structured GraphQL type definitions.
//!
//! Fragments describe their types as data instead of SDL text so they can be folded and
//! registered without a parser. [`TypeDefs`] still renders to SDL for humans and tooling.

use crate::error::GraphqlError;
use async_graphql::dynamic::TypeRef;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Object,
    Input,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDef {
    pub name: String,
    /// SDL type, e.g. `String!`.
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    /// SDL type, e.g. `[EmailRecord!]`.
    pub ty: String,
    pub args: Vec<ArgDef>,
    /// Directive names without the leading `@`, applied in order.
    pub directives: Vec<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self { name: name.into(), ty: ty.into(), args: Vec::new(), directives: Vec::new() }
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.args.push(ArgDef { name: name.into(), ty: ty.into() });
        self
    }

    #[must_use]
    pub fn directive(mut self, name: impl Into<String>) -> Self {
        self.directives.push(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    /// Renders as `extend type` and adds fields to an existing definition when folded.
    pub extend: bool,
    pub fields: Vec<FieldDef>,
}

impl TypeDef {
    pub fn object(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: TypeKind::Object, extend: false, fields: Vec::new() }
    }

    pub fn input(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: TypeKind::Input, extend: false, fields: Vec::new() }
    }

    /// An `extend type` block for an object type.
    pub fn extension(name: impl Into<String>) -> Self {
        Self { extend: true, ..Self::object(name) }
    }

    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

/// An ordered set of type definitions plus the directives they declare.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDefs {
    directives: Vec<String>,
    types: Vec<TypeDef>,
}

impl TypeDefs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field-level directive (`directive @name on FIELD_DEFINITION | OBJECT`).
    #[must_use]
    pub fn declare_directive(mut self, name: impl Into<String>) -> Self {
        self.directives.push(name.into());
        self
    }

    #[must_use]
    pub fn with(mut self, def: TypeDef) -> Self {
        self.types.push(def);
        self
    }

    pub fn push(&mut self, def: TypeDef) {
        self.types.push(def);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter()
    }

    #[must_use]
    pub fn declared_directives(&self) -> &[String] {
        &self.directives
    }

    /// The base (non-extension) definition of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name == name && !t.extend)
    }

    /// Merges every `extend` block into its base definition.
    ///
    /// # Errors
    /// A type defined twice, an extension of an unknown type, an extension that changes the
    /// kind of its type or a field defined twice.
    pub fn fold(&self) -> Result<Vec<TypeDef>, GraphqlError> {
        let mut folded: Vec<TypeDef> = Vec::with_capacity(self.types.len());
        for def in self.types.iter().filter(|t| !t.extend) {
            if folded.iter().any(|t| t.name == def.name) {
                return Err(GraphqlError::schema(format!("Type '{}' is defined more than once", def.name)));
            }
            folded.push(def.clone());
        }

        for ext in self.types.iter().filter(|t| t.extend) {
            let target = folded.iter_mut().find(|t| t.name == ext.name).ok_or_else(|| {
                GraphqlError::schema(format!("Cannot extend undefined type '{}'", ext.name))
            })?;
            if target.kind != ext.kind {
                return Err(GraphqlError::schema(format!("Extension of '{}' changes its kind", ext.name)));
            }
            for field in &ext.fields {
                if target.has_field(&field.name) {
                    return Err(GraphqlError::schema(format!(
                        "Field '{}.{}' is defined more than once",
                        ext.name, field.name
                    )));
                }
                target.fields.push(field.clone());
            }
        }
        Ok(folded)
    }
}

impl FromIterator<TypeDef> for TypeDefs {
    fn from_iter<I: IntoIterator<Item = TypeDef>>(iter: I) -> Self {
        Self { directives: Vec::new(), types: iter.into_iter().collect() }
    }
}

impl fmt::Display for TypeDefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for directive in &self.directives {
            writeln!(f, "directive @{directive} on FIELD_DEFINITION | OBJECT")?;
            first = false;
        }
        for def in &self.types {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "{def}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self.kind {
            TypeKind::Object => "type",
            TypeKind::Input => "input",
        };
        if self.extend {
            write!(f, "extend ")?;
        }
        writeln!(f, "{keyword} {} {{", self.name)?;
        for field in &self.fields {
            write!(f, "  {}", field.name)?;
            if !field.args.is_empty() {
                let args: Vec<_> = field.args.iter().map(|a| format!("{}: {}", a.name, a.ty)).collect();
                write!(f, "({})", args.join(", "))?;
            }
            write!(f, ": {}", field.ty)?;
            for directive in &field.directives {
                write!(f, " @{directive}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "}}")
    }
}

/// Parses an SDL type reference such as `[User!]!`.
pub fn parse_type_ref(ty: &str) -> Result<TypeRef, GraphqlError> {
    let invalid = || GraphqlError::TypeRef { message: ty.to_owned().into(), context: None };
    let trimmed = ty.trim();

    if let Some(inner) = trimmed.strip_suffix('!') {
        let inner = parse_type_ref(inner).map_err(|_| invalid())?;
        if matches!(inner, TypeRef::NonNull(_)) {
            return Err(invalid());
        }
        return Ok(TypeRef::NonNull(Box::new(inner)));
    }
    if let Some(inner) = trimmed.strip_prefix('[') {
        let inner = inner.strip_suffix(']').ok_or_else(invalid)?;
        return Ok(TypeRef::List(Box::new(parse_type_ref(inner).map_err(|_| invalid())?)));
    }

    let valid_name = trimmed.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_name {
        return Err(invalid());
    }
    Ok(TypeRef::named(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_type_refs() {
        assert_eq!(parse_type_ref("String").unwrap(), TypeRef::named("String"));
        assert_eq!(parse_type_ref("ID!").unwrap(), TypeRef::named_nn("ID"));
        assert_eq!(parse_type_ref("[EmailRecord!]").unwrap(), TypeRef::named_nn_list("EmailRecord"));
        assert_eq!(parse_type_ref("[User!]!").unwrap(), TypeRef::named_nn_list_nn("User"));
    }

    #[test]
    fn rejects_malformed_type_refs() {
        for bad in ["", "!", "String!!", "[String", "9Lives", "Str ing"] {
            assert!(
                matches!(parse_type_ref(bad), Err(GraphqlError::TypeRef { .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn renders_sdl() {
        let defs = TypeDefs::new()
            .declare_directive("auth")
            .with(TypeDef::object("User").field(FieldDef::new("id", "ID!")))
            .with(
                TypeDef::extension("Mutation").field(
                    FieldDef::new("changePassword", "Boolean")
                        .arg("oldPassword", "String!")
                        .arg("newPassword", "String!")
                        .directive("auth"),
                ),
            );

        let sdl = defs.to_string();
        assert!(sdl.starts_with("directive @auth on FIELD_DEFINITION | OBJECT\n"));
        assert!(sdl.contains("type User {\n  id: ID!\n}\n"));
        assert!(sdl.contains(
            "extend type Mutation {\n  changePassword(oldPassword: String!, newPassword: String!): Boolean @auth\n}\n"
        ));
    }

    #[test]
    fn folds_extensions_into_base_types() {
        let defs = TypeDefs::new()
            .with(TypeDef::extension("Query").field(FieldDef::new("b", "Int")))
            .with(TypeDef::object("Query").field(FieldDef::new("a", "Int")));

        let folded = defs.fold().unwrap();
        assert_eq!(folded.len(), 1);
        let names: Vec<_> = folded[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn fold_rejects_conflicts() {
        let orphan = TypeDefs::new().with(TypeDef::extension("Query"));
        assert!(orphan.fold().is_err());

        let twice = TypeDefs::new().with(TypeDef::object("User")).with(TypeDef::object("User"));
        assert!(twice.fold().is_err());

        let clash = TypeDefs::new()
            .with(TypeDef::object("Query").field(FieldDef::new("a", "Int")))
            .with(TypeDef::extension("Query").field(FieldDef::new("a", "Int")));
        assert!(clash.fold().is_err());
    }
}
