use super::{parse_type, Generator};
use crate::error::{GeneratorError, Result, SchemaError};
use crate::schema::{Schema, SchemaOrRef, COMPONENTS_SCHEMAS};
use crate::tags::{extract_annotations, field_name_from_tag};
use crate::type_index::{
    type_to_string, FieldDef, Primitive, StructDef, TypeDef, TypeDefKind, TypeKey, TypeShape,
};
use log::debug;
use serde_json::Value;
use std::collections::HashSet;
use std::rc::Rc;

/// Bound on alias and newtype chains followed when peeling a type
const MAX_INDIRECTIONS: usize = 32;

/// A struct field reached while walking a struct, flattened fields included
#[derive(Debug, Clone)]
pub(crate) struct CollectedField {
    pub field: FieldDef,
    /// The struct that declares the field
    pub owner: Rc<TypeDef>,
}

#[derive(Debug, Default)]
pub(crate) struct CollectedFields {
    pub fields: Vec<CollectedField>,
    /// Value schema of the first flattened map
    pub additional: Option<SchemaOrRef>,
}

enum Flattened {
    Struct(Rc<TypeDef>),
    Map { value: syn::Type, from: Vec<String> },
    /// Already reported
    Invalid,
    Other,
}

impl Generator {
    /// Builds the schema of a type, or a reference to its registered schema.
    ///
    /// Failures are appended to [`errors`](Generator::errors) and yield `None`.
    pub fn new_schema_from_type(&mut self, ty: Option<&syn::Type>) -> Option<SchemaOrRef> {
        match ty {
            Some(ty) => self.resolve(ty, &[]),
            None => {
                self.push_error(SchemaError::MissingType);
                None
            }
        }
    }

    /// Same as [`new_schema_from_type`](Generator::new_schema_from_type) for a type
    /// expression such as `Vec<models::User>`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidTypeExpr`] if `expr` does not parse.
    pub fn schema_for(&mut self, expr: &str) -> Result<Option<SchemaOrRef>> {
        let ty = parse_type(expr)?;
        Ok(self.new_schema_from_type(Some(&ty)))
    }

    /// Builds the schema of a struct type.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::NotAStruct`] if `ty` is not a struct with named fields.
    pub fn new_schema_from_struct(&mut self, ty: &syn::Type) -> Result<SchemaOrRef> {
        let def = self.struct_def(ty)?;
        self.resolve_named(&def, Self::build_object)
            .ok_or_else(|| GeneratorError::NotAStruct(type_to_string(ty)))
    }

    /// Builds the property schema of one struct field, applying its annotations.
    ///
    /// `parent` is the struct declaring the field. Default and enum values are
    /// converted to the field's type; values that do not convert are reported and
    /// left out.
    pub fn new_schema_from_struct_field(
        &mut self,
        field: &FieldDef,
        required: bool,
        name: &str,
        parent: &TypeDef,
    ) -> Option<SchemaOrRef> {
        let from = &parent.key.module_path;
        let annotations = extract_annotations(&field.attrs, &self.config);
        let mut sor = self.resolve(&field.ty, from)?;

        if required && annotations.default.is_some() {
            self.push_error(SchemaError::RequiredWithDefault {
                parent: parent.key.to_string(),
                field: name.to_string(),
            });
        }

        let ty = type_to_string(&field.ty);
        let mut errors = Vec::new();
        let default = annotations.default.and_then(|raw| {
            let value = self.annotation_value(&field.ty, from, &raw);
            if value.is_none() {
                errors.push(SchemaError::InvalidDefault {
                    parent: parent.key.to_string(),
                    field: name.to_string(),
                    value: raw,
                    ty: ty.clone(),
                });
            }
            value
        });
        let mut enum_values = Vec::new();
        for token in annotations.enum_values {
            match self.annotation_value(&field.ty, from, &token) {
                Some(value) => enum_values.push(value),
                None => errors.push(SchemaError::InvalidEnumValue {
                    parent: parent.key.to_string(),
                    field: name.to_string(),
                    value: token,
                    ty: ty.clone(),
                }),
            }
        }
        for error in errors {
            self.push_error(error);
        }

        let Some(schema) = sor.as_schema_mut() else {
            debug!("Field `{}` of `{}` is a reference, annotations not applied", name, parent.key);
            return Some(sor);
        };

        if annotations.description.is_some() {
            schema.description = annotations.description;
        }
        if annotations.deprecated {
            schema.deprecated = true;
        }
        if annotations.format.is_some() {
            schema.format = annotations.format;
        }
        if default.is_some() {
            schema.default = default;
        }
        schema.enum_values.extend(enum_values);

        Some(sor)
    }

    /// Follows a reference into `components/schemas`; inline schemas are returned as is.
    pub fn resolve_schema<'a>(&'a self, sor: &'a SchemaOrRef) -> Option<&'a Schema> {
        match sor {
            SchemaOrRef::Schema(schema) => Some(schema),
            SchemaOrRef::Ref(reference) => {
                let name = reference.reference.strip_prefix(COMPONENTS_SCHEMAS)?;
                self.api.components.schemas.get(name)?.as_schema()
            }
        }
    }

    pub(crate) fn resolve(&mut self, ty: &syn::Type, from: &[String]) -> Option<SchemaOrRef> {
        match self.index.classify(ty, from) {
            TypeShape::Primitive(primitive) => {
                let (schema_type, format) = primitive.type_and_format();
                Some(SchemaOrRef::inline(Schema::typed(schema_type, format)))
            }
            TypeShape::Nullable(inner) => {
                let mut sor = self.resolve(&inner, from)?;
                if let Some(schema) = sor.as_schema_mut() {
                    schema.nullable = true;
                }
                Some(sor)
            }
            TypeShape::Transparent(inner) => self.resolve(&inner, from),
            TypeShape::Sequence(elem) => {
                if matches!(self.index.classify(&elem, from), TypeShape::Primitive(Primitive::U8)) {
                    return Some(SchemaOrRef::inline(Schema::typed("string", Some("binary"))));
                }
                let items = self.resolve(&elem, from)?;
                Some(SchemaOrRef::inline(Schema::array(items)))
            }
            TypeShape::Map { key, value } => {
                if !self.is_string_like(&key, from, 0) {
                    self.push_error(SchemaError::UnsupportedMapKey {
                        ty: type_to_string(ty),
                        key: type_to_string(&key),
                    });
                    return None;
                }
                let values = self.resolve(&value, from)?;
                Some(SchemaOrRef::inline(Schema::map(values)))
            }
            TypeShape::Named(def) => self.resolve_def(&def),
            TypeShape::Unsupported(reason) => {
                self.push_error(SchemaError::UnsupportedType {
                    ty: type_to_string(ty),
                    reason: reason.to_string(),
                });
                None
            }
            TypeShape::Unknown => {
                self.push_error(SchemaError::UnknownType(type_to_string(ty)));
                None
            }
        }
    }

    fn resolve_def(&mut self, def: &Rc<TypeDef>) -> Option<SchemaOrRef> {
        match &def.kind {
            TypeDefKind::Struct(StructDef::Named(_)) => self.resolve_named(def, Self::build_object),
            TypeDefKind::Enum(e) if e.is_unit_only() => self.resolve_named(def, Self::build_string_enum),
            TypeDefKind::Struct(StructDef::Newtype(inner)) | TypeDefKind::Alias(inner) => {
                if !self.aliases.insert(def.key.clone()) {
                    self.push_error(SchemaError::UnsupportedType {
                        ty: def.key.to_string(),
                        reason: "recursive alias or newtype".to_string(),
                    });
                    return None;
                }
                let sor = self.resolve(inner, &def.key.module_path);
                self.aliases.remove(&def.key);
                sor
            }
            TypeDefKind::Struct(StructDef::Tuple) => self.unsupported_def(def, "tuple struct"),
            TypeDefKind::Struct(StructDef::Unit) => self.unsupported_def(def, "unit struct"),
            TypeDefKind::Enum(_) => self.unsupported_def(def, "enum with data-carrying variants"),
        }
    }

    fn unsupported_def(&mut self, def: &TypeDef, reason: &str) -> Option<SchemaOrRef> {
        self.push_error(SchemaError::UnsupportedType {
            ty: def.key.to_string(),
            reason: reason.to_string(),
        });
        None
    }

    /// Registers the schema of a named type once and references it afterwards.
    ///
    /// A placeholder is registered before `build` runs, so recursive references to the
    /// type resolve to the same `$ref`.
    fn resolve_named(
        &mut self,
        def: &Rc<TypeDef>,
        build: fn(&mut Self, &Rc<TypeDef>) -> Schema,
    ) -> Option<SchemaOrRef> {
        if let Some(name) = self.registered.get(&def.key) {
            return Some(SchemaOrRef::reference(name));
        }
        // Only types that could not be registered get here while being built.
        if self.resolving.contains(&def.key) {
            self.push_error(SchemaError::UnsupportedType {
                ty: def.key.to_string(),
                reason: "recursive type without a schema name".to_string(),
            });
            return None;
        }

        let name = self.name_of(def);
        if name.is_empty() {
            return Some(SchemaOrRef::inline(self.build_scoped(def, build)));
        }
        if let Some(owner) = self.owners.get(&name).filter(|owner| **owner != def.key) {
            let error = SchemaError::NameCollision {
                name,
                owner: owner.to_string(),
                ty: def.key.to_string(),
            };
            self.push_error(error);
            return Some(SchemaOrRef::inline(self.build_scoped(def, build)));
        }

        debug!("Registering schema `{}` for `{}`", name, def.key);
        self.registered.insert(def.key.clone(), name.clone());
        self.owners.insert(name.clone(), def.key.clone());
        self.api
            .components
            .schemas
            .insert(name.clone(), SchemaOrRef::inline(Schema::typed("object", None)));

        let schema = self.build_scoped(def, build);
        self.api
            .components
            .schemas
            .insert(name.clone(), SchemaOrRef::inline(schema));
        Some(SchemaOrRef::reference(&name))
    }

    /// Runs `build` with a fresh alias chain; a named type ends any chain leading to it.
    fn build_scoped(&mut self, def: &Rc<TypeDef>, build: fn(&mut Self, &Rc<TypeDef>) -> Schema) -> Schema {
        let aliases = std::mem::take(&mut self.aliases);
        let schema = build(self, def);
        self.aliases = aliases;
        schema
    }

    fn build_object(&mut self, def: &Rc<TypeDef>) -> Schema {
        debug!("Building object schema for `{}`", def.key);
        self.resolving.insert(def.key.clone());
        let collected = self.collect_fields(def);

        let mut seen = HashSet::new();
        let mut named = Vec::new();
        for cf in collected.fields {
            let name = self.field_name(&cf);
            if name.is_empty() {
                continue;
            }
            if !seen.insert(name.clone()) {
                debug!("Dropping duplicate property `{}` of `{}`", name, def.key);
                continue;
            }
            named.push((name, cf));
        }

        let schema = self.object_schema(named, collected.additional);
        self.resolving.remove(&def.key);
        schema
    }

    fn build_string_enum(&mut self, def: &Rc<TypeDef>) -> Schema {
        let TypeDefKind::Enum(e) = &def.kind else {
            return Schema::typed("string", None);
        };
        Schema {
            enum_values: e
                .variant_names(def.serde.rename_all)
                .into_iter()
                .map(Value::String)
                .collect(),
            ..Schema::typed("string", None)
        }
    }

    /// Object schema with one property per named field
    pub(crate) fn object_schema(
        &mut self,
        fields: Vec<(String, CollectedField)>,
        additional: Option<SchemaOrRef>,
    ) -> Schema {
        let mut schema = Schema::typed("object", None);
        for (name, cf) in fields {
            let required = extract_annotations(&cf.field.attrs, &self.config).required;
            let Some(property) = self.new_schema_from_struct_field(&cf.field, required, &name, &cf.owner)
            else {
                continue;
            };
            if required {
                schema.required.push(name.clone());
            }
            schema.properties.insert(name, property);
        }
        schema.additional_properties = additional.map(Box::new);
        schema
    }

    /// Visible field name, honoring the owner's `rename_all`
    pub(crate) fn field_name(&self, cf: &CollectedField) -> String {
        if cf.field.attrs.serde.skip {
            return String::new();
        }
        field_name_from_tag(&cf.field, &self.config.naming_tag, cf.owner.serde.rename_all)
    }

    /// Public fields of `def` in declaration order, with flattened structs expanded in
    /// place. A flattened struct that already encloses the field on the current
    /// flatten chain is skipped.
    pub(crate) fn collect_fields(&mut self, def: &Rc<TypeDef>) -> CollectedFields {
        let mut collected = CollectedFields::default();
        let mut chain = vec![def.key.clone()];
        self.collect_into(def, &mut collected, &mut chain);
        collected
    }

    fn collect_into(&mut self, def: &Rc<TypeDef>, out: &mut CollectedFields, chain: &mut Vec<TypeKey>) {
        let TypeDefKind::Struct(StructDef::Named(fields)) = &def.kind else {
            return;
        };

        for field in fields {
            if !field.exported {
                debug!("Skipping private field `{}` of `{}`", field.ident, def.key);
                continue;
            }
            if field.attrs.serde.skip {
                continue;
            }
            if !field.attrs.serde.flatten {
                out.fields.push(CollectedField {
                    field: field.clone(),
                    owner: Rc::clone(def),
                });
                continue;
            }

            match self.flatten_target(&field.ty, &def.key.module_path) {
                Flattened::Struct(inner) => {
                    if chain.contains(&inner.key) {
                        debug!("Skipping recursive flattened field `{}` of `{}`", field.ident, def.key);
                        continue;
                    }
                    chain.push(inner.key.clone());
                    self.collect_into(&inner, out, chain);
                    chain.pop();
                }
                Flattened::Map { value, from } => {
                    if out.additional.is_none() {
                        out.additional = self.resolve(&value, &from);
                    }
                }
                Flattened::Invalid => {}
                Flattened::Other => self.push_error(SchemaError::UnsupportedType {
                    ty: type_to_string(&field.ty),
                    reason: format!("flattened field `{}` must be a struct or a map", field.ident),
                }),
            }
        }
    }

    fn flatten_target(&mut self, ty: &syn::Type, from: &[String]) -> Flattened {
        match self.peel(ty, from) {
            (TypeShape::Named(def), _) if matches!(def.kind, TypeDefKind::Struct(StructDef::Named(_))) => {
                Flattened::Struct(def)
            }
            (TypeShape::Map { key, value }, from) => {
                if self.is_string_like(&key, &from, 0) {
                    Flattened::Map { value, from }
                } else {
                    self.push_error(SchemaError::UnsupportedMapKey {
                        ty: type_to_string(ty),
                        key: type_to_string(&key),
                    });
                    Flattened::Invalid
                }
            }
            _ => Flattened::Other,
        }
    }

    /// Strips `Option`, pointer wrappers and aliases off `ty`, returning its shape and
    /// the module it was found in.
    fn peel(&self, ty: &syn::Type, from: &[String]) -> (TypeShape, Vec<String>) {
        let mut ty = ty.clone();
        let mut from = from.to_vec();

        for _ in 0..MAX_INDIRECTIONS {
            match self.index.classify(&ty, &from) {
                TypeShape::Nullable(inner) | TypeShape::Transparent(inner) => ty = inner,
                TypeShape::Named(def) => {
                    let alias = match &def.kind {
                        TypeDefKind::Alias(target) => Some((target.clone(), def.key.module_path.clone())),
                        _ => None,
                    };
                    match alias {
                        Some((target, module)) => {
                            ty = target;
                            from = module;
                        }
                        None => return (TypeShape::Named(def), from),
                    }
                }
                shape => return (shape, from),
            }
        }

        (TypeShape::Unsupported("recursive alias or newtype"), from)
    }

    /// The named struct or enum `ty` refers to, through wrappers and aliases
    pub(crate) fn named_def(&self, ty: &syn::Type, from: &[String]) -> Option<Rc<TypeDef>> {
        match self.peel(ty, from) {
            (TypeShape::Named(def), _) => Some(def),
            _ => None,
        }
    }

    /// The struct with named fields `ty` refers to
    pub(crate) fn struct_def(&self, ty: &syn::Type) -> Result<Rc<TypeDef>> {
        self.named_def(ty, &[])
            .filter(|def| matches!(def.kind, TypeDefKind::Struct(StructDef::Named(_))))
            .ok_or_else(|| GeneratorError::NotAStruct(type_to_string(ty)))
    }

    fn is_string_like(&self, ty: &syn::Type, from: &[String], depth: usize) -> bool {
        self.scalar(ty, from, depth)
            .is_some_and(|p| matches!(p, Primitive::String | Primitive::Char | Primitive::Uuid))
    }

    /// The primitive a type serializes as, through wrappers, aliases, newtypes and
    /// unit enums
    fn scalar(&self, ty: &syn::Type, from: &[String], depth: usize) -> Option<Primitive> {
        if depth >= MAX_INDIRECTIONS {
            return None;
        }
        match self.peel(ty, from) {
            (TypeShape::Primitive(primitive), _) => Some(primitive),
            (TypeShape::Named(def), _) => match &def.kind {
                TypeDefKind::Enum(e) if e.is_unit_only() => Some(Primitive::String),
                TypeDefKind::Struct(StructDef::Newtype(inner)) => {
                    self.scalar(inner, &def.key.module_path, depth + 1)
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Variant names of the unit enum `ty` stands for
    fn unit_variants(&self, ty: &syn::Type, from: &[String], depth: usize) -> Option<Vec<String>> {
        if depth >= MAX_INDIRECTIONS {
            return None;
        }
        match self.peel(ty, from) {
            (TypeShape::Named(def), _) => match &def.kind {
                TypeDefKind::Enum(e) if e.is_unit_only() => Some(e.variant_names(def.serde.rename_all)),
                TypeDefKind::Struct(StructDef::Newtype(inner)) => {
                    self.unit_variants(inner, &def.key.module_path, depth + 1)
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Converts a raw default or enum annotation into a value of `ty`.
    ///
    /// Unit enums accept their serialized variant names, scalars are parsed from their
    /// text and anything else must be JSON.
    fn annotation_value(&self, ty: &syn::Type, from: &[String], raw: &str) -> Option<Value> {
        if let Some(variants) = self.unit_variants(ty, from, 0) {
            return variants
                .iter()
                .any(|variant| variant == raw)
                .then(|| Value::String(raw.to_string()));
        }
        match self.scalar(ty, from, 0) {
            Some(primitive) => primitive.parse_value(raw),
            None => serde_json::from_str(raw).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::tests::generator;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const MODELS: &str = r#"
        pub struct X {
            #[serde(flatten)]
            pub x: Option<Box<X>>,
            #[serde(flatten)]
            pub y: Option<Y>,
            #[validate(required)]
            pub a: String,
            pub b: Option<i32>,
            #[deprecated = "true"]
            pub c: bool,
            pub d: Vec<Option<Y>>,
            pub e: [Option<Box<X>>; 3],
            pub f: Option<Box<X>>,
            pub g: Option<Y>,
            pub h: std::collections::HashMap<i32, Option<Y>>,
        }

        impl X {
            pub fn type_name() -> &'static str {
                "XXX"
            }
        }

        pub struct Y {
            #[validate(required)]
            pub h: f32,
            #[format = "date"]
            pub i: chrono::DateTime<chrono::Utc>,
            #[deprecated = "oui"]
            pub j: Option<u8>,
            #[validate(required)]
            pub k: Option<Z>,
            pub n: N,
            l: i32,
            #[serde(skip)]
            pub m: i32,
        }

        pub struct N {
            pub na: String,
            pub nb: String,
            pub nc: std::time::Duration,
        }

        pub type Z = std::collections::HashMap<String, Option<Y>>;
    "#;

    fn ty(code: &str) -> syn::Type {
        syn::parse_str(code).unwrap()
    }

    #[test]
    fn test_schema_from_primitive_type() {
        let mut g = generator(&[]);
        let sor = g.new_schema_from_type(Some(&ty("Option<i64>"))).unwrap();

        let schema = sor.as_schema().expect("expected an inline schema");
        assert_eq!(schema.schema_type.as_deref(), Some("integer"));
        assert_eq!(schema.format.as_deref(), Some("int64"));
        assert!(schema.nullable);
        assert!(g.errors().is_empty());
    }

    #[test]
    fn test_schema_from_unsupported_type() {
        let mut g = generator(&[]);

        assert!(g.new_schema_from_type(None).is_none());
        assert_eq!(g.errors().len(), 1);

        assert!(g.new_schema_from_type(Some(&ty("fn()"))).is_none());
        assert_eq!(g.errors().len(), 2);
        assert!(!g.errors()[1].to_string().is_empty());

        for unsupported in ["*const u8", "Box<dyn Fn()>", "(i32, i32)", "()", "std::sync::mpsc::Sender<i32>"] {
            let before = g.errors().len();
            assert!(g.new_schema_from_type(Some(&ty(unsupported))).is_none(), "{}", unsupported);
            assert_eq!(g.errors().len(), before + 1, "{}", unsupported);
        }
    }

    #[test]
    fn test_schema_from_map_with_unsupported_keys() {
        let mut g = generator(&[]);

        assert!(g.new_schema_from_type(Some(&ty("HashMap<i32, String>"))).is_none());
        assert_eq!(g.errors().len(), 1);
        assert!(matches!(g.errors()[0], SchemaError::UnsupportedMapKey { .. }));
    }

    #[test]
    fn test_schema_from_bytes() {
        let mut g = generator(&[]);
        let sor = g.schema_for("Vec<u8>").unwrap().unwrap();
        assert_eq!(serde_json::to_value(&sor).unwrap(), json!({"type": "string", "format": "binary"}));
    }

    #[test]
    fn test_schema_from_complex() {
        let mut g = generator(&[("", MODELS)]);

        let sor = g.new_schema_from_type(Some(&ty("Option<X>"))).unwrap();
        assert_eq!(
            serde_json::to_string(&sor).unwrap(),
            r##"{"$ref":"#/components/schemas/XXX"}"##
        );

        let x = serde_json::to_value(g.resolve_schema(&sor).unwrap()).unwrap();
        assert_eq!(
            x,
            json!({
                "type": "object",
                "required": ["h", "k", "a"],
                "properties": {
                    "h": {"type": "number", "format": "float"},
                    "i": {"type": "string", "format": "date"},
                    "j": {"type": "integer", "format": "int32", "nullable": true},
                    "k": {
                        "type": "object",
                        "nullable": true,
                        "additionalProperties": {"$ref": "#/components/schemas/Y"}
                    },
                    "n": {"$ref": "#/components/schemas/N"},
                    "a": {"type": "string"},
                    "b": {"type": "integer", "format": "int32", "nullable": true},
                    "c": {"type": "boolean", "deprecated": true},
                    "d": {"type": "array", "items": {"$ref": "#/components/schemas/Y"}},
                    "e": {"type": "array", "items": {"$ref": "#/components/schemas/XXX"}},
                    "f": {"$ref": "#/components/schemas/XXX"},
                    "g": {"$ref": "#/components/schemas/Y"}
                }
            })
        );

        let y = g.api().components.schemas["Y"].clone();
        assert_eq!(
            serde_json::to_value(g.resolve_schema(&y).unwrap()).unwrap(),
            json!({
                "type": "object",
                "required": ["h", "k"],
                "properties": {
                    "h": {"type": "number", "format": "float"},
                    "i": {"type": "string", "format": "date"},
                    "j": {"type": "integer", "format": "int32", "nullable": true},
                    "k": {
                        "type": "object",
                        "nullable": true,
                        "additionalProperties": {"$ref": "#/components/schemas/Y"}
                    },
                    "n": {"$ref": "#/components/schemas/N"}
                }
            })
        );

        let mut names: Vec<&String> = g.api().components.schemas.keys().collect();
        names.sort();
        assert_eq!(names, vec!["N", "XXX", "Y"]);

        // The flattened `Y.h` comes first and wins; X's own `h` map is dropped
        // before its integer keys are ever looked at, like the flattened self-reference.
        assert!(g.errors().is_empty(), "{:?}", g.errors());
    }

    #[test]
    fn test_struct_resolution_is_cached() {
        let mut g = generator(&[("", MODELS)]);

        let first = g.schema_for("Y").unwrap().unwrap();
        let second = g.schema_for("Box<Y>").unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.ref_name(), Some("Y"));
        assert_eq!(g.api().components.schemas.len(), 2);
    }

    #[test]
    fn test_new_schema_from_struct_errors() {
        let mut g = generator(&[("", MODELS)]);

        let err = g.new_schema_from_struct(&ty("Option<String>")).unwrap_err();
        assert_eq!(err, GeneratorError::NotAStruct("Option<String>".to_string()));

        let sor = g.new_schema_from_struct(&ty("N")).unwrap();
        assert_eq!(sor.ref_name(), Some("N"));
    }

    #[test]
    fn test_new_schema_from_struct_field_errors() {
        let mut g = generator(&[(
            "",
            r#"
            pub struct T {
                #[validate(required)]
                #[default = "foobar"]
                pub a: String,
                #[default = "foobaz"]
                pub b: i32,
                #[api(enum = "a,1,c")]
                pub c: i32,
            }
            "#,
        )]);
        let def = g.index().lookup(&syn::parse_str("T").unwrap(), &[]).unwrap();
        let TypeDefKind::Struct(StructDef::Named(fields)) = &def.kind else {
            panic!("expected a struct");
        };

        // Required with a default value: the default is kept
        let sor = g.new_schema_from_struct_field(&fields[0], true, "a", &def).unwrap();
        assert_eq!(sor.as_schema().unwrap().default, Some(json!("foobar")));
        assert_eq!(g.errors().len(), 1);
        assert!(matches!(g.errors()[0], SchemaError::RequiredWithDefault { .. }));

        // Default that does not convert: the default is dropped
        let sor = g.new_schema_from_struct_field(&fields[1], false, "b", &def).unwrap();
        assert_eq!(sor.as_schema().unwrap().default, None);
        assert_eq!(g.errors().len(), 2);
        assert!(matches!(g.errors()[1], SchemaError::InvalidDefault { .. }));

        // One error per enum token that does not convert
        let sor = g.new_schema_from_struct_field(&fields[2], true, "c", &def).unwrap();
        assert_eq!(sor.as_schema().unwrap().enum_values, vec![json!(1)]);
        assert_eq!(g.errors().len(), 4);
        assert!(matches!(g.errors()[2], SchemaError::InvalidEnumValue { ref value, .. } if value == "a"));
        assert!(matches!(g.errors()[3], SchemaError::InvalidEnumValue { ref value, .. } if value == "c"));
    }

    #[test]
    fn test_unit_enum_schema() {
        let mut g = generator(&[(
            "",
            r#"
            #[serde(rename_all = "snake_case")]
            pub enum Status {
                Active,
                InProgress,
                #[serde(rename = "gone")]
                Deleted,
                #[serde(skip)]
                Internal,
            }
            pub enum Shape {
                Circle(f64),
            }
            "#,
        )]);

        let sor = g.schema_for("Status").unwrap().unwrap();
        assert_eq!(sor.ref_name(), Some("Status"));
        assert_eq!(
            serde_json::to_value(g.resolve_schema(&sor).unwrap()).unwrap(),
            json!({"type": "string", "enum": ["active", "in_progress", "gone"]})
        );

        assert!(g.schema_for("Shape").unwrap().is_none());
        assert_eq!(g.errors().len(), 1);
    }

    #[test]
    fn test_newtypes_and_aliases_are_transparent() {
        let mut g = generator(&[(
            "",
            r#"
            pub struct UserId(pub u64);
            pub type Ids = Vec<UserId>;
            pub struct Tags(pub Vec<String>);
            pub type Loop = Box<Loop>;
            "#,
        )]);

        let sor = g.schema_for("Ids").unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&sor).unwrap(),
            json!({"type": "array", "items": {"type": "integer", "format": "int64"}})
        );
        let sor = g.schema_for("Option<Tags>").unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&sor).unwrap(),
            json!({"type": "array", "items": {"type": "string"}, "nullable": true})
        );
        assert!(g.api().components.schemas.is_empty());

        assert!(g.schema_for("Loop").unwrap().is_none());
        assert_eq!(g.errors().len(), 1);
    }

    #[test]
    fn test_rename_all_and_flattened_map() {
        let mut g = generator(&[(
            "",
            r#"
            #[serde(rename_all = "camelCase")]
            pub struct Event {
                pub created_at: String,
                #[serde(rename = "kind")]
                pub event_type: String,
                #[serde(flatten)]
                pub extra: std::collections::BTreeMap<String, i64>,
            }
            "#,
        )]);

        let sor = g.schema_for("Event").unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(g.resolve_schema(&sor).unwrap()).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "createdAt": {"type": "string"},
                    "kind": {"type": "string"}
                },
                "additionalProperties": {"type": "integer", "format": "int64"}
            })
        );
    }

    #[test]
    fn test_indirect_flatten_cycle() {
        let mut g = generator(&[(
            "",
            r#"
            pub struct A {
                pub a: i32,
                #[serde(flatten)]
                pub b: B,
            }
            pub struct B {
                pub b: i32,
                #[serde(flatten)]
                pub a: Box<A>,
            }
            "#,
        )]);

        let sor = g.schema_for("A").unwrap().unwrap();
        let a = g.resolve_schema(&sor).unwrap();
        let keys: Vec<&String> = a.properties.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(g.errors().is_empty());
    }

    const TREE: &str = r#"
        pub struct Node {
            pub children: Vec<Child>,
        }
        pub struct Child {
            #[serde(flatten)]
            pub node: Node,
            pub weight: i32,
        }
    "#;

    fn child_properties(g: &Generator) -> Vec<String> {
        let child = g.api().components.schemas["Child"].as_schema().unwrap();
        child.properties.keys().cloned().collect()
    }

    #[test]
    fn test_flatten_behind_reference_does_not_depend_on_order() {
        let mut child_first = generator(&[("", TREE)]);
        child_first.schema_for("Child").unwrap().unwrap();
        child_first.schema_for("Node").unwrap().unwrap();

        let mut node_first = generator(&[("", TREE)]);
        node_first.schema_for("Node").unwrap().unwrap();

        assert_eq!(child_properties(&child_first), vec!["children", "weight"]);
        assert_eq!(child_properties(&node_first), child_properties(&child_first));
        assert_eq!(
            serde_json::to_value(&node_first.api().components.schemas["Child"]).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "children": {"type": "array", "items": {"$ref": "#/components/schemas/Child"}},
                    "weight": {"type": "integer", "format": "int32"}
                }
            })
        );
        assert!(node_first.errors().is_empty());
    }

    #[test]
    fn test_annotations_on_referenced_fields_are_checked() {
        let mut g = generator(&[(
            "",
            r#"
            #[serde(rename_all = "snake_case")]
            pub enum Status { Active, Gone }
            pub struct Job {
                #[default = "bogus"]
                #[api(enum = "nope,zilch")]
                pub s: Status,
                #[default = "active"]
                #[api(enum = "active,gone")]
                pub t: Status,
            }
            "#,
        )]);

        let sor = g.schema_for("Job").unwrap().unwrap();
        let job = g.resolve_schema(&sor).unwrap();
        assert_eq!(job.properties["s"].ref_name(), Some("Status"));
        assert_eq!(job.properties["t"].ref_name(), Some("Status"));

        let errors = g.errors();
        assert_eq!(errors.len(), 3, "{:?}", errors);
        assert!(matches!(errors[0], SchemaError::InvalidDefault { ref value, .. } if value == "bogus"));
        assert!(matches!(errors[1], SchemaError::InvalidEnumValue { ref value, .. } if value == "nope"));
        assert!(matches!(errors[2], SchemaError::InvalidEnumValue { ref value, .. } if value == "zilch"));
    }

    #[test]
    fn test_name_collision_inlines_schema() {
        let mut g = generator(&[
            ("a", "pub struct Item { pub x: i32 }"),
            ("b", "pub struct Item { pub y: i32 }"),
        ]);

        let first = g.schema_for("a::Item").unwrap().unwrap();
        let second = g.schema_for("b::Item").unwrap().unwrap();
        assert_eq!(first.ref_name(), Some("Item"));
        assert!(second.as_schema().unwrap().properties.contains_key("y"));
        assert_eq!(g.errors().len(), 1);
        assert!(matches!(g.errors()[0], SchemaError::NameCollision { .. }));

        g.use_full_schema_names(true);
        let third = g.schema_for("b::Item").unwrap().unwrap();
        assert_eq!(third.ref_name(), Some("BItem"));
    }

    #[test]
    fn test_unknown_type() {
        let mut g = generator(&[]);
        assert!(g.schema_for("Missing").unwrap().is_none());
        assert_eq!(g.errors(), &[SchemaError::UnknownType("Missing".to_string())]);
    }
}
