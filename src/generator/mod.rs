//! Schema resolution and operation assembly.
//!
//! A [`Generator`] owns everything one document assembly needs: the annotation
//! vocabulary, the [`TypeIndex`] the types are looked up in, the schema name
//! registry, the non-fatal error log and the [`OpenApi`] document itself.
//!
//! # Example
//!
//! ```
//! use openapi_from_types::generator::{Generator, OperationInfo};
//! use openapi_from_types::parser::AstParser;
//! use openapi_from_types::type_index::TypeIndex;
//!
//! let parsed = AstParser::parse_source(&[], r#"
//!     pub struct GetUser {
//!         #[path = "id"]
//!         pub id: u64,
//!     }
//!     pub struct User {
//!         pub id: u64,
//!         pub name: String,
//!     }
//! "#).unwrap();
//!
//! let mut generator = Generator::new(Some(Default::default()), TypeIndex::new(&[parsed])).unwrap();
//! let info = OperationInfo { id: "GetUser".to_string(), ..Default::default() };
//! generator
//!     .add_operation("/users/:id", "GET", "users", Some("GetUser"), Some("User"), &info)
//!     .unwrap();
//!
//! assert!(generator.api().paths.contains_key("/users/{id}"));
//! assert!(generator.errors().is_empty());
//! ```

mod naming;
mod operation;
mod resolver;

pub use naming::default_type_name;
pub use operation::{OperationInfo, OperationResponse, ResponseHeader};

use crate::config::GeneratorConfig;
use crate::document::{Info, OpenApi, Tag};
use crate::error::{GeneratorError, Result, SchemaError};
use crate::schema::SchemaOrRef;
use crate::type_index::{TypeIndex, TypeKey};
use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Builds an OpenAPI document from indexed types.
///
/// Calls are expected to happen sequentially from one thread; independent documents
/// need independent generators.
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    index: TypeIndex,
    full_names: bool,
    /// Explicit name overrides
    overrides: HashMap<TypeKey, String>,
    /// Names claimed by an override or a registered schema, and the type owning them
    owners: HashMap<String, TypeKey>,
    /// Types registered under `components/schemas`, with their schema name
    registered: HashMap<TypeKey, String>,
    /// Types whose schema is being built
    resolving: HashSet<TypeKey>,
    /// Aliases and newtypes followed since the last named schema
    aliases: HashSet<TypeKey>,
    errors: Vec<SchemaError>,
    operation_ids: HashSet<String>,
    api: OpenApi,
}

/// Schema registry state, restored when an operation fails half-way
struct Checkpoint {
    schemas: BTreeMap<String, SchemaOrRef>,
    owners: HashMap<String, TypeKey>,
    registered: HashMap<TypeKey, String>,
    errors: usize,
}

impl Generator {
    /// Creates a generator over the types of `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::MissingConfig`] if `config` is `None`.
    pub fn new(config: Option<GeneratorConfig>, index: TypeIndex) -> Result<Self> {
        let config = config.ok_or(GeneratorError::MissingConfig)?;
        debug!("Creating generator over {} indexed types", index.len());

        Ok(Self {
            config,
            index,
            full_names: true,
            overrides: HashMap::new(),
            owners: HashMap::new(),
            registered: HashMap::new(),
            resolving: HashSet::new(),
            aliases: HashSet::new(),
            errors: Vec::new(),
            operation_ids: HashSet::new(),
            api: OpenApi::default(),
        })
    }

    /// Switches default type names between module-qualified (`true`, the default)
    /// and bare identifiers. Overrides and self-chosen names are unaffected.
    pub fn use_full_schema_names(&mut self, full: bool) {
        self.full_names = full;
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn index(&self) -> &TypeIndex {
        &self.index
    }

    /// The document assembled so far
    pub fn api(&self) -> &OpenApi {
        &self.api
    }

    pub fn into_api(self) -> OpenApi {
        self.api
    }

    /// Non-fatal errors, in the order they occurred
    pub fn errors(&self) -> &[SchemaError] {
        &self.errors
    }

    /// Replaces the document's Info object.
    pub fn set_info(&mut self, info: Info) {
        self.api.info = info;
    }

    /// Adds a tag, or updates the description of an existing one. Empty names are
    /// ignored.
    pub fn add_tag(&mut self, name: &str, description: &str) {
        if name.is_empty() {
            return;
        }
        self.api
            .tags
            .entry(name.to_string())
            .and_modify(|tag| tag.description = description.to_string())
            .or_insert_with(|| Tag {
                name: name.to_string(),
                description: description.to_string(),
            });
    }

    fn push_error(&mut self, error: SchemaError) {
        debug!("Schema error: {}", error);
        self.errors.push(error);
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            schemas: self.api.components.schemas.clone(),
            owners: self.owners.clone(),
            registered: self.registered.clone(),
            errors: self.errors.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.api.components.schemas = checkpoint.schemas;
        self.owners = checkpoint.owners;
        self.registered = checkpoint.registered;
        self.errors.truncate(checkpoint.errors);
        self.resolving.clear();
        self.aliases.clear();
    }
}

/// Parses a type expression such as `Option<models::User>`.
pub(crate) fn parse_type(expr: &str) -> Result<syn::Type> {
    syn::parse_str(expr).map_err(|e| GeneratorError::InvalidTypeExpr {
        expr: expr.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::parser::AstParser;
    use pretty_assertions::assert_eq;

    /// Generator over in-memory modules given as (`a::b`, code), with short names
    pub(crate) fn generator(modules: &[(&str, &str)]) -> Generator {
        let parsed: Vec<_> = modules
            .iter()
            .map(|(module, code)| {
                let module: Vec<&str> = module.split("::").filter(|s| !s.is_empty()).collect();
                AstParser::parse_source(&module, code).unwrap()
            })
            .collect();
        let mut generator = Generator::new(Some(GeneratorConfig::default()), TypeIndex::new(&parsed)).unwrap();
        generator.use_full_schema_names(false);
        generator
    }

    #[test]
    fn test_new_without_config() {
        let err = Generator::new(None, TypeIndex::default()).unwrap_err();
        assert_eq!(err, GeneratorError::MissingConfig);
    }

    #[test]
    fn test_add_tag() {
        let mut g = generator(&[]);

        g.add_tag("", "Test routes");
        assert_eq!(g.api().tags.len(), 0);

        g.add_tag("Test", "Test routes");
        assert_eq!(g.api().tags.len(), 1);
        assert_eq!(g.api().tags["Test"].description, "Test routes");

        g.add_tag("Test", "Routes test");
        assert_eq!(g.api().tags.len(), 1);
        assert_eq!(g.api().tags["Test"].description, "Routes test");

        g.add_tag("A", "");
        let names: Vec<&str> = g.api().tags.values().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "Test"]);
    }

    #[test]
    fn test_set_info() {
        let mut g = generator(&[]);
        let info = Info {
            description: Some("Test".to_string()),
            ..Info::default()
        };

        g.set_info(info.clone());
        assert_eq!(g.api().info, info);
    }

    #[test]
    fn test_parse_type_error() {
        let err = parse_type("Vec<").unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidTypeExpr { .. }));
    }
}
