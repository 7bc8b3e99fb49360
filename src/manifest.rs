//! Operations manifest.
//!
//! The manifest lists the operations a service exposes along with document-level
//! settings. It plays the part of the routing layer: each entry names the path,
//! method and the request/response types, which the [`Generator`] then expands.
//!
//! ```yaml
//! info:
//!   title: Users API
//!   version: 1.2.0
//! short_names: true
//! overrides:
//!   models::User: Account
//! generator:
//!   query_location_tag: param
//! tags:
//!   - name: users
//!     description: User management
//! operations:
//!   - path: /users/:id
//!     method: GET
//!     tag: users
//!     input: handlers::GetUser
//!     output: models::User
//!     id: GetUser
//!     responses:
//!       - code: "404"
//!         description: Not Found
//! ```

use crate::config::GeneratorConfig;
use crate::document::{Info, Tag};
use crate::generator::{Generator, OperationInfo};
use crate::type_index::TypeIndex;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Document settings and operations to generate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub info: Option<Info>,
    /// Use bare type identifiers as default schema names
    pub short_names: bool,
    /// Schema names keyed by type expression
    pub overrides: BTreeMap<String, String>,
    /// Annotation vocabulary
    pub generator: GeneratorConfig,
    pub tags: Vec<Tag>,
    pub operations: Vec<OperationEntry>,
}

/// One operation of the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationEntry {
    /// Route template, such as `/users/:id`
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub tag: String,
    /// Type expression of the request struct
    #[serde(default)]
    pub input: Option<String>,
    /// Type expression of the success response body
    #[serde(default)]
    pub output: Option<String>,
    #[serde(flatten)]
    pub info: OperationInfo,
}

impl Manifest {
    /// Loads a manifest from a `.json`, `.yaml` or `.yml` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Loading manifest: {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON manifest: {}", path.display()))
        } else {
            Self::from_yaml_str(&content)
                .with_context(|| format!("Failed to parse YAML manifest: {}", path.display()))
        }
    }

    /// Parses a YAML manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or does not match the manifest shape.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Creates a generator over `index` and applies the manifest to it.
    ///
    /// # Errors
    ///
    /// Returns the first override or operation that fails.
    pub fn build(&self, index: TypeIndex) -> Result<Generator> {
        let mut generator = Generator::new(Some(self.generator.clone()), index)?;
        self.apply(&mut generator)?;
        Ok(generator)
    }

    /// Applies info, naming, tags and operations to `generator`, in that order.
    ///
    /// # Errors
    ///
    /// Returns the first override or operation that fails.
    pub fn apply(&self, generator: &mut Generator) -> Result<()> {
        if let Some(info) = &self.info {
            generator.set_info(info.clone());
        }
        generator.use_full_schema_names(!self.short_names);

        for (ty, name) in &self.overrides {
            generator
                .override_type_name(ty, name)
                .with_context(|| format!("Failed to name type `{}` `{}`", ty, name))?;
        }

        for tag in &self.tags {
            generator.add_tag(&tag.name, &tag.description);
        }

        info!("Adding {} operations", self.operations.len());
        for entry in &self.operations {
            generator
                .add_operation(
                    &entry.path,
                    &entry.method,
                    &entry.tag,
                    entry.input.as_deref(),
                    entry.output.as_deref(),
                    &entry.info,
                )
                .with_context(|| {
                    format!(
                        "Failed to add operation `{}` ({} {})",
                        entry.info.id, entry.method, entry.path
                    )
                })?;
        }

        Ok(())
    }
}
