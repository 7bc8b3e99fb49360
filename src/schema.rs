use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Location of named schemas inside the document
pub const COMPONENTS_SCHEMAS: &str = "#/components/schemas/";

/// OpenAPI Schema object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format hint for primitive types (e.g. "int64", "date-time", "binary")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,
    /// Required property names for object schemas
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Properties for object schemas, in declaration order
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaOrRef>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaOrRef>>,
    /// Value schema for free-form maps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<SchemaOrRef>>,
}

impl Schema {
    /// A schema with only a type and an optional format
    pub fn typed(schema_type: &str, format: Option<&str>) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: format.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn array(items: SchemaOrRef) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed("array", None)
        }
    }

    pub fn map(values: SchemaOrRef) -> Self {
        Self {
            additional_properties: Some(Box::new(values)),
            ..Self::typed("object", None)
        }
    }
}

/// Reference to a named schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub reference: String,
}

/// Either an inline schema or a reference to a named one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    Ref(Reference),
    Schema(Box<Schema>),
}

impl SchemaOrRef {
    /// A reference to the schema registered under `name`
    pub fn reference(name: &str) -> Self {
        Self::Ref(Reference {
            reference: format!("{}{}", COMPONENTS_SCHEMAS, name),
        })
    }

    pub fn inline(schema: Schema) -> Self {
        Self::Schema(Box::new(schema))
    }

    /// The inline schema, if this is not a reference
    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            Self::Schema(schema) => Some(schema),
            Self::Ref(_) => None,
        }
    }

    pub fn as_schema_mut(&mut self) -> Option<&mut Schema> {
        match self {
            Self::Schema(schema) => Some(schema),
            Self::Ref(_) => None,
        }
    }

    /// Name of the referenced schema, if this is a reference
    pub fn ref_name(&self) -> Option<&str> {
        match self {
            Self::Ref(r) => r.reference.strip_prefix(COMPONENTS_SCHEMAS),
            Self::Schema(_) => None,
        }
    }
}
