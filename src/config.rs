use serde::{Deserialize, Serialize};

/// Annotation vocabulary of the request-binding layer.
///
/// Every name refers to a raw field annotation (see [`crate::tags`]). The defaults
/// match attributes written as `#[validate(required)]` and
/// `#[api(query = "page", default = "1", enum = "1,2,3")]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Annotation holding validation rules
    pub validator_tag: String,
    /// Token inside the validation rules that marks a field as required
    pub required_token: String,
    pub path_location_tag: String,
    pub query_location_tag: String,
    pub header_location_tag: String,
    pub enum_tag: String,
    pub default_tag: String,
    pub deprecated_tag: String,
    pub description_tag: String,
    pub format_tag: String,
    /// Annotation that renames or excludes fields; `serde` reads serde's own attributes
    pub naming_tag: String,
    /// Name of an impl method returning a string literal that a type uses to name
    /// itself. `None` disables self-naming.
    pub type_namer_method: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            validator_tag: "validate".to_string(),
            required_token: "required".to_string(),
            path_location_tag: "path".to_string(),
            query_location_tag: "query".to_string(),
            header_location_tag: "header".to_string(),
            enum_tag: "enum".to_string(),
            default_tag: "default".to_string(),
            deprecated_tag: "deprecated".to_string(),
            description_tag: "description".to_string(),
            format_tag: "format".to_string(),
            naming_tag: "serde".to_string(),
            type_namer_method: Some("type_name".to_string()),
        }
    }
}
