//! Field annotation extraction.
//!
//! Field attributes are read once, when the [`TypeIndex`](crate::type_index::TypeIndex)
//! is built, into a [`FieldAttributes`] value: serde's naming attributes, the doc
//! comment, and a flat set of raw annotations. Raw annotations follow a simple shape:
//!
//! - `#[key = "value"]` and `#[ns(key = "value")]` both record `key: value`
//! - bare entries in a list, like `#[validate(required, email)]`, record
//!   `validate: "required,email"` and `required: "true"`, `email: "true"`
//! - a bare `#[key]` records `key: "true"`
//!
//! The [`GeneratorConfig`] then decides which raw annotation means what, and
//! [`extract_annotations`] turns them into a [`FieldAnnotations`] value.

use crate::config::GeneratorConfig;
use crate::document::ParameterLocation;
use crate::error::{GeneratorError, Result};
use crate::type_index::FieldDef;
use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use log::warn;
use quote::ToTokens;
use syn::meta::ParseNestedMeta;

/// Serde attributes that change how a field or variant is named or laid out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerdeAttributes {
    /// Renamed field or variant name
    pub rename: Option<String>,
    /// Whether the field is skipped entirely
    pub skip: bool,
    /// Whether the field's members are inlined into the parent
    pub flatten: bool,
    /// Container-level renaming rule
    pub rename_all: Option<RenameRule>,
}

/// Container-level `rename_all` rules understood by serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    pub fn parse(rule: &str) -> Option<Self> {
        match rule {
            "lowercase" => Some(Self::Lower),
            "UPPERCASE" => Some(Self::Upper),
            "PascalCase" => Some(Self::Pascal),
            "camelCase" => Some(Self::Camel),
            "snake_case" => Some(Self::Snake),
            "SCREAMING_SNAKE_CASE" => Some(Self::ScreamingSnake),
            "kebab-case" => Some(Self::Kebab),
            "SCREAMING-KEBAB-CASE" => Some(Self::ScreamingKebab),
            _ => None,
        }
    }

    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Lower => name.to_ascii_lowercase(),
            Self::Upper => name.to_ascii_uppercase(),
            Self::Pascal => name.to_upper_camel_case(),
            Self::Camel => name.to_lower_camel_case(),
            Self::Snake => name.to_snake_case(),
            Self::ScreamingSnake => name.to_shouty_snake_case(),
            Self::Kebab => name.to_kebab_case(),
            Self::ScreamingKebab => name.to_shouty_kebab_case(),
        }
    }
}

impl SerdeAttributes {
    /// Collects the serde attributes among `attrs`.
    pub fn from_attrs(attrs: &[syn::Attribute]) -> Self {
        let mut serde_attrs = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    if meta.input.peek(syn::Token![=]) {
                        serde_attrs.rename = Some(meta.value()?.parse::<syn::LitStr>()?.value());
                    } else {
                        meta.parse_nested_meta(|inner| {
                            if inner.path.is_ident("serialize") {
                                serde_attrs.rename =
                                    Some(inner.value()?.parse::<syn::LitStr>()?.value());
                                Ok(())
                            } else {
                                skip_meta(inner)
                            }
                        })?;
                    }
                } else if meta.path.is_ident("rename_all") && meta.input.peek(syn::Token![=]) {
                    let rule = meta.value()?.parse::<syn::LitStr>()?.value();
                    serde_attrs.rename_all = RenameRule::parse(&rule);
                } else if meta.path.is_ident("skip") {
                    serde_attrs.skip = true;
                } else if meta.path.is_ident("flatten") {
                    serde_attrs.flatten = true;
                } else {
                    skip_meta(meta)?;
                }
                Ok(())
            });
            if let Err(e) = parsed {
                warn!("Ignoring malformed serde attribute: {}", e);
            }
        }

        serde_attrs
    }
}

/// Raw `name: value` annotations of one field, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<(String, String)>);

impl Tags {
    /// Looks up an annotation; the first declaration of a name wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }
}

/// Everything the generator reads from a field's attributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldAttributes {
    pub serde: SerdeAttributes,
    pub tags: Tags,
    /// Doc comment, lines trimmed and joined with newlines
    pub doc: Option<String>,
}

impl FieldAttributes {
    pub fn from_attrs(attrs: &[syn::Attribute]) -> Self {
        let mut tags = Tags::default();
        let mut doc_lines = Vec::new();

        for attr in attrs {
            let Some(name) = attr.path().get_ident().map(|i| i.to_string()) else {
                continue;
            };
            match (name.as_str(), &attr.meta) {
                ("serde", _) => {}
                ("doc", syn::Meta::NameValue(nv)) => {
                    if let Some(line) = lit_str(&nv.value) {
                        doc_lines.push(line.trim().to_string());
                    }
                }
                (_, syn::Meta::Path(_)) => tags.push(name, "true"),
                (_, syn::Meta::NameValue(nv)) => {
                    let value = lit_str(&nv.value).unwrap_or_else(|| tokens_to_string(&nv.value));
                    tags.push(name, value);
                }
                (_, syn::Meta::List(list)) => collect_list(&name, list, &mut tags),
            }
        }

        let doc = Some(doc_lines.join("\n").trim().to_string()).filter(|d| !d.is_empty());

        Self {
            serde: SerdeAttributes::from_attrs(attrs),
            tags,
            doc,
        }
    }
}

fn collect_list(name: &str, list: &syn::MetaList, tags: &mut Tags) {
    let mut entries = Tags::default();
    let mut flags = Vec::new();

    let parsed = list.parse_nested_meta(|meta| {
        let key = meta
            .path
            .get_ident()
            .map(|i| i.to_string())
            .unwrap_or_else(|| tokens_to_string(&meta.path));
        if meta.input.peek(syn::Token![=]) {
            let expr: syn::Expr = meta.value()?.parse()?;
            let value = lit_str(&expr).unwrap_or_else(|| tokens_to_string(&expr));
            entries.push(key, value);
        } else {
            if meta.input.peek(syn::token::Paren) {
                meta.parse_nested_meta(skip_meta)?;
            }
            flags.push(key);
        }
        Ok(())
    });

    match parsed {
        Ok(()) => {
            if !flags.is_empty() {
                tags.push(name, flags.join(","));
            }
            for flag in flags {
                tags.push(flag, "true");
            }
            tags.0.extend(entries.0);
        }
        Err(_) => {
            let value = syn::parse2::<syn::LitStr>(list.tokens.clone())
                .map(|s| s.value())
                .unwrap_or_else(|_| {
                    list.tokens
                        .to_string()
                        .split(',')
                        .map(str::trim)
                        .collect::<Vec<_>>()
                        .join(",")
                });
            tags.push(name, value);
        }
    }
}

fn skip_meta(meta: ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(skip_meta)?;
    }
    Ok(())
}

fn lit_str(expr: &syn::Expr) -> Option<String> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(s),
            ..
        }) => Some(s.value()),
        _ => None,
    }
}

fn tokens_to_string<T: ToTokens>(tokens: &T) -> String {
    tokens.to_token_stream().to_string()
}

/// Structured view of a field's annotations under a given configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldAnnotations {
    pub required: bool,
    pub deprecated: bool,
    pub description: Option<String>,
    pub format: Option<String>,
    pub default: Option<String>,
    pub enum_values: Vec<String>,
}

/// Reads requiredness, deprecation, description, format, default and enum values.
///
/// An unparsable deprecated flag resolves to `false`.
pub fn extract_annotations(attrs: &FieldAttributes, config: &GeneratorConfig) -> FieldAnnotations {
    let tags = &attrs.tags;

    let required = tags
        .get(&config.validator_tag)
        .map(|v| v.split(',').any(|token| token.trim() == config.required_token))
        .unwrap_or(false);

    let deprecated = match tags.get(&config.deprecated_tag) {
        Some(value) => value.trim().parse::<bool>().unwrap_or_else(|_| {
            warn!("Invalid deprecated flag `{}`, assuming false", value);
            false
        }),
        None => false,
    };

    let description = tags
        .get(&config.description_tag)
        .map(str::to_string)
        .or_else(|| attrs.doc.clone());

    let enum_values = tags
        .get(&config.enum_tag)
        .map(|v| {
            v.split(',')
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty())
                .collect()
        })
        .unwrap_or_default();

    FieldAnnotations {
        required,
        deprecated,
        description,
        format: tags.get(&config.format_tag).map(str::to_string),
        default: tags.get(&config.default_tag).map(str::to_string),
        enum_values,
    }
}

/// Returns the single parameter location declared on a field, with its key.
///
/// # Errors
///
/// Returns [`GeneratorError::ParamLocationConflict`] if more than one location
/// annotation is present.
pub fn param_location(
    field: &FieldDef,
    parent: &str,
    config: &GeneratorConfig,
) -> Result<Option<(ParameterLocation, String)>> {
    let candidates = [
        (ParameterLocation::Path, &config.path_location_tag),
        (ParameterLocation::Query, &config.query_location_tag),
        (ParameterLocation::Header, &config.header_location_tag),
    ];

    let mut found = None;
    for (location, tag) in candidates {
        if let Some(key) = field.attrs.tags.get(tag) {
            if found.is_some() {
                return Err(GeneratorError::ParamLocationConflict {
                    field: field.ident.clone(),
                    parent: parent.to_string(),
                });
            }
            found = Some((location, key.to_string()));
        }
    }

    Ok(found)
}

/// Resolves the externally visible name of a field.
///
/// With the serde namespace, `skip` yields `""`, `rename` its alias and anything else
/// the identifier, adjusted by the container's `rename_all` rule. For any other tag the
/// first comma-separated part of its value is used: `"-"` yields `""` and an empty or
/// absent value yields the identifier.
pub fn field_name_from_tag(field: &FieldDef, tag: &str, rename_all: Option<RenameRule>) -> String {
    if tag == "serde" {
        if field.attrs.serde.skip {
            return String::new();
        }
        if let Some(rename) = &field.attrs.serde.rename {
            return rename.clone();
        }
        return match rename_all {
            Some(rule) => rule.apply(&field.ident),
            None => field.ident.clone(),
        };
    }

    match field.attrs.tags.get(tag).and_then(|v| v.split(',').next()) {
        Some("-") => String::new(),
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => field.ident.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(code: &str) -> FieldDef {
        let item: syn::ItemStruct = syn::parse_str(code).unwrap();
        let syn::Fields::Named(named) = item.fields else {
            panic!("expected named fields");
        };
        FieldDef::from_syn(named.named.first().unwrap()).unwrap()
    }

    #[test]
    fn test_raw_tags_from_attribute_forms() {
        let f = field(
            r#"struct T {
                #[validate(required, email)]
                #[api(query = "xd", enum = "1,2,3", default = 1)]
                #[deprecated]
                #[format = "date"]
                pub a: String,
            }"#,
        );

        let tags = &f.attrs.tags;
        assert_eq!(tags.get("validate"), Some("required,email"));
        assert_eq!(tags.get("required"), Some("true"));
        assert_eq!(tags.get("query"), Some("xd"));
        assert_eq!(tags.get("enum"), Some("1,2,3"));
        assert_eq!(tags.get("default"), Some("1"));
        assert_eq!(tags.get("deprecated"), Some("true"));
        assert_eq!(tags.get("format"), Some("date"));
    }

    #[test]
    fn test_serde_attributes() {
        let f = field(r#"struct T { #[serde(rename = "f", default, skip_serializing_if = "Option::is_none")] pub a: Option<String> }"#);
        assert_eq!(f.attrs.serde.rename.as_deref(), Some("f"));
        assert!(!f.attrs.serde.skip);

        let f = field(r#"struct T { #[serde(flatten)] pub inner: Inner }"#);
        assert!(f.attrs.serde.flatten);
    }

    #[test]
    fn test_struct_field_name() {
        let config = GeneratorConfig::default();
        let a = field(r#"struct T { #[name = "A"] pub a: String }"#);
        let ba = field(r#"struct T { #[name = ""] pub ba: String }"#);
        let ab = field(r#"struct T { #[name = "-"] pub ab: String }"#);
        let b = field(r#"struct T { pub b: String }"#);

        assert_eq!(field_name_from_tag(&a, "name", None), "A");
        assert_eq!(field_name_from_tag(&ba, "name", None), "ba");
        assert_eq!(field_name_from_tag(&ab, "name", None), "");
        assert_eq!(field_name_from_tag(&b, "name", None), "b");

        let skipped = field(r#"struct T { #[serde(skip)] pub m: i32 }"#);
        let renamed = field(r#"struct T { #[serde(rename = "userName")] pub name: String }"#);
        let plain = field(r#"struct T { pub created_at: String }"#);
        assert_eq!(field_name_from_tag(&skipped, &config.naming_tag, None), "");
        assert_eq!(field_name_from_tag(&renamed, &config.naming_tag, None), "userName");
        assert_eq!(
            field_name_from_tag(&plain, &config.naming_tag, Some(RenameRule::Camel)),
            "createdAt"
        );
    }

    #[test]
    fn test_extract_annotations() {
        let config = GeneratorConfig::default();
        let f = field(
            r#"struct T {
                /// This is F
                #[validate(required)]
                #[api(enum = "a, b ,c", deprecated = "oui")]
                pub f: String,
            }"#,
        );

        let annotations = extract_annotations(&f.attrs, &config);
        assert!(annotations.required);
        assert!(!annotations.deprecated);
        assert_eq!(annotations.description.as_deref(), Some("This is F"));
        assert_eq!(annotations.enum_values, vec!["a", "b", "c"]);
        assert!(annotations.default.is_none());
    }

    #[test]
    fn test_description_annotation_wins_over_doc() {
        let config = GeneratorConfig::default();
        let f = field(
            r#"struct T {
                /// From the doc comment
                #[api(description = "From the annotation")]
                pub f: String,
            }"#,
        );

        let annotations = extract_annotations(&f.attrs, &config);
        assert_eq!(annotations.description.as_deref(), Some("From the annotation"));
    }

    #[test]
    fn test_param_location_conflict() {
        let config = GeneratorConfig::default();
        let f = field(r#"struct T { #[api(path = "a", query = "b")] pub a: String }"#);

        let err = param_location(&f, "T", &config).unwrap_err();
        assert!(matches!(err, GeneratorError::ParamLocationConflict { .. }));
    }

    #[test]
    fn test_param_location() {
        let config = GeneratorConfig::default();
        let f = field(r#"struct T { #[api(header = "X-Test-C")] pub c: String }"#);
        assert_eq!(
            param_location(&f, "T", &config).unwrap(),
            Some((ParameterLocation::Header, "X-Test-C".to_string()))
        );

        let f = field(r#"struct T { pub c: String }"#);
        assert_eq!(param_location(&f, "T", &config).unwrap(), None);
    }

    #[test]
    fn test_rename_rules() {
        assert_eq!(RenameRule::parse("snake_case").unwrap().apply("InProgress"), "in_progress");
        assert_eq!(RenameRule::parse("SCREAMING_SNAKE_CASE").unwrap().apply("InProgress"), "IN_PROGRESS");
        assert_eq!(RenameRule::parse("kebab-case").unwrap().apply("created_at"), "created-at");
        assert!(RenameRule::parse("weird").is_none());
    }
}
