use thiserror::Error;

/// Result type alias for generator calls that can fail outright
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Errors that abort a single generator call.
///
/// Nothing is committed to the document for the call that returned one of
/// these, apart from schemas that were already cached by earlier calls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("generator configuration is missing")]
    MissingConfig,

    #[error("invalid type expression `{expr}`: {message}")]
    InvalidTypeExpr { expr: String, message: String },

    #[error("type `{0}` is not a struct")]
    NotAStruct(String),

    #[error("type `{0}` has no name that can be overridden")]
    UnnamedType(String),

    #[error("operation id must not be empty")]
    EmptyOperationId,

    #[error("operation id `{0}` is already used by another operation")]
    DuplicateOperationId(String),

    #[error("response with code {code} already exists on operation `{operation}`")]
    DuplicateResponseCode { operation: String, code: String },

    #[error("invalid response status code `{0}`")]
    InvalidStatusCode(String),

    #[error("field `{field}` of `{parent}` declares more than one parameter location")]
    ParamLocationConflict { field: String, parent: String },

    #[error("unknown HTTP method `{0}`")]
    UnknownMethod(String),

    #[error("type name override for `{0}` must not be empty")]
    EmptyTypeName(String),

    #[error("type `{ty}` is already named `{existing}`")]
    TypeAlreadyNamed { ty: String, existing: String },

    #[error("name `{name}` is already used by type `{owner}`")]
    NameTaken { name: String, owner: String },
}

/// Degraded results recorded while walking a type graph.
///
/// These never abort the walk; the generator keeps them in append order and
/// exposes them through `Generator::errors`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("cannot build a schema without a type")]
    MissingType,

    #[error("unsupported type `{ty}`: {reason}")]
    UnsupportedType { ty: String, reason: String },

    #[error("unknown type `{0}`")]
    UnknownType(String),

    #[error("map type `{ty}` must have string keys, found `{key}`")]
    UnsupportedMapKey { ty: String, key: String },

    #[error("field `{field}` of `{parent}`: default value `{value}` cannot be converted to `{ty}`")]
    InvalidDefault {
        parent: String,
        field: String,
        value: String,
        ty: String,
    },

    #[error("field `{field}` of `{parent}`: enum value `{value}` cannot be converted to `{ty}`")]
    InvalidEnumValue {
        parent: String,
        field: String,
        value: String,
        ty: String,
    },

    #[error("field `{field}` of `{parent}` is required and must not have a default value")]
    RequiredWithDefault { parent: String, field: String },

    #[error("schema name `{name}` is already used by `{owner}`, inlining `{ty}`")]
    NameCollision {
        name: String,
        owner: String,
        ty: String,
    },
}
