use crate::parser::ParsedFile;
use crate::tags::{FieldAttributes, RenameRule, SerdeAttributes};
use log::debug;
use quote::ToTokens;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Index of the type definitions found in a set of parsed files.
///
/// The index is the generator's view of "static type information": struct, enum and
/// type-alias definitions keyed by module path, plus string literals returned by impl
/// methods, which back the self-naming capability of the type namer.
#[derive(Debug, Default)]
pub struct TypeIndex {
    defs: Vec<Rc<TypeDef>>,
    by_ident: HashMap<String, Vec<usize>>,
    literal_methods: HashMap<TypeKey, HashMap<String, String>>,
}

/// Identity of a named type: its module path and identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    pub module_path: Vec<String>,
    pub ident: String,
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for segment in &self.module_path {
            write!(f, "{}::", segment)?;
        }
        write!(f, "{}", self.ident)
    }
}

/// A named type definition
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub key: TypeKey,
    pub kind: TypeDefKind,
    /// Container-level serde attributes
    pub serde: SerdeAttributes,
}

#[derive(Debug, Clone)]
pub enum TypeDefKind {
    Struct(StructDef),
    Enum(EnumDef),
    /// `type Name = Target;`
    Alias(syn::Type),
}

#[derive(Debug, Clone)]
pub enum StructDef {
    /// A struct with named fields
    Named(Vec<FieldDef>),
    /// A tuple struct with exactly one field
    Newtype(syn::Type),
    /// A tuple struct with several fields
    Tuple,
    Unit,
}

/// Field definition in a struct
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub ident: String,
    pub ty: syn::Type,
    /// Whether the field has an explicit visibility
    pub exported: bool,
    pub attrs: FieldAttributes,
}

impl FieldDef {
    /// Builds a field definition from a named `syn` field.
    pub fn from_syn(field: &syn::Field) -> Option<Self> {
        let ident = field.ident.as_ref()?.to_string();
        Some(Self {
            ident: ident.trim_start_matches("r#").to_string(),
            ty: field.ty.clone(),
            exported: !matches!(field.vis, syn::Visibility::Inherited),
            attrs: FieldAttributes::from_attrs(&field.attrs),
        })
    }
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub variants: Vec<VariantDef>,
}

#[derive(Debug, Clone)]
pub struct VariantDef {
    pub ident: String,
    /// Whether the variant carries no data
    pub unit: bool,
    pub serde: SerdeAttributes,
}

impl EnumDef {
    /// Whether every variant is a unit variant
    pub fn is_unit_only(&self) -> bool {
        self.variants.iter().all(|v| v.unit)
    }

    /// Serialized variant names, honoring renames and skips
    pub fn variant_names(&self, rename_all: Option<RenameRule>) -> Vec<String> {
        self.variants
            .iter()
            .filter(|v| !v.serde.skip)
            .map(|v| match (&v.serde.rename, rename_all) {
                (Some(rename), _) => rename.clone(),
                (None, Some(rule)) => rule.apply(&v.ident),
                (None, None) => v.ident.clone(),
            })
            .collect()
    }
}

/// Primitive and well-known scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Char,
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    DateTime,
    Date,
    Duration,
    Uuid,
}

impl Primitive {
    fn from_ident(ident: &str) -> Option<Self> {
        let primitive = match ident {
            "String" | "str" => Self::String,
            "char" => Self::Char,
            "bool" => Self::Bool,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "i128" => Self::I128,
            "isize" => Self::Isize,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "u128" => Self::U128,
            "usize" => Self::Usize,
            "f32" => Self::F32,
            "f64" => Self::F64,
            "DateTime" | "NaiveDateTime" | "SystemTime" | "OffsetDateTime" | "PrimitiveDateTime" => {
                Self::DateTime
            }
            "NaiveDate" | "Date" => Self::Date,
            "Duration" => Self::Duration,
            "Uuid" => Self::Uuid,
            _ => return None,
        };
        Some(primitive)
    }

    /// OpenAPI `type` and `format` of the primitive
    pub fn type_and_format(self) -> (&'static str, Option<&'static str>) {
        match self {
            Self::String | Self::Char => ("string", None),
            Self::Bool => ("boolean", None),
            Self::I8 | Self::I16 | Self::I32 | Self::U8 | Self::U16 => ("integer", Some("int32")),
            Self::I64
            | Self::I128
            | Self::Isize
            | Self::U32
            | Self::U64
            | Self::U128
            | Self::Usize
            | Self::Duration => ("integer", Some("int64")),
            Self::F32 => ("number", Some("float")),
            Self::F64 => ("number", Some("double")),
            Self::DateTime => ("string", Some("date-time")),
            Self::Date => ("string", Some("date")),
            Self::Uuid => ("string", Some("uuid")),
        }
    }

    /// Converts a raw annotation value into a JSON value of this type.
    pub fn parse_value(self, raw: &str) -> Option<serde_json::Value> {
        use serde_json::Value;

        fn int<T: std::str::FromStr + Into<serde_json::Number>>(raw: &str) -> Option<Value> {
            raw.parse::<T>().ok().map(|n| Value::Number(n.into()))
        }

        match self {
            Self::String | Self::DateTime | Self::Date | Self::Uuid => {
                Some(Value::String(raw.to_string()))
            }
            Self::Char => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::String(c.to_string())),
                    _ => None,
                }
            }
            Self::Bool => raw.parse::<bool>().ok().map(Value::Bool),
            Self::I8 => int::<i8>(raw),
            Self::I16 => int::<i16>(raw),
            Self::I32 => int::<i32>(raw),
            Self::I64 | Self::Isize | Self::Duration => int::<i64>(raw),
            // JSON numbers hold 128-bit values only within the `i64`/`u64` range
            Self::I128 => raw
                .parse::<i128>()
                .ok()
                .and_then(serde_json::Number::from_i128)
                .map(Value::Number),
            Self::U8 => int::<u8>(raw),
            Self::U16 => int::<u16>(raw),
            Self::U32 => int::<u32>(raw),
            Self::U64 | Self::Usize => int::<u64>(raw),
            Self::U128 => raw
                .parse::<u128>()
                .ok()
                .and_then(serde_json::Number::from_u128)
                .map(Value::Number),
            Self::F32 => raw
                .parse::<f32>()
                .ok()
                .and_then(|f| serde_json::Number::from_f64(f64::from(f)))
                .map(Value::Number),
            Self::F64 => raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
        }
    }
}

/// Structural shape of a type as seen from a given module
#[derive(Debug, Clone)]
pub enum TypeShape {
    Primitive(Primitive),
    /// `Option<T>`
    Nullable(syn::Type),
    /// `Box<T>`, `Rc<T>`, `Arc<T>`, `Cow<T>`, `&T`
    Transparent(syn::Type),
    /// `Vec<T>`, sets, slices and arrays
    Sequence(syn::Type),
    Map { key: syn::Type, value: syn::Type },
    /// A definition from the index
    Named(Rc<TypeDef>),
    Unsupported(&'static str),
    Unknown,
}

struct PendingImpl {
    module_path: Vec<String>,
    self_ty: syn::Path,
    methods: Vec<(String, String)>,
}

impl TypeIndex {
    /// Indexes the type definitions of `parsed_files`.
    pub fn new(parsed_files: &[ParsedFile]) -> Self {
        debug!("Indexing types of {} files", parsed_files.len());

        let mut index = Self::default();
        let mut pending = Vec::new();
        for parsed_file in parsed_files {
            index.collect_items(&parsed_file.module_path, &parsed_file.syntax_tree.items, &mut pending);
        }

        // Impl blocks are matched once every definition is known, so an impl may live in
        // a different file than its type.
        for imp in pending {
            let Some(def) = index.lookup(&imp.self_ty, &imp.module_path) else {
                debug!("Skipping impl for unknown type in `{}`", imp.module_path.join("::"));
                continue;
            };
            let methods = index.literal_methods.entry(def.key.clone()).or_default();
            for (name, literal) in imp.methods {
                methods.entry(name).or_insert(literal);
            }
        }

        debug!("Indexed {} type definitions", index.defs.len());
        index
    }

    fn collect_items(&mut self, module_path: &[String], items: &[syn::Item], pending: &mut Vec<PendingImpl>) {
        for item in items {
            match item {
                syn::Item::Struct(item_struct) => {
                    let def = TypeDef {
                        key: key(module_path, &item_struct.ident),
                        kind: TypeDefKind::Struct(Self::parse_struct(item_struct)),
                        serde: SerdeAttributes::from_attrs(&item_struct.attrs),
                    };
                    self.insert(def);
                }
                syn::Item::Enum(item_enum) => {
                    let variants = item_enum
                        .variants
                        .iter()
                        .map(|v| VariantDef {
                            ident: v.ident.to_string(),
                            unit: matches!(v.fields, syn::Fields::Unit),
                            serde: SerdeAttributes::from_attrs(&v.attrs),
                        })
                        .collect();
                    let def = TypeDef {
                        key: key(module_path, &item_enum.ident),
                        kind: TypeDefKind::Enum(EnumDef { variants }),
                        serde: SerdeAttributes::from_attrs(&item_enum.attrs),
                    };
                    self.insert(def);
                }
                syn::Item::Type(item_type) => {
                    let def = TypeDef {
                        key: key(module_path, &item_type.ident),
                        kind: TypeDefKind::Alias((*item_type.ty).clone()),
                        serde: SerdeAttributes::default(),
                    };
                    self.insert(def);
                }
                syn::Item::Impl(item_impl) => {
                    if let syn::Type::Path(type_path) = &*item_impl.self_ty {
                        let methods: Vec<(String, String)> = item_impl
                            .items
                            .iter()
                            .filter_map(|impl_item| match impl_item {
                                syn::ImplItem::Fn(f) => returned_literal(&f.block)
                                    .map(|literal| (f.sig.ident.to_string(), literal)),
                                _ => None,
                            })
                            .collect();
                        if !methods.is_empty() {
                            pending.push(PendingImpl {
                                module_path: module_path.to_vec(),
                                self_ty: type_path.path.clone(),
                                methods,
                            });
                        }
                    }
                }
                syn::Item::Mod(item_mod) => {
                    if let Some((_, items)) = &item_mod.content {
                        let mut nested = module_path.to_vec();
                        nested.push(item_mod.ident.to_string());
                        self.collect_items(&nested, items, pending);
                    }
                }
                _ => {}
            }
        }
    }

    fn parse_struct(item_struct: &syn::ItemStruct) -> StructDef {
        match &item_struct.fields {
            syn::Fields::Named(named) => {
                StructDef::Named(named.named.iter().filter_map(FieldDef::from_syn).collect())
            }
            syn::Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                StructDef::Newtype(unnamed.unnamed[0].ty.clone())
            }
            syn::Fields::Unnamed(_) => StructDef::Tuple,
            syn::Fields::Unit => StructDef::Unit,
        }
    }

    fn insert(&mut self, def: TypeDef) {
        debug!("Indexed type `{}`", def.key);
        let position = self.defs.len();
        self.by_ident.entry(def.key.ident.clone()).or_default().push(position);
        self.defs.push(Rc::new(def));
    }

    /// Number of indexed definitions
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Finds the definition a path refers to when written inside module `from`.
    ///
    /// Qualifying segments must match the tail of the definition's module path. Among
    /// several candidates, a definition from `from` itself is preferred.
    pub fn lookup(&self, path: &syn::Path, from: &[String]) -> Option<Rc<TypeDef>> {
        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
        let (ident, qualifiers) = segments.split_last()?;
        let qualifiers: Vec<&String> = qualifiers
            .iter()
            .filter(|s| !matches!(s.as_str(), "crate" | "self" | "super"))
            .collect();

        let candidates: Vec<&Rc<TypeDef>> = self
            .by_ident
            .get(ident)?
            .iter()
            .map(|&i| &self.defs[i])
            .filter(|def| {
                let module = &def.key.module_path;
                qualifiers.len() <= module.len()
                    && module[module.len() - qualifiers.len()..]
                        .iter()
                        .zip(&qualifiers)
                        .all(|(a, b)| a == *b)
            })
            .collect();

        candidates
            .iter()
            .find(|def| def.key.module_path == from)
            .or_else(|| candidates.first())
            .map(|def| Rc::clone(def))
    }

    /// Returns the string literal returned by `method` in an impl block of `key`.
    pub fn literal_method(&self, key: &TypeKey, method: &str) -> Option<&str> {
        self.literal_methods.get(key)?.get(method).map(String::as_str)
    }

    /// Classifies `ty` as written inside module `from`.
    pub fn classify(&self, ty: &syn::Type, from: &[String]) -> TypeShape {
        match ty {
            syn::Type::Path(type_path) if type_path.qself.is_none() => self.classify_path(&type_path.path, from),
            syn::Type::Path(_) => TypeShape::Unsupported("qualified associated type"),
            syn::Type::Reference(reference) => match &*reference.elem {
                syn::Type::Slice(slice) => TypeShape::Sequence((*slice.elem).clone()),
                elem => TypeShape::Transparent(elem.clone()),
            },
            syn::Type::Slice(slice) => TypeShape::Sequence((*slice.elem).clone()),
            syn::Type::Array(array) => TypeShape::Sequence((*array.elem).clone()),
            syn::Type::Paren(paren) => self.classify(&paren.elem, from),
            syn::Type::Group(group) => self.classify(&group.elem, from),
            syn::Type::Ptr(_) => TypeShape::Unsupported("raw pointer"),
            syn::Type::BareFn(_) => TypeShape::Unsupported("function"),
            syn::Type::TraitObject(_) | syn::Type::ImplTrait(_) => TypeShape::Unsupported("trait object"),
            syn::Type::Never(_) => TypeShape::Unsupported("never type"),
            syn::Type::Tuple(tuple) if tuple.elems.is_empty() => TypeShape::Unsupported("unit type"),
            syn::Type::Tuple(_) => TypeShape::Unsupported("tuple"),
            _ => TypeShape::Unsupported("type expression"),
        }
    }

    fn classify_path(&self, path: &syn::Path, from: &[String]) -> TypeShape {
        let Some(last) = path.segments.last() else {
            return TypeShape::Unknown;
        };
        let args = type_args(last);
        let ident = last.ident.to_string();

        match (ident.as_str(), args.as_slice()) {
            ("Option", [inner]) => return TypeShape::Nullable(inner.clone()),
            ("Box" | "Rc" | "Arc" | "Cow", [inner, ..]) => return TypeShape::Transparent(inner.clone()),
            ("Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet", [inner, ..]) => {
                return TypeShape::Sequence(inner.clone())
            }
            ("HashMap" | "BTreeMap" | "IndexMap", [key, value, ..]) => {
                return TypeShape::Map {
                    key: key.clone(),
                    value: value.clone(),
                }
            }
            ("Sender" | "SyncSender" | "Receiver" | "UnboundedSender" | "UnboundedReceiver", _) => {
                return TypeShape::Unsupported("channel")
            }
            ("PhantomData", _) => return TypeShape::Unsupported("marker type"),
            _ => {}
        }

        if let Some(def) = self.lookup(path, from) {
            return TypeShape::Named(def);
        }

        match Primitive::from_ident(&ident) {
            Some(primitive) => TypeShape::Primitive(primitive),
            None => TypeShape::Unknown,
        }
    }
}

fn key(module_path: &[String], ident: &syn::Ident) -> TypeKey {
    TypeKey {
        module_path: module_path.to_vec(),
        ident: ident.to_string(),
    }
}

fn type_args(segment: &syn::PathSegment) -> Vec<syn::Type> {
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(ty.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// The string literal a function body evaluates to, if that is all it does.
fn returned_literal(block: &syn::Block) -> Option<String> {
    match block.stmts.as_slice() {
        [syn::Stmt::Expr(expr, _)] => literal_expr(expr),
        _ => None,
    }
}

fn literal_expr(expr: &syn::Expr) -> Option<String> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(s),
            ..
        }) => Some(s.value()),
        syn::Expr::Return(ret) => literal_expr(ret.expr.as_deref()?),
        syn::Expr::MethodCall(call)
            if call.args.is_empty() && matches!(call.method.to_string().as_str(), "into" | "to_string" | "to_owned") =>
        {
            literal_expr(&call.receiver)
        }
        syn::Expr::Call(call) if call.args.len() == 1 => match &*call.func {
            syn::Expr::Path(p) if p.path.segments.last().is_some_and(|s| s.ident == "from") => {
                literal_expr(&call.args[0])
            }
            _ => None,
        },
        _ => None,
    }
}

/// Renders a type the way it would be written in source.
pub fn type_to_string(ty: &syn::Type) -> String {
    ty.to_token_stream()
        .to_string()
        .replace(" :: ", "::")
        .replace(" <", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace("& ", "&")
}
