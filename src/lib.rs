//! OpenAPI from types - OpenAPI documents from annotated Rust request and response types.
//!
//! Request structures describe what an endpoint accepts: annotated fields become path,
//! query or header parameters, the rest forms the JSON request body. Response types
//! become schemas under `components/schemas`, referenced by name.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Recursively scans project directories for Rust files
//! 2. [`parser`] - Parses Rust source files into Abstract Syntax Trees (AST)
//! 3. [`type_index`] - Indexes struct, enum and alias definitions by module path
//! 4. [`tags`] - Reads field annotations and serde attributes
//! 5. [`generator`] - Resolves schemas and assembles operations
//! 6. [`manifest`] - Lists the operations to document
//! 7. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_types::{
//!     manifest::Manifest,
//!     parser::AstParser,
//!     scanner::FileScanner,
//!     serializer::serialize_yaml,
//!     type_index::TypeIndex,
//! };
//! use std::path::{Path, PathBuf};
//!
//! let scan_result = FileScanner::new(PathBuf::from("./my-project")).scan().unwrap();
//! let parsed_files: Vec<_> = AstParser::parse_files(&scan_result.source_files)
//!     .into_iter()
//!     .filter_map(Result::ok)
//!     .collect();
//!
//! let manifest = Manifest::from_path(Path::new("./openapi-manifest.yaml")).unwrap();
//! let generator = manifest.build(TypeIndex::new(&parsed_files)).unwrap();
//! for error in generator.errors() {
//!     eprintln!("{}", error);
//! }
//!
//! println!("{}", serialize_yaml(generator.api()).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod generator;
pub mod manifest;
pub mod parser;
pub mod scanner;
pub mod schema;
pub mod serializer;
pub mod tags;
pub mod type_index;
