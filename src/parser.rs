use crate::scanner::SourceFile;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

/// AST parser for Rust source files.
///
/// The `AstParser` uses `syn` to turn source files into syntax trees, which the
/// [`TypeIndex`](crate::type_index::TypeIndex) then walks for type definitions.
///
/// # Example
///
/// ```no_run
/// use openapi_from_types::parser::AstParser;
/// use openapi_from_types::scanner::SourceFile;
/// use std::path::PathBuf;
///
/// let source = SourceFile {
///     path: PathBuf::from("src/models.rs"),
///     module_path: vec!["models".to_string()],
/// };
/// let parsed = AstParser::parse_file(&source).unwrap();
/// println!("Parsed {} items", parsed.syntax_tree.items.len());
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file, or a placeholder for in-memory sources
    pub path: PathBuf,
    /// Module path of the file relative to its crate root
    pub module_path: Vec<String>,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl AstParser {
    /// Parses a single source file into an AST.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid Rust syntax.
    pub fn parse_file(source: &SourceFile) -> Result<ParsedFile> {
        debug!("Parsing file: {}", source.path.display());

        let content = fs::read_to_string(&source.path)
            .with_context(|| format!("Failed to read file: {}", source.path.display()))?;

        let syntax_tree = syn::parse_file(&content).with_context(|| {
            format!("Failed to parse Rust syntax in file: {}", source.path.display())
        })?;

        Ok(ParsedFile {
            path: source.path.clone(),
            module_path: source.module_path.clone(),
            syntax_tree,
        })
    }

    /// Parses source code held in memory as the body of `module_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the code contains invalid Rust syntax.
    pub fn parse_source(module_path: &[&str], code: &str) -> Result<ParsedFile> {
        let module_path: Vec<String> = module_path.iter().map(|s| s.to_string()).collect();
        let syntax_tree = syn::parse_file(code).with_context(|| {
            format!("Failed to parse Rust syntax in module `{}`", module_path.join("::"))
        })?;

        Ok(ParsedFile {
            path: PathBuf::from(format!("<{}>", module_path.join("::"))),
            module_path,
            syntax_tree,
        })
    }

    /// Parses multiple files, continuing past failures.
    ///
    /// Files that fail to parse are logged as warnings; the caller decides whether a
    /// partial set of files is good enough.
    pub fn parse_files(sources: &[SourceFile]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", sources.len());

        let results: Vec<Result<ParsedFile>> = sources
            .iter()
            .map(|source| {
                Self::parse_file(source).inspect_err(|e| {
                    warn!("Failed to parse {}: {:#}", source.path.display(), e);
                })
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn create_source(dir: &TempDir, name: &str, content: &str) -> SourceFile {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        SourceFile {
            path,
            module_path: vec![name.trim_end_matches(".rs").to_string()],
        }
    }

    #[test]
    fn test_parse_valid_rust_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_source(
            &temp_dir,
            "models.rs",
            r#"
            pub struct User {
                pub id: u32,
                #[serde(rename = "userName")]
                pub name: String,
            }
            "#,
        );

        let parsed = AstParser::parse_file(&source).unwrap();
        assert_eq!(parsed.path, source.path);
        assert_eq!(parsed.module_path, vec!["models"]);
        assert_eq!(parsed.syntax_tree.items.len(), 1);
    }

    #[test]
    fn test_parse_invalid_rust_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_source(&temp_dir, "broken.rs", "pub struct User { pub id: u32 pub name: String }");

        let err = AstParser::parse_file(&source).unwrap_err();
        assert!(err.to_string().contains("Failed to parse Rust syntax"));
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let source = SourceFile {
            path: Path::new("/nonexistent/file.rs").to_path_buf(),
            module_path: vec![],
        };

        let err = AstParser::parse_file(&source).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn test_parse_source_in_memory() {
        let parsed = AstParser::parse_source(&["api", "v1"], "pub struct Ping;").unwrap();
        assert_eq!(parsed.module_path, vec!["api", "v1"]);
        assert_eq!(parsed.path, PathBuf::from("<api::v1>"));
    }

    #[test]
    fn test_parse_files_batch() {
        let temp_dir = TempDir::new().unwrap();
        let good = create_source(&temp_dir, "good.rs", "pub struct World;");
        let bad = create_source(&temp_dir, "bad.rs", "pub fn broken( {");

        let results = AstParser::parse_files(&[good, bad]);

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
