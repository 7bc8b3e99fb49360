use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File scanner for collecting the source files of a project.
///
/// The `FileScanner` recursively walks a project directory, collecting every Rust source
/// file together with the module path it defines. Module paths are what the type index
/// uses to tell same-named types apart and what the type namer uses to build fully
/// qualified schema names. `target` and hidden directories are skipped.
///
/// # Example
///
/// ```no_run
/// use openapi_from_types::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-service"));
/// let result = scanner.scan().unwrap();
/// for file in &result.source_files {
///     println!("{} -> {}", file.path.display(), file.module_path.join("::"));
/// }
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// A Rust source file and the module it defines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path to the file on disk
    pub path: PathBuf,
    /// Module path relative to the crate root, e.g. `["models", "user"]`
    pub module_path: Vec<String>,
}

/// Result of a directory scan.
pub struct ScanResult {
    /// Every discovered `.rs` file
    pub source_files: Vec<SourceFile>,
    /// Warning messages for paths that could not be read
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all `.rs` files.
    ///
    /// Inaccessible entries are recorded as warnings and the scan continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory does not exist.
    pub fn scan(&self) -> Result<ScanResult> {
        let root = self
            .root_path
            .canonicalize()
            .with_context(|| format!("Failed to access project root: {}", self.root_path.display()))?;

        let mut source_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == root {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "target"
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        let module_path = module_path_for(&root, path);
                        debug!("Found {} (module `{}`)", path.display(), module_path.join("::"));
                        source_files.push(SourceFile {
                            path: path.to_path_buf(),
                            module_path,
                        });
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            source_files,
            warnings,
        })
    }
}

/// Computes the module path a file defines, relative to its crate's `src` directory.
///
/// `src/lib.rs`, `src/main.rs` and `mod.rs` files name their directory's module; any
/// other file adds its stem. Everything up to the last `src` component is dropped, so
/// workspace members resolve to their own crate root.
pub fn module_path_for(root: &Path, path: &Path) -> Vec<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut segments: Vec<String> = relative
        .iter()
        .map(|s| s.to_string_lossy().into_owned())
        .collect();

    if let Some(src_pos) = segments.iter().rposition(|s| s == "src") {
        segments.drain(..=src_pos);
    }

    if let Some(file_name) = segments.pop() {
        let stem = file_name.strip_suffix(".rs").unwrap_or(&file_name);
        if !matches!(stem, "lib" | "main" | "mod") {
            segments.push(stem.to_string());
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_normal_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("lib.rs"), "pub fn test() {}").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(result.source_files.len(), 2);
        assert!(result.warnings.is_empty());
        assert!(result.source_files.iter().all(|f| f.module_path.is_empty()));
    }

    #[test]
    fn test_scan_computes_module_paths() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src/models")).unwrap();
        fs::create_dir_all(root.join("src/openapi")).unwrap();
        fs::write(root.join("src/lib.rs"), "pub mod models;").unwrap();
        fs::write(root.join("src/models/user.rs"), "pub struct User {}").unwrap();
        fs::write(root.join("src/openapi/mod.rs"), "pub struct Y {}").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        let modules: Vec<String> = result
            .source_files
            .iter()
            .map(|f| f.module_path.join("::"))
            .collect();
        assert_eq!(modules, vec!["", "models::user", "openapi"]);
    }

    #[test]
    fn test_scan_skips_target_and_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("target")).unwrap();
        fs::write(root.join("target/build.rs"), "fn main() {}").unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git/config.rs"), "// config").unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(result.source_files.len(), 1);
        assert_eq!(
            result.source_files[0].path.file_name().unwrap().to_string_lossy(),
            "main.rs"
        );
    }

    #[test]
    fn test_scan_missing_root() {
        let scanner = FileScanner::new(PathBuf::from("/nonexistent/project"));
        assert!(scanner.scan().is_err());
    }

    #[test]
    fn test_module_path_for_workspace_member() {
        let root = Path::new("/work");
        let path = Path::new("/work/crates/api/src/routes/users.rs");
        assert_eq!(module_path_for(root, path), vec!["routes", "users"]);
    }
}
