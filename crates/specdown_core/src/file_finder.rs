//! Document discovery from explicit paths and glob patterns.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::CoreError;

/// Resolves command-line patterns to document paths, honoring the
/// configured include and exclude globs.
///
/// Globs are matched against paths relative to the base directory.
pub struct FileFinder {
    include_globs: Option<GlobSet>,
    exclude_globs: Option<GlobSet>,
}

impl FileFinder {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, CoreError> {
        let include_globs = Self::build_globset(include)?;
        let exclude_globs = Self::build_globset(exclude)?;

        Ok(Self {
            include_globs,
            exclude_globs,
        })
    }

    fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, CoreError> {
        if patterns.is_empty() {
            return Ok(None);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| CoreError::config(format!("Invalid glob pattern: {}", e)))?;
            builder.add(glob);
        }

        let globset = builder
            .build()
            .map_err(|e| CoreError::config(format!("Failed to build globset: {}", e)))?;

        Ok(Some(globset))
    }

    /// Default patterns: every file with a markdown extension.
    pub fn default_patterns() -> Vec<String> {
        specdown_parser::EXTENSIONS
            .iter()
            .map(|ext| format!("**/*.{ext}"))
            .collect()
    }

    /// Checks if a path should be ignored based on include/exclude patterns.
    pub fn should_ignore(&self, path: &Path) -> bool {
        if self
            .exclude_globs
            .as_ref()
            .is_some_and(|excludes| excludes.is_match(path))
        {
            return true;
        }

        self.include_globs
            .as_ref()
            .is_some_and(|includes| !includes.is_match(path))
    }

    /// Expands `patterns` under `base_dir`.
    ///
    /// A pattern naming an existing file is taken as is; a directory is
    /// walked for markdown files; anything else is a glob. The result is
    /// sorted and free of duplicates.
    pub fn discover_files(
        &self,
        patterns: &[String],
        base_dir: &Path,
    ) -> Result<Vec<PathBuf>, CoreError> {
        let mut files = Vec::new();

        let mut glob_builder = GlobSetBuilder::new();
        let mut has_globs = false;

        for pattern in patterns {
            let path = base_dir.join(pattern);
            if path.is_file() {
                let relative = relative_to(&path, base_dir);
                if self.should_ignore(relative) {
                    debug!("Skipping excluded file {}", path.display());
                    continue;
                }
                files.push(path);
            } else if path.is_dir() {
                for ext in specdown_parser::EXTENSIONS {
                    let glob = Glob::new(&format!("{}/**/*.{ext}", pattern.trim_end_matches('/')))
                        .map_err(|e| {
                            CoreError::config(format!("Invalid pattern '{}': {}", pattern, e))
                        })?;
                    glob_builder.add(glob);
                }
                has_globs = true;
            } else {
                let glob = Glob::new(pattern).map_err(|e| {
                    CoreError::config(format!("Invalid pattern '{}': {}", pattern, e))
                })?;
                glob_builder.add(glob);
                has_globs = true;
            }
        }

        if has_globs {
            let glob_set = glob_builder
                .build()
                .map_err(|e| CoreError::config(format!("Failed to build globset: {}", e)))?;

            let walker = WalkDir::new(base_dir)
                .into_iter()
                .filter_entry(|entry| !is_hidden_dir(entry))
                .filter_map(|e| e.ok());
            for entry in walker {
                let path = entry.path();
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = relative_to(path, base_dir);
                if glob_set.is_match(relative) && !self.should_ignore(relative) {
                    files.push(path.to_path_buf());
                }
            }
        }

        files.sort();
        files.dedup();

        info!("Discovered {} documents", files.len());
        Ok(files)
    }
}

fn relative_to<'p>(path: &'p Path, base_dir: &Path) -> &'p Path {
    path.strip_prefix(base_dir).unwrap_or(path)
}

/// Dot-directories such as `.git` are never walked. The root itself is
/// exempt so that `.` works as a base directory.
fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn names(files: &[PathBuf], base: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| relative_to(f, base).to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_build_globset_empty() {
        let result = FileFinder::build_globset(&[]);
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_build_globset_invalid_pattern() {
        let result = FileFinder::build_globset(&["[invalid".to_string()]);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_should_ignore() {
        let finder = FileFinder::new(
            &["specs/**".to_string()],
            &["**/archive/**".to_string()],
        )
        .unwrap();
        assert!(!finder.should_ignore(Path::new("specs/auth/spec.md")));
        assert!(finder.should_ignore(Path::new("specs/archive/old.md")));
        assert!(finder.should_ignore(Path::new("README.md")));
    }

    #[test]
    fn test_discover_files_respects_exclude() {
        let temp_dir = tempdir().unwrap();
        let node_modules = temp_dir.path().join("node_modules");
        fs::create_dir(&node_modules).unwrap();
        fs::write(temp_dir.path().join("test.md"), "# Test").unwrap();
        fs::write(node_modules.join("excluded.md"), "# Excluded").unwrap();

        let finder = FileFinder::new(&[], &["**/node_modules/**".to_string()]).unwrap();
        let files = finder
            .discover_files(&FileFinder::default_patterns(), temp_dir.path())
            .unwrap();

        assert_eq!(names(&files, temp_dir.path()), vec!["test.md"]);
    }

    #[test]
    fn test_discover_files_respects_include() {
        let temp_dir = tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("specs")).unwrap();
        fs::write(temp_dir.path().join("specs/a.md"), "# A").unwrap();
        fs::write(temp_dir.path().join("notes.md"), "# Notes").unwrap();
        fs::write(temp_dir.path().join("specs/b.txt"), "B").unwrap();

        let finder = FileFinder::new(&["specs/**".to_string()], &[]).unwrap();
        let files = finder
            .discover_files(&["**/*".to_string()], temp_dir.path())
            .unwrap();

        assert_eq!(names(&files, temp_dir.path()), vec!["specs/a.md", "specs/b.txt"]);
    }

    #[test]
    fn test_discover_directory_and_explicit_file() {
        let temp_dir = tempdir().unwrap();
        fs::create_dir_all(temp_dir.path().join("changes/add-2fa")).unwrap();
        fs::write(temp_dir.path().join("changes/add-2fa/proposal.md"), "# P").unwrap();
        fs::write(temp_dir.path().join("changes/add-2fa/tasks.jsonc"), "{}").unwrap();
        fs::write(temp_dir.path().join("README.md"), "# R").unwrap();

        let finder = FileFinder::new(&[], &[]).unwrap();
        let files = finder
            .discover_files(
                &[
                    "changes".to_string(),
                    "README.md".to_string(),
                    "README.md".to_string(),
                ],
                temp_dir.path(),
            )
            .unwrap();

        assert_eq!(
            names(&files, temp_dir.path()),
            vec!["README.md", "changes/add-2fa/proposal.md"]
        );
    }

    #[test]
    fn test_hidden_directories_are_skipped() {
        let temp_dir = tempdir().unwrap();
        fs::create_dir(temp_dir.path().join(".git")).unwrap();
        fs::write(temp_dir.path().join(".git/HEAD.md"), "x").unwrap();
        fs::write(temp_dir.path().join("spec.md"), "x").unwrap();

        let finder = FileFinder::new(&[], &[]).unwrap();
        let files = finder
            .discover_files(&FileFinder::default_patterns(), temp_dir.path())
            .unwrap();
        assert_eq!(names(&files, temp_dir.path()), vec!["spec.md"]);
    }
}
