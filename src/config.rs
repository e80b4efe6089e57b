//! Choosing what to archive.
//!
//! A [`TarDirConfig`] describes the request: an optional directory name and
//! whether archiving the working directory itself is permitted. Resolving it
//! against a base directory yields a [`Source`]: where to read from, how to
//! prefix entry names, and a file name for the finished archive.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// What to archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TarDirConfig {
    /// Directory below the base directory. `None` archives the base itself.
    pub directory: Option<String>,
    /// Permit archiving the base directory when no directory is given.
    pub allow_root: bool,
    /// Emit directory entries in addition to regular files.
    pub include_directories: bool,
}

impl Default for TarDirConfig {
    fn default() -> Self {
        TarDirConfig {
            directory: None,
            allow_root: true,
            include_directories: false,
        }
    }
}

/// A resolved archive source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    /// Directory to walk.
    pub path: PathBuf,
    /// Leading path component of every entry name; empty for the base directory.
    pub name_prefix: String,
    /// Suggested file name for the archive.
    pub archive_name: String,
}

impl TarDirConfig {
    /// Resolve against the current working directory.
    pub fn resolve(&self) -> Result<Source, ConfigError> {
        let cwd = std::env::current_dir()?;
        self.resolve_in(&cwd)
    }

    /// Resolve against `base`.
    pub fn resolve_in(&self, base: &Path) -> Result<Source, ConfigError> {
        match self.directory.as_deref().filter(|d| !d.is_empty()) {
            None => {
                if !self.allow_root {
                    return Err(ConfigError::RootNotAllowed);
                }
                let label = base
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "root".to_string());
                Ok(Source {
                    path: base.to_path_buf(),
                    name_prefix: String::new(),
                    archive_name: format!("{}.tar", replace_non_alphanumeric(&label)),
                })
            }
            Some(requested) => {
                let dir = sanitize_dir_name(requested);
                let path = base.join(&dir);
                if dir.is_empty() || !path.is_dir() {
                    return Err(ConfigError::DirectoryNotFound(dir));
                }
                Ok(Source {
                    path,
                    archive_name: format!("{dir}.tar"),
                    name_prefix: dir,
                })
            }
        }
    }
}

/// Strip every `.`, `/` and `\` so the name cannot leave the base directory.
#[must_use]
pub fn sanitize_dir_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '.' | '/' | '\\'))
        .collect()
}

fn replace_non_alphanumeric(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs::create_dir;

    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_sanitize_dir_name() {
        assert_eq!(sanitize_dir_name("photos"), "photos");
        assert_eq!(sanitize_dir_name("../../etc"), "etc");
        assert_eq!(sanitize_dir_name("a/b\\c.d"), "abcd");
        assert_eq!(sanitize_dir_name("./.."), "");
    }

    #[test]
    fn test_resolve_root() {
        let td = tempfile::tempdir().unwrap();
        let base = td.path().join("my site.example");
        create_dir(&base).unwrap();

        let source = TarDirConfig::default().resolve_in(&base).unwrap();
        assert_eq!(source.path, base);
        assert_eq!(source.name_prefix, "");
        assert_eq!(source.archive_name, "my_site_example.tar");
    }

    #[test]
    fn test_resolve_root_not_allowed() {
        let td = tempfile::tempdir().unwrap();
        let config = TarDirConfig {
            allow_root: false,
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_in(td.path()),
            Err(ConfigError::RootNotAllowed)
        ));
    }

    #[test]
    fn test_resolve_directory() {
        let td = tempfile::tempdir().unwrap();
        create_dir(td.path().join("docs")).unwrap();

        let config = TarDirConfig {
            directory: Some("../docs/".to_string()),
            allow_root: false,
            ..Default::default()
        };
        let source = config.resolve_in(td.path()).unwrap();
        assert_eq!(source.path, td.path().join("docs"));
        assert_eq!(source.name_prefix, "docs");
        assert_eq!(source.archive_name, "docs.tar");
    }

    #[test]
    fn test_resolve_missing_directory() {
        let td = tempfile::tempdir().unwrap();
        let config = TarDirConfig {
            directory: Some("missing".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_in(td.path()),
            Err(ConfigError::DirectoryNotFound(name)) if name == "missing"
        ));

        let config = TarDirConfig {
            directory: Some("./..".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_in(td.path()),
            Err(ConfigError::DirectoryNotFound(name)) if name.is_empty()
        ));
    }

    #[test]
    fn test_resolve_plain_file() {
        let td = tempfile::tempdir().unwrap();
        std::fs::write(td.path().join("notes"), b"not a directory").unwrap();
        let config = TarDirConfig {
            directory: Some("notes".to_string()),
            ..Default::default()
        };
        assert!(config.resolve_in(td.path()).is_err());
    }
}
