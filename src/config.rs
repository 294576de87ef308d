//! Configuration types for archived-or-not

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identity attached to every check request.
///
/// Carried as the `user` / `password` request headers, never embedded in
/// the URL, where it would leak into logs and proxies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name for the archive service
    pub username: String,
    /// Account password for the archive service
    pub password: String,
}

/// Which export files a completed run writes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// No export
    #[default]
    None,
    /// JSON report only
    Json,
    /// Spreadsheet only
    Excel,
    /// Both JSON and spreadsheet
    Both,
}

impl OutputMode {
    /// Whether this mode writes the JSON report.
    pub fn wants_json(&self) -> bool {
        matches!(self, OutputMode::Json | OutputMode::Both)
    }

    /// Whether this mode writes the spreadsheet.
    pub fn wants_excel(&self) -> bool {
        matches!(self, OutputMode::Excel | OutputMode::Both)
    }
}

/// Configuration for one batch run
///
/// Constructed by the external caller, validated once, then immutable for
/// the lifetime of the run (the dispatcher holds it in an `Arc`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory tree to check (must exist)
    pub root: PathBuf,

    /// Descend into subdirectories (default: root's immediate files only)
    #[serde(default)]
    pub recursive: bool,

    /// Drop a found location that equals the file's own source path
    #[serde(default)]
    pub exclude_source: bool,

    /// Emit per-file status only for files the archive does not hold
    #[serde(default)]
    pub only_missing_files: bool,

    /// Export files to write once the run completes
    #[serde(default)]
    pub output: OutputMode,

    /// Directory for export files; falls back to the current working
    /// directory when absent or not an existing directory
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Files larger than this are skipped, never uploaded (default: 1000)
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Full URL of the archive-check endpoint
    /// (e.g. `https://host/api/archived_or_not`)
    pub endpoint: String,

    /// Identity attached to every request
    pub credentials: Credentials,

    /// Network-share prefix substituted onto every returned location
    #[serde(default = "default_share_root")]
    pub share_root: String,

    /// Append a structured record for every decision point to a debug log
    /// file next to the exports
    #[serde(default)]
    pub debug_log: bool,
}

fn default_max_file_size_mb() -> u64 {
    1000
}

fn default_share_root() -> String {
    r"N:\PPDO\Records".to_string()
}

impl RunConfig {
    /// Validate the start parameters. Called before any work begins; a
    /// failure here means no partial state was created.
    pub fn validate(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(Error::Validation(format!(
                "'{}' is not an existing directory",
                self.root.display()
            )));
        }

        let url = url::Url::parse(&self.endpoint).map_err(|e| Error::Config {
            message: format!("invalid endpoint URL '{}': {}", self.endpoint, e),
            key: Some("endpoint".to_string()),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!("endpoint must be http or https, got '{}'", url.scheme()),
                key: Some("endpoint".to_string()),
            });
        }

        if self.max_file_size_mb == 0 {
            return Err(Error::Config {
                message: "max_file_size_mb must be at least 1".to_string(),
                key: Some("max_file_size_mb".to_string()),
            });
        }

        Ok(())
    }

    /// The directory export and debug-log files land in: the configured
    /// output directory when it is an existing directory, else the current
    /// working directory.
    pub fn effective_output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir
            && dir.is_dir()
        {
            return dir.clone();
        }
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_with_root(root: PathBuf) -> RunConfig {
        RunConfig {
            root,
            recursive: false,
            exclude_source: false,
            only_missing_files: false,
            output: OutputMode::None,
            output_dir: None,
            max_file_size_mb: 1000,
            endpoint: "https://archive.example.edu/api/archived_or_not".to_string(),
            credentials: Credentials {
                username: "svc".to_string(),
                password: "hunter2".to_string(),
            },
            share_root: default_share_root(),
            debug_log: false,
        }
    }

    #[test]
    fn validate_rejects_missing_root() {
        let config = config_with_root(PathBuf::from("/definitely/not/a/directory"));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("not an existing directory"));
    }

    #[test]
    fn validate_rejects_file_as_root() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();

        let config = config_with_root(file);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_endpoint() {
        let dir = tempdir().unwrap();
        let mut config = config_with_root(dir.path().to_path_buf());
        config.endpoint = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        config.endpoint = "ftp://archive.example.edu/api".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn validate_accepts_existing_directory() {
        let dir = tempdir().unwrap();
        let config = config_with_root(dir.path().to_path_buf());
        config.validate().unwrap();
    }

    #[test]
    fn effective_output_dir_uses_valid_directory() {
        let root = tempdir().unwrap();
        let out = tempdir().unwrap();
        let mut config = config_with_root(root.path().to_path_buf());
        config.output_dir = Some(out.path().to_path_buf());
        assert_eq!(config.effective_output_dir(), out.path());
    }

    #[test]
    fn effective_output_dir_falls_back_to_cwd() {
        let root = tempdir().unwrap();
        let mut config = config_with_root(root.path().to_path_buf());
        config.output_dir = Some(PathBuf::from("/no/such/output/dir"));
        assert_eq!(
            config.effective_output_dir(),
            std::env::current_dir().unwrap()
        );
    }

    #[test]
    fn serde_defaults_fill_optional_fields() {
        let json = r#"{
            "root": "/tmp",
            "endpoint": "https://archive.example.edu/api/archived_or_not",
            "credentials": {"username": "svc", "password": "pw"}
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert!(!config.recursive);
        assert_eq!(config.output, OutputMode::None);
        assert_eq!(config.max_file_size_mb, 1000);
        assert_eq!(config.share_root, r"N:\PPDO\Records");
        assert!(!config.debug_log);
    }
}
