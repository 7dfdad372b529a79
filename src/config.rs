use crate::error::{Result as SnapResult, SnapshotError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default directory parse results are written to
pub const DEFAULT_OUTPUT_DIR: &str = ".parsed";

/// Runtime settings, read from an optional JSON file
///
/// Missing keys fall back to their defaults, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnapshotConfig {
    /// Number of contributors kept in a snapshot
    pub top_contributors: usize,
    /// Number of paths reported by the most-active-files view
    pub most_active_files: usize,
    pub output_dir: PathBuf,
    /// Skip paths matched by the root `.gitignore` when listing artifacts
    pub respect_gitignore: bool,
    /// Persist every result as `parser_<kind>.json`
    pub save_results: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            top_contributors: 5,
            most_active_files: 10,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            respect_gitignore: true,
            save_results: true,
        }
    }
}

impl SnapshotConfig {
    /// Load settings from `path`, or the defaults when no file is given
    ///
    /// # Errors
    /// Returns SnapshotError::Config when the file cannot be read or parsed
    pub fn load(path: Option<&Path>) -> SnapResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| SnapshotError::Config(format!("Failed to read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            SnapshotError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    /// Where the result for `kind` is persisted
    pub fn output_file(&self, kind: &str) -> PathBuf {
        self.output_dir.join(format!("parser_{kind}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_keys_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projscan.json");
        fs::write(&path, r#"{"topContributors": 3, "saveResults": false}"#).unwrap();

        let config = SnapshotConfig::load(Some(&path)).unwrap();
        assert_eq!(config.top_contributors, 3);
        assert!(!config.save_results);
        assert_eq!(config.most_active_files, 10);
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn no_file_means_defaults() {
        assert_eq!(SnapshotConfig::load(None).unwrap(), SnapshotConfig::default());
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            SnapshotConfig::load(Some(&path)),
            Err(SnapshotError::Config(_))
        ));
        assert!(matches!(
            SnapshotConfig::load(Some(&dir.path().join("absent.json"))),
            Err(SnapshotError::Config(_))
        ));
    }

    #[test]
    fn output_file_is_named_after_the_kind() {
        let config = SnapshotConfig::default();
        assert_eq!(config.output_file("git"), PathBuf::from(".parsed/parser_git.json"));
    }
}
