use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the image-meta editor.
///
/// Controls which files the picker offers, whether originals are backed
/// up before writing, and which containers receive metadata.
///
/// # Loading
///
/// ```rust,no_run
/// use image_meta::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.output.backup_originals = false;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File types offered by the image picker.
    pub file_filter: FileFilter,
    /// Output behavior (backups).
    pub output: OutputConfig,
    /// Which metadata containers are written.
    pub writing: WriteConfig,
}

/// A named set of file extensions for the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFilter {
    pub name: String,
    /// Lowercase extensions without the leading dot.
    pub extensions: Vec<String>,
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// If `true`, create a `.bak` copy of an image before its first write.
    pub backup_originals: bool,
}

/// Controls which metadata containers receive edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    /// Also write description, author, and copyright to EXIF IFD0 (JPEG only).
    pub mirror_to_exif: bool,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            name: "Images".to_string(),
            extensions: ["jpg", "jpeg", "png", "gif", "tiff", "webp"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl FileFilter {
    /// Check whether a path's extension is in this filter (case-insensitive).
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            backup_originals: true,
        }
    }
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            mirror_to_exif: true,
        }
    }
}

impl Config {
    /// Resolve the config file path, in the same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_filter_matches_original_image_types() {
        let filter = FileFilter::default();
        assert_eq!(filter.name, "Images");
        assert_eq!(
            filter.extensions,
            vec!["jpg", "jpeg", "png", "gif", "tiff", "webp"]
        );
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let filter = FileFilter::default();
        assert!(filter.matches(Path::new("a.jpg")));
        assert!(filter.matches(Path::new("A.JPEG")));
        assert!(filter.matches(Path::new("/x/y.WebP")));
        assert!(!filter.matches(Path::new("doc.pdf")));
        assert!(!filter.matches(Path::new("noext")));
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(dir.path().join("missing.json").as_path())).unwrap();
        assert!(config.output.backup_originals);
        assert!(config.writing.mirror_to_exif);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.output.backup_originals = false;
        config.file_filter.extensions = vec!["jpg".into()];
        config.save(Some(path.as_path())).unwrap();

        let loaded = Config::load(Some(path.as_path())).unwrap();
        assert!(!loaded.output.backup_originals);
        assert_eq!(loaded.file_filter.extensions, vec!["jpg"]);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "output": { "backup_originals": false } }"#).unwrap();

        let loaded = Config::load(Some(path.as_path())).unwrap();
        assert!(!loaded.output.backup_originals);
        assert!(loaded.writing.mirror_to_exif);
        assert_eq!(loaded.file_filter, FileFilter::default());
    }

    #[test]
    fn partial_filter_keeps_default_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "file_filter": { "extensions": ["jpg"] } }"#).unwrap();

        let loaded = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(loaded.file_filter.name, "Images");
        assert_eq!(loaded.file_filter.extensions, vec!["jpg"]);
    }

    #[test]
    fn malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load(Some(path.as_path())).is_err());
    }
}
