/// Editor configuration: load, save and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snapshots kept in the undo history (minimum 1).
    pub max_history_states: usize,
    /// Inserted images wider than this are scaled down (minimum 50).
    pub max_image_width: u32,
    /// Pixel height of one caption line when sizing exported figures.
    pub caption_line_height: u32,
    /// Text of a code block inserted without a selection.
    pub code_placeholder: String,
    /// Alt text for freshly inserted images.
    pub inserted_image_alt: String,
    /// Draft database location. Empty = `drafts.redb` in the user data dir.
    pub draft_db_path: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history_states: 50,
            max_image_width: 1200,
            caption_line_height: 20,
            code_placeholder: "Your code here".to_string(),
            inserted_image_alt: "Inserted image".to_string(),
            draft_db_path: String::new(),
        }
    }
}

impl EditorConfig {
    /// Returns the config file path: exe directory + `rich-pad.json`.
    pub fn config_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.join("rich-pad.json")))
            .unwrap_or_else(|| PathBuf::from("rich-pad.json"))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (missing file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<EditorConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Don't overwrite a broken file.
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Clamps values to valid ranges and resets blank text fields.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        self.max_history_states = self.max_history_states.max(1);
        self.max_image_width = self.max_image_width.max(50);
        self.caption_line_height = self.caption_line_height.min(200);
        if self.code_placeholder.trim().is_empty() {
            self.code_placeholder = defaults.code_placeholder;
        }
        if self.inserted_image_alt.trim().is_empty() {
            self.inserted_image_alt = defaults.inserted_image_alt;
        }
    }

    /// Resolves where the draft database lives.
    ///
    /// Resolution order:
    /// 1. `draft_db_path` (if non-empty)
    /// 2. `rich-pad/drafts.redb` under the user's data directory
    /// 3. `drafts.redb` in the working directory
    pub fn resolve_draft_db_path(&self) -> PathBuf {
        if !self.draft_db_path.is_empty() {
            return PathBuf::from(&self.draft_db_path);
        }
        dirs::data_dir()
            .map(|d| d.join("rich-pad").join("drafts.redb"))
            .unwrap_or_else(|| PathBuf::from("drafts.redb"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.max_history_states, 50);
        assert_eq!(config.max_image_width, 1200);
        assert_eq!(config.caption_line_height, 20);
        assert_eq!(config.code_placeholder, "Your code here");
        assert_eq!(config.inserted_image_alt, "Inserted image");
        assert!(config.draft_db_path.is_empty());
    }

    #[test]
    fn test_sanitize_clamps_values() {
        let mut config = EditorConfig {
            max_history_states: 0,
            max_image_width: 10,
            caption_line_height: 10_000,
            ..EditorConfig::default()
        };
        config.sanitize();
        assert_eq!(config.max_history_states, 1);
        assert_eq!(config.max_image_width, 50);
        assert_eq!(config.caption_line_height, 200);
    }

    #[test]
    fn test_sanitize_restores_blank_text() {
        let mut config = EditorConfig {
            code_placeholder: "   ".to_string(),
            inserted_image_alt: String::new(),
            ..EditorConfig::default()
        };
        config.sanitize();
        assert_eq!(config.code_placeholder, "Your code here");
        assert_eq!(config.inserted_image_alt, "Inserted image");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"max_history_states": 7}"#).unwrap();
        assert_eq!(config.max_history_states, 7);
        assert_eq!(config.max_image_width, 1200);
    }

    #[test]
    fn test_explicit_draft_path_wins() {
        let config = EditorConfig {
            draft_db_path: "/tmp/custom.redb".to_string(),
            ..EditorConfig::default()
        };
        assert_eq!(
            config.resolve_draft_db_path(),
            PathBuf::from("/tmp/custom.redb")
        );
    }

    #[test]
    fn test_default_draft_path_file_name() {
        let path = EditorConfig::default().resolve_draft_db_path();
        assert_eq!(path.file_name().unwrap(), "drafts.redb");
    }

    #[test]
    fn test_serde_round_trip() {
        let config = EditorConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: EditorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
