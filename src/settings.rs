//! User preferences, stored in a `settings.toml` file
//!
//! # Sections
//!
//! - `[general]` - theme mode
//! - `[tail_page]` - global trailer image appended to every sequence
//! - `[output]` - page size, JPEG quality and margin
//! - `[paths]` - last directories used by the file dialogs
//!
//! # Path Resolution
//!
//! 1. `load_from_path()`/`save_to_path()` with an explicit path
//! 2. `MANGA_PDF_CONFIG_DIR` environment variable
//! 3. `dirs::config_dir()/manga-pdf`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::job::OutputSettings;
use crate::layout::PageSize;
use crate::pdf::DEFAULT_QUALITY;

const CONFIG_FILE: &str = "settings.toml";
const APP_DIR: &str = "manga-pdf";

/// Environment variable to override the config directory
pub const ENV_CONFIG_DIR: &str = "MANGA_PDF_CONFIG_DIR";

pub const MIN_QUALITY: u8 = 10;
pub const MAX_QUALITY: u8 = 100;
pub const MAX_MARGIN_MM: f32 = 50.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    pub const ALL: [ThemeMode; 3] = [ThemeMode::Light, ThemeMode::Dark, ThemeMode::System];
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ThemeMode::Light => "Light",
            ThemeMode::Dark => "Dark",
            ThemeMode::System => "System",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneralSettings {
    #[serde(default)]
    pub theme: ThemeMode,
}

/// Global trailer image
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TailPageSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputPreferences {
    #[serde(default)]
    pub page_size: PageSize,
    /// Values outside `MIN_QUALITY..=MAX_QUALITY`, even beyond `u8`, are
    /// clamped instead of rejecting the file
    #[serde(
        default = "default_quality",
        deserialize_with = "deserialize_quality"
    )]
    pub quality: u8,
    #[serde(default)]
    pub margin_mm: f32,
}

impl Default for OutputPreferences {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            quality: DEFAULT_QUALITY,
            margin_mm: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PathSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_open_directory: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_save_directory: Option<PathBuf>,
}

/// Application settings with logical sections
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub tail_page: TailPageSettings,
    #[serde(default)]
    pub output: OutputPreferences,
    #[serde(default)]
    pub paths: PathSettings,
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn deserialize_quality<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    let clamped = raw.clamp(i64::from(MIN_QUALITY), i64::from(MAX_QUALITY));
    Ok(u8::try_from(clamped).unwrap_or(DEFAULT_QUALITY))
}

impl Settings {
    /// Bring out-of-range values back into their allowed ranges
    pub fn clamp(&mut self) {
        self.output.quality = self.output.quality.clamp(MIN_QUALITY, MAX_QUALITY);
        self.output.margin_mm = if self.output.margin_mm.is_finite() {
            self.output.margin_mm.clamp(0.0, MAX_MARGIN_MM)
        } else {
            0.0
        };
    }

    /// The trailer to append when a sequence has none of its own
    ///
    /// Only returned while the tail page is enabled and the file still exists.
    pub fn default_trailer(&self) -> Option<&Path> {
        if !self.tail_page.enabled {
            return None;
        }
        self.tail_page
            .path
            .as_deref()
            .filter(|path| path.exists())
    }

    pub fn output_settings(&self, skip_unreadable: bool) -> OutputSettings {
        OutputSettings {
            page_size: self.output.page_size,
            quality: self.output.quality,
            margin_mm: self.output.margin_mm,
            skip_unreadable,
        }
    }
}

/// Directory holding `settings.toml`
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|dir| dir.join(APP_DIR))
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Loads the settings from the default path
///
/// Returns `(settings, warning)`. A missing file gives the defaults with no
/// warning; an unreadable one gives the defaults and a message for the user.
pub fn load() -> (Settings, Option<String>) {
    let Some(path) = config_path() else {
        return (Settings::default(), None);
    };
    if !path.exists() {
        return (Settings::default(), None);
    }
    match load_from_path(&path) {
        Ok(settings) => (settings, None),
        Err(e) => {
            warn!("Ignoring settings file {}: {}", path.display(), e);
            (
                Settings::default(),
                Some(format!("Settings could not be read and were reset: {e}")),
            )
        }
    }
}

pub fn load_from_path(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)?;
    let mut settings: Settings = toml::from_str(&content)?;
    settings.clamp();
    debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

pub fn save(settings: &Settings) -> Result<()> {
    let path = config_path()
        .ok_or_else(|| Error::Config("no configuration directory available".to_string()))?;
    save_to_path(settings, &path)
}

/// Write settings, creating the parent directory when needed
pub fn save_to_path(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(settings)?;
    fs::write(path, content)?;
    debug!("Saved settings to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut settings = Settings::default();
        settings.general.theme = ThemeMode::Dark;
        settings.tail_page.enabled = true;
        settings.tail_page.path = Some(PathBuf::from("/tmp/end.png"));
        settings.output.page_size = PageSize::A4;
        settings.output.quality = 75;
        settings.output.margin_mm = 12.5;
        settings.paths.last_open_directory = Some(PathBuf::from("/home/reader/scans"));

        save_to_path(&settings, &path).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let settings: Settings = toml::from_str("[general]\ntheme = \"light\"\n").unwrap();
        assert_eq!(settings.general.theme, ThemeMode::Light);
        assert_eq!(settings.output, OutputPreferences::default());
        assert!(!settings.tail_page.enabled);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[output]\nquality = 3\nmargin_mm = 80.0\n").unwrap();

        let settings = load_from_path(&path).unwrap();
        assert_eq!(settings.output.quality, MIN_QUALITY);
        assert_eq!(settings.output.margin_mm, MAX_MARGIN_MM);
    }

    #[test]
    fn test_quality_beyond_byte_range_keeps_other_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "[general]\ntheme = \"dark\"\n\n[output]\nquality = 300\n",
        )
        .unwrap();

        let settings = load_from_path(&path).unwrap();
        assert_eq!(settings.output.quality, MAX_QUALITY);
        assert_eq!(settings.general.theme, ThemeMode::Dark);

        fs::write(&path, "[output]\nquality = -5\n").unwrap();
        assert_eq!(load_from_path(&path).unwrap().output.quality, MIN_QUALITY);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[output]\npage_size = \"tabloid\"\n").unwrap();

        assert!(matches!(load_from_path(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_default_trailer_requires_enabled_and_existing() {
        let dir = TempDir::new().unwrap();
        let tail = dir.path().join("tail.png");

        let mut settings = Settings::default();
        settings.tail_page.path = Some(tail.clone());
        assert_eq!(settings.default_trailer(), None);

        settings.tail_page.enabled = true;
        assert_eq!(settings.default_trailer(), None);

        fs::write(&tail, b"png").unwrap();
        assert_eq!(settings.default_trailer(), Some(tail.as_path()));
    }
}
