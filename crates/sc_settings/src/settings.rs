use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::defaults::*;

/// Deflate effort used for PNG output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Fast,
    #[default]
    Default,
    Best,
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    // PNG encoder
    #[serde(default = "default_png_compression")]
    pub png_compression: CompressionLevel,
    /// Largest IDAT payload written per chunk.
    #[serde(default = "default_png_idat_chunk_size")]
    pub png_idat_chunk_size: usize,

    /// `tracing` filter directive used when `BOXCUTTER_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default = "default_print_coords")]
    pub print_coords: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            png_compression: default_png_compression(),
            png_idat_chunk_size: default_png_idat_chunk_size(),
            log_filter: default_log_filter(),
            print_coords: default_print_coords(),
        }
    }
}

/// Where the loaded settings came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    File(PathBuf),
    Defaults,
}

/// Result of [`Settings::load`]. Loading never fails; problems are kept so
/// the caller can log them once logging is up.
#[derive(Debug)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub source: SettingsSource,
    pub fallback_reason: Option<anyhow::Error>,
}

impl Settings {
    /// Settings file location: `BOXCUTTER_CONFIG` if set, otherwise
    /// `<config dir>/boxcutter/settings.json`.
    pub fn settings_path() -> Option<PathBuf> {
        Self::settings_path_with(std::env::var_os(CONFIG_ENV_VAR))
    }

    fn settings_path_with(explicit: Option<OsString>) -> Option<PathBuf> {
        if let Some(path) = explicit.filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        directories::ProjectDirs::from("", "", APPLICATION_NAME)
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE_NAME))
    }

    /// Load settings from disk.
    ///
    /// Falls back to defaults if the file is missing or invalid. Never writes.
    pub fn load() -> LoadedSettings {
        match Self::settings_path() {
            Some(path) => Self::load_or_default(&path),
            None => LoadedSettings {
                settings: Self::default(),
                source: SettingsSource::Defaults,
                fallback_reason: Some(anyhow::anyhow!(
                    "could not determine the user configuration directory"
                )),
            },
        }
    }

    pub fn load_or_default(path: &Path) -> LoadedSettings {
        match Self::load_from(path) {
            Ok(Some(settings)) => LoadedSettings {
                settings,
                source: SettingsSource::File(path.to_path_buf()),
                fallback_reason: None,
            },
            Ok(None) => LoadedSettings {
                settings: Self::default(),
                source: SettingsSource::Defaults,
                fallback_reason: None,
            },
            Err(e) => LoadedSettings {
                settings: Self::default(),
                source: SettingsSource::Defaults,
                fallback_reason: Some(e),
            },
        }
    }

    /// Read and validate one settings file. `Ok(None)` if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };

        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("validating {}", path.display()))?;
        Ok(Some(settings))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.png_idat_chunk_size == 0 {
            anyhow::bail!("png_idat_chunk_size must be at least 1");
        }
        if u32::try_from(self.png_idat_chunk_size).is_err() {
            anyhow::bail!("png_idat_chunk_size must fit in a PNG chunk length");
        }
        Ok(())
    }
}
