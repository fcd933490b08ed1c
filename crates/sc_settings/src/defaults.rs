use crate::settings::CompressionLevel;

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV_VAR: &str = "BOXCUTTER_CONFIG";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const APPLICATION_NAME: &str = "boxcutter";

// PNG defaults
pub fn default_png_compression() -> CompressionLevel {
    CompressionLevel::Default
}

pub fn default_png_idat_chunk_size() -> usize {
    64 * 1024
}

// Logging defaults
pub fn default_log_filter() -> String {
    "warn".to_string()
}

// Report defaults
pub fn default_print_coords() -> bool {
    true
}
