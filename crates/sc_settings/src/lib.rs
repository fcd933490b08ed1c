pub mod defaults;
pub mod settings;

pub use settings::{CompressionLevel, LoadedSettings, Settings, SettingsSource};
