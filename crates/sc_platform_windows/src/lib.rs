#![cfg(target_os = "windows")]

pub mod clipboard;
pub mod gdi;
mod platform;
pub mod resources;
pub mod selection_window;
pub mod system;
pub mod win_api;

pub use gdi::GdiBitmap;
pub use platform::WindowsPlatform;
pub use resources::{ManagedBitmap, ManagedDC, ScreenDc};
