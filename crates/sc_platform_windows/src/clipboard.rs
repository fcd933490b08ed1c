use std::fmt;

use tracing::debug;
use windows::Win32::Foundation::{HANDLE, HWND};
use windows::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, OpenClipboard, SetClipboardData,
};

use crate::gdi::GdiBitmap;

/// Standard clipboard format for a device-dependent bitmap handle.
const CF_BITMAP: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardError {
    OpenClipboardFailed,
    EmptyClipboardFailed,
    SetClipboardDataFailed,
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::OpenClipboardFailed => write!(f, "could not open clipboard"),
            ClipboardError::EmptyClipboardFailed => write!(f, "could not empty clipboard"),
            ClipboardError::SetClipboardDataFailed => write!(f, "clipboard rejected the bitmap"),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// 剪贴板打开期间持有，离开作用域时 `CloseClipboard`。
struct OpenedClipboard;

impl OpenedClipboard {
    fn open() -> Result<Self, ClipboardError> {
        // SAFETY: 不关联窗口打开剪贴板；成功后由 Drop 关闭。
        unsafe { OpenClipboard(Some(HWND(std::ptr::null_mut()))) }
            .map(|()| OpenedClipboard)
            .map_err(|_| ClipboardError::OpenClipboardFailed)
    }
}

impl Drop for OpenedClipboard {
    fn drop(&mut self) {
        // SAFETY: 仅在 open() 成功后存在。
        unsafe {
            let _ = CloseClipboard();
        }
    }
}

/// 将位图放入剪贴板（CF_BITMAP）
///
/// On success the clipboard owns the bitmap. On failure the bitmap is
/// dropped here and its handle deleted.
pub fn publish_bitmap(bitmap: GdiBitmap) -> Result<(), ClipboardError> {
    let _clipboard = OpenedClipboard::open()?;

    // SAFETY: 剪贴板已打开。
    unsafe { EmptyClipboard() }.map_err(|_| ClipboardError::EmptyClipboardFailed)?;

    // SAFETY: 句柄有效且未选入任何 DC；成功后所有权归系统。
    unsafe { SetClipboardData(CF_BITMAP, Some(HANDLE(bitmap.handle().0))) }
        .map_err(|_| ClipboardError::SetClipboardDataFailed)?;

    let _ = bitmap.into_handle();
    debug!("bitmap handed to clipboard");
    Ok(())
}
