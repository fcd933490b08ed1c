//! Windows GDI 资源的 RAII 封装
//!
//! 每个句柄在离开作用域时自动释放，错误路径上也不会泄漏。

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    DeleteDC, DeleteObject, GetDC, HBITMAP, HDC, HGDIOBJ, ReleaseDC, SelectObject,
};

/// HBITMAP 的 RAII 封装
///
/// 离开作用域时调用 `DeleteObject`。交给剪贴板时用 [`ManagedBitmap::into_inner`]
/// 放弃所有权。
#[derive(Debug)]
pub struct ManagedBitmap(HBITMAP);

impl ManagedBitmap {
    /// 调用者必须拥有 `bitmap` 的所有权。
    pub fn new(bitmap: HBITMAP) -> Self {
        Self(bitmap)
    }

    /// 获取内部句柄（不转移所有权）
    pub fn handle(&self) -> HBITMAP {
        self.0
    }

    /// 消费此封装并返回内部的 HBITMAP（转移所有权）
    pub fn into_inner(self) -> HBITMAP {
        let bitmap = self.0;
        std::mem::forget(self);
        bitmap
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_invalid()
    }
}

impl Drop for ManagedBitmap {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            // SAFETY: 句柄有效且归我们所有，且此时未被选入任何 DC。
            unsafe {
                let _ = DeleteObject(self.0.into());
            }
        }
    }
}

/// `CreateCompatibleDC` / `CreateDCW` 创建的 DC，离开作用域时 `DeleteDC`。
///
/// 不要用于 `GetDC` 返回的 DC，那些用 [`ScreenDc`]。
#[derive(Debug)]
pub struct ManagedDC(HDC);

impl ManagedDC {
    pub fn new(dc: HDC) -> Self {
        Self(dc)
    }

    pub fn handle(&self) -> HDC {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_invalid()
    }
}

impl Drop for ManagedDC {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            // SAFETY: DC 由 CreateCompatibleDC/CreateDCW 创建且归我们所有。
            unsafe {
                let _ = DeleteDC(self.0);
            }
        }
    }
}

/// 整个屏幕的 DC（`GetDC(NULL)`），离开作用域时 `ReleaseDC`。
#[derive(Debug)]
pub struct ScreenDc(HDC);

impl ScreenDc {
    /// Returns `None` if the system has no DC to give.
    pub fn acquire() -> Option<Self> {
        // SAFETY: GetDC(NULL) 只读取屏幕 DC，返回值在下面检查。
        let dc = unsafe { GetDC(None) };
        if dc.is_invalid() { None } else { Some(Self(dc)) }
    }

    pub fn handle(&self) -> HDC {
        self.0
    }
}

impl Drop for ScreenDc {
    fn drop(&mut self) {
        // SAFETY: self.0 来自 GetDC(NULL)，必须配对 ReleaseDC(NULL, ..)。
        unsafe {
            let _ = ReleaseDC(Some(HWND(std::ptr::null_mut())), self.0);
        }
    }
}

/// Keeps an object selected into a DC and restores the previous one on drop.
#[derive(Debug)]
pub struct SelectedObject {
    dc: HDC,
    previous: HGDIOBJ,
}

impl SelectedObject {
    pub fn new(dc: HDC, object: HGDIOBJ) -> Self {
        // SAFETY: dc 与 object 在 guard 的生命周期内都有效（调用者保证）。
        let previous = unsafe { SelectObject(dc, object) };
        Self { dc, previous }
    }
}

impl Drop for SelectedObject {
    fn drop(&mut self) {
        if !self.previous.is_invalid() {
            // SAFETY: 恢复原对象，使刚选入的位图可以被删除或交出。
            unsafe {
                SelectObject(self.dc, self.previous);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_bitmap_into_inner() {
        let invalid_bitmap = HBITMAP::default();
        let managed = ManagedBitmap::new(invalid_bitmap);
        assert!(!managed.is_valid());

        let raw = managed.into_inner();
        assert_eq!(raw, invalid_bitmap);
    }

    #[test]
    fn test_invalid_dc_is_not_deleted() {
        let managed = ManagedDC::new(HDC::default());
        assert!(!managed.is_valid());
    }
}
