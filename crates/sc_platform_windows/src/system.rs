use sc_capture::{CaptureError, CaptureRect, CaptureResult};
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
    SM_YVIRTUALSCREEN,
};

/// 获取虚拟屏幕（所有显示器的外接矩形）
pub fn virtual_screen_rect() -> CaptureResult<CaptureRect> {
    // SAFETY: GetSystemMetrics 是线程安全的只读 API。
    let (x, y, cx, cy) = unsafe {
        (
            GetSystemMetrics(SM_XVIRTUALSCREEN),
            GetSystemMetrics(SM_YVIRTUALSCREEN),
            GetSystemMetrics(SM_CXVIRTUALSCREEN),
            GetSystemMetrics(SM_CYVIRTUALSCREEN),
        )
    };

    if cx <= 0 || cy <= 0 {
        return Err(CaptureError::CaptureFailed(
            "virtual screen metrics are unavailable".into(),
        ));
    }

    // Width and height are extents, not the far corner.
    Ok(CaptureRect::new(
        x,
        y,
        x.saturating_add(cx),
        y.saturating_add(cy),
    ))
}
