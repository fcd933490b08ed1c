//! Full-screen overlay that lets the user drag out a capture rectangle.
//!
//! The window proc reaches its [`SelectionContext`] through `GWLP_USERDATA`;
//! the context lives on the stack of [`select_region`] for the whole message
//! loop.

use std::ffi::c_void;

use sc_capture::{CaptureError, CaptureRect, CaptureResult, DragSelection, ScreenPoint};
use tracing::debug;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::{CreateDCW, R2_NOTXORPEN, Rectangle, SetROP2};
use windows::Win32::UI::Input::KeyboardAndMouse::VK_ESCAPE;
use windows::Win32::UI::WindowsAndMessaging::{
    CREATESTRUCTW, WM_CLOSE, WM_CREATE, WM_DESTROY, WM_KEYDOWN, WM_LBUTTONDOWN, WM_LBUTTONUP,
    WM_MOUSEMOVE, WM_NCDESTROY, WNDCLASSW,
};
use windows::core::{PCWSTR, w};

use crate::resources::ManagedDC;
use crate::system::virtual_screen_rect;
use crate::win_api;

const WINDOW_CLASS_NAME: &str = "sc_boxcutter_selection";

struct SelectionContext {
    selection: DragSelection,
}

impl SelectionContext {
    fn cursor() -> Option<ScreenPoint> {
        win_api::cursor_pos().map(|pt| ScreenPoint::new(pt.x, pt.y))
    }

    fn on_button_down(&mut self, hwnd: HWND) {
        if let Some(at) = Self::cursor() {
            win_api::capture_mouse(hwnd);
            self.selection.press(at);
        }
    }

    fn on_mouse_move(&mut self) {
        let Some(at) = Self::cursor() else {
            return;
        };
        if let Some(band) = self.selection.move_to(at) {
            if let Some(old) = band.erase {
                xor_outline(old);
            }
            xor_outline(band.draw);
        }
    }

    fn on_button_up(&mut self) {
        win_api::release_mouse();
        if let Some(drawn) = self.selection.release() {
            xor_outline(drawn);
        }
    }

    fn on_cancel(&mut self) {
        win_api::release_mouse();
        if let Some(drawn) = self.selection.cancel() {
            xor_outline(drawn);
        }
    }
}

/// 在桌面上以 XOR 方式画矩形边框；同一矩形画两次即可擦除。
fn xor_outline(rect: CaptureRect) {
    // SAFETY: "DISPLAY" 是有效的驱动名，返回的 DC 由 ManagedDC 释放。
    let dc = ManagedDC::new(unsafe {
        CreateDCW(w!("DISPLAY"), PCWSTR::null(), PCWSTR::null(), None)
    });
    if !dc.is_valid() {
        return;
    }
    // SAFETY: dc 在本函数内有效。默认画刷为白色，XOR 后内部不变。
    unsafe {
        SetROP2(dc.handle(), R2_NOTXORPEN);
        let _ = Rectangle(dc.handle(), rect.left, rect.top, rect.right, rect.bottom);
    }
}

/// Show the overlay and block until the button is released or the window
/// is closed. Escape cancels.
pub fn select_region() -> CaptureResult<Option<CaptureRect>> {
    let screen = virtual_screen_rect()?;
    let failed = |what: &str, e: windows::core::Error| {
        CaptureError::CaptureFailed(format!("selection window: {what} failed: {e}"))
    };

    let instance = win_api::get_module_handle().map_err(|e| failed("GetModuleHandle", e))?;
    let class_name = win_api::to_wide_chars(WINDOW_CLASS_NAME);
    let window_class = WNDCLASSW {
        lpfnWndProc: Some(window_proc),
        hInstance: instance.into(),
        lpszClassName: PCWSTR(class_name.as_ptr()),
        hCursor: win_api::load_cursor_cross().map_err(|e| failed("LoadCursor", e))?,
        ..Default::default()
    };
    win_api::register_class(&window_class);

    let mut context = SelectionContext {
        selection: DragSelection::new(),
    };

    let hwnd = win_api::create_overlay_popup(
        instance,
        PCWSTR(class_name.as_ptr()),
        screen.left,
        screen.top,
        screen.width() as i32,
        screen.height() as i32,
        Some((&mut context as *mut SelectionContext).cast::<c_void>() as *const c_void),
    )
    .map_err(|e| failed("CreateWindowEx", e))?;

    let _ = win_api::show_window(hwnd);
    win_api::run_message_loop();

    let outcome = context.selection.outcome();
    debug!(?outcome, "selection finished");
    Ok(outcome)
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_CREATE {
        // SAFETY: WM_CREATE 的 lparam 指向 CREATESTRUCTW。
        let create_struct = unsafe { &*(lparam.0 as *const CREATESTRUCTW) };
        if create_struct.lpCreateParams.is_null() {
            return LRESULT(-1);
        }
        win_api::set_window_user_data(hwnd, create_struct.lpCreateParams as isize);
        return LRESULT(0);
    }

    let ptr = win_api::get_window_user_data(hwnd) as *mut SelectionContext;
    if ptr.is_null() {
        return win_api::def_window_proc(hwnd, msg, wparam, lparam);
    }
    // SAFETY: 上下文在 select_region 的消息循环结束前一直有效，
    // WM_NCDESTROY 时清除指针。
    let context = unsafe { &mut *ptr };

    match msg {
        WM_LBUTTONDOWN => {
            context.on_button_down(hwnd);
            LRESULT(0)
        }
        WM_MOUSEMOVE => {
            context.on_mouse_move();
            LRESULT(0)
        }
        WM_LBUTTONUP => {
            context.on_button_up();
            let _ = win_api::destroy_window(hwnd);
            LRESULT(0)
        }
        WM_KEYDOWN if wparam.0 == usize::from(VK_ESCAPE.0) => {
            context.on_cancel();
            let _ = win_api::destroy_window(hwnd);
            LRESULT(0)
        }
        WM_CLOSE => {
            context.on_cancel();
            win_api::def_window_proc(hwnd, msg, wparam, lparam)
        }
        WM_DESTROY => {
            win_api::quit_message_loop(0);
            LRESULT(0)
        }
        WM_NCDESTROY => {
            win_api::set_window_user_data(hwnd, 0);
            win_api::def_window_proc(hwnd, msg, wparam, lparam)
        }
        _ => win_api::def_window_proc(hwnd, msg, wparam, lparam),
    }
}
