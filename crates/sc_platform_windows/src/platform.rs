use sc_capture::{CaptureError, CapturePlatform, CaptureRect, CaptureResult};

use crate::clipboard;
use crate::gdi::GdiBitmap;
use crate::selection_window;
use crate::system::virtual_screen_rect;

/// GDI-backed capture services for the current desktop session.
#[derive(Debug, Default)]
pub struct WindowsPlatform;

impl WindowsPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl CapturePlatform for WindowsPlatform {
    type Bitmap = GdiBitmap;

    fn virtual_screen(&self) -> CaptureResult<CaptureRect> {
        virtual_screen_rect()
    }

    fn select_region(&mut self) -> CaptureResult<Option<CaptureRect>> {
        selection_window::select_region()
    }

    fn capture(&mut self, rect: CaptureRect) -> CaptureResult<GdiBitmap> {
        GdiBitmap::capture(rect)
    }

    fn publish_to_clipboard(&mut self, bitmap: GdiBitmap) -> CaptureResult<()> {
        clipboard::publish_bitmap(bitmap)
            .map_err(|e| CaptureError::ClipboardUnavailable(e.to_string()))
    }
}
