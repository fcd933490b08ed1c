//! The capture platform for the current target.

#[cfg(windows)]
pub type NativePlatform = sc_platform_windows::WindowsPlatform;

#[cfg(not(windows))]
pub type NativePlatform = unsupported::UnsupportedPlatform;

pub fn native() -> NativePlatform {
    NativePlatform::default()
}

#[cfg(not(windows))]
mod unsupported {
    use sc_capture::{CaptureError, CapturePlatform, CaptureRect, CaptureResult, MemoryBitmap};

    const UNSUPPORTED: &str = "screen capture is not supported on this platform";

    /// Builds everywhere; every screen operation fails.
    #[derive(Debug, Default)]
    pub struct UnsupportedPlatform;

    impl CapturePlatform for UnsupportedPlatform {
        type Bitmap = MemoryBitmap;

        fn virtual_screen(&self) -> CaptureResult<CaptureRect> {
            Err(CaptureError::CaptureFailed(UNSUPPORTED.into()))
        }

        fn select_region(&mut self) -> CaptureResult<Option<CaptureRect>> {
            Err(CaptureError::CaptureFailed(UNSUPPORTED.into()))
        }

        fn capture(&mut self, _rect: CaptureRect) -> CaptureResult<MemoryBitmap> {
            Err(CaptureError::CaptureFailed(UNSUPPORTED.into()))
        }

        fn publish_to_clipboard(&mut self, _bitmap: MemoryBitmap) -> CaptureResult<()> {
            Err(CaptureError::ClipboardUnavailable(UNSUPPORTED.into()))
        }
    }

}
