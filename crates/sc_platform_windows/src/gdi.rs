// Windows GDI capture helpers
//
// Copy a screen rectangle into an owned bitmap and read it back as a
// device-independent bitmap for the encoders.

use std::ffi::c_void;
use std::mem::size_of;

use sc_capture::descriptor::COLOR_TABLE_ENTRY_SIZE;
use sc_capture::{
    BitmapDescriptor, BitmapGeometry, CaptureError, CaptureRect, CaptureResult, DibPixels,
    PixelSource, RgbQuad, try_alloc_zeroed,
};
use tracing::debug;
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAP, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CreateCompatibleBitmap,
    CreateCompatibleDC, DIB_RGB_COLORS, GetDIBits, GetObjectW, HBITMAP, SRCCOPY,
};

use crate::resources::{ManagedBitmap, ManagedDC, ScreenDc, SelectedObject};

/// A captured screen region, owned until dropped or handed to the clipboard.
#[derive(Debug)]
pub struct GdiBitmap {
    bitmap: ManagedBitmap,
}

impl GdiBitmap {
    /// Copy the screen pixels inside `rect` (normalized, non-empty).
    pub fn capture(rect: CaptureRect) -> CaptureResult<Self> {
        let too_large = || CaptureError::CaptureFailed(format!("region {rect} is too large"));
        let width = i32::try_from(rect.width()).map_err(|_| too_large())?;
        let height = i32::try_from(rect.height()).map_err(|_| too_large())?;

        let screen = ScreenDc::acquire()
            .ok_or_else(|| CaptureError::CaptureFailed("GetDC failed".into()))?;

        // SAFETY: screen DC 在本函数内有效。
        let mem_dc = ManagedDC::new(unsafe { CreateCompatibleDC(Some(screen.handle())) });
        if !mem_dc.is_valid() {
            return Err(CaptureError::CaptureFailed("CreateCompatibleDC failed".into()));
        }

        // SAFETY: 同上；返回的位图由 ManagedBitmap 接管。
        let bitmap =
            ManagedBitmap::new(unsafe { CreateCompatibleBitmap(screen.handle(), width, height) });
        if !bitmap.is_valid() {
            return Err(CaptureError::CaptureFailed(format!(
                "CreateCompatibleBitmap failed for {width}x{height}"
            )));
        }

        {
            // The bitmap is deselected before it can be read back or deleted.
            let _selected = SelectedObject::new(mem_dc.handle(), bitmap.handle().into());
            // SAFETY: 两个 DC 都有效，位图已选入 mem_dc。
            unsafe {
                BitBlt(
                    mem_dc.handle(),
                    0,
                    0,
                    width,
                    height,
                    Some(screen.handle()),
                    rect.left,
                    rect.top,
                    SRCCOPY,
                )
            }
            .map_err(|e| CaptureError::CaptureFailed(format!("BitBlt failed: {e}")))?;
        }

        debug!(%rect, "screen region copied");
        Ok(Self { bitmap })
    }

    pub fn handle(&self) -> HBITMAP {
        self.bitmap.handle()
    }

    /// Give up ownership, e.g. after the clipboard accepted the bitmap.
    pub fn into_handle(self) -> HBITMAP {
        self.bitmap.into_inner()
    }
}

impl PixelSource for GdiBitmap {
    fn geometry(&self) -> CaptureResult<BitmapGeometry> {
        let mut bm = BITMAP::default();
        // SAFETY: bm 是大小正确的可写缓冲区。
        let written = unsafe {
            GetObjectW(
                self.bitmap.handle().into(),
                size_of::<BITMAP>() as i32,
                Some((&mut bm as *mut BITMAP).cast::<c_void>()),
            )
        };
        if written == 0 {
            return Err(CaptureError::GeometryQueryFailed(
                "GetObject returned no bitmap data".into(),
            ));
        }

        Ok(BitmapGeometry {
            width: bm.bmWidth,
            height: bm.bmHeight,
            planes: bm.bmPlanes,
            bits_per_pixel: bm.bmBitsPixel,
        })
    }

    fn read_pixels(&self, descriptor: &BitmapDescriptor) -> CaptureResult<DibPixels> {
        let entries = descriptor.color_table_entries as usize;

        // BITMAPINFO with room for the full color table, kept DWORD aligned.
        let header_words = size_of::<BITMAPINFOHEADER>() / 4;
        let mut info = vec![0u32; header_words + entries * COLOR_TABLE_ENTRY_SIZE / 4];
        let header = BITMAPINFOHEADER {
            biSize: size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: descriptor.width as i32,
            biHeight: descriptor.height as i32,
            biPlanes: 1,
            biBitCount: descriptor.depth.bits(),
            biCompression: BI_RGB.0,
            biSizeImage: u32::try_from(descriptor.image_byte_size).unwrap_or(0),
            biXPelsPerMeter: 0,
            biYPelsPerMeter: 0,
            biClrUsed: descriptor.color_table_entries,
            biClrImportant: 0,
        };
        // SAFETY: info 至少有 BITMAPINFOHEADER 大小且按 4 字节对齐。
        unsafe {
            std::ptr::write(info.as_mut_ptr().cast::<BITMAPINFOHEADER>(), header);
        }

        let mut bits = try_alloc_zeroed("pixel buffer", descriptor.image_byte_size)?;

        let screen = ScreenDc::acquire()
            .ok_or_else(|| CaptureError::PixelRetrievalFailed("GetDC failed".into()))?;
        // SAFETY: bits 能容纳 height 行；info 能容纳头部和整个颜色表。
        let lines = unsafe {
            GetDIBits(
                screen.handle(),
                self.bitmap.handle(),
                0,
                descriptor.height,
                Some(bits.as_mut_ptr().cast::<c_void>()),
                info.as_mut_ptr().cast::<BITMAPINFO>(),
                DIB_RGB_COLORS,
            )
        };
        if lines == 0 {
            return Err(CaptureError::PixelRetrievalFailed(format!(
                "GetDIBits returned no scanlines for {}x{} at {} bpp",
                descriptor.width,
                descriptor.height,
                descriptor.depth.bits()
            )));
        }

        let color_table: Vec<RgbQuad> = info[header_words..]
            .iter()
            .map(|quad| quad.to_le_bytes())
            .collect();

        Ok(DibPixels { color_table, bits })
    }
}
