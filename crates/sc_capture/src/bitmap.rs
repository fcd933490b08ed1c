//! The captured pixel buffer as seen by the encoders.

use crate::descriptor::{BitmapDescriptor, BitmapGeometry, ColorDepth};
use crate::error::{CaptureError, CaptureResult, try_alloc_zeroed};

/// One color table entry in device-independent order: blue, green, red, reserved.
pub type RgbQuad = [u8; 4];

/// Pixel array and color table read back from a captured bitmap.
///
/// `bits` holds `image_byte_size` bytes: bottom-up rows of `scanline_stride`
/// bytes, followed by zeroed slack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DibPixels {
    pub color_table: Vec<RgbQuad>,
    pub bits: Vec<u8>,
}

/// A captured bitmap that can report its geometry and hand out its pixels.
///
/// Implementors own their OS resources and release them on drop.
pub trait PixelSource {
    fn geometry(&self) -> CaptureResult<BitmapGeometry>;

    /// Copy the pixels out in the layout described by `descriptor`.
    fn read_pixels(&self, descriptor: &BitmapDescriptor) -> CaptureResult<DibPixels>;

    fn describe(&self) -> CaptureResult<BitmapDescriptor> {
        BitmapDescriptor::resolve(self.geometry()?)
    }
}

impl<T: PixelSource + ?Sized> PixelSource for &T {
    fn geometry(&self) -> CaptureResult<BitmapGeometry> {
        (**self).geometry()
    }

    fn read_pixels(&self, descriptor: &BitmapDescriptor) -> CaptureResult<DibPixels> {
        (**self).read_pixels(descriptor)
    }
}

/// Device-independent bitmap held in memory.
///
/// Used for synthetic frames and for library callers that already have pixels.
#[derive(Debug, Clone)]
pub struct MemoryBitmap {
    width: u32,
    height: u32,
    depth: ColorDepth,
    color_table: Vec<RgbQuad>,
    /// Bottom-up rows, DWORD aligned.
    rows: Vec<u8>,
}

impl MemoryBitmap {
    /// Wrap bottom-up, DWORD-aligned rows of the given depth.
    pub fn new(
        width: u32,
        height: u32,
        depth: ColorDepth,
        color_table: Vec<RgbQuad>,
        rows: Vec<u8>,
    ) -> CaptureResult<Self> {
        let descriptor = BitmapDescriptor::resolve(BitmapGeometry {
            width: i32::try_from(width).unwrap_or(-1),
            height: i32::try_from(height).unwrap_or(-1),
            planes: 1,
            bits_per_pixel: depth.bits(),
        })?;

        if rows.len() < descriptor.rows_byte_size() {
            return Err(CaptureError::PixelRetrievalFailed(format!(
                "expected {} bytes of rows, got {}",
                descriptor.rows_byte_size(),
                rows.len()
            )));
        }
        if color_table.len() > descriptor.color_table_entries as usize {
            return Err(CaptureError::PixelRetrievalFailed(format!(
                "color table has {} entries, {depth:?} allows {}",
                color_table.len(),
                descriptor.color_table_entries
            )));
        }

        Ok(Self {
            width,
            height,
            depth,
            color_table,
            rows,
        })
    }

    /// Build a direct-color bitmap from a per-pixel `[r, g, b]` function.
    ///
    /// `(x, y)` are measured from the top-left corner.
    pub fn from_rgb<F>(width: u32, height: u32, depth: ColorDepth, mut pixel: F) -> CaptureResult<Self>
    where
        F: FnMut(u32, u32) -> [u8; 3],
    {
        let bytes_per_pixel = match depth {
            ColorDepth::Bits24 => 3,
            ColorDepth::Bits32 => 4,
            other => {
                return Err(CaptureError::PixelRetrievalFailed(format!(
                    "from_rgb needs a direct color depth, got {other:?}"
                )));
            }
        };

        let stride = (width as usize * bytes_per_pixel).div_ceil(4) * 4;
        let mut rows = try_alloc_zeroed("memory bitmap", stride * height as usize)?;
        for y in 0..height {
            let row_start = (height - 1 - y) as usize * stride;
            for x in 0..width {
                let [r, g, b] = pixel(x, y);
                let at = row_start + x as usize * bytes_per_pixel;
                rows[at] = b;
                rows[at + 1] = g;
                rows[at + 2] = r;
            }
        }

        Self::new(width, height, depth, Vec::new(), rows)
    }

    #[inline]
    pub fn depth(&self) -> ColorDepth {
        self.depth
    }
}

impl PixelSource for MemoryBitmap {
    fn geometry(&self) -> CaptureResult<BitmapGeometry> {
        Ok(BitmapGeometry {
            width: self.width as i32,
            height: self.height as i32,
            planes: 1,
            bits_per_pixel: self.depth.bits(),
        })
    }

    fn read_pixels(&self, descriptor: &BitmapDescriptor) -> CaptureResult<DibPixels> {
        if descriptor.width != self.width
            || descriptor.height != self.height
            || descriptor.depth != self.depth
        {
            return Err(CaptureError::PixelRetrievalFailed(format!(
                "descriptor {}x{} {:?} does not match bitmap {}x{} {:?}",
                descriptor.width,
                descriptor.height,
                descriptor.depth,
                self.width,
                self.height,
                self.depth
            )));
        }

        let rows = descriptor.rows_byte_size();
        let mut bits = try_alloc_zeroed("pixel buffer", descriptor.image_byte_size)?;
        bits[..rows].copy_from_slice(&self.rows[..rows]);

        let mut color_table = self.color_table.clone();
        color_table.resize(descriptor.color_table_entries as usize, [0; 4]);

        Ok(DibPixels { color_table, bits })
    }
}
