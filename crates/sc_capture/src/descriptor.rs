//! Pixel storage parameters derived from a captured bitmap's reported geometry.
//!
//! Both encoders consume a [`BitmapDescriptor`]; nothing here touches the
//! display or the file system.

use tracing::debug;

use crate::error::{CaptureError, CaptureResult};

/// Geometry as reported by the capture primitive (GDI `BITMAP` fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapGeometry {
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bits_per_pixel: u16,
}

/// Bit depth class of the stored pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColorDepth {
    Bits1,
    Bits4,
    Bits8,
    Bits16,
    Bits24,
    Bits32,
}

impl ColorDepth {
    pub const LADDER: [ColorDepth; 6] = [
        ColorDepth::Bits1,
        ColorDepth::Bits4,
        ColorDepth::Bits8,
        ColorDepth::Bits16,
        ColorDepth::Bits24,
        ColorDepth::Bits32,
    ];

    /// Smallest class that holds `bits` bits per pixel. Anything above 24 is 32.
    pub fn classify(bits: u32) -> Option<Self> {
        match bits {
            0 => None,
            1 => Some(ColorDepth::Bits1),
            2..=4 => Some(ColorDepth::Bits4),
            5..=8 => Some(ColorDepth::Bits8),
            9..=16 => Some(ColorDepth::Bits16),
            17..=24 => Some(ColorDepth::Bits24),
            _ => Some(ColorDepth::Bits32),
        }
    }

    #[inline]
    pub fn bits(self) -> u16 {
        match self {
            ColorDepth::Bits1 => 1,
            ColorDepth::Bits4 => 4,
            ColorDepth::Bits8 => 8,
            ColorDepth::Bits16 => 16,
            ColorDepth::Bits24 => 24,
            ColorDepth::Bits32 => 32,
        }
    }

    /// True for palette-indexed classes.
    #[inline]
    pub fn is_indexed(self) -> bool {
        self.bits() <= 8
    }

    /// Number of color table entries the uncompressed format carries for this class.
    #[inline]
    pub fn color_table_entries(self) -> u32 {
        match self {
            ColorDepth::Bits24 | ColorDepth::Bits32 => 0,
            other => 1u32 << other.bits(),
        }
    }
}

/// Size of one color table entry (`RGBQUAD`).
pub const COLOR_TABLE_ENTRY_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapDescriptor {
    pub width: u32,
    pub height: u32,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub depth: ColorDepth,
    pub color_table_entries: u32,
    /// Bytes per stored row; rows are padded to a 32-bit boundary.
    pub scanline_stride: usize,
    /// Bytes reserved for the pixel array.
    pub image_byte_size: usize,
}

impl BitmapDescriptor {
    pub fn resolve(geometry: BitmapGeometry) -> CaptureResult<Self> {
        let BitmapGeometry {
            width,
            height,
            planes,
            bits_per_pixel,
        } = geometry;

        if width <= 0 || height <= 0 {
            return Err(CaptureError::GeometryQueryFailed(format!(
                "invalid bitmap size {width}x{height}"
            )));
        }

        let depth = ColorDepth::classify(u32::from(planes) * u32::from(bits_per_pixel))
            .ok_or_else(|| {
                CaptureError::GeometryQueryFailed(format!(
                    "invalid pixel format: {planes} plane(s) x {bits_per_pixel} bit(s)"
                ))
            })?;

        let width = width as u32;
        let height = height as u32;
        let class_bits = u64::from(depth.bits());

        let stride = (u64::from(width) * class_bits).div_ceil(32) * 4;
        let stride_total = stride * u64::from(height);
        // Width rounded up to whole bytes of 8 pixels, times the class byte width.
        let rounded_total = u64::from(width).div_ceil(8) * u64::from(height) * class_bits;

        let too_large = || {
            CaptureError::GeometryQueryFailed(format!("bitmap {width}x{height} is too large"))
        };
        let scanline_stride = usize::try_from(stride).map_err(|_| too_large())?;
        let image_byte_size =
            usize::try_from(rounded_total.max(stride_total)).map_err(|_| too_large())?;

        let descriptor = Self {
            width,
            height,
            planes,
            bits_per_pixel,
            depth,
            color_table_entries: depth.color_table_entries(),
            scanline_stride,
            image_byte_size,
        };
        debug!(?descriptor, "resolved bitmap descriptor");
        Ok(descriptor)
    }

    #[inline]
    pub fn color_table_bytes(&self) -> usize {
        self.color_table_entries as usize * COLOR_TABLE_ENTRY_SIZE
    }

    /// Bytes of real pixel data at the start of each row, without padding.
    #[inline]
    pub fn packed_row_bytes(&self) -> usize {
        (self.width as usize * usize::from(self.depth.bits())).div_ceil(8)
    }

    /// Bytes occupied by the rows themselves, excluding trailing slack.
    #[inline]
    pub fn rows_byte_size(&self) -> usize {
        self.scanline_stride * self.height as usize
    }

    /// Byte range of the row that is `y` rows from the top of the image.
    ///
    /// The pixel array is stored bottom-up, so the top row comes last.
    #[inline]
    pub fn row_range_from_top(&self, y: u32) -> std::ops::Range<usize> {
        let stored = (self.height - 1 - y) as usize;
        let start = stored * self.scanline_stride;
        start..start + self.packed_row_bytes()
    }
}
