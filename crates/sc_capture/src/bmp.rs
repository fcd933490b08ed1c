//! Uncompressed raster (BMP) encoder.
//!
//! Layout: `BITMAPFILEHEADER` (14 bytes) + `BITMAPINFOHEADER` (40 bytes) +
//! optional color table + the bottom-up pixel array. All fields little-endian.

use std::io::{self, Write};

use crate::bitmap::DibPixels;
use crate::descriptor::{BitmapDescriptor, COLOR_TABLE_ENTRY_SIZE};
use crate::error::{CaptureError, CaptureResult};

/// "BM"
pub const BMP_MAGIC: u16 = 0x4D42;
pub const FILE_HEADER_SIZE: usize = 14;
pub const INFO_HEADER_SIZE: usize = 40;
const BI_RGB: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub file_type: u16,
    pub file_size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    pub pixel_offset: u32,
}

impl FileHeader {
    pub fn to_bytes(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut out = [0u8; FILE_HEADER_SIZE];
        out[0..2].copy_from_slice(&self.file_type.to_le_bytes());
        out[2..6].copy_from_slice(&self.file_size.to_le_bytes());
        out[6..8].copy_from_slice(&self.reserved1.to_le_bytes());
        out[8..10].copy_from_slice(&self.reserved2.to_le_bytes());
        out[10..14].copy_from_slice(&self.pixel_offset.to_le_bytes());
        out
    }

    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let b = bytes.get(..FILE_HEADER_SIZE)?;
        Some(Self {
            file_type: u16::from_le_bytes([b[0], b[1]]),
            file_size: u32::from_le_bytes([b[2], b[3], b[4], b[5]]),
            reserved1: u16::from_le_bytes([b[6], b[7]]),
            reserved2: u16::from_le_bytes([b[8], b[9]]),
            pixel_offset: u32::from_le_bytes([b[10], b[11], b[12], b[13]]),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoHeader {
    pub size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub size_image: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub clr_used: u32,
    pub clr_important: u32,
}

impl InfoHeader {
    pub fn to_bytes(&self) -> [u8; INFO_HEADER_SIZE] {
        let mut out = [0u8; INFO_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.size.to_le_bytes());
        out[4..8].copy_from_slice(&self.width.to_le_bytes());
        out[8..12].copy_from_slice(&self.height.to_le_bytes());
        out[12..14].copy_from_slice(&self.planes.to_le_bytes());
        out[14..16].copy_from_slice(&self.bit_count.to_le_bytes());
        out[16..20].copy_from_slice(&self.compression.to_le_bytes());
        out[20..24].copy_from_slice(&self.size_image.to_le_bytes());
        out[24..28].copy_from_slice(&self.x_pels_per_meter.to_le_bytes());
        out[28..32].copy_from_slice(&self.y_pels_per_meter.to_le_bytes());
        out[32..36].copy_from_slice(&self.clr_used.to_le_bytes());
        out[36..40].copy_from_slice(&self.clr_important.to_le_bytes());
        out
    }

    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let b = bytes.get(..INFO_HEADER_SIZE)?;
        let u32_at = |i: usize| u32::from_le_bytes([b[i], b[i + 1], b[i + 2], b[i + 3]]);
        let u16_at = |i: usize| u16::from_le_bytes([b[i], b[i + 1]]);
        Some(Self {
            size: u32_at(0),
            width: u32_at(4) as i32,
            height: u32_at(8) as i32,
            planes: u16_at(12),
            bit_count: u16_at(14),
            compression: u32_at(16),
            size_image: u32_at(20),
            x_pels_per_meter: u32_at(24) as i32,
            y_pels_per_meter: u32_at(28) as i32,
            clr_used: u32_at(32),
            clr_important: u32_at(36),
        })
    }
}

/// A BMP file ready to be written, borrowing the retrieved pixels.
#[derive(Debug)]
pub struct BmpFile<'a> {
    pub file_header: FileHeader,
    pub info_header: InfoHeader,
    pixels: &'a DibPixels,
    image_byte_size: usize,
}

impl<'a> BmpFile<'a> {
    pub fn new(descriptor: &BitmapDescriptor, pixels: &'a DibPixels) -> CaptureResult<Self> {
        let entries = descriptor.color_table_entries as usize;
        if pixels.color_table.len() != entries {
            return Err(CaptureError::PixelRetrievalFailed(format!(
                "color table has {} entries, expected {entries}",
                pixels.color_table.len()
            )));
        }
        if pixels.bits.len() < descriptor.image_byte_size {
            return Err(CaptureError::PixelRetrievalFailed(format!(
                "pixel buffer has {} bytes, expected {}",
                pixels.bits.len(),
                descriptor.image_byte_size
            )));
        }

        let headers = FILE_HEADER_SIZE + INFO_HEADER_SIZE;
        let pixel_offset = headers + entries * COLOR_TABLE_ENTRY_SIZE;
        let file_size = pixel_offset as u64 + descriptor.image_byte_size as u64;

        let too_large = || {
            CaptureError::GeometryQueryFailed(format!(
                "{}x{} image does not fit the BMP size fields",
                descriptor.width, descriptor.height
            ))
        };
        let file_size = u32::try_from(file_size).map_err(|_| too_large())?;
        let size_image = u32::try_from(descriptor.image_byte_size).map_err(|_| too_large())?;

        Ok(Self {
            file_header: FileHeader {
                file_type: BMP_MAGIC,
                file_size,
                reserved1: 0,
                reserved2: 0,
                pixel_offset: pixel_offset as u32,
            },
            info_header: InfoHeader {
                size: INFO_HEADER_SIZE as u32,
                width: descriptor.width as i32,
                // Positive height: rows are stored bottom-up.
                height: descriptor.height as i32,
                planes: 1,
                bit_count: descriptor.depth.bits(),
                compression: BI_RGB,
                size_image,
                x_pels_per_meter: 0,
                y_pels_per_meter: 0,
                clr_used: descriptor.color_table_entries,
                clr_important: 0,
            },
            pixels,
            image_byte_size: descriptor.image_byte_size,
        })
    }

    #[inline]
    pub fn file_size(&self) -> u64 {
        u64::from(self.file_header.file_size)
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.file_header.to_bytes())?;

        // Info header and color table go out together.
        let mut info = Vec::with_capacity(
            INFO_HEADER_SIZE + self.pixels.color_table.len() * COLOR_TABLE_ENTRY_SIZE,
        );
        info.extend_from_slice(&self.info_header.to_bytes());
        for quad in &self.pixels.color_table {
            info.extend_from_slice(quad);
        }
        out.write_all(&info)?;

        out.write_all(&self.pixels.bits[..self.image_byte_size])
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.file_size() as usize);
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{MemoryBitmap, PixelSource};
    use crate::descriptor::ColorDepth;

    fn encode(bmp: &MemoryBitmap) -> (BitmapDescriptor, Vec<u8>) {
        let d = bmp.describe().unwrap();
        let px = bmp.read_pixels(&d).unwrap();
        let bytes = BmpFile::new(&d, &px).unwrap().to_bytes();
        (d, bytes)
    }

    #[test]
    fn header_round_trip_true_color() {
        let bmp = MemoryBitmap::from_rgb(33, 17, ColorDepth::Bits32, |x, y| {
            [x as u8, y as u8, 0x80]
        })
        .unwrap();
        let (d, bytes) = encode(&bmp);

        let fh = FileHeader::parse(&bytes).unwrap();
        let ih = InfoHeader::parse(&bytes[FILE_HEADER_SIZE..]).unwrap();

        assert_eq!(&bytes[0..2], b"BM");
        assert_eq!(fh.file_size as usize, bytes.len());
        assert_eq!(fh.file_size as usize, 14 + 40 + d.image_byte_size);
        assert_eq!(fh.pixel_offset, 54);
        assert_eq!(ih.width, 33);
        assert_eq!(ih.height, 17);
        assert_eq!(ih.bit_count, 32);
        assert_eq!(ih.size_image as usize, d.image_byte_size);
        assert_eq!(ih.clr_used, 0);
    }

    #[test]
    fn color_table_precedes_pixels() {
        let palette = vec![[0, 0, 0, 0], [0x10, 0x20, 0x30, 0]];
        let bmp = MemoryBitmap::new(
            16,
            2,
            ColorDepth::Bits1,
            palette,
            vec![0xF0, 0x0F, 0, 0, 0xAA, 0x55, 0, 0],
        )
        .unwrap();
        let (d, bytes) = encode(&bmp);
        let fh = FileHeader::parse(&bytes).unwrap();

        assert_eq!(fh.pixel_offset, 14 + 40 + 2 * 4);
        assert_eq!(&bytes[58..62], &[0x10, 0x20, 0x30, 0]);
        let pixels = &bytes[fh.pixel_offset as usize..];
        assert_eq!(&pixels[..8], &[0xF0, 0x0F, 0, 0, 0xAA, 0x55, 0, 0]);
        assert_eq!(fh.file_size as usize, 62 + d.image_byte_size);
    }

    #[test]
    fn header_bytes_are_little_endian() {
        let fh = FileHeader {
            file_type: BMP_MAGIC,
            file_size: 0x0102_0304,
            reserved1: 0,
            reserved2: 0,
            pixel_offset: 54,
        };
        assert_eq!(fh.to_bytes(), [b'B', b'M', 4, 3, 2, 1, 0, 0, 0, 0, 54, 0, 0, 0]);
    }

    #[test]
    fn rejects_short_color_table() {
        let d = BitmapDescriptor::resolve(crate::descriptor::BitmapGeometry {
            width: 4,
            height: 1,
            planes: 1,
            bits_per_pixel: 8,
        })
        .unwrap();
        let px = DibPixels {
            color_table: vec![[0; 4]; 3],
            bits: vec![0; d.image_byte_size],
        };
        assert_eq!(BmpFile::new(&d, &px).unwrap_err().kind(), "PixelRetrievalFailed");
    }

    #[test]
    fn decodes_with_image_crate() {
        let bmp = MemoryBitmap::from_rgb(7, 5, ColorDepth::Bits24, |x, y| {
            if x == 0 && y == 0 { [255, 0, 0] } else { [0, 0, 255] }
        })
        .unwrap();
        let (_, bytes) = encode(&bmp);

        let img = image::load_from_memory_with_format(&bytes, image::ImageFormat::Bmp)
            .unwrap()
            .to_rgb8();
        assert_eq!(img.dimensions(), (7, 5));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(6, 4).0, [0, 0, 255]);
    }
}
