//! Compressed raster (PNG) encoder.
//!
//! The container is written by hand: signature, `IHDR`, optional `PLTE`, one or
//! more `IDAT` chunks holding a zlib stream of filter-type-0 scanlines, `IEND`.
//! Deflate and CRC-32 come from `flate2` and `crc32fast`.

use std::io::{self, Write};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use tracing::debug;

use crate::bitmap::DibPixels;
use crate::descriptor::{BitmapDescriptor, ColorDepth};
use crate::error::{CaptureError, CaptureResult, try_alloc_capacity};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub const TAG_IHDR: [u8; 4] = *b"IHDR";
pub const TAG_PLTE: [u8; 4] = *b"PLTE";
pub const TAG_IDAT: [u8; 4] = *b"IDAT";
pub const TAG_IEND: [u8; 4] = *b"IEND";

/// Length, tag and CRC around every chunk payload.
const CHUNK_OVERHEAD: u64 = 12;
const FILTER_NONE: u8 = 0;

pub const DEFAULT_IDAT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PngColorType {
    Rgb = 2,
    Indexed = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

impl From<PngCompression> for Compression {
    fn from(value: PngCompression) -> Self {
        match value {
            PngCompression::Fast => Compression::fast(),
            PngCompression::Default => Compression::default(),
            PngCompression::Best => Compression::best(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngOptions {
    pub compression: PngCompression,
    /// Largest `IDAT` payload; the zlib stream is split across as many chunks as needed.
    pub idat_chunk_size: usize,
}

impl Default for PngOptions {
    fn default() -> Self {
        Self {
            compression: PngCompression::Default,
            idat_chunk_size: DEFAULT_IDAT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ihdr {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: PngColorType,
}

impl Ihdr {
    pub fn for_descriptor(descriptor: &BitmapDescriptor) -> Self {
        let (bit_depth, color_type) = match descriptor.depth {
            ColorDepth::Bits1 => (1, PngColorType::Indexed),
            ColorDepth::Bits4 => (4, PngColorType::Indexed),
            ColorDepth::Bits8 => (8, PngColorType::Indexed),
            ColorDepth::Bits16 | ColorDepth::Bits24 | ColorDepth::Bits32 => (8, PngColorType::Rgb),
        };
        Self {
            width: descriptor.width,
            height: descriptor.height,
            bit_depth,
            color_type,
        }
    }

    /// Bytes per scanline, excluding the filter-type byte.
    pub fn row_bytes(&self) -> usize {
        let samples = match self.color_type {
            PngColorType::Rgb => 3,
            PngColorType::Indexed => 1,
        };
        (self.width as usize * samples * usize::from(self.bit_depth)).div_ceil(8)
    }

    pub fn to_bytes(&self) -> [u8; 13] {
        let mut out = [0u8; 13];
        out[0..4].copy_from_slice(&self.width.to_be_bytes());
        out[4..8].copy_from_slice(&self.height.to_be_bytes());
        out[8] = self.bit_depth;
        out[9] = self.color_type as u8;
        // compression method, filter method, interlace method
        out[10] = 0;
        out[11] = 0;
        out[12] = 0;
        out
    }
}

/// CRC-32 of a chunk, computed over its tag and payload.
pub fn chunk_crc(tag: &[u8; 4], payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(tag);
    hasher.update(payload);
    hasher.finalize()
}

pub fn write_chunk<W: Write>(out: &mut W, tag: &[u8; 4], payload: &[u8]) -> io::Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "chunk payload too large"))?;
    out.write_all(&len.to_be_bytes())?;
    out.write_all(tag)?;
    out.write_all(payload)?;
    out.write_all(&chunk_crc(tag, payload).to_be_bytes())
}

/// Scanlines in top-down order, each prefixed with filter type 0.
///
/// The source rows are stored bottom-up in device order (BGR/BGRX/X1R5G5B5),
/// the output rows are top-down RGB or palette indices.
pub fn filter_scanlines(descriptor: &BitmapDescriptor, pixels: &DibPixels) -> CaptureResult<Vec<u8>> {
    if pixels.bits.len() < descriptor.rows_byte_size() {
        return Err(CaptureError::PixelRetrievalFailed(format!(
            "pixel buffer has {} bytes, rows need {}",
            pixels.bits.len(),
            descriptor.rows_byte_size()
        )));
    }

    let row_bytes = Ihdr::for_descriptor(descriptor).row_bytes();
    let total = (row_bytes + 1) * descriptor.height as usize;
    let mut out = try_alloc_capacity("filtered scanlines", total)?;

    for y in 0..descriptor.height {
        let src = &pixels.bits[descriptor.row_range_from_top(y)];
        out.push(FILTER_NONE);
        match descriptor.depth {
            ColorDepth::Bits32 => {
                for px in src.chunks_exact(4) {
                    out.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            }
            ColorDepth::Bits24 => {
                for px in src.chunks_exact(3) {
                    out.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            }
            ColorDepth::Bits16 => {
                for px in src.chunks_exact(2) {
                    let v = u16::from_le_bytes([px[0], px[1]]);
                    out.extend_from_slice(&[
                        expand5((v >> 10) & 0x1F),
                        expand5((v >> 5) & 0x1F),
                        expand5(v & 0x1F),
                    ]);
                }
            }
            // Palette indices are packed most significant bit first in both formats.
            ColorDepth::Bits1 | ColorDepth::Bits4 | ColorDepth::Bits8 => out.extend_from_slice(src),
        }
    }

    debug_assert_eq!(out.len(), total);
    Ok(out)
}

#[inline]
fn expand5(c: u16) -> u8 {
    ((c << 3) | (c >> 2)) as u8
}

/// An encoded PNG: header fields, palette and the compressed image stream.
#[derive(Debug, Clone)]
pub struct PngFile {
    pub ihdr: Ihdr,
    pub palette: Option<Vec<[u8; 3]>>,
    zlib_stream: Vec<u8>,
    idat_chunk_size: usize,
}

impl PngFile {
    pub fn encode(
        descriptor: &BitmapDescriptor,
        pixels: &DibPixels,
        options: PngOptions,
    ) -> CaptureResult<Self> {
        let ihdr = Ihdr::for_descriptor(descriptor);
        let palette = match ihdr.color_type {
            PngColorType::Indexed => Some(palette_from(descriptor, pixels)?),
            PngColorType::Rgb => None,
        };

        let filtered = filter_scanlines(descriptor, pixels)?;
        let zlib_stream = compress(&filtered, options.compression)?;
        debug!(
            raw = filtered.len(),
            compressed = zlib_stream.len(),
            "compressed scanlines"
        );

        Ok(Self {
            ihdr,
            palette,
            zlib_stream,
            idat_chunk_size: options.idat_chunk_size.max(1),
        })
    }

    #[inline]
    pub fn zlib_stream(&self) -> &[u8] {
        &self.zlib_stream
    }

    pub fn idat_chunk_count(&self) -> usize {
        self.zlib_stream.len().div_ceil(self.idat_chunk_size).max(1)
    }

    pub fn file_size(&self) -> u64 {
        let palette = self
            .palette
            .as_ref()
            .map_or(0, |p| CHUNK_OVERHEAD + 3 * p.len() as u64);
        PNG_SIGNATURE.len() as u64
            + (CHUNK_OVERHEAD + 13)
            + palette
            + CHUNK_OVERHEAD * self.idat_chunk_count() as u64
            + self.zlib_stream.len() as u64
            + CHUNK_OVERHEAD
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(&PNG_SIGNATURE)?;
        write_chunk(out, &TAG_IHDR, &self.ihdr.to_bytes())?;

        if let Some(palette) = &self.palette {
            let flat: Vec<u8> = palette.iter().flatten().copied().collect();
            write_chunk(out, &TAG_PLTE, &flat)?;
        }

        if self.zlib_stream.is_empty() {
            write_chunk(out, &TAG_IDAT, &[])?;
        }
        for part in self.zlib_stream.chunks(self.idat_chunk_size) {
            write_chunk(out, &TAG_IDAT, part)?;
        }

        write_chunk(out, &TAG_IEND, &[])
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.file_size() as usize);
        let _ = self.write_to(&mut out);
        out
    }
}

fn palette_from(descriptor: &BitmapDescriptor, pixels: &DibPixels) -> CaptureResult<Vec<[u8; 3]>> {
    let max_entries = 1usize << descriptor.depth.bits();
    if pixels.color_table.is_empty() {
        return Err(CaptureError::PixelRetrievalFailed(
            "indexed bitmap has no color table".to_string(),
        ));
    }
    Ok(pixels
        .color_table
        .iter()
        .take(max_entries)
        .map(|&[b, g, r, _]| [r, g, b])
        .collect())
}

fn compress(data: &[u8], level: PngCompression) -> CaptureResult<Vec<u8>> {
    let oom = || CaptureError::AllocationFailed {
        what: "compressed stream",
        bytes: data.len(),
    };
    let buffer = try_alloc_capacity("compressed stream", data.len() / 2 + 64)?;
    let mut encoder = ZlibEncoder::new(buffer, level.into());
    encoder.write_all(data).map_err(|_| oom())?;
    encoder.finish().map_err(|_| oom())
}

/// One chunk as found in an encoded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub tag: [u8; 4],
    pub payload: &'a [u8],
    pub crc: u32,
}

impl Chunk<'_> {
    #[inline]
    pub fn crc_matches(&self) -> bool {
        chunk_crc(&self.tag, self.payload) == self.crc
    }
}

/// Walk the chunks of an encoded PNG. Yields `None` after `IEND` or on truncation.
#[derive(Debug, Clone)]
pub struct ChunkReader<'a> {
    rest: &'a [u8],
}

impl<'a> ChunkReader<'a> {
    /// Returns `None` if the signature is missing.
    pub fn new(file: &'a [u8]) -> Option<Self> {
        let rest = file.strip_prefix(&PNG_SIGNATURE[..])?;
        Some(Self { rest })
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.len() < CHUNK_OVERHEAD as usize {
            return None;
        }
        let len = u32::from_be_bytes(self.rest[0..4].try_into().ok()?) as usize;
        let tag: [u8; 4] = self.rest[4..8].try_into().ok()?;
        let payload = self.rest.get(8..8 + len)?;
        let crc_bytes = self.rest.get(8 + len..12 + len)?;
        let crc = u32::from_be_bytes(crc_bytes.try_into().ok()?);
        self.rest = &self.rest[12 + len..];
        Some(Chunk { tag, payload, crc })
    }
}
