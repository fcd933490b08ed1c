//! Output format dispatch and file writing shared by both encoders.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::bitmap::PixelSource;
use crate::bmp::BmpFile;
use crate::error::{CaptureError, CaptureResult};
use crate::png::{PngFile, PngOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Bmp,
    Png,
}

impl OutputFormat {
    /// Pick the encoder from the file suffix, ignoring case.
    pub fn from_path(path: &Path) -> CaptureResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("bmp") => Ok(OutputFormat::Bmp),
            Some("png") => Ok(OutputFormat::Png),
            _ => Err(CaptureError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Bmp => "bmp",
            OutputFormat::Png => "png",
        }
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
}

/// Encode `source` in memory with the given format.
///
/// Geometry and pixels are read first; any failure leaves nothing behind.
pub fn encode_to_vec(
    source: &dyn PixelSource,
    format: OutputFormat,
    png: PngOptions,
) -> CaptureResult<Vec<u8>> {
    let descriptor = source.describe()?;
    let pixels = source.read_pixels(&descriptor)?;
    Ok(match format {
        OutputFormat::Bmp => BmpFile::new(&descriptor, &pixels)?.to_bytes(),
        OutputFormat::Png => PngFile::encode(&descriptor, &pixels, png)?.to_bytes(),
    })
}

/// Encode `source` and write it to `path`, creating or truncating the file.
pub fn save_image(
    source: &dyn PixelSource,
    path: &Path,
    format: OutputFormat,
    png: PngOptions,
) -> CaptureResult<SavedImage> {
    let descriptor = source.describe()?;
    let pixels = source.read_pixels(&descriptor)?;
    debug!(?format, path = %path.display(), "encoding capture");

    let bytes = match format {
        OutputFormat::Bmp => {
            let file = BmpFile::new(&descriptor, &pixels)?;
            write_file(path, |out| file.write_to(out))?;
            file.file_size()
        }
        OutputFormat::Png => {
            // The pixel copy is released as soon as the stream is compressed.
            let file = PngFile::encode(&descriptor, &pixels, png)?;
            drop(pixels);
            write_file(path, |out| file.write_to(out))?;
            file.file_size()
        }
    };

    Ok(SavedImage {
        path: path.to_path_buf(),
        format,
        width: descriptor.width,
        height: descriptor.height,
        bytes,
    })
}

/// Create `path`, run `write` against it and flush it to disk.
///
/// A file that failed part way through is removed if possible.
pub fn write_file<F>(path: &Path, write: F) -> CaptureResult<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let mut file = File::create(path).map_err(|source| CaptureError::OutputCreateFailed {
        path: path.to_path_buf(),
        source,
    })?;

    if let Err(source) = write(&mut file) {
        drop(file);
        discard_partial(path);
        return Err(CaptureError::PartialWriteFailed {
            path: path.to_path_buf(),
            source,
        });
    }

    if let Err(source) = file.flush().and_then(|()| file.sync_all()) {
        drop(file);
        discard_partial(path);
        return Err(CaptureError::CloseFailed {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

fn discard_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "could not remove partial output");
    }
}
