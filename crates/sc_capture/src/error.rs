use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of a single capture run.
///
/// Every variant is terminal for the current run; nothing is retried.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot query bitmap geometry: {0}")]
    GeometryQueryFailed(String),

    #[error("cannot retrieve pixel data: {0}")]
    PixelRetrievalFailed(String),

    #[error("cannot create file '{}': {source}", path.display())]
    OutputCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write file '{}': {source}", path.display())]
    PartialWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot close file '{}': {source}", path.display())]
    CloseFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("out of memory: cannot allocate {bytes} bytes for {what}")]
    AllocationFailed { what: &'static str, bytes: usize },

    #[error("screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("capture region is empty ({width}x{height})")]
    EmptyRegion { width: i64, height: i64 },

    #[error("unsupported output format '{0}' (expected .bmp or .png)")]
    UnsupportedFormat(String),

    #[error("cannot retrieve screenshot coordinates")]
    NoCoordinatesResolved,

    #[error("cannot save screenshot to clipboard: {0}")]
    ClipboardUnavailable(String),
}

impl CaptureError {
    /// Short stable name of the failure kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureError::GeometryQueryFailed(_) => "GeometryQueryFailed",
            CaptureError::PixelRetrievalFailed(_) => "PixelRetrievalFailed",
            CaptureError::OutputCreateFailed { .. } => "OutputCreateFailed",
            CaptureError::PartialWriteFailed { .. } => "PartialWriteFailed",
            CaptureError::CloseFailed { .. } => "CloseFailed",
            CaptureError::AllocationFailed { .. } => "AllocationFailed",
            CaptureError::CaptureFailed(_) => "CaptureFailed",
            CaptureError::EmptyRegion { .. } => "EmptyRegion",
            CaptureError::UnsupportedFormat(_) => "UnsupportedFormat",
            CaptureError::NoCoordinatesResolved => "NoCoordinatesResolved",
            CaptureError::ClipboardUnavailable(_) => "ClipboardUnavailable",
        }
    }
}

pub type CaptureResult<T> = Result<T, CaptureError>;

/// Allocate a zero-filled buffer, reporting exhaustion instead of aborting.
pub fn try_alloc_zeroed(what: &'static str, bytes: usize) -> CaptureResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes)
        .map_err(|_| CaptureError::AllocationFailed { what, bytes })?;
    buf.resize(bytes, 0);
    Ok(buf)
}

/// Allocate an empty buffer with room for `bytes`.
pub(crate) fn try_alloc_capacity(what: &'static str, bytes: usize) -> CaptureResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes)
        .map_err(|_| CaptureError::AllocationFailed { what, bytes })?;
    Ok(buf)
}
