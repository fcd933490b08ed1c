pub mod bitmap;
pub mod bmp;
pub mod descriptor;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod png;
pub mod rect;
pub mod selection;

pub use bitmap::{DibPixels, MemoryBitmap, PixelSource, RgbQuad};
pub use descriptor::{BitmapDescriptor, BitmapGeometry, ColorDepth};
pub use error::{CaptureError, CaptureResult, try_alloc_zeroed};
pub use output::{OutputFormat, SavedImage, encode_to_vec, save_image};
pub use pipeline::{
    CaptureOutcome, CapturePipeline, CapturePlatform, CaptureRequest, Destination, RegionSource,
};
pub use png::{PngCompression, PngOptions};
pub use rect::{CaptureRect, ParseRectError};
pub use selection::{DragSelection, DragState, RubberBand, ScreenPoint};
