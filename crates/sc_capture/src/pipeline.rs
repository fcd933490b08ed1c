//! Capture orchestration: resolve the region, grab it, hand it to a sink.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::bitmap::PixelSource;
use crate::error::{CaptureError, CaptureResult};
use crate::output::{OutputFormat, SavedImage, save_image};
use crate::png::PngOptions;
use crate::rect::CaptureRect;

/// Operating-system services the pipeline needs.
///
/// `capture` returns an owned bitmap that releases its OS handles on drop,
/// unless ownership is handed over by `publish_to_clipboard`.
pub trait CapturePlatform {
    type Bitmap: PixelSource;

    /// Bounding rectangle of all monitors.
    fn virtual_screen(&self) -> CaptureResult<CaptureRect>;

    /// Let the user drag out a rectangle. Blocks until release or close;
    /// `None` when nothing was selected.
    fn select_region(&mut self) -> CaptureResult<Option<CaptureRect>>;

    /// Copy the screen pixels inside a normalized, non-empty `rect`.
    fn capture(&mut self, rect: CaptureRect) -> CaptureResult<Self::Bitmap>;

    fn publish_to_clipboard(&mut self, bitmap: Self::Bitmap) -> CaptureResult<()>;
}

impl<P: CapturePlatform + ?Sized> CapturePlatform for &mut P {
    type Bitmap = P::Bitmap;

    fn virtual_screen(&self) -> CaptureResult<CaptureRect> {
        (**self).virtual_screen()
    }

    fn select_region(&mut self) -> CaptureResult<Option<CaptureRect>> {
        (**self).select_region()
    }

    fn capture(&mut self, rect: CaptureRect) -> CaptureResult<Self::Bitmap> {
        (**self).capture(rect)
    }

    fn publish_to_clipboard(&mut self, bitmap: Self::Bitmap) -> CaptureResult<()> {
        (**self).publish_to_clipboard(bitmap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    /// Two corners in any order.
    Coords(CaptureRect),
    FullScreen,
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub region: RegionSource,
    /// `None` sends the capture to the clipboard.
    pub output: Option<PathBuf>,
    pub png: PngOptions,
}

impl CaptureRequest {
    pub fn new(region: RegionSource, output: Option<PathBuf>) -> Self {
        Self {
            region,
            output,
            png: PngOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    File(SavedImage),
    Clipboard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    /// Normalized rectangle that was captured.
    pub rect: CaptureRect,
    pub destination: Destination,
}

pub struct CapturePipeline<P: CapturePlatform> {
    platform: P,
}

impl<P: CapturePlatform> CapturePipeline<P> {
    pub fn new(platform: P) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn into_platform(self) -> P {
        self.platform
    }

    pub fn run(&mut self, request: &CaptureRequest) -> CaptureResult<CaptureOutcome> {
        self.run_with(request, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_resolved` with the normalized
    /// rectangle before anything is captured.
    pub fn run_with<F>(
        &mut self,
        request: &CaptureRequest,
        on_resolved: F,
    ) -> CaptureResult<CaptureOutcome>
    where
        F: FnOnce(&CaptureRect),
    {
        let rect = self.resolve_region(request.region)?;
        on_resolved(&rect);
        let destination = self.capture_and_store(rect, request.output.as_deref(), request.png)?;
        Ok(CaptureOutcome { rect, destination })
    }

    /// Turn the request's region into a normalized, non-empty rectangle.
    pub fn resolve_region(&mut self, region: RegionSource) -> CaptureResult<CaptureRect> {
        let raw = match region {
            RegionSource::Coords(rect) => rect,
            RegionSource::FullScreen => self.platform.virtual_screen()?,
            RegionSource::Interactive => self
                .platform
                .select_region()?
                .ok_or(CaptureError::NoCoordinatesResolved)?,
        };

        let rect = raw.normalized();
        debug!(?region, %rect, "resolved capture region");
        if rect.is_empty() {
            return Err(CaptureError::EmptyRegion {
                width: rect.width(),
                height: rect.height(),
            });
        }
        Ok(rect)
    }

    /// Capture `rect` and write it to `output`, or publish it to the
    /// clipboard when no path is given.
    pub fn capture_and_store(
        &mut self,
        rect: CaptureRect,
        output: Option<&Path>,
        png: PngOptions,
    ) -> CaptureResult<Destination> {
        let rect = rect.normalized();
        if rect.is_empty() {
            return Err(CaptureError::EmptyRegion {
                width: rect.width(),
                height: rect.height(),
            });
        }
        if i32::try_from(rect.width()).is_err() || i32::try_from(rect.height()).is_err() {
            return Err(CaptureError::CaptureFailed(format!(
                "region {rect} is too large to capture"
            )));
        }

        let bitmap = self.platform.capture(rect)?;

        let Some(path) = output else {
            self.platform.publish_to_clipboard(bitmap)?;
            info!(%rect, "capture published to clipboard");
            return Ok(Destination::Clipboard);
        };

        // An unknown suffix drops the capture without touching the filesystem.
        let format = OutputFormat::from_path(path)?;
        let saved = save_image(&bitmap, path, format, png)?;
        info!(path = %saved.path.display(), bytes = saved.bytes, "capture saved");
        Ok(Destination::File(saved))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::bitmap::{DibPixels, MemoryBitmap};
    use crate::descriptor::{BitmapDescriptor, BitmapGeometry, ColorDepth};

    struct TrackedBitmap {
        inner: MemoryBitmap,
        drops: Rc<Cell<usize>>,
    }

    impl Drop for TrackedBitmap {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    impl PixelSource for TrackedBitmap {
        fn geometry(&self) -> CaptureResult<BitmapGeometry> {
            self.inner.geometry()
        }

        fn read_pixels(&self, descriptor: &BitmapDescriptor) -> CaptureResult<DibPixels> {
            self.inner.read_pixels(descriptor)
        }
    }

    #[derive(Default)]
    struct FakePlatform {
        screen: CaptureRect,
        selection: Option<CaptureRect>,
        clipboard_fails: bool,
        captured: Vec<CaptureRect>,
        published: usize,
        drops: Rc<Cell<usize>>,
    }

    impl CapturePlatform for FakePlatform {
        type Bitmap = TrackedBitmap;

        fn virtual_screen(&self) -> CaptureResult<CaptureRect> {
            Ok(self.screen)
        }

        fn select_region(&mut self) -> CaptureResult<Option<CaptureRect>> {
            Ok(self.selection)
        }

        fn capture(&mut self, rect: CaptureRect) -> CaptureResult<TrackedBitmap> {
            self.captured.push(rect);
            let inner = MemoryBitmap::from_rgb(
                rect.width() as u32,
                rect.height() as u32,
                ColorDepth::Bits32,
                |x, y| [x as u8, y as u8, 0],
            )?;
            Ok(TrackedBitmap {
                inner,
                drops: Rc::clone(&self.drops),
            })
        }

        fn publish_to_clipboard(&mut self, _bitmap: TrackedBitmap) -> CaptureResult<()> {
            if self.clipboard_fails {
                return Err(CaptureError::ClipboardUnavailable(
                    "clipboard is owned by another window".into(),
                ));
            }
            self.published += 1;
            Ok(())
        }
    }

    #[test]
    fn swapped_coords_are_normalized_before_capture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.bmp");
        let mut pipeline = CapturePipeline::new(FakePlatform::default());

        let request = CaptureRequest::new(
            RegionSource::Coords(CaptureRect::new(100, 100, 10, 10)),
            Some(path.clone()),
        );
        let mut reported = None;
        let outcome = pipeline.run_with(&request, |r| reported = Some(*r)).unwrap();

        assert_eq!(outcome.rect, CaptureRect::new(10, 10, 100, 100));
        assert_eq!(reported, Some(outcome.rect));
        assert_eq!(pipeline.platform().captured, vec![outcome.rect]);
        match outcome.destination {
            Destination::File(saved) => {
                assert_eq!((saved.width, saved.height), (90, 90));
                assert!(path.exists());
            }
            Destination::Clipboard => panic!("expected a file"),
        }
    }

    #[test]
    fn empty_region_never_reaches_capture() {
        let mut pipeline = CapturePipeline::new(FakePlatform::default());
        let request =
            CaptureRequest::new(RegionSource::Coords(CaptureRect::new(5, 5, 5, 50)), None);

        let err = pipeline.run(&request).unwrap_err();
        assert_eq!(err.kind(), "EmptyRegion");
        assert!(pipeline.platform().captured.is_empty());
    }

    #[test]
    fn fullscreen_uses_virtual_screen() {
        let mut pipeline = CapturePipeline::new(FakePlatform {
            screen: CaptureRect::new(-1920, 0, 1920, 1080),
            ..Default::default()
        });
        let rect = pipeline.resolve_region(RegionSource::FullScreen).unwrap();
        assert_eq!((rect.width(), rect.height()), (3840, 1080));
    }

    #[test]
    fn cancelled_selection_resolves_nothing() {
        let mut pipeline = CapturePipeline::new(FakePlatform::default());
        let request = CaptureRequest::new(RegionSource::Interactive, None);

        let err = pipeline.run(&request).unwrap_err();
        assert_eq!(err.kind(), "NoCoordinatesResolved");
        assert!(pipeline.platform().captured.is_empty());
    }

    #[test]
    fn unknown_suffix_releases_capture_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.xyz");
        let mut pipeline = CapturePipeline::new(FakePlatform {
            selection: Some(CaptureRect::new(0, 0, 8, 8)),
            ..Default::default()
        });

        let request = CaptureRequest::new(RegionSource::Interactive, Some(path.clone()));
        let err = pipeline.run(&request).unwrap_err();

        assert_eq!(err.kind(), "UnsupportedFormat");
        assert_eq!(pipeline.platform().captured.len(), 1);
        assert_eq!(pipeline.platform().drops.get(), 1);
        assert!(!path.exists());
    }

    #[test]
    fn missing_output_goes_to_clipboard() {
        let mut pipeline = CapturePipeline::new(FakePlatform::default());
        let request =
            CaptureRequest::new(RegionSource::Coords(CaptureRect::new(0, 0, 4, 4)), None);

        let outcome = pipeline.run(&request).unwrap();
        assert_eq!(outcome.destination, Destination::Clipboard);
        assert_eq!(pipeline.platform().published, 1);
    }

    #[test]
    fn clipboard_failure_is_reported() {
        let mut pipeline = CapturePipeline::new(FakePlatform {
            clipboard_fails: true,
            ..Default::default()
        });
        let request =
            CaptureRequest::new(RegionSource::Coords(CaptureRect::new(0, 0, 4, 4)), None);

        let err = pipeline.run(&request).unwrap_err();
        assert_eq!(err.kind(), "ClipboardUnavailable");
        assert_eq!(pipeline.platform().drops.get(), 1);
    }

    #[test]
    fn oversized_region_fails_before_capture() {
        let mut pipeline = CapturePipeline::new(FakePlatform::default());
        let request = CaptureRequest::new(
            RegionSource::Coords(CaptureRect::new(i32::MIN, 0, i32::MAX, 10)),
            None,
        );

        let err = pipeline.run(&request).unwrap_err();
        assert_eq!(err.kind(), "CaptureFailed");
        assert!(pipeline.platform().captured.is_empty());
    }
}
