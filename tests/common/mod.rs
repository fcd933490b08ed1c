#![allow(dead_code)]

use std::ffi::OsString;

use sc_capture::{
    CaptureError, CapturePlatform, CaptureRect, CaptureResult, ColorDepth, MemoryBitmap,
};
use sc_settings::Settings;

/// Color of the synthetic desktop at screen position `(x, y)`.
pub fn desktop_pixel(x: i32, y: i32) -> [u8; 3] {
    [x as u8, y as u8, (x ^ y) as u8]
}

/// In-memory stand-in for the OS: a synthetic desktop, a scripted
/// selection and a clipboard that can be told to refuse.
#[derive(Debug)]
pub struct ScriptedPlatform {
    pub screen: CaptureRect,
    pub selection: Option<CaptureRect>,
    pub clipboard_fails: bool,
    pub captures: Vec<CaptureRect>,
    pub clipboard: Vec<(u32, u32)>,
}

impl Default for ScriptedPlatform {
    fn default() -> Self {
        Self {
            screen: CaptureRect::new(0, 0, 320, 200),
            selection: None,
            clipboard_fails: false,
            captures: Vec::new(),
            clipboard: Vec::new(),
        }
    }
}

impl CapturePlatform for ScriptedPlatform {
    type Bitmap = MemoryBitmap;

    fn virtual_screen(&self) -> CaptureResult<CaptureRect> {
        Ok(self.screen)
    }

    fn select_region(&mut self) -> CaptureResult<Option<CaptureRect>> {
        Ok(self.selection)
    }

    fn capture(&mut self, rect: CaptureRect) -> CaptureResult<MemoryBitmap> {
        self.captures.push(rect);
        MemoryBitmap::from_rgb(
            rect.width() as u32,
            rect.height() as u32,
            ColorDepth::Bits32,
            |x, y| desktop_pixel(rect.left + x as i32, rect.top + y as i32),
        )
    }

    fn publish_to_clipboard(&mut self, bitmap: MemoryBitmap) -> CaptureResult<()> {
        if self.clipboard_fails {
            return Err(CaptureError::ClipboardUnavailable(
                "could not open clipboard".into(),
            ));
        }
        use sc_capture::PixelSource;
        let d = bitmap.describe()?;
        self.clipboard.push((d.width, d.height));
        Ok(())
    }
}

pub struct RunResult {
    pub status: u8,
    pub stdout: String,
    pub stderr: String,
}

/// Run the tool against `platform` with `args` (program name added).
pub fn run(platform: &mut ScriptedPlatform, settings: &Settings, args: &[OsString]) -> RunResult {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let argv = std::iter::once(OsString::from("boxcutter")).chain(args.iter().cloned());
    let status = sc_boxcutter::app::run_with(argv, settings, platform, &mut out, &mut err);
    RunResult {
        status,
        stdout: String::from_utf8(out).unwrap(),
        stderr: String::from_utf8(err).unwrap(),
    }
}

pub fn args(items: &[&str]) -> Vec<OsString> {
    items.iter().map(OsString::from).collect()
}
