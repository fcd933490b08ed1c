// Application wiring: settings, logging, argument parsing, capture, report.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use sc_capture::{
    CaptureOutcome, CapturePipeline, CapturePlatform, CaptureRequest, Destination, PngCompression,
    PngOptions,
};
use sc_settings::{CompressionLevel, Settings, SettingsSource};
use tracing::{debug, warn};

use crate::cli::{self, CaptureArgs, Command, USAGE};
use crate::error::{AppError, AppResult};
use crate::logging;
use crate::platform;

/// Exit status for anything other than a completed capture, help and
/// version included.
pub const EXIT_FAILURE: u8 = 1;

/// Run the tool with a full argument vector and the native platform.
pub fn run<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let loaded = Settings::load();
    logging::init(&loaded.settings.log_filter);
    match (&loaded.source, &loaded.fallback_reason) {
        (_, Some(reason)) => warn!("ignoring settings file, using defaults: {reason:#}"),
        (SettingsSource::File(path), None) => debug!(path = %path.display(), "settings loaded"),
        (SettingsSource::Defaults, None) => debug!("no settings file, using defaults"),
    }

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let status = run_with(
        args,
        &loaded.settings,
        platform::native(),
        &mut stdout,
        &mut stderr,
    );
    ExitCode::from(status)
}

/// Parse `args` and run the capture against `platform`, writing report
/// lines to `out` and failures to `err`. Returns the process exit status.
pub fn run_with<I, T, P, O, E>(
    args: I,
    settings: &Settings,
    platform: P,
    out: &mut O,
    err: &mut E,
) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    P: CapturePlatform,
    O: Write,
    E: Write,
{
    let result = cli::parse_args(args)
        .map_err(AppError::from)
        .and_then(|command| match command {
            Command::Help => {
                let _ = write!(out, "{USAGE}");
                Ok(None)
            }
            Command::Version => {
                let _ = write!(out, "{}", cli::version_text());
                Ok(None)
            }
            Command::Capture(capture) => execute(platform, capture, settings, out).map(Some),
        });

    match result {
        Ok(Some(_)) => 0,
        Ok(None) => EXIT_FAILURE,
        Err(e) => {
            debug!(kind = e.kind(), "run failed");
            let _ = writeln!(err, "error: {e}");
            if e.wants_usage() {
                let _ = write!(out, "{USAGE}");
            }
            EXIT_FAILURE
        }
    }
}

/// Capture and store one region, printing the report lines.
pub fn execute<P, O>(
    platform: P,
    args: CaptureArgs,
    settings: &Settings,
    out: &mut O,
) -> AppResult<CaptureOutcome>
where
    P: CapturePlatform,
    O: Write,
{
    let request = CaptureRequest {
        region: args.region,
        output: args.output,
        png: png_options(settings),
    };

    let mut pipeline = CapturePipeline::new(platform);
    let outcome = pipeline.run_with(&request, |rect| {
        if settings.print_coords {
            let _ = writeln!(out, "screenshot coords: {rect}");
        }
    })?;

    let _ = match &outcome.destination {
        Destination::File(saved) => {
            writeln!(out, "screenshot saved to file: {}", saved.path.display())
        }
        Destination::Clipboard => writeln!(out, "screenshot saved to clipboard."),
    };
    Ok(outcome)
}

pub fn png_options(settings: &Settings) -> PngOptions {
    PngOptions {
        compression: match settings.png_compression {
            CompressionLevel::Fast => PngCompression::Fast,
            CompressionLevel::Default => PngCompression::Default,
            CompressionLevel::Best => PngCompression::Best,
        },
        idat_chunk_size: settings.png_idat_chunk_size.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_map_to_png_options() {
        let settings = Settings {
            png_compression: CompressionLevel::Best,
            png_idat_chunk_size: 0,
            ..Settings::default()
        };
        let png = png_options(&settings);
        assert_eq!(png.compression, PngCompression::Best);
        assert_eq!(png.idat_chunk_size, 1);

        assert_eq!(png_options(&Settings::default()), PngOptions::default());
    }
}
