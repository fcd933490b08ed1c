// Command line parsing
//
// Options are read left to right and stop at the first non-option argument,
// which names the output file. Help, version and a malformed --coords value
// end parsing at the point where they appear.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::{ContextKind, ErrorKind};
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use sc_capture::{CaptureRect, RegionSource};
use thiserror::Error;

pub const VERSION: &str = "1.3";

pub const USAGE: &str = "
usage: boxcutter [OPTIONS] [OUTPUT_FILENAME]
Saves a screenshot to 'OUTPUT_FILENAME' if given (.bmp or .png).  Otherwise,
screenshot is stored on the clipboard by default.

OPTIONS
  -c, --coords X1,Y1,X2,Y2    capture the rectangle (X1,Y1)-(X2,Y2)
  -f, --fullscreen            capture the full screen
  -v, --version               display version information
  -h, --help                  display help message
";

pub fn version_text() -> String {
    format!("\nboxcutter {VERSION}\nCopyright Matt Rasmussen 2008\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    #[error("{0}")]
    MalformedArgument(String),

    #[error("unknown option '{0}'")]
    UnknownOption(String),
}

impl CliError {
    pub fn kind(&self) -> &'static str {
        match self {
            CliError::MalformedArgument(_) => "MalformedArgument",
            CliError::UnknownOption(_) => "UnknownOption",
        }
    }

    fn missing_coords() -> Self {
        CliError::MalformedArgument("expected argument for -c,--coord".to_string())
    }

    fn bad_coords() -> Self {
        CliError::MalformedArgument("expected 4 comma separated integers".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureArgs {
    pub region: RegionSource,
    /// `None` means the clipboard.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Capture(CaptureArgs),
    Help,
    Version,
}

#[derive(Parser, Debug)]
#[command(
    name = "boxcutter",
    disable_help_flag = true,
    disable_version_flag = true,
    args_override_self = true
)]
struct RawArgs {
    #[arg(short = 'c', long = "coords", value_name = "X1,Y1,X2,Y2", allow_hyphen_values = true)]
    coords: Option<String>,

    #[arg(short = 'f', long = "fullscreen")]
    fullscreen: bool,

    #[arg(short = 'v', long = "version")]
    version: bool,

    #[arg(short = 'h', long = "help")]
    help: bool,

    /// The first value is the output file; anything after it is ignored.
    #[arg(value_name = "OUTPUT_FILENAME", trailing_var_arg = true, num_args = 1..)]
    rest: Vec<OsString>,
}

/// Parse a full argument vector, program name first.
pub fn parse_args<I, T>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = RawArgs::command()
        .try_get_matches_from(args)
        .map_err(from_clap_error)?;
    let raw = RawArgs::from_arg_matches(&matches).map_err(from_clap_error)?;

    // Options that end parsing, in the order they were given.
    let mut terminal: Vec<(usize, Terminal)> = Vec::new();
    if raw.help {
        terminal.push((index_of(&matches, "help"), Terminal::Help));
    }
    if raw.version {
        terminal.push((index_of(&matches, "version"), Terminal::Version));
    }
    let coords = match raw.coords.as_deref() {
        Some(text) => match text.parse::<CaptureRect>() {
            Ok(rect) => Some(rect),
            Err(_) => {
                terminal.push((index_of(&matches, "coords"), Terminal::BadCoords));
                None
            }
        },
        None => None,
    };
    terminal.sort_by_key(|(index, _)| *index);
    if let Some((_, first)) = terminal.first() {
        return match first {
            Terminal::Help => Ok(Command::Help),
            Terminal::Version => Ok(Command::Version),
            Terminal::BadCoords => Err(CliError::bad_coords()),
        };
    }

    // With both -c and -f, the later one wins.
    let region = match (coords, raw.fullscreen) {
        (Some(rect), true) if index_of(&matches, "coords") > index_of(&matches, "fullscreen") => {
            RegionSource::Coords(rect)
        }
        (Some(_), true) => RegionSource::FullScreen,
        (Some(rect), false) => RegionSource::Coords(rect),
        (None, true) => RegionSource::FullScreen,
        (None, false) => RegionSource::Interactive,
    };

    Ok(Command::Capture(CaptureArgs {
        region,
        output: raw.rest.into_iter().next().map(PathBuf::from),
    }))
}

#[derive(Debug, Clone, Copy)]
enum Terminal {
    Help,
    Version,
    BadCoords,
}

fn index_of(matches: &ArgMatches, id: &str) -> usize {
    matches.index_of(id).unwrap_or(usize::MAX)
}

fn from_clap_error(err: clap::Error) -> CliError {
    match err.kind() {
        ErrorKind::UnknownArgument => {
            let arg = err
                .get(ContextKind::InvalidArg)
                .map(ToString::to_string)
                .unwrap_or_default();
            CliError::UnknownOption(arg)
        }
        ErrorKind::InvalidValue | ErrorKind::NoEquals | ErrorKind::WrongNumberOfValues => {
            CliError::missing_coords()
        }
        ErrorKind::InvalidUtf8 => {
            CliError::MalformedArgument("arguments must be valid unicode".to_string())
        }
        _ => {
            let rendered = err.to_string();
            let line = rendered.lines().next().unwrap_or_default();
            CliError::MalformedArgument(line.trim_start_matches("error: ").to_string())
        }
    }
}
