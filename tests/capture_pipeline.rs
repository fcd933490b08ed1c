mod common;

use std::ffi::OsString;
use std::fs;
use std::io::Read;

use flate2::read::ZlibDecoder;
use sc_capture::CaptureRect;
use sc_capture::bmp::{FILE_HEADER_SIZE, FileHeader, InfoHeader};
use sc_capture::png::{ChunkReader, TAG_IDAT, TAG_IEND, TAG_IHDR};
use sc_settings::Settings;

use common::{ScriptedPlatform, args, desktop_pixel, run};

fn with_output(mut items: Vec<OsString>, path: &std::path::Path) -> Vec<OsString> {
    items.push(path.as_os_str().to_owned());
    items
}

#[test]
fn swapped_coords_save_png_regardless_of_suffix_case() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shot.PNG");
    let mut platform = ScriptedPlatform::default();

    let result = run(
        &mut platform,
        &Settings::default(),
        &with_output(args(&["-c", "100,100,10,10"]), &path),
    );

    assert_eq!(result.status, 0, "{}", result.stderr);
    assert_eq!(platform.captures, vec![CaptureRect::new(10, 10, 100, 100)]);
    assert!(result.stdout.starts_with("screenshot coords: (10,10)-(100,100)\n"));
    assert!(
        result
            .stdout
            .contains(&format!("screenshot saved to file: {}", path.display()))
    );

    let bytes = fs::read(&path).unwrap();
    let img = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
        .unwrap()
        .to_rgb8();
    assert_eq!(img.dimensions(), (90, 90));
    assert_eq!(img.get_pixel(0, 0).0, desktop_pixel(10, 10));
    assert_eq!(img.get_pixel(89, 0).0, desktop_pixel(99, 10));
    assert_eq!(img.get_pixel(5, 70).0, desktop_pixel(15, 80));
}

#[test]
fn png_chunks_carry_valid_crcs_and_filtered_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small-chunks.png");
    let settings = Settings {
        png_idat_chunk_size: 97,
        ..Settings::default()
    };
    let mut platform = ScriptedPlatform::default();

    let result = run(
        &mut platform,
        &settings,
        &with_output(args(&["--coords", "3,4,40,30"]), &path),
    );
    assert_eq!(result.status, 0, "{}", result.stderr);

    let bytes = fs::read(&path).unwrap();
    let chunks: Vec<_> = ChunkReader::new(&bytes).unwrap().collect();
    assert_eq!(chunks.first().unwrap().tag, TAG_IHDR);
    assert_eq!(chunks.last().unwrap().tag, TAG_IEND);
    assert!(chunks.iter().all(|c| c.crc_matches()));

    let idat: Vec<_> = chunks.iter().filter(|c| c.tag == TAG_IDAT).collect();
    assert!(idat.len() > 1);
    assert!(idat.iter().all(|c| c.payload.len() <= 97));

    let stream: Vec<u8> = idat.iter().flat_map(|c| c.payload.iter().copied()).collect();
    let mut rows = Vec::new();
    ZlibDecoder::new(&stream[..]).read_to_end(&mut rows).unwrap();

    let (w, h) = (37usize, 26usize);
    let mut expected = Vec::with_capacity((w * 3 + 1) * h);
    for y in 0..h {
        expected.push(0);
        for x in 0..w {
            expected.extend_from_slice(&desktop_pixel(3 + x as i32, 4 + y as i32));
        }
    }
    assert_eq!(rows, expected);
}

#[test]
fn bmp_output_round_trips_header_and_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("region.bmp");
    let mut platform = ScriptedPlatform::default();

    let result = run(
        &mut platform,
        &Settings::default(),
        &with_output(args(&["-c", "7,9,20,12"]), &path),
    );
    assert_eq!(result.status, 0, "{}", result.stderr);

    let bytes = fs::read(&path).unwrap();
    let fh = FileHeader::parse(&bytes).unwrap();
    let ih = InfoHeader::parse(&bytes[FILE_HEADER_SIZE..]).unwrap();
    assert_eq!(&bytes[..2], b"BM");
    assert_eq!(fh.file_size as usize, bytes.len());
    assert_eq!((ih.width, ih.height, ih.bit_count), (13, 3, 32));

    let img = image::load_from_memory_with_format(&bytes, image::ImageFormat::Bmp)
        .unwrap()
        .to_rgb8();
    assert_eq!(img.dimensions(), (13, 3));
    assert_eq!(img.get_pixel(0, 0).0, desktop_pixel(7, 9));
    assert_eq!(img.get_pixel(12, 2).0, desktop_pixel(19, 11));
}

#[test]
fn unknown_suffix_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shot.xyz");
    let mut platform = ScriptedPlatform::default();

    let result = run(
        &mut platform,
        &Settings::default(),
        &with_output(args(&["-c", "0,0,10,10"]), &path),
    );

    assert_eq!(result.status, 1);
    assert!(result.stderr.contains("unsupported output format"));
    assert_eq!(platform.captures.len(), 1);
    assert!(!path.exists());
}

#[test]
fn missing_filename_goes_to_clipboard() {
    let mut platform = ScriptedPlatform::default();
    let result = run(&mut platform, &Settings::default(), &args(&["-c", "0,0,16,8"]));

    assert_eq!(result.status, 0);
    assert!(result.stdout.ends_with("screenshot saved to clipboard.\n"));
    assert_eq!(platform.clipboard, vec![(16, 8)]);
}

#[test]
fn clipboard_failure_exits_one_without_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut platform = ScriptedPlatform {
        clipboard_fails: true,
        ..ScriptedPlatform::default()
    };

    let result = run(&mut platform, &Settings::default(), &args(&["-c", "0,0,16,8"]));

    assert_eq!(result.status, 1);
    assert!(result.stderr.starts_with("error: cannot save screenshot to clipboard"));
    assert!(!result.stdout.contains("saved"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn empty_region_fails_before_capture() {
    let mut platform = ScriptedPlatform::default();
    let result = run(&mut platform, &Settings::default(), &args(&["-c", "5,5,5,50"]));

    assert_eq!(result.status, 1);
    assert!(result.stderr.contains("empty"));
    assert!(platform.captures.is_empty());
}

#[test]
fn fullscreen_spans_virtual_screen() {
    let mut platform = ScriptedPlatform {
        screen: CaptureRect::new(-64, -8, 64, 32),
        ..ScriptedPlatform::default()
    };
    let result = run(&mut platform, &Settings::default(), &args(&["--fullscreen"]));

    assert_eq!(result.status, 0, "{}", result.stderr);
    assert!(result.stdout.starts_with("screenshot coords: (-64,-8)-(64,32)\n"));
    assert_eq!(platform.clipboard, vec![(128, 40)]);
}

#[test]
fn interactive_selection_is_used_when_no_region_given() {
    let mut platform = ScriptedPlatform {
        selection: Some(CaptureRect::new(50, 60, 20, 30)),
        ..ScriptedPlatform::default()
    };
    let result = run(&mut platform, &Settings::default(), &[]);

    assert_eq!(result.status, 0, "{}", result.stderr);
    assert_eq!(platform.captures, vec![CaptureRect::new(20, 30, 50, 60)]);
}

#[test]
fn cancelled_selection_reports_no_coordinates() {
    let mut platform = ScriptedPlatform::default();
    let result = run(&mut platform, &Settings::default(), &[]);

    assert_eq!(result.status, 1);
    assert_eq!(
        result.stderr,
        "error: cannot retrieve screenshot coordinates\n"
    );
    assert!(platform.captures.is_empty());
}

#[test]
fn coords_line_can_be_disabled() {
    let settings = Settings {
        print_coords: false,
        ..Settings::default()
    };
    let mut platform = ScriptedPlatform::default();
    let result = run(&mut platform, &settings, &args(&["-c", "0,0,4,4"]));

    assert_eq!(result.status, 0);
    assert_eq!(result.stdout, "screenshot saved to clipboard.\n");
}
