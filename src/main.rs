use clap::{CommandFactory, Parser};
use dcmwl::ViewerSession;
use dcmwl::cli::Args;
use dcmwl::dicom::{self, ProcessError};
use dcmwl::display;
use std::path::Path;

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if args.files.is_empty() {
        let _ = Args::command().print_help();
        println!();
        return;
    }

    let multiple_files = args.files.len() > 1;
    let mut any_failed = false;

    for (idx, file_path) in args.files.iter().enumerate() {
        if multiple_files {
            println!("{}", file_path.display());
        }

        if let Err(e) = process_file(file_path, idx, &args) {
            report_error(&e, &args);
            any_failed = true;
        }

        if multiple_files && idx < args.files.len() - 1 {
            println!();
        }
    }

    if any_failed {
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn report_error(error: &ProcessError, args: &Args) {
    if args.verbose
        && let Some(metadata) = error.metadata()
    {
        dcmwl::print_metadata(metadata);
    }

    println!("Error: {error}");
    if let Some(guidance) = error.guidance() {
        println!("{guidance}");
    }
}

/// Process a single DICOM file
fn process_file(file_path: &Path, idx: usize, args: &Args) -> Result<(), ProcessError> {
    // Stage 1: Open DICOM file
    let obj = dicom::open_dicom_file(file_path)?;

    // Stage 2: Metadata never fails; missing tags are left out
    let metadata = dicom::extract_metadata(&obj);

    // Stage 3: Decode and normalize the first frame
    let image = dicom::decode_image(&obj).map_err(|error| ProcessError::ConversionFailed {
        metadata: Box::new(metadata.clone()),
        error,
    })?;

    if args.verbose {
        dcmwl::print_metadata(&metadata);
    }

    // Stage 4: Window operations, in a fixed order
    let mut session = ViewerSession::new();
    session.load(image, metadata);
    apply_window_options(&mut session, args);

    // Stage 5: Render and display
    let buffer = if args.rgb {
        session.rgb_display_buffer()
    } else {
        session.display_buffer().cloned()
    };

    let result = match buffer {
        Some(buffer) => match (&args.output, session.metadata()) {
            (Some(output), _) => display::save_png(&buffer, &display::output_path(output, idx, args.files.len())),
            (None, Some(metadata)) => display::print_image(&buffer, metadata, args),
            (None, None) => Ok(()),
        },
        None => Ok(()),
    };

    result.map_err(|error| ProcessError::DisplayFailed {
        metadata: Box::new(session.metadata().cloned().unwrap_or_else(|| dicom::extract_metadata(&obj))),
        error,
    })
}

/// `--auto`, then `-c`/`-w`, then `--reset`
fn apply_window_options(session: &mut ViewerSession, args: &Args) {
    if args.auto && session.auto_window().is_none() {
        log::warn!("auto window has no effect on color images");
    }

    if args.has_window_override()
        && let Some(current) = session.window()
    {
        session.set_window(
            args.center.unwrap_or(current.center),
            args.window_width.unwrap_or(current.width),
        );
    }

    if args.reset {
        session.reset_window();
    }

    if let Some(window) = session.window() {
        log::debug!("rendering with window center={} width={}", window.center, window.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use dcmwl::ErrorKind;
    use dcmwl::dicom::{DicomMetadata, ImageCharacteristics, PhotometricInterpretation, WindowInfo};
    use dcmwl::image::{CanonicalImage, PixelData, WindowLevel};
    use dcmwl::types::{BitDepth, Dimensions, EquipmentInfo, PatientInfo, SeriesInfo, StudyInfo, TransferSyntax};
    use std::io::Write;

    fn session() -> ViewerSession {
        let image = CanonicalImage::new(
            PixelData::Grayscale((0..100).map(|i| i * 600).collect()),
            Dimensions::new(10, 10),
            PhotometricInterpretation::Monochrome2,
            BitDepth::new(16, 16),
            1,
            false,
            WindowLevel::new(20000, 4000),
        )
        .unwrap();
        let metadata = DicomMetadata {
            patient: PatientInfo::default(),
            study: StudyInfo::default(),
            series: SeriesInfo::default(),
            equipment: EquipmentInfo::default(),
            image: ImageCharacteristics::default(),
            window: WindowInfo::default(),
            sop_class: None,
            sop_instance_uid: None,
            transfer_syntax: TransferSyntax::new(String::new(), String::new()),
        };

        let mut session = ViewerSession::new();
        session.load(image, metadata);
        session
    }

    #[test]
    fn test_partial_window_override_keeps_other_value() {
        let mut session = session();
        let args = Args {
            center: Some(30000),
            ..Args::default()
        };
        apply_window_options(&mut session, &args);
        assert_eq!(session.window(), Some(WindowLevel::new(30000, 4000)));
    }

    #[test]
    fn test_reset_runs_last() {
        let mut session = session();
        let args = Args {
            auto: true,
            window_width: Some(10),
            reset: true,
            ..Args::default()
        };
        apply_window_options(&mut session, &args);
        assert_eq!(session.window(), Some(WindowLevel::new(20000, 4000)));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let path = Path::new("/nonexistent/missing.dcm");
        let result = process_file(path, 0, &Args::default());
        assert_matches!(result, Err(ProcessError::Load(ref e)) if e.kind == ErrorKind::FileNotFound);
    }

    #[test]
    fn test_invalid_file_has_guidance() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"plain text").unwrap();

        let error = process_file(file.path(), 0, &Args::default()).unwrap_err();
        assert!(error.metadata().is_none());
        assert!(error.guidance().is_some());
    }
}
