use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use facelens_core::camera::domain::camera_source::{CameraAccess, VideoConstraints};
use facelens_core::camera::infrastructure::nokhwa_camera::{NokhwaAccess, NokhwaCamera};
use facelens_core::detection::domain::analysis_config::{AnalysisConfig, DetectorModel};
use facelens_core::detection::domain::face_analyzer::FaceAnalyzer;
use facelens_core::detection::infrastructure::onnx_face_analyzer::OnnxFaceAnalyzer;
use facelens_core::pipeline::analyze_image_use_case::AnalyzeImageUseCase;
use facelens_core::pipeline::live_session_use_case::LiveSessionUseCase;
use facelens_core::session::display_state::{DisplayState, GenderLabels};
use facelens_core::session::snapshot::SnapshotReport;
use facelens_core::shared::constants::{
    DEFAULT_MODELS_DIR, IMAGE_EXTENSIONS, MAX_GAZE_THRESHOLD_PX, MIN_GAZE_THRESHOLD_PX,
};
use facelens_core::shared::model_resolver::{self, ModelSource};

/// Live face attribute detection: age, gender, smile and gaze.
#[derive(Parser)]
#[command(name = "facelens")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List capture devices.
    Cameras,
    /// Analyze a still image once and print the result.
    Analyze {
        /// Input image file.
        image: PathBuf,

        /// Also write a copy with the face overlay drawn in.
        #[arg(long)]
        annotate: Option<PathBuf>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Run a headless live session and log the status line per detection.
    Live {
        /// Camera device index.
        #[arg(long, default_value = "0")]
        camera: u32,

        /// Stop after this many detections (0 = run until interrupted).
        #[arg(long, default_value = "0")]
        ticks: u64,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

#[derive(Args, Clone, Debug)]
struct AnalysisArgs {
    /// Face detector: tiny or accurate.
    #[arg(long, default_value = "tiny")]
    detector: String,

    /// Minimum face detection confidence (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Maximum number of faces analyzed per frame.
    #[arg(long, default_value = "5")]
    max_faces: usize,

    /// Eye-center/nose-tip offset in pixels below which the subject is
    /// looking at the camera (15-18).
    #[arg(long, default_value = "15")]
    gaze_threshold: f64,

    /// Minimum milliseconds between two detections.
    #[arg(long, default_value = "500")]
    interval_ms: u64,

    /// Directory with bundled model files.
    #[arg(long, default_value = DEFAULT_MODELS_DIR)]
    models_dir: PathBuf,

    /// Download missing models from `{URL}/{model name}`.
    #[arg(long)]
    model_base_url: Option<String>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Cameras => list_cameras(),
        Command::Analyze {
            image,
            annotate,
            analysis,
        } => {
            validate(&analysis)?;
            validate_image(&image)?;
            run_analyze(&image, annotate.as_deref(), &analysis)
        }
        Command::Live {
            camera,
            ticks,
            analysis,
        } => {
            validate(&analysis)?;
            run_live(camera, ticks, &analysis)
        }
    }
}

fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let devices = NokhwaAccess.devices()?;
    if devices.is_empty() {
        println!("No cameras found");
        return Ok(());
    }
    println!("{:<5} | {:<30} | Description", "Index", "Name");
    println!("{}", "-".repeat(60));
    for d in devices {
        println!("{:<5} | {:<30} | {}", d.index, d.name, d.description);
    }
    Ok(())
}

fn run_analyze(
    image: &Path,
    annotate: Option<&Path>,
    args: &AnalysisArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = analysis_config(args)?;
    let analyzer = build_analyzer(args, config.detector)?;

    let mut use_case = AnalyzeImageUseCase::new(analyzer, config);
    let analysis = use_case.execute(image, annotate)?;

    let labels = GenderLabels::default();
    match &analysis.report {
        SnapshotReport::NoFace => println!("No face found"),
        SnapshotReport::Face {
            age,
            gender,
            is_smiling,
            confidence,
        } => {
            println!("Age:        {:.0}", age.round());
            println!("Gender:     {}", labels.label(*gender));
            println!("Smiling:    {}", if *is_smiling { "yes" } else { "no" });
            println!("Confidence: {:.0}%", confidence * 100.0);
        }
    }
    if let Some(scene) = &analysis.scene {
        println!("Caption:    {}", scene.caption.text);
        for label in &scene.expressions {
            println!("            {}", label.text);
        }
    }
    if analysis.face_count > 1 {
        log::info!(
            "{} faces found, reported the largest",
            analysis.face_count
        );
    }
    Ok(())
}

fn run_live(
    camera: u32,
    ticks: u64,
    args: &AnalysisArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = analysis_config(args)?;
    let analyzer = build_analyzer(args, config.detector)?;

    let mut use_case = LiveSessionUseCase::new(
        Box::new(NokhwaAccess),
        Box::new(NokhwaCamera::new()),
        analyzer,
        config,
        VideoConstraints::with_device(camera),
    );

    let labels = GenderLabels::default();
    let max_ticks = (ticks > 0).then_some(ticks);
    let summary = use_case.execute(max_ticks, &mut |display: &DisplayState| {
        log::info!("{}", display.status_line(&labels));
    })?;

    log::info!(
        "{} detections over {} frames, face in {}, {} failed",
        summary.ticks,
        summary.frames,
        summary.frames_with_face,
        summary.failures
    );
    Ok(())
}

fn analysis_config(args: &AnalysisArgs) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    Ok(AnalysisConfig {
        detector: args.detector.parse::<DetectorModel>()?,
        max_faces: args.max_faces,
        min_confidence: args.confidence,
        gaze_threshold_px: args.gaze_threshold,
        detection_interval: Duration::from_millis(args.interval_ms),
        ..AnalysisConfig::default()
    })
}

fn build_analyzer(
    args: &AnalysisArgs,
    detector: DetectorModel,
) -> Result<Box<dyn FaceAnalyzer>, Box<dyn std::error::Error>> {
    let source = ModelSource {
        models_dir: args.models_dir.clone(),
        base_url: args.model_base_url.clone(),
    };
    let paths = model_resolver::resolve_models(detector, &source, Some(&download_progress))?;
    eprintln!();
    Ok(Box::new(OnnxFaceAnalyzer::load(&paths, detector)?))
}

fn validate(args: &AnalysisArgs) -> Result<(), Box<dyn std::error::Error>> {
    args.detector.parse::<DetectorModel>()?;
    if !(0.0..=1.0).contains(&args.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            args.confidence
        )
        .into());
    }
    if args.max_faces == 0 {
        return Err("Max faces must be at least 1".into());
    }
    if !(MIN_GAZE_THRESHOLD_PX..=MAX_GAZE_THRESHOLD_PX).contains(&args.gaze_threshold) {
        return Err(format!(
            "Gaze threshold must be between {MIN_GAZE_THRESHOLD_PX} and {MAX_GAZE_THRESHOLD_PX} px, got {}",
            args.gaze_threshold
        )
        .into());
    }
    if args.interval_ms == 0 {
        return Err("Interval must be at least 1 ms".into());
    }
    Ok(())
}

fn validate_image(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Input file not found: {}", path.display()).into());
    }
    if !is_image(path) {
        return Err(format!(
            "Unsupported image type: {} (expected one of {})",
            path.display(),
            IMAGE_EXTENSIONS.join(", ")
        )
        .into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn live_args(extra: &[&str]) -> AnalysisArgs {
        let mut args = vec!["facelens", "live"];
        args.extend_from_slice(extra);
        match parse(&args).command {
            Command::Live { analysis, .. } => analysis,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let args = live_args(&[]);
        assert!(validate(&args).is_ok());
        let config = analysis_config(&args).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_accurate_detector_is_accepted() {
        let args = live_args(&["--detector", "accurate"]);
        assert_eq!(
            analysis_config(&args).unwrap().detector,
            DetectorModel::Accurate
        );
    }

    #[test]
    fn test_gaze_threshold_out_of_range() {
        assert!(validate(&live_args(&["--gaze-threshold", "18"])).is_ok());
        assert!(validate(&live_args(&["--gaze-threshold", "20"])).is_err());
        assert!(validate(&live_args(&["--gaze-threshold", "10"])).is_err());
    }

    #[test]
    fn test_confidence_out_of_range() {
        assert!(validate(&live_args(&["--confidence", "1.5"])).is_err());
    }

    #[test]
    fn test_unknown_detector_rejected() {
        assert!(validate(&live_args(&["--detector", "huge"])).is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(validate(&live_args(&["--interval-ms", "0"])).is_err());
    }

    #[test]
    fn test_analyze_parses_annotate() {
        let cli = parse(&["facelens", "analyze", "in.jpg", "--annotate", "out.png"]);
        match cli.command {
            Command::Analyze {
                image, annotate, ..
            } => {
                assert_eq!(image, PathBuf::from("in.jpg"));
                assert_eq!(annotate, Some(PathBuf::from("out.png")));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("a/b.JPG")));
        assert!(!is_image(Path::new("clip.mp4")));
        assert!(!is_image(Path::new("noext")));
    }
}
