//! grayfade: render a grayscale transition between two images.
//!
//! Loads a start and a target image, converts both to grayscale, runs the
//! selected transitioner and writes the frames as an animated GIF and,
//! optionally, an MJPEG AVI.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin grayfade -- [OPTIONS] <START> <TARGET>
//! ```
//!
//! Settings can also come from a JSON file (`--config`); flags given on
//! the command line take precedence over the file.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use grayfade_export::{AviOptions, GifOptions};
use grayfade_pipeline::{
    Dimensions, GrayImage, SearchController, SearchStats, TracingObserver, TransitionConfig,
    TransitionerKind,
};

/// Default GIF path when neither the flags nor the config file name one.
const DEFAULT_GIF_PATH: &str = "out.gif";

/// Morph one grayscale image into another and save the animation.
#[derive(Parser)]
#[command(name = "grayfade", version)]
struct Cli {
    /// Start image (PNG, JPEG, BMP, WebP, GIF).
    start: Option<PathBuf>,

    /// Target image; must have the same dimensions as the start image.
    target: Option<PathBuf>,

    /// Frame producer.
    #[arg(long, value_enum)]
    transitioner: Option<Kind>,

    /// Sampling stride: only pixels at multiples of this are matched.
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    scale: Option<u32>,

    /// Search iterations between prune passes and progress reports.
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    batch_size: Option<u32>,

    /// Relaxation rounds for the diffusion transitioners.
    #[arg(long)]
    iterations: Option<u32>,

    /// Candidate moves kept per pixel per expansion.
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    branching_factor: Option<usize>,

    /// Write the animation as a GIF to this path [default: out.gif].
    #[arg(long)]
    gif: Option<PathBuf>,

    /// Also write the animation as an MJPEG AVI to this path.
    #[arg(long)]
    avi: Option<PathBuf>,

    /// AVI playback rate in frames per second.
    #[arg(long)]
    fps: Option<u32>,

    /// GIF frame delay in milliseconds.
    #[arg(long)]
    delay_ms: Option<u32>,

    /// JSON settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the run summary as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Log more (repeat for more detail).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Transitioner selection.
#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    /// Greedy best-first search, one pixel per frame.
    Search,
    /// Whole-frame relaxation toward the target.
    Iterative,
    /// Relaxation from both ends until they meet.
    Bidirectional,
}

impl From<Kind> for TransitionerKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Search => Self::Search,
            Kind::Iterative => Self::Iterative,
            Kind::Bidirectional => Self::Bidirectional,
        }
    }
}

/// Shape of the `--config` JSON file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    /// Start image path.
    #[serde(alias = "start")]
    input: Option<PathBuf>,
    /// Target image path.
    #[serde(alias = "target")]
    output: Option<PathBuf>,
    gif: Option<PathBuf>,
    avi: Option<PathBuf>,
    fps: Option<u32>,
    delay_ms: Option<u32>,
    transition: TransitionConfig,
}

/// Fully resolved settings for one run.
#[derive(Debug)]
struct Settings {
    start: PathBuf,
    target: PathBuf,
    gif: PathBuf,
    avi: Option<PathBuf>,
    gif_options: GifOptions,
    avi_options: AviOptions,
    transition: TransitionConfig,
}

/// What the run produced, printed at the end.
#[derive(Debug, Serialize)]
struct RunSummary {
    transitioner: TransitionerKind,
    dimensions: Dimensions,
    frames: usize,
    elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<SearchStats>,
}

impl RunSummary {
    fn report(&self) -> String {
        let mut lines = vec![
            format!("Transitioner: {}", self.transitioner),
            format!("Dimensions:   {}", self.dimensions),
            format!("Frames:       {}", self.frames),
            format!("Elapsed:      {:.3}ms", self.elapsed_ms),
        ];
        if let Some(stats) = &self.search {
            lines.push(String::new());
            lines.push(stats.report());
        }
        lines.join("\n")
    }
}

/// Merge the config file (if any) under the command-line flags.
fn settings_from_cli(cli: &Cli) -> Result<Settings, String> {
    let file = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
            serde_json::from_str::<FileConfig>(&text)
                .map_err(|e| format!("Error parsing {}: {e}", path.display()))?
        }
        None => FileConfig::default(),
    };

    let start = cli
        .start
        .clone()
        .or(file.input)
        .ok_or("missing start image (pass <START> or set \"input\" in --config)")?;
    let target = cli
        .target
        .clone()
        .or(file.output)
        .ok_or("missing target image (pass <TARGET> or set \"output\" in --config)")?;

    let mut transition = file.transition;
    if let Some(kind) = cli.transitioner {
        transition.transitioner = kind.into();
    }
    if let Some(scale) = cli.scale {
        transition.scale = scale;
    }
    if let Some(batch_size) = cli.batch_size {
        transition.batch_size = batch_size;
    }
    if let Some(iterations) = cli.iterations {
        transition.iterations = iterations;
    }
    if let Some(branching_factor) = cli.branching_factor {
        transition.branching_factor = branching_factor;
    }
    transition.validate().map_err(|e| e.to_string())?;

    Ok(Settings {
        start,
        target,
        gif: cli
            .gif
            .clone()
            .or(file.gif)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GIF_PATH)),
        avi: cli.avi.clone().or(file.avi),
        gif_options: GifOptions {
            delay_ms: cli
                .delay_ms
                .or(file.delay_ms)
                .unwrap_or(GifOptions::DEFAULT_DELAY_MS),
            ..GifOptions::default()
        },
        avi_options: AviOptions {
            fps: cli.fps.or(file.fps).unwrap_or(AviOptions::DEFAULT_FPS),
            ..AviOptions::default()
        },
        transition,
    })
}

/// Read and decode one image as grayscale.
fn load_gray(path: &Path) -> Result<GrayImage, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    grayfade_pipeline::grayscale::decode_and_grayscale(&bytes)
        .map_err(|e| format!("Error loading {}: {e}", path.display()))
}

/// Run the configured transitioner, collecting search statistics when
/// the search is used.
fn produce_frames(
    start: &GrayImage,
    target: &GrayImage,
    config: &TransitionConfig,
) -> Result<(Vec<GrayImage>, Option<SearchStats>), String> {
    let mut observer = TracingObserver;
    match config.transitioner {
        TransitionerKind::Search => {
            let mut search = SearchController::new(start, target, &config.search_config())
                .map_err(|e| format!("Transition error: {e}"))?;
            let result = search.run(&mut observer);
            let stats = search.stats();
            match result {
                Ok(frames) => Ok((frames, Some(stats))),
                Err(e) => Err(format!("Transition error: {e}\n\n{}", stats.report())),
            }
        }
        _ => grayfade_pipeline::transition_with_observer(start, target, config, &mut observer)
            .map(|frames| (frames, None))
            .map_err(|e| format!("Transition error: {e}")),
    }
}

/// Encode and write every requested output file.
fn write_outputs(settings: &Settings, frames: &[GrayImage]) -> Result<(), String> {
    let gif = grayfade_export::to_gif(frames, &settings.gif_options)
        .map_err(|e| format!("Error encoding GIF: {e}"))?;
    write_file(&settings.gif, &gif, "GIF")?;

    if let Some(avi_path) = &settings.avi {
        let avi = grayfade_export::to_avi(frames, &settings.avi_options)
            .map_err(|e| format!("Error encoding AVI: {e}"))?;
        write_file(avi_path, &avi, "AVI")?;
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8], label: &str) -> Result<(), String> {
    std::fs::write(path, bytes)
        .map_err(|e| format!("Error writing {label} to {}: {e}", path.display()))?;
    eprintln!("{label} written to {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let settings = settings_from_cli(cli)?;

    let start = load_gray(&settings.start)?;
    let target = load_gray(&settings.target)?;
    eprintln!(
        "Start: {} ({}), target: {} ({})",
        settings.start.display(),
        Dimensions::of(&start),
        settings.target.display(),
        Dimensions::of(&target),
    );

    let began = Instant::now();
    let (frames, search) = produce_frames(&start, &target, &settings.transition)?;
    let elapsed = began.elapsed();

    let summary = RunSummary {
        transitioner: settings.transition.transitioner,
        dimensions: Dimensions::of(&start),
        frames: frames.len(),
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        search,
    };
    if cli.json {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| format!("Error serializing summary: {e}"))?;
        println!("{json}");
    } else {
        println!("{}", summary.report());
    }

    write_outputs(&settings, &frames)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("grayfade").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_without_config() {
        let settings = settings_from_cli(&parse(&["a.png", "b.png"])).unwrap();
        assert_eq!(settings.start, PathBuf::from("a.png"));
        assert_eq!(settings.target, PathBuf::from("b.png"));
        assert_eq!(settings.gif, PathBuf::from(DEFAULT_GIF_PATH));
        assert!(settings.avi.is_none());
        assert_eq!(settings.gif_options, GifOptions::default());
        assert_eq!(settings.avi_options, AviOptions::default());
        assert_eq!(settings.transition, TransitionConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "a.png",
            "b.png",
            "--transitioner",
            "bidirectional",
            "--scale",
            "3",
            "--iterations",
            "7",
            "--avi",
            "x.avi",
            "--fps",
            "24",
            "--delay-ms",
            "80",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        let settings = settings_from_cli(&cli).unwrap();
        assert_eq!(
            settings.transition.transitioner,
            TransitionerKind::Bidirectional
        );
        assert_eq!(settings.transition.scale, 3);
        assert_eq!(settings.transition.iterations, 7);
        assert_eq!(settings.avi, Some(PathBuf::from("x.avi")));
        assert_eq!(settings.avi_options.fps, 24);
        assert_eq!(settings.gif_options.delay_ms, 80);
    }

    #[test]
    fn zero_scale_is_rejected_by_clap() {
        let result = Cli::try_parse_from(["grayfade", "a.png", "b.png", "--scale", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_images_are_reported() {
        let err = settings_from_cli(&parse(&[])).unwrap_err();
        assert!(err.contains("missing start image"));
    }

    #[test]
    fn file_config_parses_partial_json() {
        let file: FileConfig = serde_json::from_str(
            r#"{"input": "in.png", "target": "out.png", "fps": 5, "transition": {"transitioner": "iterative", "iterations": 3}}"#,
        )
        .unwrap();
        assert_eq!(file.input, Some(PathBuf::from("in.png")));
        assert_eq!(file.output, Some(PathBuf::from("out.png")));
        assert_eq!(file.fps, Some(5));
        assert_eq!(file.transition.transitioner, TransitionerKind::Iterative);
        assert_eq!(file.transition.iterations, 3);
        assert_eq!(file.transition.scale, TransitionConfig::DEFAULT_SCALE);
    }

    #[test]
    fn file_config_rejects_unknown_keys() {
        assert!(serde_json::from_str::<FileConfig>(r#"{"inptu": "a.png"}"#).is_err());
    }

    #[test]
    fn summary_json_omits_missing_search_stats() {
        let summary = RunSummary {
            transitioner: TransitionerKind::Iterative,
            dimensions: Dimensions {
                width: 2,
                height: 3,
            },
            frames: 12,
            elapsed_ms: 1.5,
            search: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["transitioner"], "iterative");
        assert_eq!(json["frames"], 12);
        assert!(json.get("search").is_none());
        assert!(summary.report().contains("Frames:       12"));
    }
}
