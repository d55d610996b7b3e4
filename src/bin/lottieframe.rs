use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record};
use lottieframe::{
    ConversionOptions, ConversionSummary, CropAnchor, CropRequest, EmbedMode, FfmpegLogLevel,
    LottieFrameError, OperationType, OutputFormat, ProgressCallback, ProgressInfo, ScaleRequest,
    SourceKind,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  lottieframe convert renders/ --out anim --fps 15\n  lottieframe convert clip.mp4 --out anim --width 360 --format webp --quality 80 --progress\n  lottieframe inspect clip.mp4 --fps 12 --json\n  lottieframe completions zsh > _lottieframe";

#[derive(Debug, Parser)]
#[command(
    name = "lottieframe",
    version,
    about = "Turn image sequences and videos into frame-by-frame Lottie animations",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while decoding and encoding.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Worker thread count for parallel encoding (requires the `rayon` feature).
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Options shared by `convert` and `inspect`.
#[derive(Debug, Args, Clone)]
struct PlanArgs {
    /// Playback rate of the animation. Defaults to the source rate.
    #[arg(long)]
    fps: Option<f64>,

    /// Rate the source was captured at. Overrides the rate reported by a
    /// video. Image sequences default to --fps (keeping every image), or to
    /// 30 when --fps is not given either.
    #[arg(long)]
    source_fps: Option<f64>,

    /// Output width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Scale factor applied when neither --width nor --height is given.
    #[arg(long)]
    scale: Option<f64>,

    /// Derive a missing output dimension from the cropped aspect ratio.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    keep_aspect: bool,

    /// Crop width in pixels, applied before scaling.
    #[arg(long)]
    crop_width: Option<u32>,

    /// Crop height in pixels, applied before scaling.
    #[arg(long)]
    crop_height: Option<u32>,

    /// Crop anchor (center, top-left).
    #[arg(long, default_value = "center")]
    crop_anchor: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert an image directory or video into a Lottie document.
    #[command(
        about = "Convert frames into a Lottie animation",
        after_help = "Examples:\n  lottieframe convert renders/ --out anim\n  lottieframe convert clip.mp4 --out anim --fps 12 --crop-width 720 --crop-height 720 --width 360 --embed external"
    )]
    Convert {
        /// Directory of images or a video file.
        input: PathBuf,

        /// Output directory for the JSON document and external assets.
        #[arg(long)]
        out: PathBuf,

        /// Asset image format (png, webp).
        #[arg(long, default_value = "png")]
        format: String,

        /// WebP quality from 0 to 100.
        #[arg(long, default_value_t = 75.0)]
        quality: f32,

        /// Encode WebP losslessly.
        #[arg(long)]
        lossless: bool,

        /// Asset placement (embedded, external).
        #[arg(long, default_value = "embedded")]
        embed: String,

        /// Document name. Defaults to the input file or directory name.
        #[arg(long)]
        name: Option<String>,

        /// Allow overwriting an existing document.
        #[arg(long)]
        overwrite: bool,

        #[command(flatten)]
        plan: PlanArgs,
    },

    /// Show the frames and canvas a conversion would produce.
    #[command(
        about = "Plan a conversion without encoding",
        visible_alias = "plan",
        after_help = "Examples:\n  lottieframe inspect renders/\n  lottieframe inspect clip.mp4 --fps 10 --width 320 --json"
    )]
    Inspect {
        /// Directory of images or a video file.
        input: PathBuf,

        /// Output the plan as machine-readable JSON.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        plan: PlanArgs,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let label = match record.level() {
            Level::Error => "error:".red().bold(),
            Level::Warn => "warning:".yellow().bold(),
            Level::Info => "info:".cyan().bold(),
            Level::Debug | Level::Trace => "debug:".dimmed(),
        };
        eprintln!("{label} {}", record.args());
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }

    /// Handle to the shared bar, for clearing it once the work is done.
    fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let label = match info.operation {
            OperationType::FrameAcquisition => "decoding",
            OperationType::AssetEncoding => "encoding",
            _ => "working",
        };
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        self.bar.set_message(label);
    }
}

fn parse_output_format(
    value: &str,
    quality: f32,
    lossless: bool,
) -> Result<OutputFormat, Box<dyn std::error::Error>> {
    match value.to_ascii_lowercase().as_str() {
        "png" => Ok(OutputFormat::Png),
        "webp" => {
            if !(0.0..=100.0).contains(&quality) {
                return Err(format!("--quality must be between 0 and 100, got {quality}").into());
            }
            Ok(OutputFormat::Webp { quality, lossless })
        }
        other => Err(format!("unsupported --format: {other} (png|webp)").into()),
    }
}

fn parse_embed_mode(value: &str) -> Option<EmbedMode> {
    match value.to_ascii_lowercase().as_str() {
        "embedded" | "embed" | "inline" => Some(EmbedMode::Embedded),
        "external" | "files" => Some(EmbedMode::External),
        _ => None,
    }
}

fn parse_crop_anchor(value: &str) -> Option<CropAnchor> {
    match value.to_ascii_lowercase().as_str() {
        "center" | "centre" => Some(CropAnchor::Center),
        "top-left" | "topleft" | "origin" => Some(CropAnchor::TopLeft),
        _ => None,
    }
}

fn scale_request(args: &PlanArgs) -> Option<ScaleRequest> {
    let request = match (args.width, args.height, args.scale) {
        (Some(width), Some(height), _) => ScaleRequest::exact(width, height),
        (Some(width), None, _) => ScaleRequest::width(width),
        (None, Some(height), _) => ScaleRequest::height(height),
        (None, None, Some(factor)) => ScaleRequest::factor(factor),
        (None, None, None) => return None,
    };
    Some(request.with_maintain_aspect_ratio(args.keep_aspect))
}

fn plan_options(args: &PlanArgs) -> Result<ConversionOptions, Box<dyn std::error::Error>> {
    let mut options = ConversionOptions::new();

    if let Some(fps) = args.fps {
        options = options.with_target_frame_rate(fps)?;
    }
    if let Some(fps) = args.source_fps {
        options = options.with_original_frame_rate(fps)?;
    }

    let anchor = parse_crop_anchor(&args.crop_anchor)
        .ok_or(format!("unsupported --crop-anchor: {}", args.crop_anchor))?;
    let crop = CropRequest::new(args.crop_width, args.crop_height, anchor);
    if crop.is_active() {
        options = options.with_crop(crop);
    }

    if let Some(scale) = scale_request(args) {
        options = options.with_scale(scale);
    }

    Ok(options)
}

fn attach_progress(
    options: ConversionOptions,
    global: &GlobalOptions,
) -> Result<(ConversionOptions, Option<ProgressBar>), Box<dyn std::error::Error>> {
    if !global.progress {
        return Ok((options, None));
    }
    let progress = TerminalProgress::new()?;
    let bar = progress.bar();
    Ok((options.with_progress(Arc::new(progress)), Some(bar)))
}

/// Run a conversion and clear the progress bar, whether it succeeded or not,
/// before anything else is printed.
fn convert_with_progress(
    input: &Path,
    out: &Path,
    options: &ConversionOptions,
    progress: Option<ProgressBar>,
) -> Result<ConversionSummary, LottieFrameError> {
    let result = lottieframe::convert(input, out, options);
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    result
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    log::set_logger(&LOGGER).map_err(|error| error.to_string())?;
    log::set_max_level(if global.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });

    let ffmpeg_level = match &global.log_level {
        Some(level) => level.parse::<FfmpegLogLevel>()?,
        None => FfmpegLogLevel::Error,
    };
    lottieframe::set_ffmpeg_log_level(ffmpeg_level);

    if let Some(threads) = global.threads.filter(|&threads| threads > 0) {
        #[cfg(feature = "rayon")]
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;

        #[cfg(not(feature = "rayon"))]
        log::warn!("--threads {threads} requires building with the `rayon` feature");
    }

    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Convert {
            input,
            out,
            format,
            quality,
            lossless,
            embed,
            name,
            overwrite,
            plan,
        } => {
            let embed_mode =
                parse_embed_mode(&embed).ok_or(format!("unsupported --embed: {embed}"))?;
            let output_format = parse_output_format(&format, quality, lossless)?;
            let name = lottieframe::document_name(&input, name.as_deref());

            let document_path = out.join(format!("{name}.json"));
            if document_path.exists() {
                if !overwrite {
                    return Err(format!(
                        "output already exists: {} (use --overwrite to replace)",
                        document_path.display()
                    )
                    .into());
                }
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("overwriting {}", document_path.display()).yellow()
                );
            }

            let options = plan_options(&plan)?
                .with_output_format(output_format)
                .with_embed_mode(embed_mode)
                .with_name(name);
            let (options, progress) = attach_progress(options, &cli.global)?;

            let summary = convert_with_progress(&input, &out, &options, progress)?;

            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "{} of {} frame(s) at {} fps, {}x{} -> {} ({} bytes)",
                    summary.plan.selected.len(),
                    summary.plan.frame_count,
                    summary.plan.output_frame_rate,
                    summary.plan.geometry.output_width,
                    summary.plan.geometry.output_height,
                    summary.document_path.display(),
                    summary.document_bytes,
                )
                .green()
            );
            if !summary.asset_paths.is_empty() {
                println!(
                    "{} {} {} file(s) next to the document",
                    "saved".green().bold(),
                    summary.asset_paths.len(),
                    output_format.extension(),
                );
            }
        }
        Commands::Inspect { input, json, plan } => {
            let options = plan_options(&plan)?;

            let (report, plan) = match SourceKind::detect(&input)? {
                SourceKind::ImageDirectory => {
                    let frames = lottieframe::scan_frames(&input)?;
                    let report = lottieframe::validate_frames(&frames, None, &options);
                    (report, lottieframe::plan(&frames, None, &options).ok())
                }
                SourceKind::Video => {
                    let metadata = lottieframe::probe_video(&input)?;
                    let report = lottieframe::validate_video(&metadata, &options);
                    let plan = lottieframe::plan_for_source(
                        metadata.estimated_frame_count.max(1) as usize,
                        metadata.width,
                        metadata.height,
                        Some(metadata.frame_rate),
                        &options,
                    );
                    (report, plan.ok())
                }
            };

            if json {
                let payload = json!({
                    "input": input.display().to_string(),
                    "valid": report.is_valid(),
                    "info": report.info,
                    "warnings": report.warnings,
                    "errors": report.errors,
                    "plan": plan,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                if let Some(plan) = &plan {
                    let indices: Vec<String> = plan
                        .selected
                        .iter()
                        .take(12)
                        .map(|frame| frame.original_index.to_string())
                        .collect();
                    let more = if plan.selected.len() > indices.len() {
                        ", ..."
                    } else {
                        ""
                    };
                    println!(
                        "Source: {}x{}, {} frame(s) @ {} fps",
                        plan.source_width,
                        plan.source_height,
                        plan.frame_count,
                        plan.original_frame_rate,
                    );
                    println!(
                        "Output: {}x{}, {} frame(s) @ {} fps",
                        plan.geometry.output_width,
                        plan.geometry.output_height,
                        plan.selected.len(),
                        plan.output_frame_rate,
                    );
                    println!("Frames: [{}{more}]", indices.join(", "));
                }
                print!("{report}");
            }

            if !report.is_valid() {
                return Err(format!("{} problem(s) found", report.errors.len()).into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "lottieframe", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
