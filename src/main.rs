use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

#[allow(unused_imports)]
use log::{Level, trace, debug, info, warn, error};

use platemark::annotate::{AnnotateStyle, Annotator, ChannelOrder, ColorInput, Coord, MarkerStyle, PixelRect};
use platemark::build_info::BuildInfo;
use platemark::config::CONFIG;
use platemark::dataset::{self, DEFAULT_DATASET};
use platemark::detections::{self, BatchOptions, DetectionManifest};
use platemark::logging;
use platemark::settings::UserSettings;
use platemark::train::{ModelVersion, TrainPlan};

const APP_NAME: &str = "platemark";

#[derive(Parser)]
#[command(name = "platemark", version, about = "License plate detection helpers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Mode {
    /// Translucent fill with a solid border
    #[default]
    Box,
    /// Corner brackets only
    Corners,
}

impl From<Mode> for MarkerStyle {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Box => MarkerStyle::FilledBox,
            Mode::Corners => MarkerStyle::CornerBrackets,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Draw one box on an image
    Annotate {
        input: PathBuf,
        output: PathBuf,
        /// x1,y1,x2,y2 in pixels
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        rect: Vec<String>,
        #[arg(long, value_enum, default_value_t)]
        mode: Mode,
        #[arg(long)]
        label: Option<String>,
        /// r,g,b
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        color: Option<Vec<f64>>,
        /// r,g,b
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        label_color: Option<Vec<f64>>,
        #[arg(long)]
        alpha: Option<f32>,
        #[arg(long)]
        thickness: Option<u32>,
        /// Treat the image as BGR
        #[arg(long)]
        bgr: bool,
    },
    /// Annotate every image listed in a detection manifest
    Batch {
        manifest: PathBuf,
        input_dir: PathBuf,
        output_dir: PathBuf,
        #[arg(long, value_enum, default_value_t)]
        mode: Mode,
        /// Append detection scores to labels
        #[arg(long)]
        scores: bool,
        /// Use the configured box color for every category
        #[arg(long)]
        no_category_colors: bool,
    },
    /// Point the dataset descriptor's path entry at its own directory
    PrepareDataset {
        descriptor: Option<PathBuf>,
    },
    /// Prepare the dataset and launch detector training
    Train {
        #[arg(long, value_enum, default_value_t)]
        model: ModelVersion,
        #[arg(long)]
        device: Option<String>,
        #[arg(long)]
        descriptor: Option<PathBuf>,
        /// Print the training command without running it
        #[arg(long)]
        dry_run: bool,
    },
    /// Write the settings file with defaults and comments
    InitSettings,
}

/// Integer first, then float, otherwise keep the text for the annotator to reject
fn parse_coord(raw: &str) -> Coord {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        Coord::Int(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        Coord::Float(f)
    } else {
        Coord::Text(raw.to_string())
    }
}

fn run(command: Commands) -> Result<(), String> {
    match command {
        Commands::Annotate { input, output, rect, mode, label, color, label_color, alpha, thickness, bgr } => {
            let coords: Vec<Coord> = rect.iter().map(|v| parse_coord(v)).collect();
            if PixelRect::from_coords(&coords).is_none() {
                warn!("Rectangle {:?} is not four integers, image is copied unchanged", rect);
            }

            let mut style = AnnotateStyle::from_config(&CONFIG);
            style.label = label;
            if let Some(color) = color {
                style.color = ColorInput(color);
            }
            if let Some(label_color) = label_color {
                style.label_color = ColorInput(label_color);
            }
            if let Some(alpha) = alpha {
                style.alpha = alpha;
            }
            if let Some(thickness) = thickness {
                style.line_thickness = thickness;
            }
            if bgr {
                style.channel_order = ChannelOrder::Bgr;
            }

            let image = image::open(&input)
                .map_err(|e| format!("Failed to open {:?}: {}", input, e))?
                .into_rgb8();
            let annotated = Annotator::new()
                .annotate(Some(&image), Some(&coords), &style, mode.into())
                .unwrap_or(image);
            annotated
                .save(&output)
                .map_err(|e| format!("Failed to save {:?}: {}", output, e))?;
            info!("Wrote {:?}", output);
            Ok(())
        }
        Commands::Batch { manifest, input_dir, output_dir, mode, scores, no_category_colors } => {
            let mut parsed = DetectionManifest::from_file(&manifest)?;
            let (skipped, warnings) = parsed.validate_and_clean();
            for warning in &warnings {
                warn!("{}", warning);
            }
            if skipped > 0 {
                warn!("Skipped {} malformed detections", skipped);
            }

            let options = BatchOptions {
                style: AnnotateStyle::from_config(&CONFIG),
                marker: mode.into(),
                show_scores: scores,
                category_colors: !no_category_colors,
            };
            let summary = detections::annotate_manifest(&parsed, &input_dir, &output_dir, &options);
            println!("Annotated {} images into {}", summary.written, output_dir.display());
            if summary.failed.is_empty() {
                Ok(())
            } else {
                for (file, reason) in &summary.failed {
                    eprintln!("  {}: {}", file, reason);
                }
                Err(format!("{} images failed", summary.failed.len()))
            }
        }
        Commands::PrepareDataset { descriptor } => {
            let descriptor = descriptor.unwrap_or_else(|| dataset::descriptor_path(DEFAULT_DATASET));
            let rewritten = dataset::prepare_descriptor(&descriptor).map_err(|e| e.to_string())?;
            if rewritten {
                println!("Dataset path set to {}", dataset::unix_style_dir(&descriptor));
            } else {
                println!("{} has no path entry, nothing to do", descriptor.display());
            }
            Ok(())
        }
        Commands::Train { model, device, descriptor, dry_run } => {
            let mut plan = TrainPlan { device, ..TrainPlan::new(model) };
            if let Some(descriptor) = descriptor {
                plan.descriptor = descriptor;
            }
            if dry_run {
                println!("{}", plan.command_line());
                return Ok(());
            }
            let status = plan.launch().map_err(|e| e.to_string())?;
            if status.success() {
                println!("Training run {} finished", plan.run_name());
                Ok(())
            } else {
                Err(format!("Training exited with {}", status))
            }
        }
        Commands::InitSettings => {
            let path = UserSettings::default().save()?;
            println!("Settings written to {}", path.display());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::setup_logger(APP_NAME);
    logging::setup_panic_hook(APP_NAME);
    debug!("platemark {}", BuildInfo::display_version());

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
