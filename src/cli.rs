use crate::annotation::Label;
use crate::detect::{DEFAULT_SAMPLING_RATE, DEFAULT_SEGMENT_SECONDS};
use crate::plot::DEFAULT_PLOT_COLUMNS;
use crate::waveform::{DEFAULT_CHUNK_SIZE, DEFAULT_WINDOW_WIDTH};
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

type ArgResult<T> = std::result::Result<T, String>;

pub const DEFAULT_MAX_SAMPLES: usize = 50_000_000;

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name = "ecgann",
          version = &**FULL_VERSION,
          about = "Interval annotation and agreement checking for long ECG recordings",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "List recordings and their annotation status")]
    List(ListArgs),
    #[clap(about = "Label a recording from a list of selections")]
    Annotate(AnnotateArgs),
    #[clap(about = "Summarise a recording and its labelled runs")]
    Inspect(InspectArgs),
    #[clap(about = "Compare two annotations of the same recordings")]
    Compare(CompareArgs),
    #[clap(about = "Plot a recording with its annotations")]
    Plot(PlotArgs),
    #[clap(about = "Label a recording segment by segment with an external detector")]
    Detect(DetectArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("list")))]
#[command(arg_required_else_help(true))]
pub struct ListArgs {
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "input")]
    #[clap(help = "Directory with recording stores")]
    #[clap(value_name = "DIR")]
    #[arg(value_parser = check_dir_exists)]
    pub input_dir: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Directory with annotation stores")]
    #[clap(value_name = "DIR")]
    pub output_dir: PathBuf,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("annotate")))]
#[command(arg_required_else_help(true))]
pub struct AnnotateArgs {
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "recording")]
    #[clap(help = "Recording store")]
    #[clap(value_name = "RECORDING")]
    #[arg(value_parser = check_file_exists)]
    pub recording_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 's')]
    #[clap(long = "selections")]
    #[clap(help = "TSV of selections: start_ms, end_ms, label")]
    #[clap(value_name = "SELECTIONS")]
    #[arg(value_parser = check_file_exists)]
    pub selections_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Directory for annotation stores")]
    #[clap(value_name = "DIR")]
    #[arg(value_parser = check_dir_exists)]
    pub output_dir: PathBuf,

    #[clap(long = "force")]
    #[clap(help = "Replace an existing annotation of this recording")]
    pub force: bool,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "window-width")]
    #[clap(value_name = "SAMPLES")]
    #[clap(help = "Samples shown per window")]
    #[clap(default_value_t = DEFAULT_WINDOW_WIDTH)]
    #[arg(value_parser = positive_usize)]
    pub window_width: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "chunk-size")]
    #[clap(value_name = "SAMPLES")]
    #[clap(help = "Samples per chunk when the recording is streamed")]
    #[clap(default_value_t = DEFAULT_CHUNK_SIZE)]
    #[arg(value_parser = positive_usize)]
    pub chunk_size: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "max-samples")]
    #[clap(value_name = "SAMPLES")]
    #[clap(help = "Largest recording to load in one piece")]
    #[clap(default_value_t = DEFAULT_MAX_SAMPLES)]
    #[arg(value_parser = positive_usize)]
    pub max_samples: usize,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("inspect")))]
#[command(arg_required_else_help(true))]
pub struct InspectArgs {
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "recording")]
    #[clap(help = "Recording store")]
    #[clap(value_name = "RECORDING")]
    #[arg(value_parser = check_file_exists)]
    pub recording_path: PathBuf,

    #[clap(short = 'a')]
    #[clap(long = "annotations")]
    #[clap(help = "Annotation store to decode against the recording")]
    #[clap(value_name = "ANNOTATIONS")]
    #[arg(value_parser = check_file_exists)]
    pub annotation_path: Option<PathBuf>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "window-width")]
    #[clap(value_name = "SAMPLES")]
    #[clap(help = "Samples per window when paging through a loaded recording")]
    #[clap(default_value_t = DEFAULT_WINDOW_WIDTH)]
    #[arg(value_parser = positive_usize)]
    pub window_width: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "chunk-size")]
    #[clap(value_name = "SAMPLES")]
    #[clap(help = "Samples per chunk when the recording is streamed")]
    #[clap(default_value_t = DEFAULT_CHUNK_SIZE)]
    #[arg(value_parser = positive_usize)]
    pub chunk_size: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "max-samples")]
    #[clap(value_name = "SAMPLES")]
    #[clap(help = "Largest recording to load in one piece")]
    #[clap(default_value_t = DEFAULT_MAX_SAMPLES)]
    #[arg(value_parser = positive_usize)]
    pub max_samples: usize,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("compare")))]
#[command(arg_required_else_help(true))]
pub struct CompareArgs {
    #[clap(required = true)]
    #[clap(short = 'a')]
    #[clap(long = "first")]
    #[clap(help = "Annotation store, or directory of annotation stores")]
    #[clap(value_name = "PATH")]
    #[arg(value_parser = check_file_exists)]
    pub first_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'b')]
    #[clap(long = "second")]
    #[clap(help = "Annotation store, or directory of annotation stores")]
    #[clap(value_name = "PATH")]
    #[arg(value_parser = check_file_exists)]
    pub second_path: PathBuf,

    #[clap(short = 'l')]
    #[clap(long = "label")]
    #[clap(help = "Label whose runs are compared (token or name)")]
    #[clap(value_name = "LABEL")]
    #[clap(default_value = "A")]
    #[arg(value_parser = parse_label)]
    pub label: Label,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("plot")))]
#[command(arg_required_else_help(true))]
pub struct PlotArgs {
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "recording")]
    #[clap(help = "Recording store")]
    #[clap(value_name = "RECORDING")]
    #[arg(value_parser = check_file_exists)]
    pub recording_path: PathBuf,

    #[clap(short = 'a')]
    #[clap(long = "annotations")]
    #[clap(help = "Annotation store to draw as a track; give two to highlight their agreement")]
    #[clap(value_name = "ANNOTATIONS")]
    #[clap(num_args = 1..=2)]
    #[arg(value_parser = check_file_exists)]
    pub annotation_paths: Vec<PathBuf>,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "image")]
    #[clap(help = "Output image path")]
    #[clap(value_name = "IMAGE")]
    #[arg(value_parser = check_image_path)]
    pub output_path: String,

    #[clap(help_heading("Plotting"))]
    #[clap(short = 'l')]
    #[clap(long = "label")]
    #[clap(help = "Label whose matched overlaps are highlighted")]
    #[clap(value_name = "LABEL")]
    #[clap(default_value = "A")]
    #[arg(value_parser = parse_label)]
    pub label: Label,

    #[clap(help_heading("Plotting"))]
    #[clap(long = "columns")]
    #[clap(value_name = "COLUMNS")]
    #[clap(help = "Trace resolution in columns")]
    #[clap(default_value_t = DEFAULT_PLOT_COLUMNS)]
    #[arg(value_parser = positive_usize)]
    pub columns: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "chunk-size")]
    #[clap(value_name = "SAMPLES")]
    #[clap(help = "Samples per chunk when the recording is streamed")]
    #[clap(default_value_t = DEFAULT_CHUNK_SIZE)]
    #[arg(value_parser = positive_usize)]
    pub chunk_size: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "max-samples")]
    #[clap(value_name = "SAMPLES")]
    #[clap(help = "Largest recording to load in one piece")]
    #[clap(default_value_t = DEFAULT_MAX_SAMPLES)]
    #[arg(value_parser = positive_usize)]
    pub max_samples: usize,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("detect")))]
#[command(arg_required_else_help(true))]
pub struct DetectArgs {
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "recording")]
    #[clap(help = "Recording store")]
    #[clap(value_name = "RECORDING")]
    #[arg(value_parser = check_file_exists)]
    pub recording_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Directory for annotation stores")]
    #[clap(value_name = "DIR")]
    #[arg(value_parser = check_dir_exists)]
    pub output_dir: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "classifier")]
    #[clap(help = "Program that reads a segment on stdin and prints a label token")]
    #[clap(value_name = "PROGRAM")]
    pub classifier: PathBuf,

    #[clap(long = "classifier-arg")]
    #[clap(help = "Argument passed to the classifier (repeatable)")]
    #[clap(value_name = "ARG")]
    #[clap(allow_hyphen_values = true)]
    pub classifier_args: Vec<String>,

    #[clap(long = "force")]
    #[clap(help = "Replace an existing annotation of this recording")]
    pub force: bool,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "sampling-rate")]
    #[clap(value_name = "HZ")]
    #[clap(help = "Sampling rate passed to the classifier")]
    #[clap(default_value_t = DEFAULT_SAMPLING_RATE)]
    pub sampling_rate: u32,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "segment-seconds")]
    #[clap(value_name = "SECONDS")]
    #[clap(help = "Length of each classified segment")]
    #[clap(default_value_t = DEFAULT_SEGMENT_SECONDS)]
    pub segment_seconds: u32,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "chunk-size")]
    #[clap(value_name = "SAMPLES")]
    #[clap(help = "Samples read from the recording at a time")]
    #[clap(default_value_t = DEFAULT_CHUNK_SIZE)]
    #[arg(value_parser = positive_usize)]
    pub chunk_size: usize,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> ArgResult<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn check_image_path(s: &str) -> ArgResult<String> {
    let prefix_check = check_prefix_path(s)?;
    let path = Path::new(s);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("svg") | Some("png") | Some("pdf") => Ok(prefix_check),
        _ => Err("Image must have an extension of .svg, .png, or .pdf".to_string()),
    }
}

fn threads_in_range(s: &str) -> ArgResult<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn positive_usize(s: &str) -> ArgResult<usize> {
    match s.parse::<usize>() {
        Ok(0) => Err("Value must be at least 1".to_string()),
        Ok(value) => Ok(value),
        Err(_) => Err(format!("`{}` is not a valid count", s)),
    }
}

fn check_file_exists(s: &str) -> ArgResult<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_dir_exists(s: &str) -> ArgResult<PathBuf> {
    let path = Path::new(s);
    if !path.is_dir() {
        Err(format!("Directory does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn parse_label(s: &str) -> ArgResult<Label> {
    s.parse::<Label>().map_err(|e| e.to_string())
}
