// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use beatmerge::app_config::{self, Config};
use beatmerge::app_controller::{Controller, MergeSummary};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge numbered beatmaps and audio files from a directory (default command)
    Merge {
        /// Directory containing 1.osu, 1.mp3, 2.osu, 2.mp3, ...
        #[arg(value_name = "INPUT_DIR")]
        input_dir: PathBuf,

        #[command(flatten)]
        options: MergeOptions,
    },

    /// Merge the given beatmaps in order, using the audio file each one references
    Maps {
        /// Beatmap files in playback order
        #[arg(value_name = "OSU_FILES", required = true)]
        osu_files: Vec<PathBuf>,

        #[command(flatten)]
        options: MergeOptions,
    },

    /// Show title and audio file of each beatmap
    Info {
        /// Beatmap files to inspect
        #[arg(value_name = "OSU_FILES", required = true)]
        osu_files: Vec<PathBuf>,

        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },

    /// Generate shell completions for beatmerge
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct MergeOptions {
    /// Output .osu file
    #[arg(long)]
    output_osu: Option<String>,

    /// Output audio file; the extension selects the format (mp3, wav, ogg, flac)
    #[arg(long)]
    output_audio: Option<String>,

    /// HP drain rate
    #[arg(long)]
    hp: Option<f64>,

    /// Overall difficulty
    #[arg(long)]
    od: Option<f64>,

    /// Circle size
    #[arg(long)]
    cs: Option<f64>,

    /// Approach rate
    #[arg(long)]
    ar: Option<f64>,

    /// Difficulty name written as Version: in the merged map
    #[arg(long)]
    label: Option<String>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// beatmerge - build a compilation beatmap from several maps
#[derive(Parser, Debug)]
#[command(name = "beatmerge")]
#[command(version)]
#[command(about = "Merge osu! beatmaps and their audio into one compilation map")]
#[command(long_about = "beatmerge concatenates several beatmaps and their audio tracks into one map
with a single continuous audio track. Every timing point and hit object is
moved by the length of the audio that plays before it.

EXAMPLES:
    beatmerge ./maps                                # Merge 1.osu/1.mp3, 2.osu/2.mp3, ...
    beatmerge merge ./maps --hp 6 --od 7 --label Marathon
    beatmerge maps a/song.osu b/other.osu -f        # Merge explicit maps in this order
    beatmerge info a/song.osu b/other.osu           # Show titles and audio files
    beatmerge completions bash > beatmerge.bash     # Generate bash completions

CONFIGURATION:
    Defaults are stored in conf.json. You can specify a different config file
    with --config-path. If the config file doesn't exist, a default one will be
    created automatically. Command line options override the config file.

REQUIREMENTS:
    ffmpeg and ffprobe must be installed (paths are configurable).")]
#[command(args_conflicts_with_subcommands = true)]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory containing numbered beatmaps and audio files
    #[arg(value_name = "INPUT_DIR")]
    input_dir: Option<PathBuf>,

    #[command(flatten)]
    options: MergeOptions,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and marker for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, marker) = Self::style_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, marker, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Initialize with trace so the level can be lowered once the config is known
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Err(e) = run_cli(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run_cli(cli: CommandLineOptions) -> Result<()> {
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "beatmerge", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Info { osu_files, config_path }) => {
            let (config, _) = Config::load_or_create(&config_path)?;
            let infos = Controller::inspect(&osu_files, &config.audio.input_extensions)?;
            println!("{:>3}  {:<50}  Audio File", "#", "Map Name");
            for (index, info) in infos.iter().enumerate() {
                println!("{:>3}  {:<50}  {}", index + 1, info.display_name, info.audio_label());
            }
            Ok(())
        }
        Some(Commands::Merge { input_dir, options }) => {
            let controller = build_controller(&options)?;
            report(controller.run_folder(&input_dir, options.force_overwrite).await?);
            Ok(())
        }
        Some(Commands::Maps { osu_files, options }) => {
            let controller = build_controller(&options)?;
            report(controller.run_maps(&osu_files, options.force_overwrite).await?);
            Ok(())
        }
        None => {
            // Default behavior - merge a directory given as the only positional argument
            let input_dir = cli.input_dir.ok_or_else(|| {
                anyhow!("INPUT_DIR is required when no subcommand is specified")
            })?;
            let controller = build_controller(&cli.options)?;
            report(controller.run_folder(&input_dir, cli.options.force_overwrite).await?);
            Ok(())
        }
    }
}

/// Load configuration, apply command line overrides and validate
fn build_controller(options: &MergeOptions) -> Result<Controller> {
    if let Some(level) = &options.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let (mut config, created) = Config::load_or_create(&options.config_path)?;
    if created {
        warn!("Config file not found at '{}', created default config.", options.config_path);
    }

    if let Some(hp) = options.hp {
        config.difficulty.hp_drain_rate = hp;
    }
    if let Some(cs) = options.cs {
        config.difficulty.circle_size = cs;
    }
    if let Some(od) = options.od {
        config.difficulty.overall_difficulty = od;
    }
    if let Some(ar) = options.ar {
        config.difficulty.approach_rate = ar;
    }
    if let Some(label) = &options.label {
        config.version_label = Some(label.trim().to_string()).filter(|l| !l.is_empty());
    }
    if let Some(output_osu) = &options.output_osu {
        config.output.beatmap_file = output_osu.clone();
    }
    if let Some(output_audio) = &options.output_audio {
        config.output.audio_file = output_audio.clone();
    }
    match &options.log_level {
        Some(level) => config.log_level = level.clone().into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    config.validate().map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

    Controller::with_config(config)
}

fn report(summary: MergeSummary) {
    info!("{}", summary.report.summary());
}
