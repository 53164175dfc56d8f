use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use img2text_lib::commands::config::{config_path, reset_config, show_config};
use img2text_lib::commands::extract::{
    build_engine, run_extract, Capabilities, ExtractOverrides, ResultActions,
};
use img2text_lib::logging::init_logging;
use img2text_lib::models::config::EngineKind;
use img2text_lib::services::config::ConfigManager;
use img2text_lib::services::share::{SystemClipboard, SystemOpener};
use img2text_lib::{EngineService, JobOutcome, PageSegMode};

#[derive(Parser)]
#[command(name = "img2text")]
#[command(about = "Image to Text Extractor - OCR an image, then copy or share the text")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineArg {
    Http,
    Tesseract,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Http => EngineKind::Http,
            EngineArg::Tesseract => EngineKind::Tesseract,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from an image
    Extract {
        /// Image file
        path: PathBuf,

        /// Grayscale + threshold + blur before recognition
        #[arg(long, overrides_with = "no_preprocess")]
        preprocess: bool,
        #[arg(long)]
        no_preprocess: bool,

        /// Strip symbols and collapse spaces in the result
        #[arg(long, overrides_with = "no_normalize")]
        normalize: bool,
        #[arg(long)]
        no_normalize: bool,

        /// Recognition language code
        #[arg(long)]
        lang: Option<String>,

        /// Page segmentation mode, by number (0-13) or name (e.g. single_block)
        #[arg(long)]
        psm: Option<PageSegMode>,

        #[arg(long, value_enum)]
        engine: Option<EngineArg>,

        /// OCR server base URL (http engine)
        #[arg(long)]
        server: Option<String>,

        /// Directory with *.traineddata files (tesseract engine)
        #[arg(long)]
        tessdata: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Copy the text to the clipboard
        #[arg(long)]
        copy: bool,

        /// Open a share link with the text
        #[arg(long)]
        share: bool,

        /// Hide the progress indicator
        #[arg(long)]
        quiet: bool,
    },
    /// Inspect or reset the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Overwrite the config file with defaults
    Reset,
}

fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_json, cli.verbose);

    let manager = match cli.config {
        Some(path) => ConfigManager::with_file(path),
        None => ConfigManager::new().context("Failed to locate config directory")?,
    };
    let mut stdout = std::io::stdout();

    match cli.command {
        Commands::Extract {
            path,
            preprocess,
            no_preprocess,
            normalize,
            no_normalize,
            lang,
            psm,
            engine,
            server,
            tessdata,
            json,
            copy,
            share,
            quiet,
        } => {
            let mut config = manager.load().context("Failed to load config")?;
            let overrides = ExtractOverrides {
                preprocess: flag_pair(preprocess, no_preprocess),
                normalize: flag_pair(normalize, no_normalize),
                language: lang,
                page_seg_mode: psm,
                engine: engine.map(Into::into),
                server_url: server,
                tessdata_path: tessdata,
            };
            overrides.apply(&mut config);
            config.validate().context("Invalid configuration")?;

            let engine = match build_engine(&config.recognition) {
                Ok(engine) => engine,
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    return Ok(ExitCode::FAILURE);
                }
            };
            let service = EngineService::new(engine);
            service.spawn_initialize();

            let actions = ResultActions {
                json,
                copy,
                share,
                show_progress: !quiet,
            };
            let clipboard = SystemClipboard::new();
            let capabilities = Capabilities {
                clipboard: &clipboard,
                opener: &SystemOpener,
            };

            let outcome =
                run_extract(&config, service, path, &actions, &capabilities, &mut stdout).await?;
            Ok(match outcome {
                JobOutcome::Completed(_) => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            })
        }
        Commands::Config { action } => {
            match action {
                ConfigAction::Show => show_config(&manager, &mut stdout)?,
                ConfigAction::Path => config_path(&manager, &mut stdout)?,
                ConfigAction::Reset => reset_config(&manager, &mut stdout)?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
