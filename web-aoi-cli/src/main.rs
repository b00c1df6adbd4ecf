//! Web AOI Processor CLI Application
//!
//! Command-line front end for the web-aoi-processor library. It adds:
//! - TOML configuration with command line overrides
//! - A dynamically loaded surface tracker plugin
//! - AOI definition validation
//! - Summary reporting (stdout and summary.json)

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use web_aoi_processor::{AoiDefinitions, ProcessorConfig};

mod config;
mod plugin;
mod plugin_ffi;
mod report;

use config::AppConfig;

/// Web AOI Processor - Attribute eye-tracking gaze to web page AOIs
#[derive(Parser, Debug)]
#[command(name = "web-aoi-cli")]
#[command(about = "Map gaze from web browsing recordings onto pages and AOIs", long_about = None)]
#[command(version)]
struct Args {
    /// Recording directory to process
    #[arg(short, long, value_name = "DIR")]
    recording: Option<PathBuf>,

    /// Output directory for per-tab CSV files
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Surface tracker plugin library
    #[arg(short, long, value_name = "FILE")]
    tracker: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// AOI definitions file (JSON) to validate
    #[arg(long, value_name = "FILE")]
    aois: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Web AOI CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using processor library v{}", web_aoi_processor::VERSION);

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    let config = apply_overrides(config, &args);

    if let Some(aois) = &config.input.aois {
        validate_aois_mode(aois, args.quiet)?;
    }

    if config.input.recording.is_some() {
        process_mode(&config, args.quiet)?;
    } else if config.input.aois.is_none() {
        println!("Web AOI Processor - No input specified");
        println!("\nQuick Start:");
        println!("  web-aoi-cli --recording rec/ --tracker libtracker.so --output out/");
        println!("  web-aoi-cli --aois aois.json");
        println!("\nWith a configuration file:");
        println!("  web-aoi-cli --config config.toml");
        println!("\nUse --help for more options");
    }

    Ok(())
}

/// Command line flags take precedence over the configuration file
fn apply_overrides(mut config: AppConfig, args: &Args) -> AppConfig {
    if let Some(recording) = &args.recording {
        config.input.recording = Some(recording.clone());
    }
    if let Some(aois) = &args.aois {
        config.input.aois = Some(aois.clone());
    }
    if let Some(output) = &args.output {
        config.output.directory = Some(output.clone());
    }
    if let Some(tracker) = &args.tracker {
        config.tracker.library = Some(tracker.clone());
    }
    config
}

/// Default output directory: `<recording>/aoi-output`
fn output_dir_for(config: &AppConfig, recording: &Path) -> PathBuf {
    config
        .output
        .directory
        .clone()
        .unwrap_or_else(|| recording.join("aoi-output"))
}

/// Process mode - run the pipeline over one recording
fn process_mode(config: &AppConfig, quiet: bool) -> Result<()> {
    let Some(recording) = config.input.recording.as_deref() else {
        bail!("No recording directory specified");
    };
    let Some(library) = config.tracker.library.as_deref() else {
        bail!("No tracker plugin specified (use --tracker or [tracker] library)");
    };
    let output_dir = output_dir_for(config, recording);

    if !quiet {
        println!("═══════════════════════════════════════════════");
        println!("  Web AOI Processor");
        println!("═══════════════════════════════════════════════\n");
        println!("Recording: {:?}", recording);
        println!("Output:    {:?}", output_dir);
    }

    let processor_config: ProcessorConfig = config.processing.clone();
    let summary = web_aoi_processor::process_recording(
        recording,
        &output_dir,
        processor_config,
        |calibration, video| plugin::open(library, video, calibration),
    )
    .with_context(|| format!("Failed to process recording {:?}", recording))?;

    if config.output.write_summary {
        let path = report::write_summary_json(&summary, recording, &output_dir)?;
        log::info!("Summary written to {:?}", path);
    }

    if !quiet {
        report::print_summary(&summary);
        println!("\n✓ Done");
    }

    Ok(())
}

/// Validate mode - parse an AOI definitions file and report its contents
fn validate_aois_mode(path: &Path, quiet: bool) -> Result<()> {
    let definitions = AoiDefinitions::from_file(path)
        .with_context(|| format!("Invalid AOI definitions: {:?}", path))?;

    let unknown = definitions.unknown_kinds();
    for kind in &unknown {
        log::warn!("Unrecognized locator type '{}' in {:?}", kind, path);
    }

    if !quiet {
        println!("✓ AOI definitions loaded: {:?}", path);
        for url in definitions.urls() {
            let aois = definitions.aois_for(url).map(|a| a.len()).unwrap_or(0);
            println!("  {} ({} AOIs)", url, aois);
        }
        println!(
            "  Total: {} AOIs, {} unrecognized locator steps",
            definitions.aoi_count(),
            unknown.len()
        );
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
