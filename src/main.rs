use clap::Parser;
use graphics_lab::app::{run_gui, run_headless};
use graphics_lab::io::config::Config;
use log::{error, info};
use std::path::PathBuf;

/// Procedural shapes and a fly-through camera.
#[derive(Parser, Debug)]
#[command(name = "graphics-lab", version)]
struct Cli {
    /// Configuration file (TOML). Built-in defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Build and validate the shapes without opening a window.
    #[arg(long)]
    headless: bool,

    /// Write every generated shape as an OBJ file into DIR (headless only).
    #[arg(long, value_name = "DIR", requires = "headless")]
    export: Option<PathBuf>,
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .filter_module("eframe", log::LevelFilter::Warn)
        .filter_module("egui_glow", log::LevelFilter::Warn)
        .filter_module("egui_winit", log::LevelFilter::Warn)
        .filter_module("winit", log::LevelFilter::Warn)
        .filter_module("wgpu", log::LevelFilter::Warn)
        .filter_module("glutin", log::LevelFilter::Warn)
        .filter_module("sctk", log::LevelFilter::Warn)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            Config::load(path).map_err(|e| {
                error!("{e}");
                "Failed to load config".to_string()
            })?
        }
        None => {
            info!("No config given, using defaults");
            Config::default()
        }
    };

    if cli.headless {
        let summaries = run_headless(&config, cli.export.as_deref()).map_err(|e| {
            error!("Headless run failed: {e}");
            "Headless run failed".to_string()
        })?;
        info!("Generated {} shapes", summaries.len());
        return Ok(());
    }

    run_gui(config, cli.config).map_err(|e| {
        error!("Failed to start GUI: {e}");
        "Failed to start GUI".to_string()
    })
}
