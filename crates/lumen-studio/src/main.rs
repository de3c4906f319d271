//! Lumen studio: plays a compositor scene described in TOML.
//!
//! Windowed by default; `--headless out.png` renders one frame off-screen
//! after every texture has loaded and writes it to disk.

mod app;
mod config;
mod headless;
mod schedule;
mod scene;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lumen_engine::device::GpuInit;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::window::{Runtime, RuntimeConfig};

use crate::app::StudioApp;
use crate::config::StudioConfig;

/// Multi-pass textured-quad compositor
#[derive(Parser, Debug)]
#[command(name = "lumen-studio")]
#[command(about = "Composite textured quads through shader effect chains")]
#[command(version)]
struct Args {
    /// Scene file (TOML). Defaults to the built-in demo scene.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render one frame off-screen and write it to this PNG instead of
    /// opening a window
    #[arg(long, value_name = "PNG")]
    headless: Option<PathBuf>,

    /// Log filter (env_logger syntax); overrides RUST_LOG
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..Default::default()
    });

    let config = match &args.config {
        Some(path) => StudioConfig::load(path)?,
        None => StudioConfig::default(),
    };
    log::info!(
        "scene: {} textures, {} custom effects, {} items",
        config.textures.len(),
        config.effects.len(),
        config.items.len()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("lumen-io")
        .build()
        .context("failed to start tokio runtime")?;

    if let Some(out) = args.headless {
        return headless::render_png(&config, runtime.handle().clone(), &out);
    }

    let runtime_config = RuntimeConfig {
        title: config.window.title.clone(),
        initial_size: winit::dpi::LogicalSize::new(
            f64::from(config.window.width),
            f64::from(config.window.height),
        ),
        ..Default::default()
    };
    let app = StudioApp::new(config, runtime);
    Runtime::run(runtime_config, GpuInit::default(), app)
}
