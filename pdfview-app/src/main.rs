use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use pdfview_core::{Controller, ViewerConfig};
use pdfview_render::PdfiumProvider;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};

mod window;

use window::ViewerApp;

const APP_NAME: &str = "PDF Viewer";

#[derive(Debug, Parser)]
#[command(name = "pdfview", version, about = "Desktop PDF viewer")]
struct Args {
    /// PDF file to open at start-up
    file: Option<PathBuf>,

    /// Configuration file to use instead of the per-user one
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let project_dirs = ProjectDirs::from("net", "pdfview", "pdfview")
        .ok_or_else(|| anyhow!("unable to determine project directories"))?;
    let _guard = init_logging(&project_dirs)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| project_dirs.config_dir().join("config.toml"));
    let config = load_config(&config_path);

    let provider = PdfiumProvider::new().context("failed to initialise the PDF library")?;
    let controller = Controller::new(Box::new(provider), config.clone());

    info!(file = ?args.file, "starting");
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([400.0, 300.0])
            .with_title(APP_NAME),
        ..Default::default()
    };
    let startup_file = args.file;

    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(cc, controller, startup_file)))),
    )
    .map_err(|err| anyhow!("window system error: {err}"))
}

/// Falls back to the defaults when the file is unreadable or invalid.
fn load_config(path: &Path) -> ViewerConfig {
    match ViewerConfig::load(path) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "using default configuration");
            ViewerConfig::default()
        }
    }
}

fn init_logging(project_dirs: &ProjectDirs) -> Result<WorkerGuard> {
    let log_dir = project_dirs.data_local_dir().join("logs");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {:?}", log_dir))?;

    let file_appender = tracing_appender::rolling::never(log_dir, "pdfview.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer);
    let console_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pdfview_core::FitMode;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn args_accept_an_optional_file() {
        let args = Args::try_parse_from(["pdfview"]).unwrap();
        assert!(args.file.is_none());

        let args = Args::try_parse_from(["pdfview", "paper.pdf", "--config", "alt.toml"]).unwrap();
        assert_eq!(args.file, Some(PathBuf::from("paper.pdf")));
        assert_eq!(args.config, Some(PathBuf::from("alt.toml")));
    }

    #[test]
    fn args_reject_more_than_one_file() {
        assert!(Args::try_parse_from(["pdfview", "a.pdf", "b.pdf"]).is_err());
    }

    #[test]
    fn invalid_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "zoom_min = 3.0\nzoom_max = 2.0\n").unwrap();
        assert_eq!(load_config(&path), ViewerConfig::default());
    }

    #[test]
    fn valid_config_is_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "initial_fit_mode = \"fit_page\"\n").unwrap();
        assert_eq!(load_config(&path).initial_fit_mode, FitMode::FitPage);
    }
}
