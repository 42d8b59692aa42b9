mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{load_settings, ClientSettings};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::AnalyzerApp;

const APP_TITLE: &str = "CSV Model Analyzer";

#[derive(Parser, Debug)]
#[command(about = "Desktop client for the dataset analysis service")]
struct Args {
    /// Overrides the configured analysis service address.
    #[arg(long)]
    server_url: Option<String>,
}

/// Resolves settings, falling back to defaults so the window still opens.
/// The returned warning is shown in the error banner on startup.
fn resolve_settings(args: &Args) -> (ClientSettings, Option<String>) {
    let (mut settings, mut warning) = match load_settings() {
        Ok(settings) => (settings, None),
        Err(err) => {
            tracing::error!("failed to load client settings: {err:#}");
            (
                ClientSettings::default(),
                Some(format!("Using default settings: {err:#}")),
            )
        }
    };

    if let Some(server_url) = &args.server_url {
        let previous = std::mem::replace(&mut settings.server_url, server_url.clone());
        if let Err(err) = settings.validate() {
            tracing::error!("ignoring --server-url: {err:#}");
            settings.server_url = previous;
            warning = Some(format!("Ignoring --server-url: {err:#}"));
        }
    }
    (settings, warning)
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    let (settings, startup_warning) = resolve_settings(&args);
    let server_url = settings.server_url.clone();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([1024.0, 760.0])
            .with_min_inner_size([640.0, 480.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |_cc| {
            Ok(Box::new(AnalyzerApp::new(
                cmd_tx,
                ui_rx,
                server_url,
                startup_warning,
            )))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_server_url_flag_keeps_configured_address() {
        let args = Args {
            server_url: Some("ftp://example.com".into()),
        };
        let (settings, warning) = resolve_settings(&args);

        assert!(settings.server_url.starts_with("http"));
        assert!(warning.is_some_and(|warning| warning.starts_with("Ignoring --server-url")));
    }
}
