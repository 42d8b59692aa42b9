use std::{
    fs,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, render::ReportView, HttpAnalysisClient, SelectedFile, SessionShell,
    UploadController, UploadPhase,
};
use shared::domain::AnalysisResult;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Upload a CSV dataset for analysis and print the model report")]
struct Args {
    /// Overrides the configured analysis service address.
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload one CSV file and print the returned report.
    Analyze {
        file: PathBuf,
        /// Write every returned plot as `<name>.png` into this directory.
        #[arg(long)]
        plots_dir: Option<PathBuf>,
        /// Print the raw payload instead of the rendered report.
        #[arg(long)]
        json: bool,
    },
    /// Check that the analysis service is up.
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings().context("failed to load client settings")?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        settings.request_timeout_secs = timeout_secs;
    }
    settings.validate()?;

    let client = HttpAnalysisClient::from_settings(&settings)
        .map_err(|err| anyhow::anyhow!(err.user_message()).context(err.to_string()))?;

    match args.command {
        Command::Health => {
            let health = client
                .health()
                .await
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;
            println!("{} is {}", client.server_url(), health.status);
            if !health.is_healthy() {
                bail!("analysis service reported status '{}'", health.status);
            }
        }
        Command::Analyze {
            file,
            plots_dir,
            json,
        } => {
            let mut controller = UploadController::new();
            let mut shell = SessionShell::new();
            let mut last_percent = None;
            let resolution = controller
                .run_upload(&client, vec![SelectedFile::from_path(file)], |state| {
                    if state.phase == UploadPhase::Uploading
                        && last_percent != Some(state.progress_percent)
                    {
                        last_percent = Some(state.progress_percent);
                        eprint!("\ruploading... {:>3}%", state.progress_percent);
                        let _ = io::stderr().flush();
                    }
                })
                .await;
            if last_percent.is_some() {
                eprintln!();
            }

            shell.apply(resolution);
            if let Some(message) = shell.current_error() {
                bail!("{message}");
            }
            let (Some(result), Some(report)) = (shell.current_result(), shell.current_report())
            else {
                bail!("no analysis result was produced");
            };

            if json {
                print_raw(result)?;
            } else {
                print!("{}", format_report(report));
            }
            if let Some(dir) = plots_dir {
                write_plots(report, &dir)?;
            }
        }
    }

    Ok(())
}

fn print_raw(result: &AnalysisResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

const BAR_WIDTH: usize = 40;

fn format_report(report: &ReportView) -> String {
    let mut out = String::new();
    out.push_str("Analysis Results\n");
    for field in [&report.summary.problem_type, &report.summary.domain] {
        out.push_str(&format!("  {:<14}{}\n", field.label, field.display_value()));
    }

    if !report.metrics.is_empty() {
        out.push_str("\nMetrics\n");
        for card in &report.metrics {
            out.push_str(&format!("  {:<14}{}\n", card.name, card.formatted));
        }
    }

    let chart = &report.feature_importance;
    if !chart.is_empty() {
        out.push_str(&format!("\n{}\n", chart.title));
        let label_width = chart.categories.iter().map(String::len).max().unwrap_or(0);
        let max_value = chart.values.iter().copied().fold(0.0_f64, f64::max);
        let bar_width = BAR_WIDTH;
        for (name, value) in chart.bars() {
            let filled = if max_value > 0.0 {
                ((value.max(0.0) / max_value) * bar_width as f64).round() as usize
            } else {
                0
            };
            out.push_str(&format!(
                "  {name:<label_width$}  {:<bar_width$}  {value:.4}\n",
                "#".repeat(filled)
            ));
        }
    }

    if !report.plots.is_empty() {
        out.push_str("\nPlots\n");
        for plot in &report.plots {
            out.push_str(&format!(
                "  {} ({} bytes base64)\n",
                plot.label,
                plot.base64_payload().len()
            ));
        }
    }
    out
}

fn write_plots(report: &ReportView, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create plots directory '{}'", dir.display()))?;
    let mut skipped = Vec::new();
    for plot in &report.plots {
        if !is_plain_file_stem(&plot.key) {
            tracing::warn!(plot = %plot.key, "plot name is not a plain file name; skipping");
            skipped.push(plot.key.as_str());
            continue;
        }
        let bytes = STANDARD
            .decode(plot.base64_payload())
            .with_context(|| format!("plot '{}' is not valid base64", plot.key))?;
        let path = dir.join(format!("{}.png", plot.key));
        fs::write(&path, bytes)
            .with_context(|| format!("failed to write plot '{}'", path.display()))?;
        tracing::info!(path = %path.display(), "wrote plot");
    }
    if !skipped.is_empty() {
        bail!(
            "skipped plots with unsafe names: {}",
            skipped
                .iter()
                .map(|key| format!("'{key}'"))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}

/// Plot names come from the service; only a single normal path component
/// may be joined onto the output directory.
fn is_plain_file_stem(key: &str) -> bool {
    let mut components = Path::new(key).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
