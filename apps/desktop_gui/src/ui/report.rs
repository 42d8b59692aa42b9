//! Report panels: summary, metric cards, feature-importance chart, plots.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use client_core::{BarChartSeries, MetricCard, PlotImage, ReportView, SummaryView};
use eframe::egui;
use egui::TextureHandle;
use egui_plot::{Bar, BarChart, GridMark, Plot};

const CARD_WIDTH: f32 = 170.0;
const PLOT_MAX_WIDTH: f32 = 560.0;

enum PlotTexture {
    Ready {
        texture: TextureHandle,
        size: egui::Vec2,
    },
    DecodeFailed(String),
}

/// Decoded plot textures for the report on screen, keyed by plot name.
#[derive(Default)]
pub struct PlotTextures {
    entries: HashMap<String, PlotTexture>,
}

impl PlotTextures {
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn get_or_load(&mut self, ctx: &egui::Context, plot: &PlotImage) -> &PlotTexture {
        self.entries.entry(plot.key.clone()).or_insert_with(|| {
            match decode_plot_image(plot.base64_payload()) {
                Ok(color_image) => {
                    let size = egui::vec2(
                        color_image.size[0] as f32,
                        color_image.size[1] as f32,
                    );
                    let texture = ctx.load_texture(
                        format!("analysis-plot:{}", plot.key),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    );
                    PlotTexture::Ready { texture, size }
                }
                Err(reason) => {
                    tracing::warn!(plot = %plot.key, "failed to decode plot image: {reason}");
                    PlotTexture::DecodeFailed(reason)
                }
            }
        })
    }
}

pub fn decode_plot_image(base64_payload: &str) -> Result<egui::ColorImage, String> {
    let bytes = STANDARD
        .decode(base64_payload.trim())
        .map_err(|err| format!("invalid base64: {err}"))?;
    let decoded = image::load_from_memory(&bytes).map_err(|err| format!("invalid image: {err}"))?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

pub fn show_report(ui: &mut egui::Ui, report: &ReportView, textures: &mut PlotTextures) {
    section_frame(ui, |ui| {
        ui.heading("Analysis Results");
        ui.add_space(8.0);
        show_summary(ui, &report.summary);
        ui.add_space(12.0);
        show_metric_cards(ui, &report.metrics);
    });

    ui.add_space(12.0);
    section_frame(ui, |ui| show_feature_importance(ui, &report.feature_importance));

    if !report.plots.is_empty() {
        ui.add_space(12.0);
        show_plots(ui, &report.plots, textures);
    }
}

fn section_frame(ui: &mut egui::Ui, add: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::group(ui.style())
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(14, 12))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            add(ui);
        });
}

fn show_summary(ui: &mut egui::Ui, summary: &SummaryView) {
    egui::Grid::new("analysis-summary")
        .num_columns(2)
        .spacing([32.0, 4.0])
        .show(ui, |ui| {
            for field in [&summary.problem_type, &summary.domain] {
                ui.label(egui::RichText::new(field.label).weak());
            }
            ui.end_row();
            for field in [&summary.problem_type, &summary.domain] {
                ui.label(egui::RichText::new(field.display_value()).strong().size(18.0));
            }
            ui.end_row();
        });
}

fn show_metric_cards(ui: &mut egui::Ui, metrics: &[MetricCard]) {
    ui.horizontal_wrapped(|ui| {
        for card in metrics {
            egui::Frame::NONE
                .fill(ui.visuals().faint_bg_color)
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(12, 10))
                .show(ui, |ui| {
                    ui.set_min_width(CARD_WIDTH);
                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new(card.name.to_uppercase()).small().weak());
                        ui.label(egui::RichText::new(&card.formatted).strong().size(22.0));
                    });
                });
        }
    });
}

fn show_feature_importance(ui: &mut egui::Ui, series: &BarChartSeries) {
    ui.vertical_centered(|ui| ui.label(egui::RichText::new(series.title).strong()));
    if series.is_empty() {
        ui.label(egui::RichText::new("No feature importances returned").weak());
        return;
    }

    let bars: Vec<Bar> = series
        .bars()
        .enumerate()
        .map(|(index, (name, value))| Bar::new(index as f64, value).name(name).width(0.6))
        .collect();
    let categories = series.categories.clone();

    let mut plot = Plot::new("feature-importance")
        .height(280.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .x_axis_formatter(move |mark: GridMark, _range| category_label(&categories, mark.value));
    if series.y_starts_at_zero {
        plot = plot.include_y(0.0);
    }
    plot.show(ui, |plot_ui| {
        plot_ui.bar_chart(BarChart::new(series.title, bars));
    });
}

/// Axis label for an integral grid position; blank between bars.
fn category_label(categories: &[String], position: f64) -> String {
    let index = position.round();
    if (position - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    categories.get(index as usize).cloned().unwrap_or_default()
}

fn show_plots(ui: &mut egui::Ui, plots: &[PlotImage], textures: &mut PlotTextures) {
    let ctx = ui.ctx().clone();
    ui.horizontal_wrapped(|ui| {
        for plot in plots {
            egui::Frame::group(ui.style())
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(12, 10))
                .show(ui, |ui| {
                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new(&plot.label).strong().size(16.0));
                        ui.add_space(6.0);
                        match textures.get_or_load(&ctx, plot) {
                            PlotTexture::Ready { texture, size } => {
                                let scale = (PLOT_MAX_WIDTH / size.x).min(1.0);
                                ui.add(
                                    egui::Image::new(texture).fit_to_exact_size(*size * scale),
                                )
                                .on_hover_text(&plot.key);
                            }
                            PlotTexture::DecodeFailed(reason) => {
                                ui.label(
                                    egui::RichText::new(format!("Plot unavailable: {reason}"))
                                        .weak(),
                                );
                            }
                        }
                    });
                });
        }
    });
}
