use std::time::Duration;

use client_core::{
    SelectedFile, SelectionOutcome, SessionShell, SessionView, UploadController, UploadError,
    UploadPhase, UploadResolution,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{describe_health, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::report::{self, PlotTextures};

const CONTENT_MAX_WIDTH: f32 = 960.0;
const DROP_ZONE_HEIGHT: f32 = 180.0;

pub struct AnalyzerApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    controller: UploadController,
    shell: SessionShell,
    status: String,
    server_url: String,
    plot_textures: PlotTextures,
}

impl AnalyzerApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        server_url: String,
        startup_warning: Option<String>,
    ) -> Self {
        let mut shell = SessionShell::new();
        if let Some(warning) = startup_warning {
            shell.show_error(warning);
        }
        Self {
            cmd_tx,
            ui_rx,
            controller: UploadController::new(),
            shell,
            status: "Starting...".to_string(),
            server_url,
            plot_textures: PlotTextures::default(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => self.status = message,
                UiEvent::BackendUnavailable(message) => {
                    self.status = "Backend unavailable".to_string();
                    self.shell.show_error(message);
                }
                UiEvent::UploadProgress(progress) => self.controller.record_progress(progress),
                UiEvent::AnalysisFinished(outcome) => {
                    let resolution = self.controller.finish(outcome);
                    self.apply_resolution(resolution);
                }
                UiEvent::HealthChecked(outcome) => self.status = describe_health(&outcome),
            }
        }
    }

    fn apply_resolution(&mut self, resolution: UploadResolution) {
        match &resolution {
            UploadResolution::Completed(_) => {
                self.plot_textures.clear();
                self.status = "Analysis complete".to_string();
            }
            UploadResolution::Failed(_) => self.status = "Analysis failed".to_string(),
            UploadResolution::Ignored => {}
        }
        self.shell.apply(resolution);
    }

    fn begin_selection(&mut self, files: Vec<SelectedFile>) {
        match self.controller.select_files(files) {
            SelectionOutcome::Start(file) => {
                self.status = format!("Uploading {}", file.name);
                let mut failure = String::new();
                if !dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::Analyze { file },
                    &mut failure,
                ) {
                    let resolution = self
                        .controller
                        .finish(Err(UploadError::RequestSetup(failure.clone())));
                    self.apply_resolution(resolution);
                    self.status = failure;
                }
            }
            SelectionOutcome::Rejected(err) => {
                self.apply_resolution(UploadResolution::Failed(err));
            }
            SelectionOutcome::Ignored => {}
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() || !self.shell.shows_upload_surface() {
            return;
        }
        let files = dropped.iter().filter_map(selected_from_dropped).collect();
        self.begin_selection(files);
    }

    fn browse_for_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .pick_file()
        {
            self.begin_selection(vec![SelectedFile::from_path(path)]);
        }
    }

    fn show_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Random Forest Analysis");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .button("Check service")
                    .on_hover_text(&self.server_url)
                    .clicked()
                {
                    let mut failure = String::new();
                    if dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::CheckHealth,
                        &mut failure,
                    ) {
                        self.status = "Checking analysis service...".to_string();
                    } else {
                        self.status = failure;
                    }
                }
            });
        });
        ui.label(
            egui::RichText::new("Upload a CSV dataset to train a model and review its metrics.")
                .weak(),
        );
    }

    fn show_error_banner(&mut self, ui: &mut egui::Ui) {
        let Some(message) = self.shell.current_error().map(str::to_owned) else {
            return;
        };
        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(
                1.0,
                egui::Color32::from_rgb(175, 96, 96),
            ))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(&message).color(egui::Color32::WHITE));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            self.shell.dismiss_error();
                        }
                    });
                });
            });
        ui.add_space(10.0);
    }

    fn show_upload_surface(&mut self, ui: &mut egui::Ui) {
        let uploading = self.controller.phase() == UploadPhase::Uploading;
        let hovering = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());

        let stroke_color = if hovering && !uploading {
            ui.visuals().selection.stroke.color
        } else {
            ui.visuals().widgets.noninteractive.bg_stroke.color
        };
        let fill = if hovering && !uploading {
            ui.visuals().extreme_bg_color
        } else {
            ui.visuals().faint_bg_color
        };

        let mut browse_clicked = false;
        egui::Frame::NONE
            .fill(fill)
            .stroke(egui::Stroke::new(1.5, stroke_color))
            .corner_radius(10.0)
            .inner_margin(egui::Margin::same(16))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.set_min_height(DROP_ZONE_HEIGHT);
                ui.vertical_centered(|ui| {
                    ui.add_space(24.0);
                    if uploading {
                        let state = self.controller.state();
                        ui.label(egui::RichText::new("Analyzing file...").strong().size(18.0));
                        if let Some(name) = &state.file_name {
                            ui.label(egui::RichText::new(name).weak());
                        }
                        ui.add_space(10.0);
                        ui.add(
                            egui::ProgressBar::new(f32::from(state.progress_percent) / 100.0)
                                .desired_width(320.0)
                                .show_percentage(),
                        );
                    } else {
                        let prompt = if hovering {
                            "Drop the CSV file here"
                        } else {
                            "Drag and drop a CSV file here"
                        };
                        ui.label(egui::RichText::new(prompt).strong().size(18.0));
                        ui.label(egui::RichText::new("or").weak());
                        browse_clicked = ui.button("Browse files").clicked();
                        if let Some(name) = &self.controller.state().file_name {
                            ui.add_space(6.0);
                            ui.label(egui::RichText::new(format!("Last file: {name}")).weak());
                        }
                    }
                });
            });

        if browse_clicked && self.controller.accepts_input() {
            self.browse_for_file();
        }
    }

    fn show_result_view(&mut self, ui: &mut egui::Ui) {
        if ui.button("Analyze Another Dataset").clicked() {
            self.shell.start_new_analysis(&mut self.controller);
            self.plot_textures.clear();
            self.status = "Ready for a new dataset".to_string();
            return;
        }
        ui.add_space(10.0);
        if let SessionView::Result { report, .. } = self.shell.view() {
            report::show_report(ui, report, &mut self.plot_textures);
        }
    }

    fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status-bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&self.status).small());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(&self.server_url).small().weak());
                });
            });
        });
    }
}

impl eframe::App for AnalyzerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.handle_dropped_files(ctx);

        self.show_status_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.set_max_width(CONTENT_MAX_WIDTH);
                        ui.with_layout(egui::Layout::top_down(egui::Align::Min), |ui| {
                            self.show_header(ui);
                            ui.add_space(12.0);
                            if self.shell.shows_upload_surface() {
                                self.show_error_banner(ui);
                                self.show_upload_surface(ui);
                            } else {
                                self.show_result_view(ui);
                            }
                        });
                    });
                });
        });

        if self.controller.phase() == UploadPhase::Uploading {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

/// Dropped files carry a path on native platforms and raw bytes elsewhere.
pub fn selected_from_dropped(file: &egui::DroppedFile) -> Option<SelectedFile> {
    if let Some(path) = &file.path {
        return Some(SelectedFile::from_path(path.clone()));
    }
    let bytes = file.bytes.as_ref()?;
    Some(SelectedFile::from_bytes(file.name.clone(), bytes.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::FileSource;
    use crossbeam_channel::bounded;
    use shared::domain::AnalysisResult;
    use std::{path::PathBuf, sync::Arc};

    fn test_app() -> (AnalyzerApp, Receiver<BackendCommand>, Sender<UiEvent>) {
        let (cmd_tx, cmd_rx) = bounded(4);
        let (ui_tx, ui_rx) = bounded(16);
        let app = AnalyzerApp::new(cmd_tx, ui_rx, "http://127.0.0.1:8001/".into(), None);
        (app, cmd_rx, ui_tx)
    }

    fn sample_result() -> AnalysisResult {
        serde_json::from_value(serde_json::json!({
            "problem_type": "regression",
            "domain": "housing",
            "metrics": { "r2": 0.81 },
            "feature_importances": { "rooms": 0.7 },
            "plots": {}
        }))
        .expect("result")
    }

    #[test]
    fn dropped_files_prefer_paths_over_bytes() {
        let with_path = egui::DroppedFile {
            path: Some(PathBuf::from("/tmp/data.csv")),
            bytes: Some(Arc::from(&b"a,b"[..])),
            ..Default::default()
        };
        let selected = selected_from_dropped(&with_path).expect("file");
        assert_eq!(selected.name, "data.csv");
        assert_eq!(selected.source, FileSource::Path(PathBuf::from("/tmp/data.csv")));

        let with_bytes = egui::DroppedFile {
            name: "web.csv".into(),
            bytes: Some(Arc::from(&b"x,y"[..])),
            ..Default::default()
        };
        let selected = selected_from_dropped(&with_bytes).expect("file");
        assert_eq!(selected.source, FileSource::Bytes(b"x,y".to_vec()));

        assert!(selected_from_dropped(&egui::DroppedFile::default()).is_none());
    }

    #[test]
    fn rejected_file_shows_error_without_contacting_backend() {
        let (mut app, cmd_rx, _ui_tx) = test_app();

        app.begin_selection(vec![SelectedFile::from_bytes("notes.txt", b"hi".to_vec())]);

        assert!(cmd_rx.try_recv().is_err());
        assert_eq!(app.shell.current_error(), Some("Please upload a CSV file"));
        assert_eq!(app.controller.phase(), UploadPhase::Idle);
    }

    #[test]
    fn accepted_file_is_queued_and_result_replaces_upload_surface() {
        let (mut app, cmd_rx, ui_tx) = test_app();

        app.begin_selection(vec![SelectedFile::from_bytes("data.csv", b"a,b".to_vec())]);
        assert!(matches!(
            cmd_rx.try_recv(),
            Ok(BackendCommand::Analyze { file }) if file.name == "data.csv"
        ));
        assert_eq!(app.controller.phase(), UploadPhase::Uploading);

        app.begin_selection(vec![SelectedFile::from_bytes("other.csv", b"c".to_vec())]);
        assert!(cmd_rx.try_recv().is_err());

        ui_tx
            .send(UiEvent::AnalysisFinished(Ok(sample_result())))
            .expect("send");
        app.process_ui_events();

        assert_eq!(app.controller.phase(), UploadPhase::Succeeded);
        assert!(!app.shell.shows_upload_surface());
        assert_eq!(
            app.shell.current_result().map(|result| result.domain.as_str()),
            Some("housing")
        );
    }

    #[test]
    fn failed_dispatch_returns_to_upload_surface_with_error() {
        let (mut app, cmd_rx, _ui_tx) = test_app();
        drop(cmd_rx);

        app.begin_selection(vec![SelectedFile::from_bytes("data.csv", b"a".to_vec())]);

        assert_eq!(app.controller.phase(), UploadPhase::Failed);
        assert!(app.controller.accepts_input());
        assert!(app.shell.current_error().is_some());
        assert!(app.status.starts_with("Backend command processor disconnected"));
    }

    #[test]
    fn backend_failure_surfaces_no_response_message() {
        let (mut app, _cmd_rx, ui_tx) = test_app();
        app.begin_selection(vec![SelectedFile::from_bytes("data.csv", b"a".to_vec())]);

        ui_tx
            .send(UiEvent::AnalysisFinished(Err(UploadError::NoResponse(
                "connection refused".into(),
            ))))
            .expect("send");
        app.process_ui_events();

        assert_eq!(
            app.shell.current_error(),
            Some("No response from server. Please check if the backend is running.")
        );
        assert_eq!(app.controller.state().progress_percent, 0);
    }
}
