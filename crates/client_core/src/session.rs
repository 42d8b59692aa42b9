use shared::domain::AnalysisResult;
use tracing::{debug, error};

use crate::{
    render::{render_report, ReportView},
    upload::{UploadController, UploadResolution},
};

/// What the shell currently shows. A result and an error never coexist.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionView {
    #[default]
    Idle,
    Result {
        result: Box<AnalysisResult>,
        report: Box<ReportView>,
    },
    Error(String),
}

#[derive(Debug, Default)]
pub struct SessionShell {
    view: SessionView,
}

impl SessionShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &SessionView {
        &self.view
    }

    pub fn current_result(&self) -> Option<&AnalysisResult> {
        match &self.view {
            SessionView::Result { result, .. } => Some(result.as_ref()),
            _ => None,
        }
    }

    pub fn current_report(&self) -> Option<&ReportView> {
        match &self.view {
            SessionView::Result { report, .. } => Some(report.as_ref()),
            _ => None,
        }
    }

    pub fn current_error(&self) -> Option<&str> {
        match &self.view {
            SessionView::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// The upload surface is hidden while a result is on screen.
    pub fn shows_upload_surface(&self) -> bool {
        !matches!(self.view, SessionView::Result { .. })
    }

    /// Replaces whatever is shown. A payload that cannot be rendered is
    /// surfaced as an error instead.
    pub fn show_result(&mut self, result: AnalysisResult) {
        match render_report(&result) {
            Ok(report) => {
                self.view = SessionView::Result {
                    result: Box::new(result),
                    report: Box::new(report),
                };
            }
            Err(err) => {
                error!("failed to render analysis result: {err}");
                self.view = SessionView::Error(err.user_message());
            }
        }
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.view = SessionView::Error(message.into());
    }

    pub fn dismiss_error(&mut self) {
        if matches!(self.view, SessionView::Error(_)) {
            self.view = SessionView::Idle;
        }
    }

    pub fn start_new_analysis(&mut self, controller: &mut UploadController) {
        debug!("clearing session for a new analysis");
        self.view = SessionView::Idle;
        controller.reset();
    }

    pub fn apply(&mut self, resolution: UploadResolution) {
        match resolution {
            UploadResolution::Completed(result) => self.show_result(result),
            UploadResolution::Failed(err) => self.show_error(err.user_message()),
            UploadResolution::Ignored => {}
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
