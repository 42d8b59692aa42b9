//! Upload lifecycle: local validation, transfer progress, and outcome
//! classification for a single dataset at a time.

use std::sync::Arc;

use shared::{domain::AnalysisResult, protocol::CSV_EXTENSION};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    error::{UploadError, UploadErrorCategory},
    transport::{AnalysisTransport, ProgressSink, SelectedFile, TransferProgress},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadState {
    pub phase: UploadPhase,
    /// Only meaningful while `Uploading`; zero otherwise.
    pub progress_percent: u8,
    /// Last accepted file, kept after the attempt resolves.
    pub file_name: Option<String>,
}

#[derive(Debug)]
pub enum SelectionOutcome {
    /// Accepted; the caller hands this file to the transport.
    Start(SelectedFile),
    Rejected(UploadError),
    Ignored,
}

#[derive(Debug)]
pub enum UploadResolution {
    Completed(AnalysisResult),
    Failed(UploadError),
    Ignored,
}

pub fn validate_file_name(file_name: &str) -> Result<(), UploadError> {
    if file_name.ends_with(CSV_EXTENSION) {
        Ok(())
    } else {
        Err(UploadError::LocalValidation {
            file_name: file_name.to_string(),
        })
    }
}

#[derive(Debug, Default)]
pub struct UploadController {
    state: UploadState,
}

impl UploadController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn phase(&self) -> UploadPhase {
        self.state.phase
    }

    /// The drop surface is disabled for the whole transfer.
    pub fn accepts_input(&self) -> bool {
        self.state.phase != UploadPhase::Uploading
    }

    pub fn select_files(&mut self, mut files: Vec<SelectedFile>) -> SelectionOutcome {
        if !self.accepts_input() {
            debug!("upload in progress; ignoring file selection");
            return SelectionOutcome::Ignored;
        }
        if files.len() != 1 {
            debug!(count = files.len(), "expected exactly one file; ignoring selection");
            return SelectionOutcome::Ignored;
        }
        let Some(file) = files.pop() else {
            return SelectionOutcome::Ignored;
        };

        self.state.phase = UploadPhase::Idle;
        self.state.progress_percent = 0;

        if let Err(err) = validate_file_name(&file.name) {
            log_failure(&err);
            return SelectionOutcome::Rejected(err);
        }

        info!(file = %file.name, "starting dataset upload");
        self.state.phase = UploadPhase::Uploading;
        self.state.file_name = Some(file.name.clone());
        SelectionOutcome::Start(file)
    }

    pub fn record_progress(&mut self, progress: TransferProgress) {
        if self.state.phase != UploadPhase::Uploading {
            return;
        }
        let Some(percent) = progress.percent() else {
            return;
        };
        self.state.progress_percent = self.state.progress_percent.max(percent);
    }

    pub fn finish(&mut self, outcome: Result<AnalysisResult, UploadError>) -> UploadResolution {
        if self.state.phase != UploadPhase::Uploading {
            warn!(phase = ?self.state.phase, "transfer resolved outside of an upload; dropping");
            return UploadResolution::Ignored;
        }

        self.state.progress_percent = 0;
        match outcome {
            Ok(result) => {
                info!(
                    file = self.state.file_name.as_deref().unwrap_or_default(),
                    problem_type = %result.problem_type,
                    "analysis completed"
                );
                self.state.phase = UploadPhase::Succeeded;
                UploadResolution::Completed(result)
            }
            Err(err) => {
                log_failure(&err);
                self.state.phase = UploadPhase::Failed;
                UploadResolution::Failed(err)
            }
        }
    }

    pub fn reset(&mut self) {
        self.state.phase = UploadPhase::Idle;
        self.state.progress_percent = 0;
    }

    /// Drives one selection through the transport on the current task,
    /// applying progress as it arrives. `on_update` sees every state change.
    pub async fn run_upload<T>(
        &mut self,
        transport: &T,
        files: Vec<SelectedFile>,
        mut on_update: impl FnMut(&UploadState),
    ) -> UploadResolution
    where
        T: AnalysisTransport + ?Sized,
    {
        let file = match self.select_files(files) {
            SelectionOutcome::Start(file) => file,
            SelectionOutcome::Rejected(err) => {
                on_update(&self.state);
                return UploadResolution::Failed(err);
            }
            SelectionOutcome::Ignored => return UploadResolution::Ignored,
        };
        on_update(&self.state);

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<TransferProgress>();
        let sink: Arc<dyn ProgressSink> = Arc::new(move |progress: TransferProgress| {
            let _ = progress_tx.send(progress);
        });

        let transfer = transport.analyze(file, sink);
        tokio::pin!(transfer);
        let outcome = loop {
            tokio::select! {
                outcome = &mut transfer => break outcome,
                Some(progress) = progress_rx.recv() => {
                    self.record_progress(progress);
                    on_update(&self.state);
                }
            }
        };
        while let Ok(progress) = progress_rx.try_recv() {
            self.record_progress(progress);
            on_update(&self.state);
        }

        let resolution = self.finish(outcome);
        on_update(&self.state);
        resolution
    }
}

fn log_failure(err: &UploadError) {
    let category = err.category();
    match category {
        UploadErrorCategory::Validation => {
            warn!(category = category.as_str(), "upload rejected: {err}")
        }
        _ => error!(category = category.as_str(), "upload failed: {err}"),
    }
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
