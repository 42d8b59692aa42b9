use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use crate::error::{CSV_REQUIRED_MESSAGE, NO_RESPONSE_MESSAGE};

/// Replays a scripted transfer: emits each byte count as progress, then
/// resolves with `outcome`.
struct ScriptedTransport {
    progress_steps: Vec<u64>,
    total_bytes: u64,
    outcome: Result<AnalysisResult, UploadError>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    fn succeeding(progress_steps: Vec<u64>, total_bytes: u64) -> Self {
        Self {
            progress_steps,
            total_bytes,
            outcome: Ok(sample_result()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(err: UploadError) -> Self {
        Self {
            progress_steps: Vec::new(),
            total_bytes: 0,
            outcome: Err(err),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisTransport for ScriptedTransport {
    async fn analyze(
        &self,
        _file: SelectedFile,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<AnalysisResult, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for bytes_sent in &self.progress_steps {
            progress.on_progress(TransferProgress {
                bytes_sent: *bytes_sent,
                total_bytes: self.total_bytes,
            });
            tokio::task::yield_now().await;
        }
        self.outcome.clone()
    }
}

fn sample_result() -> AnalysisResult {
    serde_json::from_value(json!({
        "problem_type": "classification",
        "domain": "finance",
        "metrics": { "accuracy": 0.9123 },
        "feature_importances": { "age": 0.4 },
        "plots": { "confusion_matrix": "iVBORw0KGgo=" }
    }))
    .expect("sample result")
}

fn csv(name: &str) -> SelectedFile {
    SelectedFile::from_bytes(name, b"a,b\n1,2\n".to_vec())
}

#[test]
fn accepted_csv_enters_uploading_with_zero_progress() {
    let mut controller = UploadController::new();

    let outcome = controller.select_files(vec![csv("data.csv")]);

    assert!(matches!(outcome, SelectionOutcome::Start(ref file) if file.name == "data.csv"));
    assert_eq!(controller.phase(), UploadPhase::Uploading);
    assert_eq!(controller.state().progress_percent, 0);
    assert_eq!(controller.state().file_name.as_deref(), Some("data.csv"));
    assert!(!controller.accepts_input());
}

#[test]
fn non_csv_names_are_rejected_locally() {
    for name in ["data.txt", "data.csv.bak", "data", "DATA.CSV"] {
        let mut controller = UploadController::new();
        match controller.select_files(vec![csv(name)]) {
            SelectionOutcome::Rejected(err) => {
                assert_eq!(err.user_message(), CSV_REQUIRED_MESSAGE);
                assert_eq!(err.category(), UploadErrorCategory::Validation);
            }
            other => panic!("expected rejection for {name}, got {other:?}"),
        }
        assert_eq!(controller.phase(), UploadPhase::Idle);
        assert_eq!(controller.state().file_name, None);
    }
}

#[test]
fn selection_is_ignored_while_uploading() {
    let mut controller = UploadController::new();
    controller.select_files(vec![csv("first.csv")]);

    let outcome = controller.select_files(vec![csv("second.csv")]);

    assert!(matches!(outcome, SelectionOutcome::Ignored));
    assert_eq!(controller.state().file_name.as_deref(), Some("first.csv"));
}

#[test]
fn empty_or_multi_file_drops_are_ignored() {
    let mut controller = UploadController::new();
    assert!(matches!(
        controller.select_files(Vec::new()),
        SelectionOutcome::Ignored
    ));
    assert!(matches!(
        controller.select_files(vec![csv("a.csv"), csv("b.csv")]),
        SelectionOutcome::Ignored
    ));
    assert_eq!(controller.phase(), UploadPhase::Idle);
}

#[test]
fn progress_never_decreases_within_an_attempt() {
    let mut controller = UploadController::new();
    controller.select_files(vec![csv("data.csv")]);

    let mut observed = Vec::new();
    for bytes_sent in [10, 50, 40, 100] {
        controller.record_progress(TransferProgress {
            bytes_sent,
            total_bytes: 100,
        });
        observed.push(controller.state().progress_percent);
    }

    assert_eq!(observed, [10, 50, 50, 100]);
}

#[test]
fn progress_outside_uploading_is_ignored() {
    let mut controller = UploadController::new();
    controller.record_progress(TransferProgress {
        bytes_sent: 5,
        total_bytes: 10,
    });
    assert_eq!(controller.state().progress_percent, 0);
}

#[test]
fn finishing_resets_progress_for_either_outcome() {
    let mut controller = UploadController::new();
    controller.select_files(vec![csv("data.csv")]);
    controller.record_progress(TransferProgress {
        bytes_sent: 100,
        total_bytes: 100,
    });

    let resolution = controller.finish(Ok(sample_result()));
    assert!(matches!(resolution, UploadResolution::Completed(_)));
    assert_eq!(controller.phase(), UploadPhase::Succeeded);
    assert_eq!(controller.state().progress_percent, 0);
    assert_eq!(controller.state().file_name.as_deref(), Some("data.csv"));

    controller.select_files(vec![csv("retry.csv")]);
    controller.record_progress(TransferProgress {
        bytes_sent: 30,
        total_bytes: 100,
    });
    let resolution = controller.finish(Err(UploadError::NoResponse("refused".into())));
    assert!(matches!(resolution, UploadResolution::Failed(_)));
    assert_eq!(controller.phase(), UploadPhase::Failed);
    assert_eq!(controller.state().progress_percent, 0);
}

#[test]
fn stale_resolution_is_dropped() {
    let mut controller = UploadController::new();
    assert!(matches!(
        controller.finish(Ok(sample_result())),
        UploadResolution::Ignored
    ));
    assert_eq!(controller.phase(), UploadPhase::Idle);
}

#[test]
fn failed_attempt_can_be_retried_immediately() {
    let mut controller = UploadController::new();
    controller.select_files(vec![csv("data.csv")]);
    controller.finish(Err(UploadError::NoResponse("refused".into())));

    assert!(controller.accepts_input());
    assert!(matches!(
        controller.select_files(vec![csv("data.csv")]),
        SelectionOutcome::Start(_)
    ));
    assert_eq!(controller.phase(), UploadPhase::Uploading);
}

#[test]
fn reset_returns_to_idle_but_keeps_last_file_name() {
    let mut controller = UploadController::new();
    controller.select_files(vec![csv("data.csv")]);
    controller.finish(Ok(sample_result()));

    controller.reset();

    assert_eq!(controller.phase(), UploadPhase::Idle);
    assert_eq!(controller.state().file_name.as_deref(), Some("data.csv"));
}

#[tokio::test]
async fn run_upload_observes_progress_then_resets_on_success() {
    let transport = ScriptedTransport::succeeding(vec![25, 50, 75, 100], 100);
    let mut controller = UploadController::new();
    let mut snapshots = Vec::new();

    let resolution = controller
        .run_upload(&transport, vec![csv("data.csv")], |state| {
            snapshots.push((state.phase, state.progress_percent))
        })
        .await;

    assert!(matches!(resolution, UploadResolution::Completed(ref result) if result.domain == "finance"));
    assert_eq!(transport.calls(), 1);
    assert_eq!(snapshots.first(), Some(&(UploadPhase::Uploading, 0)));
    assert_eq!(snapshots.last(), Some(&(UploadPhase::Succeeded, 0)));

    let during: Vec<u8> = snapshots
        .iter()
        .filter(|(phase, _)| *phase == UploadPhase::Uploading)
        .map(|(_, percent)| *percent)
        .collect();
    assert!(during.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(during.last(), Some(&100));
}

#[tokio::test]
async fn run_upload_never_calls_transport_for_invalid_extension() {
    let transport = ScriptedTransport::succeeding(Vec::new(), 0);
    let mut controller = UploadController::new();

    let resolution = controller
        .run_upload(&transport, vec![csv("data.txt")], |_| {})
        .await;

    match resolution {
        UploadResolution::Failed(err) => assert_eq!(err.user_message(), CSV_REQUIRED_MESSAGE),
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert_eq!(transport.calls(), 0);
    assert_eq!(controller.phase(), UploadPhase::Idle);
}

#[tokio::test]
async fn run_upload_surfaces_transport_failure() {
    let transport = ScriptedTransport::failing(UploadError::NoResponse("connection refused".into()));
    let mut controller = UploadController::new();

    let resolution = controller
        .run_upload(&transport, vec![csv("data.csv")], |_| {})
        .await;

    match resolution {
        UploadResolution::Failed(err) => assert_eq!(err.user_message(), NO_RESPONSE_MESSAGE),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(controller.phase(), UploadPhase::Failed);
    assert_eq!(controller.state().progress_percent, 0);
}
