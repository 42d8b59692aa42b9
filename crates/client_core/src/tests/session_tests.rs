use super::*;

use serde_json::json;

use crate::error::{UploadError, NO_RESPONSE_MESSAGE};

fn result_with_metrics(metrics: serde_json::Value) -> AnalysisResult {
    serde_json::from_value(json!({
        "problem_type": "classification",
        "domain": "finance",
        "metrics": metrics,
        "feature_importances": { "age": 0.4 },
        "plots": { "confusion_matrix": "AAAA" }
    }))
    .expect("result")
}

#[test]
fn starts_idle_with_upload_surface() {
    let shell = SessionShell::new();
    assert_eq!(shell.view(), &SessionView::Idle);
    assert!(shell.shows_upload_surface());
}

#[test]
fn result_replaces_error_and_hides_upload_surface() {
    let mut shell = SessionShell::new();
    shell.show_error("Empty file");

    shell.show_result(result_with_metrics(json!({ "accuracy": 0.9123 })));

    assert_eq!(shell.current_error(), None);
    assert_eq!(
        shell.current_report().expect("report").metrics[0].formatted,
        "0.9123"
    );
    assert_eq!(shell.current_result().expect("result").domain, "finance");
    assert!(!shell.shows_upload_surface());
}

#[test]
fn error_replaces_result() {
    let mut shell = SessionShell::new();
    shell.show_result(result_with_metrics(json!({ "accuracy": 0.9 })));

    shell.apply(UploadResolution::Failed(UploadError::NoResponse(
        "connection refused".into(),
    )));

    assert!(shell.current_result().is_none());
    assert_eq!(shell.current_error(), Some(NO_RESPONSE_MESSAGE));
    assert!(shell.shows_upload_surface());
}

#[test]
fn unrenderable_result_is_shown_as_error() {
    let mut shell = SessionShell::new();

    shell.apply(UploadResolution::Completed(result_with_metrics(
        json!({ "accuracy": "n/a" }),
    )));

    assert!(shell.current_result().is_none());
    let message = shell.current_error().expect("error");
    assert!(message.contains("metric 'accuracy' is not numeric"), "{message}");
}

#[test]
fn dismissing_error_returns_to_idle_only_from_error() {
    let mut shell = SessionShell::new();
    shell.show_result(result_with_metrics(json!({})));
    shell.dismiss_error();
    assert!(shell.current_result().is_some());

    shell.show_error("Empty file");
    shell.dismiss_error();
    assert_eq!(shell.view(), &SessionView::Idle);
}

#[test]
fn new_analysis_clears_result_and_resets_controller() {
    let mut shell = SessionShell::new();
    let mut controller = UploadController::new();
    controller.select_files(vec![crate::transport::SelectedFile::from_bytes(
        "data.csv",
        b"a\n1\n".to_vec(),
    )]);
    shell.apply(controller.finish(Ok(result_with_metrics(json!({ "accuracy": 0.9 })))));

    shell.start_new_analysis(&mut controller);

    assert_eq!(shell.view(), &SessionView::Idle);
    assert_eq!(controller.phase(), crate::upload::UploadPhase::Idle);
}

#[test]
fn ignored_resolution_leaves_view_untouched() {
    let mut shell = SessionShell::new();
    shell.show_error("Please upload a CSV file");
    shell.apply(UploadResolution::Ignored);
    assert_eq!(shell.current_error(), Some("Please upload a CSV file"));
}
