//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{
    AnalysisTransport, ClientSettings, HttpAnalysisClient, ProgressSink, TransferProgress,
};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

pub fn launch(settings: ClientSettings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("failed to build backend runtime: {err}");
                let _ = ui_tx.try_send(UiEvent::BackendUnavailable(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                return;
            }
        };

        let client = match HttpAnalysisClient::from_settings(&settings) {
            Ok(client) => client,
            Err(err) => {
                tracing::error!("failed to build analysis client: {err}");
                let _ = ui_tx.try_send(UiEvent::BackendUnavailable(err.to_string()));
                return;
            }
        };
        let _ = ui_tx.try_send(UiEvent::Info(format!(
            "Ready; analysis service at {}",
            client.server_url()
        )));

        runtime.block_on(async move {
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Analyze { file } => {
                        let progress_tx = ui_tx.clone();
                        let sink: Arc<dyn ProgressSink> =
                            Arc::new(move |progress: TransferProgress| {
                                let _ = progress_tx.try_send(UiEvent::UploadProgress(progress));
                            });
                        let outcome = client.analyze(file, sink).await;
                        // Blocking send; the UI only leaves Uploading on this event.
                        if ui_tx.send(UiEvent::AnalysisFinished(outcome)).is_err() {
                            break;
                        }
                    }
                    BackendCommand::CheckHealth => {
                        let outcome = client.health().await;
                        let _ = ui_tx.try_send(UiEvent::HealthChecked(outcome));
                    }
                }
            }
            tracing::debug!("ui command channel closed; backend worker exiting");
        });
    });
}
