//! Backend commands queued from UI to backend worker.

use client_core::SelectedFile;

pub enum BackendCommand {
    Analyze { file: SelectedFile },
    CheckHealth,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Analyze { .. } => "analyze",
            BackendCommand::CheckHealth => "check_health",
        }
    }
}
