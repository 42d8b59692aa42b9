//! UI layer for the desktop analyzer: app shell and report panels.

pub mod app;
pub mod report;

pub use app::AnalyzerApp;
