//! Client side of the dataset analysis flow: pick a CSV, upload it, and turn
//! the returned report into view models.

pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod transport;
pub mod upload;

pub use config::{load_settings, ClientSettings};
pub use error::{RenderError, UploadError, UploadErrorCategory};
pub use render::{
    render_report, BarChartSeries, LabeledField, MetricCard, PlotImage, ReportView, SummaryView,
};
pub use session::{SessionShell, SessionView};
pub use transport::{
    AnalysisTransport, FileSource, HttpAnalysisClient, NoopProgress, ProgressSink, SelectedFile,
    TransferProgress,
};
pub use upload::{
    SelectionOutcome, UploadController, UploadPhase, UploadResolution, UploadState,
};
