//! Output rendering (analysis report, report sinks)

pub mod report;

pub use report::{format_report, format_report_at, write_report, ReportSinks};
