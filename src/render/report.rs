//! Analysis report markdown generation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::domain::FileRecord;

/// Render the final report using the current time in the header.
pub fn format_report(
    response: &str,
    event_label: &str,
    files_analyzed: usize,
    diffs_analyzed: usize,
    records: &[FileRecord],
) -> String {
    format_report_at(response, event_label, files_analyzed, diffs_analyzed, records, Utc::now())
}

/// Render the final report with an explicit timestamp.
///
/// The agent response is appended verbatim after the file list.
pub fn format_report_at(
    response: &str,
    event_label: &str,
    files_analyzed: usize,
    diffs_analyzed: usize,
    records: &[FileRecord],
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# Repository Analysis ({}) - {}\n\n",
        event_label,
        generated_at.format("%Y-%m-%dT%H:%M:%S+00:00")
    ));

    out.push_str("## Summary\n");
    out.push_str(&format!("- Files analyzed: {files_analyzed}\n"));
    out.push_str(&format!("- Diffs analyzed: {diffs_analyzed}\n\n"));

    out.push_str("## Files\n");
    for record in records {
        out.push_str(&format!("- **{}**: {}\n", record.path, record.status));
    }
    out.push('\n');

    out.push_str(response);
    out
}

/// Where a finished report is delivered besides stdout.
#[derive(Debug, Clone, Default)]
pub struct ReportSinks {
    /// Overwritten with the report.
    pub output: Option<PathBuf>,
    /// Appended to (GitHub Actions job summary).
    pub step_summary: Option<PathBuf>,
}

pub fn write_report(report: &str, sinks: &ReportSinks) -> Result<()> {
    println!("{report}");

    if let Some(path) = &sinks.output {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed creating directory: {}", parent.display()))?;
        }
        std::fs::write(path, report)
            .with_context(|| format!("Failed writing report: {}", path.display()))?;
    }

    if let Some(path) = &sinks.step_summary {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed opening step summary: {}", path.display()))?;
        writeln!(file, "{report}")
            .with_context(|| format!("Failed writing step summary: {}", path.display()))?;
    }

    Ok(())
}
