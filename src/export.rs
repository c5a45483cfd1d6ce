//! Batch export of sessions to files
//!
//! The target directory is created up front. If that fails nothing is
//! written. Sessions are then exported one at a time. A per-session problem
//! is logged and the session skipped; an interrupt stops the batch between
//! sessions.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{SessionKind, SessionSummary};
use crate::store::Message;
use crate::transcode::{self, html, text, DisplayZone, MediaIndex, SessionContext};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Html,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Html => "html",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Export cancelled after {written} session(s)")]
    Cancelled { written: usize },
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub target_dir: PathBuf,
    pub format: OutputFormat,
    /// Append ` (NUMBER)` to file names
    pub with_number: bool,
    pub zone: DisplayZone,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<i64>,
}

/// Replace characters that cannot appear in a file name
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    cleaned.trim().trim_matches('.').to_string()
}

pub fn file_name(summary: &SessionSummary, options: &ExportOptions) -> String {
    let number = sanitize_file_name(&summary.number);
    let mut stem = sanitize_file_name(&summary.name);
    if stem.is_empty() {
        stem = number.clone();
    }

    if options.with_number && !number.is_empty() && stem != number {
        stem = format!("{} ({})", stem, number);
    }

    format!("{}.{}", stem, options.format.extension())
}

pub fn output_path(summary: &SessionSummary, options: &ExportOptions) -> PathBuf {
    options.target_dir.join(file_name(summary, options))
}

fn prepare_target(dir: &Path, format: OutputFormat) -> Result<(), ExportError> {
    let to_error = |source| ExportError::OutputDir {
        path: dir.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(to_error)?;
    if format == OutputFormat::Html {
        html::write_assets(dir).map_err(to_error)?;
    }
    Ok(())
}

fn write_session(
    summary: &SessionSummary,
    messages: &[Message],
    media: &MediaIndex,
    options: &ExportOptions,
    path: &Path,
) -> std::io::Result<usize> {
    let ctx = SessionContext {
        session_id: summary.id,
        partner_name: &summary.name,
        is_group: summary.kind == SessionKind::Group,
        zone: options.zone,
    };
    let doc = transcode::render_session(&ctx, messages, media);

    let mut writer = BufWriter::new(File::create(path)?);
    match options.format {
        OutputFormat::Text => text::write_text(&mut writer, &doc)?,
        OutputFormat::Html => html::write_html(&mut writer, &doc)?,
    }
    writer.flush()?;

    Ok(doc.entries.len())
}

/// Export each target session to its own file in `options.target_dir`
pub fn export_sessions(
    targets: &[SessionSummary],
    messages: &[Message],
    media: &MediaIndex,
    options: &ExportOptions,
    cancel: &AtomicBool,
) -> Result<ExportReport, ExportError> {
    prepare_target(&options.target_dir, options.format)?;
    info!(
        "Exporting {} session(s) to {}",
        targets.len(),
        options.target_dir.display()
    );

    let mut report = ExportReport::default();

    for summary in targets {
        if cancel.load(Ordering::SeqCst) {
            return Err(ExportError::Cancelled {
                written: report.written.len(),
            });
        }

        if summary.number.is_empty() {
            warn!(
                "Skipping session {} ({}): empty contact address",
                summary.id, summary.name
            );
            report.skipped.push(summary.id);
            continue;
        }

        let path = output_path(summary, options);
        match write_session(summary, messages, media, options, &path) {
            Ok(count) => {
                println!("   → {} ({} entries)", path.display(), count);
                report.written.push(path);
            }
            Err(e) => {
                warn!("Failed to write {}: {}", path.display(), e);
                report.skipped.push(summary.id);
            }
        }
    }

    Ok(report)
}
