//! Dump command implementation

use anyhow::Result;
use std::sync::atomic::AtomicBool;
use tracing::{debug, warn};

use crate::catalog::{SessionCatalog, SessionFilter};
use crate::export::{self, ExportError, ExportOptions};
use crate::store::ChatStore;
use crate::transcode::MediaIndex;

pub fn run(
    store: &ChatStore,
    session_ids: &[i64],
    filter: &SessionFilter,
    options: &ExportOptions,
    cancel: &AtomicBool,
) -> Result<()> {
    let catalog = SessionCatalog::new(store.load_sessions()?);

    let mut targets = catalog.export_targets(filter);
    if !session_ids.is_empty() {
        for id in session_ids {
            if !targets.iter().any(|t| t.id == *id) {
                warn!("Session {} is not an exportable direct chat, ignoring", id);
            }
        }
        targets.retain(|t| session_ids.contains(&t.id));
    }

    if targets.is_empty() {
        println!("No sessions to export. Run 'wadump sessions' to see what is available.");
        return Ok(());
    }

    if !store.has_media_table() {
        warn!("No media table in this backup; attachments will render as deleted");
    }
    let messages = store.load_messages()?;
    let media = MediaIndex::from_items(&store.load_media()?);
    debug!("{} messages, {} media paths loaded", messages.len(), media.len());

    println!(
        "Exporting {} session(s) to {}\n",
        targets.len(),
        options.target_dir.display()
    );

    match export::export_sessions(&targets, &messages, &media, options, cancel) {
        Ok(report) => {
            if !report.skipped.is_empty() {
                println!("\nSkipped {} session(s).", report.skipped.len());
            }
            println!("\n✅ Export complete! {} file(s) written.", report.written.len());
            Ok(())
        }
        Err(ExportError::Cancelled { written }) => {
            println!("\nExport cancelled by user after {} file(s).", written);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
