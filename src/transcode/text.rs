//! Plain text rendering: `[DD Month YYYY - HH:MM] Author: Body`, one line per entry

use std::io::Write;

use super::{Document, Entry, EntryBody};

pub fn body_text(body: &EntryBody) -> String {
    let with_caption = |marker: String, caption: &Option<String>| match caption {
        Some(c) => format!("{} {}", marker, c),
        None => marker,
    };

    match body {
        EntryBody::Text { text } => text.clone(),
        EntryBody::Voice => "[Voice Message]".to_string(),
        EntryBody::Image { src, caption } => with_caption(format!("[Image: {}]", src), caption),
        EntryBody::Video { src, caption } => with_caption(format!("[Video: {}]", src), caption),
        EntryBody::Attachment { path, caption } => {
            with_caption(format!("[attachment] {}", path), caption)
        }
        EntryBody::Deleted => "[Message deleted]".to_string(),
    }
}

pub fn format_line(entry: &Entry) -> String {
    format!(
        "[{}] {}: {}",
        entry.timestamp,
        entry.author,
        body_text(&entry.body)
    )
}

pub fn write_text<W: Write>(writer: &mut W, doc: &Document) -> std::io::Result<()> {
    for entry in &doc.entries {
        writeln!(writer, "{}", format_line(entry))?;
    }
    Ok(())
}
