//! Message transcoding
//!
//! Turns the raw message rows of one session into a [`Document`]: an ordered
//! list of renderable entries with resolved authors and display timestamps.
//! The renderers in [`text`] and [`html`] only format what is decided here.

pub mod html;
pub mod text;

use chrono::{Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::store::{MediaItem, Message};

/// Seconds between 1970-01-01T00:00:00Z and 2001-01-01T00:00:00Z
pub const APPLE_EPOCH_OFFSET: i64 = 978_307_200;

/// Message type code for group events and other non-renderable entries
pub const SYSTEM_EVENT_TYPE: i64 = 6;

pub const TIMESTAMP_FORMAT: &str = "%d %B %Y - %H:%M";

/// Label used for messages sent by the local user
pub const SELF_AUTHOR: &str = "Me";

/// Zone used when rendering timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayZone {
    #[default]
    Local,
    Utc,
}

/// Render a stored message date as `DD Month YYYY - HH:MM`
pub fn format_timestamp(date: f64, zone: DisplayZone) -> String {
    let whole = date.floor();
    let nanos = ((date - whole) * 1e9) as u32;
    let utc = Utc
        .timestamp_opt(whole as i64 + APPLE_EPOCH_OFFSET, nanos)
        .single()
        .unwrap_or_default();

    match zone {
        DisplayZone::Utc => utc.format(TIMESTAMP_FORMAT).to_string(),
        DisplayZone::Local => utc
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT)
            .to_string(),
    }
}

// ============================================
// MEDIA
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
    Video,
    /// Referenced media with no row or no local path
    Unresolved,
    /// Resolved path with an extension we have no rendering for
    Unknown,
}

impl MediaKind {
    pub fn from_path(path: Option<&str>) -> Self {
        let Some(path) = path else {
            return MediaKind::Unresolved;
        };

        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("opus") => MediaKind::Audio,
            Some("jpg" | "jpeg" | "png" | "gif" | "webp") => MediaKind::Image,
            Some("mp4" | "mov" | "3gp") => MediaKind::Video,
            _ => MediaKind::Unknown,
        }
    }
}

/// Lowercased local path with leading slashes removed, usable as a relative src
pub fn media_source(path: &str) -> String {
    path.trim_start_matches('/').to_lowercase()
}

/// Media id -> local path, for items that have a path
#[derive(Debug, Default)]
pub struct MediaIndex {
    paths: HashMap<i64, String>,
}

impl MediaIndex {
    pub fn from_items(items: &[MediaItem]) -> Self {
        let paths = items
            .iter()
            .filter_map(|item| {
                item.local_path
                    .as_ref()
                    .filter(|p| !p.is_empty())
                    .map(|p| (item.id, p.clone()))
            })
            .collect();
        Self { paths }
    }

    pub fn resolve(&self, id: i64) -> Option<&str> {
        self.paths.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

// ============================================
// DOCUMENT
// ============================================

/// Styling role of an entry; serializes to the CSS class name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[serde(rename = "self")]
    Own,
    Partner,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntryBody {
    Text {
        text: String,
    },
    Voice,
    Image {
        src: String,
        caption: Option<String>,
    },
    Video {
        src: String,
        caption: Option<String>,
    },
    Attachment {
        path: String,
        caption: Option<String>,
    },
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub timestamp: String,
    pub author: String,
    pub origin: Origin,
    pub body: EntryBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub title: String,
    pub entries: Vec<Entry>,
}

/// What the transcoder needs to know about the session being rendered
#[derive(Debug, Clone)]
pub struct SessionContext<'a> {
    pub session_id: i64,
    pub partner_name: &'a str,
    pub is_group: bool,
    pub zone: DisplayZone,
}

/// Build the document for one session out of the full message table
pub fn render_session(ctx: &SessionContext, messages: &[Message], media: &MediaIndex) -> Document {
    let entries = messages
        .iter()
        .filter(|m| m.session_id == Some(ctx.session_id))
        .filter_map(|m| transcode_message(ctx, m, media))
        .collect();

    Document {
        title: ctx.partner_name.to_string(),
        entries,
    }
}

fn has_text(msg: &Message) -> bool {
    msg.text.as_deref().is_some_and(|t| !t.is_empty())
}

/// Messages that never produce output
pub fn should_skip(msg: &Message) -> bool {
    let empty = !has_text(msg) && msg.media_item.is_none() && !msg.is_from_me;
    empty || msg.message_type == SYSTEM_EVENT_TYPE
}

/// A message with no sender name was written by the local user
pub fn is_self_authored(msg: &Message) -> bool {
    msg.push_name.is_none()
}

pub fn resolve_author(ctx: &SessionContext, msg: &Message) -> String {
    match &msg.push_name {
        None => SELF_AUTHOR.to_string(),
        Some(sender) if ctx.is_group => sender.clone(),
        Some(_) => ctx.partner_name.to_string(),
    }
}

/// Classify one message. `None` means it renders nothing.
pub fn transcode_message(ctx: &SessionContext, msg: &Message, media: &MediaIndex) -> Option<Entry> {
    if should_skip(msg) {
        return None;
    }

    let own = is_self_authored(msg);
    let mut origin = if own { Origin::Own } else { Origin::Partner };
    let caption = msg.text.clone().filter(|t| !t.is_empty());

    let body = match msg.media_item {
        Some(id) => {
            let path = media.resolve(id);
            match (MediaKind::from_path(path), path) {
                (MediaKind::Unresolved, _) | (_, None) => {
                    origin = Origin::System;
                    EntryBody::Deleted
                }
                (MediaKind::Audio, Some(_)) => {
                    if !own {
                        return None;
                    }
                    EntryBody::Voice
                }
                (MediaKind::Image, Some(p)) => EntryBody::Image {
                    src: media_source(p),
                    caption,
                },
                (MediaKind::Video, Some(p)) => EntryBody::Video {
                    src: media_source(p),
                    caption,
                },
                (MediaKind::Unknown, Some(p)) => EntryBody::Attachment {
                    path: media_source(p),
                    caption,
                },
            }
        }
        None => EntryBody::Text {
            text: msg.text.clone().unwrap_or_default(),
        },
    };

    Some(Entry {
        timestamp: format_timestamp(msg.date, ctx.zone),
        author: resolve_author(ctx, msg),
        origin,
        body,
    })
}
