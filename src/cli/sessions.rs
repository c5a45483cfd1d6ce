//! Sessions command implementation

use anyhow::Result;
use serde::Serialize;
use std::io::{self, Write};

use crate::catalog::{GroupSummary, SessionCatalog, SessionFilter, SessionKind, SessionSummary};
use crate::store::ChatStore;

#[derive(Serialize)]
struct Listing<'a> {
    dms: &'a [SessionSummary],
    groups: &'a [GroupSummary],
}

pub fn run(store: &ChatStore, filter: &SessionFilter, json: bool) -> Result<()> {
    let catalog = SessionCatalog::new(store.load_sessions()?);

    let dms: Vec<SessionSummary> = catalog
        .list(filter)
        .into_iter()
        .filter(|s| s.kind == SessionKind::Direct)
        .collect();
    let groups = catalog.groups(
        filter,
        &store.load_group_members()?,
        &store.load_push_names()?,
    );

    if json {
        let listing = Listing {
            dms: &dms,
            groups: &groups,
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    let stdout = io::stdout();
    write_listing(&mut stdout.lock(), filter, &dms, &groups)?;
    Ok(())
}

fn write_listing<W: Write>(
    out: &mut W,
    filter: &SessionFilter,
    dms: &[SessionSummary],
    groups: &[GroupSummary],
) -> io::Result<()> {
    if let Some(name) = &filter.name {
        writeln!(out, "\n[ {} session(s) match name '{}'. ]\n", dms.len() + groups.len(), name)?;
    } else if let Some(number) = &filter.number {
        writeln!(out, "\n[ {} session(s) match number '{}'. ]\n", dms.len() + groups.len(), number)?;
    } else {
        writeln!(
            out,
            "\n[ Found {} DMs and {} group chats. ]\n",
            dms.len(),
            groups.len()
        )?;
    }

    writeln!(out, "DMs:")?;
    if dms.is_empty() {
        writeln!(out, "  (none)")?;
    } else {
        writeln!(out, "{:<6} {:<30} {:<18} {}", "SID", "NAME", "NUMBER", "MESSAGES")?;
        writeln!(out, "{}", "-".repeat(66))?;
        for s in dms {
            writeln!(
                out,
                "{:<6} {:<30} {:<18} {}",
                s.id,
                truncate(&s.name, 30),
                s.display_number(),
                s.message_count
            )?;
        }
    }

    writeln!(out, "\nGroup Chats:")?;
    if groups.is_empty() {
        writeln!(out, "  (none)")?;
    } else {
        writeln!(out, "{:<6} {:<30} {:<9} {}", "SID", "NAME", "MESSAGES", "MEMBERS")?;
        writeln!(out, "{}", "-".repeat(80))?;
        for g in groups {
            writeln!(
                out,
                "{:<6} {:<30} {:<9} {}",
                g.session.id,
                truncate(&g.session.name, 30),
                g.session.message_count,
                g.members.join(", ")
            )?;
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max - 3).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}
