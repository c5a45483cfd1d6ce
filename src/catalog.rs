//! Session catalog
//!
//! Holds the eligible chat sessions for one run. Status broadcasts and
//! sessions carrying the removed flag are dropped on construction, so no
//! listing or export target list can ever contain them.

use serde::Serialize;
use std::collections::HashMap;

use crate::store::{
    ChatSession, GroupMember, PushName, SESSION_TYPE_DIRECT, SESSION_TYPE_STATUS,
};

/// ZFLAGS value of sessions removed from the chat list
pub const REMOVED_SESSION_FLAGS: i64 = 1304;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Direct,
    Group,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: i64,
    pub name: String,
    /// Contact JID with the domain stripped
    pub number: String,
    pub kind: SessionKind,
    pub message_count: i64,
}

impl SessionSummary {
    /// Number split as `+CC REST`; all digits are kept
    pub fn display_number(&self) -> String {
        format_number(&self.number)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    #[serde(flatten)]
    pub session: SessionSummary,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    /// Case-insensitive substring of the display name
    pub name: Option<String>,
    /// Substring of the raw contact JID
    pub number: Option<String>,
    pub sort: bool,
}

impl SessionFilter {
    fn matches(&self, session: &ChatSession) -> bool {
        let name_ok = self.name.as_ref().map_or(true, |needle| {
            session
                .partner_name
                .as_deref()
                .unwrap_or_default()
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });

        let number_ok = self.number.as_ref().map_or(true, |needle| {
            session
                .contact_jid
                .as_deref()
                .unwrap_or_default()
                .contains(needle.as_str())
        });

        name_ok && number_ok
    }
}

/// Substring of a JID before the first `@`
pub fn jid_number(jid: &str) -> &str {
    jid.split('@').next().unwrap_or(jid)
}

pub fn format_number(number: &str) -> String {
    if number.is_empty() {
        return String::new();
    }
    match number.char_indices().nth(2) {
        Some((split, _)) => format!("+{} {}", &number[..split], &number[split..]),
        None => format!("+{}", number),
    }
}

pub fn is_excluded(session: &ChatSession) -> bool {
    session.session_type == SESSION_TYPE_STATUS || session.flags == REMOVED_SESSION_FLAGS
}

pub struct SessionCatalog {
    sessions: Vec<ChatSession>,
}

impl SessionCatalog {
    pub fn new(sessions: Vec<ChatSession>) -> Self {
        let sessions = sessions.into_iter().filter(|s| !is_excluded(s)).collect();
        Self { sessions }
    }

    /// Only direct and group sessions have a kind; other types (broadcast lists) are never listed.
    fn summarize(session: &ChatSession) -> Option<SessionSummary> {
        let kind = if session.is_group() {
            SessionKind::Group
        } else if session.session_type == SESSION_TYPE_DIRECT {
            SessionKind::Direct
        } else {
            return None;
        };

        Some(SessionSummary {
            id: session.id,
            name: session.partner_name.clone().unwrap_or_default(),
            number: session
                .contact_jid
                .as_deref()
                .map(jid_number)
                .unwrap_or_default()
                .to_string(),
            kind,
            message_count: session.message_count,
        })
    }

    /// Eligible sessions matching `filter`, in catalog order unless sorting is requested
    pub fn list(&self, filter: &SessionFilter) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .iter()
            .filter(|s| filter.matches(s))
            .filter_map(Self::summarize)
            .collect();

        if filter.sort {
            summaries.sort_by(|a, b| a.name.cmp(&b.name));
        }

        summaries
    }

    /// Sessions that can be exported. Group chats are listed but never exported.
    pub fn export_targets(&self, filter: &SessionFilter) -> Vec<SessionSummary> {
        self.list(filter)
            .into_iter()
            .filter(|s| s.kind == SessionKind::Direct)
            .collect()
    }

    /// Group sessions with member names resolved through the push-name table
    pub fn groups(
        &self,
        filter: &SessionFilter,
        members: &[GroupMember],
        push_names: &[PushName],
    ) -> Vec<GroupSummary> {
        let names: HashMap<&str, &str> = push_names
            .iter()
            .filter_map(|p| Some((p.jid.as_deref()?, p.push_name.as_deref()?)))
            .collect();

        self.list(filter)
            .into_iter()
            .filter(|s| s.kind == SessionKind::Group)
            .map(|session| {
                let members = members
                    .iter()
                    .filter(|m| m.session_id == Some(session.id))
                    .filter_map(|m| m.member_jid.as_deref())
                    .map(|jid| names.get(jid).copied().unwrap_or(jid).to_string())
                    .collect();
                GroupSummary { session, members }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SESSION_TYPE_GROUP;

    fn session(id: i64, name: &str, jid: &str, session_type: i64, flags: i64) -> ChatSession {
        ChatSession {
            id,
            partner_name: Some(name.to_string()),
            contact_jid: Some(jid.to_string()),
            session_type,
            flags,
            message_count: 10,
        }
    }

    fn catalog() -> SessionCatalog {
        SessionCatalog::new(vec![
            session(1, "Charles Babbage", "447700900123@s.whatsapp.net", 0, 0),
            session(2, "Ada Lovelace", "15551234567@s.whatsapp.net", 0, 0),
            session(3, "Status", "status@broadcast", SESSION_TYPE_STATUS, 0),
            session(4, "Old Friend", "15550000000@s.whatsapp.net", 0, REMOVED_SESSION_FLAGS),
            session(5, "Engine Club", "120363000@g.us", SESSION_TYPE_GROUP, 0),
        ])
    }

    #[test]
    fn test_exclusion_is_total() {
        let catalog = catalog();

        let everything = SessionFilter::default();
        let ids: Vec<i64> = catalog.list(&everything).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 5]);

        let targets: Vec<i64> = catalog
            .export_targets(&everything)
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(targets, vec![1, 2]);

        let by_name = SessionFilter {
            name: Some("friend".to_string()),
            ..Default::default()
        };
        assert!(catalog.list(&by_name).is_empty());

        let status = SessionFilter {
            number: Some("broadcast".to_string()),
            ..Default::default()
        };
        assert!(catalog.list(&status).is_empty());
    }

    #[test]
    fn test_unknown_session_types_are_neither_direct_nor_group() {
        let catalog = SessionCatalog::new(vec![
            session(2, "Ada Lovelace", "15551234567@s.whatsapp.net", SESSION_TYPE_DIRECT, 0),
            session(7, "Broadcast list", "1234@broadcast", 2, 0),
            session(8, "Newer thing", "99@s.whatsapp.net", 42, 0),
        ]);
        let everything = SessionFilter::default();

        let ids: Vec<i64> = catalog.list(&everything).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2]);

        let broadcast = SessionFilter {
            name: Some("broadcast".to_string()),
            ..Default::default()
        };
        assert!(catalog.export_targets(&broadcast).is_empty());
        assert!(catalog.groups(&broadcast, &[], &[]).is_empty());
    }

    #[test]
    fn test_summary_fields() {
        let catalog = catalog();
        let summary = catalog
            .list(&SessionFilter::default())
            .into_iter()
            .find(|s| s.id == 2)
            .unwrap();

        assert_eq!(summary.name, "Ada Lovelace");
        assert_eq!(summary.number, "15551234567");
        assert_eq!(summary.display_number(), "+15 551234567");
        assert_eq!(summary.kind, SessionKind::Direct);
    }

    #[test]
    fn test_name_filter_is_case_insensitive() {
        let filter = SessionFilter {
            name: Some("LOVE".to_string()),
            ..Default::default()
        };
        let found = catalog().list(&filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
    }

    #[test]
    fn test_number_filter_matches_raw_jid() {
        let filter = SessionFilter {
            number: Some("4477".to_string()),
            ..Default::default()
        };
        let found = catalog().list(&filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Charles Babbage");

        let domain = SessionFilter {
            number: Some("g.us".to_string()),
            ..Default::default()
        };
        assert_eq!(catalog().list(&domain)[0].id, 5);
    }

    #[test]
    fn test_sort_by_name() {
        let filter = SessionFilter {
            sort: true,
            ..Default::default()
        };
        let names: Vec<String> = catalog().list(&filter).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Ada Lovelace", "Charles Babbage", "Engine Club"]);
    }

    #[test]
    fn test_groups_resolve_member_names() {
        let members = vec![
            GroupMember {
                session_id: Some(5),
                member_jid: Some("15551234567@s.whatsapp.net".to_string()),
            },
            GroupMember {
                session_id: Some(5),
                member_jid: Some("447700900999@s.whatsapp.net".to_string()),
            },
            GroupMember {
                session_id: Some(1),
                member_jid: Some("ignored@s.whatsapp.net".to_string()),
            },
        ];
        let push_names = vec![PushName {
            jid: Some("15551234567@s.whatsapp.net".to_string()),
            push_name: Some("Ada".to_string()),
        }];

        let groups = catalog().groups(&SessionFilter::default(), &members, &push_names);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].members,
            vec!["Ada", "447700900999@s.whatsapp.net"]
        );
    }

    #[test]
    fn test_format_number_keeps_digits() {
        assert_eq!(format_number("15551234567"), "+15 551234567");
        assert_eq!(format_number("4"), "+4");
        assert_eq!(format_number(""), "");
        assert_eq!(jid_number("15551234567@s.domain"), "15551234567");
        assert_eq!(jid_number("nodomain"), "nodomain");
    }

    #[test]
    fn test_missing_fields_do_not_panic() {
        let catalog = SessionCatalog::new(vec![ChatSession {
            id: 9,
            partner_name: None,
            contact_jid: None,
            session_type: SESSION_TYPE_DIRECT,
            flags: 0,
            message_count: 0,
        }]);
        let list = catalog.list(&SessionFilter {
            name: Some("x".to_string()),
            ..Default::default()
        });
        assert!(list.is_empty());

        let all = catalog.list(&SessionFilter::default());
        assert_eq!(all[0].number, "");
        assert_eq!(all[0].display_number(), "");
    }
}
