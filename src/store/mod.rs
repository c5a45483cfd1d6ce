//! Read-only access to a ChatStorage.sqlite backup
//!
//! The store is opened once per run. Every table the tool touches is checked
//! against the expected column set when the store is opened, so a renamed or
//! missing column fails here instead of halfway through an export.

mod schema;

use rusqlite::{Connection, OpenFlags, Row};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub use schema::*;

/// Session type code for direct (one-to-one) chats
pub const SESSION_TYPE_DIRECT: i64 = 0;
/// Session type code for group chats
pub const SESSION_TYPE_GROUP: i64 = 1;
/// Session type code for status broadcasts
pub const SESSION_TYPE_STATUS: i64 = 3;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open chat database {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Table {0} not found in chat database")]
    MissingTable(&'static str),

    #[error("Table {table} is missing expected columns: {}", missing.join(", "))]
    SchemaMismatch {
        table: &'static str,
        missing: Vec<String>,
    },

    #[error("Query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

pub struct ChatStore {
    conn: Connection,
    has_media: bool,
    has_members: bool,
    has_push_names: bool,
}

impl ChatStore {
    /// Open the database read-only and validate its schema
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Opened chat database at {}", path.display());
        Self::from_connection(conn)
    }

    /// Wrap an already-open connection, validating its schema
    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        let mut store = Self {
            conn,
            has_media: false,
            has_members: false,
            has_push_names: false,
        };

        store.require_table(SESSION_TABLE, SESSION_COLUMNS)?;
        store.require_table(MESSAGE_TABLE, MESSAGE_COLUMNS)?;
        store.has_media = store.probe_table(MEDIA_TABLE, MEDIA_COLUMNS)?;
        store.has_members = store.probe_table(GROUP_MEMBER_TABLE, GROUP_MEMBER_COLUMNS)?;
        store.has_push_names = store.probe_table(PUSH_NAME_TABLE, PUSH_NAME_COLUMNS)?;

        debug!(
            media = store.has_media,
            members = store.has_members,
            push_names = store.has_push_names,
            "Schema validated"
        );

        Ok(store)
    }

    fn table_columns(&self, table: &str) -> Result<HashSet<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", table))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(columns)
    }

    fn check_columns(
        table: &'static str,
        present: &HashSet<String>,
        expected: &[&str],
    ) -> Result<(), StoreError> {
        let missing: Vec<String> = expected
            .iter()
            .filter(|c| !present.contains(**c))
            .map(|c| c.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::SchemaMismatch { table, missing })
        }
    }

    fn require_table(&self, table: &'static str, expected: &[&str]) -> Result<(), StoreError> {
        let present = self.table_columns(table)?;
        if present.is_empty() {
            return Err(StoreError::MissingTable(table));
        }
        Self::check_columns(table, &present, expected)
    }

    /// Optional tables may be absent, but if present they must be complete
    fn probe_table(&self, table: &'static str, expected: &[&str]) -> Result<bool, StoreError> {
        let present = self.table_columns(table)?;
        if present.is_empty() {
            debug!("Optional table {} not present", table);
            return Ok(false);
        }
        Self::check_columns(table, &present, expected)?;
        Ok(true)
    }

    pub fn has_media_table(&self) -> bool {
        self.has_media
    }

    // ============================================
    // LOADERS
    // ============================================

    pub fn load_sessions(&self) -> Result<Vec<ChatSession>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT Z_PK, ZPARTNERNAME, ZCONTACTJID, ZSESSIONTYPE, ZFLAGS, ZMESSAGECOUNTER
             FROM {}",
            SESSION_TABLE
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok(ChatSession {
                id: row.get(0)?,
                partner_name: row.get(1)?,
                contact_jid: row.get(2)?,
                session_type: row.get::<_, Option<i64>>(3)?.unwrap_or(SESSION_TYPE_DIRECT),
                flags: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                message_count: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
            })
        })?;

        let sessions = rows.collect::<Result<Vec<_>, _>>()?;
        debug!("Loaded {} sessions", sessions.len());
        Ok(sessions)
    }

    /// All messages, in the order the database returns them
    pub fn load_messages(&self) -> Result<Vec<Message>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT Z_PK, ZCHATSESSION, ZISFROMME, ZMESSAGEDATE, ZPUSHNAME, ZTEXT,
                    ZMEDIAITEM, ZMESSAGETYPE
             FROM {}",
            MESSAGE_TABLE
        ))?;

        let rows = stmt.query_map([], map_message)?;
        let messages = rows.collect::<Result<Vec<_>, _>>()?;
        debug!("Loaded {} messages", messages.len());
        Ok(messages)
    }

    /// Media items; empty when the backup has no media table
    pub fn load_media(&self) -> Result<Vec<MediaItem>, StoreError> {
        if !self.has_media {
            return Ok(vec![]);
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT Z_PK, ZMEDIALOCALPATH FROM {}",
            MEDIA_TABLE
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok(MediaItem {
                id: row.get(0)?,
                local_path: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn load_group_members(&self) -> Result<Vec<GroupMember>, StoreError> {
        if !self.has_members {
            return Ok(vec![]);
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT ZCHATSESSION, ZMEMBERJID FROM {}",
            GROUP_MEMBER_TABLE
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok(GroupMember {
                session_id: row.get(0)?,
                member_jid: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn load_push_names(&self) -> Result<Vec<PushName>, StoreError> {
        if !self.has_push_names {
            return Ok(vec![]);
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT ZJID, ZPUSHNAME FROM {}",
            PUSH_NAME_TABLE
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok(PushName {
                jid: row.get(0)?,
                push_name: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn map_message(row: &Row) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        session_id: row.get(1)?,
        is_from_me: row.get::<_, Option<i64>>(2)?.unwrap_or(0) != 0,
        date: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
        push_name: row.get(4)?,
        text: row.get(5)?,
        media_item: row.get(6)?,
        message_type: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
    })
}

// ============================================
// ROW TYPES
// ============================================

#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: i64,
    pub partner_name: Option<String>,
    pub contact_jid: Option<String>,
    pub session_type: i64,
    pub flags: i64,
    pub message_count: i64,
}

impl ChatSession {
    pub fn is_group(&self) -> bool {
        self.session_type == SESSION_TYPE_GROUP
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: i64,
    pub session_id: Option<i64>,
    pub is_from_me: bool,
    /// Seconds since 2001-01-01T00:00:00Z
    pub date: f64,
    /// Sender display name; NULL for messages sent by the local user
    pub push_name: Option<String>,
    pub text: Option<String>,
    pub media_item: Option<i64>,
    pub message_type: i64,
}

#[derive(Debug, Clone)]
pub struct MediaItem {
    pub id: i64,
    pub local_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GroupMember {
    pub session_id: Option<i64>,
    pub member_jid: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PushName {
    pub jid: Option<String>,
    pub push_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    fn fixture() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(FIXTURE_SCHEMA).unwrap();
        conn
    }

    #[test]
    fn test_loads_typed_rows() {
        let conn = fixture();
        conn.execute(
            "INSERT INTO ZWACHATSESSION VALUES (1, 'Ada Lovelace', '15551234567@s.whatsapp.net', 0, 0, 2)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO ZWAMESSAGE VALUES (1, 1, 1, 12.5, NULL, 'Hello', NULL, 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO ZWAMEDIAITEM VALUES (?, ?)",
            params![7, "/Media/IMG.JPG"],
        )
        .unwrap();

        let store = ChatStore::from_connection(conn).unwrap();
        assert!(store.has_media_table());

        let sessions = store.load_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].partner_name.as_deref(), Some("Ada Lovelace"));
        assert!(!sessions[0].is_group());

        let messages = store.load_messages().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_from_me);
        assert_eq!(messages[0].date, 12.5);
        assert!(messages[0].push_name.is_none());

        let media = store.load_media().unwrap();
        assert_eq!(media[0].local_path.as_deref(), Some("/Media/IMG.JPG"));
    }

    #[test]
    fn test_missing_required_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE ZWACHATSESSION (Z_PK INTEGER PRIMARY KEY);")
            .unwrap();

        let err = ChatStore::from_connection(conn).err().unwrap();
        assert!(matches!(err, StoreError::SchemaMismatch { table: "ZWACHATSESSION", .. }));
    }

    #[test]
    fn test_schema_mismatch_lists_missing_columns() {
        let conn = fixture();
        conn.execute_batch("DROP TABLE ZWAMESSAGE; CREATE TABLE ZWAMESSAGE (Z_PK INTEGER, ZTEXT VARCHAR);")
            .unwrap();

        match ChatStore::from_connection(conn) {
            Err(StoreError::SchemaMismatch { table, missing }) => {
                assert_eq!(table, "ZWAMESSAGE");
                assert!(missing.contains(&"ZCHATSESSION".to_string()));
                assert!(!missing.contains(&"ZTEXT".to_string()));
            }
            other => panic!("expected schema mismatch, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_optional_tables_may_be_absent() {
        let conn = fixture();
        conn.execute_batch(
            "DROP TABLE ZWAMEDIAITEM; DROP TABLE ZWAGROUPMEMBER; DROP TABLE ZWAPROFILEPUSHNAME;",
        )
        .unwrap();

        let store = ChatStore::from_connection(conn).unwrap();
        assert!(!store.has_media_table());
        assert!(store.load_media().unwrap().is_empty());
        assert!(store.load_group_members().unwrap().is_empty());
        assert!(store.load_push_names().unwrap().is_empty());
    }

    #[test]
    fn test_missing_session_table() {
        let conn = Connection::open_in_memory().unwrap();
        let err = ChatStore::from_connection(conn).err().unwrap();
        assert!(matches!(err, StoreError::MissingTable("ZWACHATSESSION")));
    }
}
