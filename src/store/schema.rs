//! ChatStorage.sqlite schema - the subset this tool reads
//!
//! The backup is a Core Data store: every entity lives in a `Z`-prefixed
//! table with an integer `Z_PK` primary key. Only the columns listed here
//! are queried; anything else in the file is ignored.

/// Chat sessions (direct, group, status broadcast)
pub const SESSION_TABLE: &str = "ZWACHATSESSION";
pub const SESSION_COLUMNS: &[&str] = &[
    "Z_PK",
    "ZPARTNERNAME",
    "ZCONTACTJID",
    "ZSESSIONTYPE",
    "ZFLAGS",
    "ZMESSAGECOUNTER",
];

/// Messages, keyed to a session by ZCHATSESSION
pub const MESSAGE_TABLE: &str = "ZWAMESSAGE";
pub const MESSAGE_COLUMNS: &[&str] = &[
    "Z_PK",
    "ZCHATSESSION",
    "ZISFROMME",
    "ZMESSAGEDATE",
    "ZPUSHNAME",
    "ZTEXT",
    "ZMEDIAITEM",
    "ZMESSAGETYPE",
];

/// Attachment metadata (optional)
pub const MEDIA_TABLE: &str = "ZWAMEDIAITEM";
pub const MEDIA_COLUMNS: &[&str] = &["Z_PK", "ZMEDIALOCALPATH"];

/// Group membership (optional, listing only)
pub const GROUP_MEMBER_TABLE: &str = "ZWAGROUPMEMBER";
pub const GROUP_MEMBER_COLUMNS: &[&str] = &["ZCHATSESSION", "ZMEMBERJID"];

/// JID -> push name lookup (optional, listing only)
pub const PUSH_NAME_TABLE: &str = "ZWAPROFILEPUSHNAME";
pub const PUSH_NAME_COLUMNS: &[&str] = &["ZJID", "ZPUSHNAME"];

/// Minimal DDL matching the columns above. Used to build fixture databases.
#[cfg(test)]
pub const FIXTURE_SCHEMA: &str = r#"
CREATE TABLE ZWACHATSESSION (
    Z_PK INTEGER PRIMARY KEY,
    ZPARTNERNAME VARCHAR,
    ZCONTACTJID VARCHAR,
    ZSESSIONTYPE INTEGER,
    ZFLAGS INTEGER,
    ZMESSAGECOUNTER INTEGER
);

CREATE TABLE ZWAMESSAGE (
    Z_PK INTEGER PRIMARY KEY,
    ZCHATSESSION INTEGER,
    ZISFROMME INTEGER,
    ZMESSAGEDATE TIMESTAMP,
    ZPUSHNAME VARCHAR,
    ZTEXT VARCHAR,
    ZMEDIAITEM INTEGER,
    ZMESSAGETYPE INTEGER
);

CREATE TABLE ZWAMEDIAITEM (
    Z_PK INTEGER PRIMARY KEY,
    ZMEDIALOCALPATH VARCHAR
);

CREATE TABLE ZWAGROUPMEMBER (
    Z_PK INTEGER PRIMARY KEY,
    ZCHATSESSION INTEGER,
    ZMEMBERJID VARCHAR
);

CREATE TABLE ZWAPROFILEPUSHNAME (
    Z_PK INTEGER PRIMARY KEY,
    ZJID VARCHAR,
    ZPUSHNAME VARCHAR
);
"#;
