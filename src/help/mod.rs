//! Help requests and everything hanging off them.
//!
//! Entities reference their parent by id only. A [`Help`] owns the ordered list
//! of its [`HelpResource`]s when loaded as an aggregate, but a resource never
//! points back at the Help value itself.

pub mod db;
pub mod memory;
pub mod repository;
pub mod service;

pub use repository::HelpRepository;
pub use service::HelpService;

use crate::storage::StorageError;
use chrono::{NaiveDateTime, Utc};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};

/// A member-authored request for assistance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Help {
    /// `None` until persisted.
    pub id: Option<i32>,
    pub member_id: i32,
    pub help_type_id: Option<i32>,
    pub title: String,
    pub description: String,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub resources: Vec<HelpResource>,
}

/// Fields a client may set on a Help.
#[derive(Clone, Debug, PartialEq)]
pub struct HelpDraft {
    pub title: String,
    pub description: String,
    pub help_type_id: Option<i32>,
}

impl Help {
    pub fn new(member_id: i32, draft: HelpDraft) -> Self {
        Self {
            id: None,
            member_id,
            help_type_id: draft.help_type_id,
            title: draft.title,
            description: draft.description,
            created_at: Utc::now().naive_utc(),
            resources: Vec::new(),
        }
    }

    /// Copies client-editable fields, leaving owner and resources alone.
    pub fn apply(&mut self, draft: HelpDraft) {
        self.title = draft.title;
        self.description = draft.description;
        self.help_type_id = draft.help_type_id;
    }
}

/// A comment on, or a file attached to, a Help.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HelpResource {
    pub id: Option<i32>,
    pub help_id: i32,
    pub created_at: NaiveDateTime,
    #[serde(flatten)]
    pub kind: HelpResourceKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HelpResourceKind {
    Comment { comment: String },
    Attachment { resource: Resource },
}

impl HelpResource {
    pub fn comment(help_id: i32, comment: String) -> Self {
        Self {
            id: None,
            help_id,
            created_at: Utc::now().naive_utc(),
            kind: HelpResourceKind::Comment { comment },
        }
    }

    /// Attachments are timestamped with their resource's creation time.
    pub fn attachment(help_id: i32, resource: Resource) -> Self {
        Self {
            id: None,
            help_id,
            created_at: resource.created_at,
            kind: HelpResourceKind::Attachment { resource },
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, HelpResourceKind::Comment { .. })
    }
}

/// Metadata and public URL of an uploaded file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Option<i32>,
    pub url: String,
    pub name: String,
    pub extension: Option<String>,
    pub content_type: Option<String>,
    pub size: i64,
    pub created_at: NaiveDateTime,
}

/// Administrator-curated classification of a Help.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HelpType {
    pub id: Option<i32>,
    pub name: String,
}

/// An offer of assistance submitted against a Help.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: Option<i32>,
    pub help_id: i32,
    pub member_id: i32,
    pub help_type_id: i32,
    pub message: String,
    pub created_at: NaiveDateTime,
}

/// Which file failed during a multi-file upload and which were already stored.
#[derive(Debug)]
pub struct UploadFailure {
    /// Storage keys uploaded before the failure. They are not removed.
    pub uploaded: Vec<String>,
    /// Original name of the file that could not be stored.
    pub failed: String,
    pub source: StorageError,
}

/// Help service errors.
#[derive(Debug)]
pub enum HelpError {
    /// Database error
    Db(DbErr),
    /// A resource upload failed; nothing was persisted
    Upload(UploadFailure),
    /// Referenced entity does not exist
    NotFound(&'static str),
    /// Referenced value is unusable
    Invalid(&'static str),
    /// Caller may not modify the entity
    Forbidden,
}

impl std::fmt::Display for HelpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HelpError::Db(e) => write!(f, "Database error: {}", e),
            HelpError::Upload(failure) => write!(
                f,
                "Upload of '{}' failed after {} file(s): {}",
                failure.failed,
                failure.uploaded.len(),
                failure.source
            ),
            HelpError::NotFound(msg) => write!(f, "Not found: {}", msg),
            HelpError::Invalid(msg) => write!(f, "Invalid: {}", msg),
            HelpError::Forbidden => write!(f, "Forbidden"),
        }
    }
}

impl std::error::Error for HelpError {}

impl From<DbErr> for HelpError {
    fn from(e: DbErr) -> Self {
        HelpError::Db(e)
    }
}
