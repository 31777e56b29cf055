//! Store abstractions for the survey's document and blob collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod firebase;
pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

/// One participant as stored alongside every document. Name and email are
/// optional inputs in the survey form; demographics may be absent entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
}

/// Provenance of a stored image. Every field is optional: the history
/// collection holds documents written by several client revisions, and a
/// missing field must read as missing, not as an empty default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// One rating of one face image. Append-only; never mutated after write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_image: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One answer as embedded in a session summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDoc {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_image: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyMetadata {
    pub session_duration: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// One completed survey run: the full answer list plus timing metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<Participant>,
    #[serde(default)]
    pub answers: Vec<AnswerDoc>,
    #[serde(default)]
    pub total_evaluation_images: u32,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_metadata: Option<SurveyMetadata>,
}

/// Immediate children of a blob path: child folders and item filenames.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub prefixes: Vec<String>,
    pub items: Vec<String>,
}

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_evaluations(&self) -> Result<Vec<EvaluationDoc>, StoreError>;
    async fn list_sessions(&self) -> Result<Vec<SessionDoc>, StoreError>;
    async fn add_evaluation(&self, doc: &EvaluationDoc) -> Result<(), StoreError>;
    async fn add_session(&self, doc: &SessionDoc) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// List immediate children of `path` ("" for the bucket root).
    async fn list(&self, path: &str) -> Result<Listing, StoreError>;
    /// Resolve a retrievable URL for the item at `path`.
    async fn download_url(&self, path: &str) -> Result<String, StoreError>;
}
