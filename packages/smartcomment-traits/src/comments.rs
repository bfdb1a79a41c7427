//! Types exchanged with the external comment API and the provider trait that fetches them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Identifier of a comment. The API sends either a string or a number, both normalize to a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommentId(String);

impl CommentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CommentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for CommentId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for CommentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CommentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => CommentId(n.to_string()),
            RawId::Text(s) => CommentId(s),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    #[default]
    Open,
    Completed,
}

/// A comment as returned by the API.
///
/// `pos` holds the wire-format position string. Fields this crate does not model are kept in
/// `extra` and written back untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: CommentId,
    #[serde(default)]
    pub pos: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub status: CommentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CommentRecord {
    pub fn new(id: impl Into<CommentId>, pos: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pos: Some(pos.into()),
            author: None,
            text: String::new(),
            status: CommentStatus::Open,
            parent_id: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Payload for creating a comment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewComment {
    pub pos: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
    /// Screenshot of the commented region as a data URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CreatedComment {
    pub success: bool,
    #[serde(default)]
    pub id: Option<CommentId>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("comment API request failed: {0}")]
    Request(String),
    #[error("comment {0} not found")]
    NotFound(CommentId),
    #[error("comment API is not available")]
    Unavailable,
    #[error("malformed comment API response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The external comment API.
///
/// These are the only suspension points of the system. Implementations decide transport and
/// retry policy.
#[allow(async_fn_in_trait)]
pub trait CommentProvider {
    async fn list_open_comments(&self, page_id: &str) -> Result<Vec<CommentRecord>, ProviderError>;

    async fn get_comment(&self, id: &CommentId) -> Result<CommentRecord, ProviderError>;

    async fn create_comment(
        &self,
        page_id: &str,
        comment: NewComment,
    ) -> Result<CreatedComment, ProviderError>;

    async fn update_comment(
        &self,
        id: &CommentId,
        status: CommentStatus,
        text: Option<&str>,
    ) -> Result<(), ProviderError>;

    async fn delete_comment(&self, id: &CommentId) -> Result<(), ProviderError>;
}

/// A provider for hosts without a comment API: lists nothing, refuses writes.
pub struct DummyCommentProvider;

impl CommentProvider for DummyCommentProvider {
    async fn list_open_comments(&self, _page_id: &str) -> Result<Vec<CommentRecord>, ProviderError> {
        Ok(Vec::new())
    }

    async fn get_comment(&self, id: &CommentId) -> Result<CommentRecord, ProviderError> {
        Err(ProviderError::NotFound(id.clone()))
    }

    async fn create_comment(
        &self,
        _page_id: &str,
        _comment: NewComment,
    ) -> Result<CreatedComment, ProviderError> {
        Err(ProviderError::Unavailable)
    }

    async fn update_comment(
        &self,
        _id: &CommentId,
        _status: CommentStatus,
        _text: Option<&str>,
    ) -> Result<(), ProviderError> {
        Err(ProviderError::Unavailable)
    }

    async fn delete_comment(&self, _id: &CommentId) -> Result<(), ProviderError> {
        Err(ProviderError::Unavailable)
    }
}
