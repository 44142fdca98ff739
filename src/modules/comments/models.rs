use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentStatus {
    Posted,
    Deleted,
}

/// A comment document in the `comments` collection. Recent comments are
/// also embedded in their post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub post_id: ObjectId,
    pub content: String,
    pub status: CommentStatus,
    pub creator: ObjectId,
    pub created_at_milli: i64,
}

impl Comment {
    pub fn new(
        post_id: ObjectId,
        creator: ObjectId,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ObjectId::new(),
            post_id,
            content: content.into(),
            status: CommentStatus::Posted,
            creator,
            created_at_milli: created_at.timestamp_millis(),
        }
    }
}
