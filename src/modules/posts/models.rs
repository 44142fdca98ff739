use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::modules::comments::models::{Comment, CommentStatus};
use crate::utils::CompositeKey;

/// Stored name of the pagination key field.
pub const COMPOSITE_KEY_FIELD: &str = "compositeKey";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    /// Waiting for its image to be processed.
    Pending,
    Posted,
    Deleted,
}

/// A post document in the `posts` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    pub creator: ObjectId,
    pub created_at_milli: i64,
    pub status: PostStatus,
    pub comment_count: i32,
    pub last_comment_at_milli: i64,
    #[serde(default)]
    pub original_image_path: String,
    #[serde(default)]
    pub processed_image_path: String,
    pub composite_key: CompositeKey,
    #[serde(default)]
    pub recent_comments: Vec<Comment>,
    pub version: i64,
}

impl Post {
    /// A new post with no comments. Posts with an image start as pending.
    pub fn new(
        creator: ObjectId,
        content: impl Into<String>,
        image_path: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let id = ObjectId::new();
        let status = if image_path.is_some() {
            PostStatus::Pending
        } else {
            PostStatus::Posted
        };

        Self {
            id,
            content: content.into(),
            creator,
            created_at_milli: created_at.timestamp_millis(),
            status,
            comment_count: 0,
            last_comment_at_milli: 0,
            original_image_path: image_path.unwrap_or_default(),
            processed_image_path: String::new(),
            composite_key: CompositeKey::generate(0, created_at, &id),
            recent_comments: Vec::new(),
            version: 0,
        }
    }

    /// Fold a posted or deleted comment into the post's comment summary.
    ///
    /// Keeps at most `recent_limit` embedded comments, newest first, and
    /// regenerates the composite key from the new count and `now`. The
    /// count stays within `0..=i32::MAX`. Every call bumps `version`.
    pub fn apply_comment(&mut self, comment: Comment, recent_limit: usize, now: DateTime<Utc>) {
        self.recent_comments.retain(|existing| existing.id != comment.id);

        match comment.status {
            CommentStatus::Deleted => {
                if self.comment_count <= 0 {
                    tracing::warn!(
                        post_id = %self.id,
                        comment_id = %comment.id,
                        "comment count would go negative"
                    );
                }
                self.comment_count = self.comment_count.saturating_sub(1).max(0);
            }
            CommentStatus::Posted => {
                self.comment_count = self.comment_count.saturating_add(1);
                self.recent_comments.insert(0, comment);
                self.recent_comments.truncate(recent_limit);
                self.last_comment_at_milli = now.timestamp_millis();
            }
        }

        self.composite_key = CompositeKey::generate(self.comment_count, now, &self.id);
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn new_post_key_uses_creation_time() {
        let post = Post::new(ObjectId::new(), "first", None, at(1_700_000_000));
        let parts = post.composite_key.parts().unwrap();

        assert_eq!(post.status, PostStatus::Posted);
        assert_eq!(parts.comment_count, 0);
        assert_eq!(parts.last_comment_at, 1_700_000_000);
        assert_eq!(parts.post_id_prefix, post.id.bytes()[..4]);
    }

    #[test]
    fn image_posts_start_pending() {
        let post = Post::new(
            ObjectId::new(),
            "with image",
            Some("original/abc.png".to_string()),
            at(1_700_000_000),
        );
        assert_eq!(post.status, PostStatus::Pending);
        assert_eq!(post.original_image_path, "original/abc.png");
    }

    #[test]
    fn posted_comments_are_kept_newest_first() {
        let mut post = Post::new(ObjectId::new(), "feed", None, at(1_700_000_000));
        for i in 0..3 {
            let comment =
                Comment::new(post.id, ObjectId::new(), format!("c{i}"), at(1_700_000_100));
            post.apply_comment(comment, 2, at(1_700_000_100 + i));
        }

        let contents: Vec<_> = post
            .recent_comments
            .iter()
            .map(|c| c.content.as_str())
            .collect();
        assert_eq!(contents, ["c2", "c1"]);
        assert_eq!(post.comment_count, 3);
        assert_eq!(post.version, 3);
        assert_eq!(post.last_comment_at_milli, 1_700_000_102_000);

        let parts = post.composite_key.parts().unwrap();
        assert_eq!(parts.comment_count, 3);
        assert_eq!(parts.last_comment_at, 1_700_000_102);
    }

    #[test]
    fn deleted_comment_is_removed_and_count_never_negative() {
        let mut post = Post::new(ObjectId::new(), "feed", None, at(1_700_000_000));
        let mut comment = Comment::new(post.id, ObjectId::new(), "oops", at(1_700_000_010));
        post.apply_comment(comment.clone(), 5, at(1_700_000_010));

        comment.status = CommentStatus::Deleted;
        post.apply_comment(comment.clone(), 5, at(1_700_000_020));
        assert!(post.recent_comments.is_empty());
        assert_eq!(post.comment_count, 0);
        assert_eq!(post.last_comment_at_milli, 1_700_000_010_000);

        post.apply_comment(comment, 5, at(1_700_000_030));
        assert_eq!(post.comment_count, 0);
        assert_eq!(post.composite_key.parts().unwrap().comment_count, 0);
    }

    #[test]
    fn comment_count_saturates_at_max() {
        let mut post = Post::new(ObjectId::new(), "popular", None, at(1_700_000_000));
        post.comment_count = i32::MAX;

        let comment = Comment::new(post.id, ObjectId::new(), "one more", at(1_700_000_050));
        post.apply_comment(comment, 5, at(1_700_000_050));

        assert_eq!(post.comment_count, i32::MAX);
        assert_eq!(post.recent_comments.len(), 1);
        assert_eq!(post.composite_key.parts().unwrap().comment_count, i32::MAX as u32);
    }

    #[test]
    fn stored_field_names_match_collection_layout() {
        let post = Post::new(ObjectId::new(), "hello", None, at(1_700_000_000));
        let doc = bson::to_document(&post).unwrap();

        assert!(doc.get_object_id("_id").is_ok());
        assert_eq!(
            doc.get_str(COMPOSITE_KEY_FIELD).unwrap(),
            post.composite_key.as_str()
        );
        assert_eq!(doc.get_str("status").unwrap(), "POSTED");
        assert_eq!(doc.get_i32("commentCount").unwrap(), 0);
        assert!(doc.get_array("recentComments").unwrap().is_empty());

        let back: Post = bson::from_document(doc).unwrap();
        assert_eq!(back, post);
    }
}
