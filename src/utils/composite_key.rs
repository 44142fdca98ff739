//! Pagination cursor stored in `posts.compositeKey`.
//!
//! Twelve bytes, base64 encoded with the standard padded alphabet:
//!
//! | bytes  | content                                   |
//! |--------|-------------------------------------------|
//! | 0..4   | comment count, `u32` big endian           |
//! | 4..8   | last comment time, unix seconds, `u32` BE |
//! | 8..12  | first 4 bytes of the post `ObjectId`      |
//!
//! The count and timestamp are truncated to 32 bits, so negative counts wrap
//! and timestamps roll over in 2106.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const KEY_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositeKeyError {
    #[error("composite key is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("composite key decodes to {0} bytes, expected 12")]
    Length(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey(String);

impl CompositeKey {
    pub fn generate(
        comment_count: i32,
        last_comment_at: DateTime<Utc>,
        post_id: &ObjectId,
    ) -> Self {
        let mut buf = [0u8; KEY_LEN];
        buf[0..4].copy_from_slice(&(comment_count as u32).to_be_bytes());
        buf[4..8].copy_from_slice(&(last_comment_at.timestamp() as u32).to_be_bytes());
        buf[8..12].copy_from_slice(&post_id.bytes()[..4]);
        Self(STANDARD.encode(buf))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn decode(key: &str) -> Result<CompositeKeyParts, CompositeKeyError> {
        let bytes = STANDARD.decode(key)?;
        let bytes: [u8; KEY_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CompositeKeyError::Length(bytes.len()))?;

        let word = |at: usize| {
            u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Ok(CompositeKeyParts {
            comment_count: word(0),
            last_comment_at: word(4),
            post_id_prefix: [bytes[8], bytes[9], bytes[10], bytes[11]],
        })
    }

    pub fn parts(&self) -> Result<CompositeKeyParts, CompositeKeyError> {
        Self::decode(&self.0)
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded fields of a [`CompositeKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeKeyParts {
    pub comment_count: u32,
    /// Unix seconds.
    pub last_comment_at: u32,
    /// Leading bytes of the post id, which are its creation timestamp.
    pub post_id_prefix: [u8; 4],
}

impl CompositeKeyParts {
    pub fn last_comment_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(i64::from(self.last_comment_at), 0).unwrap_or_default()
    }

    pub fn post_id_prefix_hex(&self) -> String {
        self.post_id_prefix
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }
}
