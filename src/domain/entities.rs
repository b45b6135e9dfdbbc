//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

pub type AuthorId = i64;
pub type GroupId = i64;
pub type PostId = i64;
pub type CommentId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRecord {
    pub id: AuthorId,
    pub username: String,
    pub created_at: OffsetDateTime,
}

/// Author row including the hashed bearer credential; never leaves the auth path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorCredentialRecord {
    pub author: AuthorRecord,
    pub token_prefix: String,
    pub token_hash: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    pub id: GroupId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub created_at: OffsetDateTime,
}

/// A post together with its pre-fetched author and group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub id: PostId,
    pub text: String,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
    pub author: AuthorRecord,
    pub group: Option<GroupRecord>,
}

impl PostRecord {
    pub fn is_authored_by(&self, author: AuthorId) -> bool {
        self.author.id == author
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub id: CommentId,
    pub post_id: PostId,
    pub text: String,
    pub created_at: OffsetDateTime,
    pub author: AuthorRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowEdgeRecord {
    pub follower_id: AuthorId,
    pub followed_id: AuthorId,
    pub created_at: OffsetDateTime,
}
