//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::PageWindow;
use crate::domain::entities::{
    AuthorCredentialRecord, AuthorId, AuthorRecord, CommentRecord, GroupId, GroupRecord, PostId,
    PostRecord,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Which posts a listing covers. Every scope is ordered newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    Global,
    Group(GroupId),
    Author(AuthorId),
    /// Posts whose author is followed by the given reader.
    FollowedBy(AuthorId),
}

#[derive(Debug, Clone)]
pub struct CreateAuthorParams {
    pub username: String,
    pub token_prefix: String,
    pub token_hash: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct CreateGroupParams {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: AuthorId,
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: PostId,
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: PostId,
    pub author_id: AuthorId,
    pub text: String,
}

#[async_trait]
pub trait AuthorsRepo: Send + Sync {
    async fn find_by_id(&self, id: AuthorId) -> Result<Option<AuthorRecord>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<AuthorRecord>, RepoError>;

    async fn find_credentials_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<AuthorCredentialRecord>, RepoError>;

    async fn create_author(&self, params: CreateAuthorParams) -> Result<AuthorRecord, RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn find_by_id(&self, id: GroupId) -> Result<Option<GroupRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts in `scope` ordered by `created_at DESC, id DESC`, author and group joined.
    async fn list_posts(
        &self,
        scope: FeedScope,
        window: PageWindow,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_posts(&self, scope: FeedScope) -> Result<u64, RepoError>;

    async fn find_post(&self, id: PostId) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    /// Removes the post and its comments. Returns `false` when nothing was deleted.
    async fn delete_post(&self, id: PostId) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments on a post, newest first.
    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<CommentRecord>, RepoError>;

    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    /// Get-or-create. Returns `true` only when a new edge was written.
    async fn insert_follow(
        &self,
        follower: AuthorId,
        followed: AuthorId,
    ) -> Result<bool, RepoError>;

    /// Returns `true` only when an existing edge was removed.
    async fn delete_follow(
        &self,
        follower: AuthorId,
        followed: AuthorId,
    ) -> Result<bool, RepoError>;

    async fn follow_exists(
        &self,
        follower: AuthorId,
        followed: AuthorId,
    ) -> Result<bool, RepoError>;

    async fn count_following(&self, follower: AuthorId) -> Result<u64, RepoError>;
}
