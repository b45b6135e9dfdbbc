//! Post and comment mutations.
//!
//! None of these touch the page cache; a cached index page keeps serving
//! whatever it captured until its TTL runs out or the cache is cleared.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, GroupsRepo, PostsRepo, PostsWriteRepo,
    RepoError, UpdatePostParams,
};
use crate::domain::entities::{AuthorRecord, CommentRecord, GroupId, PostId, PostRecord};

/// Validated body of a create or edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePostPayload {
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<String>,
}

/// Editing accepts exactly the fields creation does.
pub type EditPostPayload = CreatePostPayload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPayload {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Updated(PostRecord),
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Forbidden,
}

#[derive(Debug, Error)]
pub enum PostError {
    #[error("post {0} not found")]
    NotFound(PostId),
    #[error("group {0} does not exist")]
    UnknownGroup(GroupId),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    groups: Arc<dyn GroupsRepo>,
    comments: Arc<dyn CommentsRepo>,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        groups: Arc<dyn GroupsRepo>,
        comments: Arc<dyn CommentsRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            groups,
            comments,
        }
    }

    pub async fn create(
        &self,
        author: &AuthorRecord,
        payload: CreatePostPayload,
    ) -> Result<PostRecord, PostError> {
        self.ensure_group(payload.group_id).await?;

        let post = self
            .writer
            .create_post(CreatePostParams {
                author_id: author.id,
                text: payload.text,
                group_id: payload.group_id,
                image: payload.image,
            })
            .await?;

        info!(
            target = "yatube::application::posts",
            post_id = post.id,
            author = %author.username,
            "post created"
        );
        Ok(post)
    }

    /// Rewrites text, group and image. The author never changes.
    pub async fn edit(
        &self,
        requester: &AuthorRecord,
        id: PostId,
        payload: EditPostPayload,
    ) -> Result<EditOutcome, PostError> {
        let post = self.load(id).await?;
        if !post.is_authored_by(requester.id) {
            return Ok(EditOutcome::Forbidden);
        }

        self.ensure_group(payload.group_id).await?;

        let updated = self
            .writer
            .update_post(UpdatePostParams {
                id,
                text: payload.text,
                group_id: payload.group_id,
                image: payload.image,
            })
            .await?;

        info!(
            target = "yatube::application::posts",
            post_id = id,
            "post updated"
        );
        Ok(EditOutcome::Updated(updated))
    }

    pub async fn delete(
        &self,
        requester: &AuthorRecord,
        id: PostId,
    ) -> Result<DeleteOutcome, PostError> {
        let post = self.load(id).await?;
        if !post.is_authored_by(requester.id) {
            return Ok(DeleteOutcome::Forbidden);
        }

        if !self.writer.delete_post(id).await? {
            return Err(PostError::NotFound(id));
        }

        info!(
            target = "yatube::application::posts",
            post_id = id,
            "post deleted with its comments"
        );
        Ok(DeleteOutcome::Deleted)
    }

    /// Existence first, then ownership. Callers check this before looking at
    /// the submitted form.
    pub async fn may_edit(
        &self,
        requester: &AuthorRecord,
        id: PostId,
    ) -> Result<bool, PostError> {
        Ok(self.load(id).await?.is_authored_by(requester.id))
    }

    pub async fn ensure_exists(&self, id: PostId) -> Result<(), PostError> {
        self.load(id).await.map(|_| ())
    }

    pub async fn comment(
        &self,
        author: &AuthorRecord,
        post_id: PostId,
        payload: CommentPayload,
    ) -> Result<CommentRecord, PostError> {
        self.load(post_id).await?;

        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                post_id,
                author_id: author.id,
                text: payload.text,
            })
            .await?;
        Ok(comment)
    }

    async fn load(&self, id: PostId) -> Result<PostRecord, PostError> {
        self.reader
            .find_post(id)
            .await?
            .ok_or(PostError::NotFound(id))
    }

    async fn ensure_group(&self, group_id: Option<GroupId>) -> Result<(), PostError> {
        if let Some(group_id) = group_id
            && self.groups.find_by_id(group_id).await?.is_none()
        {
            return Err(PostError::UnknownGroup(group_id));
        }
        Ok(())
    }
}
