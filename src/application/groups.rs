use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{CreateGroupParams, GroupsRepo, RepoError};
use crate::domain::entities::GroupRecord;
use crate::domain::slug::{SlugAsyncError, SlugError, derive_slug, unique_slug};

const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("group title must be between 1 and {MAX_TITLE_LEN} characters")]
    InvalidTitle,
    #[error("slug `{0}` is already taken")]
    SlugTaken(String),
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<SlugAsyncError<RepoError>> for GroupError {
    fn from(err: SlugAsyncError<RepoError>) -> Self {
        match err {
            SlugAsyncError::Slug(err) => GroupError::Slug(err),
            SlugAsyncError::Predicate(err) => GroupError::Repo(err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateGroupCommand {
    pub title: String,
    pub description: String,
    /// Used verbatim (after normalisation) instead of deriving one from the title.
    pub slug: Option<String>,
}

#[derive(Clone)]
pub struct GroupService {
    repo: Arc<dyn GroupsRepo>,
}

impl GroupService {
    pub fn new(repo: Arc<dyn GroupsRepo>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, cmd: CreateGroupCommand) -> Result<GroupRecord, GroupError> {
        let title = cmd.title.trim().to_string();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(GroupError::InvalidTitle);
        }

        let slug = match cmd.slug {
            Some(requested) => {
                let slug = derive_slug(&requested)?;
                if self.repo.find_by_slug(&slug).await?.is_some() {
                    return Err(GroupError::SlugTaken(slug));
                }
                slug
            }
            None => {
                let repo = self.repo.clone();
                unique_slug(&title, move |candidate| {
                    let repo = repo.clone();
                    async move {
                        let existing = repo.find_by_slug(&candidate).await?;
                        Ok::<bool, RepoError>(existing.is_none())
                    }
                })
                .await?
            }
        };

        let group = self
            .repo
            .create_group(CreateGroupParams {
                title,
                slug: slug.clone(),
                description: cmd.description.trim().to_string(),
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => GroupError::SlugTaken(slug),
                other => GroupError::Repo(other),
            })?;

        info!(
            target = "yatube::application::groups",
            slug = %group.slug,
            "group created"
        );
        Ok(group)
    }
}
