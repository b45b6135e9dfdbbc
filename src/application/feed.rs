use std::sync::Arc;

use thiserror::Error;

use crate::application::follows::FollowService;
use crate::application::pagination::{Page, PageInfo, PageNumber, PageWindow};
use crate::application::repos::{
    AuthorsRepo, CommentsRepo, FeedScope, GroupsRepo, PostsRepo, RepoError,
};
use crate::domain::entities::{AuthorId, AuthorRecord, GroupId, PostId, PostRecord};
use crate::presentation::views::{
    AuthorHeader, CommentView, FeedPageView, GroupHeader, PostCard, PostDetailView,
};

/// The four feeds a reader can page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Global,
    Group(GroupId),
    Author(AuthorId),
    Follow { requester: AuthorId },
}

impl FeedKind {
    pub fn scope(self) -> FeedScope {
        match self {
            FeedKind::Global => FeedScope::Global,
            FeedKind::Group(id) => FeedScope::Group(id),
            FeedKind::Author(id) => FeedScope::Author(id),
            FeedKind::Follow { requester } => FeedScope::FollowedBy(requester),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group `{0}`")]
    UnknownGroup(String),
    #[error("unknown author `{0}`")]
    UnknownAuthor(String),
    #[error("unknown post {0}")]
    UnknownPost(PostId),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    authors: Arc<dyn AuthorsRepo>,
    comments: Arc<dyn CommentsRepo>,
    follows: FollowService,
    page_size: u32,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        authors: Arc<dyn AuthorsRepo>,
        comments: Arc<dyn CommentsRepo>,
        follows: FollowService,
        page_size: u32,
    ) -> Self {
        Self {
            posts,
            groups,
            authors,
            comments,
            follows,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// One page of `kind`, newest first. A page past the end is empty.
    pub async fn page(&self, kind: FeedKind, page: PageNumber) -> Result<Page<PostRecord>, FeedError> {
        let scope = kind.scope();
        let total = self.posts.count_posts(scope).await?;
        let info = PageInfo::new(page, self.page_size, total);

        let window = PageWindow::new(page, self.page_size);
        let items = if window.offset >= total {
            Vec::new()
        } else {
            self.posts.list_posts(scope, window).await?
        };

        Ok(Page { items, info })
    }

    pub async fn global_page(&self, page: PageNumber) -> Result<FeedPageView, FeedError> {
        let page = self.page(FeedKind::Global, page).await?;
        Ok(feed_view(page))
    }

    pub async fn group_page(
        &self,
        slug: &str,
        page: PageNumber,
    ) -> Result<FeedPageView, FeedError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| FeedError::UnknownGroup(slug.to_string()))?;

        let page = self.page(FeedKind::Group(group.id), page).await?;
        let mut view = feed_view(page);
        view.group = Some(GroupHeader::from(&group));
        Ok(view)
    }

    /// Profile feed. `following` is filled only for a signed-in viewer.
    pub async fn author_page(
        &self,
        username: &str,
        page: PageNumber,
        viewer: Option<&AuthorRecord>,
    ) -> Result<FeedPageView, FeedError> {
        let author = self
            .authors
            .find_by_username(username)
            .await?
            .ok_or_else(|| FeedError::UnknownAuthor(username.to_string()))?;

        let page = self.page(FeedKind::Author(author.id), page).await?;
        let following = match viewer {
            Some(viewer) => Some(self.follows.is_following(viewer.id, author.id).await?),
            None => None,
        };

        let post_count = page.info.total_items;
        let mut view = feed_view(page);
        view.author = Some(AuthorHeader {
            username: author.username,
            post_count,
        });
        view.following = following;
        Ok(view)
    }

    pub async fn follow_page(
        &self,
        requester: &AuthorRecord,
        page: PageNumber,
    ) -> Result<FeedPageView, FeedError> {
        let page = self
            .page(
                FeedKind::Follow {
                    requester: requester.id,
                },
                page,
            )
            .await?;
        Ok(feed_view(page))
    }

    pub async fn post_detail(&self, id: PostId) -> Result<PostDetailView, FeedError> {
        let post = self
            .posts
            .find_post(id)
            .await?
            .ok_or(FeedError::UnknownPost(id))?;

        let author_post_count = self
            .posts
            .count_posts(FeedScope::Author(post.author.id))
            .await?;
        let comments = self.comments.list_for_post(post.id).await?;

        Ok(PostDetailView {
            post: PostCard::from(&post),
            author_post_count,
            comments: comments.iter().map(CommentView::from).collect(),
        })
    }
}

fn feed_view(page: Page<PostRecord>) -> FeedPageView {
    FeedPageView {
        posts: page.items.iter().map(PostCard::from).collect(),
        page_info: page.info,
        group: None,
        author: None,
        following: None,
    }
}
