use crate::application::error::HttpError;
use crate::application::pagination::PageInfo;
use crate::domain::entities::{AuthorRecord, CommentRecord, GroupRecord, PostRecord};
use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct ViewRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: serde_json::Error,
}

impl ViewRenderError {
    pub fn new(
        source: &'static str,
        public_message: &'static str,
        error: serde_json::Error,
    ) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<ViewRenderError> for HttpError {
    fn from(err: ViewRenderError) -> Self {
        let ViewRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_view<T: Serialize>(view: &T) -> Result<Response, HttpError> {
    let body = serde_json::to_vec(view).map_err(|err| {
        ViewRenderError::new(
            "presentation::views::render_view",
            "View rendering failed",
            err,
        )
    })?;

    let mut response = (StatusCode::OK, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Ok(response)
}

pub fn render_view_response<T: Serialize>(view: &T) -> Response {
    match render_view(view) {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Username characters that survive unescaped in a path segment.
const SEGMENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'@')
    .remove(b'+');

pub fn profile_path(username: &str) -> String {
    format!("/profile/{}", utf8_percent_encode(username, SEGMENT_SET))
}

pub fn post_path(id: i64) -> String {
    format!("/posts/{id}")
}

fn iso_date(at: OffsetDateTime) -> String {
    at.format(&Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorBadge {
    pub username: String,
    pub path: String,
}

impl From<&AuthorRecord> for AuthorBadge {
    fn from(author: &AuthorRecord) -> Self {
        Self {
            username: author.username.clone(),
            path: profile_path(&author.username),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupBadge {
    pub title: String,
    pub slug: String,
    pub path: String,
}

impl From<&GroupRecord> for GroupBadge {
    fn from(group: &GroupRecord) -> Self {
        Self {
            title: group.title.clone(),
            slug: group.slug.clone(),
            path: format!("/group/{}", group.slug),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub id: i64,
    pub path: String,
    pub text: String,
    pub image: Option<String>,
    pub iso_date: String,
    pub author: AuthorBadge,
    pub group: Option<GroupBadge>,
}

impl From<&PostRecord> for PostCard {
    fn from(post: &PostRecord) -> Self {
        Self {
            id: post.id,
            path: post_path(post.id),
            text: post.text.clone(),
            image: post.image.clone(),
            iso_date: iso_date(post.created_at),
            author: AuthorBadge::from(&post.author),
            group: post.group.as_ref().map(GroupBadge::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupHeader {
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<&GroupRecord> for GroupHeader {
    fn from(group: &GroupRecord) -> Self {
        Self {
            title: group.title.clone(),
            slug: group.slug.clone(),
            description: group.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorHeader {
    pub username: String,
    pub post_count: u64,
}

/// Body of every feed route: index, group, profile and follow.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPageView {
    pub posts: Vec<PostCard>,
    pub page_info: PageInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorHeader>,
    /// Present only on a profile viewed by a signed-in author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub following: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub iso_date: String,
    pub author: AuthorBadge,
}

impl From<&CommentRecord> for CommentView {
    fn from(comment: &CommentRecord) -> Self {
        Self {
            id: comment.id,
            text: comment.text.clone(),
            iso_date: iso_date(comment.created_at),
            author: AuthorBadge::from(&comment.author),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetailView {
    pub post: PostCard,
    pub author_post_count: u64,
    pub comments: Vec<CommentView>,
}
