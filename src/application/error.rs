use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{
        authors::{AuthError, AuthorError},
        feed::FeedError,
        groups::GroupError,
        posts::PostError,
        repos::RepoError,
    },
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Diagnostic detail carried in response extensions for the response logger.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

/// Map a repository failure onto the status a client should see.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::Duplicate { constraint } => {
            HttpError::new(source, StatusCode::CONFLICT, "Duplicate record", constraint)
        }
        RepoError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "Resource not found",
            "resource not found",
        ),
        RepoError::InvalidInput { message } => {
            HttpError::new(source, StatusCode::BAD_REQUEST, "Invalid input", message)
        }
        RepoError::Integrity { message } => HttpError::new(
            source,
            StatusCode::CONFLICT,
            "Integrity constraint violated",
            message,
        ),
        RepoError::Timeout => HttpError::new(
            source,
            StatusCode::SERVICE_UNAVAILABLE,
            "Database timeout",
            "database timeout",
        ),
        RepoError::Persistence(message) => HttpError::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            message,
        ),
    }
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        const SOURCE: &str = "application::error::feed_error_to_http_error";
        match error {
            FeedError::UnknownGroup(slug) => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Unknown group",
                format!("No group with slug `{slug}`"),
            ),
            FeedError::UnknownAuthor(username) => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Unknown author",
                format!("No author named `{username}`"),
            ),
            FeedError::UnknownPost(id) => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Unknown post",
                format!("No post with id {id}"),
            ),
            FeedError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

impl From<PostError> for HttpError {
    fn from(error: PostError) -> Self {
        const SOURCE: &str = "application::error::post_error_to_http_error";
        match error {
            PostError::NotFound(id) => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Unknown post",
                format!("No post with id {id}"),
            ),
            PostError::UnknownGroup(id) => HttpError::new(
                SOURCE,
                StatusCode::UNPROCESSABLE_ENTITY,
                "Unknown group",
                format!("Group {id} does not exist"),
            ),
            PostError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

impl From<AuthError> for HttpError {
    fn from(error: AuthError) -> Self {
        HttpError::from_error(
            "application::error::auth_error_to_http_error",
            StatusCode::UNAUTHORIZED,
            "Authentication required",
            &error,
        )
    }
}

/// Errors surfaced by the binary outside the request path.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

impl From<AuthorError> for AppError {
    fn from(error: AuthorError) -> Self {
        match error {
            AuthorError::Repo(err) => AppError::Repo(err),
            other => AppError::validation(other.to_string()),
        }
    }
}

impl From<GroupError> for AppError {
    fn from(error: GroupError) -> Self {
        match error {
            GroupError::Repo(err) => AppError::Repo(err),
            other => AppError::validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_collects_source_chain() {
        let inner = std::io::Error::other("disk gone");
        let outer = InfraError::Io(inner);
        let report = ErrorReport::from_error("test", StatusCode::INTERNAL_SERVER_ERROR, &outer);
        assert_eq!(report.messages.len(), 2);
        assert!(report.messages[1].contains("disk gone"));
    }

    #[test]
    fn feed_misses_map_to_not_found() {
        let error = HttpError::from(FeedError::UnknownGroup("cats".into()));
        assert_eq!(error.status(), StatusCode::NOT_FOUND);

        let response = HttpError::from(FeedError::UnknownPost(9)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let report = response.extensions().get::<ErrorReport>().expect("report");
        assert_eq!(report.messages, vec!["No post with id 9".to_string()]);
    }

    #[test]
    fn author_errors_split_into_validation_and_repo() {
        let err = AppError::from(AuthorError::UsernameTaken("leo".into()));
        assert!(matches!(err, AppError::Validation(_)));

        let err = AppError::from(AuthorError::Repo(RepoError::Timeout));
        assert!(matches!(err, AppError::Repo(RepoError::Timeout)));
    }

    #[test]
    fn repo_failures_keep_their_status_class() {
        let conflict = repo_error_to_http(
            "test",
            RepoError::Duplicate {
                constraint: "follows_unique_pair".into(),
            },
        );
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let timeout = HttpError::from(FeedError::Repo(RepoError::Timeout));
        assert_eq!(timeout.status(), StatusCode::SERVICE_UNAVAILABLE);

        let broken = HttpError::from(PostError::Repo(RepoError::from_persistence("boom")));
        assert_eq!(broken.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
