//! Bearer-token principal resolution.
//!
//! `resolve_author` runs on every public route. A request without an
//! `Authorization` header continues anonymously; a header that does not
//! name a known author is rejected with 401 before any handler runs.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{FromRequestParts, OptionalFromRequestParts, State},
    http::{HeaderValue, Request, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::application::{authors::AuthError, error::HttpError};
use crate::domain::entities::AuthorRecord;

use super::public::HttpState;

/// The signed-in author. Extracting it on an anonymous request yields 401.
#[derive(Debug, Clone)]
pub struct CurrentAuthor(pub AuthorRecord);

impl<S> FromRequestParts<S> for CurrentAuthor
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAuthor>()
            .cloned()
            .ok_or_else(|| HttpError::from(AuthError::Missing))
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentAuthor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentAuthor>().cloned())
    }
}

pub async fn resolve_author(
    State(state): State<HttpState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return next.run(request).await;
    };

    let Some(token) = bearer_token(header) else {
        return HttpError::from(AuthError::Invalid).into_response();
    };

    let author = match state.authors.authenticate(&token).await {
        Ok(author) => CurrentAuthor(author),
        Err(err) => return HttpError::from(err).into_response(),
    };

    request.extensions_mut().insert(author.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(author);
    response
}

fn bearer_token(header: &HeaderValue) -> Option<String> {
    let raw = header.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_bearer_scheme_is_accepted() {
        let header = HeaderValue::from_static("Bearer yt_abc_def");
        assert_eq!(bearer_token(&header).as_deref(), Some("yt_abc_def"));

        assert!(bearer_token(&HeaderValue::from_static("Basic dXNlcg==")).is_none());
        assert!(bearer_token(&HeaderValue::from_static("Bearer   ")).is_none());
    }
}
