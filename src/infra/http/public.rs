use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    application::{
        authors::AuthorService,
        error::{HttpError, repo_error_to_http},
        feed::FeedService,
        follows::FollowService,
        pagination::PageNumber,
        posts::{DeleteOutcome, EditOutcome, PostError, PostService},
    },
    cache::{PageCacheState, page_cache_layer},
    domain::entities::{AuthorRecord, PostId},
    presentation::views::{post_path, profile_path, render_view_response},
};

use super::{
    auth::{CurrentAuthor, resolve_author},
    forms::{CommentForm, FormErrors, PostForm},
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub follows: Arc<FollowService>,
    pub authors: Arc<AuthorService>,
    pub cache: PageCacheState,
}

pub fn build_router(state: HttpState) -> Router {
    // only the index sits behind the page cache
    let cached_routes = Router::new()
        .route("/", get(index))
        .layer(middleware::from_fn_with_state(
            state.cache.clone(),
            page_cache_layer,
        ));

    let routes = Router::new()
        .route("/group/{slug}", get(group_feed))
        .route("/profile/{username}", get(profile))
        .route("/profile/{username}/follow", post(follow_author))
        .route("/profile/{username}/unfollow", post(unfollow_author))
        .route("/follow", get(follow_feed))
        .route("/create", post(create_post))
        .route("/posts/{post_id}", get(post_detail))
        .route("/posts/{post_id}/edit", post(edit_post))
        .route("/posts/{post_id}/delete", post(delete_post))
        .route("/posts/{post_id}/comment", post(add_comment));

    cached_routes
        .merge(routes)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), resolve_author))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn number(&self) -> PageNumber {
        PageNumber::parse(self.page.as_deref())
    }
}

async fn index(State(state): State<HttpState>, Query(query): Query<PageQuery>) -> Response {
    match state.feed.global_page(query.number()).await {
        Ok(view) => render_view_response(&view),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn group_feed(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.group_page(&slug, query.number()).await {
        Ok(view) => render_view_response(&view),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn profile(
    State(state): State<HttpState>,
    viewer: Option<CurrentAuthor>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let viewer = viewer.map(|CurrentAuthor(author)| author);
    match state
        .feed
        .author_page(&username, query.number(), viewer.as_ref())
        .await
    {
        Ok(view) => render_view_response(&view),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn follow_feed(
    State(state): State<HttpState>,
    CurrentAuthor(me): CurrentAuthor,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.follow_page(&me, query.number()).await {
        Ok(view) => render_view_response(&view),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn post_detail(State(state): State<HttpState>, Path(post_id): Path<PostId>) -> Response {
    match state.feed.post_detail(post_id).await {
        Ok(view) => render_view_response(&view),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn create_post(
    State(state): State<HttpState>,
    CurrentAuthor(me): CurrentAuthor,
    Json(form): Json<PostForm>,
) -> Response {
    let payload = match form.validate() {
        Ok(payload) => payload,
        Err(errors) => return errors.into_response(),
    };

    match state.posts.create(&me, payload).await {
        Ok(_) => Redirect::to(&profile_path(&me.username)).into_response(),
        Err(err) => post_error_response(err),
    }
}

async fn edit_post(
    State(state): State<HttpState>,
    CurrentAuthor(me): CurrentAuthor,
    Path(post_id): Path<PostId>,
    Json(form): Json<PostForm>,
) -> Response {
    match state.posts.may_edit(&me, post_id).await {
        Ok(true) => {}
        Ok(false) => return Redirect::to(&post_path(post_id)).into_response(),
        Err(err) => return post_error_response(err),
    }

    let payload = match form.validate() {
        Ok(payload) => payload,
        Err(errors) => return errors.into_response(),
    };

    match state.posts.edit(&me, post_id, payload).await {
        Ok(EditOutcome::Updated(_) | EditOutcome::Forbidden) => {
            Redirect::to(&post_path(post_id)).into_response()
        }
        Err(err) => post_error_response(err),
    }
}

async fn delete_post(
    State(state): State<HttpState>,
    CurrentAuthor(me): CurrentAuthor,
    Path(post_id): Path<PostId>,
) -> Response {
    match state.posts.delete(&me, post_id).await {
        Ok(DeleteOutcome::Deleted) => Redirect::to(&profile_path(&me.username)).into_response(),
        Ok(DeleteOutcome::Forbidden) => Redirect::to(&post_path(post_id)).into_response(),
        Err(err) => post_error_response(err),
    }
}

async fn add_comment(
    State(state): State<HttpState>,
    CurrentAuthor(me): CurrentAuthor,
    Path(post_id): Path<PostId>,
    Json(form): Json<CommentForm>,
) -> Response {
    if let Err(err) = state.posts.ensure_exists(post_id).await {
        return post_error_response(err);
    }

    let payload = match form.validate() {
        Ok(payload) => payload,
        Err(errors) => return errors.into_response(),
    };

    match state.posts.comment(&me, post_id, payload).await {
        Ok(_) => Redirect::to(&post_path(post_id)).into_response(),
        Err(err) => post_error_response(err),
    }
}

async fn follow_author(
    State(state): State<HttpState>,
    CurrentAuthor(me): CurrentAuthor,
    Path(username): Path<String>,
) -> Response {
    const SOURCE: &str = "infra::http::public::follow_author";
    let target = match load_author(&state, SOURCE, &username).await {
        Ok(target) => target,
        Err(err) => return err.into_response(),
    };

    match state.follows.follow(me.id, target.id).await {
        Ok(_) => Redirect::to(&profile_path(&target.username)).into_response(),
        Err(err) => repo_error_to_http(SOURCE, err).into_response(),
    }
}

async fn unfollow_author(
    State(state): State<HttpState>,
    CurrentAuthor(me): CurrentAuthor,
    Path(username): Path<String>,
) -> Response {
    const SOURCE: &str = "infra::http::public::unfollow_author";
    let target = match load_author(&state, SOURCE, &username).await {
        Ok(target) => target,
        Err(err) => return err.into_response(),
    };

    match state.follows.unfollow(me.id, target.id).await {
        Ok(_) => Redirect::to(&profile_path(&target.username)).into_response(),
        Err(err) => repo_error_to_http(SOURCE, err).into_response(),
    }
}

async fn load_author(
    state: &HttpState,
    source: &'static str,
    username: &str,
) -> Result<AuthorRecord, HttpError> {
    state
        .authors
        .find_by_username(username)
        .await
        .map_err(|err| repo_error_to_http(source, err))?
        .ok_or_else(|| {
            HttpError::new(
                source,
                StatusCode::NOT_FOUND,
                "Unknown author",
                format!("No author named `{username}`"),
            )
        })
}

/// An unknown group is a form problem, not a missing page.
fn post_error_response(err: PostError) -> Response {
    match err {
        PostError::UnknownGroup(_) => {
            FormErrors::field("group", "Select an existing group.").into_response()
        }
        other => HttpError::from(other).into_response(),
    }
}

async fn not_found() -> Response {
    HttpError::new(
        "infra::http::public::not_found",
        StatusCode::NOT_FOUND,
        "Not found",
        "no route matched",
    )
    .into_response()
}
