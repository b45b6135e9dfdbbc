//! Page cache middleware.
//!
//! Mounted only in front of the index route. Serves stored bodies while
//! they are fresh and stores successful GET responses on a miss. Bodies over
//! the configured limit, or of unknown length, go out uncached.

use std::sync::Arc;

use axum::{
    body::{Body, HttpBody},
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header::CONTENT_LENGTH},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument, warn};

use super::{
    CacheConfig,
    keys::PageCacheKey,
    store::{CachedPage, PageCache},
};

/// Shared cache state for the middleware and the admin clear endpoint.
#[derive(Clone)]
pub struct PageCacheState {
    pub config: CacheConfig,
    pub cache: Arc<PageCache>,
}

impl PageCacheState {
    pub fn new(config: CacheConfig) -> Self {
        let cache = Arc::new(PageCache::new(&config));
        Self { config, cache }
    }
}

#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn page_cache_layer(
    State(state): State<PageCacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = PageCacheKey::from_uri(state.config.key_policy, request.uri());

    if let Some(cached) = state.cache.get(&key) {
        debug!(cache = "page", outcome = "hit", page = ?key.page, "serving cached page");
        return build_response(cached);
    }

    debug!(cache = "page", outcome = "miss", page = ?key.page, "assembling page");
    let response = next.run(request).await;

    if response.status() != StatusCode::OK {
        return response;
    }

    if exceeds_limit(&response, state.config.body_limit_bytes) {
        debug!(cache = "page", outcome = "skip", page = ?key.page, "page body over cache limit");
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, state.config.body_limit_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "page body could not be buffered for caching");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let cached = CachedPage {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect(),
        body: bytes.clone(),
    };
    state.cache.put(key, cached, state.config.ttl);

    Response::from_parts(parts, Body::from(bytes))
}

fn exceeds_limit(response: &Response, limit: usize) -> bool {
    let limit = u64::try_from(limit).unwrap_or(u64::MAX);
    let declared = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    match declared.or_else(|| response.body().size_hint().upper()) {
        Some(len) => len > limit,
        None => true,
    }
}

fn build_response(cached: CachedPage) -> Response {
    let mut builder = Response::builder().status(cached.status);

    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
