//! Page cache keys.

use std::collections::HashMap;

use axum::{extract::Query, http::Uri};
use serde::Deserialize;

use crate::application::pagination::PageNumber;

/// How finely cached pages are told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKeyPolicy {
    /// Route plus resolved page number: `/?page=2` and `/?page=3` are separate entries.
    #[default]
    PerPage,
    /// Route only: the first page requested within a TTL window is served for all pages.
    RouteOnly,
}

impl CacheKeyPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "per_page" | "per-page" => Some(Self::PerPage),
            "route_only" | "route-only" => Some(Self::RouteOnly),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PerPage => "per_page",
            Self::RouteOnly => "route_only",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageCacheKey {
    pub route: String,
    pub page: Option<u32>,
}

impl PageCacheKey {
    pub fn new(policy: CacheKeyPolicy, route: impl Into<String>, page: PageNumber) -> Self {
        let page = match policy {
            CacheKeyPolicy::PerPage => Some(page.get()),
            CacheKeyPolicy::RouteOnly => None,
        };
        Self {
            route: route.into(),
            page,
        }
    }

    /// Build the key from a request URI. Every spelling of the first page
    /// (`/`, `/?page=1`, `/?page=abc`) shares one entry.
    pub fn from_uri(policy: CacheKeyPolicy, uri: &Uri) -> Self {
        let params = Query::<HashMap<String, String>>::try_from_uri(uri)
            .map(|Query(params)| params)
            .unwrap_or_default();
        let page = PageNumber::parse(params.get("page").map(String::as_str));
        Self::new(policy, uri.path(), page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(policy: CacheKeyPolicy, uri: &str) -> PageCacheKey {
        PageCacheKey::from_uri(policy, &uri.parse::<Uri>().expect("uri"))
    }

    #[test]
    fn first_page_spellings_share_a_key() {
        let policy = CacheKeyPolicy::PerPage;
        assert_eq!(key(policy, "/"), key(policy, "/?page=1"));
        assert_eq!(key(policy, "/"), key(policy, "/?page=zero"));
        assert_ne!(key(policy, "/"), key(policy, "/?page=2"));
    }

    #[test]
    fn route_only_ignores_page() {
        let policy = CacheKeyPolicy::RouteOnly;
        assert_eq!(key(policy, "/?page=2"), key(policy, "/?page=5"));
        assert_eq!(key(policy, "/?page=2").page, None);
    }

    #[test]
    fn policy_names_parse_both_spellings() {
        assert_eq!(CacheKeyPolicy::parse("route-only"), Some(CacheKeyPolicy::RouteOnly));
        assert_eq!(CacheKeyPolicy::parse("PER_PAGE"), Some(CacheKeyPolicy::PerPage));
        assert_eq!(CacheKeyPolicy::parse("never"), None);
    }
}
