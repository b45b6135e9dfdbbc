//! In-memory repositories and router wiring shared by the HTTP tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use time::{Duration, OffsetDateTime, macros::datetime};
use tower::ServiceExt;
use yatube::{
    application::{
        authors::AuthorService,
        feed::FeedService,
        follows::FollowService,
        pagination::{PageWindow, paginate},
        posts::PostService,
        repos::{
            AuthorsRepo, CommentsRepo, CreateAuthorParams, CreateCommentParams,
            CreateGroupParams, CreatePostParams, FeedScope, FollowsRepo, GroupsRepo, PostsRepo,
            PostsWriteRepo, RepoError, UpdatePostParams,
        },
    },
    cache::{CacheConfig, PageCacheState},
    domain::entities::{
        AuthorCredentialRecord, AuthorId, AuthorRecord, CommentRecord, GroupId, GroupRecord,
        PostId, PostRecord,
    },
    infra::http::{AdminState, DatabaseHealth, HttpState, build_admin_router, build_router},
};

struct StoredAuthor {
    record: AuthorRecord,
    prefix: String,
    hash: Vec<u8>,
}

#[derive(Default)]
struct State {
    next_id: i64,
    ticks: i64,
    authors: Vec<StoredAuthor>,
    groups: Vec<GroupRecord>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
    follows: BTreeSet<(AuthorId, AuthorId)>,
}

impl State {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Every write lands one second after the previous one.
    fn now(&mut self) -> OffsetDateTime {
        self.ticks += 1;
        datetime!(2024-01-01 00:00 UTC) + Duration::seconds(self.ticks)
    }

    fn group(&self, id: GroupId) -> Option<GroupRecord> {
        self.groups.iter().find(|g| g.id == id).cloned()
    }

    fn author(&self, id: AuthorId) -> Option<AuthorRecord> {
        self.authors
            .iter()
            .find(|a| a.record.id == id)
            .map(|a| a.record.clone())
    }

    fn in_scope(&self, post: &PostRecord, scope: FeedScope) -> bool {
        match scope {
            FeedScope::Global => true,
            FeedScope::Group(id) => post.group.as_ref().is_some_and(|g| g.id == id),
            FeedScope::Author(id) => post.author.id == id,
            FeedScope::FollowedBy(reader) => self.follows.contains(&(reader, post.author.id)),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn post_count(&self) -> usize {
        self.state.lock().unwrap().posts.len()
    }

    pub fn comment_count(&self, post_id: PostId) -> usize {
        let state = self.state.lock().unwrap();
        state.comments.iter().filter(|c| c.post_id == post_id).count()
    }

    pub fn edge_count(&self) -> usize {
        self.state.lock().unwrap().follows.len()
    }

    /// Insert a post stamped with an explicit time, bypassing the clock.
    pub fn insert_post_at(
        &self,
        author_id: AuthorId,
        text: &str,
        created_at: OffsetDateTime,
    ) -> PostId {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        let author = state.author(author_id).expect("author exists");
        state.posts.push(PostRecord {
            id,
            text: text.to_string(),
            image: None,
            created_at,
            author,
            group: None,
        });
        id
    }
}

#[async_trait]
impl AuthorsRepo for MemoryStore {
    async fn find_by_id(&self, id: AuthorId) -> Result<Option<AuthorRecord>, RepoError> {
        Ok(self.state.lock().unwrap().author(id))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<AuthorRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .authors
            .iter()
            .find(|a| a.record.username == username)
            .map(|a| a.record.clone()))
    }

    async fn find_credentials_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<AuthorCredentialRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .authors
            .iter()
            .find(|a| a.prefix == prefix)
            .map(|a| AuthorCredentialRecord {
                author: a.record.clone(),
                token_prefix: a.prefix.clone(),
                token_hash: a.hash.clone(),
            }))
    }

    async fn create_author(&self, params: CreateAuthorParams) -> Result<AuthorRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        if state
            .authors
            .iter()
            .any(|a| a.record.username == params.username)
        {
            return Err(RepoError::Duplicate {
                constraint: "authors_username_key".into(),
            });
        }
        let record = AuthorRecord {
            id: state.id(),
            username: params.username,
            created_at: state.now(),
        };
        state.authors.push(StoredAuthor {
            record: record.clone(),
            prefix: params.token_prefix,
            hash: params.token_hash,
        });
        Ok(record)
    }
}

#[async_trait]
impl GroupsRepo for MemoryStore {
    async fn find_by_id(&self, id: GroupId) -> Result<Option<GroupRecord>, RepoError> {
        Ok(self.state.lock().unwrap().group(id))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        if state.groups.iter().any(|g| g.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "post_groups_slug_key".into(),
            });
        }
        let group = GroupRecord {
            id: state.id(),
            title: params.title,
            slug: params.slug,
            description: params.description,
            created_at: state.now(),
        };
        state.groups.push(group.clone());
        Ok(group)
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_posts(
        &self,
        scope: FeedScope,
        window: PageWindow,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut posts: Vec<PostRecord> = state
            .posts
            .iter()
            .filter(|post| state.in_scope(post, scope))
            .cloned()
            .collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(paginate(&posts, window.page(), window.limit).to_vec())
    }

    async fn count_posts(&self, scope: FeedScope) -> Result<u64, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .iter()
            .filter(|post| state.in_scope(post, scope))
            .count() as u64)
    }

    async fn find_post(&self, id: PostId) -> Result<Option<PostRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.posts.iter().find(|p| p.id == id).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        let author = state.author(params.author_id).ok_or(RepoError::InvalidInput {
            message: "unknown author".into(),
        })?;
        let group = match params.group_id {
            Some(id) => Some(state.group(id).ok_or(RepoError::InvalidInput {
                message: "unknown group".into(),
            })?),
            None => None,
        };
        let post = PostRecord {
            id: state.id(),
            text: params.text,
            image: params.image,
            created_at: state.now(),
            author,
            group,
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        let group = match params.group_id {
            Some(id) => Some(state.group(id).ok_or(RepoError::InvalidInput {
                message: "unknown group".into(),
            })?),
            None => None,
        };
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.text = params.text;
        post.image = params.image;
        post.group = group;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: PostId) -> Result<bool, RepoError> {
        let mut state = self.state.lock().unwrap();
        let before = state.posts.len();
        state.posts.retain(|p| p.id != id);
        let removed = state.posts.len() < before;
        if removed {
            state.comments.retain(|c| c.post_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl CommentsRepo for MemoryStore {
    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<CommentRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut comments: Vec<CommentRecord> = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(comments)
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        let author = state.author(params.author_id).ok_or(RepoError::InvalidInput {
            message: "unknown author".into(),
        })?;
        let comment = CommentRecord {
            id: state.id(),
            post_id: params.post_id,
            text: params.text,
            created_at: state.now(),
            author,
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }
}

#[async_trait]
impl FollowsRepo for MemoryStore {
    async fn insert_follow(&self, follower: AuthorId, followed: AuthorId) -> Result<bool, RepoError> {
        if follower == followed {
            return Err(RepoError::Integrity {
                message: "follows_no_self_follow".into(),
            });
        }
        Ok(self.state.lock().unwrap().follows.insert((follower, followed)))
    }

    async fn delete_follow(&self, follower: AuthorId, followed: AuthorId) -> Result<bool, RepoError> {
        Ok(self.state.lock().unwrap().follows.remove(&(follower, followed)))
    }

    async fn follow_exists(&self, follower: AuthorId, followed: AuthorId) -> Result<bool, RepoError> {
        Ok(self.state.lock().unwrap().follows.contains(&(follower, followed)))
    }

    async fn count_following(&self, follower: AuthorId) -> Result<u64, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.follows.iter().filter(|(f, _)| *f == follower).count() as u64)
    }
}

#[async_trait]
impl DatabaseHealth for MemoryStore {
    async fn check(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub authors: Arc<AuthorService>,
    pub cache: PageCacheState,
    pub public: Router,
    pub admin: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_cache(CacheConfig::default())
    }

    pub fn with_cache(cache_config: CacheConfig) -> Self {
        let store = Arc::new(MemoryStore::default());

        let follows = FollowService::new(store.clone());
        let feed = FeedService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            follows.clone(),
            10,
        );
        let posts = PostService::new(store.clone(), store.clone(), store.clone(), store.clone());
        let authors = Arc::new(AuthorService::new(store.clone()));
        let cache = PageCacheState::new(cache_config);

        let public = build_router(HttpState {
            feed: Arc::new(feed),
            posts: Arc::new(posts),
            follows: Arc::new(follows),
            authors: authors.clone(),
            cache: cache.clone(),
        });
        let admin = build_admin_router(AdminState {
            db: store.clone(),
            cache: cache.clone(),
        });

        Self {
            store,
            authors,
            cache,
            public,
            admin,
        }
    }

    /// Register an author and return `(record, bearer token)`.
    pub async fn author(&self, username: &str) -> (AuthorRecord, String) {
        let issued = self.authors.register(username).await.expect("register");
        (issued.record, issued.token)
    }

    pub async fn group(&self, title: &str, slug: &str) -> GroupRecord {
        GroupsRepo::create_group(
            self.store.as_ref(),
            CreateGroupParams {
                title: title.into(),
                slug: slug.into(),
                description: String::new(),
            },
        )
        .await
        .expect("group")
    }

    pub async fn post(&self, author: &AuthorRecord, text: &str, group: Option<GroupId>) -> PostId {
        self.store
            .create_post(CreatePostParams {
                author_id: author.id,
                text: text.into(),
                group_id: group,
                image: None,
            })
            .await
            .expect("post")
            .id
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.public.clone().oneshot(request).await.unwrap()
    }

    pub async fn admin_post(&self, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.admin.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn json(response: Response<Body>) -> Value {
    assert_eq!(response.status(), StatusCode::OK, "expected a 200 page");
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// Post texts of a feed page, in the order served.
pub fn texts(page: &Value) -> Vec<String> {
    page["posts"]
        .as_array()
        .map(|posts| {
            posts
                .iter()
                .filter_map(|post| post["text"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
