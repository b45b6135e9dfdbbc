//! Author registration and bearer-token authentication.
//!
//! Tokens look like `yt_<prefix>_<secret>`. Only the prefix and a SHA-256 of
//! the secret are stored; the full token is shown once at registration.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{AuthorsRepo, CreateAuthorParams, RepoError};
use crate::domain::entities::AuthorRecord;

const TOKEN_TAG: &str = "yt";
const PREFIX_LEN: usize = 12;
const MIN_SECRET_LEN: usize = 32;
const MAX_USERNAME_LEN: usize = 150;

#[derive(Debug, Error)]
pub enum AuthorError {
    #[error("invalid username: {0}")]
    InvalidUsername(&'static str),
    #[error("username `{0}` is already taken")]
    UsernameTaken(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("invalid bearer token")]
    Invalid,
}

#[derive(Debug, Clone)]
pub struct AuthorIssued {
    pub record: AuthorRecord,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthorService {
    repo: Arc<dyn AuthorsRepo>,
}

impl AuthorService {
    pub fn new(repo: Arc<dyn AuthorsRepo>) -> Self {
        Self { repo }
    }

    pub async fn register(&self, username: &str) -> Result<AuthorIssued, AuthorError> {
        let username = validate_username(username)?;

        if self.repo.find_by_username(&username).await?.is_some() {
            return Err(AuthorError::UsernameTaken(username));
        }

        let prefix = generate_prefix();
        let secret = generate_secret();
        let token = format!("{TOKEN_TAG}_{prefix}_{secret}");

        let record = self
            .repo
            .create_author(CreateAuthorParams {
                username: username.clone(),
                token_prefix: prefix,
                token_hash: hash_secret(&secret),
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => AuthorError::UsernameTaken(username),
                other => AuthorError::Repo(other),
            })?;

        info!(
            target = "yatube::application::authors",
            author = %record.username,
            "author registered"
        );
        Ok(AuthorIssued { record, token })
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<AuthorRecord>, RepoError> {
        self.repo.find_by_username(username).await
    }

    pub async fn authenticate(&self, token: &str) -> Result<AuthorRecord, AuthError> {
        let parsed = parse_token(token).ok_or(AuthError::Invalid)?;
        let credentials = self
            .repo
            .find_credentials_by_prefix(parsed.prefix)
            .await
            .map_err(|_| AuthError::Invalid)?
            .ok_or(AuthError::Invalid)?;

        let hashed_input = hash_secret(parsed.secret);
        if credentials.token_hash.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(AuthError::Invalid);
        }

        Ok(credentials.author)
    }
}

pub fn hash_secret(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}

fn generate_prefix() -> String {
    Uuid::new_v4().simple().to_string()[..PREFIX_LEN].to_string()
}

fn generate_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

struct ParsedToken<'a> {
    prefix: &'a str,
    secret: &'a str,
}

fn parse_token(token: &str) -> Option<ParsedToken<'_>> {
    let mut parts = token.splitn(3, '_');
    if parts.next()? != TOKEN_TAG {
        return None;
    }
    let prefix = parts.next()?;
    let secret = parts.next()?;
    if prefix.is_empty() || secret.len() < MIN_SECRET_LEN {
        return None;
    }
    Some(ParsedToken { prefix, secret })
}

/// Letters, digits and `@.+-_`, like the usual web-framework username rule.
fn validate_username(raw: &str) -> Result<String, AuthorError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(AuthorError::InvalidUsername("username must not be empty"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AuthorError::InvalidUsername("username is too long"));
    }
    if !username
        .chars()
        .all(|ch| ch.is_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(AuthorError::InvalidUsername(
            "username may contain only letters, digits and @/./+/-/_",
        ));
    }
    Ok(username.to_string())
}
