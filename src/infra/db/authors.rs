use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{AuthorsRepo, CreateAuthorParams, RepoError};
use crate::domain::entities::{AuthorCredentialRecord, AuthorId, AuthorRecord};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct AuthorRow {
    id: i64,
    username: String,
    created_at: OffsetDateTime,
}

impl From<AuthorRow> for AuthorRecord {
    fn from(row: AuthorRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: i64,
    username: String,
    created_at: OffsetDateTime,
    token_prefix: String,
    token_hash: Vec<u8>,
}

impl From<CredentialRow> for AuthorCredentialRecord {
    fn from(row: CredentialRow) -> Self {
        Self {
            author: AuthorRecord {
                id: row.id,
                username: row.username,
                created_at: row.created_at,
            },
            token_prefix: row.token_prefix,
            token_hash: row.token_hash,
        }
    }
}

#[async_trait]
impl AuthorsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: AuthorId) -> Result<Option<AuthorRecord>, RepoError> {
        let row = sqlx::query_as::<_, AuthorRow>(
            "SELECT id, username, created_at FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AuthorRecord::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<AuthorRecord>, RepoError> {
        let row = sqlx::query_as::<_, AuthorRow>(
            "SELECT id, username, created_at FROM authors WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AuthorRecord::from))
    }

    async fn find_credentials_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<AuthorCredentialRecord>, RepoError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, username, created_at, token_prefix, token_hash \
             FROM authors WHERE token_prefix = $1",
        )
        .bind(prefix)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AuthorCredentialRecord::from))
    }

    async fn create_author(&self, params: CreateAuthorParams) -> Result<AuthorRecord, RepoError> {
        let CreateAuthorParams {
            username,
            token_prefix,
            token_hash,
        } = params;

        let row = sqlx::query_as::<_, AuthorRow>(
            "INSERT INTO authors (username, token_prefix, token_hash) \
             VALUES ($1, $2, $3) \
             RETURNING id, username, created_at",
        )
        .bind(username)
        .bind(token_prefix)
        .bind(token_hash)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(AuthorRecord::from(row))
    }
}
