use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CommentsRepo, CreateCommentParams, RepoError};
use crate::domain::entities::{AuthorRecord, CommentRecord, PostId};

use super::{PostgresRepositories, map_sqlx_error};

const COMMENT_COLUMNS: &str = "c.id, c.post_id, c.text, c.created_at, \
     a.id AS author_id, a.username AS author_username, a.created_at AS author_created_at";

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    text: String,
    created_at: OffsetDateTime,
    author_id: i64,
    author_username: String,
    author_created_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            text: row.text,
            created_at: row.created_at,
            author: AuthorRecord {
                id: row.author_id,
                username: row.author_username,
                created_at: row.author_created_at,
            },
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<CommentRecord>, RepoError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c JOIN authors a ON a.id = c.author_id \
             WHERE c.post_id = $1 ORDER BY c.created_at DESC, c.id DESC"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(post_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let sql = format!(
            "WITH c AS ( \
                 INSERT INTO comments (post_id, author_id, text) VALUES ($1, $2, $3) \
                 RETURNING * \
             ) \
             SELECT {COMMENT_COLUMNS} FROM c JOIN authors a ON a.id = c.author_id"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(params.post_id)
            .bind(params.author_id)
            .bind(params.text)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(CommentRecord::from(row))
    }
}
