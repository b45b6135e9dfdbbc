use async_trait::async_trait;

use crate::application::repos::{CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams};
use crate::domain::entities::{PostId, PostRecord};
use crate::infra::db::map_sqlx_error;

use super::super::PostgresRepositories;
use super::types::{POST_COLUMNS, POST_JOINS, PostRow};

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            author_id,
            text,
            group_id,
            image,
        } = params;

        let sql = format!(
            "WITH p AS ( \
                 INSERT INTO posts (author_id, text, group_id, image) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING * \
             ) \
             SELECT {POST_COLUMNS} FROM p{POST_JOINS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(author_id)
            .bind(text)
            .bind(group_id)
            .bind(image)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            text,
            group_id,
            image,
        } = params;

        let sql = format!(
            "WITH p AS ( \
                 UPDATE posts SET text = $2, group_id = $3, image = $4 \
                 WHERE id = $1 \
                 RETURNING * \
             ) \
             SELECT {POST_COLUMNS} FROM p{POST_JOINS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(text)
            .bind(group_id)
            .bind(image)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Ok(PostRecord::from(row))
    }

    async fn delete_post(&self, id: PostId) -> Result<bool, RepoError> {
        // comments go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
