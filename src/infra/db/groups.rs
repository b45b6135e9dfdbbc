use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CreateGroupParams, GroupsRepo, RepoError};
use crate::domain::entities::{GroupId, GroupRecord};

use super::{PostgresRepositories, map_sqlx_error};

const GROUP_COLUMNS: &str = "id, title, slug, description, created_at";

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: i64,
    title: String,
    slug: String,
    description: String,
    created_at: OffsetDateTime,
}

impl From<GroupRow> for GroupRecord {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl GroupsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: GroupId) -> Result<Option<GroupRecord>, RepoError> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM post_groups WHERE id = $1");
        let row = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(GroupRecord::from))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM post_groups WHERE slug = $1");
        let row = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(GroupRecord::from))
    }

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let sql = format!(
            "INSERT INTO post_groups (title, slug, description) VALUES ($1, $2, $3) \
             RETURNING {GROUP_COLUMNS}"
        );
        let row = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(params.title)
            .bind(params.slug)
            .bind(params.description)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(GroupRecord::from(row))
    }
}
