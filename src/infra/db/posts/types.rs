use time::OffsetDateTime;

use crate::domain::entities::{AuthorRecord, GroupRecord, PostRecord};

/// Every post query selects these columns so rows decode into [`PostRow`].
pub(super) const POST_COLUMNS: &str = "p.id, p.text, p.image, p.created_at, \
     a.id AS author_id, a.username AS author_username, a.created_at AS author_created_at, \
     g.id AS group_id, g.title AS group_title, g.slug AS group_slug, \
     g.description AS group_description, g.created_at AS group_created_at";

pub(super) const POST_JOINS: &str =
    " JOIN authors a ON a.id = p.author_id LEFT JOIN post_groups g ON g.id = p.group_id";

#[derive(sqlx::FromRow)]
pub(super) struct PostRow {
    id: i64,
    text: String,
    image: Option<String>,
    created_at: OffsetDateTime,
    author_id: i64,
    author_username: String,
    author_created_at: OffsetDateTime,
    group_id: Option<i64>,
    group_title: Option<String>,
    group_slug: Option<String>,
    group_description: Option<String>,
    group_created_at: Option<OffsetDateTime>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        let group = match (
            row.group_id,
            row.group_title,
            row.group_slug,
            row.group_created_at,
        ) {
            (Some(id), Some(title), Some(slug), Some(created_at)) => Some(GroupRecord {
                id,
                title,
                slug,
                description: row.group_description.unwrap_or_default(),
                created_at,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            text: row.text,
            image: row.image,
            created_at: row.created_at,
            author: AuthorRecord {
                id: row.author_id,
                username: row.author_username,
                created_at: row.author_created_at,
            },
            group,
        }
    }
}
