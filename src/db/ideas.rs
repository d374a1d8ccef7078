//! Idea storage.

use sqlx::sqlite::SqlitePool;
use tracing::error;

#[derive(Clone)]
pub struct IdeaStore {
    pool: SqlitePool,
}

/// A stored idea.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Idea {
    pub uuid: String,
    /// UUID of the owning user
    pub owner: String,
    pub title: String,
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
    pub created_at: String,
}

/// Caller-editable fields of an idea, already validated and normalized.
#[derive(Debug, Clone, Default)]
pub struct IdeaFields {
    pub title: String,
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(sqlx::FromRow)]
struct IdeaRow {
    uuid: String,
    owner: String,
    title: String,
    summary: String,
    description: String,
    tags: String,
    created_at: String,
}

impl TryFrom<IdeaRow> for Idea {
    type Error = sqlx::Error;

    /// Fails with `sqlx::Error::Decode` if the tags column is not a JSON string array.
    fn try_from(row: IdeaRow) -> Result<Self, Self::Error> {
        let tags = serde_json::from_str(&row.tags).map_err(|e| {
            error!(idea_id = %row.uuid, error = %e, "Corrupt tags column");
            sqlx::Error::Decode(Box::new(e))
        })?;

        Ok(Self {
            uuid: row.uuid,
            owner: row.owner,
            title: row.title,
            summary: row.summary,
            description: row.description,
            tags,
            created_at: row.created_at,
        })
    }
}

fn encode_tags(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

impl IdeaStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an idea owned by `owner`. Returns the stored idea.
    pub async fn create(&self, owner: &str, fields: &IdeaFields) -> Result<Idea, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO ideas (uuid, owner, title, summary, description, tags) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&uuid)
        .bind(owner)
        .bind(&fields.title)
        .bind(&fields.summary)
        .bind(&fields.description)
        .bind(encode_tags(&fields.tags))
        .execute(&self.pool)
        .await?;

        self.get_by_uuid(&uuid)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// List ideas, newest first, optionally capped at `limit`.
    pub async fn list(&self, limit: Option<u32>) -> Result<Vec<Idea>, sqlx::Error> {
        // LIMIT -1 means no limit in SQLite
        let limit = limit.map(i64::from).unwrap_or(-1);

        let rows: Vec<IdeaRow> = sqlx::query_as(
            "SELECT uuid, owner, title, summary, description, tags, created_at FROM ideas
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Idea::try_from).collect()
    }

    /// Get an idea by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Idea>, sqlx::Error> {
        let row: Option<IdeaRow> = sqlx::query_as(
            "SELECT uuid, owner, title, summary, description, tags, created_at FROM ideas WHERE uuid = ?",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Idea::try_from).transpose()
    }

    /// Replace the editable fields of an idea. Owner and creation time are kept.
    /// Returns the updated idea, or None if it no longer exists.
    pub async fn update(
        &self,
        uuid: &str,
        fields: &IdeaFields,
    ) -> Result<Option<Idea>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE ideas SET title = ?, summary = ?, description = ?, tags = ? WHERE uuid = ?",
        )
        .bind(&fields.title)
        .bind(&fields.summary)
        .bind(&fields.description)
        .bind(encode_tags(&fields.tags))
        .bind(uuid)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_uuid(uuid).await
    }

    /// Delete an idea by UUID.
    pub async fn delete(&self, uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ideas WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
