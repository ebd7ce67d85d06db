use chrono::{DateTime, Utc};
use shared::{CollectionId, Todo};
use sqlx::FromRow;

/// Database model for a row of a per-collection task table
#[derive(Debug, Clone, FromRow)]
pub struct TodoRow {
    pub id: i64,
    pub content: String,
    pub completed: bool,
    pub order_num: i64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TodoRow {
    pub fn into_shared(self, collection: &CollectionId) -> Todo {
        Todo {
            id: self.id,
            content: self.content,
            completed: self.completed,
            order: self.order_num,
            date: collection.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}
