use sqlx::FromRow;

/// Database model for collection aliases
#[derive(Debug, Clone, FromRow)]
pub struct AliasRow {
    pub identifier: String,
    pub label: String,
}
