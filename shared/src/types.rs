use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CollectionId;

// ============================================================================
// Todo Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub content: String,
    pub completed: bool,
    pub order: i64,
    pub date: CollectionId,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    pub content: String,
    pub date: Option<String>,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    pub date: Option<String>,
    pub content: Option<String>,
    pub completed: Option<bool>,
    pub order: Option<i64>,
}

// ============================================================================
// Collection Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyCollectionRequest {
    pub source_date: String,
    /// Label to attach to the new copy
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyCollectionResponse {
    pub table_id: CollectionId,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCollectionResponse {
    pub count: u64,
}

// ============================================================================
// Alias Types
// ============================================================================

/// An alias as sent by clients and echoed back once stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateAlias {
    pub date: String,
    pub alias: String,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Tests
// ============================================================================
