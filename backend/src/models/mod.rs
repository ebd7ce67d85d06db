use sqlx::SqlitePool;

use crate::config::Config;

pub mod alias;
pub mod todo;

pub use alias::*;
pub use todo::*;

/// Application state shared across all handlers
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}
