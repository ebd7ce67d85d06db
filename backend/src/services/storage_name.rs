//! Mapping between collection identifiers and their physical table names.
//!
//! `2025-07-29` lives in `todo_2025_07_29`, `copy-20250729-17` in
//! `todo_copy_20250729_17`. Identifiers never contain `_`, so the mapping is
//! injective and decoding gives back the exact identifier string.

use shared::CollectionId;

pub const TABLE_PREFIX: &str = "todo_";

/// `LIKE` pattern matching every collection table.
pub const TABLE_PATTERN: &str = r"todo\_%";

pub fn encode(id: &CollectionId) -> String {
    format!("{}{}", TABLE_PREFIX, id.as_str().replace('-', "_"))
}

/// Returns `None` for tables that are not collection tables.
pub fn decode(table_name: &str) -> Option<CollectionId> {
    table_name
        .strip_prefix(TABLE_PREFIX)?
        .replace('_', "-")
        .parse()
        .ok()
}
