mod collection_id;
mod types;

pub use collection_id::*;
pub use types::*;
