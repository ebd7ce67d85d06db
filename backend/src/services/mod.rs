pub mod aliases;
pub mod collections;
pub mod export;
pub mod storage_name;
pub mod validation;
