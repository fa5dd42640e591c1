pub mod comment;
pub mod defense;
pub mod field_pool;
pub mod pagination;
pub mod project;
pub mod status;
pub mod user;
