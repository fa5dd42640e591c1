pub mod auth;
pub mod comments;
pub mod defense;
pub mod field_pools;
pub mod health;
pub mod status;
