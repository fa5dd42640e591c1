pub mod strategy;

pub use strategy::{validate_access, validate_refresh, AccountRecord, AccountStatus};
