//! CLI commands module.

pub mod analyze;
pub mod chat;
pub mod health;
pub mod history;
pub mod report;
pub mod serve;
pub mod validate;
