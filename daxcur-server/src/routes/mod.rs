pub mod backups;
pub mod chat;
pub mod examples;
pub mod health;
pub mod metrics;
