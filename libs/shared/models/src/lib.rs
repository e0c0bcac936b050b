pub mod auth;
pub mod chat;
pub mod error;
pub mod profile;
pub mod schedule;
pub mod user;
