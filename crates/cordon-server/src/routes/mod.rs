//! HTTP route handlers.

pub mod auth;
pub mod track;
pub mod users;
pub mod webhooks;
