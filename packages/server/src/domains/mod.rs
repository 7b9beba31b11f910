// Domain modules

pub mod auth;
pub mod chat;
pub mod location;
pub mod sessions;
