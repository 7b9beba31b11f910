// Session domain: aggregate, validation, participant state machine,
// proximity search

pub mod events;
pub mod models;
pub mod search;
pub mod service;
pub mod store;
pub mod validate;

pub use models::*;
pub use service::SessionService;
pub use store::{InMemorySessionStore, SessionStore};
