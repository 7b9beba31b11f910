// Chat domain: per-session channel, message history, wire protocol

pub mod channel;
pub mod models;
pub mod protocol;
pub mod service;
pub mod store;

pub use channel::ChatHub;
pub use models::*;
pub use protocol::*;
pub use service::ChatService;
pub use store::{InMemoryMessageStore, MessageStore};
