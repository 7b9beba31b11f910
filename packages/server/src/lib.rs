// Courtside - API Core
//
// Backend API for time-boxed, location-anchored group sport sessions:
// create a session, discover open sessions nearby, manage participation,
// and coordinate over a per-session real-time chat channel.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
