// Shared infrastructure

pub mod events;

pub use events::*;
