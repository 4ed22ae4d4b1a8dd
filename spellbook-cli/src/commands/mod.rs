//! Command implementations for the spellbook CLI

pub mod ping;
pub mod serve;

pub use ping::run_ping;
pub use serve::run_serve;
