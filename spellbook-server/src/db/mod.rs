//! Database layer - connection pool, store implementations and repositories
//!
//! # Design Principles
//!
//! - Every statement goes through one executor that owns connection release
//! - Failures are typed (`DbError`), never collapsed into empty results here
//! - Repositories talk to `dyn SpellStore`, so tests can swap in `MemoryStore`
//! - Spell list edits lock the user row for the read-modify-write

pub mod aggregate;
pub mod memory;
pub mod pool;
pub mod postgres;
pub mod repos;
pub mod store;

pub use aggregate::{all_classes_with_attributes, class_summaries, fan_in, FanInPolicy};
pub use memory::{Fault, MemoryStore};
pub use pool::{create_pool, create_pool_with_options};
pub use postgres::PgStore;
pub use repos::*;
pub use store::{DbError, DbResult, SpellStore};
