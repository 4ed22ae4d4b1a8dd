//! Repositories over a `SpellStore`
//!
//! Each repository call maps to exactly one store call and reshapes the
//! result for the HTTP layer:
//! - "not found" stays distinct from failure (`Option` vs `DbError`)
//! - search terms that would match nothing never reach the store
//! - spell list edits never create users

pub mod classes;
pub mod spells;
pub mod users;

pub use classes::ClassRepo;
pub use spells::SpellRepo;
pub use users::UserRepo;
