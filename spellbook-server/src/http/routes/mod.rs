//! Route handlers organized by resource

pub mod classes;
pub mod health;
pub mod spells;
pub mod users;
