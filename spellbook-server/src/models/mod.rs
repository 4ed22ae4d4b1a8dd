//! Domain models for classes, spells and users
//!
//! Path input is validated when building these types.
//! Invalid input returns ValidationError, not panic.

pub mod class;
pub mod search;
pub mod shape;
pub mod spell;
pub mod spell_list;
pub mod user;
pub mod validation;

pub use class::{ClassAttributes, ClassId, ClassLookup, ClassSummary, LevelBound};
pub use search::SpellSearch;
pub use shape::OrEmpty;
pub use spell::{SpellAttributes, SpellId, SpellSummary};
pub use spell_list::{SpellEdit, SpellList};
pub use user::{User, UserSpells};
pub use validation::{parse_id, ValidationError};
