//! Class repository
//!
//! Class ids, class attributes and the class/spell/level associations.

use crate::db::store::{DbResult, SpellStore};
use crate::models::{ClassAttributes, ClassId, ClassLookup, LevelBound, SpellId};

/// Class repository
#[derive(Clone, Copy)]
pub struct ClassRepo<'a> {
    store: &'a dyn SpellStore,
}

impl<'a> ClassRepo<'a> {
    pub fn new(store: &'a dyn SpellStore) -> Self {
        Self { store }
    }

    /// All class ids, in store order.
    pub async fn list_ids(&self) -> DbResult<Vec<ClassId>> {
        self.store.class_ids().await
    }

    /// Attributes of one class, echoing `id` back for correlation.
    pub async fn attributes(&self, id: ClassId) -> DbResult<ClassLookup> {
        let attributes = self
            .store
            .class_name(id)
            .await?
            .map(|name| ClassAttributes { name });

        Ok(ClassLookup { id, attributes })
    }

    /// Distinct levels at which the class gains spells, ascending.
    pub async fn spell_levels(&self, id: ClassId) -> DbResult<Vec<i32>> {
        self.store.class_levels(id).await
    }

    /// Spells the class gains at exactly `level`, ordered by spell name.
    pub async fn spells_at_level(&self, id: ClassId, level: i32) -> DbResult<Vec<SpellId>> {
        self.store.class_spells(id, LevelBound::Exactly(level)).await
    }

    /// Spells the class gains at `level` or below, ordered by spell name.
    pub async fn spells_up_to_level(&self, id: ClassId, level: i32) -> DbResult<Vec<SpellId>> {
        self.store.class_spells(id, LevelBound::UpTo(level)).await
    }
}
