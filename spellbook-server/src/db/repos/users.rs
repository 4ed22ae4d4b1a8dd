//! User repository - profiles and their known spell lists
//!
//! A user's spells live in one JSON-encoded column. Edits follow
//! load → decode → change → encode → persist, run by the store as a single
//! atomic step per call:
//! - add_spell / remove_spell: idempotent, never create the user
//! - get_or_create: creates with `[]`, never overwrites an existing list
//! - reset_spells: explicit wipe to `[]` (creates if absent)

use crate::db::store::{DbResult, SpellStore};
use crate::models::{SpellEdit, SpellId, User, UserSpells};

/// User repository
#[derive(Clone, Copy)]
pub struct UserRepo<'a> {
    store: &'a dyn SpellStore,
}

impl<'a> UserRepo<'a> {
    pub fn new(store: &'a dyn SpellStore) -> Self {
        Self { store }
    }

    pub async fn list_names(&self) -> DbResult<Vec<String>> {
        self.store.user_names().await
    }

    /// Case-insensitive exact lookup.
    pub async fn find(&self, name: &str) -> DbResult<Option<User>> {
        self.store.find_user(name).await
    }

    /// Return the user's current state, creating them with an empty list on first use.
    pub async fn get_or_create(&self, name: &str) -> DbResult<UserSpells> {
        let user = self.store.get_or_create_user(name).await?;
        tracing::debug!(user = %user.name, spells = user.spells.len(), "user ready");
        Ok(user.into())
    }

    /// Wipe the user's list, creating them if absent.
    pub async fn reset_spells(&self, name: &str) -> DbResult<UserSpells> {
        let user = self.store.reset_spells(name).await?;
        tracing::info!(user = %user.name, "spell list reset");
        Ok(user.into())
    }

    /// Add `spell` to the user's list unless already known.
    ///
    /// Returns `None` when the user does not exist.
    pub async fn add_spell(&self, name: &str, spell: SpellId) -> DbResult<Option<UserSpells>> {
        self.edit(name, SpellEdit::Add(spell)).await
    }

    /// Remove the first occurrence of `spell` from the user's list, if present.
    ///
    /// Returns `None` when the user does not exist.
    pub async fn remove_spell(&self, name: &str, spell: SpellId) -> DbResult<Option<UserSpells>> {
        self.edit(name, SpellEdit::Remove(spell)).await
    }

    async fn edit(&self, name: &str, edit: SpellEdit) -> DbResult<Option<UserSpells>> {
        let edited = self.store.edit_spells(name, edit).await?;
        if edited.is_none() {
            tracing::debug!(user = name, ?edit, "spell edit for unknown user ignored");
        }
        Ok(edited.map(UserSpells::from))
    }
}
