//! Spell repository

use crate::db::store::{DbResult, SpellStore};
use crate::models::{SpellAttributes, SpellId, SpellSearch, SpellSummary};

/// Spell repository
#[derive(Clone, Copy)]
pub struct SpellRepo<'a> {
    store: &'a dyn SpellStore,
}

impl<'a> SpellRepo<'a> {
    pub fn new(store: &'a dyn SpellStore) -> Self {
        Self { store }
    }

    pub async fn list_ids(&self) -> DbResult<Vec<SpellId>> {
        self.store.spell_ids().await
    }

    /// Case-insensitive name search, ordered by name.
    ///
    /// An absent or empty `query` answers `[]` without issuing a query.
    pub async fn search(&self, query: Option<&str>, anywhere: bool) -> DbResult<Vec<SpellSummary>> {
        match SpellSearch::new(query, anywhere) {
            Some(search) => self.store.search_spells(&search).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn attributes(&self, id: SpellId) -> DbResult<Option<SpellAttributes>> {
        self.store.spell(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    fn catalog() -> MemoryStore {
        MemoryStore::new()
            .with_spell(5, SpellAttributes::named("Fireball", 3))
            .with_spell(6, SpellAttributes::named("Fire Bolt", 0))
            .with_spell(7, SpellAttributes::named("Delayed Blast Fireball", 7))
            .with_spell(8, SpellAttributes::named("Shield", 1))
    }

    fn names(hits: &[SpellSummary]) -> Vec<&str> {
        hits.iter().map(|h| h.name.as_str()).collect()
    }

    #[tokio::test]
    async fn prefix_search_is_ordered_by_name() {
        let store = catalog();
        let hits = SpellRepo::new(&store).search(Some("fire"), false).await.unwrap();
        assert_eq!(names(&hits), vec!["Fire Bolt", "Fireball"]);
    }

    #[tokio::test]
    async fn anywhere_search_is_a_superset() {
        let store = catalog();
        let repo = SpellRepo::new(&store);

        let prefix = repo.search(Some("FIRE"), false).await.unwrap();
        let anywhere = repo.search(Some("FIRE"), true).await.unwrap();

        assert!(prefix.iter().all(|hit| anywhere.contains(hit)));
        assert_eq!(
            names(&anywhere),
            vec!["Delayed Blast Fireball", "Fire Bolt", "Fireball"]
        );
    }

    #[tokio::test]
    async fn missing_query_issues_no_query() {
        let store = catalog();
        let repo = SpellRepo::new(&store);

        assert!(repo.search(None, false).await.unwrap().is_empty());
        assert!(repo.search(None, true).await.unwrap().is_empty());
        assert!(repo.search(Some(""), false).await.unwrap().is_empty());
        assert_eq!(store.queries_issued(), 0);
    }

    #[tokio::test]
    async fn attributes_by_id() {
        let store = catalog();
        let repo = SpellRepo::new(&store);

        assert_eq!(repo.attributes(5).await.unwrap().unwrap().level, 3);
        assert_eq!(repo.attributes(404).await.unwrap(), None);
    }
}
