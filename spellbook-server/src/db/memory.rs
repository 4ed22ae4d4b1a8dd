//! In-memory store for tests and local development
//!
//! Mirrors the Postgres store's observable behavior: bytewise name ordering
//! (the SQL pins `COLLATE "C"`), case rules, "not found" shapes and atomic
//! spell list edits. User rows keep the raw `spells` text, so malformed
//! stored lists decode exactly as they would from Postgres. Faults can be
//! injected per operation (or per class lookup) to exercise error paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex as RowLock;

use super::store::{DbError, DbResult, SpellStore, UserRow};
use crate::models::{
    ClassId, LevelBound, SpellAttributes, SpellEdit, SpellId, SpellList, SpellSearch,
    SpellSummary, User,
};

/// Failure to inject into a store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Connection,
    Query,
    Timeout,
}

impl Fault {
    fn into_error(self, op: &'static str) -> DbError {
        match self {
            Self::Connection => DbError::Connection(sqlx::Error::PoolTimedOut),
            Self::Query => DbError::Query {
                op,
                source: sqlx::Error::Protocol(format!("injected failure in {op}")),
            },
            Self::Timeout => DbError::Timeout {
                op,
                after: Duration::from_secs(5),
            },
        }
    }
}

#[derive(Default)]
struct Tables {
    classes: BTreeMap<ClassId, String>,
    spells: BTreeMap<SpellId, SpellAttributes>,
    class_spells: Vec<(ClassId, SpellId, i32)>,
    users: Vec<UserRow>,
    faults: HashMap<&'static str, Fault>,
    class_faults: HashMap<ClassId, Fault>,
}

/// Store holding every table in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    // Held across an edit's read, await point and write, like `FOR UPDATE`.
    edit_lock: RowLock<()>,
    queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(self, id: ClassId, name: impl Into<String>) -> Self {
        self.lock().classes.insert(id, name.into());
        self
    }

    pub fn with_spell(self, id: SpellId, spell: SpellAttributes) -> Self {
        self.lock().spells.insert(id, spell);
        self
    }

    /// Associate `spell` with `class`, gained at `level`.
    pub fn with_class_spell(self, class: ClassId, spell: SpellId, level: i32) -> Self {
        self.lock().class_spells.push((class, spell, level));
        self
    }

    pub fn with_user(self, name: impl Into<String>, spells: Vec<SpellId>) -> Self {
        let text = SpellList::from(spells).encode();
        self.with_raw_user(name, Some(&text))
    }

    /// Add a user whose `spells` column holds `spells` verbatim.
    pub fn with_raw_user(self, name: impl Into<String>, spells: Option<&str>) -> Self {
        {
            let mut tables = self.lock();
            let id = tables.users.len() as i32 + 1;
            tables.users.push(UserRow {
                id,
                name: name.into(),
                spells: spells.map(str::to_owned),
            });
        }
        self
    }

    /// Raw `spells` text of the first user matching `name`.
    pub fn stored_spells(&self, name: &str) -> Option<String> {
        let tables = self.lock();
        find_index(&tables.users, name).and_then(|i| tables.users[i].spells.clone())
    }

    /// Make every later call of `op` fail with `fault`.
    pub fn inject(&self, op: &'static str, fault: Fault) {
        self.lock().faults.insert(op, fault);
    }

    /// Make later lookups of one class fail with `fault`.
    pub fn inject_class_fault(&self, class: ClassId, fault: Fault) {
        self.lock().class_faults.insert(class, fault);
    }

    pub fn clear_faults(&self) {
        let mut tables = self.lock();
        tables.faults.clear();
        tables.class_faults.clear();
    }

    /// Number of store operations issued so far.
    pub fn queries_issued(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Tables stay consistent even if a holder panicked; every write is a single step.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call and surface any injected fault, then hand out the tables.
    fn begin(&self, op: &'static str) -> DbResult<MutexGuard<'_, Tables>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let tables = self.lock();
        let fault = tables.faults.get(op).copied();
        match fault {
            Some(fault) => Err(fault.into_error(op)),
            None => Ok(tables),
        }
    }

    fn read_user(&self, op: &'static str, name: &str) -> DbResult<Option<UserRow>> {
        let tables = self.begin(op)?;
        Ok(find_index(&tables.users, name).map(|i| tables.users[i].clone()))
    }
}

/// Rows are kept in id order, so the first match is the oldest row.
fn find_index(users: &[UserRow], name: &str) -> Option<usize> {
    let wanted = name.to_lowercase();
    users.iter().position(|u| u.name.to_lowercase() == wanted)
}

fn insert_empty(users: &mut Vec<UserRow>, name: &str) -> DbResult<User> {
    let row = UserRow {
        id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
        name: name.to_owned(),
        spells: Some(SpellList::new().encode()),
    };
    users.push(row.clone());
    row.into_user()
}

#[async_trait]
impl SpellStore for MemoryStore {
    async fn ping(&self) -> DbResult<()> {
        self.begin("ping").map(|_| ())
    }

    async fn class_ids(&self) -> DbResult<Vec<ClassId>> {
        let tables = self.begin("class_ids")?;
        Ok(tables.classes.keys().copied().collect())
    }

    async fn class_name(&self, id: ClassId) -> DbResult<Option<String>> {
        let tables = self.begin("class_name")?;
        if let Some(fault) = tables.class_faults.get(&id) {
            return Err(fault.into_error("class_name"));
        }
        Ok(tables.classes.get(&id).cloned())
    }

    async fn spell_ids(&self) -> DbResult<Vec<SpellId>> {
        let tables = self.begin("spell_ids")?;
        Ok(tables.spells.keys().copied().collect())
    }

    async fn search_spells(&self, search: &SpellSearch) -> DbResult<Vec<SpellSummary>> {
        let tables = self.begin("search_spells")?;
        let mut hits: Vec<SpellSummary> = tables
            .spells
            .iter()
            .filter(|(_, spell)| search.matches(&spell.name))
            .map(|(&id, spell)| SpellSummary {
                id,
                name: spell.name.clone(),
            })
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(hits)
    }

    async fn spell(&self, id: SpellId) -> DbResult<Option<SpellAttributes>> {
        let tables = self.begin("spell")?;
        Ok(tables.spells.get(&id).cloned())
    }

    async fn class_levels(&self, class: ClassId) -> DbResult<Vec<i32>> {
        let tables = self.begin("class_levels")?;
        let mut levels: Vec<i32> = tables
            .class_spells
            .iter()
            .filter(|(c, _, _)| *c == class)
            .map(|&(_, _, level)| level)
            .collect();
        levels.sort_unstable();
        levels.dedup();
        Ok(levels)
    }

    async fn class_spells(&self, class: ClassId, bound: LevelBound) -> DbResult<Vec<SpellId>> {
        let op = match bound {
            LevelBound::Exactly(_) => "class_spells_at",
            LevelBound::UpTo(_) => "class_spells_upto",
        };
        let tables = self.begin(op)?;
        // Inner join: associations to unknown spells are dropped.
        let mut named: Vec<(&str, SpellId)> = tables
            .class_spells
            .iter()
            .filter(|&&(c, _, level)| c == class && bound.admits(level))
            .filter_map(|&(_, spell, _)| {
                tables
                    .spells
                    .get(&spell)
                    .map(|attrs| (attrs.name.as_str(), spell))
            })
            .collect();
        named.sort_by(|a, b| a.0.cmp(b.0));
        Ok(named.into_iter().map(|(_, spell)| spell).collect())
    }

    async fn user_names(&self) -> DbResult<Vec<String>> {
        let tables = self.begin("user_names")?;
        Ok(tables.users.iter().map(|u| u.name.clone()).collect())
    }

    async fn find_user(&self, name: &str) -> DbResult<Option<User>> {
        self.read_user("find_user", name)?
            .map(UserRow::into_user)
            .transpose()
    }

    async fn get_or_create_user(&self, name: &str) -> DbResult<User> {
        let mut tables = self.begin("get_or_create_user")?;
        match find_index(&tables.users, name) {
            Some(i) => tables.users[i].clone().into_user(),
            None => insert_empty(&mut tables.users, name),
        }
    }

    async fn reset_spells(&self, name: &str) -> DbResult<User> {
        let mut tables = self.begin("reset_spells")?;
        match find_index(&tables.users, name) {
            Some(i) => {
                tables.users[i].spells = Some(SpellList::new().encode());
                tables.users[i].clone().into_user()
            }
            None => insert_empty(&mut tables.users, name),
        }
    }

    async fn edit_spells(&self, name: &str, edit: SpellEdit) -> DbResult<Option<User>> {
        let _row = self.edit_lock.lock().await;

        let Some(row) = self.read_user("edit_spells", name)? else {
            return Ok(None);
        };
        let mut user = row.into_user()?;

        // Other edits get to run here; only `edit_lock` keeps them from
        // reading the list this edit is about to replace.
        tokio::task::yield_now().await;

        edit.apply(&mut user.spells);
        let mut tables = self.lock();
        if let Some(row) = tables.users.iter_mut().find(|row| row.id == user.id) {
            row.spells = Some(user.spells.encode());
        }
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_class(1, "Wizard")
            .with_spell(5, SpellAttributes::named("Fireball", 3))
            .with_spell(6, SpellAttributes::named("Burning Hands", 1))
            .with_class_spell(1, 5, 3)
            .with_class_spell(1, 6, 1)
            .with_class_spell(1, 99, 1)
    }

    #[tokio::test]
    async fn counts_every_call() {
        let store = store();
        store.class_ids().await.unwrap();
        store.class_name(1).await.unwrap();
        assert_eq!(store.queries_issued(), 2);
    }

    #[tokio::test]
    async fn injected_faults_surface_as_typed_errors() {
        let store = store();
        store.inject("class_ids", Fault::Timeout);
        store.inject("spell_ids", Fault::Connection);

        assert!(matches!(
            store.class_ids().await,
            Err(DbError::Timeout { op: "class_ids", .. })
        ));
        assert!(matches!(store.spell_ids().await, Err(DbError::Connection(_))));

        store.clear_faults();
        assert_eq!(store.class_ids().await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn associations_without_spell_are_dropped() {
        let spells = store().class_spells(1, LevelBound::UpTo(9)).await.unwrap();
        assert_eq!(spells, vec![6, 5]);
    }

    #[tokio::test]
    async fn user_lookup_ignores_case() {
        let store = MemoryStore::new().with_user("Alice", vec![5]);
        let user = store.find_user("ALICE").await.unwrap().unwrap();
        assert_eq!(user.name, "Alice");
        assert!(store.find_user("Al").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oldest_row_wins_among_case_variants() {
        let store = MemoryStore::new()
            .with_user("Alice", vec![1])
            .with_user("alice", vec![2]);

        let user = store.find_user("ALICE").await.unwrap().unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.spells, SpellList::from(vec![1]));

        let edited = store.edit_spells("alice", SpellEdit::Add(9)).await.unwrap().unwrap();
        assert_eq!(edited.id, 1);
        assert_eq!(store.stored_spells("alice").as_deref(), Some("[1,9]"));
    }

    #[tokio::test]
    async fn malformed_list_is_a_decode_error() {
        let store = MemoryStore::new().with_raw_user("Alice", Some("5,12"));

        assert!(matches!(
            store.find_user("alice").await,
            Err(DbError::Decode { .. })
        ));
        assert!(matches!(
            store.edit_spells("Alice", SpellEdit::Add(3)).await,
            Err(DbError::Decode { .. })
        ));
        assert_eq!(store.stored_spells("Alice").as_deref(), Some("5,12"));
    }

    #[tokio::test]
    async fn null_list_edits_like_empty() {
        let store = MemoryStore::new().with_raw_user("Alice", None);

        let user = store.edit_spells("Alice", SpellEdit::Add(3)).await.unwrap().unwrap();
        assert_eq!(user.spells, SpellList::from(vec![3]));
        assert_eq!(store.stored_spells("Alice").as_deref(), Some("[3]"));
    }
}
