//! Postgres-backed store
//!
//! Every statement runs through [`PgStore::execute`], which acquires one
//! pooled connection, bounds the statement with a timeout and returns the
//! connection to the pool when the work future ends, on every path.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Connection, PgPool, Postgres};

use super::store::{DbError, DbResult, SpellStore, UserRow};
use crate::models::{
    ClassId, LevelBound, SpellAttributes, SpellEdit, SpellId, SpellSearch, SpellSummary, User,
};

/// Default per-statement timeout.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_CLASS_IDS: &str = "SELECT id FROM classes";
const SELECT_CLASS_NAME: &str = "SELECT name FROM classes WHERE id = $1";
const SELECT_SPELL_IDS: &str = "SELECT id FROM spells";
// Names sort bytewise (`COLLATE "C"`), independent of the database locale.
const SEARCH_SPELLS: &str =
    r#"SELECT id, name FROM spells WHERE name ILIKE $1 ORDER BY name COLLATE "C""#;
const SELECT_SPELL: &str = r#"
    SELECT name, type, casting_time, range, components, duration, primary_description, level
    FROM spells
    WHERE id = $1
"#;
const SELECT_CLASS_LEVELS: &str =
    "SELECT DISTINCT level FROM class_spells WHERE class = $1 ORDER BY level";
const SELECT_CLASS_SPELLS_AT: &str = r#"
    SELECT cs.spell
    FROM class_spells cs
    INNER JOIN spells s ON s.id = cs.spell
    WHERE cs.class = $1 AND cs.level = $2
    ORDER BY s.name COLLATE "C"
"#;
const SELECT_CLASS_SPELLS_UPTO: &str = r#"
    SELECT cs.spell
    FROM class_spells cs
    INNER JOIN spells s ON s.id = cs.spell
    WHERE cs.class = $1 AND cs.level <= $2
    ORDER BY s.name COLLATE "C"
"#;
const SELECT_USER_NAMES: &str = "SELECT name FROM users";
// Plain equality on lower(): user names may contain LIKE metacharacters.
// The unique index is case-sensitive, so names differing only in case can
// coexist; the oldest row wins.
const FIND_USER: &str =
    "SELECT id, name, spells FROM users WHERE lower(name) = lower($1) ORDER BY id LIMIT 1";
const LOCK_USER: &str = r#"
    SELECT id, name, spells FROM users
    WHERE lower(name) = lower($1)
    ORDER BY id
    LIMIT 1
    FOR UPDATE
"#;
const INSERT_USER: &str = r#"
    INSERT INTO users (name, spells) VALUES ($1, '[]')
    ON CONFLICT (name) DO NOTHING
    RETURNING id, name, spells
"#;
const RESET_SPELLS: &str = r#"
    UPDATE users SET spells = '[]'
    WHERE id = (SELECT id FROM users WHERE lower(name) = lower($1) ORDER BY id LIMIT 1)
    RETURNING id, name, spells
"#;
const UPDATE_SPELLS: &str = "UPDATE users SET spells = $2 WHERE id = $1";

/// Store backed by a Postgres connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_timeout(pool, DEFAULT_QUERY_TIMEOUT)
    }

    pub fn with_timeout(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Run one unit of work on a pooled connection.
    ///
    /// The connection is moved into `work` and dropped when its future
    /// completes, fails or is cancelled by the timeout, which returns it to
    /// the pool exactly once.
    async fn execute<T, F, Fut>(&self, op: &'static str, work: F) -> DbResult<T>
    where
        F: FnOnce(PoolConnection<Postgres>) -> Fut + Send,
        Fut: Future<Output = Result<T, sqlx::Error>> + Send,
        T: Send,
    {
        let started = Instant::now();
        let attempt = async {
            let conn = self.pool.acquire().await.map_err(DbError::Connection)?;
            work(conn)
                .await
                .map_err(|source| DbError::Query { op, source })
        };

        let result = match tokio::time::timeout(self.query_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(DbError::Timeout {
                op,
                after: self.query_timeout,
            }),
        };

        match &result {
            Ok(_) => {
                tracing::debug!(op, elapsed_ms = started.elapsed().as_millis() as u64, "query ok")
            }
            Err(error) => tracing::error!(op, kind = error.kind(), %error, "query failed"),
        }
        result
    }

    /// Insert `name` unless a user already matches it case-insensitively.
    async fn insert_if_absent(&self, name: &str) -> DbResult<User> {
        let row = self
            .execute("get_or_create_user", |mut conn| async move {
                if let Some(row) = sqlx::query_as::<_, UserRow>(FIND_USER)
                    .bind(name)
                    .fetch_optional(&mut *conn)
                    .await?
                {
                    return Ok(row);
                }

                let inserted = sqlx::query_as::<_, UserRow>(INSERT_USER)
                    .bind(name)
                    .fetch_optional(&mut *conn)
                    .await?;

                match inserted {
                    Some(row) => Ok(row),
                    // Lost a race with a concurrent insert of the same name.
                    None => {
                        sqlx::query_as::<_, UserRow>(FIND_USER)
                            .bind(name)
                            .fetch_one(&mut *conn)
                            .await
                    }
                }
            })
            .await?;

        row.into_user()
    }
}

#[async_trait]
impl SpellStore for PgStore {
    async fn ping(&self) -> DbResult<()> {
        self.execute("ping", |mut conn| async move {
            sqlx::query("SELECT 1").execute(&mut *conn).await.map(|_| ())
        })
        .await
    }

    async fn class_ids(&self) -> DbResult<Vec<ClassId>> {
        self.execute("class_ids", |mut conn| async move {
            sqlx::query_scalar::<_, ClassId>(SELECT_CLASS_IDS)
                .fetch_all(&mut *conn)
                .await
        })
        .await
    }

    async fn class_name(&self, id: ClassId) -> DbResult<Option<String>> {
        self.execute("class_name", |mut conn| async move {
            sqlx::query_scalar::<_, String>(SELECT_CLASS_NAME)
                .bind(id)
                .fetch_optional(&mut *conn)
                .await
        })
        .await
    }

    async fn spell_ids(&self) -> DbResult<Vec<SpellId>> {
        self.execute("spell_ids", |mut conn| async move {
            sqlx::query_scalar::<_, SpellId>(SELECT_SPELL_IDS)
                .fetch_all(&mut *conn)
                .await
        })
        .await
    }

    async fn search_spells(&self, search: &SpellSearch) -> DbResult<Vec<SpellSummary>> {
        let pattern = search.like_pattern();
        self.execute("search_spells", |mut conn| async move {
            sqlx::query_as::<_, SpellSummary>(SEARCH_SPELLS)
                .bind(pattern)
                .fetch_all(&mut *conn)
                .await
        })
        .await
    }

    async fn spell(&self, id: SpellId) -> DbResult<Option<SpellAttributes>> {
        self.execute("spell", |mut conn| async move {
            sqlx::query_as::<_, SpellAttributes>(SELECT_SPELL)
                .bind(id)
                .fetch_optional(&mut *conn)
                .await
        })
        .await
    }

    async fn class_levels(&self, class: ClassId) -> DbResult<Vec<i32>> {
        self.execute("class_levels", |mut conn| async move {
            sqlx::query_scalar::<_, i32>(SELECT_CLASS_LEVELS)
                .bind(class)
                .fetch_all(&mut *conn)
                .await
        })
        .await
    }

    async fn class_spells(&self, class: ClassId, bound: LevelBound) -> DbResult<Vec<SpellId>> {
        let (op, sql) = match bound {
            LevelBound::Exactly(_) => ("class_spells_at", SELECT_CLASS_SPELLS_AT),
            LevelBound::UpTo(_) => ("class_spells_upto", SELECT_CLASS_SPELLS_UPTO),
        };
        self.execute(op, |mut conn| async move {
            sqlx::query_scalar::<_, SpellId>(sql)
                .bind(class)
                .bind(bound.level())
                .fetch_all(&mut *conn)
                .await
        })
        .await
    }

    async fn user_names(&self) -> DbResult<Vec<String>> {
        self.execute("user_names", |mut conn| async move {
            sqlx::query_scalar::<_, String>(SELECT_USER_NAMES)
                .fetch_all(&mut *conn)
                .await
        })
        .await
    }

    async fn find_user(&self, name: &str) -> DbResult<Option<User>> {
        let row = self
            .execute("find_user", |mut conn| async move {
                sqlx::query_as::<_, UserRow>(FIND_USER)
                    .bind(name)
                    .fetch_optional(&mut *conn)
                    .await
            })
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn get_or_create_user(&self, name: &str) -> DbResult<User> {
        self.insert_if_absent(name).await
    }

    async fn reset_spells(&self, name: &str) -> DbResult<User> {
        let row = self
            .execute("reset_spells", |mut conn| async move {
                sqlx::query_as::<_, UserRow>(RESET_SPELLS)
                    .bind(name)
                    .fetch_optional(&mut *conn)
                    .await
            })
            .await?;

        match row {
            Some(row) => row.into_user(),
            None => self.insert_if_absent(name).await,
        }
    }

    async fn edit_spells(&self, name: &str, edit: SpellEdit) -> DbResult<Option<User>> {
        // The row lock serializes concurrent edits of the same user, so one
        // writer can no longer overwrite another's change.
        self.execute("edit_spells", |mut conn| async move {
            let mut tx = conn.begin().await?;

            let Some(row) = sqlx::query_as::<_, UserRow>(LOCK_USER)
                .bind(name)
                .fetch_optional(&mut *tx)
                .await?
            else {
                return Ok(Ok(None));
            };

            let mut user = match row.into_user() {
                Ok(user) => user,
                // Dropping the transaction rolls it back and releases the lock.
                Err(error) => return Ok(Err(error)),
            };

            let changed = edit.apply(&mut user.spells);
            sqlx::query(UPDATE_SPELLS)
                .bind(user.id)
                .bind(user.spells.encode())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            tracing::debug!(user = %user.name, ?edit, changed, "spell list persisted");
            Ok::<_, sqlx::Error>(Ok(Some(user)))
        })
        .await?
    }
}
