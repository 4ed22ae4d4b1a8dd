//! Fan-out/fan-in over class lookups
//!
//! `all_classes_with_attributes` resolves the class id list, then looks up
//! every class concurrently and assembles the result keyed by the id each
//! lookup echoes back. Completion order is irrelevant; the aggregate is
//! delivered only after every dispatched lookup has finished once.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use super::repos::ClassRepo;
use super::store::{DbError, DbResult, SpellStore};
use crate::config::ConfigError;
use crate::models::{ClassAttributes, ClassId, ClassLookup, ClassSummary};

/// Default bound on lookups in flight at once: one per pooled connection.
pub const DEFAULT_MAX_IN_FLIGHT: usize = super::pool::DEFAULT_MAX_CONNECTIONS as usize;

/// What a failed per-class lookup does to the aggregate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FanInPolicy {
    /// Log it and answer an empty entry for that class
    #[default]
    Degrade,
    /// Fail the whole aggregate
    FailFast,
}

impl fmt::Display for FanInPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Degrade => "degrade",
            Self::FailFast => "fail-fast",
        })
    }
}

impl FromStr for FanInPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "degrade" => Ok(Self::Degrade),
            "fail-fast" => Ok(Self::FailFast),
            other => Err(ConfigError::invalid("fan_in", other)),
        }
    }
}

/// Run `lookup` for every key with at most `max_in_flight` running at once.
///
/// Results come back in completion order, so `V` should carry its key.
/// An empty key list resolves immediately.
pub async fn fan_in<K, V, F, Fut>(keys: Vec<K>, max_in_flight: usize, lookup: F) -> Vec<V>
where
    F: FnMut(K) -> Fut,
    Fut: Future<Output = V>,
{
    if keys.is_empty() {
        return Vec::new();
    }

    stream::iter(keys)
        .map(lookup)
        .buffer_unordered(max_in_flight.max(1))
        .collect()
        .await
}

/// Every class keyed by id. Unresolved classes map to `None`.
pub async fn all_classes_with_attributes(
    store: &dyn SpellStore,
    policy: FanInPolicy,
    max_in_flight: usize,
) -> DbResult<BTreeMap<ClassId, Option<ClassAttributes>>> {
    let repo = ClassRepo::new(store);
    let ids = repo.list_ids().await?;
    let dispatched = ids.len();

    let outcomes = fan_in(ids, max_in_flight, |id| async move {
        repo.attributes(id).await.map_err(|error| (id, error))
    })
    .await;

    let mut classes = BTreeMap::new();
    let mut first_error: Option<DbError> = None;

    for outcome in outcomes {
        match outcome {
            Ok(lookup) => {
                classes.insert(lookup.id, lookup.attributes);
            }
            Err((id, error)) => match policy {
                FanInPolicy::Degrade => {
                    tracing::warn!(class_id = id, %error, "class lookup failed, answering empty entry");
                    classes.insert(id, None);
                }
                FanInPolicy::FailFast => {
                    first_error.get_or_insert(error);
                }
            },
        }
    }

    if let Some(error) = first_error {
        return Err(error);
    }

    tracing::debug!(dispatched, resolved = classes.len(), "class aggregate complete");
    Ok(classes)
}

/// Every class as `{id, name}`, ordered by id.
pub async fn class_summaries(
    store: &dyn SpellStore,
    policy: FanInPolicy,
    max_in_flight: usize,
) -> DbResult<Vec<ClassSummary>> {
    let classes = all_classes_with_attributes(store, policy, max_in_flight).await?;

    Ok(classes
        .into_iter()
        .map(|(id, attributes)| ClassSummary::from(ClassLookup { id, attributes }))
        .collect())
}
