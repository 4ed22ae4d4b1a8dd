//! Application state shared across handlers

use std::sync::Arc;

use crate::config::ApiSettings;
use crate::db::SpellStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn SpellStore>,
    settings: ApiSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn SpellStore>, settings: ApiSettings) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store, settings }),
        }
    }

    pub fn store(&self) -> &dyn SpellStore {
        self.inner.store.as_ref()
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.inner.settings
    }
}
