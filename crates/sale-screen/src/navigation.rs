//! Routes of the Sale screens and the navigation seam.

use std::sync::Mutex;

use sale_core::EntityId;

/// Fire-and-forget navigation.
pub trait Navigator: Send + Sync {
    fn go_to(&self, path: &str);
}

/// `/sale`
pub fn list_path() -> String {
    "/sale".to_string()
}

/// `/sale/new`
pub fn new_path() -> String {
    "/sale/new".to_string()
}

/// `/sale/{id}`
pub fn detail_path(id: EntityId) -> String {
    format!("/sale/{}", id)
}

/// `/sale/{id}/edit`
pub fn edit_path(id: EntityId) -> String {
    format!("/sale/{}/edit", id)
}

/// Records every path it is sent to.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// The last path navigated to.
    pub fn current(&self) -> Option<String> {
        self.history
            .lock()
            .ok()
            .and_then(|h| h.last().cloned())
    }
}

impl Navigator for HistoryNavigator {
    fn go_to(&self, path: &str) {
        tracing::debug!(path, "Navigate");
        if let Ok(mut h) = self.history.lock() {
            h.push(path.to_string());
        }
    }
}
