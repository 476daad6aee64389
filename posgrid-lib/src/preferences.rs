//! Debounced layout persistence.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use crate::debounce::Debouncer;
use crate::debounce::Sink;
use crate::identity::TableIdentity;
use crate::state::Preference;
use crate::store::PreferenceBackend;

/// Loads and persists the layout preference of one table identity.
///
/// Writes are ignored until the first load attempt has finished, and are
/// debounced afterwards. Changing the identity discards a pending write so it
/// never lands under the wrong key.
pub struct PreferenceSync {
    backend: Arc<dyn PreferenceBackend>,
    identity: TableIdentity,
    debouncer: Debouncer<Preference>,
    /// Last preference loaded or scheduled; unchanged layouts are not written.
    baseline: Option<Preference>,
    loaded: bool,
}

impl PreferenceSync {
    pub fn new(backend: Arc<dyn PreferenceBackend>, identity: TableIdentity, delay: Duration) -> Self {
        let debouncer = Debouncer::new(delay, writer(Arc::clone(&backend), identity.clone()));
        Self {
            backend,
            identity,
            debouncer,
            baseline: None,
            loaded: false,
        }
    }

    pub fn identity(&self) -> &TableIdentity {
        &self.identity
    }

    /// Whether the load attempt for the current identity finished.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Load the stored preference.
    ///
    /// Always marks the sync as loaded. Failures are logged and treated as
    /// "nothing stored".
    pub async fn load(&mut self) -> Option<Preference> {
        self.debouncer.cancel();
        let result = self.backend.load(&self.identity).await;
        self.loaded = true;

        match result {
            Ok(Some(preference)) => {
                log::debug!("Loaded preference for {}", self.identity);
                Some(preference)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Failed to load preference for {}: {}", self.identity, e);
                None
            }
        }
    }

    /// Record the layout the table currently shows without writing it.
    pub fn set_baseline(&mut self, preference: Preference) {
        self.baseline = Some(preference);
    }

    /// Schedule a write if the layout differs from the last known one.
    ///
    /// Returns true if a write was scheduled.
    pub fn observe(&mut self, preference: Preference) -> bool {
        if !self.loaded || self.baseline.as_ref() == Some(&preference) {
            return false;
        }
        self.baseline = Some(preference.clone());
        self.debouncer.schedule(preference);
        true
    }

    /// Switch to another identity. The pending write is dropped and the next
    /// `load` reads the new key.
    pub fn set_identity(&mut self, identity: TableIdentity) {
        if self.debouncer.cancel() {
            log::debug!("Dropped pending preference write for {}", self.identity);
        }
        self.debouncer = Debouncer::new(
            self.debouncer.delay(),
            writer(Arc::clone(&self.backend), identity.clone()),
        );
        self.identity = identity;
        self.baseline = None;
        self.loaded = false;
    }

    /// Write a pending preference now.
    pub async fn flush(&mut self) {
        self.debouncer.flush().await;
    }

    /// Drop a pending write.
    pub fn cancel(&mut self) -> bool {
        self.debouncer.cancel()
    }
}

/// Sink that upserts under a fixed identity, logging failures.
fn writer(backend: Arc<dyn PreferenceBackend>, identity: TableIdentity) -> Sink<Preference> {
    Arc::new(move |preference: Preference| {
        let backend = Arc::clone(&backend);
        let identity = identity.clone();
        async move {
            match backend.upsert(&identity, &preference).await {
                Ok(()) => log::debug!("Saved preference for {}", identity),
                Err(e) => log::warn!("Failed to save preference for {}: {}", identity, e),
            }
        }
        .boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn identity(user: &str) -> TableIdentity {
        TableIdentity::new("tbl_devices", "acme", user)
    }

    fn preference(page_size: usize) -> Preference {
        Preference {
            page_size,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_wait_for_load() {
        let store = Arc::new(InMemoryStore::new());
        let mut sync = PreferenceSync::new(store.clone(), identity("ann"), Duration::from_millis(500));

        assert!(!sync.observe(preference(10)));
        assert!(sync.load().await.is_none());
        assert!(sync.is_loaded());
        assert!(sync.observe(preference(10)));
        assert!(!sync.observe(preference(10)));

        tokio::time::sleep(Duration::from_millis(600)).await;
        let stored = store.load(&identity("ann")).await.unwrap();
        assert_eq!(stored, Some(preference(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_baseline_is_not_written() {
        let store = Arc::new(InMemoryStore::new());
        let mut sync = PreferenceSync::new(store.clone(), identity("ann"), Duration::from_millis(500));
        sync.load().await;
        sync.set_baseline(preference(25));

        assert!(!sync.observe(preference(25)));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.preference_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identity_change_drops_pending_write() {
        let store = Arc::new(InMemoryStore::new());
        let mut sync = PreferenceSync::new(store.clone(), identity("ann"), Duration::from_millis(500));
        sync.load().await;

        sync.observe(preference(50));
        sync.set_identity(identity("bob"));
        assert!(!sync.is_loaded());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.preference_count(), 0);

        sync.load().await;
        sync.observe(preference(100));
        sync.flush().await;
        let stored = store.load(&identity("bob")).await.unwrap();
        assert_eq!(stored, Some(preference(100)));
        assert_eq!(store.load(&identity("ann")).await.unwrap(), None);
    }
}
