//! Remote-mode query emission.

use std::collections::BTreeMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::Deserialize;
use serde::Serialize;

use crate::debounce::Debouncer;
use crate::debounce::Sink;
use crate::state::ColumnSort;
use crate::state::FilterValue;
use crate::state::TableState;

/// Host callback receiving every emitted query.
pub type QueryCallback = Arc<dyn Fn(QueryDescriptor) + Send + Sync>;

/// The query-relevant subset of table state, sent to the host as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    pub page_index: usize,
    pub page_size: usize,
    pub sorting: Vec<ColumnSort>,
    pub search: String,
    pub filters: BTreeMap<String, FilterValue>,
}

impl QueryDescriptor {
    pub fn from_state<K: Clone + Eq + Hash>(state: &TableState<K>) -> Self {
        Self {
            page_index: state.page_index,
            page_size: state.page_size,
            sorting: state.sorting.clone(),
            search: state.search.clone(),
            filters: state.filters.clone(),
        }
    }
}

/// Debounces query changes into single deliveries of the whole descriptor.
///
/// The emitter keeps the last observed descriptor memoized; export reads it
/// without waiting for the debounce.
pub struct QueryEmitter {
    debouncer: Debouncer<QueryDescriptor>,
    memoized: Option<QueryDescriptor>,
}

impl QueryEmitter {
    pub fn new(delay: Duration, callback: QueryCallback) -> Self {
        let sink: Sink<QueryDescriptor> = Arc::new(move |descriptor: QueryDescriptor| {
            let callback = Arc::clone(&callback);
            async move {
                log::debug!(
                    "Emitting query: page {} size {} search {:?}",
                    descriptor.page_index,
                    descriptor.page_size,
                    descriptor.search
                );
                callback(descriptor);
            }
            .boxed()
        });

        Self {
            debouncer: Debouncer::new(delay, sink),
            memoized: None,
        }
    }

    /// Record the current state and schedule an emission if the descriptor
    /// changed. Returns true if an emission was scheduled.
    pub fn observe<K: Clone + Eq + Hash>(&mut self, state: &TableState<K>) -> bool {
        let descriptor = QueryDescriptor::from_state(state);
        if self.memoized.as_ref() == Some(&descriptor) {
            return false;
        }
        self.memoized = Some(descriptor.clone());
        self.debouncer.schedule(descriptor);
        true
    }

    /// Last observed descriptor.
    pub fn memoized(&self) -> Option<&QueryDescriptor> {
        self.memoized.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Emit a pending descriptor immediately.
    pub async fn flush(&mut self) {
        self.debouncer.flush().await;
    }

    /// Drop a pending emission.
    pub fn cancel(&mut self) -> bool {
        self.debouncer.cancel()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::selection::SelectionMode;

    fn recording() -> (QueryCallback, Arc<Mutex<Vec<QueryDescriptor>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let callback_seen = Arc::clone(&seen);
        let callback: QueryCallback = Arc::new(move |descriptor| {
            callback_seen.lock().unwrap().push(descriptor);
        });
        (callback, seen)
    }

    #[test]
    fn test_descriptor_json_shape() {
        let mut state = TableState::<u32>::new(25, SelectionMode::None);
        state.set_search("cola");
        state.toggle_sort("price", false);

        let value = serde_json::to_value(QueryDescriptor::from_state(&state)).unwrap();
        assert_eq!(
            value,
            json!({
                "pageIndex": 0,
                "pageSize": 25,
                "sorting": [{"id": "price", "direction": "asc"}],
                "search": "cola",
                "filters": {}
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_emits_once() {
        let (callback, seen) = recording();
        let mut emitter = QueryEmitter::new(Duration::from_millis(350), callback);
        let mut state = TableState::<u32>::new(25, SelectionMode::None);

        for typed in ["c", "co", "col", "cola"] {
            state.set_search(typed);
            assert!(emitter.observe(&state));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(350)).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].search, "cola");
        assert_eq!(seen[0].page_size, 25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_descriptor_not_rescheduled() {
        let (callback, seen) = recording();
        let mut emitter = QueryEmitter::new(Duration::from_millis(350), callback);
        let state = TableState::<u32>::new(25, SelectionMode::None);

        assert!(emitter.observe(&state));
        emitter.flush().await;
        assert!(!emitter.observe(&state));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(emitter.memoized(), Some(&QueryDescriptor::from_state(&state)));
    }
}
