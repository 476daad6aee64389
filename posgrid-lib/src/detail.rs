//! Row activation: side panel or host callback.

use std::sync::Arc;

use crate::row::TableRow;

/// Renders the detail panel of a row.
pub type DetailRenderer<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Host callback for plain row clicks.
pub type RowClickCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// How a row was activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Click,
    /// Enter key on a focused row.
    Enter,
}

/// What an activation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The detail panel now shows the row.
    DetailOpened,
    /// The row-click callback was invoked.
    RowClicked,
    /// Neither a renderer nor a callback is configured.
    Ignored,
}

/// Routes row activation to the detail panel when a renderer is configured,
/// and to the row-click callback otherwise.
pub struct DetailBridge<T: TableRow> {
    renderer: Option<DetailRenderer<T>>,
    on_row_click: Option<RowClickCallback<T>>,
    open: Option<T::Key>,
}

impl<T: TableRow> DetailBridge<T> {
    pub fn new(
        renderer: Option<DetailRenderer<T>>,
        on_row_click: Option<RowClickCallback<T>>,
    ) -> Self {
        Self {
            renderer,
            on_row_click,
            open: None,
        }
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn activate(&mut self, row: &T, activation: Activation) -> ActivationOutcome {
        if self.renderer.is_some() {
            log::debug!("Opening detail for row {} ({:?})", row.key().to_string(), activation);
            self.open = Some(row.key());
            return ActivationOutcome::DetailOpened;
        }

        match &self.on_row_click {
            Some(on_row_click) => {
                on_row_click(row);
                ActivationOutcome::RowClicked
            }
            None => ActivationOutcome::Ignored,
        }
    }

    /// Key of the row the panel is bound to.
    pub fn open_key(&self) -> Option<&T::Key> {
        self.open.as_ref()
    }

    /// Close the panel. Returns true if it was open.
    pub fn close(&mut self) -> bool {
        self.open.take().is_some()
    }

    pub fn render(&self, row: &T) -> Option<String> {
        self.renderer.as_ref().map(|render| render(row))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Clone, Debug)]
    struct Table {
        number: u32,
    }

    impl TableRow for Table {
        type Key = u32;

        fn key(&self) -> u32 {
            self.number
        }

        fn cell_text(&self, _column_id: &str) -> String {
            self.number.to_string()
        }
    }

    #[test]
    fn test_renderer_suppresses_row_click() {
        let clicks = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&clicks);
        let on_click: RowClickCallback<Table> = Arc::new(move |_| *counter.lock().unwrap() += 1);
        let renderer: DetailRenderer<Table> = Arc::new(|row| format!("Table {}", row.number));

        let mut bridge = DetailBridge::new(Some(renderer), Some(on_click));
        let row = Table { number: 4 };
        assert_eq!(bridge.activate(&row, Activation::Enter), ActivationOutcome::DetailOpened);
        assert_eq!(bridge.open_key(), Some(&4));
        assert_eq!(bridge.render(&row).as_deref(), Some("Table 4"));
        assert_eq!(*clicks.lock().unwrap(), 0);
        assert!(bridge.close());
        assert!(!bridge.close());
    }

    #[test]
    fn test_click_without_renderer() {
        let clicks = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&clicks);
        let on_click: RowClickCallback<Table> =
            Arc::new(move |row: &Table| seen.lock().unwrap().push(row.number));

        let mut bridge = DetailBridge::new(None, Some(on_click));
        let row = Table { number: 9 };
        assert_eq!(bridge.activate(&row, Activation::Click), ActivationOutcome::RowClicked);
        assert_eq!(bridge.activate(&row, Activation::Enter), ActivationOutcome::RowClicked);
        assert_eq!(*clicks.lock().unwrap(), [9, 9]);
        assert!(bridge.open_key().is_none());

        let mut silent: DetailBridge<Table> = DetailBridge::new(None, None);
        assert_eq!(silent.activate(&row, Activation::Click), ActivationOutcome::Ignored);
    }
}
