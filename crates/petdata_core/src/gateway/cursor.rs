//! Forward-only result set returned by gateway queries.

use crate::notify::{ChangeFlag, ChangeNotifier, ObserverHandle};
use crate::repo::pet_store::CursorRow;
use std::sync::Arc;

/// Query result registered for change notification on its source URI.
///
/// The registration lives as long as the cursor.
#[derive(Debug)]
pub struct PetCursor {
    rows: std::vec::IntoIter<CursorRow>,
    total: usize,
    notification_uri: String,
    changed: Arc<ChangeFlag>,
    _registration: ObserverHandle,
}

impl PetCursor {
    pub(crate) fn new(rows: Vec<CursorRow>, uri: &str, notifier: &ChangeNotifier) -> Self {
        let changed = Arc::new(ChangeFlag::new());
        let registration = notifier.register(uri, changed.clone());
        Self {
            total: rows.len(),
            rows: rows.into_iter(),
            notification_uri: uri.to_string(),
            changed,
            _registration: registration,
        }
    }

    /// Number of rows produced by the query, read or not.
    pub fn row_count(&self) -> usize {
        self.total
    }

    /// Rows not yet read.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    pub fn notification_uri(&self) -> &str {
        &self.notification_uri
    }

    /// Returns whether a change was delivered for the source URI since the
    /// query ran.
    pub fn has_changed(&self) -> bool {
        self.changed.is_set()
    }
}

impl Iterator for PetCursor {
    type Item = CursorRow;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for PetCursor {}
