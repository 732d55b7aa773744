/// In-memory grouping state: which label already owns a live group, per window
use crate::tab_data::{GroupColor, GroupId, WindowId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Store shared between the reconciler and the bulk actions
pub type SharedGroupStore = Rc<RefCell<GroupStore>>;

/// Round-robin position in `GroupColor::PALETTE`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorCursor {
    position: usize,
}

impl ColorCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color the next call to `advance` will return
    pub fn peek(&self) -> GroupColor {
        GroupColor::PALETTE[self.position % GroupColor::PALETTE.len()]
    }

    /// Return the current color and advance by one
    pub fn advance(&mut self) -> GroupColor {
        let color = self.peek();
        self.position += 1;
        color
    }

    /// Number of colors handed out so far
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Group records keyed by window, then label
///
/// Records never cross windows: the same label in two windows is two
/// unrelated groups.
#[derive(Debug, Default)]
pub struct GroupStore {
    windows: HashMap<WindowId, HashMap<String, GroupId>>,
    cursor: ColorCursor,
}

impl GroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedGroupStore {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn get(&self, window_id: WindowId, label: &str) -> Option<GroupId> {
        self.windows
            .get(&window_id)
            .and_then(|labels| labels.get(label))
            .copied()
    }

    pub fn set(&mut self, window_id: WindowId, label: &str, group_id: GroupId) {
        self.windows
            .entry(window_id)
            .or_default()
            .insert(label.to_string(), group_id);
    }

    /// Forget a record whose host group is gone
    pub fn invalidate(&mut self, window_id: WindowId, label: &str) -> Option<GroupId> {
        let labels = self.windows.get_mut(&window_id)?;
        let removed = labels.remove(label);
        if labels.is_empty() {
            self.windows.remove(&window_id);
        }
        removed
    }

    /// Remove every record of a closed window
    pub fn drop_window(&mut self, window_id: WindowId) -> usize {
        self.windows
            .remove(&window_id)
            .map_or(0, |labels| labels.len())
    }

    /// Color for a newly created group; the cursor is shared by all windows
    pub fn next_color(&mut self) -> GroupColor {
        self.cursor.advance()
    }

    pub fn cursor(&self) -> &ColorCursor {
        &self.cursor
    }

    /// Clear every record and rewind the color cursor
    pub fn reset(&mut self) {
        self.windows.clear();
        self.cursor = ColorCursor::new();
    }

    /// Total number of records across all windows
    pub fn len(&self) -> usize {
        self.windows.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut store = GroupStore::new();
        store.set(WindowId(1), "GitHub", GroupId(10));

        assert_eq!(store.get(WindowId(1), "GitHub"), Some(GroupId(10)));
        assert_eq!(store.get(WindowId(1), "Gmail"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_labels_are_scoped_per_window() {
        let mut store = GroupStore::new();
        store.set(WindowId(1), "GitHub", GroupId(10));

        assert_eq!(store.get(WindowId(2), "GitHub"), None);

        store.set(WindowId(2), "GitHub", GroupId(20));
        assert_eq!(store.get(WindowId(1), "GitHub"), Some(GroupId(10)));
        assert_eq!(store.get(WindowId(2), "GitHub"), Some(GroupId(20)));
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = GroupStore::new();
        store.set(WindowId(1), "GitHub", GroupId(10));
        store.set(WindowId(1), "GitHub", GroupId(11));

        assert_eq!(store.get(WindowId(1), "GitHub"), Some(GroupId(11)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let mut store = GroupStore::new();
        store.set(WindowId(1), "GitHub", GroupId(10));
        store.set(WindowId(1), "Reddit", GroupId(11));

        assert_eq!(store.invalidate(WindowId(1), "GitHub"), Some(GroupId(10)));
        assert_eq!(store.get(WindowId(1), "GitHub"), None);
        assert_eq!(store.get(WindowId(1), "Reddit"), Some(GroupId(11)));
        assert_eq!(store.invalidate(WindowId(1), "GitHub"), None);
        assert_eq!(store.invalidate(WindowId(9), "GitHub"), None);
    }

    #[test]
    fn test_invalidate_last_label_forgets_window() {
        let mut store = GroupStore::new();
        store.set(WindowId(1), "GitHub", GroupId(10));

        store.invalidate(WindowId(1), "GitHub");

        assert_eq!(store.window_count(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_drop_window_leaves_other_windows() {
        let mut store = GroupStore::new();
        store.set(WindowId(1), "GitHub", GroupId(10));
        store.set(WindowId(1), "Reddit", GroupId(11));
        store.set(WindowId(2), "GitHub", GroupId(20));

        assert_eq!(store.drop_window(WindowId(1)), 2);

        assert_eq!(store.get(WindowId(1), "GitHub"), None);
        assert_eq!(store.get(WindowId(1), "Reddit"), None);
        assert_eq!(store.get(WindowId(2), "GitHub"), Some(GroupId(20)));
        assert_eq!(store.window_count(), 1);
        assert_eq!(store.drop_window(WindowId(1)), 0);
    }

    #[test]
    fn test_color_cursor_round_robin() {
        let mut cursor = ColorCursor::new();
        let palette_len = GroupColor::PALETTE.len();

        for n in 0..palette_len * 2 + 3 {
            assert_eq!(cursor.advance(), GroupColor::PALETTE[n % palette_len]);
        }
        assert_eq!(cursor.position(), palette_len * 2 + 3);
    }

    #[test]
    fn test_store_cursor_is_shared_across_windows() {
        let mut store = GroupStore::new();

        assert_eq!(store.next_color(), GroupColor::Blue);
        store.set(WindowId(1), "A", GroupId(1));
        assert_eq!(store.next_color(), GroupColor::Red);
        store.set(WindowId(2), "B", GroupId(2));
        assert_eq!(store.next_color(), GroupColor::Yellow);
    }

    #[test]
    fn test_reset() {
        let mut store = GroupStore::new();
        store.set(WindowId(1), "GitHub", GroupId(10));
        store.next_color();

        store.reset();

        assert!(store.is_empty());
        assert_eq!(store.cursor().position(), 0);
        assert_eq!(store.next_color(), GroupColor::Blue);
    }
}
