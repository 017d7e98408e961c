#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::path::PathBuf;

use crate::index::DirectoryIndex;
use crate::pane::Panel;

/// Marked entry names of one panel, keyed by name so they survive refreshes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    marked: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `name` is marked afterwards.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.marked.remove(name) {
            false
        } else {
            self.marked.insert(name.to_string());
            true
        }
    }

    /// Returns how many names were newly marked.
    pub fn select_all<'a>(&mut self, visible_names: impl IntoIterator<Item = &'a str>) -> usize {
        visible_names
            .into_iter()
            .filter(|name| self.marked.insert(name.to_string()))
            .count()
    }

    /// Returns how many names were unmarked.
    pub fn clear_all(&mut self) -> usize {
        let count = self.marked.len();
        self.marked.clear();
        count
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.marked.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    pub fn len(&self) -> usize {
        self.marked.len()
    }

    /// Drops names the latest listing no longer contains.
    pub fn reconcile(&mut self, index: &DirectoryIndex) {
        self.marked.retain(|name| index.contains(name));
    }

    /// What a file operation acts on: the marked names still visible, in
    /// listing order, or the cursor item when nothing is marked.
    pub fn resolved_targets(&self, panel: &Panel) -> Vec<PathBuf> {
        if self.marked.is_empty() {
            return panel.cursor_entry().map(|e| e.path.clone()).into_iter().collect();
        }
        panel
            .index()
            .visible_entries()
            .filter(|entry| self.marked.contains(&entry.name))
            .map(|entry| entry.path.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_ops::LocalExecutor;
    use std::fs;
    use tempfile::TempDir;

    fn panel() -> (TempDir, Panel) {
        let dir = TempDir::new().unwrap();
        for name in ["c.txt", "a.txt", "b.txt"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        let panel = Panel::open(dir.path().to_path_buf(), false, &LocalExecutor::new("true")).unwrap();
        (dir, panel)
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut set = SelectionSet::new();
        assert!(set.toggle("a"));
        assert!(set.is_selected("a"));
        assert!(!set.toggle("a"));
        assert!(set.is_empty());
    }

    #[test]
    fn select_all_counts_new_names_only() {
        let mut set = SelectionSet::new();
        set.toggle("a");
        assert_eq!(set.select_all(["a", "b", "c"]), 2);
        assert_eq!(set.len(), 3);
        assert_eq!(set.clear_all(), 3);
    }

    #[test]
    fn empty_selection_resolves_to_cursor_item() {
        let (dir, mut panel) = panel();
        panel.move_cursor(1, 0);
        let targets = panel.selection().resolved_targets(&panel);
        assert_eq!(targets, vec![dir.path().join("b.txt")]);
    }

    #[test]
    fn marked_names_resolve_in_listing_order() {
        let (dir, mut panel) = panel();
        panel.selection_mut().toggle("c.txt");
        panel.selection_mut().toggle("a.txt");
        let targets = panel.selection().resolved_targets(&panel);
        assert_eq!(targets, vec![dir.path().join("a.txt"), dir.path().join("c.txt")]);
    }

    #[test]
    fn filtered_out_names_are_not_targets() {
        let (dir, mut panel) = panel();
        panel.selection_mut().toggle("a.txt");
        panel.selection_mut().toggle("b.txt");
        panel.set_filter("b.");
        let targets = panel.selection().resolved_targets(&panel);
        assert_eq!(targets, vec![dir.path().join("b.txt")]);
    }

    #[test]
    fn refresh_drops_vanished_names() {
        let (dir, mut panel) = panel();
        panel.selection_mut().toggle("a.txt");
        panel.selection_mut().toggle("b.txt");
        fs::remove_file(dir.path().join("a.txt")).unwrap();
        panel.refresh(&LocalExecutor::new("true")).unwrap();
        assert!(!panel.selection().is_selected("a.txt"));
        assert!(panel.selection().is_selected("b.txt"));
        assert_eq!(panel.selection().len(), 1);
    }
}
