#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use crate::error::{ActionError, PreviewReason, PreviewUnavailable};
use crate::fs_ops::{looks_binary, Executor};
use crate::index::DirectoryIndex;
use crate::model::{Entry, EntryKind, Preview};
use crate::selection::SelectionSet;

const PREVIEW_SAMPLE_BYTES: usize = 4096;

/// What `enter_cursor_item` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entered {
    Directory,
    /// A regular file; the caller asks the executor to open it.
    File(PathBuf),
    Nothing,
}

/// One browsable directory view: listing, marks, cursor and scroll.
#[derive(Debug, Clone)]
pub struct Panel {
    index: DirectoryIndex,
    selection: SelectionSet,
    cursor: Option<usize>,
    scroll: usize,
}

impl Panel {
    pub fn open(path: PathBuf, show_hidden: bool, exec: &impl Executor) -> Result<Self, ActionError> {
        let mut index = DirectoryIndex::new(path, show_hidden);
        index.refresh(exec)?;
        let mut panel = Self { index, selection: SelectionSet::new(), cursor: None, scroll: 0 };
        panel.reclamp(None);
        Ok(panel)
    }

    pub fn path(&self) -> &Path {
        self.index.path()
    }

    pub fn index(&self) -> &DirectoryIndex {
        &self.index
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    pub fn cursor_entry(&self) -> Option<&Entry> {
        self.index.visible_at(self.cursor?)
    }

    pub fn resolved_targets(&self) -> Vec<PathBuf> {
        self.selection.resolved_targets(self)
    }

    pub fn move_cursor(&mut self, delta: isize, view_height: usize) {
        let len = self.index.visible_len();
        if len == 0 {
            self.cursor = None;
            self.scroll = 0;
            return;
        }
        let current = self.cursor.unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.cursor = Some(next);
        self.ensure_visible(view_height);
    }

    pub fn cursor_to_top(&mut self, view_height: usize) {
        self.move_cursor(isize::MIN / 2, view_height);
    }

    pub fn cursor_to_bottom(&mut self, view_height: usize) {
        self.move_cursor(isize::MAX / 2, view_height);
    }

    pub fn ensure_visible(&mut self, view_height: usize) {
        let Some(cursor) = self.cursor else {
            self.scroll = 0;
            return;
        };
        if cursor < self.scroll {
            self.scroll = cursor;
        } else if view_height > 0 && cursor >= self.scroll + view_height {
            self.scroll = cursor.saturating_sub(view_height - 1);
        }
    }

    /// Re-reads the listing, keeping the cursor on the same name if it survived.
    pub fn refresh(&mut self, exec: &impl Executor) -> Result<(), ActionError> {
        let previous = self.cursor_entry().map(|e| e.name.clone());
        self.index.refresh(exec)?;
        self.selection.reconcile(&self.index);
        self.reclamp(previous.as_deref());
        Ok(())
    }

    /// Points the panel at `path`. On failure the panel is left untouched.
    pub fn change_dir(&mut self, path: PathBuf, exec: &impl Executor) -> Result<(), ActionError> {
        let mut index = DirectoryIndex::new(path, self.index.show_hidden());
        index.refresh(exec)?;
        self.index = index;
        self.selection.clear_all();
        self.cursor = None;
        self.scroll = 0;
        self.reclamp(None);
        Ok(())
    }

    pub fn enter_cursor_item(&mut self, exec: &impl Executor) -> Result<Entered, ActionError> {
        let Some(entry) = self.cursor_entry() else {
            return Ok(Entered::Nothing);
        };
        match entry.kind {
            EntryKind::Directory | EntryKind::SymlinkToDir => {
                let path = entry.path.clone();
                self.change_dir(path, exec)?;
                Ok(Entered::Directory)
            }
            EntryKind::File | EntryKind::SymlinkToFile => Ok(Entered::File(entry.path.clone())),
            EntryKind::Other => Ok(Entered::Nothing),
        }
    }

    /// Returns false at the filesystem root.
    pub fn go_parent(&mut self, exec: &impl Executor) -> Result<bool, ActionError> {
        let Some(parent) = self.path().parent().map(Path::to_path_buf) else {
            return Ok(false);
        };
        self.change_dir(parent, exec)?;
        Ok(true)
    }

    pub fn preview_request(&self, exec: &impl Executor, limit: u64) -> Result<Preview, PreviewUnavailable> {
        let declined = |reason| PreviewUnavailable { reason };
        let entry = self.cursor_entry().ok_or(declined(PreviewReason::NoEntry))?;
        match entry.kind {
            EntryKind::Directory | EntryKind::SymlinkToDir => return Err(declined(PreviewReason::IsDirectory)),
            EntryKind::Other => return Err(declined(PreviewReason::Special)),
            EntryKind::File | EntryKind::SymlinkToFile => {}
        }
        if entry.size > limit {
            return Err(declined(PreviewReason::TooLarge));
        }
        let sample = exec.read_head(&entry.path, PREVIEW_SAMPLE_BYTES).map_err(|err| {
            log::warn!("preview of {} failed: {err}", entry.path.display());
            declined(PreviewReason::Unreadable)
        })?;
        if looks_binary(&sample) {
            return Err(declined(PreviewReason::Binary));
        }
        let lines = String::from_utf8_lossy(&sample)
            .lines()
            .map(|line| line.replace('\t', "    "))
            .collect();
        Ok(Preview { name: entry.name.clone(), lines, scroll: 0 })
    }

    /// Toggles the mark on the cursor item; returns its name and new state.
    pub fn toggle_cursor_selection(&mut self) -> Option<(String, bool)> {
        let name = self.cursor_entry()?.name.clone();
        let marked = self.selection.toggle(&name);
        Some((name, marked))
    }

    pub fn select_all_visible(&mut self) -> usize {
        let names: Vec<String> = self.index.visible_entries().map(|e| e.name.clone()).collect();
        self.selection.select_all(names.iter().map(String::as_str))
    }

    pub fn set_hidden(&mut self, show: bool) {
        let previous = self.cursor_entry().map(|e| e.name.clone());
        self.index.set_hidden(show);
        self.reclamp(previous.as_deref());
    }

    pub fn set_filter(&mut self, text: &str) {
        let previous = self.cursor_entry().map(|e| e.name.clone());
        self.index.set_filter(text);
        self.reclamp(previous.as_deref());
    }

    /// Stores the query and moves the cursor to the first hit. Returns whether one exists.
    pub fn set_search(&mut self, text: &str) -> bool {
        self.index.set_search(text);
        self.jump_to_hit(0)
    }

    /// Moves to the next hit after the cursor, wrapping around.
    pub fn search_next(&mut self) -> bool {
        let start = self.cursor.map(|c| c + 1).unwrap_or(0);
        self.jump_to_hit(start)
    }

    /// Puts the cursor on `name` if it is visible.
    pub fn focus_name(&mut self, name: &str) -> bool {
        match self.index.position_of(name) {
            Some(idx) => {
                self.cursor = Some(idx);
                self.ensure_visible(0);
                true
            }
            None => false,
        }
    }

    pub fn clear_search_filter(&mut self) -> bool {
        let active = self.index.filter_text().is_some() || self.index.search_text().is_some();
        let previous = self.cursor_entry().map(|e| e.name.clone());
        self.index.clear_filter();
        self.index.clear_search();
        self.reclamp(previous.as_deref());
        active
    }

    fn jump_to_hit(&mut self, start: usize) -> bool {
        let len = self.index.visible_len();
        if len == 0 {
            return false;
        }
        let hit = (0..len)
            .map(|offset| (start + offset) % len)
            .find(|&idx| self.index.visible_at(idx).is_some_and(|e| self.index.is_search_hit(e)));
        match hit {
            Some(idx) => {
                self.cursor = Some(idx);
                self.ensure_visible(0);
                true
            }
            None => false,
        }
    }

    fn reclamp(&mut self, previous: Option<&str>) {
        let len = self.index.visible_len();
        if len == 0 {
            self.cursor = None;
            self.scroll = 0;
            return;
        }
        let tracked = previous.and_then(|name| self.index.position_of(name));
        self.cursor = Some(tracked.unwrap_or(0));
        self.scroll = self.scroll.min(len - 1);
        self.ensure_visible(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_ops::LocalExecutor;
    use std::fs;
    use tempfile::TempDir;

    fn exec() -> LocalExecutor {
        LocalExecutor::new("true")
    }

    fn fixture() -> (TempDir, Panel) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f1.txt"), vec![b'a'; 1024]).unwrap();
        fs::write(dir.path().join("f2.py"), b"print('hi')\n\tpass\n").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let panel = Panel::open(dir.path().to_path_buf(), false, &exec()).unwrap();
        (dir, panel)
    }

    fn cursor_name(panel: &Panel) -> Option<String> {
        panel.cursor_entry().map(|e| e.name.clone())
    }

    #[test]
    fn cursor_starts_on_first_directory() {
        let (_dir, panel) = fixture();
        assert_eq!(panel.cursor(), Some(0));
        assert_eq!(cursor_name(&panel).as_deref(), Some("sub"));
    }

    #[test]
    fn move_cursor_clamps_to_listing() {
        let (_dir, mut panel) = fixture();
        panel.move_cursor(10, 0);
        assert_eq!(panel.cursor(), Some(2));
        panel.move_cursor(-10, 0);
        assert_eq!(panel.cursor(), Some(0));
    }

    #[test]
    fn empty_directory_has_no_cursor() {
        let dir = TempDir::new().unwrap();
        let mut panel = Panel::open(dir.path().to_path_buf(), false, &exec()).unwrap();
        assert_eq!(panel.cursor(), None);
        panel.move_cursor(1, 10);
        assert_eq!(panel.cursor(), None);
        assert!(panel.resolved_targets().is_empty());
    }

    #[test]
    fn filter_reclamps_cursor_to_first_visible() {
        let (_dir, mut panel) = fixture();
        panel.set_filter(".py");
        let names: Vec<_> = panel.index().visible_entries().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["f2.py"]);
        assert_eq!(panel.cursor(), Some(0));
        assert_eq!(cursor_name(&panel).as_deref(), Some("f2.py"));
    }

    #[test]
    fn refresh_tracks_cursor_by_name() {
        let (dir, mut panel) = fixture();
        panel.move_cursor(2, 0);
        assert_eq!(cursor_name(&panel).as_deref(), Some("f2.py"));
        fs::write(dir.path().join("a0.txt"), b"").unwrap();
        panel.refresh(&exec()).unwrap();
        assert_eq!(cursor_name(&panel).as_deref(), Some("f2.py"));
        assert_eq!(panel.cursor(), Some(3));
    }

    #[test]
    fn refresh_falls_back_to_top_when_cursor_item_vanishes() {
        let (dir, mut panel) = fixture();
        panel.move_cursor(2, 0);
        fs::remove_file(dir.path().join("f2.py")).unwrap();
        panel.refresh(&exec()).unwrap();
        assert_eq!(panel.cursor(), Some(0));
    }

    #[test]
    fn entering_a_directory_resets_cursor_and_selection() {
        let (dir, mut panel) = fixture();
        fs::write(dir.path().join("sub").join("inner.txt"), b"").unwrap();
        panel.selection_mut().toggle("f1.txt");
        assert_eq!(panel.enter_cursor_item(&exec()).unwrap(), Entered::Directory);
        assert_eq!(panel.path(), dir.path().join("sub"));
        assert!(panel.selection().is_empty());
        assert_eq!(cursor_name(&panel).as_deref(), Some("inner.txt"));
    }

    #[test]
    fn entering_a_file_requests_open() {
        let (dir, mut panel) = fixture();
        panel.move_cursor(1, 0);
        let entered = panel.enter_cursor_item(&exec()).unwrap();
        assert_eq!(entered, Entered::File(dir.path().join("f1.txt")));
        assert_eq!(panel.path(), dir.path());
    }

    #[test]
    fn unreadable_directory_keeps_panel_in_place() {
        let (dir, mut panel) = fixture();
        let err = panel.change_dir(dir.path().join("missing"), &exec()).unwrap_err();
        assert!(matches!(err, ActionError::Access { .. }));
        assert_eq!(panel.path(), dir.path());
        assert_eq!(panel.index().visible_len(), 3);
    }

    #[test]
    fn go_parent_is_a_no_op_at_root() {
        let dir = TempDir::new().unwrap();
        let mut panel = Panel::open(dir.path().to_path_buf(), false, &exec()).unwrap();
        assert!(panel.go_parent(&exec()).unwrap());
        assert_eq!(panel.path(), dir.path().parent().unwrap());
        let mut root = Panel::open(PathBuf::from("/"), false, &exec()).unwrap();
        assert!(!root.go_parent(&exec()).unwrap());
        assert_eq!(root.path(), Path::new("/"));
    }

    #[test]
    fn preview_expands_tabs() {
        let (_dir, mut panel) = fixture();
        panel.move_cursor(2, 0);
        let preview = panel.preview_request(&exec(), 512 * 1024).unwrap();
        assert_eq!(preview.name, "f2.py");
        assert_eq!(preview.lines, vec!["print('hi')", "    pass"]);
    }

    #[test]
    fn preview_declines_directories_large_and_binary_files() {
        let (dir, mut panel) = fixture();
        let err = panel.preview_request(&exec(), 512 * 1024).unwrap_err();
        assert_eq!(err.reason, PreviewReason::IsDirectory);

        panel.move_cursor(1, 0);
        let err = panel.preview_request(&exec(), 100).unwrap_err();
        assert_eq!(err.reason, PreviewReason::TooLarge);

        fs::write(dir.path().join("f1.txt"), b"\x7fELF\0\0").unwrap();
        panel.refresh(&exec()).unwrap();
        let err = panel.preview_request(&exec(), 512 * 1024).unwrap_err();
        assert_eq!(err.reason, PreviewReason::Binary);
    }

    #[test]
    fn search_jumps_and_wraps() {
        let (dir, mut panel) = fixture();
        fs::write(dir.path().join("f3.txt"), b"").unwrap();
        panel.refresh(&exec()).unwrap();
        assert!(panel.set_search("TXT"));
        assert_eq!(cursor_name(&panel).as_deref(), Some("f1.txt"));
        assert!(panel.search_next());
        assert_eq!(cursor_name(&panel).as_deref(), Some("f3.txt"));
        assert!(panel.search_next());
        assert_eq!(cursor_name(&panel).as_deref(), Some("f1.txt"));
        assert_eq!(panel.index().visible_len(), 4);
        assert!(!panel.set_search("nomatch"));
    }

    #[test]
    fn toggle_marks_cursor_item() {
        let (_dir, mut panel) = fixture();
        assert_eq!(panel.toggle_cursor_selection(), Some(("sub".to_string(), true)));
        assert_eq!(panel.toggle_cursor_selection(), Some(("sub".to_string(), false)));
        assert_eq!(panel.select_all_visible(), 3);
    }
}
