#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::ActionError;
use crate::fs_ops::Executor;
use crate::pane::Panel;

/// One or two panels and the index of the one receiving input.
#[derive(Debug, Clone)]
pub struct PanelGroup {
    panels: Vec<Panel>,
    focused: usize,
}

impl PanelGroup {
    pub fn new(first: Panel) -> Self {
        Self { panels: vec![first], focused: 0 }
    }

    pub fn is_dual(&self) -> bool {
        self.panels.len() == 2
    }

    pub fn focused_index(&self) -> usize {
        self.focused
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn focused(&self) -> &Panel {
        &self.panels[self.focused]
    }

    pub fn focused_mut(&mut self) -> &mut Panel {
        &mut self.panels[self.focused]
    }

    pub fn other_panel(&self) -> Option<&Panel> {
        if self.is_dual() { self.panels.get(1 - self.focused) } else { None }
    }

    /// Single to dual opens a fresh panel at the focused path; dual to single
    /// keeps only the focused panel.
    pub fn toggle_dual_mode(&mut self, exec: &impl Executor) -> Result<bool, ActionError> {
        if self.is_dual() {
            let kept = self.panels.swap_remove(self.focused);
            self.panels = vec![kept];
            self.focused = 0;
            return Ok(false);
        }
        let focused = self.focused();
        let second = Panel::open(focused.path().to_path_buf(), focused.index().show_hidden(), exec)?;
        self.panels.push(second);
        Ok(true)
    }

    /// Returns false in single mode, where focus cannot move.
    pub fn switch_focus(&mut self) -> bool {
        if !self.is_dual() {
            return false;
        }
        self.focused = 1 - self.focused;
        true
    }

    pub fn set_hidden(&mut self, show: bool) {
        for panel in &mut self.panels {
            panel.set_hidden(show);
        }
    }

    /// Refreshes every panel showing one of `paths`. Errors are returned per
    /// panel path; panels that fail keep their previous listing.
    pub fn refresh_paths(&mut self, paths: &BTreeSet<PathBuf>, exec: &impl Executor) -> Vec<ActionError> {
        let mut errors = Vec::new();
        for panel in &mut self.panels {
            if !paths.contains(panel.path()) {
                continue;
            }
            if let Err(err) = panel.refresh(exec) {
                errors.push(err);
            }
        }
        errors
    }

    pub fn refresh_all(&mut self, exec: &impl Executor) -> Vec<ActionError> {
        let paths = self.panels.iter().map(|p| p.path().to_path_buf()).collect();
        self.refresh_paths(&paths, exec)
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

    fn group() -> (TempDir, PanelGroup) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.txt"), b"1").unwrap();
        fs::write(dir.path().join("two.txt"), b"2").unwrap();
        let panel = Panel::open(dir.path().to_path_buf(), false, &exec()).unwrap();
        (dir, PanelGroup::new(panel))
    }

    #[test]
    fn single_mode_has_no_other_panel() {
        let (_dir, mut group) = group();
        assert!(group.other_panel().is_none());
        assert!(!group.switch_focus());
        assert_eq!(group.focused_index(), 0);
    }

    #[test]
    fn dual_mode_opens_second_panel_at_focused_path() {
        let (dir, mut group) = group();
        assert!(group.toggle_dual_mode(&exec()).unwrap());
        assert!(group.is_dual());
        assert_eq!(group.other_panel().unwrap().path(), dir.path());
    }

    #[test]
    fn switching_focus_twice_preserves_panel_state() {
        let (_dir, mut group) = group();
        group.focused_mut().move_cursor(1, 0);
        group.focused_mut().toggle_cursor_selection();
        group.toggle_dual_mode(&exec()).unwrap();
        assert!(group.switch_focus());
        assert_eq!(group.focused_index(), 1);
        assert!(group.switch_focus());
        assert_eq!(group.focused_index(), 0);
        assert_eq!(group.focused().cursor(), Some(1));
        assert!(group.focused().selection().is_selected("two.txt"));
        assert_eq!(group.other_panel().unwrap().cursor(), Some(0));
        assert!(group.other_panel().unwrap().selection().is_empty());
    }

    #[test]
    fn leaving_dual_mode_keeps_the_focused_panel() {
        let (dir, mut group) = group();
        fs::create_dir(dir.path().join("nested")).unwrap();
        group.refresh_all(&exec());
        group.toggle_dual_mode(&exec()).unwrap();
        group.switch_focus();
        group.focused_mut().enter_cursor_item(&exec()).unwrap();
        assert!(!group.toggle_dual_mode(&exec()).unwrap());
        assert!(!group.is_dual());
        assert_eq!(group.focused_index(), 0);
        assert_eq!(group.focused().path(), dir.path().join("nested"));
    }

    #[test]
    fn refresh_paths_only_touches_matching_panels() {
        let (dir, mut group) = group();
        group.toggle_dual_mode(&exec()).unwrap();
        group.switch_focus();
        fs::create_dir(dir.path().join("nested")).unwrap();
        group.focused_mut().refresh(&exec()).unwrap();
        group.focused_mut().cursor_to_top(0);
        group.focused_mut().enter_cursor_item(&exec()).unwrap();
        assert_eq!(group.focused().path(), dir.path().join("nested"));
        fs::write(dir.path().join("three.txt"), b"3").unwrap();
        let paths = BTreeSet::from([dir.path().to_path_buf()]);
        assert!(group.refresh_paths(&paths, &exec()).is_empty());
        assert_eq!(group.panels()[0].index().visible_len(), 4);
        assert_eq!(group.panels()[1].index().visible_len(), 0);
    }
}
