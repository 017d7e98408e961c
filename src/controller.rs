#![forbid(unsafe_code)]

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::clipboard::Clipboard;
use crate::config::Settings;
use crate::error::{ActionError, FsError};
use crate::fs_ops::{write_exit_marker, Executor};
use crate::group::PanelGroup;
use crate::keymap::help_lines;
use crate::model::{
    Action, BatchReport, ClipboardMode, EntryKind, InputKind, LineInput, Mode, Outcome, PasteRequest, PathOutcome,
    StatusMessage,
};
use crate::pane::{Entered, Panel};

/// Most failure lines carried into the message bar.
const MAX_DETAILS: usize = 3;

/// Owns the browser session and turns each [`Action`] into state changes and
/// executor requests.
#[derive(Debug)]
pub struct ActionController<E: Executor> {
    group: PanelGroup,
    clipboard: Clipboard,
    mode: Mode,
    status: StatusMessage,
    exec: E,
    show_hidden: bool,
    preview_limit: u64,
    exit_marker: Option<PathBuf>,
    view_height: usize,
    last_report: Option<BatchReport>,
}

impl<E: Executor> ActionController<E> {
    pub fn new(start: PathBuf, settings: &Settings, exit_marker: Option<PathBuf>, exec: E) -> Result<Self, ActionError> {
        let panel = Panel::open(start, settings.show_hidden, &exec)?;
        let mut group = PanelGroup::new(panel);
        if settings.dual_panel {
            group.toggle_dual_mode(&exec)?;
        }
        Ok(Self {
            group,
            clipboard: Clipboard::new(),
            mode: Mode::Browsing,
            status: StatusMessage::info("Press ? for help"),
            exec,
            show_hidden: settings.show_hidden,
            preview_limit: settings.preview_limit_bytes(),
            exit_marker,
            view_height: 0,
            last_report: None,
        })
    }

    pub fn group(&self) -> &PanelGroup {
        &self.group
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    pub fn last_report(&self) -> Option<&BatchReport> {
        self.last_report.as_ref()
    }

    pub fn executor(&self) -> &E {
        &self.exec
    }

    /// Rows available to a panel listing; used for scrolling and page moves.
    pub fn set_view_height(&mut self, rows: usize) {
        self.view_height = rows;
    }

    pub fn handle(&mut self, action: Action) -> Outcome {
        log::debug!("action {action:?}");
        match std::mem::replace(&mut self.mode, Mode::Browsing) {
            Mode::Browsing => self.handle_browsing(action),
            Mode::AwaitingInput { kind, input } => {
                self.handle_input(kind, input, action);
                Outcome::Continue
            }
            Mode::Previewing(mut preview) => {
                if let Action::Scroll(delta) = action {
                    let last = preview.lines.len().saturating_sub(1);
                    preview.scroll = offset(preview.scroll, delta).min(last);
                    self.mode = Mode::Previewing(preview);
                }
                Outcome::Continue
            }
            Mode::Help { scroll } => {
                if let Action::Scroll(delta) = action {
                    let last = help_lines().len().saturating_sub(1);
                    self.mode = Mode::Help { scroll: offset(scroll, delta).min(last) };
                }
                Outcome::Continue
            }
        }
    }

    fn handle_browsing(&mut self, action: Action) -> Outcome {
        let height = self.view_height;
        match action {
            Action::MoveCursor(delta) => self.group.focused_mut().move_cursor(delta, height),
            Action::CursorTop => self.group.focused_mut().cursor_to_top(height),
            Action::CursorBottom => self.group.focused_mut().cursor_to_bottom(height),
            Action::Enter => self.enter(),
            Action::Open => self.open_cursor_file(),
            Action::Parent => match self.group.focused_mut().go_parent(&self.exec) {
                Ok(true) => {}
                Ok(false) => self.info("Already at the root directory"),
                Err(err) => self.fail(err),
            },
            Action::ToggleSelection => self.toggle_selection(),
            Action::SelectAll => {
                let added = self.group.focused_mut().select_all_visible();
                if added == 0 {
                    self.info("All files already selected");
                } else {
                    self.info(format!("Selected {added} more item(s)"));
                }
            }
            Action::ClearSelection => {
                let cleared = self.group.focused_mut().selection_mut().clear_all();
                if cleared == 0 {
                    self.info("No items selected");
                } else {
                    self.info(format!("Cleared {cleared} selection(s)"));
                }
            }
            Action::Copy => self.fill_clipboard(ClipboardMode::Copy),
            Action::Cut => self.fill_clipboard(ClipboardMode::Cut),
            Action::Paste => {
                let dest = self.group.focused().path().to_path_buf();
                self.paste(&dest);
            }
            Action::PasteToOther => match self.group.other_panel() {
                Some(other) => {
                    let dest = other.path().to_path_buf();
                    self.paste(&dest);
                }
                None => self.error("Paste to other panel needs dual panel mode"),
            },
            Action::Delete => {
                let targets = self.group.focused().resolved_targets();
                if targets.is_empty() {
                    self.error("No item to delete");
                } else {
                    self.prompt(InputKind::ConfirmDelete { targets }, "");
                }
            }
            Action::Rename => self.start_rename(),
            Action::NewFile => self.prompt(InputKind::NewFileName, ""),
            Action::NewDir => self.prompt(InputKind::NewDirName, ""),
            Action::StartSearch => {
                let current = self.group.focused().index().search_text().unwrap_or("").to_string();
                self.prompt(InputKind::Search, &current);
            }
            Action::StartFilter => {
                let current = self.group.focused().index().filter_text().unwrap_or("").to_string();
                self.prompt(InputKind::Filter, &current);
            }
            Action::SearchNext => {
                let panel = self.group.focused_mut();
                match panel.index().search_text().map(str::to_string) {
                    None => self.error("No active search"),
                    Some(text) if !panel.search_next() => self.error(format!("No match for '{text}'")),
                    Some(_) => {}
                }
            }
            Action::ClearSearchFilter => {
                if self.group.focused_mut().clear_search_filter() {
                    self.info("Search and filter cleared");
                }
            }
            Action::Escape => {
                if self.group.focused_mut().clear_search_filter() {
                    self.info("Search and filter cleared");
                } else {
                    return self.quit();
                }
            }
            Action::Preview => match self.group.focused().preview_request(&self.exec, self.preview_limit) {
                Ok(preview) => self.mode = Mode::Previewing(preview),
                Err(declined) => self.error(format!("Cannot preview: {declined}")),
            },
            Action::ToggleHidden => {
                self.show_hidden = !self.show_hidden;
                self.group.set_hidden(self.show_hidden);
                self.info(if self.show_hidden { "Showing hidden files" } else { "Hiding hidden files" });
            }
            Action::Refresh => {
                let errors = self.group.refresh_all(&self.exec);
                match errors.into_iter().next() {
                    Some(err) => self.fail(err),
                    None => self.info("Refreshed"),
                }
            }
            Action::ToggleDual => match self.group.toggle_dual_mode(&self.exec) {
                Ok(true) => self.info("Dual panel mode, Tab switches panels"),
                Ok(false) => self.info("Single panel mode"),
                Err(err) => self.fail(err),
            },
            Action::SwitchFocus => {
                if !self.group.switch_focus() {
                    self.error("Tab only works in dual panel mode");
                }
            }
            Action::Help => self.mode = Mode::Help { scroll: 0 },
            Action::Quit => return self.quit(),
            _ => {}
        }
        Outcome::Continue
    }

    fn handle_input(&mut self, kind: InputKind, mut input: LineInput, action: Action) {
        match action {
            Action::Confirm => self.submit(kind, input.text),
            Action::Cancel => self.cancelled(kind),
            Action::InsertChar(ch) if kind.takes_text() => {
                input.insert(ch);
                self.mode = Mode::AwaitingInput { kind, input };
            }
            edit if kind.takes_text() => {
                match edit {
                    Action::Backspace => input.backspace(),
                    Action::DeleteChar => input.delete(),
                    Action::InputLeft => input.left(),
                    Action::InputRight => input.right(),
                    Action::InputHome => input.home(),
                    Action::InputEnd => input.end(),
                    _ => {}
                }
                self.mode = Mode::AwaitingInput { kind, input };
            }
            _ => self.mode = Mode::AwaitingInput { kind, input },
        }
    }

    fn submit(&mut self, kind: InputKind, text: String) {
        match kind {
            InputKind::Search => {
                let panel = self.group.focused_mut();
                if text.trim().is_empty() {
                    panel.clear_search_filter();
                    self.info("Search and filter cleared");
                } else if panel.set_search(&text) {
                    self.info(format!("Searching for '{}'", text.trim()));
                } else {
                    self.error(format!("No match for '{}'", text.trim()));
                }
            }
            InputKind::Filter => {
                let panel = self.group.focused_mut();
                if text.trim().is_empty() {
                    panel.clear_search_filter();
                    self.info("Search and filter cleared");
                } else {
                    panel.set_filter(&text);
                    let shown = panel.index().visible_len();
                    self.info(format!("Filter '{}': {shown} item(s)", text.trim()));
                }
            }
            InputKind::Rename { original } => self.rename(&original, &text),
            InputKind::NewFileName => self.create(&text, false),
            InputKind::NewDirName => self.create(&text, true),
            InputKind::ConfirmDelete { targets } => {
                let non_empty = self.non_empty_dirs(&targets);
                if non_empty.is_empty() {
                    self.delete(targets);
                } else {
                    self.prompt(InputKind::ConfirmRecursive { targets, non_empty }, "");
                }
            }
            InputKind::ConfirmRecursive { targets, .. } => self.delete(targets),
            InputKind::ConfirmOverwrite { conflicts } => self.overwrite(conflicts),
        }
    }

    fn cancelled(&mut self, kind: InputKind) {
        let what = match kind {
            InputKind::Search => "Search cancelled",
            InputKind::Filter => "Filter cancelled",
            InputKind::Rename { .. } => "Rename cancelled",
            InputKind::NewFileName | InputKind::NewDirName => "Create cancelled",
            InputKind::ConfirmDelete { .. } | InputKind::ConfirmRecursive { .. } => "Delete cancelled",
            InputKind::ConfirmOverwrite { conflicts } => {
                let mut report = BatchReport::default();
                for request in conflicts {
                    report.outcomes.push((request.source, PathOutcome::Skipped));
                }
                return self.finish_batch(report, "Existing items skipped".to_string());
            }
        };
        self.info(what);
    }

    /// Targets that are real directories with at least one entry. Links to
    /// directories are removed as links and never count.
    fn non_empty_dirs(&self, targets: &[PathBuf]) -> Vec<PathBuf> {
        let entries = self.group.focused().index().entries();
        targets
            .iter()
            .filter(|path| {
                entries
                    .iter()
                    .any(|entry| &entry.path == *path && entry.kind == EntryKind::Directory)
            })
            .filter(|path| !self.exec.list_directory(path).is_ok_and(|listing| listing.is_empty()))
            .cloned()
            .collect()
    }

    fn enter(&mut self) {
        match self.group.focused_mut().enter_cursor_item(&self.exec) {
            Ok(Entered::File(path)) => self.open_path(&path),
            Ok(Entered::Directory | Entered::Nothing) => {}
            Err(err) => self.fail(err),
        }
    }

    fn open_cursor_file(&mut self) {
        let Some(entry) = self.group.focused().cursor_entry() else {
            return;
        };
        if entry.kind.is_dir_like() {
            self.error("Open works on files, use Enter for directories");
            return;
        }
        let path = entry.path.clone();
        self.open_path(&path);
    }

    fn open_path(&mut self, path: &Path) {
        match self.exec.open_with_default_handler(path) {
            Ok(()) => self.info(format!("Opening {}...", display_name(path))),
            Err(err) => self.fail(ActionError::from_fs(path.to_path_buf(), err)),
        }
    }

    fn toggle_selection(&mut self) {
        let panel = self.group.focused_mut();
        let Some((name, marked)) = panel.toggle_cursor_selection() else {
            return;
        };
        if marked {
            self.info(format!("Selected: {name}"));
        } else {
            self.info(format!("Deselected: {name}"));
        }
    }

    fn fill_clipboard(&mut self, mode: ClipboardMode) {
        let paths = self.group.focused().resolved_targets();
        if paths.is_empty() {
            self.error("No item selected");
            return;
        }
        let verb = match mode {
            ClipboardMode::Copy => "Copied",
            ClipboardMode::Cut => "Cut",
        };
        let text = match paths.as_slice() {
            [single] => format!("{verb} {} to clipboard", display_name(single)),
            many => format!("{verb} {} item(s) to clipboard", many.len()),
        };
        self.clipboard.set_from(mode, paths);
        self.info(text);
    }

    fn start_rename(&mut self) {
        let panel = self.group.focused();
        if !panel.selection().is_empty() {
            self.fail(ActionError::AmbiguousTarget);
            return;
        }
        let Some(entry) = panel.cursor_entry() else {
            self.error("No item to rename");
            return;
        };
        let (original, name) = (entry.path.clone(), entry.name.clone());
        self.prompt(InputKind::Rename { original }, &name);
    }

    fn rename(&mut self, original: &Path, text: &str) {
        let name = match validate_name(text) {
            Ok(Some(name)) => name,
            Ok(None) => return self.info("Rename cancelled"),
            Err(err) => return self.fail(err),
        };
        if original.file_name().is_some_and(|current| current == name.as_str()) {
            return self.info("Name unchanged");
        }
        let parent = original.parent().unwrap_or(Path::new("/")).to_path_buf();
        let renamed = parent.join(&name);
        if let Err(err) = self.exec.rename(original, &renamed) {
            return self.fail(ActionError::from_fs(renamed, err));
        }
        self.refresh_one(parent, &name);
        self.info(format!("Renamed {} to {name}", display_name(original)));
    }

    fn create(&mut self, text: &str, directory: bool) {
        let name = match validate_name(text) {
            Ok(Some(name)) => name,
            Ok(None) => return self.info("Create cancelled"),
            Err(err) => return self.fail(err),
        };
        let dir = self.group.focused().path().to_path_buf();
        let path = dir.join(&name);
        let result = if directory { self.exec.mkdir(&path) } else { self.exec.create_file(&path) };
        if let Err(err) = result {
            return self.fail(ActionError::from_fs(path, err));
        }
        self.refresh_one(dir, &name);
        if directory {
            self.info(format!("Created directory {name}"));
        } else {
            self.info(format!("Created file {name}"));
        }
    }

    fn delete(&mut self, targets: Vec<PathBuf>) {
        let mut report = BatchReport::default();
        for path in targets {
            let outcome = match self.exec.delete(&path) {
                Ok(()) => PathOutcome::Done,
                Err(err) => PathOutcome::Failed(err),
            };
            if let Some(parent) = path.parent() {
                report.refresh.insert(parent.to_path_buf());
            }
            report.outcomes.push((path, outcome));
        }
        let done = report.succeeded();
        self.finish_batch(report, format!("Deleted {done} item(s)"));
    }

    /// Runs every non-conflicting request right away and parks the rest
    /// behind a single overwrite prompt.
    fn paste(&mut self, dest: &Path) {
        let batch = match self.clipboard.paste_into(dest) {
            Ok(batch) => batch,
            Err(err) => return self.fail(err),
        };
        let existing: HashSet<String> = match self.exec.list_directory(dest) {
            Ok(entries) => entries.into_iter().map(|e| e.name).collect(),
            Err(err) => return self.fail(ActionError::from_fs(dest.to_path_buf(), err)),
        };
        let mode = batch.requests.first().map(|r| r.mode).unwrap_or(ClipboardMode::Copy);
        let mut report = BatchReport::default();
        let mut conflicts = Vec::new();
        for request in batch.requests {
            let target = request.target();
            let taken = target
                .file_name()
                .is_some_and(|name| existing.contains(&*name.to_string_lossy()));
            if taken {
                let outcome = if target == request.source {
                    PathOutcome::Failed(FsError::AlreadyExists)
                } else {
                    PathOutcome::NeedsConfirmation
                };
                report.outcomes.push((request.source.clone(), outcome));
                if target != request.source {
                    conflicts.push(request);
                }
                continue;
            }
            let outcome = self.transfer(&request);
            record(&mut report, request, outcome);
        }
        if mode == ClipboardMode::Cut && report.succeeded() > 0 {
            self.clipboard.clear();
        }
        let summary = paste_summary(mode, report.succeeded());
        self.finish_batch(report, summary);
        if !conflicts.is_empty() {
            self.prompt(InputKind::ConfirmOverwrite { conflicts }, "");
        }
    }

    fn overwrite(&mut self, conflicts: Vec<PasteRequest>) {
        let mode = conflicts.first().map(|r| r.mode).unwrap_or(ClipboardMode::Copy);
        let mut report = BatchReport::default();
        for request in conflicts {
            let outcome = match self.exec.delete(&request.target()) {
                Ok(()) => self.transfer(&request),
                Err(err) => PathOutcome::Failed(err),
            };
            report.refresh.insert(request.dest_dir.clone());
            record(&mut report, request, outcome);
        }
        if mode == ClipboardMode::Cut && report.succeeded() > 0 {
            self.clipboard.clear();
        }
        let summary = paste_summary(mode, report.succeeded());
        self.finish_batch(report, summary);
    }

    fn transfer(&mut self, request: &PasteRequest) -> PathOutcome {
        let result = match request.mode {
            ClipboardMode::Copy => self.exec.copy(&request.source, &request.dest_dir),
            ClipboardMode::Cut => self.exec.move_path(&request.source, &request.dest_dir),
        };
        match result {
            Ok(()) => PathOutcome::Done,
            Err(err) => PathOutcome::Failed(err),
        }
    }

    fn finish_batch(&mut self, report: BatchReport, summary: String) {
        let mut failures = report.failures();
        for err in self.group.refresh_paths(&report.refresh, &self.exec) {
            log::warn!("refresh after batch failed: {err}");
            failures.push(err.to_string());
        }
        self.status = if failures.is_empty() {
            StatusMessage::info(summary)
        } else {
            let mut status = StatusMessage::error(format!("{summary}, {} failed", failures.len()));
            status.details = failures.into_iter().take(MAX_DETAILS).collect();
            status
        };
        self.last_report = Some(report);
    }

    fn refresh_one(&mut self, dir: PathBuf, focus: &str) {
        let paths: BTreeSet<PathBuf> = [dir].into_iter().collect();
        for err in self.group.refresh_paths(&paths, &self.exec) {
            log::warn!("refresh failed: {err}");
        }
        self.group.focused_mut().focus_name(focus);
        let height = self.view_height;
        self.group.focused_mut().ensure_visible(height);
    }

    fn quit(&mut self) -> Outcome {
        let last_dir = self.group.focused().path().to_path_buf();
        if let Some(marker) = &self.exit_marker {
            if let Err(err) = write_exit_marker(marker, &last_dir) {
                log::error!("cannot write exit marker {}: {err}", marker.display());
            }
        }
        log::info!("quitting in {}", last_dir.display());
        Outcome::Quit { last_dir }
    }

    fn prompt(&mut self, kind: InputKind, text: &str) {
        self.mode = Mode::AwaitingInput { kind, input: LineInput::with_text(text) };
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = StatusMessage::info(text);
    }

    fn error(&mut self, text: impl Into<String>) {
        self.status = StatusMessage::error(text);
    }

    fn fail(&mut self, err: ActionError) {
        log::warn!("{err}");
        self.status = StatusMessage::error(format!("Error: {err}"));
    }
}

fn record(report: &mut BatchReport, request: PasteRequest, outcome: PathOutcome) {
    if outcome == PathOutcome::Done {
        report.refresh.insert(request.dest_dir);
        if let Some(parent) = request.source.parent() {
            report.refresh.insert(parent.to_path_buf());
        }
    }
    report.outcomes.push((request.source, outcome));
}

/// `Ok(None)` means the user left the prompt blank.
fn validate_name(text: &str) -> Result<Option<String>, ActionError> {
    let name = text.trim();
    if name.is_empty() {
        return Ok(None);
    }
    if name.contains('/') || name.contains('\0') || name == "." || name == ".." {
        return Err(ActionError::InvalidName(name.to_string()));
    }
    Ok(Some(name.to_string()))
}

fn paste_summary(mode: ClipboardMode, done: usize) -> String {
    match mode {
        ClipboardMode::Copy => format!("Copied {done} item(s)"),
        ClipboardMode::Cut => format!("Moved {done} item(s)"),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn offset(value: usize, delta: isize) -> usize {
    if delta < 0 { value.saturating_sub(delta.unsigned_abs()) } else { value.saturating_add(delta as usize) }
}
