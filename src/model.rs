#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::error::FsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    SymlinkToDir,
    SymlinkToFile,
    Other,
}

impl EntryKind {
    /// Directories and links to directories sort first and can be entered.
    pub fn is_dir_like(self) -> bool {
        matches!(self, EntryKind::Directory | EntryKind::SymlinkToDir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub permissions: u32,
}

impl Entry {
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    pub fn is_executable(&self) -> bool {
        self.kind == EntryKind::File && self.permissions & 0o111 != 0
    }
}

/// Logical input consumed by the controller. Key decoding lives in `keymap`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    MoveCursor(isize),
    CursorTop,
    CursorBottom,
    Enter,
    Parent,
    Open,
    ToggleSelection,
    SelectAll,
    ClearSelection,
    Copy,
    Cut,
    Paste,
    PasteToOther,
    Delete,
    Rename,
    NewFile,
    NewDir,
    StartSearch,
    SearchNext,
    StartFilter,
    ClearSearchFilter,
    Escape,
    Preview,
    ToggleHidden,
    Refresh,
    ToggleDual,
    SwitchFocus,
    Help,
    Quit,
    InsertChar(char),
    Backspace,
    DeleteChar,
    InputLeft,
    InputRight,
    InputHome,
    InputEnd,
    Confirm,
    Cancel,
    Dismiss,
    Scroll(isize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardMode {
    Copy,
    Cut,
}

/// One planned paste step: put `source` into directory `dest_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteRequest {
    pub mode: ClipboardMode,
    pub source: PathBuf,
    pub dest_dir: PathBuf,
}

impl PasteRequest {
    pub fn target(&self) -> PathBuf {
        match self.source.file_name() {
            Some(name) => self.dest_dir.join(name),
            None => self.dest_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    Search,
    Filter,
    Rename { original: PathBuf },
    NewFileName,
    NewDirName,
    ConfirmDelete { targets: Vec<PathBuf> },
    /// Second step of a delete when some targets are non-empty directories.
    ConfirmRecursive { targets: Vec<PathBuf>, non_empty: Vec<PathBuf> },
    ConfirmOverwrite { conflicts: Vec<PasteRequest> },
}

impl InputKind {
    pub fn takes_text(&self) -> bool {
        !matches!(
            self,
            InputKind::ConfirmDelete { .. } | InputKind::ConfirmRecursive { .. } | InputKind::ConfirmOverwrite { .. }
        )
    }
}

/// Single-line text buffer with a char-indexed cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineInput {
    pub text: String,
    pub cursor: usize,
}

impl LineInput {
    pub fn with_text(text: &str) -> Self {
        Self { text: text.to_string(), cursor: text.chars().count() }
    }

    fn byte_at(&self, cursor: usize) -> usize {
        self.text
            .char_indices()
            .nth(cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, ch: char) {
        let at = self.byte_at(self.cursor);
        self.text.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_at(self.cursor);
        self.text.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let at = self.byte_at(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub name: String,
    pub lines: Vec<String>,
    pub scroll: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    AwaitingInput { kind: InputKind, input: LineInput },
    Previewing(Preview),
    Help { scroll: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    Done,
    Failed(FsError),
    NeedsConfirmation,
    Skipped,
}

/// Aggregated per-path result of a copy, move or delete batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<(PathBuf, PathOutcome)>,
    pub refresh: BTreeSet<PathBuf>,
}

impl BatchReport {
    pub fn count(&self, wanted: fn(&PathOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| wanted(outcome)).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, PathOutcome::Done))
    }

    pub fn failures(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|(path, outcome)| match outcome {
                PathOutcome::Failed(err) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.display().to_string());
                    Some(format!("{name}: {err}"))
                }
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub details: Vec<String>,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: false, details: Vec::new() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: true, details: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit { last_dir: PathBuf },
}
