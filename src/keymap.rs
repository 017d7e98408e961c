#![forbid(unsafe_code)]

use ftui::prelude::KeyCode;

use crate::model::{Action, InputKind, Mode};

/// Key legend shown on the help screen, grouped by section.
pub const KEY_HINTS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("k / Up", "Move up"),
            ("j / Down", "Move down"),
            ("PgUp / PgDn", "Move one page"),
            ("Home / End", "First / last entry"),
            ("Enter / l / Right", "Enter directory or open file"),
            ("Backspace / h / Left", "Parent directory"),
        ],
    ),
    (
        "Selection",
        &[
            ("Space", "Toggle selection"),
            ("a", "Select all"),
            ("A", "Clear selection"),
        ],
    ),
    (
        "Files",
        &[
            ("c", "Copy to clipboard"),
            ("x", "Cut to clipboard"),
            ("v", "Paste here"),
            ("V", "Paste into other panel"),
            ("d / Del", "Delete"),
            ("r", "Rename"),
            ("n", "New file"),
            ("m", "New directory"),
            ("o", "Open with default program"),
            ("p", "Preview"),
        ],
    ),
    (
        "View",
        &[
            ("s / S", "Search / next match"),
            ("f", "Filter by name or extension"),
            ("\\", "Clear search and filter"),
            (".", "Toggle hidden files"),
            ("F5", "Refresh"),
            ("F2", "Toggle dual panel"),
            ("Tab", "Switch panel"),
        ],
    ),
    (
        "General",
        &[
            ("? / F1", "This help"),
            ("Esc", "Clear search/filter, else quit"),
            ("q", "Quit"),
        ],
    ),
];

/// Short hints for the status line.
pub const STATUS_HINTS: &[(&str, &str)] = &[("?", "Help"), ("F2", "Dual"), ("q", "Quit")];

/// Decodes one key press for the current mode. `page` is the panel height.
pub fn action_for(mode: &Mode, code: KeyCode, page: usize) -> Option<Action> {
    let page = page.max(1) as isize;
    match mode {
        Mode::Browsing => browsing(code, page),
        Mode::AwaitingInput { kind, .. } if kind.takes_text() => text_input(code),
        Mode::AwaitingInput { kind: InputKind::ConfirmRecursive { .. }, .. } => Some(confirm_explicit(code)),
        Mode::AwaitingInput { .. } => Some(confirm(code)),
        Mode::Previewing(_) | Mode::Help { .. } => Some(scroll_or_dismiss(code, page)),
    }
}

fn browsing(code: KeyCode, page: isize) -> Option<Action> {
    let action = match code {
        KeyCode::Up | KeyCode::Char('k') => Action::MoveCursor(-1),
        KeyCode::Down | KeyCode::Char('j') => Action::MoveCursor(1),
        KeyCode::PageUp => Action::MoveCursor(-page),
        KeyCode::PageDown => Action::MoveCursor(page),
        KeyCode::Home => Action::CursorTop,
        KeyCode::End => Action::CursorBottom,
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => Action::Enter,
        KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => Action::Parent,
        KeyCode::Char(' ') | KeyCode::Insert => Action::ToggleSelection,
        KeyCode::Char('a') => Action::SelectAll,
        KeyCode::Char('A') => Action::ClearSelection,
        KeyCode::Char('c') => Action::Copy,
        KeyCode::Char('x') => Action::Cut,
        KeyCode::Char('v') => Action::Paste,
        KeyCode::Char('V') => Action::PasteToOther,
        KeyCode::Char('d') | KeyCode::Delete => Action::Delete,
        KeyCode::Char('r') => Action::Rename,
        KeyCode::Char('n') => Action::NewFile,
        KeyCode::Char('m') => Action::NewDir,
        KeyCode::Char('o') => Action::Open,
        KeyCode::Char('p') => Action::Preview,
        KeyCode::Char('s') => Action::StartSearch,
        KeyCode::Char('S') => Action::SearchNext,
        KeyCode::Char('f') => Action::StartFilter,
        KeyCode::Char('\\') => Action::ClearSearchFilter,
        KeyCode::Char('.') => Action::ToggleHidden,
        KeyCode::F(5) => Action::Refresh,
        KeyCode::F(2) => Action::ToggleDual,
        KeyCode::Tab => Action::SwitchFocus,
        KeyCode::Char('?') | KeyCode::F(1) => Action::Help,
        KeyCode::Escape => Action::Escape,
        KeyCode::Char('q') => Action::Quit,
        _ => return None,
    };
    Some(action)
}

fn text_input(code: KeyCode) -> Option<Action> {
    let action = match code {
        KeyCode::Enter => Action::Confirm,
        KeyCode::Escape => Action::Cancel,
        KeyCode::Char(ch) => Action::InsertChar(ch),
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Delete => Action::DeleteChar,
        KeyCode::Left => Action::InputLeft,
        KeyCode::Right => Action::InputRight,
        KeyCode::Home => Action::InputHome,
        KeyCode::End => Action::InputEnd,
        _ => return None,
    };
    Some(action)
}

/// Yes/no prompts: anything but `y` or Enter declines.
fn confirm(code: KeyCode) -> Action {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Action::Confirm,
        _ => Action::Cancel,
    }
}

/// Recursive delete: only `y` confirms, so a repeated Enter cannot.
fn confirm_explicit(code: KeyCode) -> Action {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') => Action::Confirm,
        _ => Action::Cancel,
    }
}

fn scroll_or_dismiss(code: KeyCode, page: isize) -> Action {
    match code {
        KeyCode::Up | KeyCode::Char('k') => Action::Scroll(-1),
        KeyCode::Down | KeyCode::Char('j') => Action::Scroll(1),
        KeyCode::PageUp => Action::Scroll(-page),
        KeyCode::PageDown => Action::Scroll(page),
        _ => Action::Dismiss,
    }
}

/// Prompt title for a pending input.
pub fn prompt_title(kind: &InputKind) -> String {
    match kind {
        InputKind::Search => "Search".to_string(),
        InputKind::Filter => "Filter (name or extension)".to_string(),
        InputKind::Rename { .. } => "Rename to".to_string(),
        InputKind::NewFileName => "New file name".to_string(),
        InputKind::NewDirName => "New directory name".to_string(),
        InputKind::ConfirmDelete { targets } => match targets.as_slice() {
            [single] => format!(
                "Delete {}? (y/n)",
                single.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
            ),
            many => format!("Delete {} items? (y/n)", many.len()),
        },
        InputKind::ConfirmRecursive { non_empty, .. } => match non_empty.as_slice() {
            [single] => format!(
                "{} is not empty. Delete everything inside? (y/n)",
                single.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
            ),
            many => format!("{} directories are not empty. Delete everything inside? (y/n)", many.len()),
        },
        InputKind::ConfirmOverwrite { conflicts } => {
            format!("{} item(s) already exist. Overwrite? (y/n)", conflicts.len())
        }
    }
}

/// Help screen text built from [`KEY_HINTS`].
pub fn help_lines() -> Vec<String> {
    let mut lines = Vec::new();
    for (section, keys) in KEY_HINTS {
        lines.push(section.to_string());
        for (key, description) in keys.iter() {
            lines.push(format!("  {key:<24}{description}"));
        }
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LineInput, Preview};
    use std::path::PathBuf;

    fn input(kind: InputKind) -> Mode {
        Mode::AwaitingInput { kind, input: LineInput::default() }
    }

    #[test]
    fn browsing_keys() {
        let mode = Mode::Browsing;
        assert_eq!(action_for(&mode, KeyCode::Char('j'), 20), Some(Action::MoveCursor(1)));
        assert_eq!(action_for(&mode, KeyCode::PageUp, 20), Some(Action::MoveCursor(-20)));
        assert_eq!(action_for(&mode, KeyCode::PageDown, 0), Some(Action::MoveCursor(1)));
        assert_eq!(action_for(&mode, KeyCode::Char('V'), 20), Some(Action::PasteToOther));
        assert_eq!(action_for(&mode, KeyCode::Escape, 20), Some(Action::Escape));
        assert_eq!(action_for(&mode, KeyCode::Char('z'), 20), None);
    }

    #[test]
    fn text_prompts_take_every_char() {
        let mode = input(InputKind::Search);
        assert_eq!(action_for(&mode, KeyCode::Char('q'), 20), Some(Action::InsertChar('q')));
        assert_eq!(action_for(&mode, KeyCode::Enter, 20), Some(Action::Confirm));
        assert_eq!(action_for(&mode, KeyCode::Escape, 20), Some(Action::Cancel));
        assert_eq!(action_for(&mode, KeyCode::Tab, 20), None);
    }

    #[test]
    fn confirmations_decline_by_default() {
        let mode = input(InputKind::ConfirmDelete { targets: vec![PathBuf::from("/t/a")] });
        assert_eq!(action_for(&mode, KeyCode::Char('y'), 20), Some(Action::Confirm));
        assert_eq!(action_for(&mode, KeyCode::Char('n'), 20), Some(Action::Cancel));
        assert_eq!(action_for(&mode, KeyCode::Char('q'), 20), Some(Action::Cancel));
    }

    #[test]
    fn recursive_delete_needs_an_explicit_yes() {
        let dir = PathBuf::from("/t/build");
        let mode = input(InputKind::ConfirmRecursive { targets: vec![dir.clone()], non_empty: vec![dir] });
        assert_eq!(action_for(&mode, KeyCode::Char('y'), 20), Some(Action::Confirm));
        assert_eq!(action_for(&mode, KeyCode::Enter, 20), Some(Action::Cancel));
        assert_eq!(action_for(&mode, KeyCode::Char('n'), 20), Some(Action::Cancel));
    }

    #[test]
    fn overlays_scroll_or_close() {
        let mode = Mode::Previewing(Preview { name: "a".into(), lines: Vec::new(), scroll: 0 });
        assert_eq!(action_for(&mode, KeyCode::Down, 20), Some(Action::Scroll(1)));
        assert_eq!(action_for(&mode, KeyCode::Char('q'), 20), Some(Action::Dismiss));
        let help = Mode::Help { scroll: 0 };
        assert_eq!(action_for(&help, KeyCode::PageDown, 5), Some(Action::Scroll(5)));
    }

    #[test]
    fn prompt_titles_name_the_target() {
        let kind = InputKind::ConfirmDelete { targets: vec![PathBuf::from("/t/report.txt")] };
        assert_eq!(prompt_title(&kind), "Delete report.txt? (y/n)");
        let dirs = vec![PathBuf::from("/t/a"), PathBuf::from("/t/b")];
        let kind = InputKind::ConfirmRecursive { targets: dirs.clone(), non_empty: dirs[..1].to_vec() };
        assert_eq!(prompt_title(&kind), "a is not empty. Delete everything inside? (y/n)");
        let kind = InputKind::ConfirmRecursive { targets: dirs.clone(), non_empty: dirs };
        assert_eq!(prompt_title(&kind), "2 directories are not empty. Delete everything inside? (y/n)");
    }

    #[test]
    fn help_lists_every_section() {
        let lines = help_lines();
        for (section, keys) in KEY_HINTS {
            assert!(lines.iter().any(|l| l == section));
            assert!(keys.iter().all(|(key, _)| lines.iter().any(|l| l.trim_start().starts_with(key))));
        }
    }
}
