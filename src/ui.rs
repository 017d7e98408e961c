#![forbid(unsafe_code)]

use ftui::core::geometry::Rect;
use ftui::layout::{Constraint, Flex};
use ftui::style::Style;
use ftui::text::{Text, WrapMode, display_width};
use ftui::widgets::block::Block;
use ftui::widgets::borders::Borders;
use ftui::widgets::paragraph::Paragraph;
use ftui::widgets::status_line::{StatusItem, StatusLine};
use ftui::widgets::table::{Row, Table, TableState};
use ftui::widgets::{StatefulWidget, Widget};
use ftui::Frame;

use crate::app::ThemeColors;
use crate::clipboard::Clipboard;
use crate::fs_ops::{format_size, format_time};
use crate::group::PanelGroup;
use crate::keymap::{help_lines, prompt_title, STATUS_HINTS};
use crate::model::{ClipboardMode, EntryKind, InputKind, LineInput, Mode, Preview, StatusMessage};
use crate::pane::Panel;

pub const STATUS_HEIGHT: u16 = 1;
pub const KEYBAR_HEIGHT: u16 = 1;
pub const HEADER_HEIGHT: u16 = 1;
/// Border rows plus the header row around a panel listing.
const PANEL_CHROME: u16 = 2 + HEADER_HEIGHT;
const DIALOG_LIST_MAX: usize = 5;

/// Geometry remembered between frames for key handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutCache {
    pub list_height: usize,
}

/// Read-only view of the session handed to the renderer.
pub struct Screen<'a> {
    pub group: &'a PanelGroup,
    pub clipboard: &'a Clipboard,
    pub status: &'a StatusMessage,
    pub show_hidden: bool,
}

pub fn render_background(frame: &mut Frame, theme: ThemeColors) {
    let full = Rect::new(0, 0, frame.width(), frame.height());
    let background = Block::new().style(Style::new().fg(theme.panel_fg).bg(theme.screen_bg));
    background.render(full, frame);
}

pub fn render_layout(frame: &mut Frame, screen: &Screen<'_>, theme: ThemeColors) -> LayoutCache {
    let full = Rect::new(0, 0, frame.width(), frame.height());
    let message_height = 1 + screen.status.details.len() as u16;
    let layout = Flex::vertical().constraints([
        Constraint::Fill,
        Constraint::Fixed(STATUS_HEIGHT),
        Constraint::Fixed(message_height),
        Constraint::Fixed(KEYBAR_HEIGHT),
    ]);
    let areas = layout.split(full);
    let body_area = areas[0];

    let group = screen.group;
    let mut table_area = body_area;
    if group.is_dual() {
        let columns = Flex::horizontal().constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)]);
        let col_areas = columns.split(body_area);
        for (idx, panel) in group.panels().iter().enumerate() {
            let active = idx == group.focused_index();
            render_panel(frame, col_areas[idx], panel, active, theme);
            if active {
                table_area = col_areas[idx];
            }
        }
    } else {
        render_panel(frame, body_area, group.focused(), true, theme);
    }

    render_status(frame, areas[1], screen, theme);
    render_message(frame, areas[2], screen.status, theme);
    render_keybar(frame, areas[3], theme);

    LayoutCache { list_height: table_area.height.saturating_sub(PANEL_CHROME) as usize }
}

pub fn render_panel(frame: &mut Frame, area: Rect, panel: &Panel, active: bool, theme: ThemeColors) {
    let border_color = if active { theme.panel_border_active } else { theme.panel_border_inactive };
    let index = panel.index();
    let mut title = panel.path().display().to_string();
    if let Some(filter) = index.filter_text() {
        title.push_str(&format!(" [filter: {filter}]"));
    }
    let block = Block::bordered()
        .borders(Borders::ALL)
        .border_style(Style::new().fg(border_color))
        .style(Style::new().fg(theme.panel_fg).bg(theme.panel_bg))
        .title(title.as_str());

    let header = Row::new(["Name", "Size", "Modified", "Mode"])
        .style(Style::new().fg(theme.header_fg).bg(theme.header_bg))
        .height(HEADER_HEIGHT);

    let rows = index
        .visible_entries()
        .map(|entry| {
            let is_marked = panel.selection().is_selected(&entry.name);
            let marker = if is_marked { "*" } else { " " };
            let suffix = match entry.kind {
                EntryKind::Directory => "/",
                EntryKind::SymlinkToDir => "@/",
                EntryKind::SymlinkToFile => "@",
                EntryKind::File | EntryKind::Other => "",
            };
            let name = format!("{marker}{}{suffix}", entry.name);
            let size = if entry.kind.is_dir_like() { "<DIR>".to_string() } else { format_size(entry.size) };
            let mode = format!("{:03o}", entry.permissions & 0o777);
            let mut row = Row::new([name, size, format_time(entry.modified), mode]).height(1);
            if entry.kind.is_dir_like() {
                row = row.style(Style::new().fg(theme.dir_fg).bg(theme.panel_bg));
            } else if entry.is_executable() {
                row = row.style(Style::new().fg(theme.exec_fg).bg(theme.panel_bg));
            }
            if index.is_search_hit(entry) {
                row = row.style(Style::new().fg(theme.panel_fg).bg(theme.search_bg));
            }
            if is_marked {
                row = row.style(Style::new().fg(theme.marked_fg).bg(theme.panel_bg));
            }
            row
        })
        .collect::<Vec<_>>();

    let widths = [Constraint::Fill, Constraint::Fixed(7), Constraint::Fixed(16), Constraint::Fixed(4)];

    let highlight_style = if active {
        Style::new().fg(theme.selection_fg).bg(theme.selection_bg)
    } else {
        Style::new().fg(theme.panel_fg).bg(theme.panel_bg)
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .style(Style::new().fg(theme.panel_fg).bg(theme.panel_bg))
        .highlight_style(highlight_style);

    let mut state = TableState::default();
    state.select(panel.cursor());
    state.offset = panel.scroll_offset();
    StatefulWidget::render(&table, area, frame, &mut state);
}

pub fn render_status(frame: &mut Frame, area: Rect, screen: &Screen<'_>, theme: ThemeColors) {
    let bg = Block::new().style(Style::new().fg(theme.status_fg).bg(theme.status_bg));
    bg.render(area, frame);
    let line = status_text(screen);
    let right = match (screen.clipboard.mode(), screen.clipboard.paths().len()) {
        (Some(ClipboardMode::Copy), n) => format!("Clipboard: {n} to copy "),
        (Some(ClipboardMode::Cut), n) => format!("Clipboard: {n} to move "),
        (None, _) => String::new(),
    };
    let spacing = area
        .width
        .saturating_sub(display_width(&line) as u16 + display_width(&right) as u16);
    let line = format!("{}{}{}", line, " ".repeat(spacing as usize), right);
    let paragraph = Paragraph::new(Text::from(line)).style(Style::new().fg(theme.status_fg).bg(theme.status_bg));
    paragraph.render(area, frame);
}

/// Panel number, counts, cursor item, hidden flag and active search/filter.
pub fn status_text(screen: &Screen<'_>) -> String {
    let group = screen.group;
    let panel = group.focused();
    let index = panel.index();
    let mut parts = Vec::new();
    if group.is_dual() {
        parts.push(format!("Panel {}/2", group.focused_index() + 1));
    }
    parts.push(format!("{} items", index.visible_len()));
    let marked = panel.selection().len();
    if marked > 0 {
        parts.push(format!("{marked} selected"));
    } else if let Some(entry) = panel.cursor_entry() {
        parts.push(entry.name.clone());
    }
    parts.push(format!("Hidden: {}", if screen.show_hidden { "ON" } else { "OFF" }));
    if let Some(search) = index.search_text() {
        parts.push(format!("Search: {search}"));
    }
    if let Some(filter) = index.filter_text() {
        parts.push(format!("Filter: {filter}"));
    }
    format!(" {}", parts.join(" | "))
}

pub fn render_message(frame: &mut Frame, area: Rect, status: &StatusMessage, theme: ThemeColors) {
    let fg = if status.is_error { theme.error_fg } else { theme.message_fg };
    let style = Style::new().fg(fg).bg(theme.screen_bg);
    Block::new().style(style).render(area, frame);
    let mut lines = vec![format!(" {}", status.text)];
    lines.extend(status.details.iter().map(|detail| format!("   {detail}")));
    let paragraph = Paragraph::new(Text::from(lines.join("\n"))).style(style).wrap(WrapMode::None);
    paragraph.render(area, frame);
}

pub fn render_keybar(frame: &mut Frame, area: Rect, theme: ThemeColors) {
    let bg = Block::new().style(Style::new().fg(theme.keybar_fg).bg(theme.keybar_bg));
    bg.render(area, frame);
    let mut status = StatusLine::new().style(Style::new().fg(theme.keybar_fg).bg(theme.keybar_bg));
    for &(key, label) in STATUS_HINTS {
        status = status.right(StatusItem::key_hint(key, label));
    }
    status.render(area, frame);
}

/// Draws whatever the current mode puts on top of the panels.
pub fn render_overlay(frame: &mut Frame, mode: &Mode, theme: ThemeColors) {
    match mode {
        Mode::Browsing => {}
        Mode::AwaitingInput { kind, input } if kind.takes_text() => render_prompt(frame, kind, input, theme),
        Mode::AwaitingInput { kind, .. } => render_confirm(frame, kind, theme),
        Mode::Previewing(preview) => render_preview(frame, preview, theme),
        Mode::Help { scroll } => render_help(frame, *scroll, theme),
    }
}

fn dialog_area(frame: &Frame, height: u16) -> Rect {
    let full = Rect::new(0, 0, frame.width(), frame.height());
    let width = full.width.min(60).max(20);
    let height = height.min(full.height);
    let x = full.x + (full.width.saturating_sub(width)) / 2;
    let y = full.y + (full.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn render_prompt(frame: &mut Frame, kind: &InputKind, input: &LineInput, theme: ThemeColors) {
    let area = dialog_area(frame, 6);
    let style = Style::new().fg(theme.dialog_fg).bg(theme.dialog_bg);
    Block::new().style(style).render(area, frame);
    let block = Block::bordered().border_style(Style::new().fg(theme.panel_border_active)).style(style);
    let text = format!("{}\n\n{}", prompt_title(kind), input.text);
    let paragraph = Paragraph::new(Text::from(text)).style(style).block(block);
    paragraph.render(area, frame);
    let before: String = input.text.chars().take(input.cursor).collect();
    let cursor_x = area.x + 1 + display_width(&before) as u16;
    let cursor_y = area.y + 1 + 2;
    frame.set_cursor(Some((cursor_x.min(area.x + area.width.saturating_sub(2)), cursor_y)));
}

fn render_confirm(frame: &mut Frame, kind: &InputKind, theme: ThemeColors) {
    let names: Vec<String> = match kind {
        InputKind::ConfirmDelete { targets } => targets.iter().map(|p| p.display().to_string()).collect(),
        InputKind::ConfirmRecursive { non_empty, .. } => {
            non_empty.iter().map(|p| p.display().to_string()).collect()
        }
        InputKind::ConfirmOverwrite { conflicts } => {
            conflicts.iter().map(|r| r.target().display().to_string()).collect()
        }
        _ => Vec::new(),
    };
    let mut lines = vec![prompt_title(kind), String::new()];
    lines.extend(names.iter().take(DIALOG_LIST_MAX).cloned());
    if names.len() > DIALOG_LIST_MAX {
        lines.push(format!("... and {} more", names.len() - DIALOG_LIST_MAX));
    }
    lines.push(String::new());
    lines.push("Y=Yes  any other key=No".to_string());

    let area = dialog_area(frame, lines.len() as u16 + 2);
    let style = Style::new().fg(theme.dialog_fg).bg(theme.dialog_bg);
    Block::new().style(style).render(area, frame);
    let block = Block::bordered().border_style(Style::new().fg(theme.panel_border_active)).style(style);
    let paragraph = Paragraph::new(Text::from(lines.join("\n")))
        .style(style)
        .wrap(WrapMode::None)
        .block(block);
    paragraph.render(area, frame);
}

pub fn render_preview(frame: &mut Frame, preview: &Preview, theme: ThemeColors) {
    let area = Rect::new(0, 0, frame.width(), frame.height());
    let style = Style::new().fg(theme.panel_fg).bg(theme.panel_bg);
    let title = format!("Preview: {}", preview.name);
    let paragraph = Paragraph::new(Text::from(preview.lines.join("\n")))
        .wrap(WrapMode::None)
        .scroll((preview.scroll.min(u16::MAX as usize) as u16, 0))
        .style(style)
        .block(
            Block::bordered()
                .border_style(Style::new().fg(theme.panel_border_active))
                .borders(Borders::ALL)
                .title(title.as_str()),
        );
    paragraph.render(area, frame);
}

pub fn render_help(frame: &mut Frame, scroll: usize, theme: ThemeColors) {
    let area = Rect::new(0, 0, frame.width(), frame.height());
    let style = Style::new().fg(theme.dialog_fg).bg(theme.dialog_bg);
    let lines = help_lines();
    let scroll = scroll.min(lines.len().saturating_sub(1));
    let paragraph = Paragraph::new(Text::from(lines.join("\n")))
        .wrap(WrapMode::None)
        .scroll((scroll.min(u16::MAX as usize) as u16, 0))
        .style(style)
        .block(
            Block::bordered()
                .border_style(Style::new().fg(theme.panel_border_active))
                .borders(Borders::ALL)
                .title("Help (any key closes)"),
        );
    paragraph.render(area, frame);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_ops::LocalExecutor;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn status_text_reports_panel_state() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        let exec = LocalExecutor::new("true");
        let panel = Panel::open(dir.path().to_path_buf(), false, &exec).unwrap();
        let mut group = PanelGroup::new(panel);
        group.toggle_dual_mode(&exec).unwrap();
        group.focused_mut().set_search("b");
        let screen = Screen {
            group: &group,
            clipboard: &Clipboard::new(),
            status: &StatusMessage::default(),
            show_hidden: false,
        };
        assert_eq!(status_text(&screen), " Panel 1/2 | 2 items | b.txt | Hidden: OFF | Search: b");
    }
}
