#![forbid(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::io;
use std::path::PathBuf;

use ftui::prelude::*;
use ftui::render::cell::PackedRgba;
use ftui::{KeyEventKind, Program, ProgramConfig};

use crate::config::Settings;
use crate::controller::ActionController;
use crate::error::ActionError;
use crate::fs_ops::LocalExecutor;
use crate::keymap::action_for;
use crate::model::{Action, Outcome};
use crate::ui::{render_background, render_layout, render_overlay, LayoutCache, Screen};

#[derive(Debug, Clone, Copy)]
pub struct ThemeColors {
    pub screen_bg: PackedRgba,
    pub panel_bg: PackedRgba,
    pub panel_fg: PackedRgba,
    pub dir_fg: PackedRgba,
    pub exec_fg: PackedRgba,
    pub marked_fg: PackedRgba,
    pub search_bg: PackedRgba,
    pub panel_border_active: PackedRgba,
    pub panel_border_inactive: PackedRgba,
    pub header_bg: PackedRgba,
    pub header_fg: PackedRgba,
    pub selection_bg: PackedRgba,
    pub selection_fg: PackedRgba,
    pub status_bg: PackedRgba,
    pub status_fg: PackedRgba,
    pub message_fg: PackedRgba,
    pub error_fg: PackedRgba,
    pub keybar_bg: PackedRgba,
    pub keybar_fg: PackedRgba,
    pub dialog_bg: PackedRgba,
    pub dialog_fg: PackedRgba,
}

impl ThemeColors {
    pub fn classic() -> Self {
        Self {
            screen_bg: PackedRgba::rgb(0, 0, 0),
            panel_bg: PackedRgba::rgb(0, 0, 0),
            panel_fg: PackedRgba::rgb(192, 192, 192),
            dir_fg: PackedRgba::rgb(85, 170, 255),       // blue
            exec_fg: PackedRgba::rgb(85, 255, 85),       // green
            marked_fg: PackedRgba::rgb(255, 255, 85),    // yellow
            search_bg: PackedRgba::rgb(170, 85, 0),      // brown
            panel_border_active: PackedRgba::rgb(85, 255, 255),
            panel_border_inactive: PackedRgba::rgb(85, 85, 85),
            header_bg: PackedRgba::rgb(0, 0, 0),
            header_fg: PackedRgba::rgb(255, 255, 255),
            selection_bg: PackedRgba::rgb(0, 170, 170),  // cyan bar
            selection_fg: PackedRgba::rgb(0, 0, 0),
            status_bg: PackedRgba::rgb(0, 0, 170),
            status_fg: PackedRgba::rgb(255, 255, 255),
            message_fg: PackedRgba::rgb(192, 192, 192),
            error_fg: PackedRgba::rgb(255, 85, 85),
            keybar_bg: PackedRgba::rgb(0, 170, 170),
            keybar_fg: PackedRgba::rgb(0, 0, 0),
            dialog_bg: PackedRgba::rgb(170, 170, 170),
            dialog_fg: PackedRgba::rgb(0, 0, 0),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Msg {
    Event(Event),
    Quit,
}

impl From<Event> for Msg {
    fn from(event: Event) -> Self {
        Msg::Event(event)
    }
}

#[derive(Debug)]
pub struct App {
    controller: ActionController<LocalExecutor>,
    layout: RefCell<LayoutCache>,
    theme: ThemeColors,
    /// Frames to clear fully, set after an external program used the terminal.
    force_clear_frames: Cell<u8>,
}

impl App {
    pub fn new(start: PathBuf, settings: &Settings, exit_marker: Option<PathBuf>) -> Result<Self, ActionError> {
        let exec = LocalExecutor::new(settings.opener.clone());
        let controller = ActionController::new(start, settings, exit_marker, exec)?;
        Ok(Self {
            controller,
            layout: RefCell::new(LayoutCache::default()),
            theme: ThemeColors::classic(),
            force_clear_frames: Cell::new(0),
        })
    }

    pub fn run(self) -> io::Result<()> {
        let mut program = Program::with_config(self, ProgramConfig::fullscreen())?;
        program.run()
    }

    fn handle_key(&mut self, key: KeyEvent) -> Cmd<Msg> {
        if key.kind != KeyEventKind::Press {
            return Cmd::none();
        }
        log::trace!("key {:?} {:?}", key.code, key.modifiers);
        let view_height = self.layout.borrow().list_height;
        self.controller.set_view_height(view_height);

        let action = if matches!(key.code, KeyCode::Char('c')) && key.modifiers.contains(Modifiers::CTRL) {
            Some(Action::Quit)
        } else {
            action_for(self.controller.mode(), key.code, view_height)
        };
        let Some(action) = action else {
            return Cmd::none();
        };
        if matches!(action, Action::Enter | Action::Open) {
            self.force_clear_frames.set(2);
        }
        match self.controller.handle(action) {
            Outcome::Continue => Cmd::none(),
            Outcome::Quit { .. } => Cmd::quit(),
        }
    }

    fn render(&self, frame: &mut Frame) {
        frame.set_cursor(None);
        let pending = self.force_clear_frames.get();
        if pending > 0 {
            frame.clear();
            self.force_clear_frames.set(pending - 1);
        }

        render_background(frame, self.theme);
        let screen = Screen {
            group: self.controller.group(),
            clipboard: self.controller.clipboard(),
            status: self.controller.status(),
            show_hidden: self.controller.show_hidden(),
        };
        let layout = render_layout(frame, &screen, self.theme);
        *self.layout.borrow_mut() = layout;
        render_overlay(frame, self.controller.mode(), self.theme);
    }
}

impl Model for App {
    type Message = Msg;

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::Event(Event::Key(key)) => self.handle_key(key),
            Msg::Event(_) => Cmd::none(),
            Msg::Quit => Cmd::quit(),
        }
    }

    fn view(&self, frame: &mut Frame) {
        self.render(frame);
    }
}
