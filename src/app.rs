//! App state and key handling for the TUI
//!
//! The controller owns session state; this module only owns what the
//! terminal needs on top of it (search box, list selection, input mode)
//! and turns key presses into controller [`Event`]s.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::controller::{Event, PlaybackSessionController};
use crate::models::{ControlAction, UiMode};

// =============================================================================
// Input Mode
// =============================================================================

/// Current input mode for keyboard handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Text input mode (search box focused)
    Editing,
}

// =============================================================================
// Selection State
// =============================================================================

/// Selection state for the catalog list
#[derive(Debug, Clone, Default)]
pub struct ListState {
    /// Currently selected index
    pub selected: usize,
    /// Scroll offset for viewport
    pub offset: usize,
    /// Total number of items
    pub len: usize,
}

impl ListState {
    pub fn new(len: usize) -> Self {
        Self {
            selected: 0,
            offset: 0,
            len,
        }
    }

    pub fn up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if self.selected < self.offset {
                self.offset = self.selected;
            }
        }
    }

    pub fn down(&mut self) {
        if self.len > 0 && self.selected < self.len - 1 {
            self.selected += 1;
        }
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
        if self.selected < self.offset {
            self.offset = self.selected;
        }
    }

    pub fn page_down(&mut self, page_size: usize) {
        if self.len > 0 {
            self.selected = (self.selected + page_size).min(self.len - 1);
        }
    }

    pub fn first(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    pub fn last(&mut self) {
        if self.len > 0 {
            self.selected = self.len - 1;
        }
    }

    /// Update offset to keep selected item visible
    pub fn scroll_into_view(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + visible_height {
            self.offset = self.selected + 1 - visible_height;
        }
    }

    /// Update length when the result set changes. A shrink (new search)
    /// resets to the top; growth (load more) keeps the selection.
    pub fn set_len(&mut self, len: usize) {
        if len < self.len {
            self.first();
        }
        self.len = len;
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

// =============================================================================
// Search Box
// =============================================================================

/// Search input. `cursor` counts characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct SearchBox {
    pub query: String,
    pub cursor: usize,
}

impl SearchBox {
    fn byte_index(&self, char_idx: usize) -> usize {
        self.query
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.query.len())
    }

    fn char_len(&self) -> usize {
        self.query.chars().count()
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.query.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.query.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.query.remove(at);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.char_len();
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.cursor = 0;
    }
}

// =============================================================================
// Main Application State
// =============================================================================

/// TUI state layered over the session controller
#[derive(Debug)]
pub struct App {
    /// Whether the app is running
    pub running: bool,
    pub input_mode: InputMode,
    pub search: SearchBox,
    pub list: ListState,
    /// Controller result set the list positions refer to
    result_set: u64,
    /// Show the key help line
    pub show_help: bool,
}

impl Default for App {
    fn default() -> Self {
        Self {
            running: true,
            input_mode: InputMode::Normal,
            search: SearchBox::default(),
            list: ListState::new(0),
            result_set: 0,
            show_help: true,
        }
    }
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Track the controller's results. A replaced result set starts at the
    /// top; appended pages keep the selection.
    pub fn sync(&mut self, controller: &PlaybackSessionController) {
        let len = controller.results().len();
        if controller.result_set() != self.result_set {
            self.result_set = controller.result_set();
            self.list = ListState::new(len);
        } else if len != self.list.len {
            self.list.set_len(len);
        }
    }

    // -------------------------------------------------------------------------
    // Keyboard Event Handling
    // -------------------------------------------------------------------------

    /// Handle a key press. Returns the controller event it maps to, if any.
    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        controller: &PlaybackSessionController,
    ) -> Option<Event> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return None;
        }

        if self.input_mode == InputMode::Editing {
            return self.handle_editing_key(key);
        }

        match key.code {
            KeyCode::Char('q') => {
                self.quit();
                return None;
            }
            KeyCode::Char('?') => {
                self.show_help = !self.show_help;
                return None;
            }
            KeyCode::Tab => {
                let next = match controller.mode() {
                    UiMode::Catalog => UiMode::Playback,
                    UiMode::Playback => UiMode::Catalog,
                };
                return Some(Event::SwitchPanel(next));
            }
            KeyCode::Char('Q') => return Some(Event::SetQuality(controller.quality().next())),
            _ => {}
        }

        match controller.mode() {
            UiMode::Catalog => self.handle_catalog_key(key),
            UiMode::Playback => self.handle_playback_key(key, controller),
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent) -> Option<Event> {
        match key.code {
            KeyCode::Esc => {
                self.search.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                return Some(Event::Search(self.search.query.clone()));
            }
            KeyCode::Char(c) => self.search.insert(c),
            KeyCode::Backspace => self.search.backspace(),
            KeyCode::Delete => self.search.delete(),
            KeyCode::Left => self.search.cursor_left(),
            KeyCode::Right => self.search.cursor_right(),
            KeyCode::Home => self.search.cursor_home(),
            KeyCode::End => self.search.cursor_end(),
            _ => {}
        }
        None
    }

    fn handle_catalog_key(&mut self, key: KeyEvent) -> Option<Event> {
        match key.code {
            KeyCode::Char('/') | KeyCode::Char('s') => {
                self.input_mode = InputMode::Editing;
                self.search.cursor_end();
            }
            KeyCode::Up | KeyCode::Char('k') => self.list.up(),
            KeyCode::Down | KeyCode::Char('j') => self.list.down(),
            KeyCode::PageUp => self.list.page_up(10),
            KeyCode::PageDown => self.list.page_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.list.first(),
            KeyCode::End | KeyCode::Char('G') => self.list.last(),
            KeyCode::Char('m') => return Some(Event::LoadMore),
            KeyCode::Enter if self.list.len > 0 => {
                return Some(Event::Select(self.list.selected))
            }
            _ => {}
        }
        None
    }

    fn handle_playback_key(
        &mut self,
        key: KeyEvent,
        controller: &PlaybackSessionController,
    ) -> Option<Event> {
        let action = match key.code {
            KeyCode::Esc => return Some(Event::SwitchPanel(UiMode::Catalog)),
            KeyCode::Enter => return Some(Event::StartVideo),
            KeyCode::Char('r') => return Some(Event::Resync),
            KeyCode::Char(' ') => {
                if controller.buttons().pause {
                    ControlAction::Pause
                } else {
                    ControlAction::Resume
                }
            }
            KeyCode::Char('p') => ControlAction::Pause,
            KeyCode::Char('u') => ControlAction::Resume,
            KeyCode::Char('x') => ControlAction::Stop,
            _ => return None,
        };
        controller
            .buttons()
            .is_enabled(action)
            .then_some(Event::Control(action))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
