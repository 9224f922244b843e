//! TUI application state management.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::editor::TextBuffer;
use crate::api::{Outcome, PlotRecord, SaveReply};
use crate::session::{Effect, FileId, Session, SubmitKind, Tab, REMOVE_FILE_PROMPT};

const DEFAULT_STATUS: &str = "Ctrl+R run | Ctrl+S save | Ctrl+N new file | Ctrl+U share | F1 help";

/// Popup display state
#[derive(Debug, Clone, PartialEq)]
pub enum PopupState {
    None,
    /// Waiting for y/n before removing a file
    ConfirmRemove { id: FileId, name: String },
    /// Editing a file name
    Rename { id: FileId, input: String },
    /// Share links of the saved plot
    Share,
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Noop,
    Quit,
    Dispatch(Effect),
    ExportSvg,
}

#[derive(Debug)]
pub struct App {
    pub session: Session,
    /// Live buffer of the focused tab
    pub editor: TextBuffer,
    /// Tab whose contents are loaded in `editor`
    loaded: Tab,
    cursors: HashMap<Tab, (usize, usize)>,
    pub popup_state: PopupState,
    pub show_help: bool,
    pub status_message: String,
    /// Lines scrolled in the result panel
    pub result_scroll: u16,
    last_ctrl_c_time: Option<Instant>,
}

impl App {
    pub fn new(session: Session) -> Self {
        let loaded = session.focus();
        let mut app = Self {
            session,
            editor: TextBuffer::default(),
            loaded,
            cursors: HashMap::new(),
            popup_state: PopupState::None,
            show_help: false,
            status_message: DEFAULT_STATUS.to_string(),
            result_scroll: 0,
            last_ctrl_c_time: None,
        };
        app.reload_editor();
        app
    }

    /// Tabs in display order: code first, then files.
    pub fn tabs(&self) -> Vec<Tab> {
        std::iter::once(Tab::Code)
            .chain(self.session.files().iter().map(|f| Tab::File(f.id)))
            .collect()
    }

    pub fn tab_title(&self, tab: Tab) -> String {
        match tab {
            Tab::Code => "main.R".to_string(),
            Tab::File(id) => self.session.file(id).map(|f| f.name.clone()).unwrap_or_default(),
        }
    }

    fn tab_text(&self, tab: Tab) -> String {
        match tab {
            Tab::Code => self.session.code().to_string(),
            Tab::File(id) => self.session.file(id).map(|f| f.content.clone()).unwrap_or_default(),
        }
    }

    /// Write the live buffer back into the session.
    pub fn flush_editor(&mut self) {
        let text = self.editor.text();
        match self.loaded {
            Tab::Code => self.session.set_code(text),
            Tab::File(id) => {
                if let Some(file) = self.session.file_mut(id) {
                    file.content = text;
                }
            }
        }
    }

    /// Load the session's focused tab into the editor without flushing.
    fn reload_editor(&mut self) {
        self.loaded = self.session.focus();
        self.editor = TextBuffer::from_text(&self.tab_text(self.loaded));
        if let Some((row, col)) = self.cursors.get(&self.loaded).copied() {
            self.editor.set_cursor(row, col);
        }
    }

    /// Follow the session's focus if it moved away from the loaded tab.
    pub fn sync_focus(&mut self) {
        if self.session.focus() == self.loaded {
            return;
        }
        self.flush_editor();
        self.cursors.insert(self.loaded, self.editor.cursor());
        self.reload_editor();
    }

    pub fn focus_tab(&mut self, tab: Tab) {
        self.session.set_focus(tab);
        self.sync_focus();
    }

    fn cycle_tab(&mut self, forward: bool) {
        let tabs = self.tabs();
        let current = tabs.iter().position(|t| *t == self.session.focus()).unwrap_or(0);
        let next = if forward {
            (current + 1) % tabs.len()
        } else {
            (current + tabs.len() - 1) % tabs.len()
        };
        self.focus_tab(tabs[next]);
    }

    pub fn submit(&mut self, kind: SubmitKind) -> Effect {
        self.flush_editor();
        let submission = match kind {
            SubmitKind::Run => self.session.run(),
            SubmitKind::Save => self.session.save(),
        };
        self.status_message = match kind {
            SubmitKind::Run => "Running...".to_string(),
            SubmitKind::Save => "Saving...".to_string(),
        };
        Effect::Submit(submission)
    }

    // ----- network completions -----

    pub fn on_hydrated(&mut self, id: &str, record: PlotRecord) -> Option<Effect> {
        self.cursors.clear();
        let effect = self.session.hydrate(id, record);
        self.reload_editor();
        self.result_scroll = 0;
        self.status_message = match effect {
            Some(_) => format!("Loaded {}, running...", id),
            None => format!("Could not load {}", id),
        };
        effect
    }

    pub fn on_run_finished(&mut self, generation: u64, outcome: Outcome) {
        if self.session.complete_run(generation, outcome) {
            self.result_scroll = 0;
            self.status_message = self.finished_status("Run");
        }
    }

    pub fn on_save_finished(&mut self, generation: u64, reply: SaveReply) -> Option<Effect> {
        let effect = self.session.complete_save(generation, reply);
        if !self.session.is_loading() {
            self.result_scroll = 0;
            self.status_message = match &effect {
                Some(Effect::PushLocation(location)) => format!("Saved as {}", location),
                _ => self.finished_status("Save"),
            };
        }
        effect
    }

    fn finished_status(&self, what: &str) -> String {
        if self.session.error().is_some() {
            format!("{} failed", what)
        } else {
            format!("{} finished | {}", what, DEFAULT_STATUS)
        }
    }

    /// Where Ctrl+E writes the current SVG.
    pub fn svg_export_path(&self) -> PathBuf {
        let stem = if self.session.id().is_empty() { "plot" } else { self.session.id() };
        PathBuf::from(format!("{}.svg", stem))
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn is_popup_shown(&self) -> bool {
        self.popup_state != PopupState::None
    }

    /// Handle Ctrl+C press and detect double press for quit
    /// Returns true if should quit (double Ctrl+C), false otherwise
    pub fn handle_ctrl_c(&mut self) -> bool {
        const DOUBLE_CTRL_C_TIMEOUT: Duration = Duration::from_millis(1000);

        let now = Instant::now();
        if let Some(last_time) = self.last_ctrl_c_time {
            if now.duration_since(last_time) <= DOUBLE_CTRL_C_TIMEOUT {
                self.last_ctrl_c_time = None;
                return true;
            }
        }
        self.last_ctrl_c_time = Some(now);
        self.status_message = "Press Ctrl+C again to quit".to_string();
        false
    }

    pub fn on_paste(&mut self, text: &str) {
        match &mut self.popup_state {
            PopupState::Rename { input, .. } => input.push_str(text.lines().next().unwrap_or("")),
            PopupState::None => self.editor.insert_str(text),
            _ => {}
        }
    }

    // ----- keyboard -----

    pub fn on_key(&mut self, key: KeyEvent) -> Action {
        if self.show_help {
            self.show_help = false;
            return Action::Noop;
        }
        if self.is_popup_shown() {
            self.on_popup_key(key);
            return Action::Noop;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => {
                if self.handle_ctrl_c() {
                    return Action::Quit;
                }
            }
            KeyCode::Char('r') if ctrl => return Action::Dispatch(self.submit(SubmitKind::Run)),
            KeyCode::Char('s') if ctrl => return Action::Dispatch(self.submit(SubmitKind::Save)),
            KeyCode::Char('n') if ctrl => {
                let effect = self.session.add_file();
                self.status_message = "Added a file".to_string();
                return Action::Dispatch(effect);
            }
            KeyCode::Char('d') if ctrl => {
                if let Tab::File(id) = self.session.focus() {
                    let name = self.tab_title(Tab::File(id));
                    self.popup_state = PopupState::ConfirmRemove { id, name };
                }
            }
            KeyCode::Char('u') if ctrl => {
                self.flush_editor();
                self.popup_state = PopupState::Share;
            }
            KeyCode::Char('e') if ctrl => return Action::ExportSvg,
            KeyCode::Left if ctrl => self.cycle_tab(false),
            KeyCode::Right if ctrl => self.cycle_tab(true),
            KeyCode::F(1) => self.toggle_help(),
            KeyCode::F(2) => {
                if let Tab::File(id) = self.session.focus() {
                    let input = self.tab_title(Tab::File(id));
                    self.popup_state = PopupState::Rename { id, input };
                }
            }
            KeyCode::PageUp => self.result_scroll = self.result_scroll.saturating_sub(10),
            KeyCode::PageDown => self.result_scroll = self.result_scroll.saturating_add(10),
            KeyCode::Enter => self.editor.newline(),
            KeyCode::Tab => self.editor.insert_str("  "),
            KeyCode::Backspace => self.editor.backspace(),
            KeyCode::Delete => self.editor.delete(),
            KeyCode::Left => self.editor.move_left(),
            KeyCode::Right => self.editor.move_right(),
            KeyCode::Up => self.editor.move_up(),
            KeyCode::Down => self.editor.move_down(),
            KeyCode::Home => self.editor.move_home(),
            KeyCode::End => self.editor.move_end(),
            KeyCode::Char(c) if !ctrl => self.editor.insert_char(c),
            _ => {}
        }
        Action::Noop
    }

    fn on_popup_key(&mut self, key: KeyEvent) {
        match std::mem::replace(&mut self.popup_state, PopupState::None) {
            PopupState::ConfirmRemove { id, name } => {
                let mut answer = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
                if self.session.remove_file(id, &mut answer) {
                    self.status_message = format!("Removed {}", name);
                    // the removed tab has nothing left to flush into
                    self.cursors.remove(&Tab::File(id));
                    self.reload_editor();
                }
            }
            PopupState::Rename { id, mut input } => match key.code {
                KeyCode::Enter => {
                    self.session.rename_file(id, &input);
                }
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    input.pop();
                    self.popup_state = PopupState::Rename { id, input };
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    self.popup_state = PopupState::Rename { id, input };
                }
                _ => self.popup_state = PopupState::Rename { id, input },
            },
            PopupState::Share | PopupState::None => {}
        }
    }

    pub fn remove_prompt(&self) -> &'static str {
        REMOVE_FILE_PROMPT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.on_key(key(KeyCode::Char(c)));
        }
    }

    fn app() -> App {
        App::new(Session::new("http://gg.example.com"))
    }

    fn add_and_focus(app: &mut App) -> FileId {
        match app.on_key(ctrl('n')) {
            Action::Dispatch(Effect::FocusAfterDelay(Tab::File(id))) => {
                app.focus_tab(Tab::File(id));
                id
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn run_sends_what_was_typed() {
        let mut app = app();
        type_str(&mut app, "qplot(1)");
        let Action::Dispatch(Effect::Submit(sub)) = app.on_key(ctrl('r')) else {
            panic!("expected a submission");
        };
        assert_eq!(sub.kind, SubmitKind::Run);
        assert_eq!(sub.payload.code, "qplot(1)");
        assert!(app.session.is_loading());
    }

    #[test]
    fn file_tabs_keep_their_own_text() {
        let mut app = app();
        type_str(&mut app, "code");
        let id = add_and_focus(&mut app);
        type_str(&mut app, "1,2");
        app.on_key(KeyEvent::new(KeyCode::Left, KeyModifiers::CONTROL));
        assert_eq!(app.session.focus(), Tab::Code);
        assert_eq!(app.editor.text(), "code");

        let Action::Dispatch(Effect::Submit(sub)) = app.on_key(ctrl('s')) else {
            panic!("expected a submission");
        };
        assert_eq!(sub.payload.files["file1"], "1,2");
        assert_eq!(app.session.file(id).unwrap().content, "1,2");
    }

    #[test]
    fn declined_removal_keeps_the_file() {
        let mut app = app();
        let id = add_and_focus(&mut app);
        app.on_key(ctrl('d'));
        assert!(matches!(app.popup_state, PopupState::ConfirmRemove { .. }));
        app.on_key(key(KeyCode::Char('n')));
        assert!(!app.is_popup_shown());
        assert_eq!(app.session.files().len(), 1);
        assert_eq!(app.session.focus(), Tab::File(id));
    }

    #[test]
    fn enter_does_not_confirm_removal() {
        let mut app = app();
        let id = add_and_focus(&mut app);
        type_str(&mut app, "unsaved");
        app.on_key(ctrl('d'));
        app.on_key(key(KeyCode::Enter));
        assert!(!app.is_popup_shown());
        assert_eq!(app.session.files().len(), 1);
        assert_eq!(app.session.focus(), Tab::File(id));
        assert_eq!(app.editor.text(), "unsaved");
    }

    #[test]
    fn confirmed_removal_returns_to_code() {
        let mut app = app();
        type_str(&mut app, "main");
        add_and_focus(&mut app);
        type_str(&mut app, "gone");
        app.on_key(ctrl('d'));
        app.on_key(key(KeyCode::Char('y')));
        assert!(app.session.files().is_empty());
        assert_eq!(app.session.focus(), Tab::Code);
        assert_eq!(app.editor.text(), "main");
    }

    #[test]
    fn remove_is_ignored_on_the_code_tab() {
        let mut app = app();
        app.on_key(ctrl('d'));
        assert!(!app.is_popup_shown());
    }

    #[test]
    fn rename_popup_edits_the_name() {
        let mut app = app();
        let id = add_and_focus(&mut app);
        app.on_key(key(KeyCode::F(2)));
        for _ in 0.."file1".len() {
            app.on_key(key(KeyCode::Backspace));
        }
        type_str(&mut app, "iris");
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.session.file(id).unwrap().name, "iris");
        assert!(!app.is_popup_shown());
    }

    #[test]
    fn hydrate_loads_code_into_the_editor() {
        let mut app = app();
        type_str(&mut app, "scratch");
        let record = PlotRecord { code: Some("saved()".into()), ..PlotRecord::default() };
        let effect = app.on_hydrated("abc12", record);
        assert!(matches!(effect, Some(Effect::Submit(_))));
        assert_eq!(app.editor.text(), "saved()");
        assert_eq!(app.session.location(), "/edit/abc12");
    }

    #[test]
    fn save_completion_reports_the_location() {
        let mut app = app();
        type_str(&mut app, "x");
        let Action::Dispatch(Effect::Submit(sub)) = app.on_key(ctrl('s')) else {
            panic!("expected a submission");
        };
        let effect = app.on_save_finished(
            sub.generation,
            SaveReply {
                outcome: Outcome::Success { output: String::new(), svg: "<svg/>".into() },
                id: "Q1w2e".into(),
            },
        );
        assert_eq!(effect, Some(Effect::PushLocation("/edit/Q1w2e".into())));
        assert_eq!(app.status_message, "Saved as /edit/Q1w2e");
        assert_eq!(app.svg_export_path(), PathBuf::from("Q1w2e.svg"));
    }

    #[test]
    fn export_path_ignores_path_like_reply_ids() {
        let mut app = app();
        type_str(&mut app, "x");
        let Action::Dispatch(Effect::Submit(sub)) = app.on_key(ctrl('s')) else {
            panic!("expected a submission");
        };
        let effect = app.on_save_finished(
            sub.generation,
            SaveReply {
                outcome: Outcome::Success { output: String::new(), svg: "<svg/>".into() },
                id: "../../tmp/pwn".into(),
            },
        );
        assert!(effect.is_none());
        assert_eq!(app.svg_export_path(), PathBuf::from("plot.svg"));
    }

    #[test]
    fn double_ctrl_c_quits() {
        let mut app = app();
        assert_eq!(app.on_key(ctrl('c')), Action::Noop);
        assert_eq!(app.on_key(ctrl('c')), Action::Quit);
    }

    #[test]
    fn help_swallows_the_next_key() {
        let mut app = app();
        app.on_key(key(KeyCode::F(1)));
        assert!(app.show_help);
        app.on_key(key(KeyCode::Char('a')));
        assert!(!app.show_help);
        assert_eq!(app.editor.text(), "");
    }
}
