//! Editor session state and the operations that mutate it.
//!
//! `Session` never performs I/O. Operations that need the outside world
//! return a [`Submission`] or an [`Effect`] for the caller to carry out, and
//! the caller feeds the response back through the matching `complete_*`.

pub mod files;
pub mod links;

use std::fmt;

use crate::api::{Outcome, PlotData, PlotRecord, SaveReply};

pub use files::{FileEntry, FileId};

pub const REMOVE_FILE_PROMPT: &str = "Are you sure to remove this file?";

/// Which editor tab has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Code,
    File(FileId),
}

/// The two mutually exclusive result panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Plot,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitKind {
    Run,
    Save,
}

impl fmt::Display for SubmitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitKind::Run => f.write_str("run"),
            SubmitKind::Save => f.write_str("save"),
        }
    }
}

/// A request the caller must send, tagged so late answers can be recognised.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub kind: SubmitKind,
    pub generation: u64,
    pub payload: PlotData,
}

/// Side effects requested by session operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Submit(Submission),
    /// Move focus once the new tab has been drawn.
    FocusAfterDelay(Tab),
    /// The visible location changed without reloading.
    PushLocation(String),
}

/// Asks the user before a destructive action.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

/// A pre-recorded answer.
impl Confirm for bool {
    fn confirm(&mut self, _message: &str) -> bool {
        *self
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    code: String,
    files: Vec<FileEntry>,
    result: Option<Outcome>,
    id: String,
    location: String,
    is_loading: bool,
    focus: Tab,
    base_url: String,
    next_file_id: u64,
    generation: u64,
}

impl Session {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            code: String::new(),
            files: Vec::new(),
            result: None,
            id: String::new(),
            location: "/edit".to_string(),
            is_loading: false,
            focus: Tab::Code,
            base_url: base_url.into(),
            next_file_id: 0,
            generation: 0,
        }
    }

    /// Start from local sources instead of a saved record.
    pub fn with_sources<I>(base_url: impl Into<String>, code: String, files: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut session = Self::new(base_url);
        session.code = code;
        for (name, content) in files {
            session.push_file(name, content);
        }
        session
    }

    // ----- accessors -----

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn file_mut(&mut self, id: FileId) -> Option<&mut FileEntry> {
        self.files.iter_mut().find(|f| f.id == id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn focus(&self) -> Tab {
        self.focus
    }

    pub fn result(&self) -> Option<&Outcome> {
        self.result.as_ref()
    }

    pub fn output(&self) -> &str {
        match &self.result {
            Some(Outcome::Success { output, .. }) => output,
            _ => "",
        }
    }

    pub fn svg(&self) -> &str {
        match &self.result {
            Some(Outcome::Success { svg, .. }) => svg,
            _ => "",
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.result {
            Some(Outcome::Failure { error }) => Some(error),
            _ => None,
        }
    }

    /// Plot panel unless the last result is an error.
    pub fn panel(&self) -> Panel {
        if self.error().is_some() {
            Panel::Output
        } else {
            Panel::Plot
        }
    }

    /// Focus a tab. Unknown file tabs fall back to the code tab.
    pub fn set_focus(&mut self, tab: Tab) {
        self.focus = match tab {
            Tab::File(id) if self.file(id).is_none() => Tab::Code,
            other => other,
        };
    }

    // ----- derived values -----

    pub fn image_url(&self) -> String {
        links::image_url(&self.base_url, &self.id)
    }

    pub fn edit_url(&self) -> String {
        links::edit_url(&self.base_url, &self.id)
    }

    pub fn html_image(&self) -> String {
        links::html_image(&self.base_url, &self.id)
    }

    pub fn replot_example(&self) -> String {
        links::replot_example(&self.base_url, &self.id, &self.files)
    }

    // ----- network operations -----

    /// Load a saved record. Returns the follow-up run when the record holds
    /// no error.
    pub fn hydrate(&mut self, id: &str, record: PlotRecord) -> Option<Effect> {
        self.id = id.to_string();
        self.location = links::edit_path(id);
        self.files.clear();
        self.focus = Tab::Code;
        for (name, content) in record.files.unwrap_or_default() {
            self.push_file(name, content);
        }
        self.code = record.code.unwrap_or_default();
        let outcome = Outcome::from_parts(record.output, None, record.error);
        let failed = outcome.is_failure();
        tracing::debug!(%id, files = self.files.len(), failed, "hydrated session");
        self.result = Some(outcome);

        if failed {
            None
        } else {
            Some(Effect::Submit(self.run()))
        }
    }

    pub fn run(&mut self) -> Submission {
        self.submit(SubmitKind::Run)
    }

    pub fn save(&mut self) -> Submission {
        self.submit(SubmitKind::Save)
    }

    fn submit(&mut self, kind: SubmitKind) -> Submission {
        self.generation += 1;
        self.is_loading = true;
        Submission {
            kind,
            generation: self.generation,
            payload: PlotData { code: self.code.clone(), files: files::file_map(&self.files) },
        }
    }

    /// Apply a run response. Returns false when a newer submission has
    /// superseded it and the response was dropped.
    pub fn complete_run(&mut self, generation: u64, outcome: Outcome) -> bool {
        if !self.accept(generation, SubmitKind::Run) {
            return false;
        }
        self.result = Some(outcome);
        true
    }

    /// Apply a save response. A successful save with an id moves the location
    /// to `/edit/<id>`.
    pub fn complete_save(&mut self, generation: u64, reply: SaveReply) -> Option<Effect> {
        if !self.accept(generation, SubmitKind::Save) {
            return None;
        }
        let saved = !reply.outcome.is_failure() && links::is_plot_id(&reply.id);
        if !saved && !reply.id.is_empty() {
            tracing::warn!(id = %reply.id, "ignoring save reply id");
        }
        self.result = Some(reply.outcome);
        if !saved {
            return None;
        }
        self.id = reply.id;
        self.location = links::edit_path(&self.id);
        Some(Effect::PushLocation(self.location.clone()))
    }

    fn accept(&mut self, generation: u64, kind: SubmitKind) -> bool {
        if generation != self.generation {
            tracing::warn!(%kind, generation, latest = self.generation, "dropping stale response");
            return false;
        }
        self.is_loading = false;
        true
    }

    // ----- local file list editing -----

    pub fn add_file(&mut self) -> Effect {
        let name = files::next_file_name(&self.files);
        let id = self.push_file(name, String::new());
        Effect::FocusAfterDelay(Tab::File(id))
    }

    /// Remove a file after confirmation. Returns whether anything was removed.
    pub fn remove_file<C: Confirm + ?Sized>(&mut self, id: FileId, confirm: &mut C) -> bool {
        let Some(pos) = self.files.iter().position(|f| f.id == id) else {
            return false;
        };
        if !confirm.confirm(REMOVE_FILE_PROMPT) {
            return false;
        }
        let removed = self.files.remove(pos);
        tracing::debug!(name = %removed.name, "removed file");
        self.focus = Tab::Code;
        true
    }

    pub fn rename_file(&mut self, id: FileId, name: &str) -> bool {
        match self.file_mut(id) {
            Some(file) => {
                file.name = name.trim().to_string();
                true
            }
            None => false,
        }
    }

    fn push_file(&mut self, name: String, content: String) -> FileId {
        let id = FileId(self.next_file_id);
        self.next_file_id += 1;
        self.files.push(FileEntry { id, name, content });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const BASE: &str = "http://gg.example.com";

    fn record(code: &str, files: &[(&str, &str)], error: Option<&str>) -> PlotRecord {
        PlotRecord {
            code: Some(code.to_string()),
            files: Some(files.iter().map(|(n, c)| (n.to_string(), c.to_string())).collect()),
            output: None,
            error: error.map(str::to_string),
        }
    }

    struct Asked(Vec<String>, bool);

    impl Confirm for Asked {
        fn confirm(&mut self, message: &str) -> bool {
            self.0.push(message.to_string());
            self.1
        }
    }

    #[test]
    fn hydrating_a_clean_record_triggers_a_run() {
        let mut s = Session::new(BASE);
        let effect = s.hydrate("abc12", record("ggplot(d)", &[("d", "1,2")], None));

        let Some(Effect::Submit(sub)) = effect else {
            panic!("expected a run, got {:?}", effect);
        };
        assert_eq!(sub.kind, SubmitKind::Run);
        assert_eq!(sub.payload.code, "ggplot(d)");
        assert_eq!(sub.payload.files["d"], "1,2");
        assert!(s.is_loading());
        assert_eq!(s.panel(), Panel::Plot);
        assert_eq!(s.location(), "/edit/abc12");
    }

    #[test]
    fn hydrating_an_error_record_shows_the_error_and_does_not_run() {
        let mut s = Session::new(BASE);
        let effect = s.hydrate("abc12", record("", &[], Some("Not found")));
        assert!(effect.is_none());
        assert!(!s.is_loading());
        assert_eq!(s.panel(), Panel::Output);
        assert_eq!(s.error(), Some("Not found"));
    }

    #[test]
    fn hydrate_replaces_existing_files() {
        let mut s = Session::with_sources(BASE, "old".into(), vec![("stale".to_string(), "x".to_string())]);
        s.hydrate("id1", record("new", &[("a", "1"), ("b", "2")], Some("boom")));
        let names: Vec<_> = s.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(s.code(), "new");
        assert_eq!(s.focus(), Tab::Code);
    }

    #[test]
    fn add_file_picks_the_smallest_free_suffix_and_schedules_focus() {
        let mut s = Session::with_sources(
            BASE,
            String::new(),
            vec![("file1".to_string(), String::new()), ("file3".to_string(), String::new())],
        );
        let effect = s.add_file();
        let added = s.files().last().unwrap();
        assert_eq!(added.name, "file2");
        assert_eq!(added.content, "");
        assert_eq!(effect, Effect::FocusAfterDelay(Tab::File(added.id)));
        // focus moves only when the caller applies the effect
        assert_eq!(s.focus(), Tab::Code);
    }

    #[test]
    fn identifiers_stay_unique_after_removal() {
        let mut s = Session::new(BASE);
        s.add_file();
        let first = s.files()[0].id;
        s.remove_file(first, &mut true);
        s.add_file();
        assert_ne!(s.files()[0].id, first);
        assert_eq!(s.files()[0].name, "file1");
    }

    #[test]
    fn remove_file_requires_confirmation() {
        let mut s = Session::new(BASE);
        s.add_file();
        s.add_file();
        let target = s.files()[1].id;
        s.set_focus(Tab::File(target));

        let mut declined = Asked(Vec::new(), false);
        assert!(!s.remove_file(target, &mut declined));
        assert_eq!(declined.0, [REMOVE_FILE_PROMPT]);
        assert_eq!(s.files().len(), 2);
        assert_eq!(s.focus(), Tab::File(target));

        assert!(s.remove_file(target, &mut true));
        assert_eq!(s.files().len(), 1);
        assert_eq!(s.files()[0].name, "file1");
        assert_eq!(s.focus(), Tab::Code);
    }

    #[test]
    fn remove_unknown_file_does_not_ask() {
        let mut s = Session::new(BASE);
        let mut asked = Asked(Vec::new(), true);
        assert!(!s.remove_file(FileId(42), &mut asked));
        assert!(asked.0.is_empty());
    }

    #[test]
    fn submissions_carry_current_code_and_files() {
        let mut s = Session::with_sources(BASE, "plot(a)".into(), vec![("a".to_string(), "1".to_string())]);
        s.add_file();
        let id = s.files()[1].id;
        s.file_mut(id).unwrap().content = "2".into();
        s.rename_file(id, " b ");

        let sub = s.save();
        let mut want = BTreeMap::new();
        want.insert("a".to_string(), "1".to_string());
        want.insert("b".to_string(), "2".to_string());
        assert_eq!(sub.kind, SubmitKind::Save);
        assert_eq!(sub.payload, PlotData { code: "plot(a)".into(), files: want });
    }

    #[test]
    fn run_result_replaces_the_previous_one() {
        let mut s = Session::new(BASE);
        let sub = s.run();
        assert!(s.complete_run(sub.generation, Outcome::Failure { error: "bad".into() }));
        assert_eq!(s.panel(), Panel::Output);
        assert_eq!(s.output(), "");

        let sub = s.run();
        assert!(s.complete_run(
            sub.generation,
            Outcome::Success { output: "ok".into(), svg: "<svg/>".into() }
        ));
        assert_eq!(s.error(), None);
        assert_eq!((s.output(), s.svg()), ("ok", "<svg/>"));
        assert_eq!(s.panel(), Panel::Plot);
        assert!(!s.is_loading());
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut s = Session::new(BASE);
        let first = s.run();
        let second = s.run();
        assert!(!s.complete_run(first.generation, Outcome::Failure { error: "old".into() }));
        assert!(s.is_loading());
        assert!(s.result().is_none());
        assert!(s.complete_run(
            second.generation,
            Outcome::Success { output: "new".into(), svg: String::new() }
        ));
        assert!(!s.is_loading());
    }

    #[test]
    fn save_updates_id_location_and_links() {
        let mut s = Session::new(BASE);
        let before = s.edit_url();
        let sub = s.save();
        let effect = s.complete_save(
            sub.generation,
            SaveReply {
                outcome: Outcome::Success { output: String::new(), svg: "<svg/>".into() },
                id: "Zx81q".into(),
            },
        );
        assert_eq!(effect, Some(Effect::PushLocation("/edit/Zx81q".into())));
        assert_eq!(s.id(), "Zx81q");
        assert_ne!(s.edit_url(), before);
        assert_eq!(s.edit_url(), "http://gg.example.com/edit/Zx81q");
        assert_eq!(s.image_url(), "http://gg.example.com/plot/Zx81q.svg");
    }

    #[test]
    fn failed_save_keeps_the_previous_id() {
        let mut s = Session::new(BASE);
        s.hydrate("keep1", record("", &[], Some("x")));
        let sub = s.save();
        let effect = s.complete_save(
            sub.generation,
            SaveReply { outcome: Outcome::Failure { error: "Cannot execute empty code".into() }, id: String::new() },
        );
        assert!(effect.is_none());
        assert_eq!(s.id(), "keep1");
        assert_eq!(s.error(), Some("Cannot execute empty code"));
        assert_eq!(s.svg(), "");
    }

    #[test]
    fn save_reply_with_a_path_like_id_is_ignored() {
        let mut s = Session::new(BASE);
        s.hydrate("keep1", record("", &[], Some("x")));
        let sub = s.save();
        let effect = s.complete_save(
            sub.generation,
            SaveReply {
                outcome: Outcome::Success { output: String::new(), svg: "<svg/>".into() },
                id: "../../tmp/pwn".into(),
            },
        );
        assert!(effect.is_none());
        assert_eq!(s.id(), "keep1");
        assert_eq!(s.location(), "/edit/keep1");
        assert_eq!(s.edit_url(), "http://gg.example.com/edit/keep1");
        assert!(!s.is_loading());
    }

    #[test]
    fn focus_on_missing_file_falls_back_to_code() {
        let mut s = Session::new(BASE);
        s.set_focus(Tab::File(FileId(7)));
        assert_eq!(s.focus(), Tab::Code);
    }
}
