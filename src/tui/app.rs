use tui_input::{Input, InputRequest};

use crate::config::is_accepted_audio;
use crate::history_list::{rows, HistoryRow, SortOrder};
use crate::models::UploadedFile;
use crate::pipeline::{Outcome, Pipeline, Submission};
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Upload,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    About,
    ClearConfirm,
}

pub const UNSUPPORTED_FILE_MESSAGE: &str = "Unsupported file type. Choose a WAV, MP3, or AIFF file.";

pub struct App<S: KeyValueStore> {
    pub pipeline: Pipeline<S>,
    pub model: String,
    pub input: Input,
    pub input_message: Option<String>,
    pub focus: Focus,
    pub overlay: Overlay,
    pub sort: SortOrder,
    /// Cursor into the sorted history rows
    pub cursor: usize,
    pub scroll_offset: usize,
    /// Visible height of the history list (updated each frame by the renderer)
    pub visible_rows: usize,
    /// Vertical scroll of the result pane
    pub detail_scroll: u16,
    pub pending_file: Option<String>,
    pub tick: usize,
    pub should_quit: bool,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(pipeline: Pipeline<S>, model: impl Into<String>) -> Self {
        Self {
            pipeline,
            model: model.into(),
            input: Input::default(),
            input_message: None,
            focus: Focus::Upload,
            overlay: Overlay::None,
            sort: SortOrder::default(),
            cursor: 0,
            scroll_offset: 0,
            visible_rows: 10,
            detail_scroll: 0,
            pending_file: None,
            tick: 0,
            should_quit: false,
        }
    }

    pub fn history_rows(&self) -> Vec<HistoryRow<'_>> {
        rows(self.pipeline.history(), self.pipeline.selection(), self.sort)
    }

    /// Start an analysis for a typed or dropped path. Only accepted audio types get
    /// through; anything else leaves a hint under the input.
    pub fn submit_path(&mut self, raw: &str) -> Option<Submission> {
        let path = clean_dropped_path(raw);
        if path.is_empty() {
            return None;
        }
        if !is_accepted_audio(&path) {
            self.input_message = Some(UNSUPPORTED_FILE_MESSAGE.to_string());
            return None;
        }

        let file = UploadedFile::from_path(std::path::Path::new(&path));
        let submission = self.pipeline.begin(file.as_ref())?;
        self.pending_file = Some(submission.file_name().to_string());
        self.input.reset();
        self.input_message = None;
        self.detail_scroll = 0;
        Some(submission)
    }

    pub fn submit_input(&mut self) -> Option<Submission> {
        let value = self.input.value().to_string();
        self.submit_path(&value)
    }

    pub fn apply(&mut self, outcome: Outcome) {
        if outcome != Outcome::Stale {
            self.pending_file = None;
        }
        if let Outcome::Added(_) = outcome {
            self.cursor = 0;
            self.scroll_offset = 0;
            self.detail_scroll = 0;
        }
    }

    /// Toggle the entry under the cursor; a change scrolls the result pane to the top.
    pub fn toggle_at_cursor(&mut self) -> bool {
        let id = match self.history_rows().get(self.cursor) {
            Some(row) if row.enabled => row.item.id,
            _ => return false,
        };
        let changed = self.pipeline.toggle(id);
        if changed {
            self.detail_scroll = 0;
        }
        changed
    }

    /// "Analyze another track" / "Try again".
    pub fn reset_to_upload(&mut self) {
        self.pipeline.reset_to_upload();
        self.pending_file = None;
        self.input.reset();
        self.input_message = None;
        self.detail_scroll = 0;
        self.focus = Focus::Upload;
    }

    pub fn request_clear(&mut self) {
        if !self.pipeline.history().is_empty() {
            self.overlay = Overlay::ClearConfirm;
        }
    }

    pub fn confirm_clear(&mut self) {
        self.pipeline.clear_history();
        self.cursor = 0;
        self.scroll_offset = 0;
        self.overlay = Overlay::None;
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.cycle();
        self.cursor = 0;
        self.scroll_offset = 0;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Upload => Focus::History,
            Focus::History => Focus::Upload,
        };
    }

    pub fn select_next(&mut self) {
        let len = self.pipeline.history().len();
        if len > 0 {
            self.cursor = (self.cursor + 1).min(len - 1);
            self.ensure_visible();
        }
    }

    pub fn select_prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
        self.ensure_visible();
    }

    /// Adjust scroll_offset so that the cursor is within the visible window.
    fn ensure_visible(&mut self) {
        if self.visible_rows == 0 {
            return;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + self.visible_rows {
            self.scroll_offset = self.cursor - self.visible_rows + 1;
        }
    }

    pub fn scroll_detail(&mut self, delta: i16) {
        self.detail_scroll = self.detail_scroll.saturating_add_signed(delta);
    }

    pub fn edit_input(&mut self, request: InputRequest) {
        self.input.handle(request);
        self.input_message = None;
    }

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }
}

/// Terminals paste dropped files as paths, sometimes quoted, escaped or as a
/// `file://` URL.
pub fn clean_dropped_path(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(trimmed);
    let path = unquoted.strip_prefix("file://").unwrap_or(unquoted);
    path.replace("\\ ", " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalyzeError;
    use crate::history::HistoryStore;
    use crate::models::{AnalysisResult, Recommendation};
    use crate::storage::MemoryStore;
    use crate::view::View;

    fn app() -> App<MemoryStore> {
        App::new(
            Pipeline::new(HistoryStore::load(MemoryStore::new())),
            "gemini-2.5-flash",
        )
    }

    fn result(score: f64) -> AnalysisResult {
        AnalysisResult {
            overall_score: score,
            recommendation: Recommendation::NeedsWork,
            summary: "Close.".to_string(),
            metrics: Vec::new(),
        }
    }

    fn analyze(app: &mut App<MemoryStore>, path: &str, score: f64) {
        let submission = app.submit_path(path).unwrap();
        let outcome = app.pipeline.complete(submission, Ok(result(score)));
        app.apply(outcome);
    }

    #[test]
    fn test_clean_dropped_path() {
        assert_eq!(clean_dropped_path("  '/tmp/my mix.wav' "), "/tmp/my mix.wav");
        assert_eq!(clean_dropped_path("\"/tmp/a.wav\""), "/tmp/a.wav");
        assert_eq!(clean_dropped_path("file:///tmp/a.wav"), "/tmp/a.wav");
        assert_eq!(clean_dropped_path("/tmp/my\\ mix.wav"), "/tmp/my mix.wav");
    }

    #[test]
    fn test_unsupported_type_never_reaches_pipeline() {
        let mut app = app();
        assert!(app.submit_path("/tmp/notes.txt").is_none());
        assert_eq!(app.input_message.as_deref(), Some(UNSUPPORTED_FILE_MESSAGE));
        assert!(!app.pipeline.is_loading());
    }

    #[test]
    fn test_submit_sends_name_only() {
        let mut app = app();
        let submission = app.submit_path("/home/me/mixes/track1.wav").unwrap();
        assert_eq!(submission.file_name(), "track1.wav");
        assert_eq!(app.pending_file.as_deref(), Some("track1.wav"));
        assert_eq!(app.pipeline.view(), View::Loading);
    }

    #[test]
    fn test_toggle_at_cursor_respects_disabled_rows() {
        let mut app = app();
        analyze(&mut app, "a.wav", 60.0);
        analyze(&mut app, "b.wav", 70.0);
        analyze(&mut app, "c.wav", 80.0);

        // c.wav selected; newest-first rows: c, b, a
        app.cursor = 1;
        assert!(app.toggle_at_cursor());
        assert_eq!(app.pipeline.selection().len(), 2);

        app.cursor = 2;
        assert!(!app.toggle_at_cursor());
        assert_eq!(app.pipeline.selection().len(), 2);

        // Deselecting stays possible
        app.cursor = 0;
        assert!(app.toggle_at_cursor());
        assert_eq!(app.pipeline.selection().len(), 1);
    }

    #[test]
    fn test_selection_change_scrolls_to_top() {
        let mut app = app();
        analyze(&mut app, "a.wav", 60.0);
        analyze(&mut app, "b.wav", 70.0);
        app.detail_scroll = 12;
        app.cursor = 1;
        assert!(app.toggle_at_cursor());
        assert_eq!(app.detail_scroll, 0);
    }

    #[test]
    fn test_failure_then_retry() {
        let mut app = app();
        let submission = app.submit_path("a.wav").unwrap();
        let outcome = app
            .pipeline
            .complete(submission, Err(AnalyzeError::Other("503 Service Unavailable".to_string())));
        app.apply(outcome);
        assert!(matches!(app.pipeline.view(), View::Error(_)));

        app.reset_to_upload();
        assert_eq!(app.pipeline.view(), View::Upload);
        assert_eq!(app.focus, Focus::Upload);
    }

    #[test]
    fn test_clear_needs_confirmation_and_history() {
        let mut app = app();
        app.request_clear();
        assert_eq!(app.overlay, Overlay::None);

        analyze(&mut app, "a.wav", 60.0);
        app.request_clear();
        assert_eq!(app.overlay, Overlay::ClearConfirm);
        app.confirm_clear();
        assert!(app.pipeline.history().is_empty());
        assert!(app.pipeline.selection().is_empty());
        assert_eq!(app.overlay, Overlay::None);
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut app = app();
        app.select_next();
        assert_eq!(app.cursor, 0);
        analyze(&mut app, "a.wav", 60.0);
        analyze(&mut app, "b.wav", 70.0);
        app.select_next();
        app.select_next();
        assert_eq!(app.cursor, 1);
        app.select_prev();
        app.select_prev();
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn test_edit_input() {
        let mut app = app();
        for c in "a.wav".chars() {
            app.edit_input(InputRequest::InsertChar(c));
        }
        app.edit_input(InputRequest::DeletePrevChar);
        assert_eq!(app.input.value(), "a.wa");
    }
}
