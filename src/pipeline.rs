use std::sync::mpsc;
use std::sync::Arc;

use chrono::Local;
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::analyzer::{AnalyzeError, Analyzer};
use crate::error::{classify_error, ErrorKind};
use crate::history::HistoryStore;
use crate::models::{AnalysisResult, HistoryId, HistoryItem, UploadedFile};
use crate::selection::Selection;
use crate::storage::KeyValueStore;
use crate::view::{select_view, View};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Hands out strictly increasing ids derived from wall-clock milliseconds.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn seeded(latest: Option<HistoryId>) -> Self {
        Self {
            last: latest.map(|id| id.0).unwrap_or(0),
        }
    }

    /// `None` once the id space is used up; ids never wrap.
    pub fn next(&mut self, now_millis: u64) -> Option<HistoryId> {
        let id = now_millis.max(self.last.checked_add(1)?);
        self.last = id;
        Some(HistoryId(id))
    }
}

/// Observable state, published after every transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub selection: Vec<HistoryId>,
    pub loading: bool,
    pub error: Option<ErrorKind>,
    pub history_len: usize,
}

/// Ticket for one in-flight analysis. Results are only applied while its
/// generation is current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    generation: u64,
    file_name: String,
}

impl Submission {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Added(HistoryId),
    Failed(ErrorKind),
    /// The pipeline moved on (reset or newer submission); the response was dropped
    Stale,
}

/// Sent from an analysis task back to the event loop.
#[derive(Debug)]
pub struct Completion {
    pub submission: Submission,
    pub result: Result<AnalysisResult, AnalyzeError>,
}

/// Run the analysis for `submission` on the runtime and report back over `tx`.
pub fn spawn_analysis(
    handle: &Handle,
    analyzer: Arc<dyn Analyzer>,
    submission: Submission,
    tx: mpsc::Sender<Completion>,
) {
    handle.spawn(async move {
        let result = analyzer.analyze(submission.file_name()).await;
        // The receiver is gone only when the UI has exited
        let _ = tx.send(Completion { submission, result });
    });
}

/// Upload-to-result state machine: history, selection, loading flag and error.
pub struct Pipeline<S: KeyValueStore> {
    history: HistoryStore<S>,
    selection: Selection,
    loading: bool,
    error: Option<ErrorKind>,
    generation: u64,
    ids: IdGenerator,
    state_tx: watch::Sender<Snapshot>,
}

impl<S: KeyValueStore> Pipeline<S> {
    pub fn new(history: HistoryStore<S>) -> Self {
        let ids = IdGenerator::seeded(history.latest_id());
        let (state_tx, _) = watch::channel(Snapshot {
            history_len: history.len(),
            ..Snapshot::default()
        });
        Self {
            history,
            selection: Selection::new(),
            loading: false,
            error: None,
            generation: 0,
            ids,
            state_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            selection: self.selection.ids().to_vec(),
            loading: self.loading,
            error: self.error,
            history_len: self.history.len(),
        }
    }

    fn notify(&self) {
        self.state_tx.send_replace(self.snapshot());
    }

    /// Enter Loading for `file`. Returns `None` without touching state when there is
    /// no file or an analysis is already in flight.
    pub fn begin(&mut self, file: Option<&UploadedFile>) -> Option<Submission> {
        let file = file?;
        if self.loading {
            tracing::debug!("Ignoring {}: an analysis is already in flight", file.name);
            return None;
        }

        self.generation += 1;
        self.loading = true;
        self.error = None;
        self.selection.reset();
        self.notify();

        tracing::info!("Analyzing {}", file.name);
        Some(Submission {
            generation: self.generation,
            file_name: file.name.clone(),
        })
    }

    /// Apply the settled analysis call for `submission`.
    pub fn complete(
        &mut self,
        submission: Submission,
        result: Result<AnalysisResult, AnalyzeError>,
    ) -> Outcome {
        if !self.loading || submission.generation != self.generation {
            tracing::debug!(
                "Dropping stale response for {} (generation {}, current {})",
                submission.file_name,
                submission.generation,
                self.generation
            );
            return Outcome::Stale;
        }

        self.loading = false;
        let outcome = match result {
            Ok(result) => {
                let now = Local::now();
                match self.ids.next(now.timestamp_millis().max(0) as u64) {
                    Some(id) => {
                        tracing::info!(
                            "Analysis of {} scored {} ({})",
                            submission.file_name,
                            result.overall_score,
                            result.recommendation
                        );
                        self.history.append(HistoryItem {
                            id,
                            file_name: submission.file_name,
                            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
                            result,
                        });
                        self.selection = Selection::only(id);
                        Outcome::Added(id)
                    }
                    None => {
                        tracing::error!(
                            "No history id left after {:?}; {} was not recorded",
                            self.history.latest_id(),
                            submission.file_name
                        );
                        self.fail(ErrorKind::Unknown)
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Analysis of {} failed: {}", submission.file_name, e);
                self.fail(classify_error(&e))
            }
        };
        self.notify();
        outcome
    }

    fn fail(&mut self, kind: ErrorKind) -> Outcome {
        self.selection.reset();
        self.error = Some(kind);
        Outcome::Failed(kind)
    }

    /// Begin, await the collaborator, and apply the result in one step.
    pub async fn submit<A: Analyzer + ?Sized>(
        &mut self,
        analyzer: &A,
        file: Option<&UploadedFile>,
    ) -> Option<Outcome> {
        let submission = self.begin(file)?;
        let result = analyzer.analyze(submission.file_name()).await;
        Some(self.complete(submission, result))
    }

    /// Back to Idle from any state. Any in-flight response becomes stale.
    pub fn reset_to_upload(&mut self) {
        self.generation += 1;
        self.selection.reset();
        self.error = None;
        self.loading = false;
        self.notify();
    }

    /// Toggle a history entry in or out of the selection.
    /// Ignored while loading or for ids not in history.
    pub fn toggle(&mut self, id: HistoryId) -> bool {
        if self.loading || !self.history.contains(id) {
            return false;
        }
        let changed = self.selection.toggle(id);
        if changed {
            self.error = None;
            self.notify();
        }
        changed
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.selection.reset_on_clear(self.history.items());
        tracing::info!("History cleared");
        self.notify();
    }

    pub fn view(&self) -> View<'_> {
        select_view(self.history.items(), &self.selection, self.loading, self.error)
    }

    pub fn history(&self) -> &[HistoryItem] {
        self.history.items()
    }

    pub fn history_store(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<ErrorKind> {
        self.error
    }
}
