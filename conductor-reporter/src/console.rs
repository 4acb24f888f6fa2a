//! Live console reporter.
//!
//! Prints one line per loader transition and, once the run is classified, a
//! state board with one row per component.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use colored::{ColoredString, Colorize};
use conductor_core::ComponentDescriptor;
use conductor_loader::{LoadOutcome, ProgressObserver, ProgressStatus, SuiteClassification};

use crate::summary::classification_label;

/// Where a component stands from the reporter's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    Pending,
    Loading,
    Loaded,
    Confirmed,
    Unconfirmed,
    Failed,
}

impl ComponentState {
    pub fn label(self) -> &'static str {
        match self {
            ComponentState::Pending => "pending",
            ComponentState::Loading => "loading",
            ComponentState::Loaded => "loaded",
            ComponentState::Confirmed => "confirmed",
            ComponentState::Unconfirmed => "unconfirmed",
            ComponentState::Failed => "failed",
        }
    }

    fn indicator(self) -> &'static str {
        match self {
            ComponentState::Pending => "·",
            ComponentState::Loading => "…",
            ComponentState::Loaded | ComponentState::Confirmed => "✔",
            ComponentState::Unconfirmed => "?",
            ComponentState::Failed => "✘",
        }
    }

    fn colorize(self, text: &str) -> ColoredString {
        match self {
            ComponentState::Pending => text.bright_black(),
            ComponentState::Loading => text.cyan(),
            ComponentState::Loaded | ComponentState::Confirmed => text.green(),
            ComponentState::Unconfirmed => text.yellow(),
            ComponentState::Failed => text.red(),
        }
    }
}

impl From<LoadOutcome> for ComponentState {
    fn from(outcome: LoadOutcome) -> Self {
        match outcome {
            LoadOutcome::Loaded => ComponentState::Loaded,
            LoadOutcome::Confirmed => ComponentState::Confirmed,
            LoadOutcome::Unconfirmed => ComponentState::Unconfirmed,
            LoadOutcome::Failed => ComponentState::Failed,
        }
    }
}

struct Board<W> {
    out: W,
    states: Vec<ComponentState>,
    color: bool,
}

/// [`ProgressObserver`] that renders to any writer.
///
/// Write failures are logged and otherwise ignored: a broken terminal must
/// not affect the run being reported.
pub struct ConsoleReporter<W: Write + Send> {
    board: Mutex<Board<W>>,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self::with_color(out, true)
    }

    /// Reporter without ANSI colors.
    pub fn plain(out: W) -> Self {
        Self::with_color(out, false)
    }

    fn with_color(out: W, color: bool) -> Self {
        Self {
            board: Mutex::new(Board {
                out,
                states: Vec::new(),
                color,
            }),
        }
    }

    /// Current state of every component, in manifest order.
    pub fn states(&self) -> Vec<ComponentState> {
        self.lock().states.clone()
    }

    pub fn into_inner(self) -> W {
        self.board
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .out
    }

    fn lock(&self) -> MutexGuard<'_, Board<W>> {
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> ProgressObserver for ConsoleReporter<W> {
    fn on_progress(&self, descriptors: &[ComponentDescriptor], index: usize, status: &ProgressStatus) {
        let mut board = self.lock();
        if let Err(err) = board.apply(descriptors, index, status) {
            tracing::warn!(error = %err, "progress report write failed");
        }
    }
}

impl<W: Write> Board<W> {
    fn apply(
        &mut self,
        descriptors: &[ComponentDescriptor],
        index: usize,
        status: &ProgressStatus,
    ) -> io::Result<()> {
        let total = descriptors.len();
        // A new run (or a different manifest) starts from a clean board.
        if self.states.len() != total || (index == 0 && *status == ProgressStatus::Starting) {
            self.states = vec![ComponentState::Pending; total];
        }

        match status {
            ProgressStatus::Starting => {
                let Some(descriptor) = descriptors.get(index) else {
                    return Ok(());
                };
                self.states[index] = ComponentState::Loading;
                let label = self.paint(ComponentState::Loading, "loading");
                writeln!(
                    self.out,
                    "[{}/{}] {label} {} ({})",
                    index + 1,
                    total,
                    descriptor.display_name,
                    descriptor.id,
                )
            }
            ProgressStatus::Settled {
                outcome,
                error,
                loaded,
                failed,
            } => {
                let Some(descriptor) = descriptors.get(index) else {
                    return Ok(());
                };
                let state = ComponentState::from(*outcome);
                self.states[index] = state;
                let mark = self.paint(state, state.indicator());
                let label = self.paint(state, state.label());
                match error {
                    Some(message) => writeln!(
                        self.out,
                        "[{}/{}] {mark} {} {label}: {message}",
                        index + 1,
                        total,
                        descriptor.id,
                    ),
                    None => writeln!(
                        self.out,
                        "[{}/{}] {mark} {} {label} ({loaded} loaded, {failed} failed)",
                        index + 1,
                        total,
                        descriptor.id,
                    ),
                }
            }
            ProgressStatus::Completed {
                loaded,
                failed,
                elapsed_ms,
            } => writeln!(
                self.out,
                "finished {total} components in {elapsed_ms} ms: {loaded} loaded, {failed} failed",
            ),
            ProgressStatus::Classified(classification) => {
                self.render_board(descriptors)?;
                let label = self.paint_classification(*classification);
                writeln!(self.out, "suite: {label}")?;
                self.out.flush()
            }
        }
    }

    fn render_board(&mut self, descriptors: &[ComponentDescriptor]) -> io::Result<()> {
        for (descriptor, state) in descriptors.iter().zip(self.states.clone()) {
            let mark = self.paint(state, state.indicator());
            let label = self.paint(state, &format!("{:<12}", state.label()));
            let critical = if descriptor.critical { "critical" } else { "" };
            writeln!(
                self.out,
                "  {mark} {:<24} {label} {critical}",
                descriptor.id.as_str(),
            )?;
        }
        Ok(())
    }

    fn paint(&self, state: ComponentState, text: &str) -> String {
        if self.color {
            state.colorize(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_classification(&self, classification: SuiteClassification) -> String {
        let label = classification_label(classification);
        if !self.color {
            return label.to_string();
        }
        match classification {
            SuiteClassification::Success => label.green().bold().to_string(),
            SuiteClassification::Degraded => label.yellow().bold().to_string(),
            SuiteClassification::CriticalFailure => label.red().bold().to_string(),
        }
    }
}
