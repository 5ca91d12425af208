use crate::errors::ChromAlignError;
use indicatif::{
    ProgressBar,
    ProgressStyle,
};
use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use tracing::{
    info,
    warn,
};

/// Cooperative cancellation flag, shared between the caller and one or more
/// units of work.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Polled at iteration boundaries, `Err(Cancelled)` once cancelled.
    pub fn check(&self) -> Result<(), ChromAlignError> {
        if self.is_cancelled() {
            Err(ChromAlignError::Cancelled)
        } else {
            Ok(())
        }
    }
}

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} {msg} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})";

/// Fraction of processed units of work over the total.
///
/// Backed by an [`indicatif::ProgressBar`], hidden unless built with
/// [`ProgressTracker::visible`]. The total is fixed by the first call to
/// [`ProgressTracker::init_total`], so enclosing units can claim it and the
/// fraction never goes backwards.
#[derive(Clone)]
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("position", &self.bar.position())
            .field("length", &self.bar.length())
            .finish()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::hidden()
    }
}

impl ProgressTracker {
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// A bar drawn to stderr, labeled with `msg`.
    pub fn visible(msg: impl Into<String>) -> Self {
        let bar = ProgressBar::new(0).with_message(msg.into());
        // The template is a constant, a failure here would be a typo.
        if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
            bar.set_style(style);
        }
        Self { bar }
    }

    /// Sets the total units, unless a total was already set.
    /// Returns whether this call set it.
    pub fn init_total(&self, total: u64) -> bool {
        match self.bar.length() {
            Some(x) if x > 0 => false,
            _ => {
                self.bar.set_length(total);
                true
            }
        }
    }

    pub fn inc(&self, units: u64) {
        self.bar.inc(units);
    }

    /// Moves the position forward to `pos`, never backwards.
    pub fn advance_to(&self, pos: u64) {
        let current = self.bar.position();
        if pos > current {
            self.bar.inc(pos - current);
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn fraction(&self) -> f64 {
        match self.bar.length() {
            Some(total) if total > 0 => (self.bar.position() as f64 / total as f64).min(1.0),
            _ => 0.0,
        }
    }

    pub fn finish(&self) {
        if let Some(total) = self.bar.length() {
            self.advance_to(total);
        }
        self.bar.finish();
    }
}

/// Cancellation and progress handles handed to one unit of work.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    pub cancel: CancellationToken,
    pub progress: ProgressTracker,
}

impl TaskContext {
    pub fn new(cancel: CancellationToken, progress: ProgressTracker) -> Self {
        Self { cancel, progress }
    }

    /// Context that is never cancelled and reports nowhere.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Same cancellation token, fresh hidden progress.
    /// Used for units that run in parallel under one caller.
    pub fn fork(&self) -> Self {
        Self {
            cancel: self.cancel.clone(),
            progress: ProgressTracker::hidden(),
        }
    }

    pub fn check(&self) -> Result<(), ChromAlignError> {
        self.cancel.check()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Finished,
    Cancelled,
    Error,
}

/// Status and message pair describing how a unit of work ended.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport {
    pub status: TaskStatus,
    pub message: String,
}

impl TaskReport {
    pub fn from_result<T>(task_name: &str, result: &Result<T, ChromAlignError>) -> Self {
        let out = match result {
            Ok(_) => Self {
                status: TaskStatus::Finished,
                message: format!("{} finished", task_name),
            },
            Err(ChromAlignError::Cancelled) => Self {
                status: TaskStatus::Cancelled,
                message: format!("{} cancelled", task_name),
            },
            Err(e) => Self {
                status: TaskStatus::Error,
                message: format!("{} failed: {}", task_name, e),
            },
        };
        match out.status {
            TaskStatus::Finished => info!("{}", out.message),
            _ => warn!("{}", out.message),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigurationError;

    #[test]
    fn test_progress_is_monotonic() {
        let progress = ProgressTracker::hidden();
        assert_eq!(progress.fraction(), 0.0);
        assert!(progress.init_total(10));
        assert!(!progress.init_total(50));

        let mut last = 0.0;
        for i in 0..10 {
            progress.inc(1);
            progress.advance_to(i);
            let f = progress.fraction();
            assert!(f >= last);
            last = f;
        }
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn test_report_statuses() {
        let ok: Result<(), ChromAlignError> = Ok(());
        assert_eq!(
            TaskReport::from_result("Join aligner", &ok).status,
            TaskStatus::Finished
        );

        let cancelled: Result<(), ChromAlignError> = Err(ChromAlignError::Cancelled);
        assert_eq!(
            TaskReport::from_result("Join aligner", &cancelled).status,
            TaskStatus::Cancelled
        );

        let failed: Result<(), ChromAlignError> = Err(ConfigurationError::DuplicateDataFile {
            file: "a.mzML".into(),
        }
        .into());
        let report = TaskReport::from_result("Join aligner", &failed);
        assert_eq!(report.status, TaskStatus::Error);
        assert!(report.message.contains("a.mzML"));
    }

    #[test]
    fn test_cancellation_is_shared() {
        let ctx = TaskContext::detached();
        let forked = ctx.fork();
        assert!(forked.check().is_ok());
        ctx.cancel.cancel();
        assert!(forked.check().unwrap_err().is_cancelled());
    }
}
