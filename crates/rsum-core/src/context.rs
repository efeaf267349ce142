use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::job::{EntryOutcome, FileJob};
use crate::session::DigestSession;
use crate::{RunOptions, RunStatistics};

/// Shared cancellation flag. Clone it into a signal handler; run loops poll
/// it between files and the hashing loop polls it between chunks.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    pub fn new() -> Self { Self::default() }

    pub fn interrupt(&self) { self.0.store(true, Ordering::SeqCst); }

    pub fn is_interrupted(&self) -> bool { self.0.load(Ordering::SeqCst) }

    pub fn clear(&self) { self.0.store(false, Ordering::SeqCst); }
}

/// Byte progress within the file currently being hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub bytes_done:  u64,
    pub total_bytes: u64,
}

pub type ProgressFn = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Receives user-facing events of a run. Every method defaults to a no-op.
pub trait RunObserver {
    fn manifest_started(&mut self, _manifest: &str) {}
    fn file_started(&mut self, _job: &FileJob) {}
    fn file_finished(&mut self, _job: &FileJob, _outcome: &EntryOutcome) {}
    fn interrupted(&mut self) {}
    fn summary(&mut self, _stats: &RunStatistics, _elapsed: Duration) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl RunObserver for NullObserver {}

/// How a run ended, for the caller to turn into an exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunStatus {
    Success,
    Mismatch,
    Failure,
}

impl RunStatus {
    pub fn code(self) -> i32 {
        match self {
            RunStatus::Success => 0,
            RunStatus::Failure => -1,
            RunStatus::Mismatch => -2,
        }
    }

    pub fn worst(self, other: RunStatus) -> RunStatus { self.max(other) }
}

/// Everything one run needs: options, statistics, the shared digest
/// session, the interruption flag and the observer.
pub struct RunContext {
    pub options:            RunOptions,
    pub stats:              RunStatistics,
    pub(crate) session:     DigestSession,
    pub(crate) interrupt:   InterruptHandle,
    pub(crate) observer:    Box<dyn RunObserver>,
    pub(crate) on_progress: Option<ProgressFn>,
}

impl RunContext {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            stats: RunStatistics::default(),
            session: DigestSession::new(),
            interrupt: InterruptHandle::new(),
            observer: Box::new(NullObserver),
            on_progress: None,
        }
    }

    pub fn with_observer(mut self, observer: impl RunObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn with_progress(mut self, on_progress: impl Fn(&Progress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    pub fn with_interrupt(mut self, handle: InterruptHandle) -> Self {
        self.interrupt = handle;
        self
    }

    pub fn interrupt_handle(&self) -> InterruptHandle { self.interrupt.clone() }

    pub fn is_interrupted(&self) -> bool { self.interrupt.is_interrupted() }

    pub fn session(&self) -> &DigestSession { &self.session }

    /// Reset statistics and drop any hash context left by a previous run.
    pub fn begin_run(&mut self, batch: bool) {
        self.stats.reset();
        self.session.reset(batch);
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("options", &self.options)
            .field("stats", &self.stats)
            .field("session", &self.session)
            .field("interrupted", &self.interrupt.is_interrupted())
            .finish()
    }
}
