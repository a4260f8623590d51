//! Engine knobs for a validation run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::store::KeyStoreKind;

/// Rows between two progress events.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Rows between two cancellation checks inside a file.
pub(crate) const CANCEL_CHECK_INTERVAL: u64 = 10_000;

/// Shared flag that aborts a run at the next checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for [`validate_submission`](crate::validate_submission).
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// Backing store for primary key sets.
    pub store: KeyStoreKind,
    /// Run experimental data types on the rayon pool.
    /// Has no effect without the `parallel` feature.
    pub parallel_branches: bool,
    pub progress_interval: u64,
    pub cancel: CancelFlag,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            store: KeyStoreKind::default(),
            parallel_branches: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            cancel: CancelFlag::new(),
        }
    }
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_store(mut self, store: KeyStoreKind) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn with_parallel_branches(mut self, enabled: bool) -> Self {
        self.parallel_branches = enabled;
        self
    }

    /// Zero disables progress events.
    #[must_use]
    pub fn with_progress_interval(mut self, rows: u64) -> Self {
        self.progress_interval = rows;
        self
    }

    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
}
