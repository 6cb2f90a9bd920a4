//! Reporter that stores every diagnostic for later inspection.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::diagnostics::{Diagnostic, Reporter};

#[derive(Clone, Debug, Default)]
pub struct CollectingReporter {
    notices: Arc<Mutex<Vec<Diagnostic>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all diagnostics received so far.
    pub fn notices(&self) -> Vec<Diagnostic> {
        self.notices.lock().clone()
    }

    /// Number of diagnostics matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Diagnostic) -> bool) -> usize {
        self.notices.lock().iter().filter(|d| predicate(d)).count()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        self.notices.lock().push(diagnostic.clone());
    }
}
