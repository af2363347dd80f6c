use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::providers::{ProviderError, ProviderFuture, TranslationProvider};

/// Provider that replays queued outcomes and counts calls. Once the queue is
/// drained it echoes the input with a `[code]` prefix.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedProvider {
    outcomes: Arc<Mutex<VecDeque<Result<String, ProviderError>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_outcomes(outcomes: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes.into())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TranslationProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn translate(&self, text: String, target_code: String) -> ProviderFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.outcomes.lock().expect("outcomes lock").pop_front();
        Box::pin(async move { next.unwrap_or_else(|| Ok(format!("[{}] {}", target_code, text))) })
    }
}
