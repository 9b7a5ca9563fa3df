//! Cancellable background validation.
//!
//! Validation of imported files runs on the blocking thread pool so that
//! decoding large PDFs never stalls the async runtime. A cancelled task
//! still runs to completion but its outcome is dropped.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::models::document::Document;
use crate::validation::{DocumentValidator, ValidatedDocument};

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Handle to a validation running in the background.
#[derive(Debug)]
pub struct ValidationTask {
    token: CancellationToken,
    handle: JoinHandle<Option<ValidatedDocument>>,
}

/// Validate `document` on the blocking thread pool.
///
/// Must be called from within a tokio runtime.
pub fn spawn_validation(validator: Arc<DocumentValidator>, document: Document) -> ValidationTask {
    let token = CancellationToken::new();
    let task_token = token.clone();

    let handle = tokio::task::spawn_blocking(move || {
        if task_token.is_cancelled() {
            debug!(id = %document.id(), "Validation cancelled before start");
            return None;
        }

        let error = match panic::catch_unwind(AssertUnwindSafe(|| validator.validate(&document))) {
            Ok(result) => result.err(),
            Err(_) => {
                warn!(id = %document.id(), "Validation panicked");
                Some(ValidationError::Unknown)
            }
        };

        Some(ValidatedDocument { document, error })
    });

    ValidationTask { token, handle }
}

impl ValidationTask {
    /// Drop the outcome of this validation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for the outcome. `None` if the task was cancelled.
    pub async fn join(self) -> Option<ValidatedDocument> {
        let outcome = self.handle.await.unwrap_or_else(|e| {
            warn!(error = %e, "Validation task failed");
            None
        });

        if self.token.is_cancelled() {
            return None;
        }
        outcome
    }

    /// Call `callback` with the outcome unless the task is cancelled first.
    pub fn on_complete<F>(self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(ValidatedDocument) + Send + 'static,
    {
        tokio::spawn(async move {
            if let Some(validated) = self.join().await {
                callback(validated);
            }
        })
    }
}

/// Validate documents concurrently, keeping their order.
pub async fn validate_all(
    validator: Arc<DocumentValidator>,
    documents: Vec<Document>,
) -> Vec<ValidatedDocument> {
    let tasks: Vec<ValidationTask> = documents
        .into_iter()
        .map(|document| spawn_validation(Arc::clone(&validator), document))
        .collect();

    let mut validated = Vec::with_capacity(tasks.len());
    for task in tasks {
        if let Some(outcome) = task.join().await {
            validated.push(outcome);
        }
    }
    validated
}
