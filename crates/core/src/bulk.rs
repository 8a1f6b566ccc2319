//! Per-item application of an operation to a list of ids.

use std::future::Future;

use serde::Serialize;
use tracing::warn;

use crate::error::ServiceError;

/// One item of a batch that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    /// The id that failed.
    pub id: String,
    /// Why it failed.
    pub reason: String,
}

/// Result of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// Number of ids processed successfully.
    pub succeeded: usize,
    /// Ids that failed, in input order.
    pub failures: Vec<BulkFailure>,
}

impl BulkOutcome {
    /// True when ids were given but none succeeded.
    #[must_use]
    pub fn nothing_succeeded(&self) -> bool {
        self.succeeded == 0 && !self.failures.is_empty()
    }
}

/// Applies `op` to every id, recording failures instead of stopping.
///
/// # Errors
///
/// Returns `ServiceError::Validation` when `ids` is empty. Item errors never
/// abort the batch.
pub async fn apply_each<F, Fut>(
    action: &str,
    ids: &[String],
    mut op: F,
) -> Result<BulkOutcome, ServiceError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<(), ServiceError>>,
{
    if ids.is_empty() {
        return Err(ServiceError::Validation("ids must not be empty".to_string()));
    }

    let mut outcome = BulkOutcome::default();
    for id in ids {
        match op(id.clone()).await {
            Ok(()) => outcome.succeeded += 1,
            Err(e) => {
                warn!(action, id = %id, error = %e, "Bulk item failed");
                outcome.failures.push(BulkFailure {
                    id: id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_empty_list_is_rejected_before_running() {
        let mut calls = 0;
        let result = apply_each("noop", &[], |_| {
            calls += 1;
            async { Ok(()) }
        })
        .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let outcome = apply_each("check", &ids(&["a", "b", "c"]), |id| async move {
            if id == "b" {
                Err(ServiceError::NotFound(format!("{id} not found")))
            } else {
                Ok(())
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(
            outcome.failures,
            vec![BulkFailure {
                id: "b".into(),
                reason: "b not found".into()
            }]
        );
        assert!(!outcome.nothing_succeeded());
    }

    #[tokio::test]
    async fn test_nothing_succeeded() {
        let outcome = apply_each("check", &ids(&["x", "y"]), |_| async {
            Err(ServiceError::Storage("down".into()))
        })
        .await
        .unwrap();

        assert_eq!(outcome.succeeded, 0);
        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome.nothing_succeeded());
    }
}
