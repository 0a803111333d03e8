//! Runs retryable work on the runtime while recording its status.

use database::common::{RetryConfig, retry_notify};
use std::fmt::Display;
use std::future::Future;
use tokio::task::JoinError;
use tracing::{Instrument, info_span, warn};

use crate::models::{OperationId, OperationStatus};
use crate::store::OperationStatusStore;

/// Execute `operation` in a spawned task under `config`, recording status transitions.
///
/// Transitions written to `store`:
/// `Pending` before dispatch, `Retrying` before each backoff sleep, then
/// `Completed` or `Failed`. The terminal status is written by the spawned
/// task itself, so it is recorded even if the caller stops polling. The
/// caller awaits the task's handle; a panicking task is reported as
/// `Failed` and surfaces as `E::from(JoinError)`.
pub async fn run_tracked<F, Fut, T, E, P>(
    store: &OperationStatusStore,
    operation_id: &OperationId,
    config: &RetryConfig,
    should_retry: P,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send + 'static,
    E: Display + From<JoinError> + Send + 'static,
    P: Fn(&E) -> bool + Send + 'static,
{
    store.record(operation_id, OperationStatus::Pending);

    let task_store = store.clone();
    let task_id = operation_id.clone();
    let task_config = config.clone();
    let span = info_span!("operation", operation_id = %operation_id);

    let handle = tokio::spawn(
        async move {
            let result = retry_notify(operation, &task_config, should_retry, |_, _, _| {
                task_store.record(&task_id, OperationStatus::Retrying)
            })
            .await;

            let terminal = match &result {
                Ok(_) => OperationStatus::Completed,
                Err(_) => OperationStatus::Failed,
            };
            task_store.record(&task_id, terminal);

            result
        }
        .instrument(span),
    );

    match handle.await {
        Ok(result) => result,
        Err(join_error) => {
            warn!(operation_id = %operation_id, error = %join_error, "Operation task aborted");
            store.record(operation_id, OperationStatus::Failed);
            Err(E::from(join_error))
        }
    }
}
