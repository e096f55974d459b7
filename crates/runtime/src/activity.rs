//! Policy-applying activity invocation wrapper.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::context::ActivityContext;
use crate::error::{ActivityError, ActivityFailure};
use crate::policy::ActivityOptions;

/// Invokes an activity under the given options.
///
/// `attempt` is called once per attempt with a fresh [`ActivityContext`].
/// Each attempt runs under the policy's start-to-close timeout and, when
/// configured, heartbeat monitoring. Failed attempts are retried with
/// exponential backoff until the policy's attempt budget is spent, unless
/// the error class is declared non-retryable.
///
/// Cancellation is checked before each attempt and again after each
/// backoff sleep; an attempt already in flight is never aborted by the
/// caller's token.
pub async fn invoke_activity<F, Fut, T>(
    name: &str,
    options: &ActivityOptions,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<T, ActivityFailure>
where
    F: FnMut(ActivityContext) -> Fut,
    Fut: Future<Output = Result<T, ActivityError>>,
{
    let policy = options.retry();
    let mut attempt_no: u32 = 1;

    loop {
        if cancel.is_cancelled() {
            tracing::debug!(activity = name, "cancellation observed before attempt");
            return Err(ActivityFailure::Cancelled {
                activity: name.to_string(),
            });
        }

        let ctx = ActivityContext::new(cancel.child_token());
        let outcome = run_attempt(options, &ctx, attempt(ctx.clone())).await;

        match outcome {
            Ok(value) => {
                tracing::debug!(activity = name, attempt = attempt_no, "activity succeeded");
                return Ok(value);
            }
            Err(cause) => {
                if policy.is_non_retryable(cause.class()) {
                    tracing::warn!(
                        activity = name,
                        attempt = attempt_no,
                        class = cause.class(),
                        error = %cause,
                        "activity failed with non-retryable error"
                    );
                    return Err(ActivityFailure::NonRetryable {
                        activity: name.to_string(),
                        cause,
                    });
                }

                if attempt_no >= policy.maximum_attempts() {
                    tracing::warn!(
                        activity = name,
                        attempts = attempt_no,
                        error = %cause,
                        "activity retry budget exhausted"
                    );
                    return Err(ActivityFailure::Exhausted {
                        activity: name.to_string(),
                        attempts: attempt_no,
                        cause,
                    });
                }

                let delay = policy.delay_for_attempt(attempt_no);
                metrics::counter!("activity_retries_total").increment(1);
                tracing::debug!(
                    activity = name,
                    attempt = attempt_no,
                    delay_ms = delay.as_millis() as u64,
                    error = %cause,
                    "activity attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt_no += 1;
            }
        }
    }
}

/// Runs a single attempt under the start-to-close timeout and, when
/// configured, the heartbeat monitor.
async fn run_attempt<T, Fut>(
    options: &ActivityOptions,
    ctx: &ActivityContext,
    fut: Fut,
) -> Result<T, ActivityError>
where
    Fut: Future<Output = Result<T, ActivityError>>,
{
    let deadline = options.start_to_close_timeout();
    let work = async {
        match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(ActivityError::timeout(format!(
                "start-to-close timeout after {}ms",
                deadline.as_millis()
            ))),
        }
    };

    match options.heartbeat_timeout() {
        Some(window) => {
            tokio::select! {
                result = work => result,
                () = ctx.heartbeat_expired(window) => Err(ActivityError::heartbeat_timeout(
                    format!("no heartbeat within {}ms", window.as_millis()),
                )),
            }
        }
        None => work.await,
    }
}
