//! Retry logic for transient database failures.
//!
//! Read paths retry with exponential backoff; constraint violations and
//! other application errors surface immediately. Write paths in the store
//! are single-shot so a racing duplicate insert is reported, not retried.

use sqlx::Error as SqlxError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Execute a database operation with automatic retry on transient failures.
pub async fn execute_with_retry<F, Fut, T>(mut f: F, max_attempts: u32) -> Result<T, SqlxError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SqlxError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && is_retriable_error(&e) => {
                let backoff_ms = 100_u64 * 2_u64.pow(attempt - 1);
                warn!(
                    "Database operation failed (attempt {}/{}): {}. Retrying in {}ms",
                    attempt, max_attempts, e, backoff_ms
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Check if a database error is likely transient.
fn is_retriable_error(e: &SqlxError) -> bool {
    match e {
        SqlxError::Io(_) | SqlxError::PoolTimedOut | SqlxError::PoolClosed => true,
        SqlxError::Database(db) => {
            // Constraint violations are application errors, never retriable
            if db.code().as_deref() == Some("23505") {
                return false;
            }
            let msg = db.message().to_lowercase();
            msg.contains("connection")
                || msg.contains("timeout")
                || msg.contains("could not serialize")
                || msg.contains("deadlock detected")
                || msg.contains("too many clients")
                || msg.contains("server closed the connection")
        }
        _ => false,
    }
}
