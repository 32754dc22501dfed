//! Fault containment for work executed on pool executors.

use std::any::Any;
use std::backtrace::Backtrace;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::error;

use crate::core::BenchError;

/// Render a panic payload as text.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Drive `fut`, catching any panic it raises.
///
/// A caught panic is logged with its message and a backtrace captured at the
/// containment point, then returned as [`BenchError::Fault`].
///
/// # Errors
///
/// Returns `BenchError::Fault` if `fut` panicked.
pub async fn contain<F>(tag: &str, function: &str, fut: F) -> Result<F::Output, BenchError>
where
    F: Future,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(output) => Ok(output),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            let backtrace = Backtrace::force_capture();
            error!(
                tag = tag,
                function = function,
                panic = %message,
                backtrace = %backtrace,
                "PANIC contained"
            );
            Err(BenchError::Fault {
                context: format!("{tag} : {function}"),
                message,
            })
        }
    }
}
