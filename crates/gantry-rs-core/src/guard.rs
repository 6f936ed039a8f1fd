//! Panic guard: the try/catch/finally of the pipeline.
//!
//! This module is the only place where panics are converted into values.
//! Application handlers are expected to return errors; a panic that reaches
//! the guard is a programming mistake, not control flow, and the dispatch
//! layer logs it as such before turning it into an error response.

use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project_lite::pin_project;

/// A recovered panic: the raw payload plus a backtrace captured at recovery
/// time on the panicking thread.
pub struct CaughtPanic {
    payload: Box<dyn Any + Send>,
    backtrace: Backtrace,
}

impl CaughtPanic {
    /// The panic message, if the payload was a string; a fixed placeholder
    /// otherwise.
    pub fn message(&self) -> String {
        panic_message(self.payload.as_ref())
    }

    /// The backtrace captured when the panic was recovered.
    pub const fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Consumes the recovery, returning the raw payload and the backtrace.
    ///
    /// Callers that panic with typed values (for example a structured
    /// error) can downcast the payload to get them back.
    pub fn into_parts(self) -> (Box<dyn Any + Send>, Backtrace) {
        (self.payload, self.backtrace)
    }
}

impl fmt::Debug for CaughtPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaughtPanic")
            .field("message", &self.message())
            .finish_non_exhaustive()
    }
}

/// Extracts a printable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

pin_project! {
    /// Future adapter that catches panics raised while polling the inner
    /// future and resolves them as [`CaughtPanic`] values.
    pub struct CatchPanic<F> {
        #[pin]
        inner: F,
    }
}

impl<F: Future> Future for CatchPanic<F> {
    type Output = Result<F::Output, CaughtPanic>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match catch_unwind(AssertUnwindSafe(|| this.inner.poll(cx))) {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(value)) => Poll::Ready(Ok(value)),
            Err(payload) => Poll::Ready(Err(CaughtPanic {
                payload,
                backtrace: Backtrace::force_capture(),
            })),
        }
    }
}

/// Wraps a future so that a panic during any poll resolves as an error
/// instead of unwinding into the runtime.
///
/// # Examples
///
/// ```
/// # use gantry_rs_core::guard::catch_panic;
/// # async fn demo() {
/// let caught = catch_panic(async { panic!("boom") }).await;
/// assert_eq!(caught.unwrap_err().message(), "boom");
/// # }
/// ```
pub fn catch_panic<F: Future>(fut: F) -> CatchPanic<F> {
    CatchPanic { inner: fut }
}

/// Runs `try_fn`, routing any panic to `catch_fn`; `finally_fn` always runs,
/// even when `catch_fn` itself panics.
pub fn try_catch_finally<T>(
    try_fn: impl FnOnce() -> T,
    catch_fn: impl FnOnce(CaughtPanic) -> T,
    finally_fn: impl FnOnce(),
) -> T {
    let _finally = FinallyGuard(Some(finally_fn));

    match catch_unwind(AssertUnwindSafe(try_fn)) {
        Ok(value) => value,
        Err(payload) => catch_fn(CaughtPanic {
            payload,
            backtrace: Backtrace::force_capture(),
        }),
    }
}

struct FinallyGuard<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Drop for FinallyGuard<F> {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_catch_panic_str_payload() {
        let caught = catch_panic(async { panic!("boom") }).await;
        assert_eq!(caught.unwrap_err().message(), "boom");
    }

    #[tokio::test]
    async fn test_catch_panic_string_payload() {
        let detail = "broken".to_string();
        let caught = catch_panic(async move { panic!("{detail}") }).await;
        assert_eq!(caught.unwrap_err().message(), "broken");
    }

    #[tokio::test]
    async fn test_catch_panic_passthrough() {
        let value = catch_panic(async { 7 }).await;
        assert_eq!(value.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_catch_panic_typed_payload_downcast() {
        let caught = catch_panic(async { std::panic::panic_any(42_u8) })
            .await
            .unwrap_err();
        let (payload, _backtrace) = caught.into_parts();
        assert_eq!(*payload.downcast::<u8>().unwrap(), 42);
    }

    #[test]
    fn test_try_catch_finally_orders() {
        let ran_finally = Arc::new(AtomicBool::new(false));
        let flag = ran_finally.clone();

        let out = try_catch_finally(
            || -> i32 { panic!("tripped") },
            |caught| {
                assert_eq!(caught.message(), "tripped");
                -1
            },
            move || flag.store(true, Ordering::SeqCst),
        );

        assert_eq!(out, -1);
        assert!(ran_finally.load(Ordering::SeqCst));
    }

    #[test]
    fn test_try_catch_finally_no_panic() {
        let ran_finally = Arc::new(AtomicBool::new(false));
        let flag = ran_finally.clone();

        let out = try_catch_finally(|| 3, |_| -1, move || flag.store(true, Ordering::SeqCst));

        assert_eq!(out, 3);
        assert!(ran_finally.load(Ordering::SeqCst));
    }
}
