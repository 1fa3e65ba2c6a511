//! Platform-independent scheduling helpers.
//!
//! The Remote Store owns no threads of its own (§5): it runs on whatever
//! single cooperative executor the host provides. These helpers wrap the
//! pieces of that executor a stream implementation needs (spawning its
//! background reconnect loop, sleeping for backoff, yielding between
//! callbacks) behind one thin seam so the core never names `tokio` directly.

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Spawns an async task that runs detached from the caller.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    use std::sync::OnceLock;
    use tokio::runtime::{Builder, Handle, Runtime};

    static BACKGROUND_RUNTIME: OnceLock<Runtime> = OnceLock::new();

    if let Ok(handle) = Handle::try_current() {
        handle.spawn(future);
    } else {
        let runtime = BACKGROUND_RUNTIME.get_or_init(|| {
            Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build background runtime")
        });
        runtime.spawn(future);
    }
}

#[cfg(target_arch = "wasm32")]
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Asynchronously sleeps for the given duration.
pub async fn sleep(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    sleep_impl(duration).await;
}

/// Cooperatively yields control back to the executor between callbacks.
pub async fn yield_now() {
    yield_now_impl().await;
}

/// Returned by [`with_timeout`] when the inner future does not resolve in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutError;

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation timed out")
    }
}

impl std::error::Error for TimeoutError {}

pub async fn with_timeout<F, T>(future: F, duration: Duration) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    if duration.is_zero() {
        return Ok(future.await);
    }
    with_timeout_impl(future, duration).await
}

#[cfg(not(target_arch = "wasm32"))]
async fn sleep_impl(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[cfg(target_arch = "wasm32")]
async fn sleep_impl(duration: Duration) {
    gloo_timers::future::sleep(duration).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn yield_now_impl() {
    tokio::task::yield_now().await;
}

#[cfg(target_arch = "wasm32")]
async fn yield_now_impl() {
    gloo_timers::future::TimeoutFuture::new(0).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn with_timeout_impl<F, T>(future: F, duration: Duration) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimeoutError)
}

#[cfg(target_arch = "wasm32")]
async fn with_timeout_impl<F, T>(future: F, duration: Duration) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    use futures::future::poll_fn;
    use gloo_timers::future::TimeoutFuture;

    let mut future = Box::pin(future);
    let timeout_ms = (duration.as_millis().min(u32::MAX as u128) as u32).max(1);
    let mut timeout_future = Box::pin(TimeoutFuture::new(timeout_ms));

    poll_fn(|cx| {
        use std::task::Poll;
        if let Poll::Ready(result) = future.as_mut().poll(cx) {
            return Poll::Ready(Ok(result));
        }
        if let Poll::Ready(_) = timeout_future.as_mut().poll(cx) {
            return Poll::Ready(Err(TimeoutError));
        }
        Poll::Pending
    })
    .await
}
