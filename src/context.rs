//! Ambient per-request context.
//!
//! Handlers take their validated input and nothing else. Per-request state
//! (the response status, extra response headers, anything a helper wants to
//! stash) lives in a [`RequestContext`] that the dispatcher makes ambient for
//! the duration of the handler call:
//!
//! ```rust
//! use http::StatusCode;
//! use schemaroute::{BoxError, context};
//!
//! async fn create_pet(input: serde_json::Value) -> Result<serde_json::Value, BoxError> {
//!     context::current()?.set_status(StatusCode::CREATED);
//!     Ok(input)
//! }
//! ```
//!
//! # How the context travels
//!
//! The slot is a tokio task-local. [`run_with_context`] wraps the handler
//! future so that the slot is set every time that future is polled and
//! cleared again before the poll returns. Two consequences:
//!
//! - every `.await` inside the handler, however deep, sees the same context;
//! - two requests interleaving on the same worker thread never see each
//!   other's context, because neither one is installed while the other is
//!   being polled.
//!
//! Dropping the wrapped future (a client that went away) drops the context
//! with it. Work handed to `tokio::spawn` runs outside the wrapper; re-scope
//! it explicitly with [`Context::scope`] if it needs the context.

use std::future::Future;
use std::sync::Arc;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Extensions, StatusCode};
use parking_lot::Mutex;

use crate::error::Error;

tokio::task_local! {
    static CURRENT: Context;
}

/// Mutable state belonging to exactly one in-flight request.
#[derive(Debug)]
pub struct RequestContext {
    status: StatusCode,
    headers: HeaderMap,
    extensions: Extensions,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            extensions: Extensions::new(),
        }
    }
}

/// Handle to one request's [`RequestContext`].
///
/// Clones refer to the same request. The dispatcher keeps one clone to read
/// the status and headers back after the handler returns.
#[derive(Clone, Debug, Default)]
pub struct Context {
    inner: Arc<Mutex<RequestContext>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status for a successful response. Defaults to `200 OK`.
    pub fn status(&self) -> StatusCode {
        self.inner.lock().status
    }

    pub fn set_status(&self, status: StatusCode) {
        self.inner.lock().status = status;
    }

    /// Adds a header to the eventual success response.
    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.inner.lock().headers.insert(name, value);
    }

    pub fn headers(&self) -> HeaderMap {
        self.inner.lock().headers.clone()
    }

    /// Stores a typed value for later retrieval within the same request.
    pub fn insert<T: Clone + Send + Sync + 'static>(&self, value: T) -> Option<T> {
        self.inner.lock().extensions.insert(value)
    }

    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.inner.lock().extensions.get::<T>().cloned()
    }

    /// Runs `fut` with this context ambient. See [`run_with_context`].
    pub fn scope<F: Future>(self, fut: F) -> impl Future<Output = F::Output> {
        CURRENT.scope(self, fut)
    }

    /// Runs a synchronous closure with this context ambient.
    pub fn sync_scope<R>(self, f: impl FnOnce() -> R) -> R {
        CURRENT.sync_scope(self, f)
    }
}

/// Establishes `ctx` as the ambient context for the whole of `fut`,
/// across every suspension point.
pub fn run_with_context<F: Future>(ctx: Context, fut: F) -> impl Future<Output = F::Output> {
    ctx.scope(fut)
}

/// The context of the request currently being handled.
///
/// Fails with [`Error::NoActiveContext`] outside of [`run_with_context`].
/// If this fires inside a handler, the call most likely moved onto a
/// spawned task; capture the context first and re-scope the task.
pub fn current() -> Result<Context, Error> {
    try_current().ok_or(Error::NoActiveContext)
}

/// Like [`current`], but `None` instead of an error.
pub fn try_current() -> Option<Context> {
    CURRENT.try_with(Context::clone).ok()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn no_context_outside_scope() {
        assert!(matches!(current(), Err(Error::NoActiveContext)));
        assert!(try_current().is_none());
    }

    #[test]
    fn sync_scope_installs_and_removes() {
        let ctx = Context::new();
        ctx.clone().sync_scope(|| {
            current().unwrap().set_status(StatusCode::ACCEPTED);
        });
        assert_eq!(ctx.status(), StatusCode::ACCEPTED);
        assert!(try_current().is_none());
    }

    #[tokio::test]
    async fn survives_suspension() {
        let ctx = Context::new();
        ctx.insert("trace-17".to_owned());
        let seen = run_with_context(ctx.clone(), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            tokio::task::yield_now().await;
            nested().await
        })
        .await;
        assert_eq!(seen.as_deref(), Some("trace-17"));
    }

    async fn nested() -> Option<String> {
        tokio::task::yield_now().await;
        current().ok()?.get::<String>()
    }

    #[tokio::test]
    async fn concurrent_scopes_are_isolated() {
        async fn request(tag: u16, delay: u64) -> (u16, u16) {
            let ctx = Context::new();
            let observed = run_with_context(ctx.clone(), async move {
                current().unwrap().insert(tag);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                let first = current().unwrap().get::<u16>().unwrap();
                tokio::task::yield_now().await;
                let second = current().unwrap().get::<u16>().unwrap();
                assert_eq!(first, second);
                second
            })
            .await;
            (tag, observed)
        }

        let (a, b) = tokio::join!(request(1, 20), request(2, 5));
        assert_eq!(a, (1, 1));
        assert_eq!(b, (2, 2));
    }

    #[tokio::test]
    async fn spawned_task_needs_explicit_scope() {
        let ctx = Context::new();
        run_with_context(ctx.clone(), async {
            let detached = tokio::spawn(async { try_current().is_some() }).await.unwrap();
            assert!(!detached);

            let carried = current().unwrap();
            let rescoped = tokio::spawn(carried.scope(async { try_current().is_some() }))
                .await
                .unwrap();
            assert!(rescoped);
        })
        .await;
    }

    #[test]
    fn headers_and_status_default() {
        let ctx = Context::new();
        assert_eq!(ctx.status(), StatusCode::OK);
        ctx.insert_header(HeaderName::from_static("location"), HeaderValue::from_static("/pets/1"));
        assert_eq!(ctx.headers()["location"], "/pets/1");
    }
}
