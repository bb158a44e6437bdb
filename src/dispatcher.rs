//! Binds the router and the validation pipeline to HTTP.
//!
//! [`Dispatcher::dispatch`] is transport-agnostic: it takes an
//! `http::Request<Bytes>` with the body already collected and returns a
//! [`Response`]. The hyper adapter in [`server`](crate::Server) is one
//! caller; tests are another.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::{Instrument, debug, error, info_span};

use crate::context::{self, Context};
use crate::error::{Error, Source, ValidationError, ValidationIssue};
use crate::method::Method;
use crate::pipeline;
use crate::response::Response;
use crate::router::{Matched, Router};

/// Dispatches requests against a read-only [`Router`].
///
/// Cheap to clone; clones share the router.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    router: Arc<Router>,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self { router: Arc::new(router) }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Routes, validates and answers one request.
    ///
    /// | outcome                          | status                |
    /// |----------------------------------|-----------------------|
    /// | success                          | 200 or handler's pick |
    /// | no route                         | 404                   |
    /// | input validation / malformed JSON| 400                   |
    /// | output validation                | 500                   |
    /// | any other handler error          | 500, opaque body      |
    pub async fn dispatch(&self, req: http::Request<Bytes>) -> Response {
        let span = info_span!("dispatch", method = %req.method(), path = %req.uri().path());
        self.dispatch_inner(req).instrument(span).await
    }

    async fn dispatch_inner(&self, req: http::Request<Bytes>) -> Response {
        let path = req.uri().path();
        let matched = Method::try_from(req.method())
            .ok()
            .and_then(|method| self.router.lookup(method, path));

        let Some(Matched { route, params }) = matched else {
            let err = Error::RouteNotFound {
                method: req.method().to_string(),
                path: path.to_owned(),
            };
            debug!("{err}");
            return Response::from_error(&err);
        };

        let ctx = Context::new();
        let result = match read_input(&req) {
            Ok((query, body)) => match pipeline::merge_input(&params, query, body) {
                Ok(raw) => context::run_with_context(ctx.clone(), pipeline::execute(&route, raw)).await,
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(output) => Response::json(ctx.status(), &output).with_headers(ctx.headers()),
            Err(err) => {
                report(&err);
                Response::from_error(&err)
            }
        }
    }
}

/// Query pairs and parsed JSON body. A malformed body is an input failure.
fn read_input(req: &http::Request<Bytes>) -> Result<(Map<String, Value>, Option<Value>), ValidationError> {
    let query: Map<String, Value> = req
        .uri()
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
                .collect()
        })
        .unwrap_or_default();

    let body = req.body();
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok((query, None));
    }
    match serde_json::from_slice(body) {
        Ok(value) => Ok((query, Some(value))),
        Err(e) => Err(ValidationError::input(vec![ValidationIssue::new(
            "invalid_json",
            format!("Request body is not valid JSON: {e}"),
        )])),
    }
}

/// Server-side log line for a failed request. The client never sees these
/// details for anything but validation errors.
fn report(err: &Error) {
    match err {
        Error::Validation(v) if v.source == Source::Input => {
            debug!(issues = v.issues.len(), "input validation failed");
        }
        Error::Validation(v) => {
            error!(issues = ?v.issues, "handler output violates its schema");
        }
        Error::NoActiveContext => {
            error!("context::current() called with no active request context; was it called from a spawned task?");
        }
        other => {
            error!(error = %other, "handler failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::error::BoxError;
    use crate::route::RouteSpec;
    use crate::schema::{any, object, string};

    fn request(method: &str, uri: &str, body: &str) -> http::Request<Bytes> {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::from(body.to_owned()))
            .unwrap()
    }

    fn echo() -> Dispatcher {
        let route = RouteSpec::new(Method::Post, "/echo/:id", any(), any())
            .unwrap()
            .handler(|input: Value| async move { Ok::<_, BoxError>(input) });
        Dispatcher::new(Router::new().route(route).unwrap())
    }

    #[tokio::test]
    async fn merges_query_body_and_params() {
        let res = echo()
            .dispatch(request("POST", "/echo/9?page=2&id=q", r#"{"name":"Rex","page":"b"}"#))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.json_body().unwrap(), json!({ "id": "9", "name": "Rex", "page": "b" }));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let res = echo().dispatch(request("POST", "/echo/1", "{not json")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = res.json_body().unwrap();
        assert_eq!(body["error"]["source"], "input");
        assert_eq!(body["error"]["issues"][0]["code"], "invalid_json");
    }

    #[tokio::test]
    async fn empty_body_is_no_body() {
        let res = echo().dispatch(request("POST", "/echo/1", "  ")).await;
        assert_eq!(res.json_body().unwrap(), json!({ "id": "1" }));
    }

    #[tokio::test]
    async fn unknown_method_is_not_found() {
        let res = echo().dispatch(request("PROPFIND", "/echo/1", "")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.json_body().unwrap(), json!({ "error": { "message": "Not Found" } }));
    }

    #[tokio::test]
    async fn input_failure_is_bad_request() {
        let route = RouteSpec::new(Method::Post, "/pets", object([("name", string())]), any())
            .unwrap()
            .handler(|input: Value| async move { Ok::<_, BoxError>(input) });
        let dispatcher = Dispatcher::new(Router::new().route(route).unwrap());
        let res = dispatcher.dispatch(request("POST", "/pets", r#"{"name":1}"#)).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            res.json_body().unwrap(),
            json!({ "error": { "source": "input", "issues": [
                { "code": "invalid_type", "message": "Expected string, received number", "path": ["name"] }
            ] } })
        );
    }
}
