//! Session header middleware implementation.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    response::Response,
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};

/// Primary session header.
pub const SESSION_HEADER: HeaderName = HeaderName::from_static("x-mcp-session-id");

/// Carries the same value as [`SESSION_HEADER`].
pub const SESSION_HEADER_ALT: HeaderName = HeaderName::from_static("mcp-session-id");

/// Layer that stamps the server's session identifier onto every response.
///
/// Applies to the `/sse` response head as well, so the headers reach the
/// client before the first event.
///
/// # Example
///
/// ```rust,ignore
/// use servicenow_mcp::session::SessionHeaderLayer;
///
/// let router = Router::new()
///     .route("/api", get(handler))
///     .layer(SessionHeaderLayer::new(Some("0123abcd")));
/// ```
#[derive(Clone, Debug)]
pub struct SessionHeaderLayer {
    value: Option<HeaderValue>,
}

impl SessionHeaderLayer {
    /// Create a layer for the given session identifier.
    ///
    /// With `None` responses pass through untouched. An identifier that is
    /// not a valid header value is logged and treated as `None`.
    pub fn new(session_id: Option<&str>) -> Self {
        let value = session_id.and_then(|id| match HeaderValue::from_str(id) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(session_id = id, "session id is not a valid header value");
                None
            }
        });
        Self { value }
    }
}

impl<S> Layer<S> for SessionHeaderLayer {
    type Service = SessionHeaderService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionHeaderService {
            inner,
            value: self.value.clone(),
        }
    }
}

/// Service that sets [`SESSION_HEADER`] and [`SESSION_HEADER_ALT`] on the
/// inner service's response.
#[derive(Clone, Debug)]
pub struct SessionHeaderService<S> {
    inner: S,
    value: Option<HeaderValue>,
}

impl<S> Service<Request<Body>> for SessionHeaderService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let value = self.value.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut response = inner.call(req).await?;

            if let Some(value) = value {
                let headers = response.headers_mut();
                headers.insert(SESSION_HEADER, value.clone());
                headers.insert(SESSION_HEADER_ALT, value);
            }

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode,
        routing::{get, post},
        Router,
    };
    use tower::util::ServiceExt;

    async fn ok_handler() -> &'static str {
        "OK"
    }

    async fn teapot_handler() -> (StatusCode, &'static str) {
        (StatusCode::IM_A_TEAPOT, "short and stout")
    }

    fn create_test_router(session_id: Option<&str>) -> Router {
        Router::new()
            .route("/test", get(ok_handler))
            .route("/teapot", post(teapot_handler))
            .layer(SessionHeaderLayer::new(session_id))
    }

    fn header<'a>(response: &'a Response, name: &HeaderName) -> Option<&'a str> {
        response
            .headers()
            .get(name)
            .map(|v| v.to_str().unwrap())
    }

    #[tokio::test]
    async fn test_headers_added_with_session() {
        let app = create_test_router(Some("abc123"));

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, &SESSION_HEADER), Some("abc123"));
        assert_eq!(header(&response, &SESSION_HEADER_ALT), Some("abc123"));
    }

    #[tokio::test]
    async fn test_no_headers_without_session() {
        let app = create_test_router(None);

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(&SESSION_HEADER).is_none());
        assert!(response.headers().get(&SESSION_HEADER_ALT).is_none());
    }

    #[tokio::test]
    async fn test_status_and_body_untouched() {
        let app = create_test_router(Some("abc123"));

        let request = Request::builder()
            .method("POST")
            .uri("/teapot")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(header(&response, &SESSION_HEADER), Some("abc123"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"short and stout");
    }

    #[tokio::test]
    async fn test_header_set_exactly_once() {
        let app = create_test_router(Some("abc123"));

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers().get_all(&SESSION_HEADER).iter().count(), 1);
        assert_eq!(
            response.headers().get_all(&SESSION_HEADER_ALT).iter().count(),
            1
        );
    }

    #[test]
    fn test_invalid_session_id_is_ignored() {
        let layer = SessionHeaderLayer::new(Some("bad\nvalue"));
        assert!(layer.value.is_none());
    }
}
