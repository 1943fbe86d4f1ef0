//! W3C Trace Context propagation for outbound HTTP calls.
//!
//! Payment gateway calls carry `traceparent`/`tracestate` so the gateway leg of a
//! booking request shows up in the same trace.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::{SpanContext, TraceContextExt};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Correlation id echoed on every response and logged on every request span.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// `version-trace_id-span_id-flags`, or `None` for an unsampled/empty context.
fn traceparent(span_context: &SpanContext) -> Option<String> {
    span_context.is_valid().then(|| {
        format!(
            "00-{}-{}-{:02x}",
            span_context.trace_id(),
            span_context.span_id(),
            span_context.trace_flags().to_u8()
        )
    })
}

/// Copies the active span's context into `headers`. No-op outside a span.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    let context = Span::current().context();
    let span = context.span();
    let span_context = span.span_context();

    let Some(parent) = traceparent(span_context) else {
        return;
    };
    if let Ok(value) = HeaderValue::from_str(&parent) {
        headers.insert(TRACEPARENT_HEADER, value);
    }

    let state = span_context.trace_state().header();
    if !state.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&state) {
            headers.insert(TRACESTATE_HEADER, value);
        }
    }
}

/// Builder for a gateway call; trace headers are attached at `send`.
pub struct TracedRequest {
    inner: reqwest::RequestBuilder,
}

impl TracedRequest {
    pub fn basic_auth(self, key_id: &str, key_secret: &str) -> Self {
        Self {
            inner: self.inner.basic_auth(key_id, Some(key_secret)),
        }
    }

    pub fn json<T: serde::Serialize + ?Sized>(self, body: &T) -> Self {
        Self {
            inner: self.inner.json(body),
        }
    }

    pub async fn send(self) -> Result<reqwest::Response, reqwest::Error> {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);
        self.inner.headers(headers).send().await
    }
}

pub trait TracedClientExt {
    fn traced_post(&self, url: &str) -> TracedRequest;
}

impl TracedClientExt for reqwest::Client {
    fn traced_post(&self, url: &str) -> TracedRequest {
        TracedRequest {
            inner: self.post(url),
        }
    }
}
