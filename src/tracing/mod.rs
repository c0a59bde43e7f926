use std::future::Future;
use std::sync::Arc;

use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

/// Identifier attached to every request, echoed in the `x-request-id`
/// header and in error envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(Arc<str>);

impl RequestId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new(format!("req-{}", Uuid::new_v4().simple()))
    }
}

tokio::task_local! {
    static REQUEST_ID: RequestId;
}

/// Runs `fut` with `id` installed as the ambient request id.
pub async fn scope_request_id<F>(id: RequestId, fut: F) -> F::Output
where
    F: Future,
{
    REQUEST_ID.scope(id, fut).await
}

/// The request id of the current task, if one is in scope.
pub fn current_request_id() -> Option<RequestId> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// HTTP tracing layer shared by every route.
pub fn configure_http_tracing() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}
