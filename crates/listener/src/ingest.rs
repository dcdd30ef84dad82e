//! `POST /`: the run task webhook.
//!
//! The handler only validates and enqueues. It answers as soon as the job is
//! queued, before any remote lookup or callback happens, so the platform never
//! waits on the worker.

use axum::extract::{Request, State};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use runtask::InvocationPayload;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use worker::JobSender;

/// The only `User-Agent` accepted. Compared case-sensitively.
pub const RUN_TASK_USER_AGENT: &str = "TFC/1.0 (+https://app.terraform.io; TFC)";

/// Body of every 405 answer.
pub const REJECTION_BODY: &str = "You aren't a TFC Run Task, go away";

/// Body of a successful enqueue.
pub const ACCEPTED_BODY: &str = "200 OK";

/// Body of a 503 answer, sent only if the worker has gone away.
pub const UNAVAILABLE_BODY: &str = "Run task queue is unavailable";

/// Largest request body read.
pub const MAX_PAYLOAD_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone)]
struct IngestState {
    queue: JobSender,
}

/// Builds the router serving the run task endpoint.
pub fn router(queue: JobSender) -> Router {
    Router::new()
        .route("/", any(receive_run_task))
        .layer(TraceLayer::new_for_http())
        .with_state(IngestState { queue })
}

fn is_run_task_caller(method: &Method, headers: &HeaderMap) -> bool {
    *method == Method::POST
        && headers
            .get(USER_AGENT)
            .is_some_and(|agent| agent.as_bytes() == RUN_TASK_USER_AGENT.as_bytes())
}

async fn receive_run_task(State(state): State<IngestState>, request: Request) -> Response {
    if !is_run_task_caller(request.method(), request.headers()) {
        debug!(
            method = %request.method(),
            user_agent = ?request.headers().get(USER_AGENT),
            "Rejecting request that is not a run task delivery"
        );
        return (StatusCode::METHOD_NOT_ALLOWED, REJECTION_BODY).into_response();
    }

    let body = match axum::body::to_bytes(request.into_body(), MAX_PAYLOAD_BYTES).await {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, "Failed to read run task body");
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    let payload = match InvocationPayload::from_json(&body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "Rejecting malformed run task payload");
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    let run_id = payload.run_id.clone();
    let workspace_id = payload.workspace_id.clone();

    // Waits here while the queue is full.
    match state.queue.enqueue(payload).await {
        Ok(job_id) => {
            info!(
                %job_id,
                %run_id,
                %workspace_id,
                pending = state.queue.pending(),
                "Queued run task"
            );
            (StatusCode::OK, ACCEPTED_BODY).into_response()
        }
        Err(err) => {
            error!(error = %err, %run_id, "Could not queue run task");
            (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_BODY).into_response()
        }
    }
}
