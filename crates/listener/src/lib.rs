//! credguard ingestion endpoint.
//!
//! Binds an HTTP server that receives run task deliveries from Terraform Cloud
//! / Enterprise and hands each accepted payload to the worker's job queue.
//!
//! ## Request handling
//!
//! | Request | Response | Enqueued |
//! |---------|----------|----------|
//! | Not `POST`, or `User-Agent` is not the platform's | `405` + fixed text | no |
//! | Body is not valid JSON | `400` + parser error | no |
//! | Valid | `200 OK` once queued (waits while the queue is full) | yes |
//! | Worker gone (shutdown only) | `503` | no |
//!
//! The `User-Agent` comparison is the only caller check; deliveries are not
//! HMAC-verified.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP details live here. The worker sees only
//! [`worker::JobSender`] and [`runtask::InvocationPayload`].

pub mod ingest;
pub mod server;

pub use ingest::{
    router, ACCEPTED_BODY, MAX_PAYLOAD_BYTES, REJECTION_BODY, RUN_TASK_USER_AGENT,
    UNAVAILABLE_BODY,
};
pub use server::{bind, serve, ServeError};
