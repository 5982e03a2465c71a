//! # academy-server
//!
//! The dynamic course site: lesson pages, per-lesson completion tracking and
//! quiz grading, backed by a SQLite progress store. The `academy serve`
//! command runs it, and the static exporter crawls it.

pub mod app;
pub mod server;
pub mod store;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use thiserror::Error;

pub use app::{router, AppState};
pub use server::{serve, ServeOptions};
pub use store::{LessonRecord, ProgressStore, QuizAttempt, StoreError};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to load course content: {0}")]
    Content(#[from] academy_core::ContentError),

    #[error("progress store error: {0}")]
    Store(#[from] StoreError),

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),

    #[error("failed to watch content directory: {0}")]
    Watch(#[from] notify::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}
