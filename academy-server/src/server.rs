//! Server lifecycle: bind, live content reload and graceful shutdown.

use crate::app::{router, AppState};
use crate::store::ProgressStore;
use crate::ServerError;
use academy_core::{Config, Course};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Runtime options that the command line may override
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub port: u16,
    pub database: PathBuf,
    /// Reload the course when files under the content directory change
    pub watch: bool,
}

impl ServeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            port: config.server.port,
            database: config.database_path(),
            watch: true,
        }
    }
}

/// Serve the course until Ctrl-C or SIGTERM
pub async fn serve(config: Config, options: ServeOptions) -> Result<(), ServerError> {
    let content_dir = config.content_dir();
    let course = Course::load(&content_dir)?;
    let store = ProgressStore::open(&options.database).await?;
    let state = AppState::new(config, course, store.clone());

    // Dropping the watcher stops it, so keep it alive for the server's lifetime
    let _watcher = if options.watch {
        Some(watch_content(&state, content_dir)?)
    } else {
        None
    };

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, options.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!(%addr, db = %options.database.display(), "academy server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

/// Reload the course whenever the content tree changes. A failed reload
/// keeps serving the previous model.
fn watch_content(state: &AppState, content_dir: PathBuf) -> Result<RecommendedWatcher, ServerError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )?;
    watcher.watch(&content_dir, RecursiveMode::Recursive)?;

    let course = state.course.clone();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Err(err) = event {
                tracing::warn!("Watcher error: {}", err);
                continue;
            }
            // Debounce by draining pending events
            while rx.try_recv().is_ok() {}

            tracing::info!("Content changed, reloading course...");
            let root = content_dir.clone();
            match tokio::task::spawn_blocking(move || Course::load(&root)).await {
                Ok(Ok(reloaded)) => {
                    *course.write().await = reloaded;
                    tracing::info!("Reload complete");
                }
                Ok(Err(e)) => tracing::error!("Reload failed: {}", e),
                Err(e) => tracing::error!("Reload task panicked: {}", e),
            }
        }
    });

    Ok(watcher)
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = tokio::signal::ctrl_c() => tracing::info!("Received Ctrl+C signal"),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for Ctrl+C only");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
    }
}
