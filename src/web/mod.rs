//! Web module - the browser chat surface
//!
//! A single page with a trip form, a chat box and a clear button, plus a small
//! JSON API over the same front end.

pub mod app;
pub mod handlers;
pub mod render;

use tower_http::trace::TraceLayer;

use crate::core::Config;

pub use app::{ChatFrontEnd, ChatMessage, ChatRole};
pub use handlers::{create_router, AppState};

/// Serve the chat page until the process is stopped
pub async fn serve(config: &Config, front_end: ChatFrontEnd) -> anyhow::Result<()> {
    let state = AppState::new(front_end, &config.gemini.model);
    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;
    let url = config.server_url();
    tracing::info!(%url, "Transport planner listening");

    if config.server.open_browser {
        if let Err(e) = webbrowser::open(&url) {
            tracing::warn!(error = %e, "Could not open browser");
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
