use axum::{extract::State, response::Html, routing::get, Router};
use tracing::{error, instrument};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/frontend", get(frontend))
}

/// Serve the HTML page from disk on every request. A missing page is fatal.
#[instrument(skip(state))]
pub async fn frontend(State(state): State<AppState>) -> Html<String> {
    let path = &state.config.frontend_path;
    match tokio::fs::read_to_string(path).await {
        Ok(html) => Html(html),
        Err(e) => {
            error!(error = %e, path = %path, "error reading frontend page");
            std::process::exit(1);
        }
    }
}
