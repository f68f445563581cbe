//! Single-page scoring form
//!
//! `GET /` renders an input per persisted feature, `POST /` scores the
//! submitted applicant and renders the result under the form.

mod handlers;
mod templates;

pub use handlers::parse_form;

use crate::error::Result;
use crate::scoring::ScoringContext;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tracing::info;

/// Routes sharing one immutable scoring context
pub fn router(context: Arc<ScoringContext>) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::submit))
        .with_state(context)
}

/// Bind `addr` and serve until the process exits
pub async fn serve(context: Arc<ScoringContext>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Scoring form listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(context)).await?;
    Ok(())
}
