use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

/// Serves the pre-built front-end. Unknown paths get the root `index.html`
/// so client-side routes resolve on reload.
pub fn router(root: impl AsRef<Path>) -> Router {
    let root = root.as_ref().to_path_buf();
    let index = root.join("index.html");
    let spa_index = tower::service_fn(move |req: Request<Body>| {
        tracing::debug!(path = %req.uri().path(), "static_not_found_serving_index");
        ServeFile::new(&index).oneshot(req)
    });
    let serve = ServeDir::new(&root)
        .append_index_html_on_directories(true)
        .fallback(spa_index);
    Router::new().fallback_service(serve)
}
