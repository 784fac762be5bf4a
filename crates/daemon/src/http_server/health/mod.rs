use axum::routing::get;
use axum::Router;

use super::ServerState;

mod liveness;
mod version;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/livez", get(liveness::handler))
        .route("/version", get(version::handler))
}
