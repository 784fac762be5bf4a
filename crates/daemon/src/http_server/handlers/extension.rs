use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use askama::Template;
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;

use common::identity::ExtensionId;
use common::manifest::UpdateManifest;

use super::plain_not_found;
use crate::http_server::ServerState;

pub const MANIFEST_KIND: &str = "xml";
pub const MANIFEST_CONTENT_TYPE: &str = "text/xml";
pub const ARTIFACT_CONTENT_TYPE: &str = "application/x-chrome-extension";
pub const INVALID_ID_BODY: &str = "invalid extension id";

/// `GET /<identifier>.<kind>`
///
/// Only the segment after the first dot counts as the kind. `xml` answers
/// with the update manifest for the identifier, whether or not an artifact
/// exists for it. Any other kind (or none) downloads the stored artifact.
pub async fn handler(State(state): State<ServerState>, Path(resource): Path<String>) -> Response {
    let mut parts = resource.split('.');
    let identifier = parts.next().unwrap_or_default();
    let kind = parts.next();

    match kind {
        Some(MANIFEST_KIND) => manifest(&state, identifier),
        _ => artifact(&state, identifier).await,
    }
}

fn manifest(state: &ServerState, identifier: &str) -> Response {
    let manifest = UpdateManifest::new(identifier, state.base_url().as_str());
    match manifest.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, MANIFEST_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(identifier, error = %e, "failed to render update manifest");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn artifact(state: &ServerState, identifier: &str) -> Response {
    let Ok(id) = identifier.parse::<ExtensionId>() else {
        return plain_not_found(INVALID_ID_BODY);
    };

    let file = match state.store().open(&id).await {
        Ok(Some(file)) => file,
        Ok(None) => return plain_not_found(INVALID_ID_BODY),
        Err(e) => {
            tracing::warn!(%id, error = %e, "failed to open artifact");
            return plain_not_found(INVALID_ID_BODY);
        }
    };

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, ARTIFACT_CONTENT_TYPE);
    if let Ok(metadata) = file.metadata().await {
        response = response.header(header::CONTENT_LENGTH, metadata.len());
    }

    match response.body(Body::from_stream(ReaderStream::new(file))) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(%id, error = %e, "failed to build artifact response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;
    use url::Url;

    use common::store::ArtifactStore;

    use super::*;
    use crate::http_server::router;

    const ID: &str = "oogibonapbgdbnlooeegbgkeldobgmjl";

    fn state(root: &TempDir) -> ServerState {
        ServerState::new(
            ArtifactStore::new(root.path()),
            Url::parse("http://127.0.0.1:777/").unwrap(),
        )
    }

    async fn get(state: ServerState, uri: &str) -> Response {
        router(state, tracing::Level::DEBUG)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn content_type(response: &Response) -> &str {
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_manifest_without_artifact() {
        let root = TempDir::new().unwrap();
        let response = get(state(&root), &format!("/{ID}.xml")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), MANIFEST_CONTENT_TYPE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(&format!("appid='{ID}'")));
        assert!(body.contains(&format!("codebase='http://127.0.0.1:777/{ID}.crx'")));
        assert!(body.contains("version='2.0'"));
    }

    #[tokio::test]
    async fn test_manifest_kind_ignores_trailing_segments() {
        let root = TempDir::new().unwrap();
        let response = get(state(&root), &format!("/{ID}.xml.bak")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), MANIFEST_CONTENT_TYPE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(&format!("appid='{ID}'")));
    }

    #[tokio::test]
    async fn test_artifact_download() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join(format!("{ID}.crx")), b"Cr24 payload").unwrap();

        let response = get(state(&root), &format!("/{ID}.crx")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), ARTIFACT_CONTENT_TYPE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Cr24 payload");
    }

    #[tokio::test]
    async fn test_any_non_manifest_kind_downloads() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join(format!("{ID}.crx")), b"Cr24").unwrap();

        for uri in [format!("/{ID}.zip"), format!("/{ID}")] {
            let response = get(state(&root), &uri).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_unknown_artifact_is_not_found() {
        let root = TempDir::new().unwrap();
        let response = get(state(&root), &format!("/{ID}.crx")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(content_type(&response), "text/plain");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], INVALID_ID_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_malformed_identifier_is_not_found() {
        let root = TempDir::new().unwrap();
        let response = get(state(&root), "/not-an-id.crx").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_nested_path_falls_through() {
        let root = TempDir::new().unwrap();
        let response = get(state(&root), &format!("/a/{ID}.crx")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
