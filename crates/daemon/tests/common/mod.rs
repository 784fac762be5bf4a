//! Shared helpers for the update server and deployment tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use ::common::store::ArtifactStore;
use depot_daemon::http_server::{Config, Server};

pub const FIXTURE_ID: &str = "oogibonapbgdbnlooeegbgkeldobgmjl";

/// Fixtures live with the library crate's tests
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../common/tests/fixtures")
        .join(name)
}

#[cfg(unix)]
pub fn browser_script(name: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = fixture(name);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn write_extension(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("manifest.json"),
        r#"{"manifest_version": 2, "name": "fixture", "version": "1.0"}"#,
    )
    .unwrap();
    std::fs::write(dir.join("content.js"), "document.body.dataset.depot = '1'\n").unwrap();
    dir
}

/// Start a server on an ephemeral loopback port
pub async fn start_server(store_root: &Path) -> Server {
    let config = Config::new("127.0.0.1:0".parse().unwrap(), None);
    Server::start(config, ArtifactStore::new(store_root))
        .await
        .unwrap()
}

pub async fn get(url: &str) -> anyhow::Result<(reqwest::StatusCode, String, Vec<u8>)> {
    let response = reqwest::get(url).await?;
    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.bytes().await?.to_vec();
    Ok((status, content_type, body))
}
