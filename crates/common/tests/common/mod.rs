//! Shared fixtures for packaging and policy integration tests
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use common::policy::{OverrideLocator, PolicyInjector, SystemPolicyLocator, Vendor};
use tempfile::TempDir;

/// Identifier of `fixtures/extension_key.pem`
pub const FIXTURE_ID: &str = "oogibonapbgdbnlooeegbgkeldobgmjl";

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// A browser stand-in script, made executable in case a checkout dropped the bit
#[cfg(unix)]
pub fn browser_script(name: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = fixture(name);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Lay out a minimal unpacked extension under `root`
pub fn write_extension(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("manifest.json"),
        r#"{"manifest_version": 2, "name": "fixture", "version": "1.0", "background": {"scripts": ["background.js"]}}"#,
    )
    .unwrap();
    std::fs::write(dir.join("background.js"), "console.log('EXTENSION LOADED')\n").unwrap();
    dir
}

/// An injector whose every vendor writes into its own directory under `root`
pub fn sandboxed_injector(root: &TempDir) -> (PolicyInjector, BTreeMap<Vendor, PathBuf>) {
    let mut dirs = BTreeMap::new();
    let mut overrides = BTreeMap::new();
    for vendor in [Vendor::Chromium, Vendor::Chrome, Vendor::Brave] {
        let dir = root
            .path()
            .join("policies")
            .join(vendor.as_str())
            .join("managed");
        overrides.insert(vendor, vec![dir.clone()]);
        dirs.insert(vendor, dir);
    }
    let injector = PolicyInjector::new(OverrideLocator::new(overrides, SystemPolicyLocator));
    (injector, dirs)
}
