//! Enterprise policy that force-installs an extension
//!
//! Chromium-family browsers read JSON documents from an admin-owned
//! managed-policy directory at startup. An `ExtensionSettings` entry with
//! `installation_mode: force_installed` and an `update_url` makes the browser
//! fetch and pin the extension from that URL without asking the user.
//!
//! Where those directories live depends on the vendor and the OS; that
//! lookup sits behind [`PolicyLocator`] so tests and site configuration can
//! redirect it.

mod document;
mod injector;
mod locator;
mod vendor;

pub use document::{ExtensionPolicy, InstallationMode, PolicyDocument, POLICY_FILE_NAME};
pub use injector::{clear_policy_dir, CleanupOutcome, PolicyError, PolicyInjector};
pub use locator::{OverrideLocator, PolicyLocator, SystemPolicyLocator};
pub use vendor::{Platform, UnknownVendor, Vendor};
