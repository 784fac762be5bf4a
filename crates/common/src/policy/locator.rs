use std::collections::BTreeMap;
use std::path::PathBuf;

use super::vendor::{Platform, Vendor};

/// Resolves where a vendor reads managed policy on a given platform
///
/// `None` means the combination is unsupported, which is an ordinary
/// answer: callers skip the vendor rather than treat it as an error.
pub trait PolicyLocator: Send + Sync + std::fmt::Debug {
    fn policy_dirs(&self, vendor: Vendor, platform: Platform) -> Option<Vec<PathBuf>>;
}

/// Managed-policy directories the browsers read on a stock install
///
/// Only JSON policy directories are handled. Windows (registry) and macOS
/// (configuration profiles) keep policy elsewhere, and Edge on Linux does
/// not document `ExtensionSettings` support, so those are unsupported.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPolicyLocator;

impl PolicyLocator for SystemPolicyLocator {
    fn policy_dirs(&self, vendor: Vendor, platform: Platform) -> Option<Vec<PathBuf>> {
        let dir = match (vendor, platform) {
            (Vendor::Chromium, Platform::Linux) => "/etc/chromium/policies/managed",
            (Vendor::Chrome, Platform::Linux) => "/etc/opt/chrome/policies/managed",
            (Vendor::Brave, Platform::Linux) => "/etc/brave/policies/managed",
            _ => return None,
        };
        Some(vec![PathBuf::from(dir)])
    }
}

/// Per-vendor directory overrides layered over another locator
///
/// An override applies on every platform; vendors without one fall through.
#[derive(Debug, Clone, Default)]
pub struct OverrideLocator<L = SystemPolicyLocator> {
    overrides: BTreeMap<Vendor, Vec<PathBuf>>,
    fallback: L,
}

impl<L: PolicyLocator> OverrideLocator<L> {
    pub fn new(overrides: BTreeMap<Vendor, Vec<PathBuf>>, fallback: L) -> Self {
        Self {
            overrides,
            fallback,
        }
    }
}

impl<L: PolicyLocator> PolicyLocator for OverrideLocator<L> {
    fn policy_dirs(&self, vendor: Vendor, platform: Platform) -> Option<Vec<PathBuf>> {
        match self.overrides.get(&vendor) {
            Some(dirs) => Some(dirs.clone()),
            None => self.fallback.policy_dirs(vendor, platform),
        }
    }
}
