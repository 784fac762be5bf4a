use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Chromium-family browsers that honour `ExtensionSettings` policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Chromium,
    Chrome,
    Edge,
    Brave,
}

impl Vendor {
    pub const ALL: [Vendor; 4] = [Vendor::Chromium, Vendor::Chrome, Vendor::Edge, Vendor::Brave];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Chromium => "chromium",
            Vendor::Chrome => "chrome",
            Vendor::Edge => "edge",
            Vendor::Brave => "brave",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown browser vendor {0:?} (expected one of chromium, chrome, edge, brave)")]
pub struct UnknownVendor(pub String);

impl FromStr for Vendor {
    type Err = UnknownVendor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Vendor::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVendor(s.to_string()))
    }
}

/// Host operating system family, as far as policy placement is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    /// The platform this binary was built for. Every unix that is not
    /// macOS lays policy out like Linux does.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_parse() {
        for vendor in Vendor::ALL {
            assert_eq!(vendor.as_str().parse::<Vendor>().unwrap(), vendor);
        }
        assert_eq!("Chrome".parse::<Vendor>().unwrap(), Vendor::Chrome);
        assert_eq!(
            "firefox".parse::<Vendor>(),
            Err(UnknownVendor("firefox".to_string()))
        );
    }
}
