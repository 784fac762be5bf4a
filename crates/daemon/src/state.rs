use std::collections::BTreeMap;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use common::permissions::FilePermissions;
use common::policy::{
    OverrideLocator, PolicyInjector, SystemPolicyLocator, UnknownVendor, Vendor,
};

pub const APP_NAME: &str = "depot";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEYS_DIR_NAME: &str = "keys";
pub const ARTIFACTS_DIR_NAME: &str = "artifacts";

/// Default port of the update server
pub const DEFAULT_PORT: u16 = 777;
/// Environment override for the update server port
pub const PORT_ENV_VAR: &str = "ENTERPRISE_EXTENSION_SERVER_PORT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the update server binds to
    #[serde(default = "default_host")]
    pub host: IpAddr,
    /// Port the update server binds to
    #[serde(default = "default_port")]
    pub port: u16,
    /// URL browsers should use to reach the update server, if it differs
    /// from `http://<host>:<port>/` (e.g. behind a proxy)
    #[serde(default)]
    pub advertised_url: Option<Url>,
    /// Make generated keys and artifacts world read/write
    #[serde(default = "default_relax_permissions")]
    pub relax_permissions: bool,
    /// Managed-policy directories per vendor, replacing the built-in table
    #[serde(default)]
    pub policy_dirs: BTreeMap<String, Vec<PathBuf>>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_relax_permissions() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            advertised_url: None,
            relax_permissions: default_relax_permissions(),
            policy_dirs: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn file_permissions(&self) -> FilePermissions {
        FilePermissions::from_relaxed(self.relax_permissions)
    }

    /// Policy injector honouring the configured directory overrides
    pub fn policy_injector(&self) -> Result<PolicyInjector, StateError> {
        let mut overrides = BTreeMap::new();
        for (name, dirs) in &self.policy_dirs {
            let vendor: Vendor = name.parse()?;
            overrides.insert(vendor, dirs.clone());
        }
        Ok(PolicyInjector::new(OverrideLocator::new(
            overrides,
            SystemPolicyLocator,
        )))
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the depot directory (~/.depot)
    pub depot_dir: PathBuf,
    /// Directory of generated signing keys
    pub keys_path: PathBuf,
    /// Directory of packed artifacts
    pub artifacts_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the depot directory path (custom or default ~/.depot)
    pub fn depot_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    fn layout(depot_dir: PathBuf, config: AppConfig) -> Self {
        Self {
            keys_path: depot_dir.join(KEYS_DIR_NAME),
            artifacts_path: depot_dir.join(ARTIFACTS_DIR_NAME),
            config_path: depot_dir.join(CONFIG_FILE_NAME),
            depot_dir,
            config,
        }
    }

    /// Initialize a new depot state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let depot_dir = Self::depot_dir(custom_path)?;

        if depot_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        let state = Self::layout(depot_dir, config.unwrap_or_default());
        fs::create_dir_all(&state.keys_path)?;
        fs::create_dir_all(&state.artifacts_path)?;

        let config_toml = toml::to_string_pretty(&state.config)?;
        fs::write(&state.config_path, config_toml)?;

        Ok(state)
    }

    /// Load existing state from the depot directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let depot_dir = Self::depot_dir(custom_path)?;

        if !depot_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = depot_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }
        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        let state = Self::layout(depot_dir, config);

        // Both directories are recreated on demand, so a missing one is
        // repaired rather than rejected.
        fs::create_dir_all(&state.keys_path)?;
        fs::create_dir_all(&state.artifacts_path)?;

        Ok(state)
    }

    /// Load the state, initializing it with defaults on first use
    pub fn load_or_init(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        match Self::load(custom_path.clone()) {
            Err(StateError::NotInitialized) | Err(StateError::MissingFile(_)) => {
                Self::init(custom_path, None)
            }
            other => other,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("could not determine home directory")]
    NoHomeDirectory,
    #[error("depot directory already initialized")]
    AlreadyInitialized,
    #[error("depot directory not initialized, run `depot init` first")]
    NotInitialized,
    #[error("missing required file: {0}")]
    MissingFile(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize config: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("failed to parse config: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl From<UnknownVendor> for StateError {
    fn from(e: UnknownVendor) -> Self {
        StateError::InvalidConfig(e.to_string())
    }
}
