// Update server
pub mod http_server;
// Key generation, packing and policy injection as one run
pub mod pipeline;
// Logging and signal handling for long-running commands
pub mod process;
// Depot directory and configuration
pub mod state;
pub mod version;

pub use http_server::{HttpServerError, Server};
pub use pipeline::{DeployError, Deployer, Deployment};
pub use state::{AppConfig, AppState, StateError};
