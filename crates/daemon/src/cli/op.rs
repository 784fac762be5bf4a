use std::error::Error;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;

use depot_daemon::process::{init_logging, LoggingConfig};
use depot_daemon::state::{AppState, StateError};

#[derive(Debug, Clone)]
pub struct OpContext {
    /// Optional custom state path (defaults to ~/.depot)
    pub config_path: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>, logging: LoggingConfig) -> Self {
        Self {
            config_path,
            logging,
        }
    }

    /// Load the depot state, creating it with defaults on first use
    pub fn state(&self) -> Result<AppState, StateError> {
        AppState::load_or_init(self.config_path.clone())
    }

    /// Install the tracing subscriber; keep the guards alive while logging
    pub fn init_logging(&self) -> Vec<WorkerGuard> {
        init_logging(&self.logging)
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
