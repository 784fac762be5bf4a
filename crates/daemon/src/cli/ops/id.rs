use std::path::PathBuf;

use clap::Args;

use common::crypto::KeyError;
use common::identity::ExtensionId;

#[derive(Args, Debug, Clone)]
pub struct Id {
    /// PEM private key (PKCS#8 or PKCS#1)
    #[arg(long)]
    pub key: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error(transparent)]
    Key(#[from] KeyError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Id {
    type Error = IdError;
    type Output = ExtensionId;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        Ok(ExtensionId::read(&self.key).await?)
    }
}
