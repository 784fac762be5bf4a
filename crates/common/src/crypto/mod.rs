//! Signing key material for packed extensions
//!
//! - [`SigningKey`]: an RSA-2048 private key, persisted as PKCS#8 PEM
//! - [`KeyStore`]: a directory of generated keys, one fresh file per call
//!
//! Only the private key is ever written to disk. The public key is
//! rederived from it whenever the extension identifier is needed.

mod key_store;
mod keys;

pub use key_store::KeyStore;
pub use keys::{KeyError, SigningKey, KEY_BITS};
