use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::{KeyError, SigningKey};

/// Number of characters in an extension identifier
pub const EXTENSION_ID_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtensionIdError {
    #[error("extension id must be 32 characters, got {0}")]
    InvalidLength(usize),
    #[error("extension id may only contain 'a'..='p', found {0:?}")]
    InvalidCharacter(char),
}

/// Browser-assigned identity of an extension
///
/// Chromium-family browsers name an extension after the key that signed
/// it: the first 128 bits of the SHA-256 of the SubjectPublicKeyInfo DER,
/// written one nibble per character in the alphabet `a`..=`p`. This must
/// match the browser bit for bit, otherwise the policy we write refers to
/// an extension the browser never sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtensionId(String);

impl ExtensionId {
    /// Compute the identifier from a DER encoded SubjectPublicKeyInfo
    pub fn from_public_key_der(der: &[u8]) -> Self {
        let digest = hex::encode(Sha256::digest(der));
        Self(digest[..EXTENSION_ID_LEN].chars().map(recode).collect())
    }

    /// Compute the identifier of the extension that the key at `path` signs
    pub fn derive(private_key_path: impl AsRef<Path>) -> Result<Self, KeyError> {
        SigningKey::load(private_key_path)?.extension_id()
    }

    /// Async counterpart of [`ExtensionId::derive`]
    pub async fn read(private_key_path: impl AsRef<Path>) -> Result<Self, KeyError> {
        SigningKey::read(private_key_path).await?.extension_id()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Shift a hex digit into the `a`..=`p` alphabet (`tr 0-9a-f a-p`)
fn recode(c: char) -> char {
    match c {
        '0'..='9' => (b'a' + (c as u8 - b'0')) as char,
        'a'..='f' => (b'k' + (c as u8 - b'a')) as char,
        other => other,
    }
}

impl FromStr for ExtensionId {
    type Err = ExtensionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != EXTENSION_ID_LEN {
            return Err(ExtensionIdError::InvalidLength(s.chars().count()));
        }
        if let Some(c) = s.chars().find(|c| !('a'..='p').contains(c)) {
            return Err(ExtensionIdError::InvalidCharacter(c));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ExtensionId {
    type Error = ExtensionIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExtensionId> for String {
    fn from(id: ExtensionId) -> Self {
        id.0
    }
}

impl AsRef<str> for ExtensionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE_PKCS8: &str = include_str!("../tests/fixtures/extension_key.pem");
    // Computed independently with:
    //  openssl pkey -in extension_key.pem -pubout -outform DER \
    //    | sha256sum | head -c32 | tr 0-9a-f a-p
    const FIXTURE_ID: &str = "oogibonapbgdbnlooeegbgkeldobgmjl";

    fn is_valid_alphabet(id: &str) -> bool {
        id.len() == EXTENSION_ID_LEN && id.chars().all(|c| ('a'..='p').contains(&c))
    }

    #[test]
    fn test_matches_openssl_pipeline() {
        let key = SigningKey::from_pem(FIXTURE_PKCS8).unwrap();
        assert_eq!(key.extension_id().unwrap().as_str(), FIXTURE_ID);
    }

    #[test]
    fn test_recode_covers_every_nibble() {
        let recoded: String = "0123456789abcdef".chars().map(recode).collect();
        assert_eq!(recoded, "abcdefghijklmnop");
    }

    #[test]
    fn test_from_der_is_deterministic() {
        let der = b"not really der, but hashing does not care";
        let a = ExtensionId::from_public_key_der(der);
        let b = ExtensionId::from_public_key_der(der);
        assert_eq!(a, b);
        assert!(is_valid_alphabet(a.as_str()));
    }

    #[test]
    fn test_parse() {
        let id: ExtensionId = FIXTURE_ID.parse().unwrap();
        assert_eq!(id.to_string(), FIXTURE_ID);

        assert_eq!(
            "abc".parse::<ExtensionId>(),
            Err(ExtensionIdError::InvalidLength(3))
        );
        assert_eq!(
            "qqgibonapbgdbnlooeegbgkeldobgmjl".parse::<ExtensionId>(),
            Err(ExtensionIdError::InvalidCharacter('q'))
        );
        assert!("OOGIBONAPBGDBNLOOEEGBGKELDOBGMJL"
            .parse::<ExtensionId>()
            .is_err());
    }

    #[test]
    fn test_serde_validates() {
        let json = serde_json::to_string(&FIXTURE_ID.parse::<ExtensionId>().unwrap()).unwrap();
        assert_eq!(json, format!("\"{}\"", FIXTURE_ID));

        let back: ExtensionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), FIXTURE_ID);

        assert!(serde_json::from_str::<ExtensionId>("\"../../etc/passwd\"").is_err());
    }
}
