//! Passthrough key wrap that stores the file key in the clear.
//!
//! INSECURE. Anyone holding the envelope can read the payload. It exists only so
//! envelope behaviour can be tested without a beacon, and is not reachable from
//! the public encrypt/decrypt API.

use async_trait::async_trait;

use tlock_core::{FileKey, KeyUnwrapper, KeyWrapper, Result, Stanza, TlockError};

/// Stanza type written by [`NoopKeyWrap`].
pub const NOOP_STANZA_TYPE: &str = "no-op";

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopKeyWrap;

#[async_trait]
impl KeyWrapper for NoopKeyWrap {
    async fn wrap(&self, file_key: &FileKey) -> Result<Vec<Stanza>> {
        Ok(vec![Stanza::new(
            NOOP_STANZA_TYPE,
            vec![],
            file_key.as_bytes().to_vec(),
        )])
    }
}

#[async_trait]
impl KeyUnwrapper for NoopKeyWrap {
    async fn unwrap(&self, stanzas: &[Stanza]) -> Result<FileKey> {
        match stanzas {
            [stanza] if stanza.stanza_type == NOOP_STANZA_TYPE => FileKey::from_slice(&stanza.body),
            _ => Err(TlockError::MalformedStanza(format!(
                "expected one {NOOP_STANZA_TYPE} stanza"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlock_core::envelope;

    #[tokio::test]
    async fn round_trip() {
        let sealed = envelope::encrypt(b"plain", &NoopKeyWrap).await.unwrap();
        assert_eq!(sealed.stanzas[0].stanza_type, "no-op");
        assert_eq!(envelope::decrypt(&sealed, &NoopKeyWrap).await.unwrap(), b"plain");
    }

    #[tokio::test]
    async fn rejects_other_stanzas() {
        let stanzas = vec![Stanza::new("tlock", vec![], vec![0u8; 32])];
        assert!(NoopKeyWrap.unwrap(&stanzas).await.is_err());
    }
}
