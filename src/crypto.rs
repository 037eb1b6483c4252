// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Credential Cipher
//!
//! Symmetric encryption for secrets persisted in the `api_keys` table.
//!
//! ## Scheme
//!
//! - AES-256-GCM (`ring::aead`), fresh random 96-bit nonce per encryption
//! - Key derived once at startup from `ENCRYPTION_SECRET` with
//!   PBKDF2-HMAC-SHA256
//! - Envelope: `v1:` + base64(`nonce || ciphertext || tag`)
//!
//! Two encryptions of the same plaintext produce different envelopes; both
//! decrypt to the same plaintext. A tampered envelope or a wrong key fails
//! with [`CipherError::Decrypt`] instead of yielding garbage.
//!
//! There is no hardcoded fallback key. The passphrase must be provisioned.

use std::fmt;
use std::num::NonZeroU32;

use base64ct::{Base64, Encoding};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

/// Envelope version prefix.
const ENVELOPE_PREFIX: &str = "v1:";

/// PBKDF2 iteration count for the passphrase.
const PBKDF2_ITERATIONS: NonZeroU32 = NonZeroU32::new(100_000).unwrap();

/// Fixed salt; the key is derived once per process, not per secret.
const KEY_SALT: &[u8] = b"chat-settings-server/credential-cipher/v1";

/// Shortest passphrase accepted at startup.
pub const MIN_PASSPHRASE_LEN: usize = 16;

/// Passphrase the legacy deployment fell back to when none was configured.
pub const LEGACY_DEFAULT_PASSPHRASE: &str = "default-secret-key";

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("encryption passphrase is not set")]
    MissingPassphrase,

    #[error("encryption passphrase must be at least 16 characters")]
    WeakPassphrase,

    #[error("encryption passphrase is the legacy default and must be replaced")]
    DefaultPassphrase,

    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("ciphertext is malformed: {0}")]
    Malformed(String),

    #[error("ciphertext could not be decrypted (wrong key or tampered data)")]
    Decrypt,

    #[error("decrypted secret is not valid UTF-8")]
    Utf8,
}

/// Encrypted form of a secret. The only form written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ciphertext(String);

impl Ciphertext {
    /// Wrap a value read back from the store.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-wide credential cipher.
pub struct CredentialCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("algorithm", &"AES-256-GCM")
            .finish_non_exhaustive()
    }
}

impl CredentialCipher {
    /// Apply the passphrase policy without deriving a key.
    ///
    /// Rejects empty, short, and legacy-default passphrases.
    pub fn check_passphrase(passphrase: &str) -> Result<(), CipherError> {
        if passphrase.is_empty() {
            return Err(CipherError::MissingPassphrase);
        }
        if passphrase == LEGACY_DEFAULT_PASSPHRASE {
            return Err(CipherError::DefaultPassphrase);
        }
        if passphrase.chars().count() < MIN_PASSPHRASE_LEN {
            return Err(CipherError::WeakPassphrase);
        }
        Ok(())
    }

    /// Derive the cipher key from a provisioned passphrase.
    pub fn from_passphrase(passphrase: &str) -> Result<Self, CipherError> {
        Self::check_passphrase(passphrase)?;

        let mut key_bytes = [0u8; 32];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            PBKDF2_ITERATIONS,
            KEY_SALT,
            passphrase.as_bytes(),
            &mut key_bytes,
        );

        let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes)
            .map_err(|_| CipherError::Encrypt("invalid key length".into()))?;

        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    /// Encrypt a secret into a versioned envelope.
    pub fn encrypt(&self, plaintext: &str) -> Result<Ciphertext, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CipherError::Encrypt("system RNG failure".into()))?;

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CipherError::Encrypt("seal failed".into()))?;

        let mut packed = Vec::with_capacity(NONCE_LEN + in_out.len());
        packed.extend_from_slice(&nonce_bytes);
        packed.extend_from_slice(&in_out);

        Ok(Ciphertext(format!(
            "{ENVELOPE_PREFIX}{}",
            Base64::encode_string(&packed)
        )))
    }

    /// Decrypt an envelope produced by [`CredentialCipher::encrypt`].
    pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<String, CipherError> {
        let encoded = ciphertext
            .as_str()
            .strip_prefix(ENVELOPE_PREFIX)
            .ok_or_else(|| CipherError::Malformed("unknown envelope version".into()))?;

        let packed = Base64::decode_vec(encoded)
            .map_err(|e| CipherError::Malformed(format!("invalid base64: {e}")))?;

        if packed.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(CipherError::Malformed("envelope too short".into()));
        }

        let (nonce_bytes, sealed) = packed.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| CipherError::Malformed("invalid nonce".into()))?;

        let mut in_out = sealed.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CipherError::Decrypt)?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| CipherError::Utf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine};

    fn test_cipher() -> CredentialCipher {
        CredentialCipher::from_passphrase("unit-test-passphrase-0123456789").unwrap()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let cipher = test_cipher();
        for plaintext in ["ghp_abc123", "", "sk-live with spaces & symbols !@#$%", "ünïcödé ✓"] {
            let ct = cipher.encrypt(plaintext).unwrap();
            assert_eq!(cipher.decrypt(&ct).unwrap(), plaintext);
        }
    }

    #[test]
    fn encryptions_are_randomized() {
        let cipher = test_cipher();
        let a = cipher.encrypt("same secret").unwrap();
        let b = cipher.encrypt("same secret").unwrap();

        assert_ne!(a, b);
        assert_eq!(cipher.decrypt(&a).unwrap(), "same secret");
        assert_eq!(cipher.decrypt(&b).unwrap(), "same secret");
    }

    #[test]
    fn ciphertext_never_contains_plaintext() {
        let cipher = test_cipher();
        let ct = cipher.encrypt("ghp_plaintexttoken").unwrap();
        assert!(ct.as_str().starts_with("v1:"));
        assert!(!ct.as_str().contains("ghp_plaintexttoken"));
    }

    #[test]
    fn wrong_key_is_observable() {
        let ct = test_cipher().encrypt("secret").unwrap();
        let other = CredentialCipher::from_passphrase("a-completely-different-passphrase").unwrap();
        assert!(matches!(other.decrypt(&ct), Err(CipherError::Decrypt)));
    }

    #[test]
    fn tampered_envelope_is_rejected() {
        let cipher = test_cipher();
        let ct = cipher.encrypt("secret").unwrap();

        let mut raw = STANDARD.decode(&ct.as_str()[3..]).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = Ciphertext::from_stored(format!("v1:{}", STANDARD.encode(raw)));

        assert!(matches!(cipher.decrypt(&tampered), Err(CipherError::Decrypt)));
    }

    #[test]
    fn malformed_envelopes_are_rejected() {
        let cipher = test_cipher();

        // Legacy CryptoJS output has no version prefix.
        let legacy = Ciphertext::from_stored("U2FsdGVkX1+abcdefghijklmnop==");
        assert!(matches!(cipher.decrypt(&legacy), Err(CipherError::Malformed(_))));

        let bad_b64 = Ciphertext::from_stored("v1:not base64!!");
        assert!(matches!(cipher.decrypt(&bad_b64), Err(CipherError::Malformed(_))));

        let short = Ciphertext::from_stored("v1:AAAA");
        assert!(matches!(cipher.decrypt(&short), Err(CipherError::Malformed(_))));
    }

    #[test]
    fn passphrase_policy() {
        assert!(matches!(
            CredentialCipher::from_passphrase(""),
            Err(CipherError::MissingPassphrase)
        ));
        assert!(matches!(
            CredentialCipher::from_passphrase("short"),
            Err(CipherError::WeakPassphrase)
        ));
        assert!(matches!(
            CredentialCipher::from_passphrase(LEGACY_DEFAULT_PASSPHRASE),
            Err(CipherError::DefaultPassphrase)
        ));
    }

    #[test]
    fn policy_check_matches_derivation() {
        for candidate in ["", "short", LEGACY_DEFAULT_PASSPHRASE, "a-long-enough-passphrase"] {
            assert_eq!(
                CredentialCipher::check_passphrase(candidate).is_ok(),
                CredentialCipher::from_passphrase(candidate).is_ok(),
                "{candidate:?}"
            );
        }
        assert!(CredentialCipher::check_passphrase("sixteen-chars-ok").is_ok());
    }

    #[test]
    fn same_passphrase_derives_same_key() {
        let ct = test_cipher().encrypt("portable").unwrap();
        assert_eq!(test_cipher().decrypt(&ct).unwrap(), "portable");
    }

    #[test]
    fn debug_does_not_leak_key() {
        let rendered = format!("{:?}", test_cipher());
        assert!(rendered.contains("CredentialCipher"));
        assert!(!rendered.contains("passphrase"));
    }
}
