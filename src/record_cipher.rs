//! AEAD record protection for TLS 1.2 GCM suites (RFC 5288).
//!
//! Each direction owns one [`RecordCipher`]: the direction's write key,
//! fixed IV and sequence counter. A protected record body looks like:
//!
//! ```text
//! struct {
//!     opaque nonce_explicit[8];            /* sent in the clear */
//!     opaque ciphertext[length - 8 - 16];
//!     opaque tag[16];
//! } GenericAEADCipher;
//! ```
//!
//! # Nonce construction (RFC 5288, Section 3)
//!
//! The 12-byte GCM nonce is the 4-byte fixed IV from the key block followed
//! by the 8-byte explicit record IV. The explicit part here equals the
//! sequence counter; any value is acceptable as long as it never repeats
//! within a direction, and the counter already carries that guarantee.
//!
//! # Additional authenticated data
//!
//! 13 bytes: the 8-byte big-endian sequence number, the record type, the
//! protocol version (0x0303) and the 2-byte plaintext length. Sequence
//! numbers are never transmitted — both ends recompute them, one increment
//! per record per direction.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};

use crate::cipher_suite::CipherSuite;
use crate::error::TlsError;
use crate::prf::KeyMaterial;
use crate::record::{ContentType, TLS12_VERSION};

/// Length of the explicit per-record nonce transmitted in the clear.
pub const EXPLICIT_NONCE_LEN: usize = 8;

/// Which half of the key block a cipher instance uses.
///
/// The client encrypts with `ClientWrite` and decrypts with `ServerWrite`;
/// a server does the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientWrite,
    ServerWrite,
}

enum GcmCipher {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

impl GcmCipher {
    fn seal(&self, nonce: &[u8], payload: Payload<'_, '_>) -> Result<Vec<u8>, TlsError> {
        match self {
            GcmCipher::Aes128(cipher) => cipher
                .encrypt(Nonce::from_slice(nonce), payload)
                .map_err(|_| TlsError::EncryptFailed),
            GcmCipher::Aes256(cipher) => cipher
                .encrypt(Nonce::from_slice(nonce), payload)
                .map_err(|_| TlsError::EncryptFailed),
        }
    }

    fn open(&self, nonce: &[u8], payload: Payload<'_, '_>) -> Result<Vec<u8>, TlsError> {
        // The aes-gcm crate verifies the tag in constant time and reports a
        // single opaque error for every failure mode.
        match self {
            GcmCipher::Aes128(cipher) => cipher
                .decrypt(Nonce::from_slice(nonce), payload)
                .map_err(|_| TlsError::AuthenticationFailed),
            GcmCipher::Aes256(cipher) => cipher
                .decrypt(Nonce::from_slice(nonce), payload)
                .map_err(|_| TlsError::AuthenticationFailed),
        }
    }
}

/// One direction's record protection state.
pub struct RecordCipher {
    cipher: GcmCipher,
    fixed_iv: [u8; 4],
    sequence: u64,
    tag_length: usize,
}

impl RecordCipher {
    /// Build the cipher for one direction from the derived key block.
    pub fn new(
        suite: &CipherSuite,
        keys: &KeyMaterial,
        direction: Direction,
    ) -> Result<Self, TlsError> {
        let (key, iv) = match direction {
            Direction::ClientWrite => (&keys.client_write_key, &keys.client_write_iv),
            Direction::ServerWrite => (&keys.server_write_key, &keys.server_write_iv),
        };

        if iv.len() != suite.fixed_iv_length || suite.fixed_iv_length != 4 {
            return Err(TlsError::InvalidKeyExchange(
                "key block IV length does not match the suite".into(),
            ));
        }

        let cipher = match suite.key_strength_bytes() {
            16 => GcmCipher::Aes128(
                Aes128Gcm::new_from_slice(key)
                    .map_err(|_| TlsError::InvalidKeyExchange("bad AES-128 key length".into()))?,
            ),
            32 => GcmCipher::Aes256(
                Aes256Gcm::new_from_slice(key)
                    .map_err(|_| TlsError::InvalidKeyExchange("bad AES-256 key length".into()))?,
            ),
            other => {
                return Err(TlsError::InvalidKeyExchange(format!(
                    "unsupported AEAD key length: {other}"
                )))
            }
        };

        let mut fixed_iv = [0u8; 4];
        fixed_iv.copy_from_slice(iv);

        Ok(Self {
            cipher,
            fixed_iv,
            sequence: 0,
            tag_length: suite.tag_length,
        })
    }

    /// Current sequence counter. Starts at 0, increments exactly once per
    /// record in this direction.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    fn nonce(&self, record_iv: u64) -> [u8; 12] {
        let mut nonce = [0u8; 12];
        nonce[..4].copy_from_slice(&self.fixed_iv);
        nonce[4..].copy_from_slice(&record_iv.to_be_bytes());
        nonce
    }

    fn additional_data(sequence: u64, content_type: ContentType, length: u16) -> [u8; 13] {
        let mut aad = [0u8; 13];
        aad[..8].copy_from_slice(&sequence.to_be_bytes());
        aad[8] = content_type.code();
        aad[9..11].copy_from_slice(&TLS12_VERSION.to_be_bytes());
        aad[11..13].copy_from_slice(&length.to_be_bytes());
        aad
    }

    /// Protect one record. Returns the wire body:
    /// `explicit_nonce(8) ++ ciphertext ++ tag`.
    pub fn encrypt(
        &mut self,
        content_type: ContentType,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, TlsError> {
        let record_iv = self.sequence;
        let nonce = self.nonce(record_iv);
        let aad = Self::additional_data(self.sequence, content_type, plaintext.len() as u16);

        let ciphertext = self.cipher.seal(
            &nonce,
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )?;

        self.sequence = self
            .sequence
            .checked_add(1)
            .ok_or(TlsError::SequenceOverflow)?;

        let mut body = Vec::with_capacity(EXPLICIT_NONCE_LEN + ciphertext.len());
        body.extend_from_slice(&record_iv.to_be_bytes());
        body.extend_from_slice(&ciphertext);
        Ok(body)
    }

    /// Open one record body. Any failure — short body, tag mismatch,
    /// corrupted ciphertext — surfaces the same
    /// [`TlsError::AuthenticationFailed`].
    pub fn decrypt(
        &mut self,
        content_type: ContentType,
        body: &[u8],
    ) -> Result<Vec<u8>, TlsError> {
        if body.len() < EXPLICIT_NONCE_LEN + self.tag_length {
            return Err(TlsError::AuthenticationFailed);
        }

        let mut record_iv_bytes = [0u8; EXPLICIT_NONCE_LEN];
        record_iv_bytes.copy_from_slice(&body[..EXPLICIT_NONCE_LEN]);
        let record_iv = u64::from_be_bytes(record_iv_bytes);

        let plaintext_len = body.len() - EXPLICIT_NONCE_LEN - self.tag_length;
        let nonce = self.nonce(record_iv);
        let aad = Self::additional_data(self.sequence, content_type, plaintext_len as u16);

        let plaintext = self.cipher.open(
            &nonce,
            Payload {
                msg: &body[EXPLICIT_NONCE_LEN..],
                aad: &aad,
            },
        )?;

        self.sequence = self
            .sequence
            .checked_add(1)
            .ok_or(TlsError::SequenceOverflow)?;

        Ok(plaintext)
    }
}

impl std::fmt::Debug for RecordCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCipher")
            .field("fixed_iv", &"<redacted>")
            .field("sequence", &self.sequence)
            .finish()
    }
}
