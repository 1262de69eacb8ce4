//! Running handshake transcript hash.
//!
//! Feeds on the raw bytes (header + body) of every handshake message sent
//! or received, in order, and exposes a non-destructive snapshot so both
//! Finished messages can be computed against the transcript as it stood
//! before the Finished itself was appended.
//!
//! TLS 1.2 selects the hash algorithm with the cipher suite, but the
//! ClientHello is transcribed before the ServerHello picks the suite — so
//! messages are buffered verbatim until [`HandshakeDigest::select_hash`]
//! drains them into the real hash context.
//!
//! The caller is responsible for the exclusion rules: HelloRequest and
//! received Finished messages never reach this digest.

use sha2::{Digest, Sha256, Sha384};

use crate::cipher_suite::HashAlgorithm;

enum DigestState {
    /// Suite not yet negotiated; raw messages held verbatim.
    Buffering(Vec<u8>),
    Sha256(Sha256),
    Sha384(Sha384),
}

/// Handshake transcript accumulator.
pub struct HandshakeDigest {
    state: DigestState,
}

impl HandshakeDigest {
    pub fn new() -> Self {
        Self {
            state: DigestState::Buffering(Vec::new()),
        }
    }

    /// Append one handshake message (header + body).
    pub fn update(&mut self, message: &[u8]) {
        match &mut self.state {
            DigestState::Buffering(buffer) => buffer.extend_from_slice(message),
            DigestState::Sha256(hasher) => hasher.update(message),
            DigestState::Sha384(hasher) => hasher.update(message),
        }
    }

    /// Fix the hash algorithm once the suite is negotiated, draining any
    /// buffered messages into the hash context. No-op if already selected.
    pub fn select_hash(&mut self, hash: HashAlgorithm) {
        if let DigestState::Buffering(buffer) = &mut self.state {
            let buffered = std::mem::take(buffer);
            self.state = match hash {
                HashAlgorithm::Sha256 => {
                    let mut hasher = Sha256::new();
                    hasher.update(&buffered);
                    DigestState::Sha256(hasher)
                }
                HashAlgorithm::Sha384 => {
                    let mut hasher = Sha384::new();
                    hasher.update(&buffered);
                    DigestState::Sha384(hasher)
                }
            };
        }
    }

    /// Current transcript hash, without consuming the running state.
    ///
    /// Valid only after [`select_hash`](Self::select_hash); before that the
    /// buffered transcript is hashed with SHA-256.
    pub fn snapshot(&self) -> Vec<u8> {
        match &self.state {
            DigestState::Buffering(buffer) => Sha256::digest(buffer).to_vec(),
            DigestState::Sha256(hasher) => hasher.clone().finalize().to_vec(),
            DigestState::Sha384(hasher) => hasher.clone().finalize().to_vec(),
        }
    }
}

impl Default for HandshakeDigest {
    fn default() -> Self {
        Self::new()
    }
}
