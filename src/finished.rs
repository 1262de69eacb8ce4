//! Finished message verify_data (RFC 5246, Section 7.4.9).
//!
//! ```text
//! verify_data = PRF(master_secret, finished_label,
//!                   Hash(handshake_messages))[0..11]
//! ```
//!
//! The transcript hash is taken before the Finished message itself is
//! appended. Peer verify_data is compared in constant time.

use subtle::ConstantTimeEq;

use crate::cipher_suite::HashAlgorithm;
use crate::error::TlsError;
use crate::prf::{prf, CLIENT_FINISHED_LABEL, MASTER_SECRET_LEN, SERVER_FINISHED_LABEL};

/// Finished verify_data length (RFC 5246, Section 7.4.9).
pub const VERIFY_DATA_LEN: usize = 12;

fn verify_data(
    hash: HashAlgorithm,
    master: &[u8; MASTER_SECRET_LEN],
    label: &[u8],
    transcript_hash: &[u8],
) -> [u8; VERIFY_DATA_LEN] {
    let derived = prf(hash, master, label, transcript_hash, VERIFY_DATA_LEN);
    let mut output = [0u8; VERIFY_DATA_LEN];
    output.copy_from_slice(&derived);
    output
}

/// verify_data for the client's Finished message.
pub fn client_verify_data(
    hash: HashAlgorithm,
    master: &[u8; MASTER_SECRET_LEN],
    transcript_hash: &[u8],
) -> [u8; VERIFY_DATA_LEN] {
    verify_data(hash, master, CLIENT_FINISHED_LABEL, transcript_hash)
}

/// verify_data for the server's Finished message.
pub fn server_verify_data(
    hash: HashAlgorithm,
    master: &[u8; MASTER_SECRET_LEN],
    transcript_hash: &[u8],
) -> [u8; VERIFY_DATA_LEN] {
    verify_data(hash, master, SERVER_FINISHED_LABEL, transcript_hash)
}

/// Constant-time comparison of the peer's Finished body against the
/// expected verify_data.
pub fn verify_peer_finished(
    expected: &[u8; VERIFY_DATA_LEN],
    received: &[u8],
) -> Result<(), TlsError> {
    if received.len() != VERIFY_DATA_LEN {
        return Err(TlsError::HandshakeVerificationFailed);
    }
    if expected[..].ct_eq(received).into() {
        Ok(())
    } else {
        Err(TlsError::HandshakeVerificationFailed)
    }
}
