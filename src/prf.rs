//! TLS 1.2 key schedule: the HMAC-based PRF (RFC 5246, Section 5) and the
//! derivations built on it (Sections 8.1 and 6.3).
//!
//! All key material flows through one construction:
//!
//! ```text
//! PRF(secret, label, seed) = P_hash(secret, label + seed)
//!
//! P_hash(secret, seed) = HMAC_hash(secret, A(1) + seed) +
//!                        HMAC_hash(secret, A(2) + seed) + ...
//!
//! A(0) = seed
//! A(i) = HMAC_hash(secret, A(i-1))
//! ```
//!
//! where `hash` is the negotiated suite's hash algorithm. The PRF produces:
//!
//! ```text
//! master_secret = PRF(pre_master_secret, "master secret",
//!                     ClientHello.random + ServerHello.random)[0..47]
//!
//! key_block     = PRF(master_secret, "key expansion",
//!                     server_random + client_random)
//!
//! verify_data   = PRF(master_secret, "client finished" | "server finished",
//!                     Hash(handshake_messages))[0..11]
//! ```
//!
//! For AEAD suites the key block splits into write keys and fixed IVs only;
//! the cipher supplies integrity, so there are no MAC keys.

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher_suite::{CipherSuite, HashAlgorithm};
use crate::error::TlsError;

/// Master secret length (RFC 5246, Section 8.1).
pub const MASTER_SECRET_LEN: usize = 48;

pub const MASTER_SECRET_LABEL: &[u8] = b"master secret";
pub const KEY_EXPANSION_LABEL: &[u8] = b"key expansion";
pub const CLIENT_FINISHED_LABEL: &[u8] = b"client finished";
pub const SERVER_FINISHED_LABEL: &[u8] = b"server finished";

fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any length");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().to_vec()
}

fn hmac_sha384(key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let mut mac =
        Hmac::<Sha384>::new_from_slice(key).expect("HMAC accepts keys of any length");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().to_vec()
}

/// P_hash data expansion (RFC 5246, Section 5).
///
/// Iterates `A(i) = HMAC(secret, A(i-1))` with `A(0) = seed`, concatenating
/// `HMAC(secret, A(i) + seed)` chunks until `out_len` bytes are produced,
/// then truncates. The output is prefix-stable in `out_len`.
pub fn p_hash(hash: HashAlgorithm, secret: &[u8], seed: &[u8], out_len: usize) -> Vec<u8> {
    let hmac: fn(&[u8], &[&[u8]]) -> Vec<u8> = match hash {
        HashAlgorithm::Sha256 => hmac_sha256,
        HashAlgorithm::Sha384 => hmac_sha384,
    };

    let mut output = Vec::with_capacity(out_len + hash.output_len());
    let mut a = hmac(secret, &[seed]);

    while output.len() < out_len {
        output.extend_from_slice(&hmac(secret, &[&a, seed]));
        a = hmac(secret, &[&a]);
    }

    output.truncate(out_len);
    output
}

/// The TLS 1.2 PRF: `P_hash(secret, label + seed)`, truncated to `out_len`.
///
/// Pure: identical inputs always produce identical output.
pub fn prf(
    hash: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    seed: &[u8],
    out_len: usize,
) -> Vec<u8> {
    let mut label_and_seed = Vec::with_capacity(label.len() + seed.len());
    label_and_seed.extend_from_slice(label);
    label_and_seed.extend_from_slice(seed);
    p_hash(hash, secret, &label_and_seed, out_len)
}

/// Derive the 48-byte master secret from the pre-master secret and both
/// hello randoms. The caller wipes the pre-master secret immediately after.
pub fn master_secret(
    hash: HashAlgorithm,
    pre_master: &[u8],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
) -> [u8; MASTER_SECRET_LEN] {
    let mut seed = [0u8; 64];
    seed[..32].copy_from_slice(client_random);
    seed[32..].copy_from_slice(server_random);

    let mut derived = prf(hash, pre_master, MASTER_SECRET_LABEL, &seed, MASTER_SECRET_LEN);
    let mut output = [0u8; MASTER_SECRET_LEN];
    output.copy_from_slice(&derived);
    derived.zeroize();
    output
}

/// The key block derived from the master secret, split per direction.
///
/// AEAD layout (RFC 5246 Section 6.3, with `mac_key_length = 0`):
///
/// ```text
/// client_write_key[key_len] server_write_key[key_len]
/// client_write_IV[fixed_iv] server_write_IV[fixed_iv]
/// ```
///
/// Wiped on drop; never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    pub(crate) client_write_key: Vec<u8>,
    pub(crate) server_write_key: Vec<u8>,
    pub(crate) client_write_iv: Vec<u8>,
    pub(crate) server_write_iv: Vec<u8>,
}

impl KeyMaterial {
    pub fn client_write_key(&self) -> &[u8] {
        &self.client_write_key
    }

    pub fn server_write_key(&self) -> &[u8] {
        &self.server_write_key
    }

    pub fn client_write_iv(&self) -> &[u8] {
        &self.client_write_iv
    }

    pub fn server_write_iv(&self) -> &[u8] {
        &self.server_write_iv
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("client_write_key", &"<redacted>")
            .field("server_write_key", &"<redacted>")
            .field("client_write_iv", &"<redacted>")
            .field("server_write_iv", &"<redacted>")
            .finish()
    }
}

/// Expand the master secret into the connection key block.
///
/// The seed is `server_random + client_random` — note the order is reversed
/// relative to the master secret derivation (RFC 5246, Section 6.3).
pub fn key_material(
    suite: &CipherSuite,
    master: &[u8; MASTER_SECRET_LEN],
    server_random: &[u8; 32],
    client_random: &[u8; 32],
) -> Result<KeyMaterial, TlsError> {
    let key_len = suite.key_strength_bytes();
    let iv_len = suite.fixed_iv_length;
    let total = 2 * key_len + 2 * iv_len;

    let mut seed = [0u8; 64];
    seed[..32].copy_from_slice(server_random);
    seed[32..].copy_from_slice(client_random);

    let mut block = prf(suite.hash, master, KEY_EXPANSION_LABEL, &seed, total);
    if block.len() != total {
        return Err(TlsError::EncryptFailed);
    }

    let material = KeyMaterial {
        client_write_key: block[..key_len].to_vec(),
        server_write_key: block[key_len..2 * key_len].to_vec(),
        client_write_iv: block[2 * key_len..2 * key_len + iv_len].to_vec(),
        server_write_iv: block[2 * key_len + iv_len..total].to_vec(),
    };
    block.zeroize();
    Ok(material)
}
