//! Pre-master secret generation and the ClientKeyExchange message
//! (RFC 5246 Section 7.4.7, RFC 4492 Section 5.7).
//!
//! The two key-exchange kinds carry exactly the state each needs:
//! RSA has none beyond the server's public key; ECDHE carries the parsed
//! server parameters and, transiently, a fresh client ephemeral key. The
//! pre-master secret lives in a [`Zeroizing`] buffer and is wiped the
//! moment the master secret has been derived.

use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use zeroize::Zeroizing;

use crate::error::TlsError;
use crate::server_key_exchange::{EcdheServerParams, NamedCurve};

/// Pre-master secret length for the RSA key exchange.
pub const RSA_PRE_MASTER_LEN: usize = 48;

/// The negotiated key-exchange state, built while processing the server's
/// flight and consumed at ServerHelloDone.
#[derive(Debug)]
pub enum NegotiatedExchange {
    Rsa,
    Ecdhe { params: EcdheServerParams },
}

/// A client ephemeral ECDH key on the server's named curve.
///
/// Consumed by [`shared_secret`](EcdheKeyPair::shared_secret): the private
/// half cannot be used twice.
pub enum EcdheKeyPair {
    P256 {
        secret: p256::ecdh::EphemeralSecret,
        public: Vec<u8>,
    },
    P384 {
        secret: p384::ecdh::EphemeralSecret,
        public: Vec<u8>,
    },
}

impl EcdheKeyPair {
    /// Generate a fresh ephemeral key pair on the given curve.
    pub fn generate(curve: NamedCurve) -> Self {
        match curve {
            NamedCurve::Secp256r1 => {
                let secret = p256::ecdh::EphemeralSecret::random(&mut OsRng);
                let public = secret.public_key().to_encoded_point(false).as_bytes().to_vec();
                EcdheKeyPair::P256 { secret, public }
            }
            NamedCurve::Secp384r1 => {
                let secret = p384::ecdh::EphemeralSecret::random(&mut OsRng);
                let public = secret.public_key().to_encoded_point(false).as_bytes().to_vec();
                EcdheKeyPair::P384 { secret, public }
            }
        }
    }

    /// Uncompressed SEC1 encoding of the public point.
    pub fn public_point(&self) -> &[u8] {
        match self {
            EcdheKeyPair::P256 { public, .. } => public,
            EcdheKeyPair::P384 { public, .. } => public,
        }
    }

    /// ECDH with the server's ephemeral point. Consumes the key pair; the
    /// result is the pre-master secret (the shared x-coordinate).
    pub fn shared_secret(self, peer_point: &[u8]) -> Result<Zeroizing<Vec<u8>>, TlsError> {
        match self {
            EcdheKeyPair::P256 { secret, .. } => {
                let peer = p256::PublicKey::from_sec1_bytes(peer_point).map_err(|e| {
                    TlsError::InvalidKeyExchange(format!("bad P-256 server point: {e}"))
                })?;
                let shared = secret.diffie_hellman(&peer);
                Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
            }
            EcdheKeyPair::P384 { secret, .. } => {
                let peer = p384::PublicKey::from_sec1_bytes(peer_point).map_err(|e| {
                    TlsError::InvalidKeyExchange(format!("bad P-384 server point: {e}"))
                })?;
                let shared = secret.diffie_hellman(&peer);
                Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
            }
        }
    }
}

/// Generate the RSA pre-master secret: 48 random bytes with the first two
/// forced to the protocol version (RFC 5246, Section 7.4.7.1).
pub fn rsa_pre_master_secret() -> Zeroizing<Vec<u8>> {
    let mut secret = Zeroizing::new(vec![0u8; RSA_PRE_MASTER_LEN]);
    OsRng.fill_bytes(&mut secret);
    secret[0] = 0x03;
    secret[1] = 0x03;
    secret
}

/// ClientKeyExchange body for the RSA exchange: a 2-byte length followed by
/// the pre-master secret encrypted under the server's public key.
pub fn rsa_client_key_exchange(
    pre_master: &[u8],
    server_key: &RsaPublicKey,
) -> Result<Vec<u8>, TlsError> {
    let encrypted = server_key
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, pre_master)
        .map_err(|e| TlsError::InvalidKeyExchange(format!("RSA encryption failed: {e}")))?;

    let mut body = Vec::with_capacity(2 + encrypted.len());
    body.extend_from_slice(&(encrypted.len() as u16).to_be_bytes());
    body.extend_from_slice(&encrypted);
    Ok(body)
}

/// ClientKeyExchange body for the ECDHE exchange: a 1-byte length followed
/// by the client's uncompressed public point.
pub fn ecdhe_client_key_exchange(public_point: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(1 + public_point.len());
    body.push(public_point.len() as u8);
    body.extend_from_slice(public_point);
    body
}
