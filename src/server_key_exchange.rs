//! ServerKeyExchange message for ECDHE suites (RFC 4492, Section 5.4).
//!
//! Wire layout:
//! - curve_type (1 byte, must be 3 = named_curve)
//! - named_curve (2 bytes)
//! - point length (1 byte) + uncompressed EC point
//! - hash algorithm (1 byte) + signature algorithm (1 byte)
//! - signature length (2 bytes) + signature
//!
//! The signature covers `client_random ++ server_random ++ params`, where
//! `params` is the curve_type/curve/point section exactly as transmitted.
//! RSA-keyed suites must never send this message.

use rsa::pkcs1v15::{Signature as RsaSignature, VerifyingKey as RsaVerifyingKey};
use rsa::signature::Verifier;
use sha2::{Sha256, Sha384};

use crate::certificate::PublicKey;
use crate::cipher_suite::{HashAlgorithm, SignatureAlgorithm};
use crate::error::TlsError;
use crate::extensions::{SignatureScheme, SUPPORTED_SIGNATURE_SCHEMES};

/// curve_type value for named curves.
const CURVE_TYPE_NAMED: u8 = 3;

/// Named curves we can run ECDHE over (RFC 4492, Section 5.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum NamedCurve {
    Secp256r1 = 23,
    Secp384r1 = 24,
}

impl NamedCurve {
    pub const fn code(self) -> u16 {
        self as u16
    }

    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            23 => Some(NamedCurve::Secp256r1),
            24 => Some(NamedCurve::Secp384r1),
            _ => None,
        }
    }
}

/// Parsed ECDHE server parameters plus the signature over them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcdheServerParams {
    pub curve: NamedCurve,
    /// Uncompressed server ephemeral point.
    pub point: Vec<u8>,
    pub scheme: SignatureScheme,
    pub signature: Vec<u8>,
    /// curve_type ++ curve ++ point length ++ point, exactly as received —
    /// the signed section.
    pub params_raw: Vec<u8>,
}

pub fn parse_server_key_exchange(body: &[u8]) -> Result<EcdheServerParams, TlsError> {
    if body.len() < 4 {
        return Err(TlsError::IncompleteMessage("ServerKeyExchange"));
    }

    if body[0] != CURVE_TYPE_NAMED {
        return Err(TlsError::DecodeError(format!(
            "unsupported curve type: {}",
            body[0]
        )));
    }

    let curve_code = u16::from_be_bytes([body[1], body[2]]);
    let curve = NamedCurve::from_code(curve_code).ok_or_else(|| {
        TlsError::NegotiationFailed(format!("unsupported named curve: {curve_code}"))
    })?;

    let point_len = body[3] as usize;
    let params_end = 4 + point_len;
    if params_end > body.len() {
        return Err(TlsError::IncompleteMessage("ServerKeyExchange point"));
    }
    let point = body[4..params_end].to_vec();
    let params_raw = body[..params_end].to_vec();

    if params_end + 4 > body.len() {
        return Err(TlsError::IncompleteMessage("ServerKeyExchange signature"));
    }
    let hash = HashAlgorithm::from_code(body[params_end]).ok_or_else(|| {
        TlsError::NegotiationFailed(format!(
            "unsupported hash algorithm in ServerKeyExchange: {}",
            body[params_end]
        ))
    })?;
    let sign = SignatureAlgorithm::from_code(body[params_end + 1]).ok_or_else(|| {
        TlsError::NegotiationFailed(format!(
            "unsupported signature algorithm in ServerKeyExchange: {}",
            body[params_end + 1]
        ))
    })?;
    let scheme = SignatureScheme::new(hash, sign);

    let sig_len =
        u16::from_be_bytes([body[params_end + 2], body[params_end + 3]]) as usize;
    let sig_start = params_end + 4;
    if sig_start + sig_len > body.len() {
        return Err(TlsError::IncompleteMessage("ServerKeyExchange signature"));
    }
    let signature = body[sig_start..sig_start + sig_len].to_vec();

    Ok(EcdheServerParams {
        curve,
        point,
        scheme,
        signature,
        params_raw,
    })
}

/// Verify the ServerKeyExchange signature against the leaf public key.
///
/// The scheme named in the message must be one of the client's supported
/// pairs, and its key type must match the certificate key.
pub fn verify_signature(
    params: &EcdheServerParams,
    client_random: &[u8; 32],
    server_random: &[u8; 32],
    public_key: &PublicKey,
) -> Result<(), TlsError> {
    if !SUPPORTED_SIGNATURE_SCHEMES.contains(&params.scheme) {
        return Err(TlsError::NegotiationFailed(format!(
            "server signed with an unoffered algorithm pair: {:?}",
            params.scheme
        )));
    }

    let mut message = Vec::with_capacity(64 + params.params_raw.len());
    message.extend_from_slice(client_random);
    message.extend_from_slice(server_random);
    message.extend_from_slice(&params.params_raw);

    match (params.scheme.sign, public_key) {
        (SignatureAlgorithm::Rsa, PublicKey::Rsa(key)) => {
            let signature = RsaSignature::try_from(params.signature.as_slice())
                .map_err(|e| TlsError::InvalidSignature(format!("bad RSA signature: {e}")))?;
            match params.scheme.hash {
                HashAlgorithm::Sha256 => RsaVerifyingKey::<Sha256>::new(key.clone())
                    .verify(&message, &signature)
                    .map_err(|e| TlsError::InvalidSignature(e.to_string())),
                HashAlgorithm::Sha384 => RsaVerifyingKey::<Sha384>::new(key.clone())
                    .verify(&message, &signature)
                    .map_err(|e| TlsError::InvalidSignature(e.to_string())),
            }
        }
        (SignatureAlgorithm::Ecdsa, PublicKey::EcdsaP256(key)) => {
            if params.scheme.hash != HashAlgorithm::Sha256 {
                return Err(TlsError::InvalidSignature(
                    "P-256 signature must use SHA-256".into(),
                ));
            }
            let signature = p256::ecdsa::Signature::from_der(&params.signature)
                .map_err(|e| TlsError::InvalidSignature(format!("bad ECDSA signature: {e}")))?;
            key.verify(&message, &signature)
                .map_err(|e| TlsError::InvalidSignature(e.to_string()))
        }
        (SignatureAlgorithm::Ecdsa, PublicKey::EcdsaP384(key)) => {
            if params.scheme.hash != HashAlgorithm::Sha384 {
                return Err(TlsError::InvalidSignature(
                    "P-384 signature must use SHA-384".into(),
                ));
            }
            let signature = p384::ecdsa::Signature::from_der(&params.signature)
                .map_err(|e| TlsError::InvalidSignature(format!("bad ECDSA signature: {e}")))?;
            key.verify(&message, &signature)
                .map_err(|e| TlsError::InvalidSignature(e.to_string()))
        }
        _ => Err(TlsError::InvalidSignature(
            "signature algorithm does not match the certificate key type".into(),
        )),
    }
}
