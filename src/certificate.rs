//! Certificate message codec, leaf selection and the trust-verification
//! seam (RFC 5246, Section 7.4.2).
//!
//! The chain codec parses the TLS 1.2 wire form:
//!
//! ```text
//! struct {
//!     ASN.1Cert certificate_list<0..2^24-1>;  /* 3-byte total length,  */
//! } Certificate;                              /* then {3-byte length,  */
//!                                             /*  DER bytes} entries   */
//! ```
//!
//! Path building and trust decisions are not implemented here: the chain is
//! handed to an external [`TrustVerifier`] together with an
//! authentication-type hint derived from the negotiated key exchange. This
//! module only selects a usable leaf among the certificates whose signature
//! algorithm matches the client's supported pairs, and extracts its public
//! key for key exchange and ServerKeyExchange verification.

use p256::ecdsa::VerifyingKey as P256VerifyingKey;
use p384::ecdsa::VerifyingKey as P384VerifyingKey;
use rsa::RsaPublicKey;
use x509_parser::der_parser::asn1_rs::Oid;
use x509_parser::der_parser::oid;
use x509_parser::oid_registry;
use x509_parser::prelude::*;

use crate::cipher_suite::{HashAlgorithm, SignatureAlgorithm};
use crate::error::TlsError;
use crate::extensions::{SignatureScheme, SUPPORTED_SIGNATURE_SCHEMES};

/// Maximum number of certificates accepted in a chain.
pub const MAX_CHAIN_LENGTH: usize = 10;

/// secp384r1 curve OID; not present in `oid_registry`.
const OID_EC_P384: Oid<'static> = oid!(1.3.132 .0 .34);

// Certificate signature-algorithm OIDs, matched during leaf selection.
const OID_SHA256_WITH_RSA: Oid<'static> = oid!(1.2.840 .113549 .1 .1 .11);
const OID_SHA384_WITH_RSA: Oid<'static> = oid!(1.2.840 .113549 .1 .1 .12);
const OID_ECDSA_WITH_SHA256: Oid<'static> = oid!(1.2.840 .10045 .4 .3 .2);
const OID_ECDSA_WITH_SHA384: Oid<'static> = oid!(1.2.840 .10045 .4 .3 .3);

/// Parse the Certificate message body into DER chain entries.
pub fn read_certificate_chain(body: &[u8]) -> Result<Vec<Vec<u8>>, TlsError> {
    if body.len() < 3 {
        return Err(TlsError::IncompleteMessage("certificate chain length"));
    }

    let chain_len = read_u24(&body[0..3]);
    let chain_end = 3 + chain_len;
    if chain_end > body.len() {
        return Err(TlsError::IncompleteMessage("certificate chain"));
    }

    let mut chain = Vec::new();
    let mut offset = 3;
    while offset < chain_end {
        if offset + 3 > chain_end {
            return Err(TlsError::IncompleteMessage("certificate entry length"));
        }
        let cert_len = read_u24(&body[offset..offset + 3]);
        offset += 3;

        if offset + cert_len > chain_end {
            return Err(TlsError::DecodeError(
                "certificate entry overruns declared chain length".into(),
            ));
        }
        if cert_len == 0 {
            return Err(TlsError::DecodeError("empty certificate entry".into()));
        }
        if chain.len() == MAX_CHAIN_LENGTH {
            return Err(TlsError::DecodeError(format!(
                "certificate chain longer than {MAX_CHAIN_LENGTH} entries"
            )));
        }

        chain.push(body[offset..offset + cert_len].to_vec());
        offset += cert_len;
    }

    Ok(chain)
}

fn read_u24(bytes: &[u8]) -> usize {
    ((bytes[0] as usize) << 16) | ((bytes[1] as usize) << 8) | (bytes[2] as usize)
}

/// A server public key extracted from the leaf certificate.
#[derive(Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(P256VerifyingKey),
    EcdsaP384(P384VerifyingKey),
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublicKey::Rsa(_) => f.write_str("PublicKey::Rsa"),
            PublicKey::EcdsaP256(_) => f.write_str("PublicKey::EcdsaP256"),
            PublicKey::EcdsaP384(_) => f.write_str("PublicKey::EcdsaP384"),
        }
    }
}

/// The selected leaf certificate and its public key.
#[derive(Debug, Clone)]
pub struct ServerCertificate {
    pub der: Vec<u8>,
    pub public_key: PublicKey,
}

/// Map a certificate signature-algorithm OID onto the hash/signature pair
/// it represents, if we support it.
fn scheme_for_signature_oid(oid: &Oid<'_>) -> Option<SignatureScheme> {
    if oid == &OID_SHA256_WITH_RSA {
        Some(SignatureScheme::new(
            HashAlgorithm::Sha256,
            SignatureAlgorithm::Rsa,
        ))
    } else if oid == &OID_SHA384_WITH_RSA {
        Some(SignatureScheme::new(
            HashAlgorithm::Sha384,
            SignatureAlgorithm::Rsa,
        ))
    } else if oid == &OID_ECDSA_WITH_SHA256 {
        Some(SignatureScheme::new(
            HashAlgorithm::Sha256,
            SignatureAlgorithm::Ecdsa,
        ))
    } else if oid == &OID_ECDSA_WITH_SHA384 {
        Some(SignatureScheme::new(
            HashAlgorithm::Sha384,
            SignatureAlgorithm::Ecdsa,
        ))
    } else {
        None
    }
}

/// Select the first chain certificate whose signature algorithm matches one
/// of the client's supported pairs, and extract its public key.
pub fn select_leaf(chain: &[Vec<u8>]) -> Result<ServerCertificate, TlsError> {
    if chain.is_empty() {
        return Err(TlsError::UntrustedCertificate(
            "server sent no certificate".into(),
        ));
    }

    for der in chain {
        let (_, cert) = match X509Certificate::from_der(der) {
            Ok(parsed) => parsed,
            Err(_) => continue,
        };
        let scheme = match scheme_for_signature_oid(&cert.signature_algorithm.algorithm) {
            Some(scheme) => scheme,
            None => continue,
        };
        if !SUPPORTED_SIGNATURE_SCHEMES.contains(&scheme) {
            continue;
        }

        let public_key = extract_public_key(der)?;
        return Ok(ServerCertificate {
            der: der.clone(),
            public_key,
        });
    }

    Err(TlsError::UntrustedCertificate(
        "no certificate with a supported signature algorithm".into(),
    ))
}

/// Extract the SubjectPublicKeyInfo key from a DER certificate.
pub fn extract_public_key(der: &[u8]) -> Result<PublicKey, TlsError> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| TlsError::CertificateParse(format!("failed to parse certificate: {e}")))?;

    let spki = cert.public_key();
    let algorithm_oid = &spki.algorithm.algorithm;

    if algorithm_oid == &oid_registry::OID_PKCS1_RSAENCRYPTION {
        parse_rsa_public_key(&spki.subject_public_key.data)
    } else if algorithm_oid == &oid_registry::OID_KEY_TYPE_EC_PUBLIC_KEY {
        parse_ec_public_key(spki)
    } else {
        Err(TlsError::CertificateParse(format!(
            "unsupported public key algorithm: {algorithm_oid:?}"
        )))
    }
}

fn parse_rsa_public_key(key_data: &[u8]) -> Result<PublicKey, TlsError> {
    use rsa::pkcs1::DecodeRsaPublicKey;
    use rsa::pkcs8::DecodePublicKey;

    // SPKI carries the PKCS#1 RSAPublicKey in its BIT STRING; some encoders
    // nest a full SPKI instead, so try both forms.
    RsaPublicKey::from_pkcs1_der(key_data)
        .or_else(|_| RsaPublicKey::from_public_key_der(key_data))
        .map(PublicKey::Rsa)
        .map_err(|e| TlsError::CertificateParse(format!("failed to parse RSA public key: {e}")))
}

fn parse_ec_public_key(spki: &SubjectPublicKeyInfo) -> Result<PublicKey, TlsError> {
    let curve_oid = match &spki.algorithm.parameters {
        Some(params) => params
            .as_oid()
            .map_err(|e| TlsError::CertificateParse(format!("failed to parse curve OID: {e}")))?,
        None => {
            return Err(TlsError::CertificateParse(
                "missing curve parameters for EC key".into(),
            ))
        }
    };

    let key_data = &spki.subject_public_key.data;

    if curve_oid == oid_registry::OID_EC_P256 {
        P256VerifyingKey::from_sec1_bytes(key_data)
            .map(PublicKey::EcdsaP256)
            .map_err(|e| {
                TlsError::CertificateParse(format!("failed to parse P-256 public key: {e}"))
            })
    } else if curve_oid == OID_EC_P384 {
        P384VerifyingKey::from_sec1_bytes(key_data)
            .map(PublicKey::EcdsaP384)
            .map_err(|e| {
                TlsError::CertificateParse(format!("failed to parse P-384 public key: {e}"))
            })
    } else {
        Err(TlsError::CertificateParse(format!(
            "unsupported elliptic curve: {curve_oid:?}"
        )))
    }
}

/// External trust-verification collaborator.
///
/// Supplied by the host environment; this crate performs no path building
/// of its own. `auth_type` is `"RSA"` or `"EC"` depending on the negotiated
/// key exchange.
pub trait TrustVerifier {
    fn verify(&self, chain: &[Vec<u8>], auth_type: &str) -> Result<(), TlsError>;
}

/// Rejects every chain. The default verifier: a client that has not been
/// given a real trust decision must not complete a handshake.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAllCertificates;

impl TrustVerifier for RejectAllCertificates {
    fn verify(&self, _chain: &[Vec<u8>], _auth_type: &str) -> Result<(), TlsError> {
        Err(TlsError::UntrustedCertificate(
            "no trust verifier configured".into(),
        ))
    }
}

/// Accepts every chain without inspection.
///
/// For tests and tooling only; using this in production disables server
/// authentication entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyCertificate;

impl TrustVerifier for AcceptAnyCertificate {
    fn verify(&self, _chain: &[Vec<u8>], _auth_type: &str) -> Result<(), TlsError> {
        Ok(())
    }
}
