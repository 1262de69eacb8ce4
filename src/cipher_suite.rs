//! Cipher suite registry.
//!
//! A fixed, ordered table of the AEAD suites this client offers. Order is
//! preference: the ClientHello lists suites in registry order and the first
//! one the server accepts wins. Only GCM suites with RSA or ECDHE key
//! exchange are present; non-AEAD suites are out of scope.

/// TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 (RFC 5289).
pub const TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256: u16 = 0xC02B;
/// TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 (RFC 5289).
pub const TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384: u16 = 0xC02C;
/// TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 (RFC 5289).
pub const TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256: u16 = 0xC02F;
/// TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 (RFC 5289).
pub const TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384: u16 = 0xC030;
/// TLS_RSA_WITH_AES_128_GCM_SHA256 (RFC 5288).
pub const TLS_RSA_WITH_AES_128_GCM_SHA256: u16 = 0x009C;
/// TLS_RSA_WITH_AES_256_GCM_SHA384 (RFC 5288).
pub const TLS_RSA_WITH_AES_256_GCM_SHA384: u16 = 0x009D;

/// Key exchange mechanism of a suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExchangeType {
    Rsa,
    Ecdhe,
}

impl KeyExchangeType {
    /// Authentication-type hint passed to the trust verifier, mirroring the
    /// key algorithm family of the expected server certificate.
    pub const fn auth_type_hint(self) -> &'static str {
        match self {
            KeyExchangeType::Rsa => "RSA",
            KeyExchangeType::Ecdhe => "EC",
        }
    }
}

/// Hash algorithm of a suite, used by the PRF, the handshake digest and
/// ServerKeyExchange signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
}

impl HashAlgorithm {
    /// HashAlgorithm code point (RFC 5246, Section 7.4.1.4.1).
    pub const fn code(self) -> u8 {
        match self {
            HashAlgorithm::Sha256 => 4,
            HashAlgorithm::Sha384 => 5,
        }
    }

    pub const fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            4 => Some(HashAlgorithm::Sha256),
            5 => Some(HashAlgorithm::Sha384),
            _ => None,
        }
    }
}

/// Signature algorithm of a suite (RFC 5246, Section 7.4.1.4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Rsa,
    Ecdsa,
}

impl SignatureAlgorithm {
    pub const fn code(self) -> u8 {
        match self {
            SignatureAlgorithm::Rsa => 1,
            SignatureAlgorithm::Ecdsa => 3,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(SignatureAlgorithm::Rsa),
            3 => Some(SignatureAlgorithm::Ecdsa),
            _ => None,
        }
    }
}

/// An immutable cipher suite descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSuite {
    pub code: u16,
    pub name: &'static str,
    pub exchange_type: KeyExchangeType,
    pub key_strength_bits: u16,
    /// Fixed (implicit) part of the AEAD nonce, taken from the key block.
    pub fixed_iv_length: usize,
    /// Full AEAD nonce length.
    pub iv_length: usize,
    /// AEAD authentication tag length in bytes.
    pub tag_length: usize,
    pub hash: HashAlgorithm,
    pub signature_algorithm: SignatureAlgorithm,
}

impl CipherSuite {
    pub const fn key_strength_bytes(&self) -> usize {
        (self.key_strength_bits / 8) as usize
    }
}

macro_rules! gcm_suite {
    ($code:expr, $name:expr, $exchange:expr, $bits:expr, $hash:expr, $sign:expr) => {
        CipherSuite {
            code: $code,
            name: $name,
            exchange_type: $exchange,
            key_strength_bits: $bits,
            fixed_iv_length: 4,
            iv_length: 12,
            tag_length: 16,
            hash: $hash,
            signature_algorithm: $sign,
        }
    };
}

/// Supported suites in preference order. Shared immutably across
/// connections.
pub static SUPPORTED_SUITES: [CipherSuite; 6] = [
    gcm_suite!(
        TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
        "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
        KeyExchangeType::Ecdhe,
        128,
        HashAlgorithm::Sha256,
        SignatureAlgorithm::Ecdsa
    ),
    gcm_suite!(
        TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
        "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
        KeyExchangeType::Ecdhe,
        256,
        HashAlgorithm::Sha384,
        SignatureAlgorithm::Ecdsa
    ),
    gcm_suite!(
        TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
        KeyExchangeType::Ecdhe,
        128,
        HashAlgorithm::Sha256,
        SignatureAlgorithm::Rsa
    ),
    gcm_suite!(
        TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
        "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
        KeyExchangeType::Ecdhe,
        256,
        HashAlgorithm::Sha384,
        SignatureAlgorithm::Rsa
    ),
    gcm_suite!(
        TLS_RSA_WITH_AES_128_GCM_SHA256,
        "TLS_RSA_WITH_AES_128_GCM_SHA256",
        KeyExchangeType::Rsa,
        128,
        HashAlgorithm::Sha256,
        SignatureAlgorithm::Rsa
    ),
    gcm_suite!(
        TLS_RSA_WITH_AES_256_GCM_SHA384,
        "TLS_RSA_WITH_AES_256_GCM_SHA384",
        KeyExchangeType::Rsa,
        256,
        HashAlgorithm::Sha384,
        SignatureAlgorithm::Rsa
    ),
];

/// Look up a suite by its code point.
pub fn suite_by_code(code: u16) -> Option<&'static CipherSuite> {
    SUPPORTED_SUITES.iter().find(|suite| suite.code == code)
}
