//! ClientHello extension blocks (RFC 5246 Section 7.4.1.4, RFC 6066).
//!
//! Two extensions are written: `signature_algorithms` carrying the fixed
//! client preference list, and `server_name` (SNI, host_name type) when a
//! server name was configured. The ServerHello extension block, when
//! present, is parsed into generic `(type, data)` pairs.

use crate::cipher_suite::{HashAlgorithm, SignatureAlgorithm};
use crate::error::TlsError;

/// server_name extension type (RFC 6066).
pub const EXT_SERVER_NAME: u16 = 0x0000;
/// signature_algorithms extension type (RFC 5246).
pub const EXT_SIGNATURE_ALGORITHMS: u16 = 0x000d;

/// host_name entry type inside the server_name extension.
const SNI_HOST_NAME: u8 = 0;

/// A hash-and-signature algorithm pair (RFC 5246, Section 7.4.1.4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureScheme {
    pub hash: HashAlgorithm,
    pub sign: SignatureAlgorithm,
}

impl SignatureScheme {
    pub const fn new(hash: HashAlgorithm, sign: SignatureAlgorithm) -> Self {
        Self { hash, sign }
    }

    /// Two-byte wire form: hash code then signature code.
    pub const fn code(self) -> u16 {
        ((self.hash.code() as u16) << 8) | self.sign.code() as u16
    }

    pub const fn from_code(code: u16) -> Option<Self> {
        match (
            HashAlgorithm::from_code((code >> 8) as u8),
            SignatureAlgorithm::from_code(code as u8),
        ) {
            (Some(hash), Some(sign)) => Some(Self { hash, sign }),
            _ => None,
        }
    }
}

/// Client signature-algorithm preference list, most preferred first.
pub static SUPPORTED_SIGNATURE_SCHEMES: [SignatureScheme; 4] = [
    SignatureScheme::new(HashAlgorithm::Sha256, SignatureAlgorithm::Ecdsa),
    SignatureScheme::new(HashAlgorithm::Sha384, SignatureAlgorithm::Ecdsa),
    SignatureScheme::new(HashAlgorithm::Sha256, SignatureAlgorithm::Rsa),
    SignatureScheme::new(HashAlgorithm::Sha384, SignatureAlgorithm::Rsa),
];

/// Append the signature_algorithms extension to an extension block.
pub fn write_signature_algorithms(out: &mut Vec<u8>) {
    let list_len = (SUPPORTED_SIGNATURE_SCHEMES.len() * 2) as u16;

    out.extend_from_slice(&EXT_SIGNATURE_ALGORITHMS.to_be_bytes());
    out.extend_from_slice(&(list_len + 2).to_be_bytes());
    out.extend_from_slice(&list_len.to_be_bytes());
    for scheme in &SUPPORTED_SIGNATURE_SCHEMES {
        out.extend_from_slice(&scheme.code().to_be_bytes());
    }
}

/// Append the server_name (SNI) extension with a single host_name entry.
pub fn write_server_name(out: &mut Vec<u8>, host: &str) {
    let name = host.as_bytes();
    let entry_len = 1 + 2 + name.len(); // type + length + name
    let list_len = entry_len as u16;

    out.extend_from_slice(&EXT_SERVER_NAME.to_be_bytes());
    out.extend_from_slice(&(list_len + 2).to_be_bytes());
    out.extend_from_slice(&list_len.to_be_bytes());
    out.push(SNI_HOST_NAME);
    out.extend_from_slice(&(name.len() as u16).to_be_bytes());
    out.extend_from_slice(name);
}

/// Parse an extension block into `(type, data)` pairs.
pub fn parse_extensions(block: &[u8]) -> Result<Vec<(u16, Vec<u8>)>, TlsError> {
    let mut extensions = Vec::new();
    let mut offset = 0;

    while offset < block.len() {
        if offset + 4 > block.len() {
            return Err(TlsError::IncompleteMessage("extension header"));
        }
        let ext_type = u16::from_be_bytes([block[offset], block[offset + 1]]);
        let data_len = u16::from_be_bytes([block[offset + 2], block[offset + 3]]) as usize;
        offset += 4;

        if offset + data_len > block.len() {
            return Err(TlsError::IncompleteMessage("extension data"));
        }
        extensions.push((ext_type, block[offset..offset + data_len].to_vec()));
        offset += data_len;
    }

    Ok(extensions)
}

/// Parse a signature_algorithms extension body into the schemes we
/// recognize. Unknown code points are skipped, not rejected.
pub fn parse_signature_algorithms(data: &[u8]) -> Result<Vec<SignatureScheme>, TlsError> {
    if data.len() < 2 {
        return Err(TlsError::IncompleteMessage("signature algorithm list"));
    }
    let list_len = u16::from_be_bytes([data[0], data[1]]) as usize;
    if list_len % 2 != 0 || 2 + list_len > data.len() {
        return Err(TlsError::DecodeError(
            "malformed signature algorithm list".into(),
        ));
    }

    let mut schemes = Vec::new();
    for pair in data[2..2 + list_len].chunks_exact(2) {
        let code = u16::from_be_bytes([pair[0], pair[1]]);
        if let Some(scheme) = SignatureScheme::from_code(code) {
            schemes.push(scheme);
        }
    }
    Ok(schemes)
}
