//! ServerHello message (RFC 5246, Section 7.4.1.3).
//!
//! Mirrors the ClientHello layout with a single chosen cipher suite instead
//! of a list. The extensions block is present only if bytes remain after
//! the compression method.

use crate::error::TlsError;
use crate::extensions::{
    parse_extensions, parse_signature_algorithms, SignatureScheme, EXT_SIGNATURE_ALGORITHMS,
};

/// Maximum session id length (RFC 5246, Section 7.4.1.3).
pub const MAX_SESSION_ID_LEN: usize = 32;

/// Parsed ServerHello content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    pub version: u16,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    /// The single suite the server chose.
    pub cipher_suite: u16,
    pub compression_method: u8,
    /// Signature algorithms advertised by the server, if any extension
    /// carried them. Usually empty.
    pub signature_algorithms: Vec<SignatureScheme>,
}

impl ServerHello {
    pub fn from_bytes(body: &[u8]) -> Result<Self, TlsError> {
        let mut offset = 0;

        if body.len() < 2 + 32 + 1 {
            return Err(TlsError::IncompleteMessage("ServerHello"));
        }

        let version = u16::from_be_bytes([body[0], body[1]]);
        offset += 2;

        let mut random = [0u8; 32];
        random.copy_from_slice(&body[offset..offset + 32]);
        offset += 32;

        let session_id_len = body[offset] as usize;
        offset += 1;
        if session_id_len > MAX_SESSION_ID_LEN {
            return Err(TlsError::DecodeError(format!(
                "session id length {session_id_len} exceeds 32"
            )));
        }
        if offset + session_id_len > body.len() {
            return Err(TlsError::IncompleteMessage("ServerHello session id"));
        }
        let session_id = body[offset..offset + session_id_len].to_vec();
        offset += session_id_len;

        if offset + 3 > body.len() {
            return Err(TlsError::IncompleteMessage("ServerHello cipher suite"));
        }
        let cipher_suite = u16::from_be_bytes([body[offset], body[offset + 1]]);
        offset += 2;
        let compression_method = body[offset];
        offset += 1;

        // Extension block only if bytes remain.
        let mut signature_algorithms = Vec::new();
        if offset < body.len() {
            if offset + 2 > body.len() {
                return Err(TlsError::IncompleteMessage("ServerHello extensions"));
            }
            let ext_len = u16::from_be_bytes([body[offset], body[offset + 1]]) as usize;
            offset += 2;
            if offset + ext_len > body.len() {
                return Err(TlsError::IncompleteMessage("ServerHello extensions"));
            }

            for (ext_type, data) in parse_extensions(&body[offset..offset + ext_len])? {
                if ext_type == EXT_SIGNATURE_ALGORITHMS {
                    signature_algorithms = parse_signature_algorithms(&data)?;
                }
            }
        }

        Ok(Self {
            version,
            random,
            session_id,
            cipher_suite,
            compression_method,
            signature_algorithms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_body(session_id_len: u8) -> Vec<u8> {
        let mut body = vec![0x03, 0x03];
        body.extend_from_slice(&[0x11; 32]);
        body.push(session_id_len);
        body.extend(std::iter::repeat(0xee).take(session_id_len as usize));
        body.extend_from_slice(&[0x00, 0x9C]); // TLS_RSA_WITH_AES_128_GCM_SHA256
        body.push(0x00);
        body
    }

    #[test]
    fn parse_minimal_hello() {
        let hello = ServerHello::from_bytes(&sample_body(0)).unwrap();
        assert_eq!(hello.version, 0x0303);
        assert_eq!(hello.cipher_suite, 0x009C);
        assert!(hello.session_id.is_empty());
        assert!(hello.signature_algorithms.is_empty());
    }

    #[test]
    fn session_id_over_32_rejected() {
        // Length byte says 33; the decoder must fail before reading it.
        let mut body = sample_body(0);
        body[34] = 33;
        body.extend_from_slice(&[0u8; 33]);
        assert!(matches!(
            ServerHello::from_bytes(&body),
            Err(TlsError::DecodeError(_))
        ));
    }

    #[test]
    fn truncated_hello_rejected() {
        let body = sample_body(0);
        assert!(matches!(
            ServerHello::from_bytes(&body[..20]),
            Err(TlsError::IncompleteMessage(_))
        ));
    }
}
