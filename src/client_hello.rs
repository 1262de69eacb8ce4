//! ClientHello message (RFC 5246, Section 7.4.1.2).
//!
//! Wire layout of the body:
//! - client_version (2 bytes, 0x0303)
//! - random (32 bytes: 4-byte big-endian Unix time + 28 random bytes)
//! - session_id (1-byte length + bytes; always empty, no resumption)
//! - cipher_suites (2-byte length + 2 bytes per suite, preference order)
//! - compression_methods (1-byte length + 0x00, null only)
//! - extensions (2-byte length + signature_algorithms [+ server_name])

use rand::rngs::OsRng;
use rand::RngCore;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::TlsError;
use crate::extensions::{
    parse_extensions, write_server_name, write_signature_algorithms, EXT_SERVER_NAME,
};
use crate::record::TLS12_VERSION;

/// Hello random length (RFC 5246, Section 7.4.1.2).
pub const CLIENT_RANDOM_LEN: usize = 32;

/// Generate the 32-byte client random: the first four bytes carry the
/// current Unix time, the remaining 28 come from the OS RNG.
pub fn generate_client_random() -> [u8; CLIENT_RANDOM_LEN] {
    let mut random = [0u8; CLIENT_RANDOM_LEN];
    OsRng.fill_bytes(&mut random);

    let unix_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or(0);
    random[..4].copy_from_slice(&unix_time.to_be_bytes());

    random
}

/// ClientHello message content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub random: [u8; CLIENT_RANDOM_LEN],
    /// Offered suite codes in preference order.
    pub cipher_suites: Vec<u16>,
    /// Populates the server_name extension when present.
    pub server_name: Option<String>,
}

impl ClientHello {
    pub fn new(
        random: [u8; CLIENT_RANDOM_LEN],
        cipher_suites: Vec<u16>,
        server_name: Option<String>,
    ) -> Self {
        Self {
            random,
            cipher_suites,
            server_name,
        }
    }

    /// Parse a ClientHello body, the mirror of [`to_bytes`](Self::to_bytes).
    ///
    /// A session-id length above 32 is fatal. The session id itself and any
    /// extension other than server_name are validated for framing and
    /// discarded.
    pub fn from_bytes(body: &[u8]) -> Result<Self, TlsError> {
        if body.len() < 2 + CLIENT_RANDOM_LEN + 1 {
            return Err(TlsError::IncompleteMessage("ClientHello"));
        }

        let mut random = [0u8; CLIENT_RANDOM_LEN];
        random.copy_from_slice(&body[2..2 + CLIENT_RANDOM_LEN]);
        let mut offset = 2 + CLIENT_RANDOM_LEN;

        let session_id_len = body[offset] as usize;
        offset += 1;
        if session_id_len > 32 {
            return Err(TlsError::DecodeError(format!(
                "session id length {session_id_len} exceeds 32"
            )));
        }
        if offset + session_id_len > body.len() {
            return Err(TlsError::IncompleteMessage("ClientHello session id"));
        }
        offset += session_id_len;

        if offset + 2 > body.len() {
            return Err(TlsError::IncompleteMessage("ClientHello cipher suites"));
        }
        let suites_len = u16::from_be_bytes([body[offset], body[offset + 1]]) as usize;
        offset += 2;
        if suites_len % 2 != 0 || offset + suites_len > body.len() {
            return Err(TlsError::DecodeError("malformed cipher suite list".into()));
        }
        let cipher_suites = body[offset..offset + suites_len]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        offset += suites_len;

        if offset + 1 > body.len() {
            return Err(TlsError::IncompleteMessage("ClientHello compression"));
        }
        let compression_len = body[offset] as usize;
        offset += 1;
        if offset + compression_len > body.len() {
            return Err(TlsError::IncompleteMessage("ClientHello compression"));
        }
        offset += compression_len;

        let mut server_name = None;
        if offset < body.len() {
            if offset + 2 > body.len() {
                return Err(TlsError::IncompleteMessage("ClientHello extensions"));
            }
            let ext_len = u16::from_be_bytes([body[offset], body[offset + 1]]) as usize;
            offset += 2;
            if offset + ext_len > body.len() {
                return Err(TlsError::IncompleteMessage("ClientHello extensions"));
            }
            for (ext_type, data) in parse_extensions(&body[offset..offset + ext_len])? {
                if ext_type == EXT_SERVER_NAME && data.len() >= 5 {
                    let name_len = u16::from_be_bytes([data[3], data[4]]) as usize;
                    if 5 + name_len <= data.len() {
                        server_name =
                            String::from_utf8(data[5..5 + name_len].to_vec()).ok();
                    }
                }
            }
        }

        Ok(Self {
            random,
            cipher_suites,
            server_name,
        })
    }

    /// Serialize the message body (without the handshake header).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::new();

        body.extend_from_slice(&TLS12_VERSION.to_be_bytes());
        body.extend_from_slice(&self.random);

        // Empty session id: resumption is out of scope.
        body.push(0);

        let suites_len = (self.cipher_suites.len() * 2) as u16;
        body.extend_from_slice(&suites_len.to_be_bytes());
        for suite in &self.cipher_suites {
            body.extend_from_slice(&suite.to_be_bytes());
        }

        // Null compression only.
        body.push(0x01);
        body.push(0x00);

        let mut extensions = Vec::new();
        write_signature_algorithms(&mut extensions);
        if let Some(host) = &self.server_name {
            write_server_name(&mut extensions, host);
        }
        body.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
        body.extend_from_slice(&extensions);

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_random_carries_unix_time_prefix() {
        let random = generate_client_random();
        let stamp = u32::from_be_bytes([random[0], random[1], random[2], random[3]]);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32;
        assert!(now.abs_diff(stamp) < 60);
    }

    #[test]
    fn body_layout() {
        let hello = ClientHello::new([0xabu8; 32], vec![0xC02B, 0x009C], None);
        let body = hello.to_bytes();

        // version
        assert_eq!(&body[0..2], &[0x03, 0x03]);
        // random
        assert_eq!(&body[2..34], &[0xab; 32]);
        // empty session id
        assert_eq!(body[34], 0);
        // suites: length 4, then the two codes in order
        assert_eq!(&body[35..37], &[0x00, 0x04]);
        assert_eq!(&body[37..41], &[0xC0, 0x2B, 0x00, 0x9C]);
        // null compression
        assert_eq!(&body[41..43], &[0x01, 0x00]);
        // extensions length covers the rest
        let ext_len = u16::from_be_bytes([body[43], body[44]]) as usize;
        assert_eq!(body.len(), 45 + ext_len);
    }

    #[test]
    fn sni_extension_present_when_configured() {
        let without = ClientHello::new([0u8; 32], vec![0x009C], None).to_bytes();
        let with =
            ClientHello::new([0u8; 32], vec![0x009C], Some("example.com".into())).to_bytes();
        assert!(with.len() > without.len());
    }

    #[test]
    fn round_trip_through_from_bytes() {
        let hello = ClientHello::new(
            [0x21u8; 32],
            vec![0xC02B, 0x009C],
            Some("example.com".into()),
        );
        let parsed = ClientHello::from_bytes(&hello.to_bytes()).unwrap();
        assert_eq!(parsed, hello);
    }

    #[test]
    fn oversized_session_id_rejected() {
        let mut body = ClientHello::new([0u8; 32], vec![0x009C], None).to_bytes();
        body[34] = 33;
        assert!(matches!(
            ClientHello::from_bytes(&body),
            Err(TlsError::DecodeError(_))
        ));
    }
}
