//! Handshake-layer framing (RFC 5246, Section 7.4).
//!
//! Every handshake message carries a 4-byte header: one type byte and a
//! 24-bit big-endian length, packed as `(type << 24) | length`. A single
//! Handshake record may carry several consecutive messages; the splitter
//! below walks them and fails on any truncation.

use std::convert::TryFrom;

use crate::error::TlsError;

/// Handshake header size in bytes.
pub const HANDSHAKE_HEADER_LEN: usize = 4;

/// Maximum handshake message body length (24-bit length field).
pub const MAX_HANDSHAKE_LEN: usize = (1 << 24) - 1;

/// Handshake message types (RFC 5246, Section 7.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandshakeType {
    HelloRequest = 0,
    ClientHello = 1,
    ServerHello = 2,
    Certificate = 11,
    ServerKeyExchange = 12,
    CertificateRequest = 13,
    ServerHelloDone = 14,
    CertificateVerify = 15,
    ClientKeyExchange = 16,
    Finished = 20,
}

impl HandshakeType {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for HandshakeType {
    type Error = TlsError;

    fn try_from(value: u8) -> Result<Self, TlsError> {
        match value {
            0 => Ok(HandshakeType::HelloRequest),
            1 => Ok(HandshakeType::ClientHello),
            2 => Ok(HandshakeType::ServerHello),
            11 => Ok(HandshakeType::Certificate),
            12 => Ok(HandshakeType::ServerKeyExchange),
            13 => Ok(HandshakeType::CertificateRequest),
            14 => Ok(HandshakeType::ServerHelloDone),
            15 => Ok(HandshakeType::CertificateVerify),
            16 => Ok(HandshakeType::ClientKeyExchange),
            20 => Ok(HandshakeType::Finished),
            other => Err(TlsError::InvalidHandshakeType(other)),
        }
    }
}

/// Parsed handshake header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeHeader {
    pub handshake_type: HandshakeType,
    pub length: usize,
}

impl HandshakeHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, TlsError> {
        if bytes.len() < HANDSHAKE_HEADER_LEN {
            return Err(TlsError::IncompleteMessage("handshake header"));
        }
        let word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let handshake_type = HandshakeType::try_from((word >> 24) as u8)?;
        Ok(Self {
            handshake_type,
            length: (word & 0x00ff_ffff) as usize,
        })
    }

    pub fn to_bytes(self) -> [u8; HANDSHAKE_HEADER_LEN] {
        let word = ((self.handshake_type.code() as u32) << 24) | (self.length as u32);
        word.to_be_bytes()
    }
}

/// One handshake message, kept in raw form (header plus body) so the
/// transcript digest can consume the exact bytes that crossed the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeMessage {
    pub handshake_type: HandshakeType,
    raw: Vec<u8>,
}

impl HandshakeMessage {
    /// Frame a message body with its 4-byte header.
    pub fn encode(handshake_type: HandshakeType, body: &[u8]) -> Result<Self, TlsError> {
        if body.len() > MAX_HANDSHAKE_LEN {
            return Err(TlsError::DecodeError(format!(
                "handshake body of {} bytes exceeds the 24-bit length field",
                body.len()
            )));
        }
        let header = HandshakeHeader {
            handshake_type,
            length: body.len(),
        };
        let mut raw = Vec::with_capacity(HANDSHAKE_HEADER_LEN + body.len());
        raw.extend_from_slice(&header.to_bytes());
        raw.extend_from_slice(body);
        Ok(Self {
            handshake_type,
            raw,
        })
    }

    /// Header + body, exactly as transmitted. This is what the transcript
    /// digest consumes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Message body without the header.
    pub fn body(&self) -> &[u8] {
        &self.raw[HANDSHAKE_HEADER_LEN..]
    }
}

/// Split a Handshake record payload into its consecutive messages.
pub fn split_messages(payload: &[u8]) -> Result<Vec<HandshakeMessage>, TlsError> {
    let mut messages = Vec::new();
    let mut offset = 0;

    while offset < payload.len() {
        let header = HandshakeHeader::parse(&payload[offset..])?;
        let end = offset + HANDSHAKE_HEADER_LEN + header.length;
        if end > payload.len() {
            return Err(TlsError::IncompleteMessage("handshake message body"));
        }
        messages.push(HandshakeMessage {
            handshake_type: header.handshake_type,
            raw: payload[offset..end].to_vec(),
        });
        offset = end;
    }

    Ok(messages)
}
