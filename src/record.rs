//! TLS record-layer framing (RFC 5246, Section 6.2).
//!
//! A record is a 5-byte header followed by up to [`MAX_RECORD_BODY`] body
//! bytes:
//!
//! ```text
//! struct {
//!     ContentType type;          /* 1 byte  */
//!     ProtocolVersion version;   /* 2 bytes */
//!     uint16 length;             /* 2 bytes, big-endian */
//!     opaque fragment[length];
//! } TLSPlaintext;
//! ```
//!
//! The header is validated before any body bytes are consumed: a declared
//! length above the ceiling fails immediately with
//! [`TlsError::OversizedRecord`], so an attacker cannot make the reader
//! allocate or wait for an oversized frame.

use std::convert::TryFrom;
use std::io::{Read, Write};

use crate::error::TlsError;

/// TLS 1.2 protocol version (0x0303), used for every record we write.
pub const TLS12_VERSION: u16 = 0x0303;

/// Maximum plaintext fragment size (2^14, RFC 5246 Section 6.2.1).
pub const MAX_FRAGMENT_LEN: usize = 16384;

/// Frame-size ceiling for a record body: plaintext maximum plus the
/// expansion bound for protected records (RFC 5246 Section 6.2.3).
pub const MAX_RECORD_BODY: usize = MAX_FRAGMENT_LEN + 2048;

/// Record header size in bytes.
pub const RECORD_HEADER_LEN: usize = 5;

/// Record content types (RFC 5246, Section 6.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContentType {
    ChangeCipherSpec = 20,
    Alert = 21,
    Handshake = 22,
    ApplicationData = 23,
}

impl ContentType {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ContentType {
    type Error = TlsError;

    fn try_from(value: u8) -> Result<Self, TlsError> {
        match value {
            20 => Ok(ContentType::ChangeCipherSpec),
            21 => Ok(ContentType::Alert),
            22 => Ok(ContentType::Handshake),
            23 => Ok(ContentType::ApplicationData),
            other => Err(TlsError::InvalidContentType(other)),
        }
    }
}

/// A parsed record header. Created fresh per record; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub content_type: ContentType,
    pub version: u16,
    pub length: u16,
}

impl RecordHeader {
    pub fn new(content_type: ContentType, version: u16, length: u16) -> Self {
        Self {
            content_type,
            version,
            length,
        }
    }

    /// Parse a record header from exactly [`RECORD_HEADER_LEN`] bytes.
    ///
    /// Validates the content type, the record-layer version (major byte must
    /// be 3, minor at most 3 — servers may echo 0x0301 on the first flight)
    /// and the length ceiling.
    pub fn parse(bytes: &[u8]) -> Result<Self, TlsError> {
        if bytes.len() < RECORD_HEADER_LEN {
            return Err(TlsError::IncompleteMessage("record header"));
        }

        let content_type = ContentType::try_from(bytes[0])?;
        let version = u16::from_be_bytes([bytes[1], bytes[2]]);
        if bytes[1] != 3 || bytes[2] > 3 {
            return Err(TlsError::InvalidRecordVersion(version));
        }

        let length = u16::from_be_bytes([bytes[3], bytes[4]]);
        if length as usize > MAX_RECORD_BODY {
            return Err(TlsError::OversizedRecord(length));
        }

        Ok(Self::new(content_type, version, length))
    }

    pub fn to_bytes(self) -> [u8; RECORD_HEADER_LEN] {
        let version = self.version.to_be_bytes();
        let length = self.length.to_be_bytes();
        [
            self.content_type.code(),
            version[0],
            version[1],
            length[0],
            length[1],
        ]
    }
}

/// A whole record read off the wire. The body is still protected if the
/// read direction has switched to encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsRecord {
    pub content_type: ContentType,
    pub version: u16,
    pub body: Vec<u8>,
}

/// Read one record: header first, then exactly `length` body bytes.
///
/// A stream that ends mid-header or mid-body surfaces
/// [`TlsError::UnexpectedEof`].
pub fn read_record<R: Read>(input: &mut R) -> Result<TlsRecord, TlsError> {
    let mut header_bytes = [0u8; RECORD_HEADER_LEN];
    input.read_exact(&mut header_bytes)?;

    let header = RecordHeader::parse(&header_bytes)?;

    let mut body = vec![0u8; header.length as usize];
    input.read_exact(&mut body)?;

    Ok(TlsRecord {
        content_type: header.content_type,
        version: header.version,
        body,
    })
}

/// Write one record with the TLS 1.2 version and flush.
pub fn write_record<W: Write>(
    output: &mut W,
    content_type: ContentType,
    body: &[u8],
) -> Result<(), TlsError> {
    if body.len() > MAX_RECORD_BODY {
        return Err(TlsError::OversizedRecord(body.len().min(u16::MAX as usize) as u16));
    }

    let header = RecordHeader::new(content_type, TLS12_VERSION, body.len() as u16);
    output.write_all(&header.to_bytes())?;
    output.write_all(body)?;
    output.flush()?;
    Ok(())
}
