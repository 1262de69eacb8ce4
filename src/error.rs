use std::fmt;
use std::io;

use crate::alert::{AlertDescription, AlertLevel};

/// TLS error types for framing, negotiation, cryptographic verification and
/// transport failures.
///
/// Every variant is fatal to the connection: the only recovery policy is to
/// close the underlying stream and surface the error to the caller. The one
/// error callers may reasonably retry at the connection-establishment layer
/// is [`TlsError::UnexpectedEof`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsError {
    /// Record header declared a length above the frame-size ceiling.
    /// Carries the declared length.
    OversizedRecord(u16),
    /// Invalid record content type value.
    InvalidContentType(u8),
    /// Invalid handshake message type value.
    InvalidHandshakeType(u8),
    /// Record-layer protocol version is not an SSL3/TLS version.
    InvalidRecordVersion(u16),
    /// Buffer ended before the structure being decoded was complete.
    /// Carries the name of the structure.
    IncompleteMessage(&'static str),
    /// Malformed message content that is not a simple truncation.
    DecodeError(String),
    /// A message arrived out of order for the current handshake state.
    UnexpectedMessage {
        expected: &'static str,
        received: String,
    },
    /// No common cipher suite or signature algorithm with the peer.
    NegotiationFailed(String),
    /// The trust verifier rejected the certificate chain, or no usable
    /// leaf certificate was present.
    UntrustedCertificate(String),
    /// X.509 certificate could not be parsed.
    CertificateParse(String),
    /// ServerKeyExchange signature did not verify.
    InvalidSignature(String),
    /// Finished MAC mismatch.
    HandshakeVerificationFailed,
    /// AEAD open failed: tag mismatch or undecryptable record.
    AuthenticationFailed,
    /// AEAD seal failed.
    EncryptFailed,
    /// A direction's record sequence counter would wrap.
    SequenceOverflow,
    /// Key exchange material was malformed or mismatched the negotiated suite.
    InvalidKeyExchange(String),
    /// The peer sent an alert record.
    PeerAlert {
        level: AlertLevel,
        description: AlertDescription,
    },
    /// The underlying stream closed mid-record.
    UnexpectedEof,
    /// Any other transport error.
    Io(String),
    /// The session already failed; carries the original terminal reason.
    SessionClosed(String),
}

impl TlsError {
    /// The alert description to send to the peer when aborting on this error.
    pub fn alert_description(&self) -> AlertDescription {
        match self {
            TlsError::OversizedRecord(_) => AlertDescription::RecordOverflow,
            TlsError::InvalidContentType(_)
            | TlsError::InvalidHandshakeType(_)
            | TlsError::InvalidRecordVersion(_)
            | TlsError::IncompleteMessage(_)
            | TlsError::DecodeError(_) => AlertDescription::DecodeError,
            TlsError::UnexpectedMessage { .. } => AlertDescription::UnexpectedMessage,
            TlsError::NegotiationFailed(_) => AlertDescription::HandshakeFailure,
            TlsError::UntrustedCertificate(_) | TlsError::CertificateParse(_) => {
                AlertDescription::BadCertificate
            }
            TlsError::InvalidSignature(_) | TlsError::HandshakeVerificationFailed => {
                AlertDescription::DecryptError
            }
            TlsError::AuthenticationFailed => AlertDescription::BadRecordMac,
            TlsError::InvalidKeyExchange(_) => AlertDescription::IllegalParameter,
            _ => AlertDescription::InternalError,
        }
    }
}

impl fmt::Display for TlsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsError::OversizedRecord(length) => {
                write!(f, "record length {length} exceeds the frame-size ceiling")
            }
            TlsError::InvalidContentType(code) => write!(f, "invalid content type: {code}"),
            TlsError::InvalidHandshakeType(code) => {
                write!(f, "invalid handshake message type: {code}")
            }
            TlsError::InvalidRecordVersion(version) => {
                write!(f, "invalid record-layer version: 0x{version:04x}")
            }
            TlsError::IncompleteMessage(what) => write!(f, "truncated {what}"),
            TlsError::DecodeError(msg) => write!(f, "decode error: {msg}"),
            TlsError::UnexpectedMessage { expected, received } => {
                write!(f, "expected {expected}, received {received}")
            }
            TlsError::NegotiationFailed(msg) => write!(f, "negotiation failed: {msg}"),
            TlsError::UntrustedCertificate(msg) => write!(f, "untrusted certificate: {msg}"),
            TlsError::CertificateParse(msg) => write!(f, "certificate parse error: {msg}"),
            TlsError::InvalidSignature(msg) => {
                write!(f, "server key exchange signature invalid: {msg}")
            }
            TlsError::HandshakeVerificationFailed => {
                write!(f, "Finished verification failed")
            }
            TlsError::AuthenticationFailed => write!(f, "record authentication failed"),
            TlsError::EncryptFailed => write!(f, "record encryption failed"),
            TlsError::SequenceOverflow => write!(f, "record sequence counter overflow"),
            TlsError::InvalidKeyExchange(msg) => write!(f, "invalid key exchange: {msg}"),
            TlsError::PeerAlert { level, description } => {
                write!(f, "peer sent alert, level: {level:?}, code: {description:?}")
            }
            TlsError::UnexpectedEof => write!(f, "unexpected end of stream"),
            TlsError::Io(msg) => write!(f, "I/O error: {msg}"),
            TlsError::SessionClosed(reason) => write!(f, "session closed: {reason}"),
        }
    }
}

impl std::error::Error for TlsError {}

impl From<io::Error> for TlsError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            TlsError::UnexpectedEof
        } else {
            TlsError::Io(err.to_string())
        }
    }
}
