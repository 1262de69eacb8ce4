//! A TLS 1.2 client: record-layer codec, handshake state machine and
//! AEAD-protected application-data relay.
//!
//! Scope is a single client-initiated full handshake over GCM suites with
//! RSA or ECDHE key exchange, followed by encrypted bidirectional byte
//! relay. Certificate trust decisions are delegated to an external
//! [`TrustVerifier`].

pub mod alert;
pub mod certificate;
pub mod cipher_suite;
pub mod client;
pub mod client_hello;
pub mod digest;
pub mod error;
pub mod extensions;
pub mod finished;
pub mod handshake;
pub mod handshake_state;
pub mod key_exchange;
pub mod prf;
pub mod record;
pub mod record_cipher;
pub mod server_hello;
pub mod server_key_exchange;
pub mod session;

pub use certificate::{AcceptAnyCertificate, RejectAllCertificates, TrustVerifier};
pub use cipher_suite::{suite_by_code, CipherSuite, KeyExchangeType, SUPPORTED_SUITES};
pub use client::TlsClient;
pub use error::TlsError;
pub use record::{ContentType, RecordHeader};
pub use session::TlsSession;
