//! TLS 1.2 client handshake driver.
//!
//! [`TlsClient`] owns the underlying stream and runs the full client
//! handshake exactly once:
//!
//! ```text
//! ClientHello            -------->
//!                                        ServerHello
//!                                        Certificate
//!                                  [ServerKeyExchange]   (ECDHE only)
//!                                [CertificateRequest]
//!                        <--------       ServerHelloDone
//! ClientKeyExchange
//! ChangeCipherSpec
//! Finished               -------->
//!                                        ChangeCipherSpec
//!                        <--------       Finished
//! ApplicationData        <------->       ApplicationData
//! ```
//!
//! On success the negotiated state moves into a [`TlsSession`]; on any
//! fatal error a TLS alert is sent (best effort) and the typed error is
//! surfaced. All reads and writes block on the underlying stream; callers
//! impose timeouts through the stream itself (for example
//! `TcpStream::set_read_timeout`).
//!
//! # Example
//!
//! ```rust,no_run
//! use tls12_client::{AcceptAnyCertificate, TlsClient};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = TlsClient::connect("example.com:443")?;
//! client.set_trust_verifier(Box::new(AcceptAnyCertificate));
//! let mut session = client.negotiate()?;
//!
//! session.send(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n")?;
//! let response = session.receive()?;
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::TcpStream;

use zeroize::Zeroizing;

use crate::alert::Alert;
use crate::certificate::{
    read_certificate_chain, select_leaf, PublicKey, RejectAllCertificates, TrustVerifier,
};
use crate::cipher_suite::{suite_by_code, CipherSuite, KeyExchangeType, SUPPORTED_SUITES};
use crate::client_hello::{generate_client_random, ClientHello};
use crate::digest::HandshakeDigest;
use crate::error::TlsError;
use crate::extensions::SUPPORTED_SIGNATURE_SCHEMES;
use crate::finished::{client_verify_data, server_verify_data, verify_peer_finished};
use crate::handshake::{split_messages, HandshakeMessage, HandshakeType};
use crate::handshake_state::HandshakeFlow;
use crate::key_exchange::{
    ecdhe_client_key_exchange, rsa_client_key_exchange, rsa_pre_master_secret, EcdheKeyPair,
    NegotiatedExchange,
};
use crate::prf::{key_material, master_secret};
use crate::record::{self, ContentType, TLS12_VERSION};
use crate::record_cipher::{Direction, RecordCipher};
use crate::server_key_exchange::{parse_server_key_exchange, verify_signature};
use crate::server_hello::ServerHello;
use crate::session::TlsSession;

/// TLS 1.2 client bound to one underlying byte stream.
pub struct TlsClient<S: Read + Write> {
    stream: S,
    flow: HandshakeFlow,
    digest: HandshakeDigest,
    pending: VecDeque<HandshakeMessage>,
    read_cipher: Option<RecordCipher>,
    write_cipher: Option<RecordCipher>,
    offered_suites: Vec<u16>,
    server_name: Option<String>,
    trust: Box<dyn TrustVerifier>,
}

struct EstablishedParts {
    suite: &'static CipherSuite,
    certificate_requested: bool,
}

impl TlsClient<TcpStream> {
    /// Connect over TCP and prepare a client with the host part of `addr`
    /// as the SNI server name.
    pub fn connect(addr: &str) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr)?;

        let server_name = match addr.rfind(':') {
            Some(colon) => addr[..colon].to_string(),
            None => addr.to_string(),
        };

        let mut client = Self::new(stream);
        client.server_name = Some(server_name);
        Ok(client)
    }
}

impl<S: Read + Write> TlsClient<S> {
    /// Wrap an established bidirectional stream.
    ///
    /// Defaults: the full registry is offered in preference order, no SNI
    /// name, and a trust verifier that rejects everything — callers must
    /// install a real [`TrustVerifier`] before the handshake can succeed.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            flow: HandshakeFlow::new(),
            digest: HandshakeDigest::new(),
            pending: VecDeque::new(),
            read_cipher: None,
            write_cipher: None,
            offered_suites: SUPPORTED_SUITES.iter().map(|suite| suite.code).collect(),
            server_name: None,
            trust: Box::new(RejectAllCertificates),
        }
    }

    /// Set the host name carried in the server_name (SNI) extension.
    pub fn set_server_name(&mut self, name: impl Into<String>) {
        self.server_name = Some(name.into());
    }

    /// Override the offered cipher suite codes. Order encodes preference.
    pub fn set_cipher_suites(&mut self, suites: Vec<u16>) {
        self.offered_suites = suites;
    }

    /// Install the trust-verification collaborator.
    pub fn set_trust_verifier(&mut self, verifier: Box<dyn TrustVerifier>) {
        self.trust = verifier;
    }

    /// Run the handshake and return the established session.
    ///
    /// Any failure aborts the connection: a fatal alert is sent if the
    /// stream is still writable, and the typed error is returned. The
    /// session is never produced after a failure.
    pub fn negotiate(mut self) -> Result<TlsSession<S>, TlsError> {
        match self.run_handshake() {
            Ok(parts) => {
                let (read_cipher, write_cipher) =
                    match (self.read_cipher.take(), self.write_cipher.take()) {
                        (Some(read), Some(write)) => (read, write),
                        _ => {
                            return Err(TlsError::Io(
                                "record ciphers missing after handshake".into(),
                            ))
                        }
                    };
                Ok(TlsSession::new(
                    self.stream,
                    parts.suite,
                    read_cipher,
                    write_cipher,
                    parts.certificate_requested,
                ))
            }
            Err(err) => {
                self.flow.abort();
                match err {
                    // The peer already gave up or the transport is gone;
                    // nothing useful to send.
                    TlsError::PeerAlert { .. } | TlsError::UnexpectedEof | TlsError::Io(_) => {}
                    _ => {
                        let alert =
                            Alert::new(crate::alert::AlertLevel::Fatal, err.alert_description());
                        let _ = self.write_record_out(ContentType::Alert, &alert.to_bytes());
                    }
                }
                Err(err)
            }
        }
    }

    fn run_handshake(&mut self) -> Result<EstablishedParts, TlsError> {
        let client_random = generate_client_random();
        let offered = self.offered_suites.clone();

        // 1. ClientHello
        let hello = ClientHello::new(client_random, offered.clone(), self.server_name.clone());
        let message = HandshakeMessage::encode(HandshakeType::ClientHello, &hello.to_bytes())?;
        self.write_handshake_message(&message)?;
        self.flow.on_client_hello_sent()?;

        // 2. ServerHello: fixes the suite, the PRF hash and the transcript
        // hash. The chosen suite must be both offered and in the registry.
        let message = self.expect_message(HandshakeType::ServerHello)?;
        let server_hello = ServerHello::from_bytes(message.body())?;

        if server_hello.version != TLS12_VERSION {
            return Err(TlsError::NegotiationFailed(format!(
                "server selected version 0x{:04x}, only TLS 1.2 is supported",
                server_hello.version
            )));
        }
        if server_hello.compression_method != 0 {
            return Err(TlsError::NegotiationFailed(format!(
                "server selected compression method {}",
                server_hello.compression_method
            )));
        }
        let suite = suite_by_code(server_hello.cipher_suite)
            .filter(|suite| offered.contains(&suite.code))
            .ok_or_else(|| {
                TlsError::NegotiationFailed(format!(
                    "server selected unoffered cipher suite 0x{:04x}",
                    server_hello.cipher_suite
                ))
            })?;
        self.digest.select_hash(suite.hash);
        self.flow.on_server_hello()?;

        // The suite must be signable with at least one of our pairs, and
        // with one the server also listed if it sent a list at all.
        let candidates: Vec<_> = SUPPORTED_SIGNATURE_SCHEMES
            .iter()
            .filter(|scheme| {
                scheme.hash == suite.hash && scheme.sign == suite.signature_algorithm
            })
            .collect();
        if candidates.is_empty() {
            return Err(TlsError::NegotiationFailed(format!(
                "no signature algorithm pair for suite {}",
                suite.name
            )));
        }
        if !server_hello.signature_algorithms.is_empty()
            && !candidates
                .iter()
                .any(|scheme| server_hello.signature_algorithms.contains(scheme))
        {
            return Err(TlsError::NegotiationFailed(
                "no signature algorithm in common with the server".into(),
            ));
        }

        // 3. Certificate: hand the chain to the external trust verifier,
        // then pick a usable leaf.
        let message = self.expect_message(HandshakeType::Certificate)?;
        let chain = read_certificate_chain(message.body())?;
        if chain.is_empty() {
            return Err(TlsError::UntrustedCertificate(
                "server sent an empty certificate chain".into(),
            ));
        }
        self.trust
            .verify(&chain, suite.exchange_type.auth_type_hint())?;
        let server_cert = select_leaf(&chain)?;
        self.flow.on_certificate()?;

        // 4. ServerKeyExchange / CertificateRequest until ServerHelloDone.
        let mut certificate_requested = false;
        let mut ecdhe_params = None;
        loop {
            let message = self.next_handshake_message()?;
            match message.handshake_type {
                HandshakeType::ServerKeyExchange => {
                    if suite.exchange_type != KeyExchangeType::Ecdhe {
                        self.flow.abort();
                        return Err(TlsError::UnexpectedMessage {
                            expected: "ServerHelloDone",
                            received: "ServerKeyExchange in RSA key exchange".into(),
                        });
                    }
                    self.flow.on_server_key_exchange()?;
                    let params = parse_server_key_exchange(message.body())?;
                    verify_signature(
                        &params,
                        &client_random,
                        &server_hello.random,
                        &server_cert.public_key,
                    )?;
                    ecdhe_params = Some(params);
                }
                HandshakeType::CertificateRequest => {
                    // No client certificate: record that it was asked for
                    // and continue.
                    self.flow.on_certificate_request()?;
                    certificate_requested = true;
                }
                HandshakeType::ServerHelloDone => {
                    if !message.body().is_empty() {
                        return Err(TlsError::DecodeError(
                            "ServerHelloDone with non-empty body".into(),
                        ));
                    }
                    self.flow.on_server_done()?;
                    break;
                }
                other => {
                    self.flow.abort();
                    return Err(TlsError::UnexpectedMessage {
                        expected: "ServerKeyExchange, CertificateRequest or ServerHelloDone",
                        received: format!("{other:?}"),
                    });
                }
            }
        }

        let exchange = match suite.exchange_type {
            KeyExchangeType::Rsa => NegotiatedExchange::Rsa,
            KeyExchangeType::Ecdhe => NegotiatedExchange::Ecdhe {
                params: ecdhe_params.ok_or_else(|| TlsError::UnexpectedMessage {
                    expected: "ServerKeyExchange",
                    received: "ServerHelloDone without key exchange parameters".into(),
                })?,
            },
        };

        // 5. Pre-master secret and ClientKeyExchange.
        let (pre_master, key_exchange_body) = match exchange {
            NegotiatedExchange::Rsa => {
                let rsa_key = match &server_cert.public_key {
                    PublicKey::Rsa(key) => key,
                    other => {
                        return Err(TlsError::InvalidKeyExchange(format!(
                            "RSA key exchange requires an RSA certificate key, got {other:?}"
                        )))
                    }
                };
                let pre_master = rsa_pre_master_secret();
                let body = rsa_client_key_exchange(&pre_master, rsa_key)?;
                (pre_master, body)
            }
            NegotiatedExchange::Ecdhe { params } => {
                let keypair = EcdheKeyPair::generate(params.curve);
                let body = ecdhe_client_key_exchange(keypair.public_point());
                let pre_master = keypair.shared_secret(&params.point)?;
                (pre_master, body)
            }
        };

        let message = HandshakeMessage::encode(HandshakeType::ClientKeyExchange, &key_exchange_body)?;
        self.write_handshake_message(&message)?;

        // Master secret is derived exactly once; the pre-master secret is
        // wiped immediately after.
        let master = Zeroizing::new(master_secret(
            suite.hash,
            &pre_master,
            &client_random,
            &server_hello.random,
        ));
        drop(pre_master);

        let keys = key_material(suite, &master, &server_hello.random, &client_random)?;

        // 6. ChangeCipherSpec switches our write direction to encryption.
        // The record is not a handshake message and never enters the digest.
        self.write_record_out(ContentType::ChangeCipherSpec, &[1])?;
        self.write_cipher = Some(RecordCipher::new(suite, &keys, Direction::ClientWrite)?);

        // 7. Client Finished: MAC over the transcript as it stood before
        // this message, then the message itself joins the transcript.
        let verify = client_verify_data(suite.hash, &master, &self.digest.snapshot());
        let message = HandshakeMessage::encode(HandshakeType::Finished, &verify)?;
        self.write_handshake_message(&message)?;

        // 8. Server ChangeCipherSpec switches the read direction.
        self.await_change_cipher_spec()?;
        self.read_cipher = Some(RecordCipher::new(suite, &keys, Direction::ServerWrite)?);
        drop(keys);

        // 9. Server Finished, verified in constant time against the
        // transcript before the server's Finished was appended.
        let expected = server_verify_data(suite.hash, &master, &self.digest.snapshot());
        let message = self.expect_message(HandshakeType::Finished)?;
        verify_peer_finished(&expected, message.body())?;
        self.flow.on_server_finished_verified()?;

        Ok(EstablishedParts {
            suite,
            certificate_requested,
        })
    }

    /// Digest and transmit one handshake message, encrypting when the write
    /// direction has switched.
    fn write_handshake_message(&mut self, message: &HandshakeMessage) -> Result<(), TlsError> {
        self.digest.update(message.raw());
        self.write_record_out(ContentType::Handshake, message.raw())
    }

    fn write_record_out(
        &mut self,
        content_type: ContentType,
        payload: &[u8],
    ) -> Result<(), TlsError> {
        match &mut self.write_cipher {
            Some(cipher) => {
                let body = cipher.encrypt(content_type, payload)?;
                record::write_record(&mut self.stream, content_type, &body)
            }
            None => record::write_record(&mut self.stream, content_type, payload),
        }
    }

    /// Deliver the next handshake message.
    ///
    /// HelloRequest messages are dropped without touching the transcript;
    /// every other received message except Finished is digested on
    /// delivery. Alert records are fatal during the handshake.
    fn next_handshake_message(&mut self) -> Result<HandshakeMessage, TlsError> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                if message.handshake_type == HandshakeType::HelloRequest {
                    continue;
                }
                if message.handshake_type != HandshakeType::Finished {
                    self.digest.update(message.raw());
                }
                return Ok(message);
            }

            let record = record::read_record(&mut self.stream)?;
            let content_type = record.content_type;
            let payload = match &mut self.read_cipher {
                Some(cipher) => cipher.decrypt(content_type, &record.body)?,
                None => record.body,
            };

            match content_type {
                ContentType::Handshake => {
                    self.pending.extend(split_messages(&payload)?);
                }
                ContentType::Alert => {
                    let alert = Alert::from_bytes(&payload)?;
                    return Err(TlsError::PeerAlert {
                        level: alert.level,
                        description: alert.description,
                    });
                }
                other => {
                    self.flow.abort();
                    return Err(TlsError::UnexpectedMessage {
                        expected: "Handshake",
                        received: format!("{other:?} record"),
                    });
                }
            }
        }
    }

    fn expect_message(&mut self, expected: HandshakeType) -> Result<HandshakeMessage, TlsError> {
        let message = self.next_handshake_message()?;
        if message.handshake_type != expected {
            self.flow.abort();
            return Err(TlsError::UnexpectedMessage {
                expected: match expected {
                    HandshakeType::ServerHello => "ServerHello",
                    HandshakeType::Certificate => "Certificate",
                    HandshakeType::Finished => "Finished",
                    _ => "handshake message",
                },
                received: format!("{:?}", message.handshake_type),
            });
        }
        Ok(message)
    }

    /// Receive the server's ChangeCipherSpec: a one-byte record with value 1.
    fn await_change_cipher_spec(&mut self) -> Result<(), TlsError> {
        if let Some(message) = self.pending.front() {
            let received = format!("{:?}", message.handshake_type);
            self.flow.abort();
            return Err(TlsError::UnexpectedMessage {
                expected: "ChangeCipherSpec",
                received,
            });
        }

        let record = record::read_record(&mut self.stream)?;
        match record.content_type {
            ContentType::ChangeCipherSpec => {
                if record.body != [1] {
                    return Err(TlsError::DecodeError(format!(
                        "ChangeCipherSpec with unexpected body: {:?}",
                        record.body
                    )));
                }
                self.flow.on_change_cipher_spec()
            }
            ContentType::Alert => {
                let alert = Alert::from_bytes(&record.body)?;
                Err(TlsError::PeerAlert {
                    level: alert.level,
                    description: alert.description,
                })
            }
            other => {
                self.flow.abort();
                Err(TlsError::UnexpectedMessage {
                    expected: "ChangeCipherSpec",
                    received: format!("{other:?} record"),
                })
            }
        }
    }
}

impl<S: Read + Write> std::fmt::Debug for TlsClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsClient")
            .field("state", &self.flow.state())
            .field("server_name", &self.server_name)
            .field("offered_suites", &self.offered_suites)
            .finish()
    }
}
