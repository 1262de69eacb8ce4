//! Shared fixtures: self-signed test certificates built directly in DER,
//! and a minimal TLS 1.2 echo server driven over a loopback socket.
//!
//! The server runs the real protocol with the crate's own codecs and key
//! schedule, so end-to-end tests exercise both directions of every
//! primitive. Certificates are assembled by hand (the signature bytes are
//! garbage — trust decisions in tests come from `AcceptAnyCertificate`,
//! and nothing parses beyond the TBS structure).

#![allow(dead_code)]

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use p256::ecdsa::signature::Signer;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

use tls12_client::alert::{Alert, AlertDescription, AlertLevel};
use tls12_client::cipher_suite::{suite_by_code, CipherSuite};
use tls12_client::client_hello::ClientHello;
use tls12_client::digest::HandshakeDigest;
use tls12_client::error::TlsError;
use tls12_client::finished::{client_verify_data, server_verify_data};
use tls12_client::handshake::{split_messages, HandshakeMessage, HandshakeType};
use tls12_client::prf::{key_material, master_secret};
use tls12_client::record::{read_record, write_record, ContentType};
use tls12_client::record_cipher::{Direction, RecordCipher};

// ---------------------------------------------------------------------------
// DER assembly

fn der(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 128 {
        out.push(len as u8);
    } else if len < 256 {
        out.push(0x81);
        out.push(len as u8);
    } else {
        out.push(0x82);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    }
    out.extend_from_slice(content);
    out
}

fn der_seq(parts: &[&[u8]]) -> Vec<u8> {
    der(0x30, &parts.concat())
}

fn der_bit_string(data: &[u8]) -> Vec<u8> {
    let mut content = vec![0u8]; // zero unused bits
    content.extend_from_slice(data);
    der(0x03, &content)
}

// OIDs, pre-encoded with their tag and length.
const OID_SHA256_WITH_RSA: &[u8] = &[
    0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b,
];
const OID_RSA_ENCRYPTION: &[u8] = &[
    0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01,
];
const OID_ECDSA_WITH_SHA256: &[u8] = &[0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x03, 0x02];
const OID_EC_PUBLIC_KEY: &[u8] = &[0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];
const OID_PRIME256V1: &[u8] = &[0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];
const OID_COMMON_NAME: &[u8] = &[0x06, 0x03, 0x55, 0x04, 0x03];
const DER_NULL: &[u8] = &[0x05, 0x00];

fn name(common_name: &str) -> Vec<u8> {
    let cn_value = der(0x0c, common_name.as_bytes()); // UTF8String
    let attribute = der_seq(&[OID_COMMON_NAME, &cn_value]);
    let rdn = der(0x31, &attribute); // SET
    der(0x30, &rdn)
}

fn validity() -> Vec<u8> {
    let not_before = der(0x17, b"200101000000Z");
    let not_after = der(0x17, b"400101000000Z");
    der_seq(&[&not_before, &not_after])
}

/// Assemble a self-signed certificate around the given signature algorithm
/// and SubjectPublicKeyInfo. The signature bytes are not a real signature.
fn build_certificate(sig_alg: &[u8], spki: &[u8]) -> Vec<u8> {
    let version = der(0xa0, &der(0x02, &[2]));
    let serial = der(0x02, &[0x01]);
    let subject = name("tls12-client test");

    let tbs = der_seq(&[
        &version,
        &serial,
        sig_alg,
        &subject, // issuer == subject, self-signed
        &validity(),
        &subject,
        spki,
    ]);

    let signature = der_bit_string(&[0xab; 64]);
    der_seq(&[&tbs, sig_alg, &signature])
}

/// Self-signed RSA certificate (sha256WithRSAEncryption) for `public_key`.
pub fn rsa_certificate(public_key: &RsaPublicKey) -> Vec<u8> {
    let sig_alg = der_seq(&[OID_SHA256_WITH_RSA, DER_NULL]);
    let pkcs1 = public_key.to_pkcs1_der().unwrap();
    let spki = der_seq(&[
        &der_seq(&[OID_RSA_ENCRYPTION, DER_NULL]),
        &der_bit_string(pkcs1.as_bytes()),
    ]);
    build_certificate(&sig_alg, &spki)
}

/// Self-signed P-256 certificate (ecdsa-with-SHA256) for `verifying_key`.
pub fn p256_certificate(verifying_key: &p256::ecdsa::VerifyingKey) -> Vec<u8> {
    let sig_alg = der_seq(&[OID_ECDSA_WITH_SHA256]);
    let point = verifying_key.to_encoded_point(false);
    let spki = der_seq(&[
        &der_seq(&[OID_EC_PUBLIC_KEY, OID_PRIME256V1]),
        &der_bit_string(point.as_bytes()),
    ]);
    build_certificate(&sig_alg, &spki)
}

// ---------------------------------------------------------------------------
// Test server

enum ServerKey {
    Rsa(Box<RsaPrivateKey>),
    P256(p256::ecdsa::SigningKey),
}

/// A one-connection TLS 1.2 server: full handshake, then echoes every
/// application-data record until close_notify.
pub struct TestServer {
    suite: &'static CipherSuite,
    cert_der: Vec<u8>,
    key: ServerKey,
    /// Send a HelloRequest before the ServerHello flight.
    pub hello_request_first: bool,
}

impl TestServer {
    /// RSA key exchange (TLS_RSA_WITH_AES_128_GCM_SHA256).
    pub fn rsa() -> Self {
        let private = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let cert_der = rsa_certificate(&private.to_public_key());
        Self {
            suite: suite_by_code(0x009C).unwrap(),
            cert_der,
            key: ServerKey::Rsa(Box::new(private)),
            hello_request_first: false,
        }
    }

    /// ECDHE key exchange with an ECDSA certificate
    /// (TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256).
    pub fn ecdhe_ecdsa() -> Self {
        let signing_key = p256::ecdsa::SigningKey::random(&mut OsRng);
        let cert_der = p256_certificate(signing_key.verifying_key());
        Self {
            suite: suite_by_code(0xC02B).unwrap(),
            cert_der,
            key: ServerKey::P256(signing_key),
            hello_request_first: false,
        }
    }

    pub fn handle(&self, mut stream: TcpStream) -> Result<(), TlsError> {
        let suite = self.suite;
        let mut digest = HandshakeDigest::new();
        digest.select_hash(suite.hash);

        // ClientHello
        let record = read_record(&mut stream)?;
        if record.content_type != ContentType::Handshake {
            return Err(TlsError::DecodeError("expected ClientHello record".into()));
        }
        let messages = split_messages(&record.body)?;
        let client_hello = &messages[0];
        if client_hello.handshake_type != HandshakeType::ClientHello {
            return Err(TlsError::DecodeError("expected ClientHello".into()));
        }
        digest.update(client_hello.raw());
        let parsed = ClientHello::from_bytes(client_hello.body())?;
        let client_random = parsed.random;
        if !parsed.cipher_suites.contains(&suite.code) {
            return Err(TlsError::NegotiationFailed("suite not offered".into()));
        }

        if self.hello_request_first {
            // Renegotiation-style nudge the client must ignore.
            let hello_request = HandshakeMessage::encode(HandshakeType::HelloRequest, &[])?;
            write_record(&mut stream, ContentType::Handshake, hello_request.raw())?;
        }

        // ServerHello [+ ServerKeyExchange] + Certificate + ServerHelloDone,
        // coalesced into a single record.
        let mut server_random = [0u8; 32];
        OsRng.fill_bytes(&mut server_random);

        let mut flight = Vec::new();
        let hello = HandshakeMessage::encode(
            HandshakeType::ServerHello,
            &server_hello_body(&server_random, suite.code),
        )?;
        digest.update(hello.raw());
        flight.extend_from_slice(hello.raw());

        let certificate =
            HandshakeMessage::encode(HandshakeType::Certificate, &chain_body(&[&self.cert_der]))?;
        digest.update(certificate.raw());
        flight.extend_from_slice(certificate.raw());

        // Server ephemeral key, ECDHE only.
        let mut server_ephemeral = None;
        if let ServerKey::P256(signing_key) = &self.key {
            let secret = p256::ecdh::EphemeralSecret::random(&mut OsRng);
            let point = secret.public_key().to_encoded_point(false);

            let mut params = vec![3]; // named_curve
            params.extend_from_slice(&23u16.to_be_bytes()); // secp256r1
            params.push(point.as_bytes().len() as u8);
            params.extend_from_slice(point.as_bytes());

            let mut signed = Vec::new();
            signed.extend_from_slice(&client_random);
            signed.extend_from_slice(&server_random);
            signed.extend_from_slice(&params);
            let signature: p256::ecdsa::Signature = signing_key.sign(&signed);
            let signature_der = signature.to_der();

            let mut body = params;
            body.push(4); // sha256
            body.push(3); // ecdsa
            body.extend_from_slice(&(signature_der.as_bytes().len() as u16).to_be_bytes());
            body.extend_from_slice(signature_der.as_bytes());

            let ske = HandshakeMessage::encode(HandshakeType::ServerKeyExchange, &body)?;
            digest.update(ske.raw());
            flight.extend_from_slice(ske.raw());

            server_ephemeral = Some(secret);
        }

        let done = HandshakeMessage::encode(HandshakeType::ServerHelloDone, &[])?;
        digest.update(done.raw());
        flight.extend_from_slice(done.raw());
        write_record(&mut stream, ContentType::Handshake, &flight)?;

        // ClientKeyExchange
        let record = read_record(&mut stream)?;
        let messages = split_messages(&record.body)?;
        let key_exchange = &messages[0];
        if key_exchange.handshake_type != HandshakeType::ClientKeyExchange {
            return Err(TlsError::DecodeError("expected ClientKeyExchange".into()));
        }
        digest.update(key_exchange.raw());

        let pre_master = match &self.key {
            ServerKey::Rsa(private) => {
                let body = key_exchange.body();
                let len = u16::from_be_bytes([body[0], body[1]]) as usize;
                let secret = private
                    .decrypt(Pkcs1v15Encrypt, &body[2..2 + len])
                    .map_err(|e| TlsError::InvalidKeyExchange(e.to_string()))?;
                if secret.len() != 48 || secret[0] != 0x03 || secret[1] != 0x03 {
                    return Err(TlsError::InvalidKeyExchange("bad pre-master".into()));
                }
                secret
            }
            ServerKey::P256(_) => {
                let body = key_exchange.body();
                let len = body[0] as usize;
                let peer = p256::PublicKey::from_sec1_bytes(&body[1..1 + len])
                    .map_err(|e| TlsError::InvalidKeyExchange(e.to_string()))?;
                let secret = server_ephemeral
                    .take()
                    .ok_or_else(|| TlsError::InvalidKeyExchange("no ephemeral key".into()))?;
                secret.diffie_hellman(&peer).raw_secret_bytes().to_vec()
            }
        };

        let master = master_secret(suite.hash, &pre_master, &client_random, &server_random);
        let keys = key_material(suite, &master, &server_random, &client_random)?;
        let mut read_cipher = RecordCipher::new(suite, &keys, Direction::ClientWrite)?;
        let mut write_cipher = RecordCipher::new(suite, &keys, Direction::ServerWrite)?;

        // Client ChangeCipherSpec + Finished
        let record = read_record(&mut stream)?;
        if record.content_type != ContentType::ChangeCipherSpec || record.body != [1] {
            return Err(TlsError::DecodeError("expected ChangeCipherSpec".into()));
        }

        let record = read_record(&mut stream)?;
        let payload = read_cipher.decrypt(ContentType::Handshake, &record.body)?;
        let messages = split_messages(&payload)?;
        let finished = &messages[0];
        if finished.handshake_type != HandshakeType::Finished {
            return Err(TlsError::DecodeError("expected Finished".into()));
        }
        let expected = client_verify_data(suite.hash, &master, &digest.snapshot());
        if finished.body() != &expected[..] {
            return Err(TlsError::HandshakeVerificationFailed);
        }
        digest.update(finished.raw());

        // Server ChangeCipherSpec + Finished
        write_record(&mut stream, ContentType::ChangeCipherSpec, &[1])?;
        let verify = server_verify_data(suite.hash, &master, &digest.snapshot());
        let finished = HandshakeMessage::encode(HandshakeType::Finished, &verify)?;
        let body = write_cipher.encrypt(ContentType::Handshake, finished.raw())?;
        write_record(&mut stream, ContentType::Handshake, &body)?;

        // Echo until close_notify or EOF.
        loop {
            let record = match read_record(&mut stream) {
                Ok(record) => record,
                Err(_) => return Ok(()),
            };
            match record.content_type {
                ContentType::ApplicationData => {
                    let plain =
                        read_cipher.decrypt(ContentType::ApplicationData, &record.body)?;
                    let out = write_cipher.encrypt(ContentType::ApplicationData, &plain)?;
                    write_record(&mut stream, ContentType::ApplicationData, &out)?;
                }
                ContentType::Alert => {
                    let plain = read_cipher.decrypt(ContentType::Alert, &record.body)?;
                    let alert = Alert::from_bytes(&plain)?;
                    if alert.description == AlertDescription::CloseNotify {
                        let out =
                            write_cipher.encrypt(ContentType::Alert, &Alert::close_notify().to_bytes())?;
                        let _ = write_record(&mut stream, ContentType::Alert, &out);
                    }
                    return Ok(());
                }
                _ => return Ok(()),
            }
        }
    }
}

/// Bind a loopback listener, serve one connection on a thread, return the
/// address to dial.
pub fn spawn_server(server: TestServer) -> (SocketAddr, JoinHandle<Result<(), TlsError>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        server.handle(stream)
    });
    (addr, handle)
}

/// Serve one connection with a custom closure (for misbehaving servers).
pub fn spawn_raw_server<F>(serve: F) -> (SocketAddr, JoinHandle<()>)
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        serve(stream);
    });
    (addr, handle)
}

/// ServerHello body: no session id, no extensions.
pub fn server_hello_body(server_random: &[u8; 32], suite_code: u16) -> Vec<u8> {
    let mut body = vec![0x03, 0x03];
    body.extend_from_slice(server_random);
    body.push(0); // empty session id
    body.extend_from_slice(&suite_code.to_be_bytes());
    body.push(0); // null compression
    body
}

/// Certificate message body for a DER chain.
pub fn chain_body(chain: &[&[u8]]) -> Vec<u8> {
    let total: usize = chain.iter().map(|cert| 3 + cert.len()).sum();
    let mut body = vec![(total >> 16) as u8, (total >> 8) as u8, total as u8];
    for cert in chain {
        body.push((cert.len() >> 16) as u8);
        body.push((cert.len() >> 8) as u8);
        body.push(cert.len() as u8);
        body.extend_from_slice(cert);
    }
    body
}

/// Send a plaintext alert record.
pub fn send_alert(stream: &mut TcpStream, level: AlertLevel, description: AlertDescription) {
    let alert = Alert::new(level, description);
    let _ = write_record(stream, ContentType::Alert, &alert.to_bytes());
}
