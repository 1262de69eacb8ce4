//! Established-session facade.
//!
//! Wraps the negotiated handshake output into a long-lived object that
//! relays application data through the per-direction record ciphers.
//! Reading and writing are independent directions with independent
//! sequence counters; each direction serializes its own records.
//!
//! Failure is terminal: once any fatal error occurs, both directions are
//! closed and every later call fails with [`TlsError::SessionClosed`]
//! carrying the original reason.

use std::io::{Read, Write};

use crate::alert::{Alert, AlertDescription};
use crate::cipher_suite::CipherSuite;
use crate::error::TlsError;
use crate::record::{self, ContentType, MAX_FRAGMENT_LEN};
use crate::record_cipher::RecordCipher;

/// An established TLS 1.2 session carrying encrypted application data.
pub struct TlsSession<S: Read + Write> {
    stream: S,
    suite: &'static CipherSuite,
    read_cipher: RecordCipher,
    write_cipher: RecordCipher,
    certificate_requested: bool,
    /// Terminal failure reason; set once, never cleared.
    terminal: Option<String>,
    peer_closed: bool,
    local_closed: bool,
}

impl<S: Read + Write> TlsSession<S> {
    pub(crate) fn new(
        stream: S,
        suite: &'static CipherSuite,
        read_cipher: RecordCipher,
        write_cipher: RecordCipher,
        certificate_requested: bool,
    ) -> Self {
        Self {
            stream,
            suite,
            read_cipher,
            write_cipher,
            certificate_requested,
            terminal: None,
            peer_closed: false,
            local_closed: false,
        }
    }

    /// The suite negotiated for this connection.
    pub fn cipher_suite(&self) -> &'static CipherSuite {
        self.suite
    }

    /// Whether the server asked for a client certificate during the
    /// handshake (none was sent).
    pub fn certificate_requested(&self) -> bool {
        self.certificate_requested
    }

    /// Records sent so far on the write direction.
    pub fn write_sequence(&self) -> u64 {
        self.write_cipher.sequence()
    }

    /// Access the underlying stream, e.g. to adjust timeouts.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Encrypt and send application data, fragmenting at the maximum
    /// plaintext record size.
    pub fn send(&mut self, data: &[u8]) -> Result<(), TlsError> {
        self.check_open()?;

        for chunk in data.chunks(MAX_FRAGMENT_LEN) {
            let body = match self.write_cipher.encrypt(ContentType::ApplicationData, chunk) {
                Ok(body) => body,
                Err(err) => return Err(self.fail(err)),
            };
            if let Err(err) = record::write_record(&mut self.stream, ContentType::ApplicationData, &body)
            {
                return Err(self.fail(err));
            }
        }
        Ok(())
    }

    /// Receive the next chunk of application data.
    ///
    /// Returns `Ok(None)` once the peer closed cleanly with close_notify.
    /// Warning-level alerts are skipped; a fatal alert surfaces
    /// [`TlsError::PeerAlert`] and closes the session. Any other record
    /// type after establishment is a protocol violation.
    pub fn receive(&mut self) -> Result<Option<Vec<u8>>, TlsError> {
        self.check_open()?;
        if self.peer_closed {
            return Ok(None);
        }

        loop {
            let record = match record::read_record(&mut self.stream) {
                Ok(record) => record,
                Err(err) => return Err(self.fail(err)),
            };

            match record.content_type {
                ContentType::ApplicationData => {
                    let plaintext = match self
                        .read_cipher
                        .decrypt(ContentType::ApplicationData, &record.body)
                    {
                        Ok(plaintext) => plaintext,
                        Err(err) => return Err(self.fail(err)),
                    };
                    if plaintext.is_empty() {
                        continue;
                    }
                    return Ok(Some(plaintext));
                }
                ContentType::Alert => {
                    let plaintext =
                        match self.read_cipher.decrypt(ContentType::Alert, &record.body) {
                            Ok(plaintext) => plaintext,
                            Err(err) => return Err(self.fail(err)),
                        };
                    let alert = match Alert::from_bytes(&plaintext) {
                        Ok(alert) => alert,
                        Err(err) => return Err(self.fail(err)),
                    };

                    if alert.description == AlertDescription::CloseNotify {
                        self.peer_closed = true;
                        return Ok(None);
                    }
                    if alert.is_fatal() {
                        let err = TlsError::PeerAlert {
                            level: alert.level,
                            description: alert.description,
                        };
                        return Err(self.fail(err));
                    }
                    // Non-fatal warning: keep reading.
                }
                other => {
                    let err = TlsError::UnexpectedMessage {
                        expected: "ApplicationData",
                        received: format!("{other:?} record"),
                    };
                    return Err(self.fail(err));
                }
            }
        }
    }

    /// Send close_notify and stop writing. Receiving remains possible until
    /// the peer closes its own direction.
    pub fn close(&mut self) -> Result<(), TlsError> {
        if self.terminal.is_some() || self.local_closed {
            return Ok(());
        }
        self.local_closed = true;

        let alert = Alert::close_notify();
        let body = self
            .write_cipher
            .encrypt(ContentType::Alert, &alert.to_bytes())?;
        record::write_record(&mut self.stream, ContentType::Alert, &body)
    }

    fn check_open(&self) -> Result<(), TlsError> {
        match &self.terminal {
            Some(reason) => Err(TlsError::SessionClosed(reason.clone())),
            None => Ok(()),
        }
    }

    fn fail(&mut self, err: TlsError) -> TlsError {
        if self.terminal.is_none() {
            self.terminal = Some(err.to_string());
        }
        err
    }
}

impl<S: Read + Write> std::fmt::Debug for TlsSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsSession")
            .field("suite", &self.suite.name)
            .field("terminal", &self.terminal)
            .field("peer_closed", &self.peer_closed)
            .finish()
    }
}
