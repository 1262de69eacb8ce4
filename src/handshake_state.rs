//! Client handshake state machine.
//!
//! Tracks the client's position in the TLS 1.2 full handshake and enforces
//! message ordering:
//!
//! 1. Start → send ClientHello → AwaitServerHello
//! 2. AwaitServerHello → ServerHello → AwaitCertificate
//!    (HelloRequest is ignored in place)
//! 3. AwaitCertificate → Certificate → AwaitServerKeyExchange
//! 4. AwaitServerKeyExchange → ServerKeyExchange (ECDHE only) /
//!    CertificateRequest → AwaitServerDone; ServerHelloDone may arrive
//!    directly
//! 5. AwaitServerDone → ServerHelloDone → send ClientKeyExchange,
//!    ChangeCipherSpec, Finished → AwaitChangeCipherSpec
//! 6. AwaitChangeCipherSpec → ChangeCipherSpec → AwaitServerFinished
//! 7. AwaitServerFinished → Finished (verified) → Established
//!
//! Any out-of-order message fails the transition, parks the machine in
//! `Aborted` and surfaces [`TlsError::UnexpectedMessage`]. `Aborted` is
//! never left.

use crate::error::TlsError;

/// Client handshake states. `Established` is terminal success, `Aborted`
/// terminal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Start,
    AwaitServerHello,
    AwaitCertificate,
    AwaitServerKeyExchange,
    AwaitServerDone,
    AwaitChangeCipherSpec,
    AwaitServerFinished,
    Established,
    Aborted,
}

impl HandshakeState {
    pub const fn as_str(self) -> &'static str {
        match self {
            HandshakeState::Start => "Start",
            HandshakeState::AwaitServerHello => "AwaitServerHello",
            HandshakeState::AwaitCertificate => "AwaitCertificate",
            HandshakeState::AwaitServerKeyExchange => "AwaitServerKeyExchange",
            HandshakeState::AwaitServerDone => "AwaitServerDone",
            HandshakeState::AwaitChangeCipherSpec => "AwaitChangeCipherSpec",
            HandshakeState::AwaitServerFinished => "AwaitServerFinished",
            HandshakeState::Established => "Established",
            HandshakeState::Aborted => "Aborted",
        }
    }
}

/// The transition-checked state holder driven by the handshake loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeFlow {
    state: HandshakeState,
}

impl HandshakeFlow {
    pub fn new() -> Self {
        Self {
            state: HandshakeState::Start,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn is_established(&self) -> bool {
        self.state == HandshakeState::Established
    }

    pub fn is_aborted(&self) -> bool {
        self.state == HandshakeState::Aborted
    }

    /// Park the machine in the terminal failure state.
    pub fn abort(&mut self) {
        self.state = HandshakeState::Aborted;
    }

    fn expect(&mut self, from: &[HandshakeState], received: &'static str) -> Result<(), TlsError> {
        if from.contains(&self.state) {
            Ok(())
        } else {
            let state = self.state;
            self.abort();
            Err(TlsError::UnexpectedMessage {
                expected: from[0].as_str(),
                received: format!("{received} in state {}", state.as_str()),
            })
        }
    }

    pub fn on_client_hello_sent(&mut self) -> Result<(), TlsError> {
        self.expect(&[HandshakeState::Start], "ClientHello")?;
        self.state = HandshakeState::AwaitServerHello;
        Ok(())
    }

    pub fn on_server_hello(&mut self) -> Result<(), TlsError> {
        self.expect(&[HandshakeState::AwaitServerHello], "ServerHello")?;
        self.state = HandshakeState::AwaitCertificate;
        Ok(())
    }

    pub fn on_certificate(&mut self) -> Result<(), TlsError> {
        self.expect(&[HandshakeState::AwaitCertificate], "Certificate")?;
        self.state = HandshakeState::AwaitServerKeyExchange;
        Ok(())
    }

    pub fn on_server_key_exchange(&mut self) -> Result<(), TlsError> {
        self.expect(&[HandshakeState::AwaitServerKeyExchange], "ServerKeyExchange")?;
        self.state = HandshakeState::AwaitServerDone;
        Ok(())
    }

    pub fn on_certificate_request(&mut self) -> Result<(), TlsError> {
        self.expect(
            &[
                HandshakeState::AwaitServerKeyExchange,
                HandshakeState::AwaitServerDone,
            ],
            "CertificateRequest",
        )
        // State unchanged: the request is recorded, not acted on.
    }

    pub fn on_server_done(&mut self) -> Result<(), TlsError> {
        self.expect(
            &[
                HandshakeState::AwaitServerKeyExchange,
                HandshakeState::AwaitServerDone,
            ],
            "ServerHelloDone",
        )?;
        self.state = HandshakeState::AwaitChangeCipherSpec;
        Ok(())
    }

    pub fn on_change_cipher_spec(&mut self) -> Result<(), TlsError> {
        self.expect(&[HandshakeState::AwaitChangeCipherSpec], "ChangeCipherSpec")?;
        self.state = HandshakeState::AwaitServerFinished;
        Ok(())
    }

    pub fn on_server_finished_verified(&mut self) -> Result<(), TlsError> {
        self.expect(&[HandshakeState::AwaitServerFinished], "Finished")?;
        self.state = HandshakeState::Established;
        Ok(())
    }
}

impl Default for HandshakeFlow {
    fn default() -> Self {
        Self::new()
    }
}
