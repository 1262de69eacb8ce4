use tls12_client::error::TlsError;
use tls12_client::handshake_state::{HandshakeFlow, HandshakeState};

#[test]
fn ecdhe_flow_with_certificate_request() {
    let mut flow = HandshakeFlow::new();
    flow.on_client_hello_sent().unwrap();
    flow.on_server_hello().unwrap();
    flow.on_certificate().unwrap();
    flow.on_server_key_exchange().unwrap();

    // CertificateRequest is recorded, not a state change.
    flow.on_certificate_request().unwrap();
    assert_eq!(flow.state(), HandshakeState::AwaitServerDone);

    flow.on_server_done().unwrap();
    flow.on_change_cipher_spec().unwrap();
    flow.on_server_finished_verified().unwrap();
    assert!(flow.is_established());
}

#[test]
fn certificate_request_before_key_exchange() {
    let mut flow = HandshakeFlow::new();
    flow.on_client_hello_sent().unwrap();
    flow.on_server_hello().unwrap();
    flow.on_certificate().unwrap();
    flow.on_certificate_request().unwrap();
    assert_eq!(flow.state(), HandshakeState::AwaitServerKeyExchange);
    flow.on_server_key_exchange().unwrap();
    flow.on_server_done().unwrap();
}

#[test]
fn server_key_exchange_after_done_rejected() {
    let mut flow = HandshakeFlow::new();
    flow.on_client_hello_sent().unwrap();
    flow.on_server_hello().unwrap();
    flow.on_certificate().unwrap();
    flow.on_server_done().unwrap();

    let err = flow.on_server_key_exchange().unwrap_err();
    assert!(matches!(err, TlsError::UnexpectedMessage { .. }));
    assert!(flow.is_aborted());
}

#[test]
fn finished_before_change_cipher_spec_rejected() {
    let mut flow = HandshakeFlow::new();
    flow.on_client_hello_sent().unwrap();
    flow.on_server_hello().unwrap();
    flow.on_certificate().unwrap();
    flow.on_server_done().unwrap();

    assert!(flow.on_server_finished_verified().is_err());
    assert!(flow.is_aborted());
}

#[test]
fn error_names_the_offending_state() {
    let mut flow = HandshakeFlow::new();
    flow.on_client_hello_sent().unwrap();

    match flow.on_certificate().unwrap_err() {
        TlsError::UnexpectedMessage { received, .. } => {
            assert!(received.contains("AwaitServerHello"), "{received}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn established_is_terminal() {
    let mut flow = HandshakeFlow::new();
    flow.on_client_hello_sent().unwrap();
    flow.on_server_hello().unwrap();
    flow.on_certificate().unwrap();
    flow.on_server_done().unwrap();
    flow.on_change_cipher_spec().unwrap();
    flow.on_server_finished_verified().unwrap();

    assert!(flow.on_server_hello().is_err());
    assert!(flow.is_aborted());
}
