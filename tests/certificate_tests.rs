mod common;

use rand::rngs::OsRng;
use rsa::RsaPrivateKey;

use tls12_client::certificate::{
    extract_public_key, read_certificate_chain, select_leaf, AcceptAnyCertificate, PublicKey,
    RejectAllCertificates, TrustVerifier, MAX_CHAIN_LENGTH,
};
use tls12_client::error::TlsError;

#[test]
fn chain_codec_round_trip() {
    let body = common::chain_body(&[b"leaf certificate", b"intermediate"]);
    let chain = read_certificate_chain(&body).unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0], b"leaf certificate");
    assert_eq!(chain[1], b"intermediate");
}

#[test]
fn empty_chain_parses_to_no_entries() {
    let body = common::chain_body(&[]);
    assert!(read_certificate_chain(&body).unwrap().is_empty());
}

#[test]
fn entry_length_beyond_chain_rejected() {
    // Total chain length 4; single entry claims 16 bytes.
    let body = vec![0, 0, 4, 0, 0, 16, 0xaa];
    assert!(read_certificate_chain(&body).is_err());
}

#[test]
fn chain_length_cap_enforced() {
    let entry: &[u8] = b"x";
    let entries: Vec<&[u8]> = std::iter::repeat(entry).take(MAX_CHAIN_LENGTH + 1).collect();
    let body = common::chain_body(&entries);
    assert!(matches!(
        read_certificate_chain(&body),
        Err(TlsError::DecodeError(_))
    ));
}

#[test]
fn rsa_leaf_selected_with_public_key() {
    let private = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
    let der = common::rsa_certificate(&private.to_public_key());

    let leaf = select_leaf(&[der.clone()]).unwrap();
    assert_eq!(leaf.der, der);
    assert!(matches!(leaf.public_key, PublicKey::Rsa(_)));
}

#[test]
fn p256_leaf_selected_with_public_key() {
    let signing_key = p256::ecdsa::SigningKey::random(&mut OsRng);
    let der = common::p256_certificate(signing_key.verifying_key());

    let leaf = select_leaf(&[der]).unwrap();
    assert!(matches!(leaf.public_key, PublicKey::EcdsaP256(_)));
}

#[test]
fn unparseable_entries_skipped_before_usable_leaf() {
    let private = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
    let der = common::rsa_certificate(&private.to_public_key());

    let chain = vec![b"not a certificate".to_vec(), der];
    let leaf = select_leaf(&chain).unwrap();
    assert!(matches!(leaf.public_key, PublicKey::Rsa(_)));
}

#[test]
fn no_usable_leaf_is_untrusted() {
    assert!(matches!(
        select_leaf(&[b"garbage".to_vec()]),
        Err(TlsError::UntrustedCertificate(_))
    ));
    assert!(matches!(
        select_leaf(&[]),
        Err(TlsError::UntrustedCertificate(_))
    ));
}

#[test]
fn extract_public_key_rejects_garbage() {
    assert!(matches!(
        extract_public_key(b"garbage"),
        Err(TlsError::CertificateParse(_))
    ));
}

#[test]
fn default_verifiers() {
    let chain = vec![b"cert".to_vec()];
    assert!(matches!(
        RejectAllCertificates.verify(&chain, "RSA"),
        Err(TlsError::UntrustedCertificate(_))
    ));
    assert!(AcceptAnyCertificate.verify(&chain, "EC").is_ok());
}
