use tls12_client::client_hello::{generate_client_random, ClientHello};
use tls12_client::extensions::{EXT_SERVER_NAME, EXT_SIGNATURE_ALGORITHMS};

#[test]
fn wire_layout_offsets() {
    let hello = ClientHello::new([0x5au8; 32], vec![0xC02B, 0xC02F, 0x009C], None);
    let body = hello.to_bytes();

    assert_eq!(&body[0..2], &[0x03, 0x03], "client_version");
    assert_eq!(&body[2..34], &[0x5a; 32], "random");
    assert_eq!(body[34], 0, "empty session id");
    assert_eq!(&body[35..37], &[0x00, 0x06], "cipher suites length");
    assert_eq!(&body[37..43], &[0xC0, 0x2B, 0xC0, 0x2F, 0x00, 0x9C]);
    assert_eq!(&body[43..45], &[0x01, 0x00], "null compression");

    let ext_len = u16::from_be_bytes([body[45], body[46]]) as usize;
    assert_eq!(body.len(), 47 + ext_len, "extension block bounds");
}

#[test]
fn suite_order_is_preserved() {
    let hello = ClientHello::new([0u8; 32], vec![0x009C, 0xC02B], None);
    let body = hello.to_bytes();
    // Order encodes preference; the codec must not reorder.
    assert_eq!(&body[37..41], &[0x00, 0x9C, 0xC0, 0x2B]);
}

/// Extension block offset for a single-suite hello:
/// 2 (version) + 32 (random) + 1 (session id) + 2 + 2 (suites) +
/// 2 (compression) + 2 (extensions length) = 43.
const SINGLE_SUITE_EXT_OFFSET: usize = 43;

#[test]
fn signature_algorithms_always_present() {
    let hello = ClientHello::new([0u8; 32], vec![0x009C], None);
    let body = hello.to_bytes();
    let ext_block = &body[SINGLE_SUITE_EXT_OFFSET..];

    let extensions = tls12_client::extensions::parse_extensions(ext_block).unwrap();
    assert!(extensions
        .iter()
        .any(|(ext_type, _)| *ext_type == EXT_SIGNATURE_ALGORITHMS));
    assert!(!extensions
        .iter()
        .any(|(ext_type, _)| *ext_type == EXT_SERVER_NAME));
}

#[test]
fn sni_carries_the_host_name() {
    let hello = ClientHello::new([0u8; 32], vec![0x009C], Some("internal.example".into()));
    let body = hello.to_bytes();
    let ext_block = &body[SINGLE_SUITE_EXT_OFFSET..];

    let extensions = tls12_client::extensions::parse_extensions(ext_block).unwrap();
    let (_, sni) = extensions
        .iter()
        .find(|(ext_type, _)| *ext_type == EXT_SERVER_NAME)
        .expect("server_name extension missing");

    // server_name_list length (2) + host_name type (1) + name length (2) + name
    assert_eq!(sni[2], 0, "host_name entry type");
    let name_len = u16::from_be_bytes([sni[3], sni[4]]) as usize;
    assert_eq!(&sni[5..5 + name_len], b"internal.example");
}

#[test]
fn random_is_time_prefixed_and_not_constant() {
    let a = generate_client_random();
    let b = generate_client_random();

    // The 28 random bytes must differ between calls.
    assert_ne!(a[4..], b[4..]);

    // The 4-byte prefix is a plausible current Unix time (after 2020).
    let stamp = u32::from_be_bytes([a[0], a[1], a[2], a[3]]);
    assert!(stamp > 1_577_836_800);
}

#[test]
fn parse_recovers_random_suites_and_server_name() {
    let hello = ClientHello::new([0x77u8; 32], vec![0xC02B, 0x009C], Some("host".into()));
    let parsed = ClientHello::from_bytes(&hello.to_bytes()).unwrap();
    assert_eq!(parsed.random, [0x77u8; 32]);
    assert_eq!(parsed.cipher_suites, vec![0xC02B, 0x009C]);
    assert_eq!(parsed.server_name.as_deref(), Some("host"));
}
