//! Certificate store and client assertion tests over the public API
//!
//! Uses the PEM fixtures under tests/fixtures; the assertion test runs the
//! real RS256 signing path against the fixture key.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use blobsync::auth::build_client_assertion;
use blobsync::cert::{CertificateProvider, DirectoryCertificateStore};

const FIXTURE_THUMBPRINT: &str = "71E643E63D2B8CE6ED7A501F8145F6D2C7009EE0";

fn fixture_store() -> (tempfile::TempDir, DirectoryCertificateStore) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("sp.pem"),
        include_str!("fixtures/service-principal.pem"),
    )
    .unwrap();
    let store = DirectoryCertificateStore::at(dir.path());
    (dir, store)
}

#[test]
fn test_store_lookup_is_thumbprint_format_insensitive() {
    let (_dir, store) = fixture_store();

    let spaced = "71 e6 43 e6 3d 2b 8c e6 ed 7a 50 1f 81 45 f6 d2 c7 00 9e e0";
    let found = store.find(spaced, true).unwrap();
    assert_eq!(found.thumbprint, FIXTURE_THUMBPRINT);
}

#[test]
fn test_unknown_thumbprint_reports_the_store_path() {
    let (dir, store) = fixture_store();

    let err = store.find("0000000000000000000000000000000000000000", true).unwrap_err();
    assert_eq!(err.exit_code(), -1);
    assert!(err.to_string().contains(dir.path().to_str().unwrap()));
}

#[test]
fn test_assertion_signs_with_the_stored_key() {
    let (_dir, store) = fixture_store();
    let certificate = store.find(FIXTURE_THUMBPRINT, true).unwrap();

    let audience = "https://login.microsoftonline.com/tenant/oauth2/token";
    let assertion = build_client_assertion("client-123", &certificate, audience).unwrap();

    let segments: Vec<&str> = assertion.split('.').collect();
    assert_eq!(segments.len(), 3);

    let header: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[0]).unwrap()).unwrap();
    assert_eq!(header["alg"], "RS256");
    // x5t is the base64url thumbprint digest, non-empty for a real cert
    assert!(!header["x5t"].as_str().unwrap().is_empty());

    let claims: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[1]).unwrap()).unwrap();
    assert_eq!(claims["aud"], audience);
    assert_eq!(claims["iss"], "client-123");

    // RS256 over a 2048-bit key yields a 256-byte signature
    assert_eq!(URL_SAFE_NO_PAD.decode(segments[2]).unwrap().len(), 256);
}
