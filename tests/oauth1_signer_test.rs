// ABOUTME: Tests for OAuth 1.0a HMAC-SHA1 request signing
// ABOUTME: Covers encoding, base string construction, header format, determinism, and verification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use pierre_wellness_core::SyncError;
use pierre_wellness_sync::oauth1::{
    generate_nonce, normalize_base_url, normalize_parameters, parse_authorization_header,
    percent_encode, signature_base_string, signing_key, verify, ConsumerCredentials,
    OAuth1Signer, TokenCredentials,
};

fn photos_signer() -> OAuth1Signer {
    OAuth1Signer::new(ConsumerCredentials {
        consumer_key: "dpf43f3p2l4k3l03".to_owned(),
        consumer_secret: "kd94hf93k423kf44".to_owned(),
    })
}

fn photos_token() -> TokenCredentials {
    TokenCredentials {
        token: "nnch734d00sl2jdk".to_owned(),
        token_secret: "pfkkdhi9sl3r4s00".to_owned(),
    }
}

const PHOTOS_URL: &str = "http://photos.example.net/photos?file=vacation.jpg&size=original";

fn header_field(header: &str, key: &str) -> Option<String> {
    parse_authorization_header(header)
        .unwrap()
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

#[test]
fn test_percent_encode_reserved_characters() {
    assert_eq!(percent_encode("a b!*'()"), "a%20b%21%2A%27%28%29");
    assert_eq!(percent_encode("AZaz09-._~"), "AZaz09-._~");
    assert_eq!(percent_encode("=&+/"), "%3D%26%2B%2F");
    assert_eq!(percent_encode("é"), "%C3%A9");
}

#[test]
fn test_normalize_parameters_sorts_by_key_then_value() {
    let params = vec![
        ("b".to_owned(), "2".to_owned()),
        ("a".to_owned(), "2".to_owned()),
        ("a".to_owned(), "1".to_owned()),
        ("c d".to_owned(), "x".to_owned()),
    ];
    assert_eq!(normalize_parameters(&params), "a=1&a=2&b=2&c%20d=x");
}

#[test]
fn test_normalize_base_url() {
    assert_eq!(
        normalize_base_url("HTTPS://API.Example.com:443/path?x=1#frag").unwrap(),
        "https://api.example.com/path"
    );
    assert_eq!(
        normalize_base_url("http://example.com:8080/r").unwrap(),
        "http://example.com:8080/r"
    );
    assert!(matches!(
        normalize_base_url("not a url"),
        Err(SyncError::InvalidInput(_))
    ));
}

#[test]
fn test_signature_base_string_merges_query_parameters() {
    let params = vec![("a".to_owned(), "b c".to_owned())];
    let base = signature_base_string("get", "https://api.example.com/path?x=1", &params).unwrap();
    assert_eq!(
        base,
        "GET&https%3A%2F%2Fapi.example.com%2Fpath&a%3Db%2520c%26x%3D1"
    );
}

#[test]
fn test_signing_key_encodes_both_secrets() {
    assert_eq!(signing_key("cs&1", ""), "cs%261&");
    assert_eq!(signing_key("cs", "ts"), "cs&ts");
}

#[test]
fn test_three_legged_photos_example() {
    let header = photos_signer()
        .sign_with(
            "GET",
            PHOTOS_URL,
            &[],
            Some(&photos_token()),
            "kllo9940pd9333jh",
            1_191_242_096,
        )
        .unwrap();

    assert_eq!(
        header_field(&header, "oauth_signature").as_deref(),
        Some("tR3+Ty81lMeYAr/Fid0kMTYa/WM=")
    );
    assert!(header.contains("oauth_signature=\"tR3%2BTy81lMeYAr%2FFid0kMTYa%2FWM%3D\""));
}

#[test]
fn test_photos_example_base_string() {
    let params: Vec<(String, String)> = [
        ("oauth_consumer_key", "dpf43f3p2l4k3l03"),
        ("oauth_token", "nnch734d00sl2jdk"),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", "1191242096"),
        ("oauth_nonce", "kllo9940pd9333jh"),
        ("oauth_version", "1.0"),
    ]
    .iter()
    .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
    .collect();

    let base = signature_base_string("GET", PHOTOS_URL, &params).unwrap();
    assert_eq!(
        base,
        "GET&http%3A%2F%2Fphotos.example.net%2Fphotos&file%3Dvacation.jpg%26\
         oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3Dkllo9940pd9333jh%26\
         oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1191242096%26\
         oauth_token%3Dnnch734d00sl2jdk%26oauth_version%3D1.0%26size%3Doriginal"
    );
}

#[test]
fn test_header_format_two_legged() {
    let header = photos_signer()
        .sign_with("POST", "https://apis.example.com/reg", &[], None, "abc", 1_700_000_000)
        .unwrap();

    assert!(header.starts_with("OAuth "));
    let keys: Vec<String> = parse_authorization_header(&header)
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(
        keys,
        vec![
            "oauth_consumer_key",
            "oauth_nonce",
            "oauth_signature",
            "oauth_signature_method",
            "oauth_timestamp",
            "oauth_version",
        ]
    );
    assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
    assert!(header.contains("oauth_version=\"1.0\""));
    assert!(header.contains(", "));
}

#[test]
fn test_signing_is_deterministic_for_fixed_nonce_and_timestamp() {
    let signer = photos_signer();
    let params = vec![("uploadStartTimeInSeconds".to_owned(), "1735689600".to_owned())];
    let first = signer
        .sign_with("GET", "https://apis.example.com/x", &params, None, "n1", 1)
        .unwrap();
    let second = signer
        .sign_with("GET", "https://apis.example.com/x", &params, None, "n1", 1)
        .unwrap();
    let other_nonce = signer
        .sign_with("GET", "https://apis.example.com/x", &params, None, "n2", 1)
        .unwrap();

    assert_eq!(first, second);
    assert_ne!(
        header_field(&first, "oauth_signature"),
        header_field(&other_nonce, "oauth_signature")
    );
}

#[test]
fn test_signed_header_verifies() {
    let signer = photos_signer();
    let token = photos_token();
    let params = vec![("a".to_owned(), "1 2".to_owned())];
    let url = "https://apis.example.com/wellness?b=3";
    let header = signer.sign("POST", url, &params, Some(&token)).unwrap();

    assert!(verify(&header, "POST", url, &params, "kd94hf93k423kf44", "pfkkdhi9sl3r4s00"));
    assert!(!verify(&header, "GET", url, &params, "kd94hf93k423kf44", "pfkkdhi9sl3r4s00"));
    assert!(!verify(&header, "POST", url, &[], "kd94hf93k423kf44", "pfkkdhi9sl3r4s00"));
    assert!(!verify(&header, "POST", url, &params, "wrong", "pfkkdhi9sl3r4s00"));
    assert!(!verify("Bearer abc", "POST", url, &params, "kd94hf93k423kf44", ""));
}

#[test]
fn test_empty_consumer_key_is_missing_credential() {
    let signer = OAuth1Signer::new(ConsumerCredentials {
        consumer_key: String::new(),
        consumer_secret: "secret".to_owned(),
    });
    let result = signer.sign("GET", "https://apis.example.com/x", &[], None);
    assert!(matches!(result, Err(SyncError::MissingCredential(_))));
}

#[test]
fn test_nonce_is_32_hex_chars_and_unique() {
    let a = generate_nonce();
    let b = generate_nonce();
    assert_eq!(a.len(), 32);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
}
