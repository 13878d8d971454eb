use eroom_harvest::network::{FastClient, IdentityProfile, NetworkError, PageSource};
use reqwest::header::{HeaderMap, USER_AGENT};

#[tokio::test]
async fn test_client_initialization() {
    let client = FastClient::new();
    assert!(client.is_ok());
}

#[tokio::test]
async fn test_invalid_url_rejected_before_request() {
    let client = FastClient::new().unwrap();
    let result = client.fetch_text("not a url").await;

    match result {
        Err(NetworkError::InvalidUrl(url)) => assert_eq!(url, "not a url"),
        other => panic!("expected InvalidUrl, got {:?}", other),
    }
}

#[test]
fn test_identity_headers_applied() {
    let identity = IdentityProfile::desktop_chrome();
    let mut headers = HeaderMap::new();
    identity.apply_to_headers(&mut headers).unwrap();

    let ua = headers.get(USER_AGENT).unwrap().to_str().unwrap();
    assert!(ua.contains("Chrome/120"));
    assert_eq!(headers.get("sec-ch-ua-mobile").unwrap(), "?0");
    assert!(identity.browser_arg().starts_with("--user-agent=Mozilla"));
}
