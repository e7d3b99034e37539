use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use mailpilot_tools::{CredentialSource, EmailSender, GmailClient, GmailError};
use std::sync::Arc;

struct StaticToken(&'static str);

#[async_trait]
impl CredentialSource for StaticToken {
    async fn access_token(&self) -> Result<String, GmailError> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn test_send_posts_raw_message() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/gmail/v1/users/me/messages/send")
        .match_header("authorization", "Bearer ya29.test")
        .match_body(mockito::Matcher::Regex(r#"\{"raw":"[A-Za-z0-9_=-]+"\}"#.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"18c2f0a1","threadId":"18c2f0a1","labelIds":["SENT"]}"#)
        .create_async()
        .await;

    let client = GmailClient::new(Arc::new(StaticToken("ya29.test"))).with_base_url(server.url());
    let id = client
        .send_new_email("alice@example.com", "Hi", "Hello")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(id, "18c2f0a1");
}

#[test]
fn test_raw_decodes_to_message() {
    let raw = mailpilot_tools::gmail::mime::encode_raw(&mailpilot_tools::gmail::mime::build_message(
        "alice@example.com",
        "Hi",
        "Hello",
    ));
    let decoded = String::from_utf8(URL_SAFE.decode(raw).unwrap()).unwrap();
    assert!(decoded.contains("to: alice@example.com"));
    assert!(decoded.ends_with("Hello"));
}

#[tokio::test]
async fn test_send_surfaces_api_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/gmail/v1/users/me/messages/send")
        .with_status(403)
        .with_body("Request had insufficient authentication scopes.")
        .create_async()
        .await;

    let client = GmailClient::new(Arc::new(StaticToken("ya29.test"))).with_base_url(server.url());
    let err = client
        .send_new_email("alice@example.com", "Hi", "Hello")
        .await
        .unwrap_err();

    match err {
        GmailError::Api { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("insufficient"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
