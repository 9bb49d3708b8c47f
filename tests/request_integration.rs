//! Integration tests for the verb-level request operations.
//!
//! Each test runs against a wiremock server and inspects either the echoed
//! response or the request the server recorded.

mod support;

use std::time::Duration;

use support::{ChunkLayers, EchoBody, HeaderThenCookie, client, cookie_value};
use transfer_core::{ClientOptions, Cookie, ProtocolPreference, TransferClient, TransferError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[tokio::test]
async fn test_get_returns_body_and_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello world"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = client()
        .get(&format!("{}/get", mock_server.uri()))
        .await
        .expect("get should succeed");

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "hello world");
}

#[tokio::test]
async fn test_non_success_status_is_returned_not_raised() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&mock_server)
        .await;

    let response = client()
        .get(&mock_server.uri())
        .await
        .expect("a 503 is still a response");

    assert_eq!(response.status(), 503);
    assert_eq!(response.text().await.unwrap(), "busy");
}

#[tokio::test]
async fn test_get_with_cookies_sends_header_and_cookie() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cookie"))
        .respond_with(HeaderThenCookie("key"))
        .mount(&mock_server)
        .await;
    let url = format!("{}/cookie", mock_server.uri());
    let client = client();

    let headers = pairs(&[("key", "hello")]);
    let cookies = vec![Cookie::new("key", "world")];
    let response = client
        .get_with_cookies(&url, &headers, &cookies)
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "hello");

    let response = client.get_with_cookies(&url, &[], &cookies).await.unwrap();
    assert_eq!(response.text().await.unwrap(), "world");

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].headers.get("key").unwrap(), "hello");
    assert_eq!(cookie_value(&received[0], "key").as_deref(), Some("world"));
}

#[tokio::test]
async fn test_post_form_is_urlencoded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/form"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(EchoBody)
        .expect(1)
        .mount(&mock_server)
        .await;

    let form = pairs(&[("key", "hello world"), ("other", "a&b")]);
    let response = client()
        .post_form(&format!("{}/form", mock_server.uri()), &form)
        .await
        .unwrap();

    assert_eq!(
        response.text().await.unwrap(),
        "key=hello+world&other=a%26b"
    );
}

#[tokio::test]
async fn test_post_form_with_cookies_sends_both() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/form"))
        .respond_with(HeaderThenCookie("session"))
        .mount(&mock_server)
        .await;

    let response = client()
        .post_form_with_cookies(
            &format!("{}/form", mock_server.uri()),
            &pairs(&[("key", "hello")]),
            &[Cookie::new("session", "abc123")],
        )
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "abc123");

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received[0].body, b"key=hello");
}

#[tokio::test]
async fn test_file_chunk_upload_layers_fields_and_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = client()
        .post_file_chunk_with_cookies(
            &format!("{}/upload", mock_server.uri()),
            "file",
            "notes.txt",
            &pairs(&[("hello", "world")]),
            b"some test contents",
            &[Cookie::new("key", "world")],
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let received = mock_server.received_requests().await.unwrap();
    let request = &received[0];
    let content_type = request.headers.get("content-type").unwrap().to_str().unwrap();
    assert!(
        content_type.starts_with("multipart/form-data; boundary="),
        "got: {content_type}"
    );
    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains(r#"name="hello""#), "body: {body}");
    assert!(body.contains("world"), "body: {body}");
    assert!(
        body.contains(r#"name="file"; filename="notes.txt""#),
        "body: {body}"
    );
    assert!(body.contains("some test contents"), "body: {body}");
    assert_eq!(cookie_value(request, "key").as_deref(), Some("world"));
}

#[tokio::test]
async fn test_chunk_upload_layering() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chunk"))
        .respond_with(ChunkLayers)
        .mount(&mock_server)
        .await;
    let url = format!("{}/chunk", mock_server.uri());
    let client = client();
    let form = pairs(&[("key", "hello")]);
    let cookies = [Cookie::new("key", "world")];

    let response = client
        .post_file_chunk_with_cookies(&url, "file", "a.txt", &form, b"", &[])
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "hello");

    let response = client
        .post_file_chunk_with_cookies(&url, "file", "a.txt", &form, b"", &cookies)
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "world");

    let response = client
        .post_file_chunk_with_cookies(
            &url,
            "file",
            "a.txt",
            &form,
            b"some test contents",
            &cookies,
        )
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "some test contents");
}

#[tokio::test]
async fn test_empty_chunk_sends_fields_only() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    client()
        .post_file_chunk_with_cookies(
            &mock_server.uri(),
            "file",
            "notes.txt",
            &pairs(&[("hello", "world")]),
            b"",
            &[],
        )
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&received[0].body);
    assert!(body.contains(r#"name="hello""#), "body: {body}");
    assert!(!body.contains("filename="), "body: {body}");
}

async fn mount_redirect(mock_server: &MockServer, status: u16, target_calls: u64) {
    Mock::given(path("/redirect"))
        .respond_with(ResponseTemplate::new(status).insert_header("Location", "/post_data"))
        .mount(mock_server)
        .await;
    Mock::given(path("/post_data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("landed"))
        .expect(target_calls)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_post_form_without_redirect_returns_3xx() {
    for status in [301, 302] {
        let mock_server = MockServer::start().await;
        mount_redirect(&mock_server, status, 0).await;

        let response = client()
            .post_form_without_redirect(
                &format!("{}/redirect", mock_server.uri()),
                &pairs(&[("key", "hello")]),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), status);
        assert_eq!(response.headers()["location"], "/post_data");
    }
}

#[tokio::test]
async fn test_post_form_follows_redirect() {
    for status in [301, 302] {
        let mock_server = MockServer::start().await;
        mount_redirect(&mock_server, status, 1).await;

        let response = client()
            .post_form(
                &format!("{}/redirect", mock_server.uri()),
                &pairs(&[("key", "hello")]),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "landed");
    }
}

#[tokio::test]
async fn test_raw_body_verbs_send_bytes_verbatim() {
    let mock_server = MockServer::start().await;
    for verb in ["POST", "PUT", "DELETE"] {
        Mock::given(method(verb))
            .and(path("/raw"))
            .respond_with(EchoBody)
            .expect(1)
            .mount(&mock_server)
            .await;
    }
    let url = format!("{}/raw", mock_server.uri());
    let client = client();
    let payload = b"{\"hello\": \"world\"}";

    let posted = client.post_data(&url, payload).await.unwrap();
    assert_eq!(posted.bytes().await.unwrap().as_ref(), payload);

    let put = client.put(&url, payload).await.unwrap();
    assert_eq!(put.bytes().await.unwrap().as_ref(), payload);

    let deleted = client.delete(&url, b"bye").await.unwrap();
    assert_eq!(deleted.bytes().await.unwrap().as_ref(), b"bye");

    let received = mock_server.received_requests().await.unwrap();
    assert!(
        received.iter().all(|r| r.headers.get("content-type").is_none()),
        "raw bodies carry no content type"
    );
}

#[tokio::test]
async fn test_request_timeout_is_transport_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let options = ClientOptions {
        request_timeout: Duration::from_millis(200),
        ..ClientOptions::default()
    };
    let client = TransferClient::with_options(true, "", ProtocolPreference::Auto, &options).unwrap();

    let err = client.get(&mock_server.uri()).await.unwrap_err();
    assert!(err.is_timeout(), "Expected timeout, got: {err:?}");
    assert!(matches!(err, TransferError::Transport { .. }));
}

#[tokio::test]
async fn test_cloned_clients_run_concurrently() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(EchoBody)
        .expect(8)
        .mount(&mock_server)
        .await;

    let client = client();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            let url = mock_server.uri();
            tokio::spawn(async move {
                let body = format!("request {i}");
                let response = client.post_data(&url, body.as_bytes()).await.unwrap();
                (body, response.text().await.unwrap())
            })
        })
        .collect();

    for handle in handles {
        let (sent, echoed) = handle.await.unwrap();
        assert_eq!(sent, echoed);
    }
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    client().get(&mock_server.uri()).await.unwrap();

    let received = mock_server.received_requests().await.unwrap();
    let agent = received[0].headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(agent.starts_with("transfer/"), "got: {agent}");
}
