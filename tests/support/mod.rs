//! Shared helpers for the integration tests: clients and echo responders.

#![allow(dead_code)]

use std::path::PathBuf;

use transfer_core::TransferClient;
use wiremock::{Request, Respond, ResponseTemplate};

/// Path of a file under `tests/testdata`.
pub fn testdata(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("testdata")
        .join(name)
}

/// Client that skips certificate checks; the mock servers speak plain HTTP.
pub fn client() -> TransferClient {
    TransferClient::new(true, "", false).expect("insecure client should build")
}

/// Echoes the request body back with status 200.
pub struct EchoBody;

impl Respond for EchoBody {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_bytes(request.body.clone())
    }
}

/// Answers with the value of `name`, taken from a header of that name if
/// present, otherwise from a cookie of that name, otherwise empty.
pub struct HeaderThenCookie(pub &'static str);

impl Respond for HeaderThenCookie {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let name = self.0;
        let from_header = request
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let value = from_header
            .or_else(|| cookie_value(request, name))
            .unwrap_or_default();
        ResponseTemplate::new(200).set_body_string(value)
    }
}

/// Value of cookie `name` in the request's `Cookie` headers.
pub fn cookie_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Answers with the most specific `key` it finds in a multipart upload: the
/// file part's content, else the `key` cookie, else the `key` form field.
pub struct ChunkLayers;

impl Respond for ChunkLayers {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let parts = multipart_parts(request);
        let file = parts
            .iter()
            .find(|(headers, _)| headers.contains("filename="))
            .map(|(_, content)| content.clone());
        let field = parts
            .iter()
            .find(|(headers, _)| headers.contains(r#"name="key""#))
            .map(|(_, content)| content.clone());
        let value = file
            .or_else(|| cookie_value(request, "key"))
            .or(field)
            .unwrap_or_default();
        ResponseTemplate::new(200).set_body_string(value)
    }
}

/// Splits a multipart body into `(part headers, part content)` pairs.
fn multipart_parts(request: &Request) -> Vec<(String, String)> {
    let Some(boundary) = request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split_once("boundary="))
        .map(|(_, b)| b.trim_matches('"').to_string())
    else {
        return Vec::new();
    };
    let body = String::from_utf8_lossy(&request.body);
    body.split(&format!("--{boundary}"))
        .filter_map(|part| part.strip_prefix("\r\n"))
        .filter_map(|part| part.split_once("\r\n\r\n"))
        .map(|(headers, content)| {
            let content = content.strip_suffix("\r\n").unwrap_or(content);
            (headers.to_string(), content.to_string())
        })
        .collect()
}
