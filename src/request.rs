//! Request description: URL validation, headers, cookies and body variants.
//!
//! A [`RequestSpec`] is plain data. It is turned into a transport request by
//! [`RequestSpec::build`], which may run more than once when the alternate
//! transport falls back to the standard one.

use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use url::Url;

use crate::constants::FORM_CONTENT_TYPE;
use crate::error::TransferError;

/// Ordered header list. Duplicate names are kept and all transmitted.
pub type Headers = Vec<(String, String)>;

/// Ordered form value list. Duplicate keys are kept.
pub type FormValues = Vec<(String, String)>;

/// A request cookie (`name=value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    fn validate(&self) -> Result<(), TransferError> {
        if self.name.is_empty() {
            return Err(TransferError::invalid_header("cookie", "empty cookie name"));
        }
        if let Some(bad) = self.name.chars().find(|c| !is_cookie_name_char(*c)) {
            return Err(TransferError::invalid_header(
                self.name.clone(),
                format!("invalid character {bad:?} in cookie name"),
            ));
        }
        if let Some(bad) = self.value.chars().find(|c| *c == ';' || c.is_control()) {
            return Err(TransferError::invalid_header(
                self.name.clone(),
                format!("invalid character {bad:?} in cookie value"),
            ));
        }
        Ok(())
    }
}

/// RFC 6265 token characters.
fn is_cookie_name_char(c: char) -> bool {
    c.is_ascii_graphic()
        && !matches!(
            c,
            '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']' | '?'
                | '=' | '{' | '}'
        )
}

/// The file part of a chunked multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field_name: String,
    pub file_name: String,
    pub content: Vec<u8>,
}

impl FilePart {
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

/// Request body. Exactly one kind is active per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` pairs.
    Form(FormValues),
    /// Bytes sent verbatim; no content type is inferred.
    Raw(Vec<u8>),
    /// `multipart/form-data` text fields plus an optional file part.
    Multipart {
        fields: FormValues,
        file: Option<FilePart>,
    },
}

impl RequestBody {
    /// Multipart body; a file part with empty content is dropped so the
    /// request degrades to a plain multipart form post.
    #[must_use]
    pub fn multipart(fields: FormValues, file: Option<FilePart>) -> Self {
        Self::Multipart {
            fields,
            file: file.filter(|part| !part.content.is_empty()),
        }
    }
}

/// Validates a URL before any I/O is attempted.
///
/// Rejects control characters outright (URL parsers silently strip tabs and
/// newlines), then requires an absolute http or https URL.
///
/// # Errors
///
/// Returns [`TransferError::InvalidUrl`] describing the violation.
pub fn validate_url(raw: &str) -> Result<Url, TransferError> {
    if raw.chars().any(char::is_control) {
        return Err(TransferError::invalid_url(
            raw,
            "invalid control character in URL",
        ));
    }

    let url = Url::parse(raw).map_err(|e| TransferError::invalid_url(raw, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(TransferError::invalid_url(
            raw,
            format!("unsupported scheme {other:?}"),
        )),
    }
}

/// A fully described request: method, validated URL, headers, cookies, body.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
    pub cookies: Vec<Cookie>,
    pub body: RequestBody,
}

impl RequestSpec {
    /// Creates a request with no headers, cookies or body.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidUrl`] if `url` fails [`validate_url`].
    pub fn new(method: Method, url: &str) -> Result<Self, TransferError> {
        Ok(Self {
            method,
            url: validate_url(url)?,
            headers: Vec::new(),
            cookies: Vec::new(),
            body: RequestBody::Empty,
        })
    }

    #[must_use]
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn cookies(mut self, cookies: Vec<Cookie>) -> Self {
        self.cookies = cookies;
        self
    }

    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Builds the transport request against `client`.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidHeader`] for a header or cookie that
    /// cannot be encoded.
    pub fn build(&self, client: &Client) -> Result<RequestBuilder, TransferError> {
        let mut headers = self.header_map()?;
        let request = client.request(self.method.clone(), self.url.clone());

        let request = match &self.body {
            RequestBody::Empty => request.headers(headers),
            RequestBody::Form(values) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
                request.headers(headers).body(encode_form(values))
            }
            RequestBody::Raw(bytes) => request.headers(headers).body(bytes.clone()),
            RequestBody::Multipart { fields, file } => {
                request.headers(headers).multipart(multipart_form(fields, file.as_ref())?)
            }
        };
        Ok(request)
    }

    /// Caller headers in order, then cookies folded into one `Cookie` header
    /// appended to any caller-supplied cookie string.
    fn header_map(&self) -> Result<HeaderMap, TransferError> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransferError::invalid_header(name.clone(), e.to_string()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| TransferError::invalid_header(name.clone(), e.to_string()))?;
            map.append(header_name, header_value);
        }

        if self.cookies.is_empty() {
            return Ok(map);
        }

        let mut pairs: Vec<String> = map
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        for cookie in &self.cookies {
            cookie.validate()?;
            pairs.push(format!("{}={}", cookie.name, cookie.value));
        }
        let joined = pairs.join("; ");
        let value = HeaderValue::from_str(&joined)
            .map_err(|e| TransferError::invalid_header("cookie", e.to_string()))?;
        map.insert(COOKIE, value);
        Ok(map)
    }
}

fn encode_form(values: &FormValues) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(values.iter())
        .finish()
}

fn multipart_form(fields: &FormValues, file: Option<&FilePart>) -> Result<Form, TransferError> {
    let mut form = fields
        .iter()
        .fold(Form::new(), |form, (key, value)| form.text(key.clone(), value.clone()));

    if let Some(file) = file.filter(|part| !part.content.is_empty()) {
        let part = Part::bytes(file.content.clone())
            .file_name(file.file_name.clone())
            .mime_str("application/octet-stream")
            .map_err(|e| TransferError::invalid_header("content-type", e.to_string()))?;
        form = form.part(file.field_name.clone(), part);
    }
    Ok(form)
}
