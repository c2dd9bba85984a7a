use std::time::Duration;

use serde::de::DeserializeOwned;
use ureq::Agent;

/// Per-request options: extra headers, query pairs and an optional JSON body.
pub struct HttpConfig {
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<Vec<u8>>,
}

impl HttpConfig {
    pub(crate) fn new() -> Self {
        Self {
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Add a header to the request.
    pub fn header(&mut self, key: &str, value: &str) -> &mut Self {
        self.headers.push((key.to_owned(), value.to_owned()));
        self
    }

    /// Add a query parameter. The value is percent-encoded when sent.
    pub fn query(&mut self, key: &str, value: &str) -> &mut Self {
        self.query.push((key.to_owned(), value.to_owned()));
        self
    }

    /// Set the request body as JSON bytes.
    pub fn json_body(&mut self, body: Vec<u8>) -> &mut Self {
        self.body = Some(body);
        self
    }
}

/// A completed HTTP response.
pub struct Response {
    status: u16,
    body: Vec<u8>,
}

impl Response {
    pub(crate) fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Response body as a UTF-8 string (lossy).
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or("")
    }

    /// Deserialize the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Blocking agent that reports 4xx/5xx as responses instead of errors, so
/// callers can map status codes themselves.
pub(crate) fn agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// Sends one request. `Err` carries transport failures only.
pub(crate) fn send(
    agent: &Agent,
    method: &str,
    url: &str,
    f: impl FnOnce(&mut HttpConfig) -> &mut HttpConfig,
) -> Result<Response, String> {
    let mut config = HttpConfig::new();
    f(&mut config);

    macro_rules! apply_config {
        ($req:expr) => {{
            let mut r = $req;
            for (key, value) in &config.headers {
                r = r.header(key.as_str(), value.as_str());
            }
            for (key, value) in &config.query {
                r = r.query(key.as_str(), value.as_str());
            }
            r
        }};
    }

    let send_result = match method {
        "GET" => apply_config!(agent.get(url)).call(),
        "DELETE" => apply_config!(agent.delete(url)).call(),
        "POST" => {
            let req = apply_config!(agent.post(url));
            match &config.body {
                Some(body) => req.content_type("application/json").send(body),
                None => req.send_empty(),
            }
        }
        _ => return Err(format!("Unsupported HTTP method: {method}")),
    };

    match send_result {
        Ok(resp) => {
            let status: u16 = resp.status().into();
            let body = resp
                .into_body()
                .read_to_vec()
                .map_err(|e| e.to_string())?;
            Ok(Response::new(status, body))
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Percent-encodes one path segment, keeping RFC 3986 unreserved bytes.
pub(crate) fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
