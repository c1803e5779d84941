//! Minimal HTTP/1.1 wire layer: one request per connection.
//!
//! Only what the wiki needs: request line, headers, a `Content-Length` body,
//! urlencoded form fields, and `200/302/400/404/500` responses.

use std::fmt;

use percent_encoding::percent_decode_str;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on request line plus headers.
pub const MAX_HEAD_BYTES: usize = 64 * 1024;
/// Upper bound on a request body (page bodies arrive as form posts).
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("connection: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed request: {0}")]
    Malformed(&'static str),
    #[error("request {what} exceeds {limit} bytes")]
    TooLarge { what: &'static str, limit: usize },
}

/// A parsed request. `path` is percent-decoded and excludes the query string.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Builds a request from a method and a target such as `/view/Foo?x=1`.
    /// Invalid UTF-8 after decoding becomes U+FFFD.
    pub fn new(method: &str, target: &str) -> Self {
        let (raw_path, query) = match target.split_once('?') {
            Some((p, q)) => (p, Some(q.to_string())),
            None => (target, None),
        };
        let path = percent_decode_str(raw_path).decode_utf8_lossy().into_owned();
        Self {
            method: method.to_string(),
            path,
            query,
            ..Default::default()
        }
    }

    /// Convenience for a urlencoded form post.
    pub fn form_post(target: &str, fields: &[(&str, &str)]) -> Self {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut req = Self::new("POST", target);
        req.headers
            .push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
        req.body = body.into_bytes();
        req
    }

    /// First header value with a case-insensitive name match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn is_form_body(&self) -> bool {
        self.header("content-type")
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
            .unwrap_or(false)
    }

    /// Form field `key`: urlencoded body first, then the query string.
    pub fn form_value(&self, key: &str) -> Option<String> {
        let from_body = if self.is_form_body() {
            find_pair(&self.body, key)
        } else {
            None
        };
        from_body.or_else(|| {
            self.query
                .as_deref()
                .and_then(|q| find_pair(q.as_bytes(), key))
        })
    }
}

fn find_pair(encoded: &[u8], key: &str) -> Option<String> {
    url::form_urlencoded::parse(encoded)
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Reads one line of the request head into `buf` (cleared first), never
/// buffering more than the head budget left. Returns the line without its
/// terminator, or `None` on EOF before any byte.
async fn read_head_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    head_bytes: &mut usize,
) -> Result<Option<String>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let remaining = MAX_HEAD_BYTES.saturating_sub(*head_bytes);
    let n = (&mut *reader)
        .take(remaining as u64)
        .read_until(b'\n', buf)
        .await?;
    *head_bytes += n;
    if n == 0 {
        if remaining == 0 {
            return Err(HttpError::TooLarge {
                what: "head",
                limit: MAX_HEAD_BYTES,
            });
        }
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') {
        if n == remaining {
            return Err(HttpError::TooLarge {
                what: "head",
                limit: MAX_HEAD_BYTES,
            });
        }
        return Err(HttpError::Malformed("connection closed inside request head"));
    }
    let line = std::str::from_utf8(buf)
        .map_err(|_| HttpError::Malformed("request head is not valid UTF-8"))?;
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Reads one request. Returns `Ok(None)` when the peer closes before sending anything.
pub async fn read_request<R>(reader: &mut R) -> Result<Option<Request>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut head_bytes = 0usize;
    let mut buf = Vec::new();

    let line = match read_head_line(reader, &mut buf, &mut head_bytes).await? {
        Some(line) => line,
        None => return Ok(None),
    };

    let mut parts = line.split_whitespace();
    let method = parts.next().ok_or(HttpError::Malformed("empty request line"))?;
    let target = parts.next().ok_or(HttpError::Malformed("missing request target"))?;
    let version = parts.next().ok_or(HttpError::Malformed("missing HTTP version"))?;
    if !version.starts_with("HTTP/1.") {
        return Err(HttpError::Malformed("unsupported HTTP version"));
    }
    if !target.starts_with('/') {
        return Err(HttpError::Malformed("request target must be a path"));
    }
    let mut req = Request::new(method, target);

    loop {
        let trimmed = read_head_line(reader, &mut buf, &mut head_bytes)
            .await?
            .ok_or(HttpError::Malformed("connection closed inside headers"))?;
        if trimmed.is_empty() {
            break;
        }
        let (name, value) = trimmed
            .split_once(':')
            .ok_or(HttpError::Malformed("header without colon"))?;
        req.headers
            .push((name.trim().to_string(), value.trim().to_string()));
    }

    let content_length = match req.header("content-length") {
        Some(v) => v
            .parse::<usize>()
            .map_err(|_| HttpError::Malformed("invalid Content-Length"))?,
        None => 0,
    };
    if content_length > MAX_BODY_BYTES {
        return Err(HttpError::TooLarge {
            what: "body",
            limit: MAX_BODY_BYTES,
        });
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;
    req.body = body;

    Ok(Some(req))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Found,
    BadRequest,
    NotFound,
    InternalServerError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Found => 302,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::InternalServerError => 500,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Found => "Found",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::InternalServerError => "Internal Server Error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    fn with_body(status: Status, content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body,
        }
    }

    pub fn html(body: String) -> Self {
        Self::with_body(Status::Ok, "text/html; charset=utf-8", body.into_bytes())
    }

    pub fn text(status: Status, body: impl Into<String>) -> Self {
        let mut body = body.into();
        body.push('\n');
        Self::with_body(status, "text/plain; charset=utf-8", body.into_bytes())
    }

    /// `302 Found` to `location`.
    pub fn redirect(location: &str) -> Self {
        let mut resp = Self::with_body(
            Status::Found,
            "text/html; charset=utf-8",
            format!("<a href=\"{}\">Found</a>.\n", location).into_bytes(),
        );
        resp.headers
            .push(("Location".to_string(), location.to_string()));
        resp
    }

    pub fn not_found() -> Self {
        Self::text(Status::NotFound, "404 page not found")
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::text(Status::InternalServerError, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::text(Status::BadRequest, message)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serializes status line, headers (plus `Content-Length` and
    /// `Connection: close`) and body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {}\r\n", self.status);
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        head.push_str("Connection: close\r\n\r\n");
        let mut out = head.into_bytes();
        out.extend_from_slice(&self.body);
        out
    }

    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.to_bytes()).await?;
        writer.flush().await
    }
}
