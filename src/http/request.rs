//! Request parsing and validation.
//!
//! # Responsibilities
//! - Tokenize the request line into method, path and version
//! - Percent-decode the path into a bare category name
//! - Collect `Key: Value` header lines, skipping malformed ones
//! - Extract the `startIndex` / `count` pagination window
//!
//! # Design Decisions
//! - Parsing is total over bytes: invalid UTF-8 is replaced, never fatal
//! - Header lines without `": "` are skipped, not a parse failure
//! - Pagination is validated separately so the access check runs first
//! - Headers carry the window; the query string is a fallback

use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use thiserror::Error;

/// Header carrying the zero-based index of the first record.
pub const START_INDEX_FIELD: &str = "startIndex";
/// Header carrying the number of records requested.
pub const COUNT_FIELD: &str = "count";
/// Version used for replies when the request line had none.
pub const FALLBACK_VERSION: &str = "HTTP/1.1";

const HEADER_SEPARATOR: &str = ": ";

/// A request that tokenized successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    /// Method token, as sent.
    pub method: String,
    /// Decoded category path without the leading `/`. Never empty.
    pub path: String,
    /// Raw query string after `?`, if any.
    pub query: Option<String>,
    /// Protocol version token, as sent.
    pub version: String,
    /// Header fields by name.
    pub headers: HashMap<String, String>,
}

/// Pagination window requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub start: usize,
    pub count: usize,
}

/// The request line could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing was received, or the first line was blank.
    #[error("empty request")]
    Empty,
    /// The request line did not split into exactly three tokens. With more
    /// than three, the last one is kept as the version to answer with.
    #[error("request line has {found} tokens, expected 3")]
    RequestLine {
        found: usize,
        version: Option<String>,
    },
    /// The path decoded to nothing.
    #[error("request path is empty")]
    EmptyPath { version: String },
}

impl ParseError {
    /// Version to answer with, or `None` when the connection should be
    /// closed without a reply.
    pub fn reply_version(&self) -> Option<&str> {
        match self {
            ParseError::Empty => None,
            ParseError::RequestLine { version, .. } => {
                Some(version.as_deref().unwrap_or(FALLBACK_VERSION))
            }
            ParseError::EmptyPath { version } => Some(version.as_str()),
        }
    }
}

/// The pagination window is missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    Missing(&'static str),
    #[error("field '{field}' must be a non-negative integer, got '{value}'")]
    NotANumber { field: &'static str, value: String },
    #[error("field 'count' must be greater than 0")]
    ZeroCount,
}

/// Parse raw request bytes.
pub fn parse_request(raw: &[u8]) -> Result<ParsedRequest, ParseError> {
    let text = String::from_utf8_lossy(raw);
    let mut lines = text.split('\n');

    let request_line = lines.next().unwrap_or_default().trim();
    if request_line.is_empty() {
        return Err(ParseError::Empty);
    }

    let tokens: Vec<&str> = request_line.split_whitespace().collect();
    let [method, target, version] = tokens.as_slice() else {
        let version = match tokens.as_slice() {
            [_, _, _, .., last] => Some(last.to_string()),
            _ => None,
        };
        return Err(ParseError::RequestLine {
            found: tokens.len(),
            version,
        });
    };

    let (raw_path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (*target, None),
    };

    let decoded = percent_decode_str(raw_path).decode_utf8_lossy();
    let path = decoded.strip_prefix('/').unwrap_or(&*decoded).to_string();
    if path.is_empty() {
        return Err(ParseError::EmptyPath {
            version: version.to_string(),
        });
    }

    let mut headers = HashMap::new();
    for line in lines {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        match line.split_once(HEADER_SEPARATOR) {
            Some((key, value)) => {
                headers.insert(key.to_string(), value.to_string());
            }
            None => {
                tracing::debug!(line = %line, "Skipping malformed header line");
            }
        }
    }

    Ok(ParsedRequest {
        method: method.to_string(),
        path,
        query,
        version: version.to_string(),
        headers,
    })
}

impl ParsedRequest {
    /// Look up a header, ignoring ASCII case in the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Look up a query-string parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Extract and validate the pagination window.
    pub fn pagination(&self) -> Result<Page, ValidationError> {
        let start = self.numeric_field(START_INDEX_FIELD)?;
        let count = self.numeric_field(COUNT_FIELD)?;
        if count == 0 {
            return Err(ValidationError::ZeroCount);
        }
        Ok(Page { start, count })
    }

    fn numeric_field(&self, field: &'static str) -> Result<usize, ValidationError> {
        let raw = match self.header(field) {
            Some(value) => value.to_string(),
            None => self
                .query_param(field)
                .ok_or(ValidationError::Missing(field))?,
        };

        raw.trim()
            .parse::<usize>()
            .map_err(|_| ValidationError::NotANumber { field, value: raw })
    }
}
