//! Response envelope rendering.
//!
//! # Responsibilities
//! - Render success envelopes with a JSON array body
//! - Render rejections (405, 400, 404, 500) with a plain-text body
//! - Echo the request's protocol version in the status line
//!
//! # Design Decisions
//! - Envelopes are assembled fully in memory before any byte is written
//! - Lines are `\n` separated, matching what clients of this server send
//! - Rendering never fails; a serialization failure degrades to 500

use crate::http::policy::ALLOWED_METHOD;
use crate::store::Record;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Status codes this server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    InternalServerError,
}

impl Status {
    /// Numeric status code.
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::MethodNotAllowed => 405,
            Status::InternalServerError => 500,
        }
    }

    /// Reason phrase for the status line.
    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::InternalServerError => "Internal Server Error",
        }
    }
}

/// A complete reply, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub version: String,
    pub status: Status,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: String,
}

impl ResponseEnvelope {
    /// 200 with the records as a JSON array.
    pub fn success(version: impl Into<String>, records: &[Record]) -> Self {
        let version = version.into();
        match serde_json::to_string(records) {
            Ok(body) => Self {
                version,
                status: Status::Ok,
                headers: vec![
                    ("Content-Type", JSON_CONTENT_TYPE),
                    ("Connection", "close"),
                ],
                body,
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize records");
                Self::rejection(version, Status::InternalServerError, "Failed to encode records")
            }
        }
    }

    /// 405 naming the one permitted method.
    pub fn method_not_allowed(version: impl Into<String>) -> Self {
        Self::rejection(
            version,
            Status::MethodNotAllowed,
            format!("You must use {} method", ALLOWED_METHOD),
        )
    }

    /// Any non-success status with a plain-text explanation.
    pub fn rejection(
        version: impl Into<String>,
        status: Status,
        message: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            status,
            headers: Vec::new(),
            body: message.into(),
        }
    }

    /// Render the envelope to wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "{} {} {}\n",
            self.version,
            self.status.code(),
            self.status.reason()
        );
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, image: Option<&str>) -> Record {
        Record {
            title: title.into(),
            description: format!("{title} 요약"),
            image: image.map(str::to_string),
            url: format!("https://news/{title}"),
            publish_date: "2022.07.01. 오후 3:12".into(),
        }
    }

    #[test]
    fn method_not_allowed_envelope_is_exact() {
        let bytes = ResponseEnvelope::method_not_allowed("HTTP/1.0").to_bytes();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "HTTP/1.0 405 Method Not Allowed\n\nYou must use GET method"
        );
    }

    #[test]
    fn success_envelope_layout() {
        let records = vec![record("a", None)];
        let text =
            String::from_utf8(ResponseEnvelope::success("HTTP/1.1", &records).to_bytes()).unwrap();

        let (head, body) = text.split_once("\n\n").unwrap();
        assert_eq!(
            head,
            "HTTP/1.1 200 OK\nContent-Type: application/json; charset=utf-8\nConnection: close"
        );
        assert!(body.starts_with('[') && body.ends_with(']'));
        assert!(body.contains("\"image\":null"));
    }

    #[test]
    fn success_body_round_trips() {
        let records = vec![record("정치", Some("https://img/1.jpg")), record("경제", None)];
        let envelope = ResponseEnvelope::success("HTTP/1.1", &records);

        let back: Vec<Record> = serde_json::from_str(&envelope.body).unwrap();
        assert_eq!(back, records);

        let value: serde_json::Value = serde_json::from_str(&envelope.body).unwrap();
        let keys: Vec<&String> = value[0].as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 5);
    }

    #[test]
    fn empty_slice_is_empty_array() {
        let envelope = ResponseEnvelope::success("HTTP/1.1", &[]);
        assert_eq!(envelope.body, "[]");
        assert_eq!(envelope.status, Status::Ok);
    }

    #[test]
    fn rejection_uses_given_status() {
        let text = String::from_utf8(
            ResponseEnvelope::rejection("HTTP/1.1", Status::NotFound, "no such category")
                .to_bytes(),
        )
        .unwrap();
        assert_eq!(text, "HTTP/1.1 404 Not Found\n\nno such category");
    }
}
