//! Request payloads and their wire encoding.
//!
//! # Design
//! [`Body`] is a closed set of payload shapes. [`encode`] inspects the shape
//! once and produces the wire bytes plus a `Content-Type`, which is only
//! written when the caller has not set one.
//!
//! | payload      | wire body         | content type                          |
//! |--------------|-------------------|---------------------------------------|
//! | empty        | nothing           | none                                  |
//! | text         | the text          | `text/plain;charset=UTF-8`            |
//! | JSON         | serialized JSON   | `application/json;charset=UTF-8`      |
//! | form data    | multipart framing | `multipart/form-data; boundary=<b>`   |
//! | form         | as form data      | as form data                          |

use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;

use crate::error::Error;
use crate::form::{Form, FormData};
use crate::multipart;

pub const TEXT_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Json(serde_json::Value),
    FormData(FormData),
    Form(Form),
}

impl Body {
    /// Structured payload from any serializable value.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, Error> {
        serde_json::to_value(value).map(Body::Json).map_err(Error::Encode)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Text(text) => text.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl From<FormData> for Body {
    fn from(data: FormData) -> Self {
        Body::FormData(data)
    }
}

impl From<Form> for Body {
    fn from(form: Form) -> Self {
        Body::Form(form)
    }
}

/// Encode `body`, setting `Content-Type` in `headers` unless already present.
pub fn encode(body: &Body, headers: &mut HeaderMap) -> Result<Vec<u8>, Error> {
    encode_with_boundary(body, headers, multipart::generate_boundary)
}

/// [`encode`] with a caller-supplied boundary generator.
pub fn encode_with_boundary(
    body: &Body,
    headers: &mut HeaderMap,
    generate: impl FnMut() -> String,
) -> Result<Vec<u8>, Error> {
    if body.is_empty() {
        return Ok(Vec::new());
    }
    let (bytes, content_type) = match body {
        Body::Empty => return Ok(Vec::new()),
        Body::Text(text) => (text.as_bytes().to_vec(), TEXT_CONTENT_TYPE.to_string()),
        Body::Json(value) => (
            serde_json::to_vec(value).map_err(Error::Encode)?,
            JSON_CONTENT_TYPE.to_string(),
        ),
        Body::FormData(data) => encode_form_data(data, generate),
        Body::Form(form) => encode_form_data(&form.to_form_data(), generate),
    };
    if !headers.contains_key(CONTENT_TYPE) {
        let value = HeaderValue::from_str(&content_type)
            .map_err(|_| Error::InvalidHeader(content_type.clone()))?;
        headers.insert(CONTENT_TYPE, value);
    }
    Ok(bytes)
}

fn encode_form_data(data: &FormData, generate: impl FnMut() -> String) -> (Vec<u8>, String) {
    let boundary = multipart::choose_boundary(data, generate);
    (multipart::encode(data, &boundary), multipart::content_type(&boundary))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::form::FormControl;

    fn encoded(body: &Body) -> (String, Option<String>) {
        let mut headers = HeaderMap::new();
        let bytes = encode_with_boundary(body, &mut headers, || "BOUNDARY".to_string()).unwrap();
        let content_type = headers
            .get(CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        (String::from_utf8(bytes).unwrap(), content_type)
    }

    fn login_multipart() -> String {
        [
            "--BOUNDARY",
            "Content-Disposition: form-data; name=\"name\"",
            "",
            "foo",
            "--BOUNDARY",
            "Content-Disposition: form-data; name=\"password\"",
            "",
            "123456",
            "--BOUNDARY--",
            "",
        ]
        .join("\r\n")
    }

    #[test]
    fn empty_body_sets_nothing() {
        assert_eq!(encoded(&Body::Empty), (String::new(), None));
        assert_eq!(encoded(&Body::from("")), (String::new(), None));
    }

    #[test]
    fn text_body_is_plain_utf8() {
        let (body, content_type) = encoded(&Body::from("hello"));
        assert_eq!(body, "hello");
        assert_eq!(content_type.as_deref(), Some(TEXT_CONTENT_TYPE));
    }

    #[test]
    fn structured_body_is_json() {
        let (body, content_type) = encoded(&Body::from(json!({ "hello": "world" })));
        assert_eq!(body, r#"{"hello":"world"}"#);
        assert_eq!(content_type.as_deref(), Some(JSON_CONTENT_TYPE));
    }

    #[test]
    fn serializable_struct_becomes_json() {
        #[derive(Serialize)]
        struct Login<'a> {
            name: &'a str,
            remember: bool,
        }

        let body = Body::json(&Login { name: "foo", remember: true }).unwrap();
        let (wire, _) = encoded(&body);
        assert_eq!(wire, r#"{"name":"foo","remember":true}"#);
    }

    #[test]
    fn form_data_is_multipart() {
        let data: FormData = [("name", "foo"), ("password", "123456")].into_iter().collect();

        let (body, content_type) = encoded(&Body::from(data));

        assert_eq!(body, login_multipart());
        assert_eq!(content_type.as_deref(), Some("multipart/form-data; boundary=BOUNDARY"));
    }

    #[test]
    fn form_encodes_like_its_form_data() {
        let form = Form::new()
            .control(FormControl::text("name", "foo"))
            .control(FormControl::password("password", "123456"));

        let (body, content_type) = encoded(&Body::from(form));

        assert_eq!(body, login_multipart());
        assert_eq!(content_type.as_deref(), Some("multipart/form-data; boundary=BOUNDARY"));
    }

    #[test]
    fn explicit_content_type_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/vnd.api+json"));

        let bytes = encode(&Body::from(json!([1, 2])), &mut headers).unwrap();

        assert_eq!(bytes, b"[1,2]");
        assert_eq!(headers[CONTENT_TYPE], "application/vnd.api+json");
        assert_eq!(headers.get_all(CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn random_boundary_is_announced_in_header() {
        let data: FormData = [("k", "v")].into_iter().collect();
        let mut headers = HeaderMap::new();

        let bytes = encode(&Body::from(data), &mut headers).unwrap();

        let header = headers[CONTENT_TYPE].to_str().unwrap();
        let boundary = header.strip_prefix(multipart::CONTENT_TYPE_PREFIX).unwrap();
        assert!(String::from_utf8(bytes).unwrap().ends_with(&format!("--{boundary}--\r\n")));
    }
}
