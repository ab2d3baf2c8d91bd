//! `multipart/form-data` framing.
//!
//! Each entry is written as
//! `--<boundary>\r\nContent-Disposition: form-data; name="<name>"\r\n\r\n<value>\r\n`
//! and the body ends with `--<boundary>--\r\n`. Blob entries add a `filename`
//! parameter and a `Content-Type` line.

use uuid::Uuid;

use crate::form::{Blob, FormData, FormValue};

pub const CONTENT_TYPE_PREFIX: &str = "multipart/form-data; boundary=";

const BOUNDARY_PREFIX: &str = "ajxFormBoundary";
const DEFAULT_BLOB_FILENAME: &str = "blob";
const DEFAULT_BLOB_CONTENT_TYPE: &str = "application/octet-stream";

/// A fresh random alphanumeric boundary candidate.
pub fn generate_boundary() -> String {
    format!("{BOUNDARY_PREFIX}{}", Uuid::new_v4().simple())
}

/// Draw candidates from `generate` until one occurs nowhere in `form`.
pub fn choose_boundary(form: &FormData, mut generate: impl FnMut() -> String) -> String {
    loop {
        let candidate = generate();
        if !candidate.is_empty() && !collides(form, &candidate) {
            return candidate;
        }
        tracing::trace!(%candidate, "boundary collides with form content, regenerating");
    }
}

pub fn content_type(boundary: &str) -> String {
    format!("{CONTENT_TYPE_PREFIX}{boundary}")
}

/// Serialize `form` using `boundary`.
pub fn encode(form: &FormData, boundary: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in form.entries() {
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        let name = escape(name);
        match value {
            FormValue::Text(text) => {
                out.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                out.extend_from_slice(text.as_bytes());
            }
            FormValue::Blob(blob) => {
                let filename = escape(blob.filename.as_deref().unwrap_or(DEFAULT_BLOB_FILENAME));
                let content_type =
                    escape_line(blob.content_type.as_deref().unwrap_or(DEFAULT_BLOB_CONTENT_TYPE));
                out.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                out.extend_from_slice(&blob.bytes);
            }
        }
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    out
}

fn escape(value: &str) -> String {
    escape_line(&value.replace('"', "%22"))
}

/// Keep a header value on one line. Quotes stay, since media-type
/// parameters may be quoted.
fn escape_line(value: &str) -> String {
    value.replace('\r', "%0D").replace('\n', "%0A")
}

fn collides(form: &FormData, boundary: &str) -> bool {
    let needle = boundary.as_bytes();
    form.entries().iter().any(|(name, value)| {
        contains(name.as_bytes(), needle)
            || match value {
                FormValue::Text(text) => contains(text.as_bytes(), needle),
                FormValue::Blob(Blob {
                    bytes,
                    filename,
                    content_type,
                }) => {
                    contains(bytes, needle)
                        || [filename, content_type]
                            .into_iter()
                            .flatten()
                            .any(|field| contains(field.as_bytes(), needle))
                }
            }
    })
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
