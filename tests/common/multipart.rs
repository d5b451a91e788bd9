//! Builds `multipart/form-data` request bodies
#![allow(dead_code)]

pub const BOUNDARY: &str = "----ethearts-test-boundary";

pub enum Part<'a> {
    File {
        field: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        field: &'a str,
        value: &'a str,
    },
}

/// Shorthand for a `resourceFile` part.
pub fn resource_file<'a>(filename: &'a str, data: &'a [u8]) -> Part<'a> {
    Part::File {
        field: "resourceFile",
        filename,
        content_type: "text/plain",
        data,
    }
}

/// Shorthand for the `helpId` part.
pub fn help_id(value: &str) -> Part<'_> {
    Part::Text {
        field: "helpId",
        value,
    }
}

pub fn content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                field,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        field, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { field, value } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        field, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
