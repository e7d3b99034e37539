use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;

const BODY_LINE_LEN: usize = 76;

/// Build an RFC 2822 plain-text message ready for the `raw` field of a send request
pub fn build_message(to: &str, subject: &str, body: &str) -> String {
    let mut message = String::new();

    if body.is_ascii() {
        message.push_str("Content-Type: text/plain; charset=\"us-ascii\"\r\n");
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Transfer-Encoding: 7bit\r\n");
    } else {
        message.push_str("Content-Type: text/plain; charset=\"utf-8\"\r\n");
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Transfer-Encoding: base64\r\n");
    }
    message.push_str(&format!("to: {}\r\n", header_value(to)));
    message.push_str(&format!("subject: {}\r\n", encode_header(subject)));
    message.push_str("\r\n");

    if body.is_ascii() {
        message.push_str(&normalize_newlines(body));
    } else {
        let encoded = STANDARD.encode(body.as_bytes());
        for chunk in encoded.as_bytes().chunks(BODY_LINE_LEN) {
            // base64 output is ASCII, so every chunk is valid UTF-8
            message.push_str(&String::from_utf8_lossy(chunk));
            message.push_str("\r\n");
        }
    }

    message
}

/// URL-safe base64 of the full message
pub fn encode_raw(message: &str) -> String {
    URL_SAFE.encode(message.as_bytes())
}

/// RFC 2047 encoded word for non-ASCII header values
pub fn encode_header(value: &str) -> String {
    let value = header_value(value);
    if value.is_ascii() {
        value
    } else {
        format!("=?utf-8?b?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

// Header values never span lines
fn header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

fn normalize_newlines(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\n', "\r\n")
}
